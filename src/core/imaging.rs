//! Resize, JPEG conversion and watermark overlay for uploaded photos.
//!
//! Every upload is decoded once. Two JPEG renditions are derived from it:
//! an un-watermarked copy bounded by `index_max_dimension` for the face index,
//! and a watermarked preview bounded by `preview_max_dimension`.

use crate::config::ImageConfig;
use crate::utils::error::{LensError, Result};
use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x3;
use fir::{ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbImage, RgbaImage};

const STRIPE_TILE_SIDE: u32 = 160;
const STRIPE_WIDTH: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    WebP,
}

impl MediaType {
    /// 依檔案內容判斷格式，不信任宣告的 content type
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => Ok(MediaType::Jpeg),
            Ok(ImageFormat::Png) => Ok(MediaType::Png),
            Ok(ImageFormat::WebP) => Ok(MediaType::WebP),
            Ok(other) => Err(LensError::UnsupportedMedia {
                detected: format!("{:?}", other).to_lowercase(),
            }),
            Err(_) => Err(LensError::UnsupportedMedia {
                detected: "unknown".to_string(),
            }),
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            MediaType::Jpeg => ImageFormat::Jpeg,
            MediaType::Png => ImageFormat::Png,
            MediaType::WebP => ImageFormat::WebP,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
            MediaType::WebP => "webp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessedPhoto {
    pub media_type: MediaType,
    pub width: u32,
    pub height: u32,
    pub index_jpeg: Vec<u8>,
    pub preview_jpeg: Vec<u8>,
}

pub struct ImageProcessor {
    index_max_dimension: u32,
    preview_max_dimension: u32,
    jpeg_quality: u8,
    watermark: RgbaImage,
}

impl ImageProcessor {
    pub fn new(config: &ImageConfig) -> Result<Self> {
        let watermark = match &config.watermark_path {
            Some(path) => {
                tracing::info!("🖼️ Loading watermark from {}", path);
                let tile = image::open(path)?.to_rgba8();
                scale_alpha(tile, config.watermark_opacity)
            }
            None => striped_watermark(config.watermark_opacity),
        };

        if watermark.width() == 0 || watermark.height() == 0 {
            return Err(LensError::InvalidConfigValueError {
                field: "images.watermark_path".to_string(),
                value: config.watermark_path.clone().unwrap_or_default(),
                reason: "Watermark image has no pixels".to_string(),
            });
        }

        Ok(Self {
            index_max_dimension: config.index_max_dimension,
            preview_max_dimension: config.preview_max_dimension,
            jpeg_quality: config.jpeg_quality,
            watermark,
        })
    }

    pub fn process_upload(&self, bytes: &[u8]) -> Result<ProcessedPhoto> {
        let (media_type, rgb) = decode(bytes)?;
        let (width, height) = rgb.dimensions();

        let index = fit_within(&rgb, self.index_max_dimension)?;
        let index_jpeg = encode_jpeg(&index, self.jpeg_quality)?;

        let preview = fit_within(&rgb, self.preview_max_dimension)?;
        let preview = self.apply_watermark(&preview);
        let preview_jpeg = encode_jpeg(&preview, self.jpeg_quality)?;

        tracing::debug!(
            "Processed {}x{} {:?} upload (index {} bytes, preview {} bytes)",
            width,
            height,
            media_type,
            index_jpeg.len(),
            preview_jpeg.len()
        );

        Ok(ProcessedPhoto {
            media_type,
            width,
            height,
            index_jpeg,
            preview_jpeg,
        })
    }

    /// Selfies are sent to the face index in the same normalized form as photos.
    pub fn prepare_selfie(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let (_, rgb) = decode(bytes)?;
        let index = fit_within(&rgb, self.index_max_dimension)?;
        encode_jpeg(&index, self.jpeg_quality)
    }

    pub fn apply_watermark(&self, image: &RgbImage) -> RgbImage {
        let mut canvas = DynamicImage::ImageRgb8(image.clone()).to_rgba8();
        let (tile_width, tile_height) = self.watermark.dimensions();

        let mut y = 0;
        while y < canvas.height() {
            let mut x = 0;
            while x < canvas.width() {
                imageops::overlay(&mut canvas, &self.watermark, x as i64, y as i64);
                x += tile_width;
            }
            y += tile_height;
        }

        DynamicImage::ImageRgba8(canvas).to_rgb8()
    }
}

fn decode(bytes: &[u8]) -> Result<(MediaType, RgbImage)> {
    let media_type = MediaType::detect(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, media_type.image_format())?;
    Ok((media_type, decoded.to_rgb8()))
}

/// 長邊縮到 `max_dimension` 以內，不放大
fn fit_within(src: &RgbImage, max_dimension: u32) -> Result<RgbImage> {
    let (width, height) = src.dimensions();
    let longest = width.max(height);
    if longest <= max_dimension {
        return Ok(src.clone());
    }

    let scale = max_dimension as f64 / longest as f64;
    let dst_width = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
    let dst_height = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);

    let src_view = TypedImageRef::<U8x3>::from_buffer(width, height, src.as_raw())?;
    let mut dst = vec![0u8; dst_width as usize * dst_height as usize * 3];
    {
        let mut dst_view = TypedImage::<U8x3>::from_buffer(dst_width, dst_height, &mut dst)?;
        let options = ResizeOptions::new();
        Resizer::new().resize_typed(&src_view, &mut dst_view, &options)?;
    }

    RgbImage::from_raw(dst_width, dst_height, dst).ok_or_else(|| LensError::ResizeError {
        message: "resized buffer has an unexpected length".to_string(),
    })
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    image.write_with_encoder(encoder)?;
    Ok(buffer)
}

fn scale_alpha(mut tile: RgbaImage, opacity: f32) -> RgbaImage {
    for pixel in tile.pixels_mut() {
        pixel.0[3] = (pixel.0[3] as f32 * opacity).round().clamp(0.0, 255.0) as u8;
    }
    tile
}

// Diagonal white bands; the tile side is a multiple of the band period so tiles join seamlessly.
fn striped_watermark(opacity: f32) -> RgbaImage {
    let alpha = (opacity * 255.0).round().clamp(0.0, 255.0) as u8;
    RgbaImage::from_fn(STRIPE_TILE_SIDE, STRIPE_TILE_SIDE, |x, y| {
        if ((x + y) / STRIPE_WIDTH) % 4 == 0 {
            Rgba([255, 255, 255, alpha])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}
