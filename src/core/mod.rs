pub mod imaging;

pub use imaging::{ImageProcessor, MediaType, ProcessedPhoto};
