use crate::app::{read_json, write_json, PhotoService, PublicLinks};
use crate::config::AppConfig;
use crate::domain::keys;
use crate::domain::model::{CheckoutRequest, CheckoutSession, Order, PhotoRecord, StoredObject};
use crate::domain::ports::{ObjectStore, PaymentGateway};
use crate::utils::error::{LensError, Result};
use crate::utils::validation::{parse_resource_id, validate_session_id};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use uuid::Uuid;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutCreated {
    pub session_id: String,
    pub checkout_url: String,
    pub photo_count: usize,
    pub amount_total: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadLink {
    pub photo_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStatus {
    pub session_id: String,
    pub event_id: String,
    pub payment_status: String,
    pub paid: bool,
    pub photo_ids: Vec<String>,
    pub downloads: Vec<DownloadLink>,
    pub archive_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub object: StoredObject,
}

pub struct CheckoutService {
    store: Arc<dyn ObjectStore>,
    payments: Arc<dyn PaymentGateway>,
    photos: Arc<PhotoService>,
    unit_amount: u64,
    currency: String,
    product_name: String,
    success_url: String,
    cancel_url: String,
    max_photos_per_order: usize,
    links: PublicLinks,
}

impl CheckoutService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        payments: Arc<dyn PaymentGateway>,
        photos: Arc<PhotoService>,
        config: &AppConfig,
        links: PublicLinks,
    ) -> Self {
        Self {
            store,
            payments,
            photos,
            unit_amount: config.payments.price_per_photo,
            currency: config.payments.currency.clone(),
            product_name: config.payments.product_name.clone(),
            success_url: config.success_url(),
            cancel_url: config.cancel_url(),
            max_photos_per_order: config.payments.max_photos_per_order,
            links,
        }
    }

    pub async fn create_checkout(
        &self,
        event_id: &str,
        photo_ids: &[String],
    ) -> Result<CheckoutCreated> {
        let event_id = parse_resource_id("event_id", event_id)?;

        // 去重並保留順序
        let mut seen = HashSet::new();
        let mut unique_ids = Vec::with_capacity(photo_ids.len());
        for raw in photo_ids {
            let id = parse_resource_id("photo_ids", raw)?;
            if seen.insert(id.clone()) {
                unique_ids.push(id);
            }
        }

        if unique_ids.is_empty() {
            return Err(LensError::invalid_input("photo_ids", "select at least one photo"));
        }
        if unique_ids.len() > self.max_photos_per_order {
            return Err(LensError::invalid_input(
                "photo_ids",
                format!("at most {} photos per order", self.max_photos_per_order),
            ));
        }

        for photo_id in &unique_ids {
            self.photos.get(&event_id, photo_id).await?;
        }

        let order_id = Uuid::new_v4().to_string();
        let request = CheckoutRequest {
            order_id: order_id.clone(),
            event_id: event_id.clone(),
            quantity: unique_ids.len() as u64,
            unit_amount: self.unit_amount,
            currency: self.currency.clone(),
            product_name: self.product_name.clone(),
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
        };

        let session = self.payments.create_checkout(&request).await?;
        validate_session_id(&session.id).map_err(|_| LensError::PaymentError {
            message: format!("provider returned an unusable session id {:?}", session.id),
        })?;

        let order = Order {
            order_id,
            session_id: session.id.clone(),
            event_id,
            photo_ids: unique_ids,
            unit_amount: self.unit_amount,
            currency: self.currency.clone(),
            created_at: Utc::now(),
        };
        write_json(self.store.as_ref(), &keys::order_key(&session.id), &order).await?;

        let amount_total = session
            .amount_total
            .unwrap_or_else(|| self.unit_amount.saturating_mul(order.photo_ids.len() as u64));
        tracing::info!(
            "🛒 Checkout session {} created for order {} ({} photos, {} {})",
            session.id,
            order.order_id,
            order.photo_ids.len(),
            amount_total,
            self.currency
        );

        Ok(CheckoutCreated {
            checkout_url: session.url.clone().unwrap_or_default(),
            session_id: session.id,
            photo_count: order.photo_ids.len(),
            amount_total,
            currency: session.currency.unwrap_or_else(|| self.currency.clone()),
        })
    }

    pub async fn status(&self, session_id: &str) -> Result<OrderStatus> {
        let (order, session) = self.order_and_session(session_id).await?;
        let paid = session.is_paid();

        let (downloads, archive_url) = if paid {
            let downloads = order
                .photo_ids
                .iter()
                .map(|photo_id| DownloadLink {
                    photo_id: photo_id.clone(),
                    url: self.links.download(&order.session_id, photo_id),
                })
                .collect();
            (downloads, Some(self.links.archive(&order.session_id)))
        } else {
            (Vec::new(), None)
        };

        Ok(OrderStatus {
            session_id: order.session_id,
            event_id: order.event_id,
            payment_status: session.payment_status,
            paid,
            photo_ids: order.photo_ids,
            downloads,
            archive_url,
        })
    }

    pub async fn download(&self, session_id: &str, photo_id: &str) -> Result<Download> {
        let photo_id = parse_resource_id("photo_id", photo_id)?;
        let order = self.load_order(session_id).await?;
        if !order.photo_ids.contains(&photo_id) {
            return Err(LensError::not_found(format!(
                "photo {} in order {}",
                photo_id, order.session_id
            )));
        }

        self.require_paid(&order).await?;

        let record = self.photos.get(&order.event_id, &photo_id).await?;
        let object = self.photos.original(&record).await?;
        Ok(Download {
            filename: record.original_filename,
            object,
        })
    }

    /// 所有已購照片原圖打包成 ZIP
    pub async fn archive(&self, session_id: &str) -> Result<Download> {
        let order = self.load_order(session_id).await?;
        self.require_paid(&order).await?;

        let mut entries: Vec<(PhotoRecord, Vec<u8>)> = Vec::with_capacity(order.photo_ids.len());
        for photo_id in &order.photo_ids {
            let record = self.photos.get(&order.event_id, photo_id).await?;
            let object = self.photos.original(&record).await?;
            entries.push((record, object.bytes));
        }

        let bytes = tokio::task::spawn_blocking(move || build_archive(&entries)).await??;
        tracing::info!(
            "📦 Built archive for {} ({} photos, {} bytes)",
            order.session_id,
            order.photo_ids.len(),
            bytes.len()
        );

        Ok(Download {
            filename: format!("photos-{}.zip", order.session_id),
            object: StoredObject {
                bytes,
                content_type: "application/zip".to_string(),
            },
        })
    }

    async fn load_order(&self, session_id: &str) -> Result<Order> {
        validate_session_id(session_id)?;
        read_json(self.store.as_ref(), &keys::order_key(session_id))
            .await
            .map_err(|e| match e {
                LensError::NotFound { .. } => {
                    LensError::not_found(format!("order for session {}", session_id))
                }
                other => other,
            })
    }

    async fn order_and_session(&self, session_id: &str) -> Result<(Order, CheckoutSession)> {
        let order = self.load_order(session_id).await?;
        let session = self.payments.retrieve_checkout(&order.session_id).await?;
        Ok((order, session))
    }

    async fn require_paid(&self, order: &Order) -> Result<()> {
        let session = self.payments.retrieve_checkout(&order.session_id).await?;
        if session.is_paid() {
            Ok(())
        } else {
            Err(LensError::PaymentRequired {
                session_id: order.session_id.clone(),
            })
        }
    }
}

fn build_archive(entries: &[(PhotoRecord, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (index, (record, bytes)) in entries.iter().enumerate() {
        // JPEG/PNG/WebP 已壓縮過，直接存入
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file(
            format!("{:02}-{}", index + 1, record.original_filename),
            options,
        )?;
        zip.write_all(bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn record(id: &str, filename: &str) -> PhotoRecord {
        PhotoRecord {
            id: id.to_string(),
            event_id: "e1".to_string(),
            original_filename: filename.to_string(),
            content_type: "image/jpeg".to_string(),
            original_key: format!("events/e1/originals/{}.jpg", id),
            preview_key: format!("events/e1/previews/{}.jpg", id),
            width: 10,
            height: 10,
            face_ids: vec![],
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_archive_prefixes_entries_in_order() {
        // 同名檔案也不會互相覆蓋
        let entries = vec![
            (record("p1", "IMG_1.jpg"), b"first".to_vec()),
            (record("p2", "IMG_1.jpg"), b"second".to_vec()),
        ];

        let bytes = build_archive(&entries).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("02-IMG_1.jpg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "second");
        assert!(archive.by_name("01-IMG_1.jpg").is_ok());
    }
}
