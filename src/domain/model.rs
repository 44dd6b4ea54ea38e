use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    /// 人臉索引服務上的 collection
    pub collection_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    pub event_id: String,
    pub original_filename: String,
    pub content_type: String,
    pub original_key: String,
    pub preview_key: String,
    pub width: u32,
    pub height: u32,
    pub face_ids: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Ratios of the image dimensions, `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFace {
    pub face_id: String,
    pub confidence: f32,
    pub bounding_box: Option<FaceBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceHit {
    pub face_id: String,
    /// Photo id the face was indexed under.
    pub external_image_id: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMatch {
    pub photo_id: String,
    pub similarity: f32,
    pub preview_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub session_id: String,
    pub event_id: String,
    pub photo_ids: Vec<String>,
    pub unit_amount: u64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub order_id: String,
    pub event_id: String,
    pub quantity: u64,
    pub unit_amount: u64,
    pub currency: String,
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub payment_status: String,
    #[serde(default)]
    pub amount_total: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        matches!(self.payment_status.as_str(), "paid" | "no_payment_required")
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_session_paid_states() {
        let mut session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_test_1",
            "payment_status": "unpaid"
        }))
        .unwrap();
        assert!(!session.is_paid());
        assert!(session.url.is_none());

        session.payment_status = "paid".to_string();
        assert!(session.is_paid());

        session.payment_status = "no_payment_required".to_string();
        assert!(session.is_paid());
    }
}
