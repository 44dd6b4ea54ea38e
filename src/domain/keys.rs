// Object key layout shared by all storage backends.

pub fn event_key(event_id: &str) -> String {
    format!("events/{}/event.json", event_id)
}

pub fn photo_record_prefix(event_id: &str) -> String {
    format!("events/{}/photos/", event_id)
}

pub fn photo_record_key(event_id: &str, photo_id: &str) -> String {
    format!("{}{}.json", photo_record_prefix(event_id), photo_id)
}

pub fn original_key(event_id: &str, photo_id: &str, extension: &str) -> String {
    format!("events/{}/originals/{}.{}", event_id, photo_id, extension)
}

pub fn preview_key(event_id: &str, photo_id: &str) -> String {
    format!("events/{}/previews/{}.jpg", event_id, photo_id)
}

pub fn order_key(session_id: &str) -> String {
    format!("orders/{}.json", session_id)
}

/// 依副檔名判斷 content type (本機儲存沒有 metadata)
pub fn content_type_for_key(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "json" => "application/json",
        "zip" => "application/zip",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(event_key("e1"), "events/e1/event.json");
        assert_eq!(photo_record_key("e1", "p1"), "events/e1/photos/p1.json");
        assert!(photo_record_key("e1", "p1").starts_with(&photo_record_prefix("e1")));
        assert_eq!(original_key("e1", "p1", "png"), "events/e1/originals/p1.png");
        assert_eq!(preview_key("e1", "p1"), "events/e1/previews/p1.jpg");
        assert_eq!(order_key("cs_1"), "orders/cs_1.json");
    }

    #[test]
    fn test_content_type_for_key() {
        assert_eq!(content_type_for_key("a/b.JPG"), "image/jpeg");
        assert_eq!(content_type_for_key("a/b.webp"), "image/webp");
        assert_eq!(content_type_for_key("a/b.json"), "application/json");
        assert_eq!(content_type_for_key("a/b"), "application/octet-stream");
    }
}
