/// Absolute URLs handed back to clients.
#[derive(Debug, Clone)]
pub struct PublicLinks {
    base_url: String,
}

impl PublicLinks {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn preview(&self, event_id: &str, photo_id: &str) -> String {
        format!(
            "{}/events/{}/photos/{}/preview",
            self.base_url, event_id, photo_id
        )
    }

    pub fn download(&self, session_id: &str, photo_id: &str) -> String {
        format!("{}/checkout/{}/photos/{}", self.base_url, session_id, photo_id)
    }

    pub fn archive(&self, session_id: &str) -> String {
        format!("{}/checkout/{}/archive", self.base_url, session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_use_trimmed_base() {
        let links = PublicLinks::new("https://photos.example.com/");
        assert_eq!(
            links.preview("e1", "p1"),
            "https://photos.example.com/events/e1/photos/p1/preview"
        );
        assert_eq!(
            links.download("cs_1", "p1"),
            "https://photos.example.com/checkout/cs_1/photos/p1"
        );
        assert_eq!(
            links.archive("cs_1"),
            "https://photos.example.com/checkout/cs_1/archive"
        );
    }
}
