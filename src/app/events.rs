use crate::app::{read_json, write_json};
use crate::domain::keys;
use crate::domain::model::Event;
use crate::domain::ports::{FaceIndex, ObjectStore};
use crate::utils::error::{LensError, Result};
use crate::utils::validation::parse_resource_id;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const MAX_EVENT_NAME_CHARS: usize = 120;

pub struct EventService {
    store: Arc<dyn ObjectStore>,
    faces: Arc<dyn FaceIndex>,
    collection_prefix: String,
}

impl EventService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        faces: Arc<dyn FaceIndex>,
        collection_prefix: String,
    ) -> Self {
        Self {
            store,
            faces,
            collection_prefix,
        }
    }

    pub async fn create_event(&self, name: &str) -> Result<Event> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LensError::invalid_input("name", "cannot be empty"));
        }
        if name.chars().count() > MAX_EVENT_NAME_CHARS {
            return Err(LensError::invalid_input(
                "name",
                format!("must be at most {} characters", MAX_EVENT_NAME_CHARS),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let event = Event {
            collection_id: format!("{}-{}", self.collection_prefix, id),
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        };

        // 先建立 collection，失敗時不留下事件紀錄
        self.faces.ensure_collection(&event.collection_id).await?;
        write_json(self.store.as_ref(), &keys::event_key(&event.id), &event).await?;

        tracing::info!("🎉 Created event {} ({})", event.id, event.name);
        Ok(event)
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Event> {
        let event_id = parse_resource_id("event_id", event_id)?;
        read_json(self.store.as_ref(), &keys::event_key(&event_id))
            .await
            .map_err(|e| match e {
                LensError::NotFound { .. } => LensError::not_found(format!("event {}", event_id)),
                other => other,
            })
    }
}
