// Application layer: request-level workflows composed from the domain ports.

pub mod checkout;
pub mod events;
pub mod links;
pub mod photos;
pub mod search;

pub use checkout::{CheckoutCreated, CheckoutService, Download, DownloadLink, OrderStatus};
pub use events::EventService;
pub use links::PublicLinks;
pub use photos::{PhotoService, UploadedPhoto};
pub use search::SearchService;

use crate::config::AppConfig;
use crate::core::imaging::ImageProcessor;
use crate::domain::ports::{FaceIndex, ObjectStore, PaymentGateway};
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub events: Arc<EventService>,
    pub photos: Arc<PhotoService>,
    pub search: Arc<SearchService>,
    pub checkout: Arc<CheckoutService>,
}

impl Services {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn ObjectStore>,
        faces: Arc<dyn FaceIndex>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Result<Self> {
        let processor = Arc::new(ImageProcessor::new(&config.images)?);
        let links = PublicLinks::new(config.public_base_url());

        let events = Arc::new(EventService::new(
            store.clone(),
            faces.clone(),
            config.faces.collection_prefix.clone(),
        ));
        let photos = Arc::new(PhotoService::new(
            store.clone(),
            faces.clone(),
            events.clone(),
            processor.clone(),
            config.max_upload_bytes(),
            links.clone(),
        ));
        let search = Arc::new(SearchService::new(
            faces,
            events.clone(),
            photos.clone(),
            processor,
            &config.faces,
            config.max_upload_bytes(),
            links.clone(),
        ));
        let checkout = Arc::new(CheckoutService::new(
            store,
            payments,
            photos.clone(),
            config,
            links,
        ));

        Ok(Self {
            events,
            photos,
            search,
            checkout,
        })
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(store: &dyn ObjectStore, key: &str) -> Result<T> {
    let object = store.get(key).await?;
    Ok(serde_json::from_slice(&object.bytes)?)
}

pub(crate) async fn write_json<T: Serialize>(store: &dyn ObjectStore, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.put(key, bytes, "application/json").await
}
