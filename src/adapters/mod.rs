// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod local_storage;
pub mod stripe;

#[cfg(feature = "aws")]
pub mod rekognition;
#[cfg(feature = "aws")]
pub mod s3_storage;

pub use local_storage::LocalStorage;
pub use stripe::StripeCheckout;

#[cfg(feature = "aws")]
pub use rekognition::RekognitionFaceIndex;
#[cfg(feature = "aws")]
pub use s3_storage::S3Storage;
