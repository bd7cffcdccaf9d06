pub mod client;
pub mod dialect;

pub use client::DeviceClient;
pub use dialect::Dialect;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{Reading, Specifications};

/// Something that can produce a fresh reading for a station
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Fetch one complete reading
    async fn fetch_reading(&self) -> Result<Reading, FetchError>;

    /// Best-effort hardware details, defaults on failure
    async fn fetch_specifications(&self) -> Specifications {
        Specifications::default()
    }
}
