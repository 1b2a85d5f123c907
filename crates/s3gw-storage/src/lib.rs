pub mod client;
pub mod config;
pub mod hash_reader;
pub mod memory;
pub mod s3;
pub mod traits;

pub use client::{BackendClient, Connector};
pub use config::{Credentials, GatewayConfig};
pub use memory::{MemoryConnector, MemoryStore};
pub use s3::S3Gateway;
pub use traits::GatewayLayer;
