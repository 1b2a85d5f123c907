pub mod error;
pub mod time;
pub mod types;

pub use error::{BackendError, BackendResult, ErrorResponse, GatewayError, Result};
pub use types::{BucketInfo, ObjectInfo};
