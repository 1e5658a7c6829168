//! Remote collaborator seam for the fraud-detection resource store.
//!
//! The reconciliation engine only ever talks to [`FraudDetectorApi`].
//! [`AwsFraudDetector`] backs it with the AWS SDK and
//! [`InMemoryFraudDetector`] with a local store that enforces the same
//! referential rules.

pub mod api;
pub mod aws;
pub mod error;
pub mod existence;
pub mod memory;
pub mod paging;
pub mod retry;
pub mod tags;
pub mod types;

pub use api::FraudDetectorApi;
pub use aws::AwsFraudDetector;
pub use error::{RemoteError, RemoteResult};
pub use memory::InMemoryFraudDetector;
pub use paging::{collect_pages, Page};
pub use retry::retry_not_found;
pub use types::*;
