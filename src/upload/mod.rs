pub mod client;
pub mod credentials;
mod flow;
mod types;

pub use client::{UploadClient, UploadError};
pub use credentials::{CredentialProvider, StaticToken, StoredToken};
pub use flow::UploadFlow;
pub use types::{SelectedFile, UploadOutcome};
