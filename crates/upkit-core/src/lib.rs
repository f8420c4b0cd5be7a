pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::{GeneralConfig, UploadConfig, UpkitConfig};
pub use error::{Result, UpkitError};
pub use events::UploadEvent;
pub use types::*;
