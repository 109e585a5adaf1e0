//! OCR translation pipeline
//!
//! Reacts to cloud-storage upload notifications: extracts text from the
//! uploaded image, detects its language, translates it into every configured
//! target language and republishes each translation on a result topic.

pub mod config;
pub mod error;
pub mod message;
pub mod orchestration;
pub mod providers;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use message::{DecodeError, PubsubPayload, StorageObjectEvent, TranslationMessage};
pub use orchestration::{InvocationOutcome, Orchestrator};
pub use providers::Providers;
