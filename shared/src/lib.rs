//! Shared types for the briefing pipeline
//!
//! Types used by both the cloud producers and the field device:
//! topic/category naming, the aggregation bundle, inbound messages
//! and typed views over the per-category payloads.

pub mod bundle;
pub mod category;
pub mod message;
pub mod models;

// Re-exports
pub use bundle::DataBundle;
pub use category::Category;
pub use message::{BriefingMessage, MessageError};
pub use serde::{Deserialize, Serialize};
pub use serde_json::Value;
