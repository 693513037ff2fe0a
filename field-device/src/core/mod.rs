//! Core module - configuration, background tasks and device wiring
//!
//! # Module structure
//!
//! - [`Config`] - device configuration from the environment
//! - [`BackgroundTasks`] - task registry recording how each task ended
//! - [`FieldDevice`] - builds and runs every component

pub mod config;
pub mod device;
pub mod tasks;

pub use config::Config;
pub use device::{FieldDevice, TriggerPins};
pub use tasks::{BackgroundTasks, HealthReport, TaskExit, TaskRole};
