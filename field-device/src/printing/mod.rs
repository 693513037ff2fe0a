//! Printing pipeline
//!
//! - [`job`] - PrintJob model
//! - [`queue`] - bounded FIFO between producers and the worker
//! - [`formatter`] - ESC/P page wrapping
//! - [`worker`] - single consumer with bounded retries
//! - [`renderer`] - briefing text layout

pub mod formatter;
pub mod job;
pub mod queue;
pub mod renderer;
pub mod worker;

pub use formatter::DotMatrixFormatter;
pub use job::{JobSource, JobStatus, PrintJob};
pub use queue::{JobReceiver, PrintQueue};
pub use renderer::{BriefingRenderer, Renderer};
pub use worker::{AttemptOutcome, JobReport, PrintWorker, WorkerSettings};
