//! Briefing Field Device - print station for the daily intelligence briefing
//!
//! # Architecture
//!
//! ```text
//! MQTT broker ──► ConnectionSupervisor ──mpsc──► CategorizedAggregator
//!                                                      │ render + submit
//!                   push button ──► HardwareTrigger ──►│
//!                                                      ▼
//!                                   PrintQueue ──► PrintWorker ──► printer
//! ```
//!
//! # Module structure
//!
//! ```text
//! field-device/src/
//! ├── core/          # config, background tasks, device wiring
//! ├── message/       # broker link, connection supervisor, aggregator
//! ├── printing/      # jobs, queue, worker, renderer, page formatter
//! ├── trigger/       # GPIO seam, debouncer, push button
//! └── utils/         # error type, logger
//! ```

pub mod core;
pub mod message;
pub mod printing;
pub mod trigger;
pub mod utils;

// Re-export common types
pub use crate::core::{Config, FieldDevice};
pub use message::{CategorizedAggregator, ConnectionState, LastBriefing};
pub use printing::{PrintJob, PrintQueue, PrintWorker};
pub use trigger::HardwareTrigger;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ____       _       _____
   / __ )_____(_)___  / __(_)___  ____ _
  / __  / ___/ / _ \ / /_/ / __ \/ __ `/
 / /_/ / /  / /  __// __/ / / / / /_/ /
/_____/_/  /_/\___//_/ /_/_/ /_/\__, /
                               /____/
        field device v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
