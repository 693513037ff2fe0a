//! # briefing-printer
//!
//! Dot-matrix printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/P command building
//! - IBM PC code page 437 encoding
//! - CUPS queue printing (`lp` / `lpstat` / `cancel`)
//! - Network printing (TCP port 9100)
//!
//! Business logic (WHAT to print) stays in application code:
//! - Briefing rendering, job queueing and retries → field-device
//!
//! ## Example
//!
//! ```ignore
//! use briefing_printer::{CupsPrinter, EscpBuilder, PrintOptions, PrintTransport};
//!
//! let mut builder = EscpBuilder::new(80);
//! builder.line_spacing_216(0x18);
//! builder.centered("DAILY BRIEFING");
//! builder.sep_double();
//! builder.form_feed();
//! std::fs::write("/tmp/job.prn", builder.build())?;
//!
//! let printer = CupsPrinter::new("KX-P1592");
//! let job_id = printer
//!     .submit("briefing", Path::new("/tmp/job.prn"), &PrintOptions::default())
//!     .await?;
//! ```

mod cups;
mod encoding;
mod error;
mod escp;
mod printer;

// Re-exports
pub use cups::{
    classify_stderr, parse_lpstat_accepting, parse_lpstat_printer, parse_request_id, CupsPrinter,
};
pub use encoding::{cell_width, encode_cp437, is_printable, pad_cells, truncate_cells};
pub use error::{PrintError, PrintResult};
pub use escp::{EscpBuilder, Pitch};
pub use printer::{
    NetworkPrinter, OperationalState, PrintOptions, PrintTransport, PrinterStatus,
};
