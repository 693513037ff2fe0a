//! Dot-matrix page formatter
//!
//! Wraps rendered text in ESC/P control codes with an 80-column banner:
//!
//! ```text
//! ESC @  ESC 3 0x18  ESC t 1  <pitch>
//! ================================ (80)
//! ESC E Printed at: 2026-01-01 08:00:00      briefing_20260101_080000 ESC F
//! ================================
//!
//! <content>
//!
//! -------------------------------- (80)
//!                         End of Document
//! FF
//! ```

use briefing_printer::{EscpBuilder, Pitch};
use chrono::{DateTime, Local};

/// Carriage width in columns at 10 cpi
pub const PAGE_WIDTH: usize = 80;

/// 24/216 inch, the classic 9-pin line pitch
const LINE_SPACING_216: u8 = 0x18;

#[derive(Debug, Clone)]
pub struct DotMatrixFormatter {
    width: usize,
    pitch: Pitch,
}

impl DotMatrixFormatter {
    pub fn new(characters_per_inch: u8) -> Self {
        Self {
            width: PAGE_WIDTH,
            pitch: Pitch::from_cpi(characters_per_inch),
        }
    }

    /// Produce printer-ready bytes
    ///
    /// `job_name` is printed right-aligned on the banner line.
    pub fn format(&self, job_name: &str, content: &str, printed_at: DateTime<Local>) -> Vec<u8> {
        let mut b = EscpBuilder::new(self.width);
        b.line_spacing_216(LINE_SPACING_216)
            .graphics_table()
            .pitch(self.pitch);

        // === Header ===
        let printed = format!("Printed at: {}", printed_at.format("%Y-%m-%d %H:%M:%S"));
        b.sep_double()
            .bold()
            .line_lr(&printed, job_name)
            .bold_off()
            .sep_double()
            .newline();

        b.block(content);

        // === Footer ===
        b.newline()
            .sep_single()
            .centered("End of Document")
            .form_feed();

        b.build()
    }
}

impl Default for DotMatrixFormatter {
    fn default() -> Self {
        Self::new(10)
    }
}
