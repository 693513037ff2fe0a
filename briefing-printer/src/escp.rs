//! ESC/P command builder
//!
//! Provides a fluent API for building Epson ESC/P print data, the command
//! set spoken by 9-pin dot-matrix printers such as the Panasonic KX-P1592
//! in Epson emulation.

use crate::encoding::{cell_width, encode_cp437};

const ESC: u8 = 0x1B;
const FORM_FEED: u8 = 0x0C;

/// Horizontal pitch (characters per inch)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pitch {
    /// 10 cpi
    Pica,
    /// 12 cpi
    Elite,
    /// 15 cpi
    Micron,
}

impl Pitch {
    /// Closest supported pitch for a cpi value
    pub fn from_cpi(cpi: u8) -> Self {
        match cpi {
            0..=10 => Pitch::Pica,
            11..=12 => Pitch::Elite,
            _ => Pitch::Micron,
        }
    }
}

/// ESC/P command builder
///
/// Text is encoded to code page 437 as it is written, so control
/// sequences and text never need to be separated again.
pub struct EscpBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscpBuilder {
    /// Create a new builder with the specified line width in characters
    ///
    /// Common widths at 10 cpi:
    /// - narrow carriage (8"): 80 characters
    /// - wide carriage (13.6"): 136 characters
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(4096);
        // Initialize printer (ESC @)
        buf.extend_from_slice(&[ESC, b'@']);
        Self { buf, width }
    }

    // === Setup ===

    /// Set line spacing to n/216 inch (ESC 3 n)
    pub fn line_spacing_216(&mut self, n: u8) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, b'3', n]);
        self
    }

    /// Select the PC437 graphics character table (ESC t 1)
    pub fn graphics_table(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, b't', 0x01]);
        self
    }

    /// Select horizontal pitch
    pub fn pitch(&mut self, pitch: Pitch) -> &mut Self {
        let cmd = match pitch {
            Pitch::Pica => b'P',
            Pitch::Elite => b'M',
            Pitch::Micron => b'g',
        };
        self.buf.extend_from_slice(&[ESC, cmd]);
        self
    }

    // === Text Output ===

    /// Write text (code page 437 encoded)
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&encode_cp437(s));
        self
    }

    /// Write text followed by CR LF
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.newline()
    }

    /// Write an empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// Write a multi-line block, normalizing line endings to CR LF
    pub fn block(&mut self, s: &str) -> &mut Self {
        for line in s.lines() {
            self.line(line);
        }
        self
    }

    // === Text Style ===

    /// Enable emphasized (bold) printing (ESC E)
    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, b'E']);
        self
    }

    /// Disable emphasized printing (ESC F)
    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, b'F']);
        self
    }

    // === Separators ===

    /// Print a line of '=' characters
    pub fn sep_double(&mut self) -> &mut Self {
        self.line(&"=".repeat(self.width))
    }

    /// Print a line of '-' characters
    pub fn sep_single(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    /// Print text centered in the line width (space padded)
    pub fn centered(&mut self, s: &str) -> &mut Self {
        let w = cell_width(s);
        if w >= self.width {
            return self.line(s);
        }
        let pad = (self.width - w) / 2;
        self.line(&format!("{}{}", " ".repeat(pad), s))
    }

    /// Print left and right text on the same line
    ///
    /// Left text is left-aligned, right text is right-aligned,
    /// with spaces filling the gap.
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = cell_width(left);
        let rw = cell_width(right);

        if lw + rw >= self.width {
            // Too long, just print with space
            self.text(left);
            self.text(" ");
            self.line(right)
        } else {
            let spaces = self.width - lw - rw;
            self.text(left);
            self.text(&" ".repeat(spaces));
            self.line(right)
        }
    }

    // === Paper Control ===

    /// Eject the page (FF)
    pub fn form_feed(&mut self) -> &mut Self {
        self.buf.push(FORM_FEED);
        self
    }

    // === Build ===

    /// Build the final byte buffer
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscpBuilder {
    fn default() -> Self {
        Self::new(80)
    }
}
