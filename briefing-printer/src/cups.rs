//! CUPS transport
//!
//! Talks to the local spooler through the standard command line clients
//! (`lp`, `lpstat`, `cancel`). Output parsing is kept in pure functions so it
//! can be tested without a spooler.

use crate::error::{PrintError, PrintResult};
use crate::printer::{OperationalState, PrintOptions, PrintTransport, PrinterStatus};
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Printer attached to a CUPS queue
#[derive(Debug, Clone)]
pub struct CupsPrinter {
    name: String,
}

impl CupsPrinter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the `lp` argument list for a submission
    pub fn lp_args(&self, job_name: &str, path: &Path, options: &PrintOptions) -> Vec<String> {
        let mut args = vec![
            "-d".to_string(),
            self.name.clone(),
            "-t".to_string(),
            job_name.to_string(),
        ];
        if options.raw_mode {
            args.push("-o".to_string());
            args.push("raw".to_string());
        }
        args.push("-o".to_string());
        args.push(format!("cpi={}", options.characters_per_inch));
        args.push("-o".to_string());
        args.push(format!("lpi={}", options.lines_per_inch));
        args.push("-q".to_string());
        args.push(options.priority.clamp(1, 100).to_string());
        args.push(path.display().to_string());
        args
    }

    async fn run(&self, program: &str, args: &[String]) -> PrintResult<Output> {
        debug!(program, ?args, "Running spooler command");
        Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    PrintError::InvalidConfig(format!("{} not installed", program))
                }
                _ => PrintError::Io(e),
            })
    }

    /// Map a failed command to an error
    fn command_error(&self, program: &str, output: &Output) -> PrintError {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        classify_stderr(&self.name, program, &stderr)
    }
}

#[async_trait]
impl PrintTransport for CupsPrinter {
    #[instrument(skip(self, path, options), fields(printer = %self.name))]
    async fn submit(
        &self,
        job_name: &str,
        path: &Path,
        options: &PrintOptions,
    ) -> PrintResult<String> {
        let args = self.lp_args(job_name, path, options);
        let output = self.run("lp", &args).await?;
        if !output.status.success() {
            return Err(self.command_error("lp", &output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let job_id = parse_request_id(&stdout).unwrap_or_else(|| {
            warn!(stdout = %stdout.trim(), "lp succeeded without a request id");
            format!("{}-?", self.name)
        });
        info!(job_id = %job_id, "Submitted to CUPS");
        Ok(job_id)
    }

    #[instrument(skip(self), fields(printer = %self.name))]
    async fn status(&self) -> PrintResult<PrinterStatus> {
        let args = vec!["-p".to_string(), self.name.clone()];
        let output = self.run("lpstat", &args).await?;
        if !output.status.success() {
            return Err(self.command_error("lpstat", &output));
        }
        let (operational_state, state_reasons) =
            parse_lpstat_printer(&String::from_utf8_lossy(&output.stdout), &self.name)
                .ok_or(PrintError::NotFound(self.name.clone()))?;

        let args = vec!["-a".to_string(), self.name.clone()];
        let output = self.run("lpstat", &args).await?;
        let accepting_jobs = output.status.success()
            && parse_lpstat_accepting(&String::from_utf8_lossy(&output.stdout), &self.name)
                .unwrap_or(false);

        Ok(PrinterStatus {
            operational_state,
            accepting_jobs,
            state_reasons,
        })
    }

    #[instrument(skip(self), fields(printer = %self.name))]
    async fn cancel_all(&self) -> PrintResult<()> {
        let args = vec!["-a".to_string(), self.name.clone()];
        let output = self.run("cancel", &args).await?;
        if !output.status.success() {
            return Err(self.command_error("cancel", &output));
        }
        info!("All pending print jobs cancelled");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("cups:{}", self.name)
    }
}

/// Classify spooler stderr
pub fn classify_stderr(printer: &str, program: &str, stderr: &str) -> PrintError {
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("does not exist")
        || lower.contains("unknown destination")
        || lower.contains("invalid destination")
    {
        PrintError::NotFound(printer.to_string())
    } else {
        PrintError::Rejected(format!("{}: {}", program, stderr))
    }
}

/// Extract the job id from `lp` output
///
/// `request id is KX-P1592-42 (1 file(s))` → `KX-P1592-42`
pub fn parse_request_id(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("request id is ")?;
        let id = rest.split_whitespace().next()?;
        Some(id.to_string())
    })
}

/// Parse `lpstat -p NAME` output into a state and its reasons
///
/// Returns `None` when the printer does not appear in the output.
pub fn parse_lpstat_printer(stdout: &str, name: &str) -> Option<(OperationalState, Vec<String>)> {
    let prefix = format!("printer {} ", name);
    let mut lines = stdout.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(rest) = line.strip_prefix(&prefix) else {
            continue;
        };

        let state = if rest.starts_with("is idle") {
            OperationalState::Idle
        } else if rest.starts_with("now printing") {
            OperationalState::Processing
        } else if rest.starts_with("disabled") {
            OperationalState::Stopped
        } else {
            OperationalState::Unknown
        };

        // Reasons follow on indented lines
        let mut reasons = Vec::new();
        while let Some(next) = lines.peek() {
            if !next.starts_with(char::is_whitespace) {
                break;
            }
            let reason = next.trim();
            if !reason.is_empty() {
                reasons.push(reason.to_string());
            }
            lines.next();
        }
        return Some((state, reasons));
    }
    None
}

/// Parse `lpstat -a NAME` output
pub fn parse_lpstat_accepting(stdout: &str, name: &str) -> Option<bool> {
    let prefix = format!("{} ", name);
    stdout.lines().find_map(|line| {
        let rest = line.strip_prefix(&prefix)?;
        if rest.starts_with("accepting requests") {
            Some(true)
        } else if rest.starts_with("not accepting requests") {
            Some(false)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_lp_args() {
        let printer = CupsPrinter::new("KX-P1592");
        let args = printer.lp_args(
            "briefing_20260101_080000",
            &PathBuf::from("/tmp/print_jobs/a.prn"),
            &PrintOptions::default(),
        );
        assert_eq!(
            args,
            vec![
                "-d",
                "KX-P1592",
                "-t",
                "briefing_20260101_080000",
                "-o",
                "raw",
                "-o",
                "cpi=10",
                "-o",
                "lpi=6",
                "-q",
                "50",
                "/tmp/print_jobs/a.prn",
            ]
        );
    }

    #[test]
    fn test_lp_args_without_raw_mode() {
        let printer = CupsPrinter::new("p");
        let options = PrintOptions {
            raw_mode: false,
            priority: 0,
            ..Default::default()
        };
        let args = printer.lp_args("j", Path::new("f"), &options);
        assert!(!args.contains(&"raw".to_string()));
        // Priority is clamped to the spooler's range
        assert_eq!(args[args.len() - 2], "1");
    }

    #[test]
    fn test_parse_request_id() {
        assert_eq!(
            parse_request_id("request id is KX-P1592-42 (1 file(s))\n"),
            Some("KX-P1592-42".to_string())
        );
        assert_eq!(parse_request_id(""), None);
    }

    #[test]
    fn test_parse_lpstat_printer_states() {
        let idle = "printer KX-P1592 is idle.  enabled since Mon 01 Jan 2026 08:00:00 AM UTC\n";
        assert_eq!(
            parse_lpstat_printer(idle, "KX-P1592"),
            Some((OperationalState::Idle, vec![]))
        );

        let busy = "printer KX-P1592 now printing KX-P1592-7.  enabled since Mon\n";
        assert_eq!(
            parse_lpstat_printer(busy, "KX-P1592").map(|(s, _)| s),
            Some(OperationalState::Processing)
        );

        let stopped = "printer KX-P1592 disabled since Mon 01 Jan 2026 -\n\tPaper out\nprinter other is idle.\n";
        assert_eq!(
            parse_lpstat_printer(stopped, "KX-P1592"),
            Some((OperationalState::Stopped, vec!["Paper out".to_string()]))
        );

        assert_eq!(parse_lpstat_printer(idle, "missing"), None);
    }

    #[test]
    fn test_parse_lpstat_accepting() {
        assert_eq!(
            parse_lpstat_accepting("KX-P1592 accepting requests since Mon\n", "KX-P1592"),
            Some(true)
        );
        assert_eq!(
            parse_lpstat_accepting(
                "KX-P1592 not accepting requests since Mon -\n\treason unknown\n",
                "KX-P1592"
            ),
            Some(false)
        );
        assert_eq!(parse_lpstat_accepting("", "KX-P1592"), None);
    }

    #[test]
    fn test_classify_stderr() {
        assert!(matches!(
            classify_stderr("p", "lp", "lp: The printer or class does not exist."),
            PrintError::NotFound(_)
        ));
        assert!(matches!(
            classify_stderr("p", "lpstat", "lpstat: Invalid destination name in list \"p\"."),
            PrintError::NotFound(_)
        ));
        let err = classify_stderr("p", "lp", "lp: Error - scheduler not responding.");
        assert!(matches!(err, PrintError::Rejected(_)));
        assert!(err.is_retryable());
    }
}
