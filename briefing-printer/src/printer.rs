//! Printer transports
//!
//! Supports:
//! - CUPS queues (via `lp` / `lpstat`, see [`crate::cups`])
//! - Network printers (raw TCP port 9100)

use crate::error::{PrintError, PrintResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Device options passed with every submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOptions {
    /// Send bytes untouched (no spooler filters)
    pub raw_mode: bool,
    pub characters_per_inch: u8,
    pub lines_per_inch: u8,
    /// Spooler priority, 1-100
    pub priority: u8,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            raw_mode: true,
            characters_per_inch: 10,
            lines_per_inch: 6,
            priority: 50,
        }
    }
}

/// Printer state as reported by the spooler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalState {
    Idle,
    Processing,
    Stopped,
    Unknown,
}

impl fmt::Display for OperationalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationalState::Idle => write!(f, "idle"),
            OperationalState::Processing => write!(f, "processing"),
            OperationalState::Stopped => write!(f, "stopped"),
            OperationalState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Snapshot of the printer, valid only for the check that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterStatus {
    pub operational_state: OperationalState,
    pub accepting_jobs: bool,
    pub state_reasons: Vec<String>,
}

impl PrinterStatus {
    pub fn idle() -> Self {
        Self {
            operational_state: OperationalState::Idle,
            accepting_jobs: true,
            state_reasons: Vec::new(),
        }
    }

    pub fn stopped(reason: impl Into<String>) -> Self {
        Self {
            operational_state: OperationalState::Stopped,
            accepting_jobs: false,
            state_reasons: vec![reason.into()],
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.operational_state == OperationalState::Stopped
    }
}

/// Trait for printer transports
///
/// A transport owns no queue of its own; callers serialize access.
#[async_trait]
pub trait PrintTransport: Send + Sync {
    /// Submit a prepared file; returns the spooler's job id
    async fn submit(
        &self,
        job_name: &str,
        path: &Path,
        options: &PrintOptions,
    ) -> PrintResult<String>;

    /// Query the current printer status
    async fn status(&self) -> PrintResult<PrinterStatus>;

    /// Cancel every job still pending on the device queue
    async fn cancel_all(&self) -> PrintResult<()>;

    /// Human-readable target, for logs
    fn describe(&self) -> String;
}

/// Network printer (TCP port 9100)
///
/// Most printers with a network card accept raw bytes on port 9100.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let addr_str = format!("{}:{}", host, port);
        Self::from_addr(&addr_str)
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn connect(&self, timeout: Duration) -> PrintResult<TcpStream> {
        tokio::time::timeout(timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))
    }
}

#[async_trait]
impl PrintTransport for NetworkPrinter {
    #[instrument(skip(self, path, _options), fields(addr = %self.addr))]
    async fn submit(
        &self,
        job_name: &str,
        path: &Path,
        _options: &PrintOptions,
    ) -> PrintResult<String> {
        let data = tokio::fs::read(path).await?;

        info!("Connecting to printer");
        let mut stream = self.connect(self.timeout).await?;

        info!("Connected, sending {} bytes", data.len());
        stream.write_all(&data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;
        stream.flush().await?;
        stream.shutdown().await?;

        info!("Print job sent successfully");
        Ok(format!("{}@{}", job_name, self.addr))
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn status(&self) -> PrintResult<PrinterStatus> {
        match self.connect(Duration::from_millis(500)).await {
            Ok(_) => {
                debug!("Printer online");
                Ok(PrinterStatus::idle())
            }
            Err(e) => {
                warn!(error = %e, "Printer offline");
                Err(PrintError::Offline(e.to_string()))
            }
        }
    }

    async fn cancel_all(&self) -> PrintResult<()> {
        // Raw sockets have no queue to clear
        debug!(addr = %self.addr, "cancel_all is a no-op for network printers");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp:{}", self.addr)
    }
}
