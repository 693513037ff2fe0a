//! Device wiring
//!
//! Builds every component once and hands out handles; there is no global
//! state. Lifecycle:
//!
//! ```text
//! new → verify_printer → prepare → start → (running) → shutdown
//! ```

use super::config::{Config, PrinterBackend};
use super::tasks::{BackgroundTasks, HealthReport, TaskRole};
use crate::message::{
    BrokerLink, CategorizedAggregator, ConnectionState, ConnectionSupervisor, LastBriefing,
    RumqttLink,
};
use crate::printing::{
    BriefingRenderer, JobReceiver, PrintJob, PrintQueue, PrintWorker, WorkerSettings, queue,
};
use crate::trigger::{DigitalInput, DigitalOutput, HardwareTrigger};
use crate::utils::logger::periodic_cleanup;
use crate::utils::{AppError, AppResult};
use briefing_printer::{CupsPrinter, NetworkPrinter, PrintError, PrintTransport, PrinterStatus};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Button input and LED output handed to the trigger
pub type TriggerPins = (Box<dyn DigitalInput>, Box<dyn DigitalOutput>);

pub struct FieldDevice {
    config: Config,
    transport: Arc<dyn PrintTransport>,
    queue: PrintQueue,
    jobs: Option<JobReceiver>,
    last_briefing: LastBriefing,
    tasks: BackgroundTasks,
    connection: Option<watch::Receiver<ConnectionState>>,
}

impl FieldDevice {
    /// Build the device with the configured printer backend
    pub fn new(config: Config) -> AppResult<Self> {
        let transport: Arc<dyn PrintTransport> = match config.printer.backend {
            PrinterBackend::Cups => Arc::new(CupsPrinter::new(&config.printer.name)),
            PrinterBackend::Network => Arc::new(NetworkPrinter::from_addr(&config.printer.addr)?),
        };
        Ok(Self::with_transport(config, transport))
    }

    /// Build the device around an existing transport
    pub fn with_transport(config: Config, transport: Arc<dyn PrintTransport>) -> Self {
        let (queue, jobs) = queue::channel(config.print.queue_capacity);
        Self {
            config,
            transport,
            queue,
            jobs: Some(jobs),
            last_briefing: LastBriefing::new(),
            tasks: BackgroundTasks::new(),
            connection: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Producer handle to the print queue
    pub fn queue(&self) -> PrintQueue {
        self.queue.clone()
    }

    pub fn last_briefing(&self) -> LastBriefing {
        self.last_briefing.clone()
    }

    /// Check the printer before anything is queued
    ///
    /// An unknown printer is an error; any other problem is only logged since
    /// the worker re-checks status before every attempt.
    pub async fn verify_printer(&self) -> AppResult<Option<PrinterStatus>> {
        let printer = self.transport.describe();
        match self.transport.status().await {
            Ok(status) => {
                if status.is_stopped() || !status.accepting_jobs {
                    warn!(
                        printer = %printer,
                        state = %status.operational_state,
                        accepting = status.accepting_jobs,
                        reasons = ?status.state_reasons,
                        "Printer is not ready, jobs will be retried"
                    );
                } else {
                    info!(printer = %printer, state = %status.operational_state, "Printer verified");
                }
                Ok(Some(status))
            }
            Err(e @ PrintError::NotFound(_)) => Err(e.into()),
            Err(e) => {
                warn!(printer = %printer, error = %e, "Printer status unavailable");
                Ok(None)
            }
        }
    }

    /// Optional boot actions: cancel stale spooler jobs, queue a test page
    pub async fn prepare(&self) -> AppResult<()> {
        if self.config.cancel_stale_jobs_on_start {
            if let Err(e) = self.transport.cancel_all().await {
                warn!(error = %e, "Failed to cancel stale print jobs");
            }
        }

        if self.config.print_test_page_on_start && !self.queue.submit(PrintJob::test_page()) {
            return Err(AppError::internal("test page could not be queued"));
        }
        Ok(())
    }

    /// Start every task with the MQTT link and the configured GPIO pins
    pub fn start(&mut self) -> AppResult<()> {
        let link = RumqttLink::new(&self.config.mqtt)?;
        let pins = self.open_trigger_pins()?;
        self.start_with(link, pins)
    }

    #[cfg(feature = "rpi")]
    fn open_trigger_pins(&self) -> AppResult<Option<TriggerPins>> {
        if !self.config.trigger.enabled {
            return Ok(None);
        }
        let (button, led) =
            crate::trigger::open_pins(self.config.trigger.button_pin, self.config.trigger.led_pin)?;
        Ok(Some((Box::new(button), Box::new(led))))
    }

    #[cfg(not(feature = "rpi"))]
    fn open_trigger_pins(&self) -> AppResult<Option<TriggerPins>> {
        if self.config.trigger.enabled {
            warn!("Built without the `rpi` feature, hardware trigger disabled");
        }
        Ok(None)
    }

    /// Start every task with the given broker link and trigger pins
    pub fn start_with<L>(&mut self, link: L, pins: Option<TriggerPins>) -> AppResult<()>
    where
        L: BrokerLink + 'static,
    {
        let jobs = self
            .jobs
            .take()
            .ok_or_else(|| AppError::internal("device already started"))?;
        let shutdown = self.tasks.shutdown_token();

        // Print worker
        let worker = PrintWorker::new(
            self.transport.clone(),
            WorkerSettings {
                max_retries: self.config.print.max_retries,
                retry_delay: self.config.print.retry_delay,
                temp_dir: self.config.print.temp_dir.clone(),
                options: self.config.print.options(),
            },
        );
        self.tasks.spawn(
            "print_worker",
            TaskRole::Pipeline,
            worker.run(jobs, shutdown.clone()),
        );

        // Aggregator
        let (inbound_tx, inbound_rx) = mpsc::channel(self.config.mqtt.inbound_capacity);
        let report = &self.config.report;
        let renderer = BriefingRenderer::new(
            report.width,
            report.location.clone(),
            report.classification.clone(),
        );
        let aggregator = CategorizedAggregator::new(
            self.config.required_categories.clone(),
            Arc::new(renderer),
            self.queue.clone(),
            self.last_briefing.clone(),
        );
        self.tasks.spawn(
            "aggregator",
            TaskRole::Pipeline,
            aggregator.run(inbound_rx, shutdown.clone()),
        );

        // Broker connection
        let supervisor = ConnectionSupervisor::new(
            link,
            self.config.mqtt.topics.clone(),
            self.config.mqtt.reconnect_delay,
            inbound_tx,
        );
        self.connection = Some(supervisor.state());
        self.tasks.spawn(
            "mqtt_supervisor",
            TaskRole::Pipeline,
            supervisor.run(shutdown.clone()),
        );

        // Push button
        if let Some((button, led)) = pins {
            let trigger = HardwareTrigger::new(
                button,
                led,
                &self.config.trigger,
                self.queue.clone(),
                self.last_briefing.clone(),
            );
            self.tasks.spawn(
                "hardware_trigger",
                TaskRole::Auxiliary,
                trigger.run(shutdown.clone()),
            );
        }

        // Housekeeping
        self.tasks.spawn(
            "log_cleanup",
            TaskRole::Auxiliary,
            periodic_cleanup(self.config.log_dir(), shutdown),
        );

        info!(tasks = ?self.tasks.names(), "Background tasks started");
        Ok(())
    }

    /// Broker connection state; `None` before `start`
    pub fn connection_state(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.connection.clone()
    }

    /// Tasks that have exited, and whether the briefing pipeline survived
    pub fn check_health(&self) -> HealthReport {
        self.tasks.check_health()
    }

    /// Cancel every task and wait for it
    pub async fn shutdown(self) {
        info!("Field device shutting down");
        self.tasks.shutdown().await;
    }
}
