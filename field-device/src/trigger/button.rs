//! Push-button reprint trigger
//!
//! Samples the button pin every poll tick, feeds the [`Debouncer`] and turns
//! each confirmed press into a Reprint job. Presses that arrive while the
//! worker is printing are ignored.

use super::debounce::Debouncer;
use super::gpio::{DigitalInput, DigitalOutput};
use crate::core::config::TriggerConfig;
use crate::message::LastBriefing;
use crate::printing::{PrintJob, PrintQueue};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Printed when the button is pressed before any briefing completed
pub const NO_BRIEFING_NOTICE: &str = "\
REPRINT REQUEST
---------------
No briefing has been printed yet.";

/// What a confirmed press led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Reprint queued, LED pulsed
    Submitted,
    /// Worker busy, press ignored
    Busy,
    /// Queue refused the job
    Rejected,
}

pub struct HardwareTrigger {
    button: Box<dyn DigitalInput>,
    led: Box<dyn DigitalOutput>,
    debouncer: Debouncer,
    poll_interval: Duration,
    led_pulse: Duration,
    led_off_at: Option<Instant>,
    queue: PrintQueue,
    last_briefing: LastBriefing,
}

impl HardwareTrigger {
    pub fn new(
        button: Box<dyn DigitalInput>,
        led: Box<dyn DigitalOutput>,
        config: &TriggerConfig,
        queue: PrintQueue,
        last_briefing: LastBriefing,
    ) -> Self {
        Self {
            button,
            led,
            debouncer: Debouncer::new(config.debounce),
            poll_interval: config.poll_interval,
            led_pulse: config.led_pulse,
            led_off_at: None,
            queue,
            last_briefing,
        }
    }

    /// Poll until shutdown
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            poll_ms = self.poll_interval.as_millis() as u64,
            "Hardware trigger started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                now = ticker.tick() => self.tick(now),
            }
        }

        self.led.set_low();
        info!("Hardware trigger stopped");
    }

    /// One sample of the button pin
    pub fn tick(&mut self, now: Instant) {
        if self.led_off_at.is_some_and(|off_at| now >= off_at) {
            self.led.set_low();
            self.led_off_at = None;
        }

        let pressed = self.button.is_low();
        if self.debouncer.update(pressed, now.into_std()) {
            let outcome = self.on_press();
            if outcome == PressOutcome::Submitted {
                self.led.set_high();
                self.led_off_at = Some(now + self.led_pulse);
            }
        }
    }

    /// Handle a confirmed press
    pub fn on_press(&mut self) -> PressOutcome {
        if self.queue.is_processing() {
            debug!("Button pressed while printing, ignored");
            return PressOutcome::Busy;
        }

        let content = match self.last_briefing.get() {
            Some(text) => text,
            None => {
                info!("Button pressed before any briefing, printing notice");
                NO_BRIEFING_NOTICE.to_string()
            }
        };

        if self.queue.submit(PrintJob::reprint(content)) {
            info!("Reprint requested from button");
            PressOutcome::Submitted
        } else {
            warn!("Reprint request refused by print queue");
            PressOutcome::Rejected
        }
    }
}
