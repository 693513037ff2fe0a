//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use briefing_printer::{PrintError, PrintOptions, PrintResult, PrintTransport, PrinterStatus};
use field_device::Config;
use field_device::message::{BrokerError, BrokerLink, LinkEvent};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// One call to `submit` as seen by the transport
#[derive(Debug, Clone)]
pub struct Submission {
    pub job_name: String,
    pub path: PathBuf,
    /// Whether the artifact existed while the transport held it
    pub artifact_existed: bool,
    pub bytes: Vec<u8>,
}

impl Submission {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Scriptable printer
///
/// Status and submit results are consumed in order; once a script runs out
/// the printer is idle and every submission succeeds.
#[derive(Default)]
pub struct FakeTransport {
    statuses: Mutex<VecDeque<PrintResult<PrinterStatus>>>,
    results: Mutex<VecDeque<PrintResult<String>>>,
    submissions: Mutex<Vec<Submission>>,
    status_calls: Mutex<usize>,
    panic_on: Mutex<Option<String>>,
    submit_delay: Mutex<Duration>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_status(&self, status: PrintResult<PrinterStatus>) {
        self.statuses.lock().push_back(status);
    }

    pub fn push_result(&self, result: PrintResult<String>) {
        self.results.lock().push_back(result);
    }

    /// Queue `n` retryable submit failures
    pub fn fail_times(&self, n: usize) {
        for i in 0..n {
            self.push_result(Err(PrintError::Rejected(format!("lp failure {}", i + 1))));
        }
    }

    /// Panic when a job with this name is submitted
    pub fn panic_on(&self, job_name: &str) {
        *self.panic_on.lock() = Some(job_name.to_string());
    }

    /// Hold every submission for this long
    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock() = delay;
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    pub fn status_calls(&self) -> usize {
        *self.status_calls.lock()
    }
}

#[async_trait]
impl PrintTransport for FakeTransport {
    async fn submit(
        &self,
        job_name: &str,
        path: &Path,
        _options: &PrintOptions,
    ) -> PrintResult<String> {
        if self.panic_on.lock().as_deref() == Some(job_name) {
            panic!("transport exploded on {}", job_name);
        }

        let bytes = std::fs::read(path).unwrap_or_default();
        let number = {
            let mut submissions = self.submissions.lock();
            submissions.push(Submission {
                job_name: job_name.to_string(),
                path: path.to_path_buf(),
                artifact_existed: path.exists(),
                bytes,
            });
            submissions.len()
        };

        let delay = *self.submit_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.results.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(format!("fake-{}", number)))
    }

    async fn status(&self) -> PrintResult<PrinterStatus> {
        *self.status_calls.lock() += 1;
        let scripted = self.statuses.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(PrinterStatus::idle()))
    }

    async fn cancel_all(&self) -> PrintResult<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "fake printer".into()
    }
}

/// Broker link that replays a script, then idles
pub struct ScriptedLink {
    script: VecDeque<Result<LinkEvent, BrokerError>>,
    pub subscriptions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedLink {
    /// Connect, then deliver `messages` as (topic, payload) pairs
    pub fn connected_with(messages: &[(&str, &str)]) -> Self {
        let mut script = VecDeque::from(vec![Ok(LinkEvent::Connected)]);
        script.extend(messages.iter().map(|(topic, payload)| {
            Ok(LinkEvent::Message {
                topic: topic.to_string(),
                payload: payload.as_bytes().to_vec(),
            })
        }));
        Self {
            script,
            subscriptions: Arc::default(),
        }
    }
}

#[async_trait]
impl BrokerLink for ScriptedLink {
    async fn poll(&mut self) -> Result<LinkEvent, BrokerError> {
        match self.script.pop_front() {
            Some(step) => step,
            None => std::future::pending().await,
        }
    }

    async fn subscribe(&mut self, filter: &str) -> Result<(), BrokerError> {
        self.subscriptions.lock().push(filter.to_string());
        Ok(())
    }
}

/// Default configuration with fast timings and artifacts under `temp_dir`
pub fn test_config(temp_dir: &Path) -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.work_dir = temp_dir.join("work").to_string_lossy().into_owned();
    config.print.temp_dir = temp_dir.join("jobs");
    config.print.retry_delay = Duration::from_millis(10);
    config.mqtt.reconnect_delay = Duration::from_millis(10);
    config.trigger.poll_interval = Duration::from_millis(5);
    config.trigger.debounce = Duration::from_millis(50);
    config.trigger.led_pulse = Duration::from_millis(50);
    config
}

/// Files left in a directory (0 when it does not exist)
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// Poll `condition` every 5ms for up to 2s
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
