//! Categorized aggregator
//!
//! Accumulates per-category payloads until the bundle covers the required
//! set, then renders it, submits one print job and starts over with an empty
//! bundle. The bundle is cleared even when the queue refuses the job.
//!
//! Messages arrive already parsed (or rejected) from the broker adapter and
//! are handled strictly one at a time by the task that owns the aggregator.

use crate::printing::{PrintJob, PrintQueue, Renderer};
use parking_lot::RwLock;
use shared::{BriefingMessage, Category, DataBundle, MessageError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the adapter forwards for every delivery
pub type Inbound = Result<BriefingMessage, MessageError>;

/// Rendered text of the most recent completed briefing
///
/// Written by the aggregator, read by the hardware trigger for reprints.
#[derive(Clone, Default)]
pub struct LastBriefing(Arc<RwLock<Option<String>>>);

impl LastBriefing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, text: String) {
        *self.0.write() = Some(text);
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().clone()
    }
}

/// Result of handling one message
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateOutcome {
    /// Discarded; bundle untouched
    Rejected,
    /// Stored; still waiting for these categories
    Pending { missing: Vec<Category> },
    /// Bundle completed and the job was queued
    Submitted { job_name: String },
    /// Bundle completed but the queue refused the job
    Dropped { job_name: String },
}

pub struct CategorizedAggregator {
    required: Vec<Category>,
    bundle: DataBundle,
    renderer: Arc<dyn Renderer>,
    queue: PrintQueue,
    last_briefing: LastBriefing,
}

impl CategorizedAggregator {
    pub fn new(
        required: Vec<Category>,
        renderer: Arc<dyn Renderer>,
        queue: PrintQueue,
        last_briefing: LastBriefing,
    ) -> Self {
        Self {
            required,
            bundle: DataBundle::new(),
            renderer,
            queue,
            last_briefing,
        }
    }

    /// Current partial bundle
    pub fn bundle(&self) -> &DataBundle {
        &self.bundle
    }

    /// Parse and handle a raw delivery
    pub fn on_message(&mut self, topic: &str, payload: &[u8]) -> AggregateOutcome {
        self.handle(BriefingMessage::parse(topic, payload))
    }

    /// Handle a delivery already parsed by the adapter
    pub fn handle(&mut self, inbound: Inbound) -> AggregateOutcome {
        let message = match inbound {
            Ok(message) => message,
            Err(e) => {
                warn!(topic = %e.topic(), error = %e, "Discarding inbound message");
                return AggregateOutcome::Rejected;
            }
        };

        let category = message.category;
        let replaced = self.bundle.insert(category.clone(), message.payload);
        debug!(
            topic = %message.topic,
            category = %category,
            replaced = replaced.is_some(),
            "Category payload stored"
        );

        if !self.bundle.is_complete(&self.required) {
            let missing = self.bundle.missing(&self.required);
            info!(
                category = %category,
                have = self.bundle.len(),
                missing = ?missing.iter().map(Category::as_str).collect::<Vec<_>>(),
                "Briefing incomplete"
            );
            return AggregateOutcome::Pending { missing };
        }

        self.complete()
    }

    /// Render, submit and clear
    fn complete(&mut self) -> AggregateOutcome {
        let bundle = self.bundle.take();
        let content = self.renderer.render(&bundle);
        self.last_briefing.set(content.clone());

        let job = PrintJob::briefing(content);
        let job_name = job.job_name.clone();
        if self.queue.submit(job) {
            info!(job_name = %job_name, categories = bundle.len(), "Briefing complete, print job submitted");
            AggregateOutcome::Submitted { job_name }
        } else {
            warn!(job_name = %job_name, "Briefing complete but print queue refused it; bundle discarded");
            AggregateOutcome::Dropped { job_name }
        }
    }

    /// Consume inbound messages until shutdown or until the adapter is gone
    pub async fn run(mut self, mut inbound: mpsc::Receiver<Inbound>, shutdown: CancellationToken) {
        info!(
            required = ?self.required.iter().map(Category::as_str).collect::<Vec<_>>(),
            "Aggregator started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Aggregator received shutdown signal");
                    break;
                }
                message = inbound.recv() => {
                    let Some(message) = message else {
                        info!("Inbound channel closed, aggregator stopping");
                        break;
                    };
                    self.handle(message);
                }
            }
        }

        if !self.bundle.is_empty() {
            info!(
                categories = self.bundle.len(),
                "Aggregator stopped with a partial briefing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::queue;

    struct KeysRenderer;

    impl Renderer for KeysRenderer {
        fn render(&self, bundle: &DataBundle) -> String {
            bundle
                .iter()
                .map(|(c, v)| format!("{}={}", c, v))
                .collect::<Vec<_>>()
                .join(";")
        }
    }

    fn aggregator(capacity: usize) -> (CategorizedAggregator, queue::JobReceiver, LastBriefing) {
        let (queue, rx) = queue::channel(capacity);
        let last = LastBriefing::new();
        let agg = CategorizedAggregator::new(
            Category::defaults(),
            Arc::new(KeysRenderer),
            queue,
            last.clone(),
        );
        (agg, rx, last)
    }

    #[test]
    fn test_partial_bundle_waits() {
        let (mut agg, _rx, _) = aggregator(4);
        let outcome = agg.on_message("briefing/weather", br#"{"t":70}"#);
        assert_eq!(
            outcome,
            AggregateOutcome::Pending {
                missing: vec![Category::market(), Category::security()]
            }
        );
        assert_eq!(agg.bundle().len(), 1);
    }

    #[test]
    fn test_rejected_message_leaves_bundle_untouched() {
        let (mut agg, _rx, _) = aggregator(4);
        agg.on_message("briefing/weather", br#"{"t":70}"#);
        assert_eq!(
            agg.on_message("briefing/market", b"not json"),
            AggregateOutcome::Rejected
        );
        assert_eq!(
            agg.on_message("briefing/market", b"[1]"),
            AggregateOutcome::Rejected
        );
        assert_eq!(agg.bundle().len(), 1);
        assert!(!agg.bundle().contains(&Category::market()));
    }

    #[tokio::test]
    async fn test_completion_submits_once_and_clears() {
        let (mut agg, mut rx, last) = aggregator(4);
        agg.on_message("briefing/weather", br#"{"t":70}"#);
        agg.on_message("briefing/market", br#"{"idx":100}"#);
        agg.on_message("briefing/weather", br#"{"t":72}"#);
        let outcome = agg.on_message("briefing/security", br#"{"lvl":"low"}"#);

        assert!(matches!(outcome, AggregateOutcome::Submitted { .. }));
        assert!(agg.bundle().is_empty());

        let job = rx.recv().await.unwrap();
        assert!(job.content.contains(r#"weather={"t":72}"#));
        assert!(!job.content.contains("70"));
        assert_eq!(last.get(), Some(job.content.clone()));

        // A new cycle starts from scratch
        let outcome = agg.on_message("briefing/security", br#"{"lvl":"high"}"#);
        assert!(matches!(outcome, AggregateOutcome::Pending { .. }));
    }

    #[test]
    fn test_full_queue_still_clears_bundle() {
        let (mut agg, _rx, last) = aggregator(1);
        for _ in 0..2 {
            agg.on_message("briefing/weather", br#"{"t":1}"#);
            agg.on_message("briefing/market", br#"{"idx":1}"#);
            agg.on_message("briefing/security", br#"{"lvl":"low"}"#);
        }
        // Second completion found the queue full
        assert!(agg.bundle().is_empty());
        assert!(last.get().is_some());

        agg.on_message("briefing/weather", br#"{"t":1}"#);
        agg.on_message("briefing/market", br#"{"idx":1}"#);
        let outcome = agg.on_message("briefing/security", br#"{"lvl":"low"}"#);
        assert!(matches!(outcome, AggregateOutcome::Dropped { .. }));
        assert!(agg.bundle().is_empty());
    }
}
