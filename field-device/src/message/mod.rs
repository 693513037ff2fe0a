//! Inbound message path
//!
//! ```text
//! broker ──► BrokerLink ──► ConnectionSupervisor ──(bounded mpsc)──► CategorizedAggregator ──► PrintQueue
//! ```
//!
//! - [`supervisor`] - connection state machine, re-subscription, parsing
//! - [`mqtt`] - rumqttc implementation of [`BrokerLink`]
//! - [`aggregator`] - bundle accumulation and completion

pub mod aggregator;
pub mod mqtt;
pub mod supervisor;

pub use aggregator::{AggregateOutcome, CategorizedAggregator, Inbound, LastBriefing};
pub use mqtt::RumqttLink;
pub use supervisor::{BrokerError, BrokerLink, ConnectionState, ConnectionSupervisor, LinkEvent};
