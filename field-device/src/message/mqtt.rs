//! MQTT broker link (rumqttc)
//!
//! Plain TCP by default; with `MQTT_CA_PATH` set the session uses TLS, and
//! with a client certificate and key it authenticates the way AWS IoT Core
//! expects (mutual TLS on port 8883).

use super::supervisor::{BrokerError, BrokerLink, LinkEvent};
use crate::core::config::{MqttConfig, MqttTls};
use crate::utils::{AppError, AppResult};
use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS,
    SubscribeReasonCode, TlsConfiguration, Transport,
};
use tracing::{debug, info};

/// Extra request slots beyond one per topic filter
const REQUEST_HEADROOM: usize = 10;

pub struct RumqttLink {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl RumqttLink {
    /// Build the client; no network traffic happens until the first poll
    pub fn new(config: &MqttConfig) -> AppResult<Self> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keep_alive);
        options.set_clean_session(true);

        if let Some(tls) = &config.tls {
            options.set_transport(Transport::tls_with_config(tls_configuration(tls)?));
            info!(ca = %tls.ca_path.display(), mutual = tls.cert_path.is_some(), "MQTT TLS enabled");
        }

        let (client, eventloop) =
            AsyncClient::new(options, config.topics.len() + REQUEST_HEADROOM);
        info!(host = %config.host, port = config.port, client_id = %config.client_id, "MQTT client created");
        Ok(Self { client, eventloop })
    }
}

fn tls_configuration(tls: &MqttTls) -> AppResult<TlsConfiguration> {
    let read = |path: &std::path::Path| {
        std::fs::read(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {}", path.display(), e)))
    };

    let ca = read(&tls.ca_path)?;
    let client_auth = match (&tls.cert_path, &tls.key_path) {
        (Some(cert), Some(key)) => Some((read(cert)?, read(key)?)),
        (None, None) => None,
        _ => {
            return Err(AppError::config(
                "MQTT_CERT_PATH and MQTT_KEY_PATH must be set together",
            ));
        }
    };

    Ok(TlsConfiguration::Simple {
        ca,
        alpn: None,
        client_auth,
    })
}

#[async_trait]
impl BrokerLink for RumqttLink {
    async fn poll(&mut self) -> Result<LinkEvent, BrokerError> {
        let event = self
            .eventloop
            .poll()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code == ConnectReturnCode::Success {
                    Ok(LinkEvent::Connected)
                } else {
                    Err(BrokerError::Refused(format!("{:?}", ack.code)))
                }
            }
            Event::Incoming(Packet::Publish(publish)) => Ok(LinkEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            Event::Incoming(Packet::SubAck(ack)) => {
                if ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure))
                {
                    return Err(BrokerError::Subscribe {
                        filter: format!("pkid {}", ack.pkid),
                        reason: "rejected by broker".into(),
                    });
                }
                debug!(pkid = ack.pkid, "Subscription acknowledged");
                Ok(LinkEvent::Other)
            }
            _ => Ok(LinkEvent::Other),
        }
    }

    async fn subscribe(&mut self, filter: &str) -> Result<(), BrokerError> {
        self.client
            .subscribe(filter, QoS::AtLeastOnce)
            .await
            .map_err(|e| BrokerError::Subscribe {
                filter: filter.to_string(),
                reason: e.to_string(),
            })
    }
}
