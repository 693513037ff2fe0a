use crate::utils::{AppError, AppResult};
use briefing_printer::PrintOptions;
use shared::category::{Category, parse_category_list};
use shared::message::DEFAULT_TOPIC_FILTER;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which transport carries print jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterBackend {
    /// Local CUPS queue via `lp`
    Cups,
    /// Raw TCP port 9100
    Network,
}

impl FromStr for PrinterBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cups" => Ok(Self::Cups),
            "network" | "tcp" => Ok(Self::Network),
            other => Err(AppError::config(format!(
                "PRINTER_BACKEND must be cups or network, got {:?}",
                other
            ))),
        }
    }
}

/// Broker TLS material (AWS IoT style mutual TLS)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttTls {
    pub ca_path: PathBuf,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

/// MQTT connection settings
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Subscription filters, re-applied on every connect
    pub topics: Vec<String>,
    pub keep_alive: Duration,
    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,
    pub tls: Option<MqttTls>,
    /// Adapter → aggregator channel bound
    pub inbound_capacity: usize,
}

/// Printer selection
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    pub backend: PrinterBackend,
    /// CUPS queue name
    pub name: String,
    /// Raw TCP address
    pub addr: String,
}

/// Print queue and worker settings
#[derive(Debug, Clone)]
pub struct PrintConfig {
    pub queue_capacity: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub temp_dir: PathBuf,
    pub characters_per_inch: u8,
    pub lines_per_inch: u8,
    pub priority: u8,
}

impl PrintConfig {
    pub fn options(&self) -> PrintOptions {
        PrintOptions {
            raw_mode: true,
            characters_per_inch: self.characters_per_inch,
            lines_per_inch: self.lines_per_inch,
            priority: self.priority,
        }
    }
}

/// Briefing layout settings
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub width: usize,
    pub location: String,
    pub classification: String,
}

/// Hardware trigger settings
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub enabled: bool,
    /// BCM pin numbers
    pub button_pin: u8,
    pub led_pin: u8,
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub led_pulse: Duration,
}

/// Field device configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/briefing | Working directory (logs under `logs/`) |
/// | ENVIRONMENT | development | development / production |
/// | LOG_LEVEL | info | Log filter when `RUST_LOG` is unset |
/// | MQTT_HOST / MQTT_PORT | localhost / 1883 | Broker endpoint |
/// | MQTT_CLIENT_ID | briefing-field-device | Client id |
/// | MQTT_TOPICS | briefing/# | Comma-separated filters |
/// | MQTT_KEEP_ALIVE_SECS | 30 | Keep-alive |
/// | MQTT_RECONNECT_DELAY_MS | 5000 | Fixed reconnect backoff |
/// | MQTT_CA_PATH / MQTT_CERT_PATH / MQTT_KEY_PATH | unset | TLS material |
/// | MQTT_INBOUND_CAPACITY | 64 | Inbound channel bound |
/// | REQUIRED_CATEGORIES | weather,market,security | Completion set |
/// | PRINTER_BACKEND | cups | cups / network |
/// | PRINTER_NAME | KX-P1592 | CUPS queue |
/// | PRINTER_ADDR | 127.0.0.1:9100 | Raw TCP address |
/// | PRINT_QUEUE_CAPACITY | 16 | Queue bound |
/// | PRINT_MAX_RETRIES | 3 | Attempts per job |
/// | PRINT_RETRY_DELAY_MS | 5000 | Delay between attempts |
/// | PRINT_TEMP_DIR | /tmp/print_jobs | Artifact directory |
/// | PRINT_CPI / PRINT_LPI / PRINT_PRIORITY | 10 / 6 / 50 | Device options |
/// | REPORT_WIDTH | 50 | Briefing width |
/// | REPORT_LOCATION / REPORT_CLASSIFICATION | N/A / CONFIDENTIAL | Header fields |
/// | PRINT_TEST_PAGE_ON_START | false | Queue a test page at boot |
/// | CANCEL_STALE_JOBS_ON_START | false | Cancel spooler jobs at boot |
/// | TRIGGER_ENABLED | true | Hardware trigger |
/// | BUTTON_PIN / LED_PIN | 17 / 27 | BCM pins |
/// | BUTTON_POLL_MS / BUTTON_DEBOUNCE_MS / LED_PULSE_MS | 10 / 200 / 300 | Trigger timing |
///
/// # Example
///
/// ```ignore
/// PRINTER_BACKEND=network PRINTER_ADDR=192.168.1.50:9100 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    /// development | production
    pub environment: String,
    pub log_level: String,
    pub mqtt: MqttConfig,
    pub required_categories: Vec<Category>,
    pub printer: PrinterConfig,
    pub print: PrintConfig,
    pub report: ReportConfig,
    pub trigger: TriggerConfig,
    pub print_test_page_on_start: bool,
    pub cancel_stale_jobs_on_start: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable numeric values fall back to their defaults.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key → value source
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());
        let path = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        let millis = |key: &str, default: u64| {
            Duration::from_millis(
                lookup(key)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(default),
            )
        };
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        };

        let required_categories = match lookup("REQUIRED_CATEGORIES") {
            Some(raw) => parse_category_list(&raw).map_err(AppError::Config)?,
            None => Category::defaults(),
        };

        let tls = path("MQTT_CA_PATH").map(|ca_path| MqttTls {
            ca_path,
            cert_path: path("MQTT_CERT_PATH"),
            key_path: path("MQTT_KEY_PATH"),
        });

        Ok(Self {
            work_dir: string("WORK_DIR", "/var/lib/briefing"),
            environment: string("ENVIRONMENT", "development"),
            log_level: string("LOG_LEVEL", "info"),
            mqtt: MqttConfig {
                host: string("MQTT_HOST", "localhost"),
                port: parse_or(&lookup, "MQTT_PORT", 1883),
                client_id: string("MQTT_CLIENT_ID", "briefing-field-device"),
                topics: string("MQTT_TOPICS", DEFAULT_TOPIC_FILTER)
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
                keep_alive: Duration::from_secs(parse_or(&lookup, "MQTT_KEEP_ALIVE_SECS", 30)),
                reconnect_delay: millis("MQTT_RECONNECT_DELAY_MS", 5000),
                tls,
                inbound_capacity: parse_or(&lookup, "MQTT_INBOUND_CAPACITY", 64),
            },
            required_categories,
            printer: PrinterConfig {
                backend: match lookup("PRINTER_BACKEND") {
                    Some(v) => v.parse()?,
                    None => PrinterBackend::Cups,
                },
                name: string("PRINTER_NAME", "KX-P1592"),
                addr: string("PRINTER_ADDR", "127.0.0.1:9100"),
            },
            print: PrintConfig {
                queue_capacity: parse_or(&lookup, "PRINT_QUEUE_CAPACITY", 16),
                max_retries: parse_or(&lookup, "PRINT_MAX_RETRIES", 3),
                retry_delay: millis("PRINT_RETRY_DELAY_MS", 5000),
                temp_dir: path("PRINT_TEMP_DIR").unwrap_or_else(|| "/tmp/print_jobs".into()),
                characters_per_inch: parse_or(&lookup, "PRINT_CPI", 10),
                lines_per_inch: parse_or(&lookup, "PRINT_LPI", 6),
                priority: parse_or(&lookup, "PRINT_PRIORITY", 50),
            },
            report: ReportConfig {
                width: parse_or(&lookup, "REPORT_WIDTH", 50),
                location: string("REPORT_LOCATION", "N/A"),
                classification: string("REPORT_CLASSIFICATION", "CONFIDENTIAL"),
            },
            trigger: TriggerConfig {
                enabled: flag("TRIGGER_ENABLED", true),
                button_pin: parse_or(&lookup, "BUTTON_PIN", 17),
                led_pin: parse_or(&lookup, "LED_PIN", 27),
                poll_interval: millis("BUTTON_POLL_MS", 10),
                debounce: millis("BUTTON_DEBOUNCE_MS", 200),
                led_pulse: millis("LED_PULSE_MS", 300),
            },
            print_test_page_on_start: flag("PRINT_TEST_PAGE_ON_START", false),
            cancel_stale_jobs_on_start: flag("CANCEL_STALE_JOBS_ON_START", false),
        })
    }

    /// Reject settings the device cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.print.max_retries == 0 {
            return Err(AppError::config("PRINT_MAX_RETRIES must be at least 1"));
        }
        if self.print.queue_capacity == 0 {
            return Err(AppError::config("PRINT_QUEUE_CAPACITY must be at least 1"));
        }
        if self.mqtt.inbound_capacity == 0 {
            return Err(AppError::config("MQTT_INBOUND_CAPACITY must be at least 1"));
        }
        if self.required_categories.is_empty() {
            return Err(AppError::config("REQUIRED_CATEGORIES must not be empty"));
        }
        if self.mqtt.topics.is_empty() {
            return Err(AppError::config("MQTT_TOPICS must not be empty"));
        }
        if self.trigger.enabled && self.trigger.poll_interval.is_zero() {
            return Err(AppError::config("BUTTON_POLL_MS must be at least 1"));
        }
        if self.report.width < 20 {
            return Err(AppError::config("REPORT_WIDTH must be at least 20"));
        }
        if let Some(tls) = &self.mqtt.tls
            && tls.cert_path.is_some() != tls.key_path.is_some()
        {
            return Err(AppError::config(
                "MQTT_CERT_PATH and MQTT_KEY_PATH must be set together",
            ));
        }
        Ok(())
    }

    /// Log directory under the working directory
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Whether this is the production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
