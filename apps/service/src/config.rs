use std::{env, fmt, fs, io, path};

use relay_qos::{ProbeSettings, SystemDescriptor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file: {0}")]
    ReadFailed(#[source] io::Error),
    #[error("failed to write config file: {0}")]
    WriteFailed(#[source] io::Error),
    #[error("failed to parse config file: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config path available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: Service,
    pub event_receiver: EventReceiver,
    pub gatekeeper: Gatekeeper,
    pub ping_monitor: PingMonitor,
    pub probe: ProbeSettings,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    /// No peer clouds configured
    pub standalone: bool,
    /// Transport security enabled
    pub secure: bool,
    pub keypair_path: String,
    pub relay_echo_interval_seconds: u64,
    /// `compact` or `json`; empty falls back to RUST_LOG_FORMAT
    pub log_format: String,
    pub request_timeout_seconds: u64,
}

/// Where the external ping monitor delivers its events
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EventReceiver {
    pub system_name: String,
    pub bind: String,
    /// Address advertised to the ping monitor
    pub address: String,
    pub port: u16,
    pub path: String,
    /// Where relay echo measurement status changes are reported
    pub measurements_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Gatekeeper {
    pub address: String,
    pub port: u16,
    pub secure: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PingMonitor {
    pub address: String,
    pub port: u16,
    pub path: String,
    pub secure: bool,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            standalone: false,
            secure: true,
            keypair_path: "relay_qos_keypair.key".into(),
            relay_echo_interval_seconds: 30,
            log_format: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for EventReceiver {
    fn default() -> Self {
        Self {
            system_name: "qosmonitor".into(),
            bind: "0.0.0.0".into(),
            address: "127.0.0.1".into(),
            port: 8451,
            path: "/events".into(),
            measurements_path: "/measurements/relay-echo".into(),
        }
    }
}

impl Default for Gatekeeper {
    fn default() -> Self {
        Self { address: "127.0.0.1".into(), port: 8449, secure: true }
    }
}

impl Default for PingMonitor {
    fn default() -> Self {
        Self { address: "127.0.0.1".into(), port: 8888, path: "/ping".into(), secure: false }
    }
}

impl EventReceiver {
    /// How this node registers itself with the ping monitor's event stream
    pub fn subscriber(&self) -> SystemDescriptor {
        SystemDescriptor {
            system_name: self.system_name.clone(),
            address: self.address.clone(),
            port: self.port,
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/relay-qos/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Ok(home_dir) = env::var("HOME") {
        path::PathBuf::from(home_dir).join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("relay-qos/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Service")?;
        write_1(f, "Standalone", &self.service.standalone)?;
        write_1(f, "Secure", &self.service.secure)?;
        write_1(f, "Keypair Path", &self.service.keypair_path)?;
        write_1(f, "Relay Echo Interval (s)", &self.service.relay_echo_interval_seconds)?;
        write_title_1(f, "Event Receiver")?;
        write_1(f, "Bind Address", &self.event_receiver.bind)?;
        write_1(f, "Advertised Address", &self.event_receiver.address)?;
        write_1(f, "Port", &self.event_receiver.port)?;
        write_1(f, "Path", &self.event_receiver.path)?;
        write_1(f, "Measurements Path", &self.event_receiver.measurements_path)?;
        write_title_1(f, "Gatekeeper")?;
        write_1(f, "Address", &self.gatekeeper.address)?;
        write_1(f, "Port", &self.gatekeeper.port)?;
        write_1(f, "Secure", &self.gatekeeper.secure)?;
        write_title_1(f, "Ping Monitor")?;
        write_1(f, "Address", &self.ping_monitor.address)?;
        write_1(f, "Port", &self.ping_monitor.port)?;
        write_1(f, "Path", &self.ping_monitor.path)?;
        write_1(f, "Secure", &self.ping_monitor.secure)?;
        write_title_1(f, "Probe")?;
        write_1(f, "Timeout (ms)", &self.probe.timeout_ms)?;
        write_1(f, "Repeat", &self.probe.repeat)?;
        write_1(f, "Packet Size", &self.probe.packet_size)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/relay-qos/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(Error::ReadFailed)?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::WriteFailed)?;
        }

        fs::write(path, config_str).map_err(Error::WriteFailed)
    }

    /// Reject settings the probe and scheduler can not work with
    pub fn validate(&self) -> Result<(), Error> {
        if self.probe.repeat == 0 {
            return Err(Error::Invalid("probe.repeat must be at least 1".into()));
        }
        if self.probe.timeout_ms == 0 {
            return Err(Error::Invalid("probe.timeout_ms must be positive".into()));
        }
        if !self.probe.within_wait_limit() {
            return Err(Error::Invalid(format!(
                "probe.timeout_ms * probe.repeat * 2 must not exceed {}s",
                relay_qos::probe::MAX_WAIT_BUDGET.as_secs()
            )));
        }
        if self.service.relay_echo_interval_seconds == 0 {
            return Err(Error::Invalid("service.relay_echo_interval_seconds must be positive".into()));
        }
        if !self.event_receiver.path.starts_with('/') {
            return Err(Error::Invalid("event_receiver.path must start with '/'".into()));
        }
        if !self.event_receiver.measurements_path.starts_with('/') {
            return Err(Error::Invalid("event_receiver.measurements_path must start with '/'".into()));
        }
        if self.event_receiver.measurements_path == self.event_receiver.path {
            return Err(Error::Invalid("event_receiver.measurements_path must differ from event_receiver.path".into()));
        }
        Ok(())
    }

    /// Explicit log format, if one is configured
    pub fn log_format(&self) -> Option<logger::LogFormat> {
        self.service.log_format.parse().ok().filter(|_| !self.service.log_format.is_empty())
    }
}
