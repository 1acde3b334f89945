//! Endpoint configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;
use tether_core::ConfigError;
use tether_core::address::validate_address;

/// Configuration for an [`Endpoint`](crate::Endpoint).
///
/// Validated once, when the endpoint is constructed. Invalid values are
/// rejected, never replaced by defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Port the inbound listener binds to.
    pub recv_port: u16,
    /// Port outgoing messages are sent to.
    pub send_port: u16,
    /// IP literal used both for the listener and as the destination.
    pub ip: String,
    /// Prefix inbound messages must match. Must begin with `/`.
    pub default_address: String,
    /// Seconds between heartbeat broadcasts.
    pub status_interval: f64,
    /// Stop the endpoint on the first dispatch fault instead of logging it.
    pub strict: bool,
    /// Stop the endpoint on Ctrl-C.
    ///
    /// Once an endpoint with this set starts, tokio's signal handler stays
    /// installed for the life of the process: later Ctrl-C presses no
    /// longer terminate it by default. Turn this off in embedders that
    /// handle SIGINT themselves.
    pub handle_interrupt: bool,
    /// Largest inbound datagram accepted, in bytes.
    pub recv_buffer: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            recv_port: 8081,
            send_port: 8082,
            ip: "127.0.0.1".to_owned(),
            default_address: "/control".to_owned(),
            status_interval: 1.0,
            strict: false,
            handle_interrupt: true,
            recv_buffer: 65_536,
        }
    }
}

impl EndpointConfig {
    /// Parse from JSON, filling missing fields with defaults, and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::InvalidSetting {
            setting: "config".to_owned(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ip_addr()?;
        validate_address(&self.default_address)?;
        if !self.status_interval.is_finite() || self.status_interval <= 0.0 {
            return Err(ConfigError::InvalidSetting {
                setting: "status_interval".to_owned(),
                reason: format!(
                    "must be a positive number of seconds, got {}",
                    self.status_interval
                ),
            });
        }
        if self.recv_buffer == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "recv_buffer".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }

    /// The parsed IP address.
    pub fn ip_addr(&self) -> Result<IpAddr, ConfigError> {
        self.ip
            .parse()
            .map_err(|_| ConfigError::InvalidIp(self.ip.clone()))
    }

    /// Where the inbound listener binds.
    pub fn recv_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.ip_addr()?, self.recv_port))
    }

    /// Where outgoing messages go.
    pub fn destination(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.ip_addr()?, self.send_port))
    }

    /// The heartbeat interval. Assumes the config has been validated.
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs_f64(self.status_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EndpointConfig::default().validate().unwrap();
    }

    #[test]
    fn bad_ip_is_rejected_not_defaulted() {
        let config = EndpointConfig {
            ip: "256.0.0.1".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidIp(ref ip)) if ip == "256.0.0.1"
        ));
    }

    #[test]
    fn prefix_must_start_with_slash() {
        let config = EndpointConfig {
            default_address: "engine".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAddress { .. })));
    }

    #[test]
    fn interval_must_be_positive() {
        let config = EndpointConfig {
            status_interval: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_fills_defaults() {
        let config =
            EndpointConfig::from_json(r#"{"recv_port": 9000, "status_interval": 0.25}"#).unwrap();
        assert_eq!(config.recv_port, 9000);
        assert_eq!(config.status_interval(), Duration::from_millis(250));
        assert_eq!(config.default_address, "/control");

        assert!(EndpointConfig::from_json(r#"{"ip": "localhost"}"#).is_err());
    }

    #[test]
    fn interrupt_handling_is_on_unless_disabled() {
        assert!(EndpointConfig::default().handle_interrupt);
        let config = EndpointConfig::from_json(r#"{"handle_interrupt": false}"#).unwrap();
        assert!(!config.handle_interrupt);
    }
}
