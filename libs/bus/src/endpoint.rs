//! Broker endpoint validation
//!
//! Endpoints are validated before any connection state is touched, so an
//! invalid address fails `connect` without side effects. Accepted form: a
//! comma-separated list of `host:port` where host is `localhost` or a
//! dotted-quad IPv4 address (four segments, 0-255, no leading zeros) and
//! the port is in 1..=65535.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("no broker address provided")]
    Empty,
    #[error("invalid broker format: {0}. Expected host:port")]
    InvalidFormat(String),
    #[error("invalid host: {0}. Must be 'localhost' or a valid IP address")]
    InvalidHost(String),
    #[error("invalid port: {0}. Must be between 1 and 65535")]
    InvalidPort(String),
}

/// Validate a comma-separated broker list.
pub fn validate_brokers(brokers: &str) -> Result<(), EndpointError> {
    if brokers.trim().is_empty() {
        return Err(EndpointError::Empty);
    }

    for raw in brokers.split(',') {
        let broker = raw.trim();
        let (host, port) = broker
            .split_once(':')
            .ok_or_else(|| EndpointError::InvalidFormat(broker.to_string()))?;

        if host.is_empty() || port.is_empty() {
            return Err(EndpointError::InvalidFormat(broker.to_string()));
        }

        match port.parse::<u32>() {
            Ok(p) if (1..=65535).contains(&p) => {}
            _ => return Err(EndpointError::InvalidPort(port.to_string())),
        }

        if host != "localhost" && !is_valid_ipv4(host) {
            return Err(EndpointError::InvalidHost(host.to_string()));
        }
    }

    Ok(())
}

/// Dotted-quad IPv4 check: exactly four numeric segments in 0..=255, no
/// leading zeros.
fn is_valid_ipv4(host: &str) -> bool {
    let segments: Vec<&str> = host.split('.').collect();
    if segments.len() != 4 {
        return false;
    }
    segments.iter().all(|segment| {
        if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
            return false;
        }
        matches!(segment.parse::<u32>(), Ok(v) if v <= 255)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localhost_accepted() {
        assert!(validate_brokers("localhost:9092").is_ok());
    }

    #[test]
    fn test_ipv4_accepted() {
        assert!(validate_brokers("127.0.0.1:9092").is_ok());
        assert!(validate_brokers("10.0.0.255:1").is_ok());
    }

    #[test]
    fn test_broker_list_accepted() {
        assert!(validate_brokers("localhost:9092, 127.0.0.1:9093").is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(validate_brokers(""), Err(EndpointError::Empty));
        assert_eq!(validate_brokers("   "), Err(EndpointError::Empty));
    }

    #[test]
    fn test_missing_port_rejected() {
        assert!(matches!(
            validate_brokers("localhost"),
            Err(EndpointError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_brokers("localhost:"),
            Err(EndpointError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_bad_port_rejected() {
        assert!(matches!(
            validate_brokers("localhost:0"),
            Err(EndpointError::InvalidPort(_))
        ));
        assert!(matches!(
            validate_brokers("localhost:65536"),
            Err(EndpointError::InvalidPort(_))
        ));
        assert!(matches!(
            validate_brokers("localhost:nine"),
            Err(EndpointError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_bad_host_rejected() {
        assert!(matches!(
            validate_brokers("redpanda:9092"),
            Err(EndpointError::InvalidHost(_))
        ));
        assert!(matches!(
            validate_brokers("256.0.0.1:9092"),
            Err(EndpointError::InvalidHost(_))
        ));
        assert!(matches!(
            validate_brokers("1.2.3:9092"),
            Err(EndpointError::InvalidHost(_))
        ));
        // Leading zeros are not dotted-quad
        assert!(matches!(
            validate_brokers("127.0.0.01:9092"),
            Err(EndpointError::InvalidHost(_))
        ));
    }
}
