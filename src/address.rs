//! Server addresses.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Where to dial.
///
/// `Display` produces the string handed to the socket layer: `ip:port` for
/// IPv4 and hostnames, `[ip]:port` for IPv6.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Address {
    /// An IPv4 address.
    V4 {
        /// The IP.
        ip: Ipv4Addr,
        /// The TCP port.
        port: u16,
    },
    /// An IPv6 address.
    V6 {
        /// The IP.
        ip: Ipv6Addr,
        /// The TCP port.
        port: u16,
    },
    /// A DNS name, resolved at dial time.
    Host {
        /// The hostname.
        host: String,
        /// The TCP port.
        port: u16,
    },
}

impl Address {
    /// Build a hostname address.
    pub fn host(host: impl Into<String>, port: u16) -> Self {
        Address::Host {
            host: host.into(),
            port,
        }
    }

    /// The host part, without port or brackets. Used as the TLS server name.
    pub fn hostname(&self) -> String {
        match self {
            Address::V4 { ip, .. } => ip.to_string(),
            Address::V6 { ip, .. } => ip.to_string(),
            Address::Host { host, .. } => host.clone(),
        }
    }

    /// The TCP port.
    pub fn port(&self) -> u16 {
        match self {
            Address::V4 { port, .. } | Address::V6 { port, .. } | Address::Host { port, .. } => {
                *port
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::V4 { ip, port } => write!(f, "{}:{}", ip, port),
            Address::V6 { ip, port } => write!(f, "[{}]:{}", ip, port),
            Address::Host { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

/// Error returned when a string is not `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address {0:?}: expected host:port")]
pub struct AddressParseError(String);

impl FromStr for Address {
    type Err = AddressParseError;

    /// Parses `host:port`, `a.b.c.d:port` or `[v6]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AddressParseError(s.to_owned());
        let (host, port) = s.rsplit_once(':').ok_or_else(err)?;
        let port: u16 = port.parse().map_err(|_| err())?;

        if let Some(v6) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            let ip = v6.parse().map_err(|_| err())?;
            return Ok(Address::V6 { ip, port });
        }
        if host.is_empty() || host.contains(':') {
            return Err(err());
        }
        Ok(match host.parse::<Ipv4Addr>() {
            Ok(ip) => Address::V4 { ip, port },
            Err(_) => Address::host(host, port),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let v4 = Address::V4 {
            ip: Ipv4Addr::new(127, 0, 0, 1),
            port: 6667,
        };
        assert_eq!(v4.to_string(), "127.0.0.1:6667");

        let v6 = Address::V6 {
            ip: Ipv6Addr::LOCALHOST,
            port: 6697,
        };
        assert_eq!(v6.to_string(), "[::1]:6697");

        assert_eq!(Address::host("irc.libera.chat", 6697).to_string(), "irc.libera.chat:6697");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "127.0.0.1:6667".parse::<Address>().unwrap(),
            Address::V4 {
                ip: Ipv4Addr::new(127, 0, 0, 1),
                port: 6667
            }
        );
        assert_eq!(
            "[::1]:6697".parse::<Address>().unwrap(),
            Address::V6 {
                ip: Ipv6Addr::LOCALHOST,
                port: 6697
            }
        );
        assert_eq!(
            "irc.libera.chat:6697".parse::<Address>().unwrap(),
            Address::host("irc.libera.chat", 6697)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("irc.libera.chat".parse::<Address>().is_err());
        assert!(":6667".parse::<Address>().is_err());
        assert!("host:notaport".parse::<Address>().is_err());
        assert!("::1:6667".parse::<Address>().is_err());
    }

    #[test]
    fn test_hostname() {
        assert_eq!("[::1]:6697".parse::<Address>().unwrap().hostname(), "::1");
        assert_eq!(Address::host("example.org", 1).hostname(), "example.org");
    }
}
