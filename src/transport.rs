//! Dialing the server over plain TCP or TLS.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{self, pki_types::ServerName};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::address::Address;
use crate::error::ConnectError;

/// Read half handed to the read loop.
pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
/// Write half handed to the write loop.
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// An established client transport.
#[allow(clippy::large_enum_variant)]
pub enum Transport {
    /// Plain TCP.
    Tcp(TcpStream),
    /// TLS over TCP.
    Tls(TlsStream<TcpStream>),
}

impl Transport {
    /// Dial `address`, performing the TLS handshake when `tls` is set.
    ///
    /// The whole dial, handshake included, is bounded by `timeout`.
    pub async fn dial(
        address: &Address,
        tls: Option<Arc<rustls::ClientConfig>>,
        timeout: Duration,
        tcp_keepalive: bool,
    ) -> Result<Self, ConnectError> {
        let target = address.to_string();
        let connection_error = |source: io::Error| ConnectError::Connection {
            address: target.clone(),
            source,
        };

        let server_name = match tls {
            Some(_) => Some(ServerName::try_from(address.hostname()).map_err(|_| {
                ConnectError::InvalidServerName {
                    host: address.hostname(),
                }
            })?),
            None => None,
        };

        let dial = async {
            let stream = TcpStream::connect(target.as_str()).await?;
            if tcp_keepalive {
                if let Err(e) = Self::enable_keepalive(&stream) {
                    warn!("failed to enable TCP keepalive: {}", e);
                }
            }

            let transport = match (tls, server_name) {
                (Some(config), Some(name)) => {
                    let connector = TlsConnector::from(config);
                    Transport::Tls(connector.connect(name, stream).await?)
                }
                _ => Transport::Tcp(stream),
            };
            Ok::<_, io::Error>(transport)
        };

        let transport = tokio::time::timeout(timeout, dial)
            .await
            .map_err(|_| {
                connection_error(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("dial timed out after {:?}", timeout),
                ))
            })?
            .map_err(connection_error)?;

        debug!(
            address = %target,
            tls = transport.is_tls(),
            "transport established"
        );
        Ok(transport)
    }

    fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
        use socket2::{SockRef, TcpKeepalive};

        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));

        sock.set_tcp_keepalive(&keepalive)
    }

    /// Returns `true` for TLS transports.
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    fn tcp(&self) -> &TcpStream {
        match self {
            Transport::Tcp(stream) => stream,
            Transport::Tls(stream) => stream.get_ref().0,
        }
    }

    /// Local socket address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().local_addr()
    }

    /// Remote socket address.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().peer_addr()
    }

    /// Split into independently owned read and write halves.
    ///
    /// The socket closes once both halves are dropped.
    pub(crate) fn into_split(self) -> (BoxedReader, BoxedWriter) {
        match self {
            Transport::Tcp(stream) => {
                let (reader, writer) = stream.into_split();
                (Box::new(reader), Box::new(writer))
            }
            Transport::Tls(stream) => {
                let (reader, writer) = tokio::io::split(stream);
                (Box::new(reader), Box::new(writer))
            }
        }
    }
}

/// A TLS configuration trusting the bundled Mozilla root certificates.
pub fn default_tls_config() -> Arc<rustls::ClientConfig> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_dial_plain_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let address: Address = format!("127.0.0.1:{}", port).parse().unwrap();

        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });
        let transport = Transport::dial(&address, None, Duration::from_secs(5), true)
            .await
            .unwrap();
        let (_server_side, peer) = accept.await.unwrap();

        assert!(!transport.is_tls());
        assert_eq!(transport.local_addr().unwrap(), peer);
    }

    #[tokio::test]
    async fn test_dial_refused_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let address: Address = format!("127.0.0.1:{}", port).parse().unwrap();

        let err = Transport::dial(&address, None, Duration::from_secs(5), false)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConnectError::Connection { .. }));
    }
}
