//! Utility functions shared across the application.

mod secret;

pub use secret::SecretString;

use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Parse a host and port into a socket address.
///
/// IPv6 hosts must be bracketed (`[::1]`).
pub fn socket_addr(host: &str, port: u16) -> Result<SocketAddr, std::net::AddrParseError> {
    format!("{}:{}", host, port).parse()
}

/// Bind a listener on exactly the requested address.
///
/// There is no fallback to alternate ports: the gate fronts the web app,
/// so browsers and reverse proxies expect it at a fixed address.
pub async fn bind_strict(addr: SocketAddr) -> std::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr_ipv4() {
        let addr = socket_addr("127.0.0.1", 3000).unwrap();
        assert_eq!(addr.port(), 3000);
        assert!(addr.is_ipv4());
    }

    #[test]
    fn test_socket_addr_ipv6() {
        let addr = socket_addr("[::1]", 8080).unwrap();
        assert!(addr.is_ipv6());
    }

    #[test]
    fn test_socket_addr_invalid() {
        assert!(socket_addr("not-an-ip", 8080).is_err());
    }

    #[tokio::test]
    async fn test_bind_strict_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken = listener.local_addr().unwrap();

        let result = bind_strict(taken).await;
        assert!(result.is_err());

        drop(listener);
    }

    #[tokio::test]
    async fn test_bind_strict_ephemeral() {
        let listener = bind_strict(socket_addr("127.0.0.1", 0).unwrap())
            .await
            .unwrap();
        assert!(listener.local_addr().unwrap().port() > 0);
    }
}
