// src/reachability.rs
//
// A short-lived TCP connect used only to gate entry into the main loop;
// the connection is dropped immediately on success.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::OuterFault;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn probe(host: &str, port: u16) -> Result<(), OuterFault> {
    match timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(source)) => Err(OuterFault::Unreachable {
            host: host.to_string(),
            port,
            source,
        }),
        Err(_) => Err(OuterFault::Unreachable {
            host: host.to_string(),
            port,
            source: std::io::Error::new(std::io::ErrorKind::TimedOut, "reachability probe timed out"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_refused_is_unreachable() {
        // Port 1 is reserved and nothing should be listening on loopback.
        let err = probe("127.0.0.1", 1).await.unwrap_err();
        assert!(matches!(err, OuterFault::Unreachable { .. }));
    }

    #[tokio::test]
    async fn connect_to_open_listener_succeeds() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });
        probe("127.0.0.1", addr.port()).await.unwrap();
    }
}
