// SPDX-License-Identifier: MPL-2.0

//! Is the backend worth trying right now?
//!
//! The repository asks this before every network attempt. A `false` answer
//! sends it straight to the on-disk snapshot.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Probes by opening (and dropping) a TCP connection to the API host.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Probe the host and port the API base URL points at.
    pub fn for_endpoint(base: &Url, timeout: Duration) -> Option<Self> {
        let host = base.host_str()?;
        let port = base.port_or_known_default()?;
        Some(Self::new(format!("{host}:{port}"), timeout))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Reachability for TcpProbe {
    async fn is_reachable(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "probe connect failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, "probe timed out");
                false
            }
        }
    }
}

/// A connectivity flag fed from outside, e.g. by a platform network monitor.
#[derive(Debug, Clone)]
pub struct ReachabilityFlag(Arc<AtomicBool>);

impl ReachabilityFlag {
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub fn set(&self, online: bool) {
        self.0.store(online, Ordering::Release);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Reachability for ReachabilityFlag {
    async fn is_reachable(&self) -> bool {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_address_from_url() {
        let url = Url::parse("https://api.example.org/api/v1").unwrap();
        let probe = TcpProbe::for_endpoint(&url, Duration::from_millis(10)).unwrap();
        assert_eq!(probe.addr(), "api.example.org:443");

        let url = Url::parse("http://localhost:8080/").unwrap();
        let probe = TcpProbe::for_endpoint(&url, Duration::from_millis(10)).unwrap();
        assert_eq!(probe.addr(), "localhost:8080");
    }

    #[tokio::test]
    async fn test_probe_reaches_listening_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(1));
        assert!(probe.is_reachable().await);
    }

    #[tokio::test]
    async fn test_probe_fails_on_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(1));
        assert!(!probe.is_reachable().await);
    }

    #[tokio::test]
    async fn test_flag_is_shared_between_clones() {
        let flag = ReachabilityFlag::new(false);
        let observer = flag.clone();
        assert!(!observer.is_reachable().await);
        flag.set(true);
        assert!(observer.is_reachable().await);
    }
}
