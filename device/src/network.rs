//! Connectivity as seen from the host.
//!
//! The host is "connected" while the OS has a route to the inference
//! server. A UDP socket connected to the endpoint reveals the local address
//! the route would use; no packet is ever sent. The endpoint host is
//! resolved once when the link is built, so probes never block on DNS.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use pipeline::Connectivity;

/// Route probe towards the inference server's host
#[derive(Debug, Clone)]
pub struct HostLink {
    target: Option<SocketAddr>,
}

impl HostLink {
    /// Resolve the host and port of an `http(s)://` endpoint
    pub async fn for_endpoint(endpoint: &str) -> Self {
        let Some((host, port)) = host_and_port(endpoint) else {
            log::warn!("Endpoint {} has no usable host", endpoint);
            return Self { target: None };
        };

        let target = match tokio::net::lookup_host((host.as_str(), port)).await {
            Ok(mut addrs) => addrs.next(),
            Err(e) => {
                log::warn!("Cannot resolve {}: {}", host, e);
                None
            }
        };
        Self { target }
    }

    fn probe(&self) -> Option<IpAddr> {
        let target = self.target?;

        let bind = match target {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(bind).ok()?;
        socket.connect(target).ok()?;

        let local = socket.local_addr().ok()?.ip();
        (!local.is_unspecified()).then_some(local)
    }
}

fn host_and_port(endpoint: &str) -> Option<(String, u16)> {
    let url = reqwest::Url::parse(endpoint).ok()?;
    let port = url.port_or_known_default()?;
    let host = url.host_str()?.trim_matches(['[', ']']).to_string();
    Some((host, port))
}

impl Connectivity for HostLink {
    fn is_connected(&self) -> bool {
        self.probe().is_some()
    }

    fn local_addr(&self) -> Option<IpAddr> {
        self.probe()
    }
}
