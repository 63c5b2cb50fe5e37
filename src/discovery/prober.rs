//! Outbound probing: ask the OS which local address it would use.
//!
//! Connecting a UDP socket sends nothing; it only makes the kernel pick a
//! route and a source address, which `local_addr` then reports.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

/// Name resolution used by the [`Prober`]
pub trait Resolve: Send + Sync {
    /// Resolve `target` to every address it is known by
    fn resolve(&self, target: &str) -> io::Result<Vec<IpAddr>>;
}

/// [`Resolve`] backed by the system resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, target: &str) -> io::Result<Vec<IpAddr>> {
        Ok((target, 0u16).to_socket_addrs()?.map(|addr| addr.ip()).collect())
    }
}

/// Outbound-probe discovery strategy
pub struct Prober {
    port: u16,
    resolver: Box<dyn Resolve>,
}

impl Prober {
    /// Create a prober that aims at `port` on each resolved address
    pub fn new(port: u16) -> Self {
        Self {
            port,
            resolver: Box::new(SystemResolver),
        }
    }

    /// Replace the resolver
    pub fn with_resolver(mut self, resolver: Box<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Remote port the probe socket is connected to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Local addresses the OS would use to reach `target`.
    ///
    /// Results follow resolution order and may repeat. A target that does
    /// not resolve yields an empty list; an address whose family the host
    /// cannot route is skipped.
    pub fn probe(&self, target: &str) -> Vec<String> {
        let resolved = match self.resolver.resolve(target) {
            Ok(resolved) => resolved,
            Err(e) => {
                log::debug!("could not resolve {}: {}", target, e);
                return Vec::new();
            }
        };

        let mut endpoints: Vec<IpAddr> = Vec::with_capacity(resolved.len());
        for ip in resolved {
            if !endpoints.contains(&ip) {
                endpoints.push(ip);
            }
        }

        endpoints
            .into_iter()
            .filter_map(|remote| match self.local_address_for(remote) {
                Ok(local) => Some(local.to_string()),
                Err(e) => {
                    log::debug!("no local route towards {}: {}", remote, e);
                    None
                }
            })
            .collect()
    }

    /// Probe each target in turn and merge the results, first seen wins.
    ///
    /// Used where tool scraping is unreliable; a target that fails to
    /// resolve simply contributes nothing.
    pub fn probe_fallbacks<S: AsRef<str>>(&self, targets: &[S]) -> Vec<String> {
        let mut addresses: Vec<String> = Vec::new();
        for target in targets {
            for address in self.probe(target.as_ref()) {
                if !addresses.contains(&address) {
                    addresses.push(address);
                }
            }
        }
        addresses
    }

    fn local_address_for(&self, remote: IpAddr) -> io::Result<IpAddr> {
        let unspecified: IpAddr = match remote {
            IpAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
            IpAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
        };
        let socket = UdpSocket::bind(SocketAddr::new(unspecified, 0))?;
        socket.connect(SocketAddr::new(remote, self.port))?;
        Ok(socket.local_addr()?.ip())
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(crate::defaults::DEFAULT_PROBE_PORT)
    }
}
