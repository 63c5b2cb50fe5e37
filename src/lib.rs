//! # addrscout
//!
//! Discovers the addresses a peer-to-peer node could advertise for itself.
//!
//! ## Features
//!
//! - **Outbound probing**: the local address the OS routes through towards a
//!   well-known target
//! - **Tool scraping**: every address the platform's `ifconfig` or
//!   `route print` reports, including hardware addresses
//! - **Platform table**: one row per supported operating system, no
//!   per-platform control flow
//! - **Node keys**: Ed25519 key pairs with a printable encoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use addrscout::{DiscoveryCoordinator, ScoutConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = DiscoveryCoordinator::new(&ScoutConfig::default());
//!     for address in coordinator.discover(None).await {
//!         println!("{address}");
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`discovery`]: probing, scraping and the coordinator combining them
//! - [`crypto`]: node key pairs
//! - [`utils`]: configuration, error handling, and descriptor limits

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod discovery;
pub mod utils;

pub use crypto::NodeKeyPair;
pub use discovery::{ConfigScraper, DiscoveryCoordinator, DiscoveryReport, Prober};
pub use utils::{Result, ScoutConfig, ScoutError};

/// Default configuration values
pub mod defaults {
    /// Probe target: A.ROOT-SERVERS.NET, as a literal so probing needs no DNS
    pub const DEFAULT_TARGET: &str = "198.41.0.4";

    /// Remote port the probe socket connects to (echo)
    pub const DEFAULT_PROBE_PORT: u16 = 7;

    /// Locale forced on the scraped tool so its output is parseable
    pub const DEFAULT_LOCALE: &str = "en_US.UTF-8";

    /// Targets re-probed where tool scraping is replaced
    pub const LOOPBACK_FALLBACKS: &[&str] = &["localhost", "127.0.0.1"];

    /// Upper bound on one CLI discovery, in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Soft open-file limit below which startup tries to raise it
    pub const DEFAULT_MIN_NOFILE: u64 = 1024;
}
