//! Combines probing and tool scraping into one ranked address list.
//!
//! The probe runs first, on the caller's task, and seeds the list. One
//! supplemental strategy then runs on Tokio's blocking pool; its results are
//! appended once it finishes, so probe-derived addresses always rank first.

use crate::discovery::platform;
use crate::discovery::prober::Prober;
use crate::discovery::scraper::ConfigScraper;
use crate::utils::{Result, ScoutConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Addresses that mean "any interface" and are never reported
pub const WILDCARD_ADDRESSES: [&str; 2] = ["0.0.0.0", "::"];

/// Platform whose tool output is replaced by repeated probing
const LOOPBACK_RETRY_PLATFORM: &str = "cygwin";

/// Which supplemental strategy a platform uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Supplement {
    /// Scrape the platform's network-configuration tool
    ToolScrape,
    /// Re-probe a fixed list of loopback-ish targets
    LoopbackRetry,
}

impl Supplement {
    /// Strategy used on `platform`
    pub fn for_platform(platform: &str) -> Self {
        if platform == LOOPBACK_RETRY_PLATFORM {
            Supplement::LoopbackRetry
        } else {
            Supplement::ToolScrape
        }
    }
}

/// Result of one discovery, with enough context to log or print it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// Target the probe aimed at
    pub target: String,
    /// Operating system identifier used for the supplemental step
    pub platform: String,
    /// Supplemental strategy that ran
    pub supplement: Supplement,
    /// Unique candidate addresses, most plausible first
    pub addresses: Vec<String>,
    /// When the discovery finished
    pub discovered_at: chrono::DateTime<chrono::Utc>,
}

/// Root of the discovery engine
pub struct DiscoveryCoordinator {
    prober: Arc<Prober>,
    scraper: Arc<ConfigScraper>,
    default_target: String,
    fallback_targets: Vec<String>,
}

impl DiscoveryCoordinator {
    /// Build a coordinator for the running platform from configuration
    pub fn new(config: &ScoutConfig) -> Self {
        Self {
            prober: Arc::new(Prober::new(config.discovery.probe_port)),
            scraper: Arc::new(ConfigScraper::new(config.discovery.locale.clone())),
            default_target: config.discovery.default_target.clone(),
            fallback_targets: config.discovery.loopback_fallbacks.clone(),
        }
    }

    /// Assemble a coordinator from explicit parts
    pub fn from_parts(prober: Prober, scraper: ConfigScraper, default_target: impl Into<String>) -> Self {
        Self {
            prober: Arc::new(prober),
            scraper: Arc::new(scraper),
            default_target: default_target.into(),
            fallback_targets: crate::defaults::LOOPBACK_FALLBACKS
                .iter()
                .map(|target| target.to_string())
                .collect(),
        }
    }

    /// Replace the targets re-probed on loopback-retry platforms
    pub fn with_fallback_targets(mut self, targets: Vec<String>) -> Self {
        self.fallback_targets = targets;
        self
    }

    /// Target used when the caller does not name one
    pub fn default_target(&self) -> &str {
        &self.default_target
    }

    /// Operating system identifier the supplemental step runs for
    pub fn platform(&self) -> &str {
        self.scraper.platform()
    }

    /// Discover this host's candidate addresses.
    ///
    /// Never fails: every strategy failure degrades to fewer addresses. The
    /// result holds no duplicates and no wildcard address. Dropping the
    /// future abandons the supplemental task; the blocking thread still
    /// reaps any tool process it started.
    pub async fn discover(&self, target: Option<&str>) -> Vec<String> {
        let target = target.unwrap_or(&self.default_target).to_string();

        let mut addresses = Vec::new();
        merge_into(&mut addresses, self.prober.probe(&target));
        log::debug!("probe towards {} found {:?}", target, addresses);

        match self.supplemental(target).await {
            Ok(found) => merge_into(&mut addresses, found),
            Err(e) if e.is_unsupported_platform() => {
                log::warn!("no supplemental address discovery: {}", e);
            }
            Err(e) => {
                log::warn!("supplemental address discovery failed: {}", e);
            }
        }

        addresses
    }

    /// [`discover`](Self::discover), wrapped with metadata
    pub async fn report(&self, target: Option<&str>) -> DiscoveryReport {
        let addresses = self.discover(target).await;
        let report = DiscoveryReport {
            target: target.unwrap_or(&self.default_target).to_string(),
            platform: self.platform().to_string(),
            supplement: Supplement::for_platform(self.platform()),
            addresses,
            discovered_at: chrono::Utc::now(),
        };
        log::info!("discovered {} candidate address(es)", report.addresses.len());
        report
    }

    async fn supplemental(&self, target: String) -> Result<Vec<String>> {
        match Supplement::for_platform(self.platform()) {
            Supplement::ToolScrape => self.scraper.clone().scrape().await,
            Supplement::LoopbackRetry => {
                let prober = self.prober.clone();
                let mut targets = vec![target];
                targets.extend(self.fallback_targets.iter().cloned());
                let found = tokio::task::spawn_blocking(move || prober.probe_fallbacks(&targets)).await?;
                Ok(found)
            }
        }
    }
}

/// Append `found` to `addresses`, skipping wildcards and repeats.
pub fn merge_into(addresses: &mut Vec<String>, found: Vec<String>) {
    for address in found {
        if WILDCARD_ADDRESSES.contains(&address.as_str()) || addresses.contains(&address) {
            continue;
        }
        addresses.push(address);
    }
}

/// Whether `platform` has a row in the platform table
pub fn is_supported(platform: &str) -> bool {
    platform::family_for(platform).is_ok()
}
