//! Platform table for network-configuration tool scraping.
//!
//! Each operating system identifier maps to a [`PlatformFamily`], and each
//! family to one [`PlatformProfile`]: the tool to run, its fixed arguments
//! and the two line patterns used to pull addresses out of its output.
//! Supporting a new platform means adding rows here, not control flow.

use crate::utils::{PlatformError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// Dotted-quad IPv4, no leading zeros.
const IPV4: &str = r"(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])(?:\.(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])){3}";

/// Six octets separated by colons, hyphens or spaces.
const MAC: &str = r"(?:[0-9a-f]{2}[-: ]){5}[0-9a-f]{2}";

/// Six colon-separated octets; Solaris drops leading zeros.
const ETHER_MAC: &str = r"(?:[0-9a-f]{1,2}:){5}[0-9a-f]{1,2}";

const NO_ARGS: &[&str] = &[];
const ALL_INTERFACES: &[&str] = &["-a"];
const ROUTE_PRINT: &[&str] = &["print"];

/// Operating system identifier (as in `std::env::consts::OS`) to family.
const PLATFORM_MAP: &[(&str, PlatformFamily)] = &[
    ("linux", PlatformFamily::Linux),
    ("android", PlatformFamily::Linux),
    ("windows", PlatformFamily::Windows),
    ("cygwin", PlatformFamily::Windows),
    ("macos", PlatformFamily::Bsd),
    ("ios", PlatformFamily::Bsd),
    ("freebsd", PlatformFamily::Bsd),
    ("openbsd", PlatformFamily::Bsd),
    ("netbsd", PlatformFamily::Bsd),
    ("dragonfly", PlatformFamily::Bsd),
    ("solaris", PlatformFamily::SunOs),
    ("illumos", PlatformFamily::SunOs),
    ("irix", PlatformFamily::Irix),
];

static PROFILES: Lazy<HashMap<PlatformFamily, PlatformProfile>> = Lazy::new(|| {
    PlatformFamily::ALL
        .iter()
        .map(|family| (*family, PlatformProfile::build(*family)))
        .collect()
});

/// Group of platforms sharing one tool and one output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// `ifconfig` from net-tools
    Linux,
    /// BSD-style `ifconfig -a` (also macOS)
    Bsd,
    /// Irix 6.x
    Irix,
    /// Solaris and illumos
    SunOs,
    /// `route print` route tables
    Windows,
}

impl PlatformFamily {
    /// Every family in the table
    pub const ALL: [PlatformFamily; 5] = [
        PlatformFamily::Linux,
        PlatformFamily::Bsd,
        PlatformFamily::Irix,
        PlatformFamily::SunOs,
        PlatformFamily::Windows,
    ];

    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            PlatformFamily::Linux => "linux",
            PlatformFamily::Bsd => "bsd",
            PlatformFamily::Irix => "irix",
            PlatformFamily::SunOs => "sunos",
            PlatformFamily::Windows => "win32",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How to query one family's network configuration
#[derive(Debug)]
pub struct PlatformProfile {
    /// Family this profile belongs to
    pub family: PlatformFamily,
    /// Absolute tool path, or a bare name to look up on `PATH`
    pub tool: &'static str,
    /// Fixed arguments; nothing else is ever passed
    pub args: &'static [&'static str],
    /// Per-line pattern with an `address` capture group
    pub address_pattern: Regex,
    /// Per-line pattern with a `mac` capture group
    pub hardware_pattern: Regex,
}

impl PlatformProfile {
    fn build(family: PlatformFamily) -> Self {
        let (tool, args, address, hardware) = match family {
            PlatformFamily::Linux => ("/sbin/ifconfig", NO_ARGS, ifconfig_address(), linux_hardware()),
            PlatformFamily::Bsd => ("/sbin/ifconfig", ALL_INTERFACES, ifconfig_address(), ether_hardware()),
            PlatformFamily::Irix => ("/usr/etc/ifconfig", ALL_INTERFACES, ifconfig_address(), ether_hardware()),
            PlatformFamily::SunOs => ("/usr/sbin/ifconfig", ALL_INTERFACES, ifconfig_address(), ether_hardware()),
            PlatformFamily::Windows => ("route.exe", ROUTE_PRINT, route_address(), route_hardware()),
        };

        Self {
            family,
            tool,
            args,
            address_pattern: Regex::new(&address).expect("static address pattern should always compile"),
            hardware_pattern: Regex::new(&hardware).expect("static hardware pattern should always compile"),
        }
    }
}

/// Looks up the family for an operating system identifier.
///
/// # Errors
///
/// Returns `PlatformError::Unsupported` carrying `platform` when it has no
/// row in the table.
pub fn family_for(platform: &str) -> Result<PlatformFamily> {
    PLATFORM_MAP
        .iter()
        .find(|(name, _)| *name == platform)
        .map(|(_, family)| *family)
        .ok_or_else(|| {
            PlatformError::Unsupported {
                platform: platform.to_string(),
            }
            .into()
        })
}

/// Looks up the scraping profile for an operating system identifier.
pub fn profile_for(platform: &str) -> Result<&'static PlatformProfile> {
    let family = family_for(platform)?;
    PROFILES.get(&family).ok_or_else(|| {
        PlatformError::Unsupported {
            platform: platform.to_string(),
        }
        .into()
    })
}

/// The identifier of the running operating system
pub fn current_platform() -> &'static str {
    std::env::consts::OS
}

/// All `(identifier, family)` rows of the table
pub fn platforms() -> impl Iterator<Item = (&'static str, PlatformFamily)> {
    PLATFORM_MAP.iter().copied()
}

/// IPv6 literal, including compressed and IPv4-suffixed forms.
fn ipv6() -> String {
    const H: &str = "[0-9a-f]{1,4}";
    let forms = [
        format!("(?:{H}:){{7}}{H}"),
        format!("(?:{H}:){{1,4}}:{IPV4}"),
        format!("(?:{H}:){{1,7}}:"),
        format!("(?:{H}:){{1,6}}:{H}"),
        format!("(?:{H}:){{1,5}}(?::{H}){{1,2}}"),
        format!("(?:{H}:){{1,4}}(?::{H}){{1,3}}"),
        format!("(?:{H}:){{1,3}}(?::{H}){{1,4}}"),
        format!("(?:{H}:){{1,2}}(?::{H}){{1,5}}"),
        format!("{H}:(?::{H}){{1,6}}"),
        format!("::(?:ffff(?::0{{1,4}})?:)?{IPV4}"),
        format!(":(?:(?::{H}){{1,7}}|:)"),
    ];
    ["(?:", &forms.join("|"), ")"].concat()
}

fn address_group() -> String {
    ["(?P<address>", IPV4, "|", &ipv6(), ")"].concat()
}

/// `inet`/`inet6` lines of any ifconfig flavour. A prefix length or zone
/// index glued to the address is matched but not captured.
fn ifconfig_address() -> String {
    [
        r"(?i)^\s*inet6?\s+(?:addr:)?\s?",
        &address_group(),
        r"(?:/[0-9]{1,3}|%[0-9a-z_.]+)?\s.+$",
    ]
    .concat()
}

/// Old net-tools `HWaddr` and newer `ether` lines.
fn linux_hardware() -> String {
    [r"(?i)^(?:.*\bHWaddr|\s+ether)\s+(?P<mac>", MAC, r")(?:\s+.*)?$"].concat()
}

fn ether_hardware() -> String {
    [r"(?i)^\s+ether\s+(?P<mac>", ETHER_MAC, r")\s*$"].concat()
}

/// Interface column of IPv4 routes (followed by the metric) and IPv6 host
/// routes (`If Metric Destination/128`).
fn route_address() -> String {
    [
        r"(?i)^(?:\s*",
        IPV4,
        r"\s.+\s|\s+[0-9]+\s+[0-9]+\s+)",
        &address_group(),
        r"(?:\s+(?P<metric>[0-9]+)\s*|/128.*)$",
    ]
    .concat()
}

/// Interface list entries: `10...00 11 22 33 44 55 ......Adapter name`.
fn route_hardware() -> String {
    [r"(?i)^\s+[0-9]+\.{3}(?P<mac>", MAC, r")\s\.+.*$"].concat()
}
