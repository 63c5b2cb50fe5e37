//! Address discovery by scraping the platform's network-configuration tool.
//!
//! The scraper never touches sockets. It runs `ifconfig` (or `route print`
//! on Windows) with a fixed argument list and a forced locale, then applies
//! the platform's line patterns to whatever the tool printed.

use crate::discovery::platform::{self, PlatformProfile};
use crate::utils::Result;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Runs an external tool and returns its standard output
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args` under `locale`.
    ///
    /// A launch failure or non-zero exit status is an error.
    fn run(&self, program: &Path, args: &[&str], locale: &str) -> io::Result<String>;
}

/// [`ToolRunner`] backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, program: &Path, args: &[&str], locale: &str) -> io::Result<String> {
        let output = Command::new(program)
            .args(args)
            .env("LANG", locale)
            .env("LC_ALL", locale)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "{} exited with {}: {}",
                    program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Tool-scraping discovery strategy
pub struct ConfigScraper {
    platform: String,
    locale: String,
    search_path: Option<OsString>,
    runner: Arc<dyn ToolRunner>,
}

impl ConfigScraper {
    /// Create a scraper for the running platform
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            platform: platform::current_platform().to_string(),
            locale: locale.into(),
            search_path: None,
            runner: Arc::new(SystemToolRunner),
        }
    }

    /// Scrape as if running on `platform` instead
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Replace the process runner
    pub fn with_runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Search these directories for relative tool names instead of `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Operating system identifier this scraper looks up
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Scrape on Tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Fails with `PlatformError::Unsupported` when the platform has no
    /// profile, or `ScoutError::Task` if the blocking task panicked. Tool
    /// problems are not errors; they yield an empty list.
    pub async fn scrape(self: Arc<Self>) -> Result<Vec<String>> {
        tokio::task::spawn_blocking(move || self.scrape_blocking()).await?
    }

    /// Scrape on the calling thread.
    pub fn scrape_blocking(&self) -> Result<Vec<String>> {
        let profile = platform::profile_for(&self.platform)?;
        Ok(self.scrape_profile(profile))
    }

    /// Run a profile's tool and extract addresses from its output.
    ///
    /// An absolute tool path is run as is. A bare name is tried at every
    /// match on the search path until one run yields an address, since
    /// same-named tools in different directories can behave differently.
    pub fn scrape_profile(&self, profile: &PlatformProfile) -> Vec<String> {
        if Path::new(profile.tool).is_absolute() {
            return self.query(Path::new(profile.tool), profile);
        }

        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
            .unwrap_or_default();

        for exe in which_all(profile.tool, &search_path) {
            let addresses = self.query(&exe, profile);
            if !addresses.is_empty() {
                return addresses;
            }
        }

        log::debug!("no usable {} found on the search path", profile.tool);
        Vec::new()
    }

    fn query(&self, program: &Path, profile: &PlatformProfile) -> Vec<String> {
        match self.runner.run(program, profile.args, &self.locale) {
            Ok(output) => {
                let addresses = extract_addresses(profile, &output);
                log::debug!("{} reported {} address(es)", program.display(), addresses.len());
                addresses
            }
            Err(e) => {
                log::debug!("running {} failed: {}", program.display(), e);
                Vec::new()
            }
        }
    }
}

/// Applies a profile's patterns to tool output.
///
/// IP addresses come first, then hardware addresses normalised to lowercase
/// colon-separated form. Each list is de-duplicated in first-seen order.
pub fn extract_addresses(profile: &PlatformProfile, output: &str) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::new();
    let mut hardware: Vec<String> = Vec::new();

    for line in output.lines() {
        if let Some(address) = profile
            .address_pattern
            .captures(line)
            .and_then(|caps| caps.name("address"))
        {
            push_unique(&mut addresses, address.as_str().to_string());
        }

        if let Some(mac) = profile
            .hardware_pattern
            .captures(line)
            .and_then(|caps| caps.name("mac"))
        {
            push_unique(&mut hardware, normalize_mac(mac.as_str()));
        }
    }

    addresses.extend(hardware);
    addresses
}

/// `00-11-22-AA-BB-CC` and `00 11 22 aa bb cc` become `00:11:22:aa:bb:cc`;
/// unpadded octets such as `0:3:ba:4e:12:34` gain their leading zero.
pub fn normalize_mac(raw: &str) -> String {
    raw.split(|c| matches!(c, '-' | ':' | ' '))
        .map(|octet| format!("{:0>2}", octet.to_ascii_lowercase()))
        .collect::<Vec<_>>()
        .join(":")
}

/// Every executable named `name` along `search_path`, in search order.
pub fn which_all(name: &str, search_path: &std::ffi::OsStr) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();
    for dir in std::env::split_paths(search_path) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable(&candidate) && !found.contains(&candidate) {
            found.push(candidate);
        }
    }
    found
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Replays canned output per program path and records every call.
    #[derive(Default)]
    struct RecordedRunner {
        outputs: Vec<(PathBuf, io::Result<String>)>,
        calls: Mutex<Vec<(PathBuf, Vec<String>, String)>>,
    }

    impl RecordedRunner {
        fn with(mut self, program: impl Into<PathBuf>, output: io::Result<String>) -> Self {
            self.outputs.push((program.into(), output));
            self
        }

        fn calls(&self) -> Vec<(PathBuf, Vec<String>, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolRunner for RecordedRunner {
        fn run(&self, program: &Path, args: &[&str], locale: &str) -> io::Result<String> {
            self.calls.lock().unwrap().push((
                program.to_path_buf(),
                args.iter().map(|a| a.to_string()).collect(),
                locale.to_string(),
            ));
            match self.outputs.iter().find(|(p, _)| p == program) {
                Some((_, Ok(output))) => Ok(output.clone()),
                Some((_, Err(e))) => Err(io::Error::new(e.kind(), e.to_string())),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "not recorded")),
            }
        }
    }

    fn matched_set(platform: &str, output: &str) -> HashSet<String> {
        let profile = platform::profile_for(platform).unwrap();
        extract_addresses(profile, output).into_iter().collect()
    }

    fn expected_set(expected: &[&str]) -> HashSet<String> {
        expected.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_platform_fixtures_match_exactly() {
        let cases = [
            ("linux", LINUX_IFCONFIG, LINUX_IFCONFIG_EXPECTED),
            ("linux", LINUX_NET_TOOLS_2, LINUX_NET_TOOLS_2_EXPECTED),
            ("macos", BSD_IFCONFIG, BSD_IFCONFIG_EXPECTED),
            ("windows", WINDOWS_ROUTE_PRINT, WINDOWS_ROUTE_PRINT_EXPECTED),
        ];
        for (platform, output, expected) in cases {
            let matched = matched_set(platform, output);
            let expected = expected_set(expected);
            assert!(!expected.is_empty());
            assert!(!matched.is_empty(), "{platform} fixture produced nothing");
            let difference: HashSet<_> = matched.symmetric_difference(&expected).collect();
            assert!(difference.is_empty(), "{platform} fixture mismatch: {difference:?}");
        }
    }

    #[test]
    fn test_linux_fixture_order_and_uniqueness() {
        let profile = platform::profile_for("linux").unwrap();
        let addresses = extract_addresses(profile, LINUX_IFCONFIG);
        assert_eq!(addresses, LINUX_IFCONFIG_EXPECTED);
        assert_eq!(addresses.iter().filter(|a| a.contains('.')).count(), 4);
        assert_eq!(addresses.len(), 14);
    }

    #[test]
    fn test_hardware_addresses_come_last() {
        let profile = platform::profile_for("macos").unwrap();
        let addresses = extract_addresses(profile, BSD_IFCONFIG);
        assert_eq!(addresses.last().map(String::as_str), Some("00:11:22:33:44:55"));
        assert_eq!(addresses, BSD_IFCONFIG_EXPECTED);
    }

    #[test]
    fn test_garbage_output_is_not_an_error() {
        let profile = platform::profile_for("linux").unwrap();
        assert!(extract_addresses(profile, "").is_empty());
        assert!(extract_addresses(profile, "ifconfig: command not found\n\x00\x01").is_empty());
    }

    #[test]
    fn test_normalize_mac() {
        assert_eq!(normalize_mac("00-11-22-AA-BB-CC"), "00:11:22:aa:bb:cc");
        assert_eq!(normalize_mac("00 11 22 33 44 55"), "00:11:22:33:44:55");
        assert_eq!(normalize_mac("00:11:22:33:44:55"), "00:11:22:33:44:55");
        assert_eq!(normalize_mac("0:3:BA:4e:12:34"), "00:03:ba:4e:12:34");
    }

    #[test]
    fn test_solaris_unpadded_hardware_address() {
        let output = "hme0: flags=1000843<UP,BROADCAST,RUNNING,MULTICAST,IPv4> mtu 1500 index 2\n        inet 10.0.0.5 netmask ffffff00 broadcast 10.0.0.255\n        ether 0:3:ba:4e:12:34 \n";
        let profile = platform::profile_for("solaris").unwrap();
        assert_eq!(
            extract_addresses(profile, output),
            vec!["10.0.0.5".to_string(), "00:03:ba:4e:12:34".to_string()]
        );
    }

    #[test]
    fn test_scrape_absolute_tool_passes_fixed_args_and_locale() {
        let runner = Arc::new(RecordedRunner::default().with("/sbin/ifconfig", Ok(BSD_IFCONFIG.to_string())));
        let scraper = ConfigScraper::new("en_US.UTF-8")
            .with_platform("freebsd")
            .with_runner(runner.clone());

        let addresses = scraper.scrape_blocking().unwrap();
        assert_eq!(addresses, BSD_IFCONFIG_EXPECTED);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, PathBuf::from("/sbin/ifconfig"));
        assert_eq!(calls[0].1, vec!["-a".to_string()]);
        assert_eq!(calls[0].2, "en_US.UTF-8");
    }

    #[test]
    fn test_scrape_failed_tool_yields_nothing() {
        let runner = Arc::new(RecordedRunner::default().with(
            "/sbin/ifconfig",
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        ));
        let scraper = ConfigScraper::new("C").with_platform("linux").with_runner(runner);
        assert!(scraper.scrape_blocking().unwrap().is_empty());
    }

    #[test]
    fn test_scrape_unsupported_platform() {
        let scraper = ConfigScraper::new("C")
            .with_platform("plan9")
            .with_runner(Arc::new(RecordedRunner::default()));
        let err = scraper.scrape_blocking().unwrap_err();
        assert!(err.is_unsupported_platform());
        assert!(err.to_string().contains("plan9"));
    }

    #[cfg(unix)]
    fn fake_executable(dir: &Path, name: &str) -> PathBuf {
        fake_script(dir, name, "")
    }

    #[cfg(unix)]
    fn fake_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_forces_locale() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_script(dir.path(), "ifconfig", r#"echo "inet addr:$LANG $LC_ALL x""#);

        let output = SystemToolRunner.run(&script, &[], "xx_TEST.UTF-8").unwrap();
        assert_eq!(output.trim(), "inet addr:xx_TEST.UTF-8 xx_TEST.UTF-8 x");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_passes_fixed_args() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_script(dir.path(), "ifconfig", r#"echo "$#:$1""#);

        let output = SystemToolRunner.run(&script, &["-a"], "C").unwrap();
        assert_eq!(output.trim(), "1:-a");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_script(dir.path(), "route.exe", "echo 'route: no tables' >&2\nexit 3");

        let err = SystemToolRunner.run(&script, &["print"], "C").unwrap_err();
        assert!(err.to_string().contains("route: no tables"), "{err}");

        let scraper = ConfigScraper::new("C")
            .with_platform("windows")
            .with_search_path(dir.path().as_os_str().to_os_string());
        let profile = platform::profile_for("windows").unwrap();
        assert!(scraper.scrape_profile(profile).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_which_all_finds_every_executable() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        let a = fake_executable(first.path(), "route.exe");
        let b = fake_executable(second.path(), "route.exe");
        std::fs::write(empty.path().join("route.exe"), "not executable").unwrap();

        let search = std::env::join_paths([empty.path(), first.path(), second.path(), first.path()]).unwrap();
        assert_eq!(which_all("route.exe", &search), vec![a, b]);
        assert!(which_all("missing-tool", &search).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_tool_tries_candidates_in_turn() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = fake_executable(first.path(), "route.exe");
        let b = fake_executable(second.path(), "route.exe");

        let runner = Arc::new(
            RecordedRunner::default()
                .with(a.clone(), Ok("Interface List\n".to_string()))
                .with(b.clone(), Ok(WINDOWS_ROUTE_PRINT.to_string())),
        );
        let search = std::env::join_paths([first.path(), second.path()]).unwrap();
        let scraper = ConfigScraper::new("en_US.UTF-8")
            .with_platform("windows")
            .with_runner(runner.clone())
            .with_search_path(search);

        let addresses: HashSet<String> = scraper.scrape_blocking().unwrap().into_iter().collect();
        assert_eq!(addresses, expected_set(WINDOWS_ROUTE_PRINT_EXPECTED));

        let called: Vec<PathBuf> = runner.calls().into_iter().map(|(p, _, _)| p).collect();
        assert_eq!(called, vec![a, b]);
    }

    #[test]
    fn test_relative_tool_not_found() {
        let empty = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordedRunner::default());
        let scraper = ConfigScraper::new("C")
            .with_platform("windows")
            .with_runner(runner.clone())
            .with_search_path(empty.path().as_os_str().to_os_string());
        assert!(scraper.scrape_blocking().unwrap().is_empty());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scrape_is_idempotent() {
        let runner = Arc::new(RecordedRunner::default().with("/sbin/ifconfig", Ok(LINUX_IFCONFIG.to_string())));
        let scraper = Arc::new(ConfigScraper::new("en_US.UTF-8").with_platform("linux").with_runner(runner));

        let first = scraper.clone().scrape().await.unwrap();
        let second = scraper.scrape().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, LINUX_IFCONFIG_EXPECTED);
    }
}
