use url::Url;

pub const DEFAULT_ADDRESS_PATTERN: &str = "teams.microsoft.com";

/// Matches page addresses against the monitored application's host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPattern {
    host: String,
}

impl Default for AddressPattern {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS_PATTERN)
    }
}

impl AddressPattern {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.trim().trim_end_matches('.').to_ascii_lowercase(),
        }
    }

    /// True when the address' host is the pattern or one of its subdomains.
    /// Addresses that do not parse as URLs fall back to a substring check.
    pub fn matches(&self, address: &str) -> bool {
        if self.host.is_empty() {
            return false;
        }
        match Url::parse(address.trim()) {
            Ok(url) => url.host_str().is_some_and(|host| self.matches_host(host)),
            Err(_) => address.to_ascii_lowercase().contains(&self.host),
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.host
            || host
                .strip_suffix(&self.host)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}
