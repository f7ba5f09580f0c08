use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Runtime settings for the resolver and its HTTP front end.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub bind_addr: String,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    /// When false a static pass is never escalated to the browser.
    pub browser_enabled: bool,
    pub chrome_executable: Option<PathBuf>,
    pub insecure_ssl: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            bind_addr: "0.0.0.0:8000".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(30),
            browser_enabled: true,
            chrome_executable: None,
            insecure_ssl: false,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ResolverConfig::default();

        if let Some(addr) = lookup("LINK_RESOLVER_BIND") {
            config.bind_addr = addr;
        }
        if let Some(ua) = lookup("LINK_RESOLVER_USER_AGENT").filter(|s| !s.trim().is_empty()) {
            config.user_agent = ua;
        }
        if let Some(secs) = parse_secs(&lookup, "LINK_RESOLVER_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "LINK_RESOLVER_RENDER_TIMEOUT_SECS") {
            config.render_timeout = secs;
        }
        if let Some(flag) = lookup("LINK_RESOLVER_BROWSER") {
            config.browser_enabled = flag != "0";
        }
        config.chrome_executable = lookup("LINK_RESOLVER_CHROME").map(PathBuf::from);
        config.insecure_ssl = lookup("LINK_RESOLVER_INSECURE_SSL").as_deref() == Some("1");

        config
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!("ignoring invalid {}={:?}, keeping default", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ResolverConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ResolverConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.render_timeout, Duration::from_secs(30));
        assert!(config.browser_enabled);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("LINK_RESOLVER_FETCH_TIMEOUT_SECS", "3"),
            ("LINK_RESOLVER_BROWSER", "0"),
            ("LINK_RESOLVER_CHROME", "/usr/bin/chromium"),
        ]);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert!(!config.browser_enabled);
        assert_eq!(config.chrome_executable, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn bad_timeout_keeps_default() {
        let config = config_from(&[("LINK_RESOLVER_RENDER_TIMEOUT_SECS", "soon")]);
        assert_eq!(config.render_timeout, Duration::from_secs(30));
    }
}
