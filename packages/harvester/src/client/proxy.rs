//! Outbound proxy selection. A new URL is drawn for every attempt.

use apify_client::ProxyConfiguration;
use tracing::warn;

use crate::types::ProxyInput;

#[derive(Debug, Clone)]
pub enum ProxyPool {
    /// Explicit proxy URLs, one picked at random per attempt
    Static(Vec<String>),
    /// Apify proxy with a fresh session (exit IP) per attempt
    Apify(ProxyConfiguration),
}

impl ProxyPool {
    /// Build from run input. Returns `None` when no proxy is requested or usable.
    pub fn from_input(input: &ProxyInput, apify_password: Option<&str>) -> Option<Self> {
        let urls: Vec<String> = input
            .proxy_urls
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if !urls.is_empty() {
            return Some(ProxyPool::Static(urls));
        }

        if !input.use_apify_proxy {
            return None;
        }
        match apify_password.filter(|p| !p.is_empty()) {
            Some(password) => {
                let mut config =
                    ProxyConfiguration::new(password).with_groups(input.apify_proxy_groups.clone());
                if let Some(country) = &input.apify_proxy_country {
                    config = config.with_country(country.clone());
                }
                Some(ProxyPool::Apify(config))
            }
            None => {
                warn!("Apify proxy requested but APIFY_PROXY_PASSWORD is not set, going direct");
                None
            }
        }
    }

    pub fn new_url(&self) -> Option<String> {
        match self {
            ProxyPool::Static(urls) if urls.is_empty() => None,
            ProxyPool::Static(urls) => Some(urls[fastrand::usize(..urls.len())].clone()),
            ProxyPool::Apify(config) => Some(config.new_url()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_urls_take_precedence() {
        let input = ProxyInput {
            use_apify_proxy: true,
            proxy_urls: vec!["http://p1:8000".into(), " ".into()],
            ..Default::default()
        };
        let pool = ProxyPool::from_input(&input, Some("pw")).unwrap();

        assert_eq!(pool.new_url().as_deref(), Some("http://p1:8000"));
    }

    #[test]
    fn test_apify_requires_password() {
        let input = ProxyInput {
            use_apify_proxy: true,
            apify_proxy_groups: vec!["RESIDENTIAL".into()],
            ..Default::default()
        };

        assert!(ProxyPool::from_input(&input, None).is_none());

        let pool = ProxyPool::from_input(&input, Some("pw")).unwrap();
        let url = pool.new_url().unwrap();
        assert!(url.starts_with("http://groups-RESIDENTIAL,session-"));
        assert!(url.ends_with(":pw@proxy.apify.com:8000"));
    }

    #[test]
    fn test_no_proxy_by_default() {
        assert!(ProxyPool::from_input(&ProxyInput::default(), Some("pw")).is_none());
    }
}
