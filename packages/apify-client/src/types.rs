use serde::Deserialize;

const PROXY_HOST: &str = "proxy.apify.com:8000";

/// Settings for the Apify proxy, mirroring the actor input's `proxyConfiguration`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfiguration {
    /// Proxy password (`APIFY_PROXY_PASSWORD`)
    #[serde(skip)]
    pub password: String,
    #[serde(default)]
    pub apify_proxy_groups: Vec<String>,
    pub apify_proxy_country: Option<String>,
}

impl ProxyConfiguration {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.apify_proxy_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.apify_proxy_country = Some(country.into());
        self
    }

    /// Build a proxy URL pinned to `session`. A new session yields a new exit IP.
    pub fn url_for_session(&self, session: &str) -> String {
        let mut parts = Vec::new();
        if !self.apify_proxy_groups.is_empty() {
            parts.push(format!("groups-{}", self.apify_proxy_groups.join("+")));
        }
        parts.push(format!("session-{}", session));
        if let Some(country) = &self.apify_proxy_country {
            parts.push(format!("country-{}", country.to_uppercase()));
        }
        format!("http://{}:{}@{}", parts.join(","), self.password, PROXY_HOST)
    }

    /// Build a proxy URL with a fresh random session.
    pub fn new_url(&self) -> String {
        let session: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(12)
            .collect();
        self.url_for_session(&session)
    }
}
