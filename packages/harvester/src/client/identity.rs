//! Browser-like request identity, re-rolled on every attempt.

/// Desktop browser user agents rotated across requests.
pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_3) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.3; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0",
];

/// What the caller expects back; selects the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Json,
    Html,
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
}

/// A fresh header set for one attempt.
///
/// Accept-Encoding and Connection are left to the HTTP client, which
/// negotiates compression itself.
pub fn identity_headers(accept: Accept, origin: &str) -> Vec<(String, String)> {
    let accept = match accept {
        Accept::Json => "application/json, text/plain, */*",
        Accept::Html => "text/html,application/xhtml+xml",
    };

    vec![
        ("User-Agent".into(), random_user_agent().into()),
        ("Accept".into(), accept.into()),
        ("Accept-Language".into(), "en-US,en;q=0.9,pl;q=0.8".into()),
        ("Referer".into(), format!("{}/", origin.trim_end_matches('/'))),
        ("Origin".into(), origin.trim_end_matches('/').into()),
        ("Sec-Fetch-Dest".into(), "empty".into()),
        ("Sec-Fetch-Mode".into(), "cors".into()),
        ("Sec-Fetch-Site".into(), "same-site".into()),
    ]
}
