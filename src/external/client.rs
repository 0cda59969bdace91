use std::sync::LazyLock;
use std::time::Duration;

/// User-Agent sent on every outgoing request
pub static USER_AGENT: LazyLock<String> =
    LazyLock::new(|| format!("agency-rs/{}", crate::pkg_version()));

/// Global HTTP client shared by the LLM providers and the API store.
///
/// Connection pooling and DNS caching are per client, so every outgoing
/// request goes through this one. Callers set a per-request timeout when
/// they need something other than the 30s default.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        // Enable compression (gzip, deflate, brotli, zstd)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .user_agent(USER_AGENT.as_str())
        .build()
        .expect("Failed to build HTTP client")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_initialization() {
        let _ = &*HTTP_CLIENT;
        assert!(USER_AGENT.starts_with("agency-rs/"));
    }
}
