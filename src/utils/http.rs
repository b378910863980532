// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::SiteConfig;

/// Create a configured asynchronous HTTP client.
///
/// No request timeout is set: retryable fetches may legitimately block
/// for a long time against a throttling server.
pub fn create_client(config: &SiteConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        let config = SiteConfig::default();
        assert!(create_client(&config).is_ok());
    }
}
