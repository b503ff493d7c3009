//! Remote image fetching for overlay sources.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use ehon_core::compositing::ImageFetcher;
use ehon_core::error::CoreError;

use crate::config::ServerConfig;

/// Plain `GET` with the shared client. The client keeps no cookie store and
/// no credentials are attached.
///
/// Each fetch is bounded by `timeout` and by `max_bytes` of body. Loopback,
/// private and link-local hosts are refused unless `allow_private_hosts`
/// is set.
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: usize,
    timeout: Duration,
    allow_private_hosts: bool,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client, max_bytes: usize, timeout: Duration) -> Self {
        Self {
            client,
            max_bytes,
            timeout,
            allow_private_hosts: false,
        }
    }

    /// Limits taken from the server configuration.
    pub fn from_config(client: reqwest::Client, config: &ServerConfig) -> Self {
        Self::new(
            client,
            config.max_upload_bytes,
            Duration::from_secs(config.image_fetch_timeout_secs),
        )
        .allow_private_hosts(config.image_fetch_allow_private)
    }

    pub fn allow_private_hosts(mut self, allow: bool) -> Self {
        self.allow_private_hosts = allow;
        self
    }

    fn check_host(&self, url: &str) -> Result<(), CoreError> {
        if self.allow_private_hosts {
            return Ok(());
        }
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| CoreError::Decode(format!("Invalid image URL: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| CoreError::Decode("Image URL has no host".to_string()))?;
        if is_private_host(host) {
            tracing::warn!(%host, "Refused image fetch from private host");
            return Err(CoreError::Decode(format!("Image host {host} is not allowed")));
        }
        Ok(())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        self.check_host(url)?;

        let mut response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CoreError::Decode(format!("Failed to fetch image: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Decode(format!(
                "Image fetch returned HTTP {}",
                status.as_u16()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(too_large(self.max_bytes));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CoreError::Decode(format!("Failed to read image body: {e}")))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(too_large(self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(%url, bytes = bytes.len(), "Fetched remote image");
        Ok(bytes)
    }
}

fn too_large(max_bytes: usize) -> CoreError {
    CoreError::Decode(format!("Remote image exceeds {max_bytes} bytes"))
}

/// `localhost` names and IP literals in loopback, private, link-local,
/// unique-local or unspecified ranges.
fn is_private_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        Ok(IpAddr::V6(v6)) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_host(&mapped.to_string());
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
        Err(_) => false,
    }
}
