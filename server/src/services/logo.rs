//! Remote logo retrieval for QR overlays.

use std::time::Duration;

use image::DynamicImage;
use qr_engine::QrError;
use reqwest::{Client, Url};

#[derive(Debug, thiserror::Error)]
pub enum LogoError {
    #[error("Failed to fetch logo: upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("Failed to fetch logo: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Logo exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("Logo is not a valid image")]
    Decode(#[source] QrError),
}

impl LogoError {
    /// Upstream HTTP status, when the host answered with one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::TooLarge { .. } | Self::Decode(_) => None,
        }
    }
}

/// HTTP client for logo images with a fixed request timeout and body cap.
#[derive(Clone)]
pub struct LogoFetcher {
    http: Client,
    max_bytes: usize,
}

impl LogoFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, max_bytes })
    }

    /// Download the raw logo bytes. Non-success statuses and bodies over
    /// `max_bytes` are errors.
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, LogoError> {
        let mut response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(LogoError::Request)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "Logo host returned an error status");
            return Err(LogoError::Status {
                status: status.as_u16(),
            });
        }

        let limit = self.max_bytes;
        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            tracing::warn!(%url, limit, "Logo Content-Length over limit");
            return Err(LogoError::TooLarge { limit });
        }

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(LogoError::Request)? {
            if bytes.len() + chunk.len() > limit {
                tracing::warn!(%url, limit, "Logo body over limit");
                return Err(LogoError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(%url, bytes = bytes.len(), "Fetched logo");
        Ok(bytes)
    }
}

/// Decode fetched logo bytes, whatever the source format.
pub fn decode_logo(bytes: &[u8]) -> Result<DynamicImage, LogoError> {
    qr_engine::decode_image(bytes).map_err(LogoError::Decode)
}
