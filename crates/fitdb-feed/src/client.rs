//! HTTP client for the Optio product feed.

use std::time::Duration;

use reqwest::Client;

use crate::error::FeedError;

/// HTTP client that downloads a feed body as text.
///
/// Non-2xx responses and empty bodies are typed errors. Nothing is retried:
/// a failed fetch ends the import before any catalog write.
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Creates a `FeedClient` with the given `User-Agent`.
    ///
    /// `timeout_secs` bounds the whole request when set; `None` leaves the
    /// request without a deadline. The connect phase is always capped at
    /// 10 seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: Option<u64>, user_agent: &str) -> Result<Self, FeedError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent);
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetches the feed at `url` and returns its body.
    ///
    /// Redirects are followed.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidUrl`]: `url` does not parse.
    /// - [`FeedError::UnexpectedStatus`]: any non-2xx status.
    /// - [`FeedError::EmptyBody`]: the body is empty or whitespace only.
    /// - [`FeedError::Http`]: network or TLS failure.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FeedError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FeedError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FeedError::EmptyBody {
                url: url.to_owned(),
            });
        }

        tracing::debug!(url, bytes = body.len(), "fetched feed body");
        Ok(body)
    }
}
