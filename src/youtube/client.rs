use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::BoxStream;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::parse::{self, InitialData};
use super::ChatEvent;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Poller for a single video's live chat.
pub struct YouTubeChat {
    client: reqwest::Client,
    video_id: String,
    initial: InitialData,
    max_poll_interval: Duration,
}

impl YouTubeChat {
    /// Load the watch page and pick up the first chat continuation.
    pub async fn connect(video_id: &str, max_poll_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        info!("Fetching live chat bootstrap from {}", url);
        let html = client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch watch page")?
            .error_for_status()
            .context("Watch page returned an error status")?
            .text()
            .await
            .context("Failed to read watch page")?;

        let initial = parse::parse_watch_page(&html)
            .with_context(|| format!("Video {} has no readable live chat", video_id))?;
        debug!("Innertube client version {}", initial.client_version);

        Ok(Self {
            client,
            video_id: video_id.to_string(),
            initial,
            max_poll_interval,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    async fn fetch(&self, continuation: &str) -> Result<Value> {
        let url = format!(
            "https://www.youtube.com/youtubei/v1/live_chat/get_live_chat?key={}",
            self.initial.api_key
        );
        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB",
                    "clientVersion": self.initial.client_version
                }
            },
            "continuation": continuation
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send live chat request")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Live chat API error ({}): {}", status, error_body);
        }

        response
            .json()
            .await
            .context("Failed to parse live chat response")
    }

    /// Stream chat events until the chat ends or a request fails.
    ///
    /// A failed request is yielded as the final item.
    pub fn stream(self) -> BoxStream<'static, Result<ChatEvent>> {
        Box::pin(async_stream::stream! {
            let mut continuation = self.initial.continuation.clone();
            loop {
                let resp = match self.fetch(&continuation).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };

                for event in parse::parse_actions(&resp) {
                    yield Ok(event);
                }

                let Some((next, timeout_ms)) = parse::next_continuation(&resp) else {
                    warn!("Live chat for {} ended (no continuation)", self.video_id);
                    break;
                };
                continuation = next;

                let wait = Duration::from_millis(timeout_ms).min(self.max_poll_interval);
                tokio::time::sleep(wait).await;
            }
        })
    }
}
