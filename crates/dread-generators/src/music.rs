//! Background music through the fal.ai queue API.
//!
//! A request is submitted to the queue, its status polled until completion,
//! then the result names an audio file URL which is downloaded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GenerationError, GenerationResult};
use crate::http::{check_status, success_bytes};
use crate::traits::MusicGenerator;

/// Default queue endpoint.
pub const DEFAULT_FAL_QUEUE_URL: &str = "https://queue.fal.run";

/// Sound generation model.
pub const DEFAULT_MUSIC_MODEL: &str = "cassetteai/sound-effects-generator";

const SERVICE: &str = "music generator";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_POLLS: u32 = 150;

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    prompt: &'a str,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
    status_url: Option<String>,
    response_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct MusicResult {
    audio_file: AudioFile,
}

#[derive(Debug, Deserialize)]
struct AudioFile {
    url: String,
}

/// fal.ai queue client for the sound effects model.
#[derive(Debug, Clone)]
pub struct FalMusicClient {
    client: Client,
    base_url: String,
    key: Option<String>,
    poll_interval: Duration,
    max_polls: u32,
}

impl FalMusicClient {
    pub fn new(client: Client, key: Option<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_FAL_QUEUE_URL.to_string(),
            key,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn request_url(&self, request_id: &str) -> String {
        format!("{}/{}/requests/{}", self.base_url, DEFAULT_MUSIC_MODEL, request_id)
    }

    async fn submit(&self, key: &str, prompt: &str, duration: u32) -> GenerationResult<SubmitResponse> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, DEFAULT_MUSIC_MODEL))
            .header("Authorization", format!("Key {}", key))
            .json(&SubmitRequest { prompt, duration })
            .send()
            .await?;
        Ok(check_status(SERVICE, response).await?.json().await?)
    }

    async fn wait_for_completion(&self, key: &str, status_url: &str) -> GenerationResult<()> {
        for attempt in 1..=self.max_polls {
            let response = self
                .client
                .get(status_url)
                .header("Authorization", format!("Key {}", key))
                .send()
                .await?;
            let status: StatusResponse = check_status(SERVICE, response).await?.json().await?;

            match status.status.as_str() {
                "COMPLETED" => return Ok(()),
                "IN_QUEUE" | "IN_PROGRESS" => {
                    debug!("Music request {} (poll {}/{})", status.status, attempt, self.max_polls);
                }
                other => {
                    return Err(GenerationError::JobFailed {
                        service: SERVICE,
                        message: format!("unexpected status {}", other),
                    })
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(GenerationError::Timeout {
            service: SERVICE,
            seconds: self.poll_interval.as_secs() * self.max_polls as u64,
        })
    }
}

#[async_trait]
impl MusicGenerator for FalMusicClient {
    async fn generate(&self, prompt: &str, duration_secs: u32) -> GenerationResult<Vec<u8>> {
        let key = self
            .key
            .as_deref()
            .ok_or(GenerationError::MissingCredential("FAL_KEY"))?;

        let submitted = self.submit(key, prompt, duration_secs).await?;
        debug!("Music request {} submitted", submitted.request_id);

        let status_url = submitted
            .status_url
            .unwrap_or_else(|| format!("{}/status", self.request_url(&submitted.request_id)));
        self.wait_for_completion(key, &status_url).await?;

        let response_url = submitted
            .response_url
            .unwrap_or_else(|| self.request_url(&submitted.request_id));
        let response = self
            .client
            .get(&response_url)
            .header("Authorization", format!("Key {}", key))
            .send()
            .await?;
        let result: MusicResult = check_status(SERVICE, response).await?.json().await?;

        let audio = success_bytes(SERVICE, self.client.get(&result.audio_file.url).send().await?).await?;
        info!("Downloaded music ({} bytes, {}s requested)", audio.len(), duration_secs);
        Ok(audio)
    }
}
