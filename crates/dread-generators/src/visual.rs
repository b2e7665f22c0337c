//! Image generation over the Hugging Face inference API and the placeholder fetch.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{GenerationError, GenerationResult};
use crate::http::{ensure_image, success_bytes};
use crate::prompt::IMAGE_GUIDANCE_SCALE;
use crate::traits::{ImageGenerator, PlaceholderSource};

/// Default text-to-image model endpoint.
pub const DEFAULT_IMAGE_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";

/// Default placeholder image.
pub const DEFAULT_PLACEHOLDER_URL: &str = "https://via.placeholder.com/1920x1080";

const IMAGE_SERVICE: &str = "image generator";
const PLACEHOLDER_SERVICE: &str = "placeholder";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    guidance_scale: f64,
}

/// Hugging Face text-to-image inference client.
#[derive(Debug, Clone)]
pub struct HuggingFaceImageClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HuggingFaceImageClient {
    pub fn new(client: Client, endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceImageClient {
    async fn generate(&self, prompt: &str) -> GenerationResult<Vec<u8>> {
        let token = self
            .token
            .as_deref()
            .ok_or(GenerationError::MissingCredential("HF_TOKEN"))?;

        debug!("Requesting image from {}", self.endpoint);
        let request = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                guidance_scale: IMAGE_GUIDANCE_SCALE,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let bytes = ensure_image(IMAGE_SERVICE, success_bytes(IMAGE_SERVICE, response).await?)?;
        info!("Generated image ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

/// Placeholder image fetched over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlaceholder {
    client: Client,
    url: String,
}

impl HttpPlaceholder {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PlaceholderSource for HttpPlaceholder {
    async fn fetch(&self) -> GenerationResult<Vec<u8>> {
        let response = self.client.get(&self.url).send().await?;
        ensure_image(PLACEHOLDER_SERVICE, success_bytes(PLACEHOLDER_SERVICE, response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use crate::prompt::image_prompt;
    use serde_json::json;
    use std::io::Cursor;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png() -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    fn client() -> Client {
        build_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_generate_posts_prompt_and_guidance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/sdxl"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_json(json!({
                "inputs": "Japanese watercolor horror style, a drowned shrine",
                "parameters": {"guidance_scale": 12.5}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
            .expect(1)
            .mount(&server)
            .await;

        let generator = HuggingFaceImageClient::new(
            client(),
            format!("{}/models/sdxl", server.uri()),
            Some("hf_test".to_string()),
        );
        let bytes = generator.generate(&image_prompt("a drowned shrine")).await.unwrap();
        assert_eq!(bytes, png());
    }

    #[tokio::test]
    async fn test_generate_rejects_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error":"loading"}"#))
            .mount(&server)
            .await;

        let generator = HuggingFaceImageClient::new(client(), server.uri(), Some("t".into()));
        let err = generator.generate("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidImage { .. }));
    }

    #[tokio::test]
    async fn test_generate_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Model is currently loading"))
            .mount(&server)
            .await;

        let generator = HuggingFaceImageClient::new(client(), server.uri(), Some("t".into()));
        match generator.generate("x").await.unwrap_err() {
            GenerationError::Status { status, body, .. } => {
                assert_eq!(status, 503);
                assert!(body.contains("loading"));
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_without_token() {
        let generator = HuggingFaceImageClient::new(client(), "http://127.0.0.1:9", None);
        assert!(matches!(
            generator.generate("x").await,
            Err(GenerationError::MissingCredential("HF_TOKEN"))
        ));
    }

    #[tokio::test]
    async fn test_placeholder_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1920x1080"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
            .mount(&server)
            .await;

        let placeholder = HttpPlaceholder::new(client(), format!("{}/1920x1080", server.uri()));
        assert_eq!(placeholder.fetch().await.unwrap(), png());
    }
}
