//! Shared HTTP plumbing.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::{GenerationError, GenerationResult};

/// Default request timeout for generator calls.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

const USER_AGENT: &str = concat!("dread-reel/", env!("CARGO_PKG_VERSION"));

/// Build the client shared by all HTTP generators.
pub fn build_client(timeout: Duration) -> GenerationResult<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Body of a successful response; non-2xx and empty bodies are errors.
pub(crate) async fn success_bytes(service: &'static str, response: Response) -> GenerationResult<Vec<u8>> {
    let response = check_status(service, response).await?;
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(GenerationError::EmptyOutput { service });
    }
    Ok(bytes.to_vec())
}

/// Turn a non-2xx response into [`GenerationError::Status`].
pub(crate) async fn check_status(service: &'static str, response: Response) -> GenerationResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GenerationError::status(service, status.as_u16(), body))
}

/// Reject bytes that no image decoder recognizes.
pub fn ensure_image(service: &'static str, bytes: Vec<u8>) -> GenerationResult<Vec<u8>> {
    match image::guess_format(&bytes) {
        Ok(_) => Ok(bytes),
        Err(_) => Err(GenerationError::InvalidImage { service }),
    }
}
