//! The vision-to-text collaborator: page bitmap in, DocTags markup out.
//!
//! The pipeline only depends on the [`PageTranscriber`] trait, so the model
//! behind it is a black box — a local llama.cpp/vLLM server, a hosted API,
//! or an in-process runtime are all interchangeable. The bundled
//! [`HttpTranscriber`] speaks the OpenAI chat-completions dialect, which
//! every common serving stack accepts.
//!
//! One call per page, single attempt: transcription failures abort the
//! conversion like every other error in this pipeline.

use crate::config::{ConversionConfig, Device};
use crate::error::Pdf2DoclingError;
use crate::prompts::DOCLING_INSTRUCTION;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

/// Converts one rendered page into DocTags markup.
#[async_trait]
pub trait PageTranscriber: Send + Sync {
    /// Transcribe a page image. `page_num` is 1-indexed and is only used
    /// for error context.
    async fn transcribe(
        &self,
        page_num: usize,
        image: &DynamicImage,
    ) -> Result<String, Pdf2DoclingError>;
}

/// Resolve the transcriber: a caller-supplied one wins, otherwise the
/// bundled HTTP backend is built from the config's endpoint and model.
pub fn resolve_transcriber(
    config: &ConversionConfig,
) -> Result<Arc<dyn PageTranscriber>, Pdf2DoclingError> {
    if let Some(ref t) = config.transcriber {
        return Ok(Arc::clone(t));
    }
    Ok(Arc::new(HttpTranscriber::from_config(config)?))
}

/// Encode a rendered page as a base64 PNG data-URI.
///
/// PNG rather than JPEG: lossless compression keeps rendered text crisp,
/// and compression artefacts on glyph edges measurably degrade what the
/// model reads.
pub fn png_data_uri(img: &DynamicImage) -> Result<String, Pdf2DoclingError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| Pdf2DoclingError::Internal(format!("PNG encode failed: {e}")))?;
    let b64 = STANDARD.encode(&buf);
    debug!(bytes = b64.len(), "encoded page image");
    Ok(format!("data:image/png;base64,{b64}"))
}

/// OpenAI-compatible chat-completions backend.
#[derive(Debug)]
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    prompt: String,
    max_tokens: usize,
    temperature: f32,
}

impl HttpTranscriber {
    /// Build the backend from a [`ConversionConfig`].
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Pdf2DoclingError> {
        if config.endpoint.is_empty() {
            return Err(Pdf2DoclingError::BackendNotConfigured {
                hint: "Set ConversionConfig::endpoint to an OpenAI-compatible URL \
                       or inject a custom transcriber."
                    .to_string(),
            });
        }

        if let Device::Accelerator(ref id) = config.device {
            // The server already picked its hardware; the request cannot
            // change it. Surface the mismatch instead of silently ignoring.
            info!(
                device = %id,
                "device flag recorded; the HTTP backend delegates hardware choice to the server"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| Pdf2DoclingError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            prompt: config
                .prompt
                .clone()
                .unwrap_or_else(|| DOCLING_INSTRUCTION.to_string()),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl PageTranscriber for HttpTranscriber {
    async fn transcribe(
        &self,
        page_num: usize,
        image: &DynamicImage,
    ) -> Result<String, Pdf2DoclingError> {
        let data_uri = png_data_uri(image)?;

        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "image_url", "image_url": { "url": data_uri } },
                    { "type": "text", "text": self.prompt },
                ],
            }],
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Pdf2DoclingError::Transcription {
                page: page_num,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Pdf2DoclingError::Transcription {
                page: page_num,
                detail: format!("HTTP {status}: {text}"),
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| Pdf2DoclingError::Transcription {
                    page: page_num,
                    detail: format!("malformed response: {e}"),
                })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Pdf2DoclingError::Transcription {
                page: page_num,
                detail: "response contained no choices".to_string(),
            })?;

        debug!(page_num, chars = content.len(), "transcription received");
        Ok(content)
    }
}
