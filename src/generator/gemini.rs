use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::AuthStorage;
use crate::consts::{API_KEY_ENV_VARS, DEFAULT_API_BASE, DEFAULT_MODEL, PROVIDER};
use crate::error::MorphError;

use super::{GenerationRequest, GenerationResponse, Generator, ResponsePart, TokenUsage};

const API_KEY_HEADER: &str = "x-goog-api-key";
const ERROR_BODY_LIMIT: usize = 512;

/// Known image-capable Gemini models, for `/model`.
pub const KNOWN_MODELS: &[&str] = &[
    "gemini-2.5-flash-image",
    "gemini-2.5-flash-image-preview",
    "gemini-3-pro-image-preview",
];

/// A generator that calls Gemini's `generateContent`.
///
/// The API key is resolved on every call, so a `morph login` in another
/// terminal takes effect without a restart.
pub struct GeminiGenerator {
    model: String,
    api_base: String,
    env_vars: &'static [&'static str],
    auth: AuthStorage,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(model: Option<String>, auth: AuthStorage) -> Self {
        let api_base = std::env::var("GEMINI_API_BASE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base,
            env_vars: API_KEY_ENV_VARS,
            auth,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Environment variables consulted after the stored key.
    pub fn with_env_vars(mut self, env_vars: &'static [&'static str]) -> Self {
        self.env_vars = env_vars;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationResponse> {
        let (api_key, source) = self
            .auth
            .resolve_api_key(PROVIDER, self.env_vars)?
            .ok_or(MorphError::MissingCredential)?;
        debug!(?source, "resolved Gemini API key");

        generate_content(&self.client, &self.api_base, &self.model, &api_key, request).await
    }
}

/// Send one `generateContent` request.
///
/// Stateless: the credential is passed in, nothing is cached between calls.
pub async fn generate_content(
    client: &reqwest::Client,
    api_base: &str,
    model: &str,
    api_key: &str,
    request: &GenerationRequest<'_>,
) -> Result<GenerationResponse> {
    if api_key.trim().is_empty() {
        return Err(MorphError::MissingCredential.into());
    }

    let url = endpoint(api_base, model);
    let body = build_request_body(request);
    debug!(
        %url,
        mime_type = request.image.mime_type(),
        image_bytes = request.image.bytes().len(),
        "sending generateContent request"
    );

    let resp = client
        .post(&url)
        .header(API_KEY_HEADER, api_key)
        .json(&body)
        .send()
        .await
        // Failures are classified by message text, which must not include the URL.
        .map_err(reqwest::Error::without_url)
        .context("Gemini request failed")?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(reqwest::Error::without_url)
        .context("Gemini response body read failed")?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "Gemini returned an error status");
        return Err(status_error(status.as_u16(), &text));
    }

    parse_response(&text)
}

pub fn endpoint(api_base: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model
    )
}

fn build_request_body<'a>(request: &GenerationRequest<'a>) -> ApiRequest<'a> {
    ApiRequest {
        contents: vec![ApiContent {
            parts: vec![
                ApiPart::InlineData {
                    inline_data: ApiBlob {
                        mime_type: request.image.mime_type(),
                        data: request.image.base64(),
                    },
                },
                ApiPart::Text {
                    text: request.instruction,
                },
            ],
        }],
    }
}

/// Map a non-2xx status to an error. Credential and quota failures come
/// back typed; everything else carries the status and the service's message.
fn status_error(code: u16, body: &str) -> anyhow::Error {
    let message = error_message(body);
    match code {
        401 | 403 => MorphError::CredentialRejected.into(),
        400 if body.contains("API_KEY_INVALID") => MorphError::CredentialRejected.into(),
        429 => MorphError::Throttled.into(),
        _ => anyhow::anyhow!(
            "Gemini request failed ({code}): {}",
            truncate(&message, ERROR_BODY_LIMIT)
        ),
    }
}

/// `error.message` from a Gemini error payload, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error)
        .and_then(|err| err.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Decode a `generateContent` response body into ordered parts.
///
/// Only the first candidate is read. Parts with empty inline data are skipped.
pub fn parse_response(body: &str) -> Result<GenerationResponse> {
    let api: ApiResponse =
        serde_json::from_str(body).context("Gemini returned invalid JSON payload")?;

    let mut parts = Vec::new();
    if let Some(content) = api.candidates.into_iter().next().and_then(|c| c.content) {
        for part in content.parts {
            if let Some(blob) = part.inline_data
                && !blob.data.is_empty()
            {
                let bytes = BASE64
                    .decode(blob.data.as_bytes())
                    .context("Gemini image base64 decode failed")?;
                parts.push(ResponsePart::Image {
                    bytes,
                    mime_type: blob.mime_type,
                });
            } else if let Some(text) = part.text
                && !text.is_empty()
            {
                parts.push(ResponsePart::Text(text));
            }
        }
    } else if let Some(reason) = api.prompt_feedback.and_then(|f| f.block_reason) {
        parts.push(ResponsePart::Text(format!(
            "the request was blocked by the model ({reason})"
        )));
    }

    let usage = api.usage_metadata.map(|u| TokenUsage {
        input_tokens: u.prompt_token_count.unwrap_or(0),
        output_tokens: u.candidates_token_count.unwrap_or(0),
    });

    Ok(GenerationResponse { parts, usage })
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    contents: Vec<ApiContent<'a>>,
}

#[derive(Serialize)]
struct ApiContent<'a> {
    parts: Vec<ApiPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ApiPart<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: ApiBlob<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiBlob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<Blob>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    #[serde(alias = "mime_type")]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}
