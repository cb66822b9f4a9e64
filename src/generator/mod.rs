pub mod gemini;
pub mod mock;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::image::SourceImage;

/// Token usage from a single generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Total tokens (input + output).
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Everything one generation call needs: the image and the built instruction.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub image: &'a SourceImage,
    pub instruction: &'a str,
}

/// One piece of the model's answer, in the order the service returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Image {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    Text(String),
}

/// The model's answer before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub parts: Vec<ResponsePart>,
    pub usage: Option<TokenUsage>,
}

impl GenerationResponse {
    pub fn with_parts(parts: Vec<ResponsePart>) -> Self {
        Self { parts, usage: None }
    }
}

/// The external image model. Could be Gemini or a test script.
///
/// One call to [`Generator::generate`] is one network request. Failures are
/// returned as-is; the engine classifies them.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider name, e.g. `"gemini"`.
    fn name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationResponse>;
}

/// Lets a caller keep a handle on a generator it hands to the engine.
#[async_trait]
impl<G: Generator + ?Sized> Generator for Arc<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationResponse> {
        (**self).generate(request).await
    }
}
