use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{GenerationRequest, GenerationResponse, Generator, ResponsePart};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(GenerationResponse),
    /// Fail with this message, as a transport error would.
    Fail(String),
}

impl MockReply {
    pub fn image(bytes: &[u8]) -> Self {
        MockReply::Respond(GenerationResponse::with_parts(vec![ResponsePart::Image {
            bytes: bytes.to_vec(),
            mime_type: Some("image/png".to_string()),
        }]))
    }

    pub fn text(text: &str) -> Self {
        MockReply::Respond(GenerationResponse::with_parts(vec![ResponsePart::Text(
            text.to_string(),
        )]))
    }

    pub fn empty() -> Self {
        MockReply::Respond(GenerationResponse::default())
    }

    pub fn fail(message: &str) -> Self {
        MockReply::Fail(message.to_string())
    }
}

/// A scripted generator for tests. Returns pre-defined replies in order and
/// records every instruction it was sent.
pub struct MockGenerator {
    replies: Vec<MockReply>,
    index: AtomicUsize,
    instructions: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
        }
    }

    /// How many times `generate` was called.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Instructions received so far, oldest first.
    pub fn instructions(&self) -> Vec<String> {
        self.instructions
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-image"
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationResponse> {
        if let Ok(mut seen) = self.instructions.lock() {
            seen.push(request.instruction.to_string());
        }
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(i) {
            Some(MockReply::Respond(response)) => Ok(response.clone()),
            Some(MockReply::Fail(message)) => Err(anyhow::anyhow!("{message}")),
            None => Err(anyhow::anyhow!(
                "MockGenerator: no more replies (called {} times)",
                i + 1
            )),
        }
    }
}
