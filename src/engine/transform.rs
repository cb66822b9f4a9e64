use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{RequestState, interpret};
use crate::error::{MorphError, MorphResult, ValidationError, classify_error};
use crate::events::{Event, EventBus};
use crate::generator::{GenerationRequest, Generator, TokenUsage};
use crate::image::{GeneratedImage, SourceImage};
use crate::mode::{Creativity, Mode};
use crate::prompts::edit::build_edit_instruction;

/// One editing session: the current image, the user's choices, the last
/// result and the request state. Wires the inputs to a [`Generator`].
pub struct TransformEngine {
    generator: Arc<RwLock<Box<dyn Generator>>>,
    events: Arc<EventBus>,
    source: Option<SourceImage>,
    generated: Option<GeneratedImage>,
    mode: Mode,
    creativity: Creativity,
    instruction: String,
    state: RequestState,
    usage: TokenUsage,
    generations: u32,
}

impl TransformEngine {
    pub fn new(generator: Box<dyn Generator>) -> Self {
        Self::with_events(generator, Arc::new(EventBus::default()))
    }

    pub fn with_events(generator: Box<dyn Generator>, events: Arc<EventBus>) -> Self {
        Self {
            generator: Arc::new(RwLock::new(generator)),
            events,
            source: None,
            generated: None,
            mode: Mode::default(),
            creativity: Creativity::default(),
            instruction: String::new(),
            state: RequestState::Idle,
            usage: TokenUsage::default(),
            generations: 0,
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Swap the generator (e.g. a new model). The next submit uses it.
    pub async fn set_generator(&self, generator: Box<dyn Generator>) {
        let model = generator.model().to_string();
        *self.generator.write().await = generator;
        self.events.emit(Event::ModelChanged { model });
    }

    pub async fn provider_name(&self) -> String {
        self.generator.read().await.name().to_string()
    }

    pub async fn model_name(&self) -> String {
        self.generator.read().await.model().to_string()
    }

    /// Replace the source image. The previous result and error belong to
    /// the old image, so both are cleared.
    pub fn upload(&mut self, image: SourceImage) {
        self.events.emit(Event::ImageUploaded {
            mime_type: image.mime_type().to_string(),
            bytes: image.bytes().len(),
        });
        self.source = Some(image);
        self.generated = None;
        if !self.state.is_in_flight() {
            self.transition(RequestState::Idle);
        }
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn generated(&self) -> Option<&GeneratedImage> {
        self.generated.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn creativity(&self) -> Creativity {
        self.creativity
    }

    pub fn set_creativity(&mut self, creativity: Creativity) {
        self.creativity = creativity;
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.instruction = instruction.into();
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// The message for the error line, if the last attempt failed.
    pub fn error(&self) -> Option<&MorphError> {
        self.state.error()
    }

    pub fn session_usage(&self) -> TokenUsage {
        self.usage
    }

    /// Successful generations this session.
    pub fn generations(&self) -> u32 {
        self.generations
    }

    /// Local preconditions, checked before anything is sent.
    pub fn check_ready(&self) -> Result<(), ValidationError> {
        if self.state.is_in_flight() {
            return Err(ValidationError::Busy);
        }
        if self.source.is_none() {
            return Err(ValidationError::MissingImage);
        }
        if self.instruction.trim().is_empty() {
            return Err(ValidationError::EmptyInstruction);
        }
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.check_ready().is_ok()
    }

    /// The instruction text that would be sent for the current inputs.
    pub fn build_instruction(&self) -> String {
        build_edit_instruction(self.mode, self.creativity, &self.instruction)
    }

    /// Run one generation with the current inputs.
    ///
    /// Exactly one generator call per accepted submit. The state is
    /// `InFlight` for the duration of the call and always leaves it.
    pub async fn submit(&mut self) -> MorphResult<&GeneratedImage> {
        match self.check_ready() {
            Ok(()) => {}
            Err(ValidationError::Busy) => return Err(ValidationError::Busy.into()),
            Err(err) => {
                let err = MorphError::from(err);
                self.transition(RequestState::Failed(err.clone()));
                return Err(err);
            }
        }

        let instruction = self.build_instruction();
        self.transition(RequestState::InFlight);

        let outcome = match self.source.as_ref() {
            Some(image) => {
                let request = GenerationRequest {
                    image,
                    instruction: &instruction,
                };
                let generator = self.generator.read().await;
                generator.generate(&request).await
            }
            None => Err(MorphError::from(ValidationError::MissingImage).into()),
        };

        let result = match outcome {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    self.usage.add(usage);
                }
                interpret(response)
            }
            Err(err) => Err(classify_error(&err)),
        };

        match result {
            Ok(image) => {
                self.generations += 1;
                info!(
                    mime_type = %image.mime_type,
                    bytes = image.bytes.len(),
                    mode = %self.mode,
                    "generation succeeded"
                );
                self.transition(RequestState::Succeeded);
                Ok(&*self.generated.insert(image))
            }
            Err(err) => {
                warn!(error = %err, "generation failed");
                self.transition(RequestState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn transition(&mut self, state: RequestState) {
        self.state = state.clone();
        self.events.emit(Event::StateChanged { state });
    }
}
