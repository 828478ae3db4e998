//! Conversation/generation state machine
//!
//! A session is `Idle` until the user submits a non-empty request, then
//! `Generating` until the model call resolves. While generating, further
//! submissions are refused so there is never more than one request in
//! flight per session. The controller itself holds no session data: it is
//! handed the [`ConversationState`] it should act on.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::ai::{GenerateError, GenerationOptions, Generator};
use crate::artifact::strip_fence;
use crate::logging::preview_for_log;
use crate::prompt::build_prompt;
use crate::state::{ChatMessage, ConversationState, GenerationOutcome, GenerationRequest};

/// Assistant reply recorded after every successful generation
pub const GENERATED_CONFIRMATION: &str = "Your minimalist website has been generated!";

/// Prefix of the text stored in place of the document when a call fails
pub const API_ERROR_PREFIX: &str = "API error: ";

/// What happened to a submitted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Accepted; the request must now be generated
    Dispatch(GenerationRequest),
    Ignored(SubmitRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Blank or whitespace-only input
    EmptyInput,
    /// A generation is already in flight
    Busy,
}

/// Build the failure outcome shown to the user for a failed model call.
pub fn failure_outcome(detail: impl Display) -> GenerationOutcome {
    GenerationOutcome::Failure {
        error_message: format!("{}{}", API_ERROR_PREFIX, detail),
    }
}

pub struct GenerationController {
    generator: Arc<dyn Generator>,
    options: GenerationOptions,
}

impl GenerationController {
    pub fn new(generator: Arc<dyn Generator>, options: GenerationOptions) -> Self {
        Self { generator, options }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Accept user input. `Idle` + non-empty text moves the session to
    /// `Generating` and returns the request to dispatch.
    pub fn submit(&self, state: &mut ConversationState, text: &str) -> Submission {
        if state.is_generating {
            debug!("Submission refused: generation already in progress");
            return Submission::Ignored(SubmitRejection::Busy);
        }
        if text.trim().is_empty() {
            return Submission::Ignored(SubmitRejection::EmptyInput);
        }

        state.messages.push(ChatMessage::user(text));
        state.is_generating = true;
        debug!(
            messages = state.messages.len(),
            request = %preview_for_log(text),
            "Session entered generating state"
        );

        Submission::Dispatch(GenerationRequest {
            prior_artifact: state.last_artifact.clone(),
            latest_user_message: text.to_string(),
        })
    }

    /// Run the model call for `request`. Never fails: errors come back as
    /// [`GenerationOutcome::Failure`].
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let prompt = build_prompt(
            request.prior_artifact.as_deref(),
            &request.latest_user_message,
        );

        info!(
            model = self.generator.model(),
            prompt_chars = prompt.len(),
            has_prior_artifact = request.prior_artifact.is_some(),
            "Dispatching generation"
        );
        let started = Instant::now();

        let result = self
            .generator
            .generate(&prompt, &self.options)
            .await
            .map(|text| strip_fence(&text))
            .and_then(|artifact_text| {
                if artifact_text.is_empty() {
                    Err(GenerateError::EmptyResponse)
                } else {
                    Ok(artifact_text)
                }
            });

        match result {
            Ok(artifact_text) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    artifact_chars = artifact_text.len(),
                    "Generation succeeded"
                );
                GenerationOutcome::Success { artifact_text }
            }
            Err(e) => {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Generation failed"
                );
                failure_outcome(e)
            }
        }
    }

    /// Apply a finished generation and return the session to `Idle`.
    ///
    /// Returns false (and changes nothing) if the session was not generating.
    pub fn on_result(&self, state: &mut ConversationState, outcome: GenerationOutcome) -> bool {
        if !state.is_generating {
            warn!("Discarding generation result received while idle");
            return false;
        }

        match outcome {
            GenerationOutcome::Success { artifact_text } => {
                state.last_artifact = Some(artifact_text);
                state.messages.push(ChatMessage::assistant(GENERATED_CONFIRMATION));
            }
            // Errors are displayed where the document would be.
            GenerationOutcome::Failure { error_message } => {
                state.last_artifact = Some(error_message);
            }
        }
        state.is_generating = false;
        true
    }

    /// Submit, generate and apply in one go. Returns `None` when the input
    /// was ignored.
    pub async fn run_turn(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Option<GenerationOutcome> {
        match self.submit(state, text) {
            Submission::Dispatch(request) => {
                let outcome = self.generate(&request).await;
                self.on_result(state, outcome.clone());
                Some(outcome)
            }
            Submission::Ignored(_) => None,
        }
    }
}
