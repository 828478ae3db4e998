//! One user's session: state, the in-flight generation and view snapshots
//!
//! The session owns its [`ConversationState`] and runs the model call as a
//! spawned task so the UI loop keeps drawing. Every accepted transition
//! publishes a fresh [`ViewSnapshot`] on a watch channel; renderers
//! subscribe to it instead of reading the state directly.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;

use crate::controller::{failure_outcome, GenerationController, Submission};
use crate::state::{ConversationState, GenerationOutcome, ViewSnapshot};

pub struct Session {
    state: ConversationState,
    controller: Arc<GenerationController>,
    pending: Option<JoinHandle<GenerationOutcome>>,
    snapshots: watch::Sender<ViewSnapshot>,
}

impl Session {
    pub fn new(controller: Arc<GenerationController>) -> Self {
        Self::with_state(controller, ConversationState::new())
    }

    pub fn with_state(controller: Arc<GenerationController>, state: ConversationState) -> Self {
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            state,
            controller,
            pending: None,
            snapshots,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn controller(&self) -> &GenerationController {
        &self.controller
    }

    pub fn is_generating(&self) -> bool {
        self.state.is_generating()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }

    /// Submit user input and, if accepted, start generating in the
    /// background. Must be called from within a tokio runtime.
    pub fn submit(&mut self, text: &str) -> Submission {
        let submission = self.controller.submit(&mut self.state, text);

        if let Submission::Dispatch(request) = &submission {
            let controller = Arc::clone(&self.controller);
            let request = request.clone();
            self.pending = Some(tokio::spawn(async move {
                controller.generate(&request).await
            }));
            self.publish();
        }

        submission
    }

    /// Apply the in-flight generation if it has finished. Does not wait.
    pub async fn poll(&mut self) -> bool {
        match &self.pending {
            Some(handle) if handle.is_finished() => self.wait().await,
            _ => false,
        }
    }

    /// Wait for the in-flight generation (if any) and apply its outcome.
    pub async fn wait(&mut self) -> bool {
        let Some(handle) = self.pending.take() else {
            return false;
        };

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Generation task did not complete");
                failure_outcome(format!("generation task failed: {}", e))
            }
        };

        let applied = self.controller.on_result(&mut self.state, outcome);
        if applied {
            self.publish();
        }
        applied
    }
}
