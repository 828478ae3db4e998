use std::path::PathBuf;

use tokio::sync::watch;
use web_builder::artifact::export_html;
use web_builder::{Provider, Session, Submission, SubmitRejection, ViewSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Preview,
    Code,
}

impl Tab {
    pub fn titles() -> [&'static str; 2] {
        ["Preview", "Code"]
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Preview => 0,
            Tab::Code => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub tab: Tab,

    // Chat input
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Content state
    pub scroll: u16,
    pub content_height: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // One-line feedback shown in the footer
    pub status: Option<String>,

    // Latest session snapshot; the UI only ever renders this
    pub view: ViewSnapshot,

    pub provider: Provider,
    pub model: String,
    pub export_dir: PathBuf,

    session: Session,
    snapshots: watch::Receiver<ViewSnapshot>,
}

impl App {
    pub fn new(session: Session, provider: Provider, export_dir: PathBuf) -> Self {
        let snapshots = session.subscribe();
        let view = session.snapshot();
        let model = session.controller().model().to_string();

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            tab: Tab::Preview,

            input: String::new(),
            cursor: 0,

            scroll: 0,
            content_height: 0,

            animation_frame: 0,
            status: None,
            view,

            provider,
            model,
            export_dir,

            session,
            snapshots,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.view.is_generating
    }

    pub fn artifact(&self) -> Option<&str> {
        self.view.last_artifact.as_deref()
    }

    /// Send the typed request to the session
    pub fn submit_input(&mut self) {
        match self.session.submit(&self.input) {
            Submission::Dispatch(_) => {
                self.input.clear();
                self.cursor = 0;
                self.input_mode = InputMode::Normal;
                self.scroll = 0;
                self.tab = Tab::Preview;
                self.status = None;
            }
            Submission::Ignored(SubmitRejection::Busy) => {
                self.status = Some("Generating... Please wait.".to_string());
            }
            Submission::Ignored(SubmitRejection::EmptyInput) => {}
        }
        self.refresh_view();
    }

    /// Apply a finished generation, if any, and pick up the new snapshot
    pub async fn poll_generation(&mut self) {
        if self.session.poll().await {
            self.scroll = 0;
            self.input_mode = InputMode::Editing;
        }
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        if self.snapshots.has_changed().unwrap_or(false) {
            self.view = self.snapshots.borrow_and_update().clone();
        }
    }

    /// Write the current document as website.html
    pub fn export(&mut self) {
        let Some(artifact) = self.view.last_artifact.as_deref() else {
            self.status = Some("Nothing to export yet".to_string());
            return;
        };

        self.status = Some(match export_html(artifact, &self.export_dir) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Exported website");
                format!("Saved {}", path.display())
            }
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                format!("Export failed: {}", e)
            }
        });
    }

    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Preview => Tab::Code,
            Tab::Code => Tab::Preview,
        };
        self.scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.content_height / 2).max(1);
        self.scroll = self.scroll.saturating_add(half);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.content_height / 2).max(1);
        self.scroll = self.scroll.saturating_sub(half);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_generating() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use web_builder::{GenerateError, GenerationController, GenerationOptions, Generator};

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerateError> {
            Ok("```html\n<html><body><h1>Echo</h1></body></html>\n```".to_string())
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    pub(crate) fn test_app(export_dir: PathBuf) -> App {
        let controller = GenerationController::new(Arc::new(EchoGenerator), GenerationOptions::default());
        App::new(Session::new(Arc::new(controller)), Provider::Gemini, export_dir)
    }

    #[tokio::test]
    async fn test_submit_clears_input_and_shows_generating() {
        let mut app = test_app(PathBuf::from("."));
        app.input = "a cafe page".to_string();
        app.cursor = 11;

        app.submit_input();

        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(app.is_generating());
        assert_eq!(app.view.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_submit_keeps_state() {
        let mut app = test_app(PathBuf::from("."));
        app.input = "   ".to_string();

        app.submit_input();

        assert_eq!(app.input, "   ");
        assert!(!app.is_generating());
        assert!(app.view.messages.is_empty());
    }

    #[tokio::test]
    async fn test_poll_picks_up_finished_generation() {
        let mut app = test_app(PathBuf::from("."));
        app.input = "echo".to_string();
        app.submit_input();

        while app.is_generating() {
            tokio::task::yield_now().await;
            app.poll_generation().await;
        }

        assert_eq!(app.artifact(), Some("<html><body><h1>Echo</h1></body></html>"));
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[tokio::test]
    async fn test_export_writes_current_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path().to_path_buf());

        app.export();
        assert_eq!(app.status.as_deref(), Some("Nothing to export yet"));

        app.input = "echo".to_string();
        app.submit_input();
        while app.is_generating() {
            tokio::task::yield_now().await;
            app.poll_generation().await;
        }
        app.export();

        let written = std::fs::read_to_string(dir.path().join("website.html")).unwrap();
        assert_eq!(written, "<html><body><h1>Echo</h1></body></html>");
    }

    #[test]
    fn test_toggle_tab_resets_scroll() {
        let mut app = test_app(PathBuf::from("."));
        app.scroll = 7;

        app.toggle_tab();

        assert_eq!(app.tab, Tab::Code);
        assert_eq!(app.scroll, 0);
    }
}
