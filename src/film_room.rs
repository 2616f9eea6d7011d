//! The Film Room controller: query text, request lifecycle, answer and sources.
//!
//! State only changes through `&mut self`, so the busy check in [`FilmRoom::submit`]
//! and the transition to `Loading` cannot interleave with another submission.

use std::sync::Arc;
use std::time::Duration;

use iced::{clipboard, time, Subscription, Task};

use crate::gemini::{GenerateContentResponse, SearchBackend};
use crate::grounding::{self, SearchSource};

pub const FALLBACK_ANSWER: &str = "I couldn't find a tactical advantage for that scenario, Coach.";

pub const NETWORK_ERROR: &str =
    "The scouts are having trouble reaching the network. Check your connection.";

pub const SUGGESTIONS: [&str; 4] = [
    "How to beat a 4-3 defense",
    "Best red zone passing concepts",
    "How to stop a dual-threat QB",
    "West Coast vs Air Raid offense",
];

/// Loading spinner, one frame per `Message::Tick`.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn coach_prompt(query: &str) -> String {
    format!(
        "You are a legendary high school football coach. Provide a brief, tactical breakdown for this question: {}",
        query
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Loading { request: RequestId },
    Success(String),
    Error(String),
}

/// What the backend call settled with. Errors are flattened to their message.
pub type Outcome = Result<GenerateContentResponse, String>;

/// An accepted submission: the request to issue and the id its completion must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub request: RequestId,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub enum Message {
    QueryChanged(String),
    Submit,
    SuggestionPicked(&'static str),
    Settled { request: RequestId, outcome: Outcome },
    Tick,
    CopyResult,
    OpenSource(String),
}

pub struct FilmRoom {
    query: String,
    state: RequestState,
    sources: Vec<SearchSource>,
    last_request: u64,
    loading_frame: usize,
    backend: Arc<dyn SearchBackend>,
}

impl FilmRoom {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        FilmRoom {
            query: String::new(),
            state: RequestState::Idle,
            sources: Vec::new(),
            last_request: 0,
            loading_frame: 0,
            backend,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RequestState::Loading { .. })
    }

    /// The message shown in the result slot; success and error share it.
    pub fn result(&self) -> Option<&str> {
        match &self.state {
            RequestState::Success(text) | RequestState::Error(text) => Some(text),
            RequestState::Idle | RequestState::Loading { .. } => None,
        }
    }

    pub fn sources(&self) -> &[SearchSource] {
        &self.sources
    }

    pub fn loading_frame(&self) -> usize {
        self.loading_frame
    }

    pub fn set_query(&mut self, text: String) {
        self.query = text;
    }

    pub fn pick_suggestion(&mut self, suggestion: &str) {
        self.query = suggestion.to_string();
    }

    /// Moves to `Loading` and hands back the request to issue.
    ///
    /// Returns `None` without touching any state when the query is blank or a
    /// request is already in flight.
    pub fn submit(&mut self) -> Option<Submission> {
        if self.query.trim().is_empty() {
            return None;
        }
        if let RequestState::Loading { request } = self.state {
            log::debug!("Ignoring submit while {:?} is in flight", request);
            return None;
        }

        self.last_request += 1;
        let request = RequestId(self.last_request);

        self.state = RequestState::Loading { request };
        self.sources.clear();
        self.loading_frame = 0;

        log::info!("Submitting film room query {:?}", request);

        Some(Submission {
            request,
            prompt: coach_prompt(&self.query),
        })
    }

    /// Applies a completed call. Completions for anything but the in-flight request are dropped.
    pub fn settle(&mut self, request: RequestId, outcome: Outcome) {
        if self.state != (RequestState::Loading { request }) {
            log::warn!("Discarding stale completion for {:?}", request);
            return;
        }

        // Replacing `state` is what clears loading, so it happens last on both paths.
        match outcome {
            Ok(response) => {
                let answer = response
                    .text()
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
                self.sources = grounding::extract_sources(&response);
                log::info!(
                    "{:?} answered with {} source(s)",
                    request,
                    self.sources.len()
                );
                self.state = RequestState::Success(answer);
            }
            Err(err) => {
                log::error!("Film room request {:?} failed: {}", request, err);
                self.state = RequestState::Error(NETWORK_ERROR.to_string());
            }
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::QueryChanged(text) => {
                self.set_query(text);
                Task::none()
            }
            Message::SuggestionPicked(suggestion) => {
                self.pick_suggestion(suggestion);
                Task::none()
            }
            Message::Submit => match self.submit() {
                Some(Submission { request, prompt }) => Task::perform(
                    consult(self.backend.clone(), prompt),
                    move |outcome| Message::Settled { request, outcome },
                ),
                None => Task::none(),
            },
            Message::Settled { request, outcome } => {
                self.settle(request, outcome);
                Task::none()
            }
            Message::Tick => {
                if self.is_loading() {
                    self.loading_frame = (self.loading_frame + 1) % SPINNER_FRAMES.len();
                }
                Task::none()
            }
            Message::CopyResult => match self.result() {
                Some(text) => clipboard::write(text.to_string()),
                None => Task::none(),
            },
            Message::OpenSource(uri) => {
                open_source(&uri, |uri| open::that_detached(uri));
                Task::none()
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.is_loading() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }
}

/// Hands a cited page to the system browser. Failures are only logged.
pub fn open_source<F>(uri: &str, opener: F) -> bool
where
    F: FnOnce(&str) -> std::io::Result<()>,
{
    if uri.is_empty() {
        log::warn!("Source has no URI to open");
        return false;
    }
    match opener(uri) {
        Ok(()) => {
            log::debug!("Opened {}", uri);
            true
        }
        Err(err) => {
            log::warn!("Failed to open {}: {}", uri, err);
            false
        }
    }
}

/// Runs one backend call. Never fails: errors come back inside the outcome.
pub async fn consult(backend: Arc<dyn SearchBackend>, prompt: String) -> Outcome {
    backend.generate(&prompt).await.map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeminiError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<GenerateContentResponse, GeminiError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn with(replies: Vec<Result<GenerateContentResponse, GeminiError>>) -> Arc<Self> {
            Arc::new(ScriptedBackend {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        async fn generate(&self, prompt: &str) -> Result<GenerateContentResponse, GeminiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected backend call")
        }
    }

    fn zone_blitz() -> GenerateContentResponse {
        serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Run a zone blitz" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "title": "Blitz Basics", "uri": "https://a.example/blitz" } },
                        { "web": { "title": "Fire Zone", "uri": "https://b.example/fire" } },
                        { "retrievedContext": { "title": "Playbook" } }
                    ]
                }
            }]
        }))
        .unwrap()
    }

    fn unavailable() -> GeminiError {
        GeminiError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "overloaded".to_string(),
        }
    }

    /// Drives a submission through the backend the way `update` does.
    async fn run(room: &mut FilmRoom, backend: &Arc<ScriptedBackend>) -> Option<RequestId> {
        let submission = room.submit()?;
        assert!(room.is_loading());
        let outcome = consult(backend.clone(), submission.prompt).await;
        assert!(room.is_loading());
        room.settle(submission.request, outcome);
        Some(submission.request)
    }

    #[test]
    fn test_blank_query_is_ignored() {
        crate::logging::initialize_for_tests();
        let backend = ScriptedBackend::with(vec![]);
        let mut room = FilmRoom::new(backend.clone());

        for blank in ["", "   ", "\t\n "] {
            room.set_query(blank.to_string());
            assert_eq!(room.submit(), None);
            assert_eq!(room.state(), &RequestState::Idle);
            assert!(!room.is_loading());
            assert_eq!(room.result(), None);
            assert!(room.sources().is_empty());
        }
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_blank_query_keeps_previous_result() {
        let backend = ScriptedBackend::with(vec![]);
        let mut room = FilmRoom::new(backend);
        room.set_query("Cover 2".to_string());
        let submission = room.submit().unwrap();
        room.settle(submission.request, Ok(zone_blitz()));

        room.set_query("  ".to_string());
        assert_eq!(room.submit(), None);
        assert_eq!(room.result(), Some("Run a zone blitz"));
        assert_eq!(room.sources().len(), 2);
    }

    #[tokio::test]
    async fn test_success_sets_result_and_sources() {
        let backend = ScriptedBackend::with(vec![Ok(zone_blitz())]);
        let mut room = FilmRoom::new(backend.clone());
        room.set_query("How do we pressure a spread team?".to_string());

        run(&mut room, &backend).await.unwrap();

        assert!(!room.is_loading());
        assert_eq!(room.state(), &RequestState::Success("Run a zone blitz".to_string()));
        assert_eq!(
            room.sources(),
            &[
                SearchSource {
                    title: "Blitz Basics".to_string(),
                    uri: "https://a.example/blitz".to_string(),
                },
                SearchSource {
                    title: "Fire Zone".to_string(),
                    uri: "https://b.example/fire".to_string(),
                },
            ]
        );
        assert_eq!(
            backend.prompts.lock().unwrap().as_slice(),
            &[coach_prompt("How do we pressure a spread team?")]
        );
    }

    #[tokio::test]
    async fn test_missing_text_uses_fallback() {
        let empty_text: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "" }] } }]
        }))
        .unwrap();
        let backend = ScriptedBackend::with(vec![
            Ok(GenerateContentResponse::default()),
            Ok(empty_text),
        ]);
        let mut room = FilmRoom::new(backend.clone());
        room.set_query("Triple option".to_string());

        run(&mut room, &backend).await.unwrap();
        assert_eq!(room.result(), Some(FALLBACK_ANSWER));
        assert!(room.sources().is_empty());

        run(&mut room, &backend).await.unwrap();
        assert_eq!(room.result(), Some(FALLBACK_ANSWER));
    }

    #[tokio::test]
    async fn test_failure_sets_network_error() {
        crate::logging::initialize_for_tests();
        let backend = ScriptedBackend::with(vec![Ok(zone_blitz()), Err(unavailable())]);
        let mut room = FilmRoom::new(backend.clone());
        room.set_query("Cover 3 beaters".to_string());

        run(&mut room, &backend).await.unwrap();
        assert_eq!(room.sources().len(), 2);

        run(&mut room, &backend).await.unwrap();
        assert!(!room.is_loading());
        assert_eq!(room.state(), &RequestState::Error(NETWORK_ERROR.to_string()));
        assert!(room.sources().is_empty());
    }

    #[test]
    fn test_submit_resets_result_and_sources() {
        let backend = ScriptedBackend::with(vec![]);
        let mut room = FilmRoom::new(backend);
        room.set_query("Cover 2".to_string());
        let first = room.submit().unwrap();
        room.settle(first.request, Ok(zone_blitz()));
        assert_eq!(room.sources().len(), 2);

        let second = room.submit().unwrap();
        assert_ne!(first.request, second.request);
        assert!(room.is_loading());
        assert_eq!(room.result(), None);
        assert!(room.sources().is_empty());
    }

    #[test]
    fn test_query_is_kept_verbatim() {
        let backend = ScriptedBackend::with(vec![]);
        let mut room = FilmRoom::new(backend);
        room.set_query("  Stop the run?  ".to_string());

        let submission = room.submit().unwrap();
        assert_eq!(room.query(), "  Stop the run?  ");
        assert_eq!(
            submission.prompt,
            "You are a legendary high school football coach. Provide a brief, tactical breakdown for this question:   Stop the run?  "
        );

        room.settle(submission.request, Ok(zone_blitz()));
        assert_eq!(room.query(), "  Stop the run?  ");
    }

    #[test]
    fn test_submit_while_loading_is_rejected() {
        let backend = ScriptedBackend::with(vec![]);
        let mut room = FilmRoom::new(backend.clone());
        room.set_query("Wing T".to_string());

        let first = room.submit().unwrap();
        room.set_query("Pistol".to_string());
        assert_eq!(room.submit(), None);
        assert_eq!(room.state(), &RequestState::Loading { request: first.request });

        room.settle(first.request, Ok(zone_blitz()));
        assert!(!room.is_loading());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let backend = ScriptedBackend::with(vec![]);
        let mut room = FilmRoom::new(backend);
        room.set_query("Wing T".to_string());

        let first = room.submit().unwrap();
        room.settle(first.request, Err("timed out".to_string()));
        let second = room.submit().unwrap();

        room.settle(first.request, Ok(zone_blitz()));
        assert_eq!(room.state(), &RequestState::Loading { request: second.request });

        room.settle(second.request, Ok(zone_blitz()));
        room.settle(second.request, Err("late duplicate".to_string()));
        assert_eq!(room.result(), Some("Run a zone blitz"));
    }

    #[test]
    fn test_pick_suggestion_sets_query_only() {
        let backend = ScriptedBackend::with(vec![]);
        let mut room = FilmRoom::new(backend.clone());

        let _ = room.update(Message::SuggestionPicked(SUGGESTIONS[0]));

        assert_eq!(room.query(), "How to beat a 4-3 defense");
        assert_eq!(room.state(), &RequestState::Idle);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeat_submission_calls_again_and_overwrites() {
        let second: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Show blitz, drop eight" }] },
                "groundingMetadata": {
                    "groundingChunks": [{ "web": { "title": "Sim Pressure", "uri": "https://c.example" } }]
                }
            }]
        }))
        .unwrap();
        let backend = ScriptedBackend::with(vec![Ok(zone_blitz()), Ok(second)]);
        let mut room = FilmRoom::new(backend.clone());
        room.set_query("Pressure package".to_string());

        let first = run(&mut room, &backend).await.unwrap();
        let again = run(&mut room, &backend).await.unwrap();

        assert_ne!(first, again);
        assert_eq!(backend.calls(), 2);
        assert_eq!(room.result(), Some("Show blitz, drop eight"));
        assert_eq!(
            room.sources(),
            &[SearchSource {
                title: "Sim Pressure".to_string(),
                uri: "https://c.example".to_string(),
            }]
        );
    }

    #[test]
    fn test_open_source_hands_uri_to_opener() {
        let mut opened = Vec::new();
        assert!(open_source("https://a.example/blitz", |uri| {
            opened.push(uri.to_string());
            Ok(())
        }));
        assert_eq!(opened, vec!["https://a.example/blitz".to_string()]);

        assert!(!open_source("https://b.example", |_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
        }));
        assert!(!open_source("", |_| panic!("empty uri must not be opened")));
    }

    #[test]
    fn test_tick_only_animates_while_loading() {
        let backend = ScriptedBackend::with(vec![]);
        let mut room = FilmRoom::new(backend);

        let _ = room.update(Message::Tick);
        assert_eq!(room.loading_frame(), 0);

        room.set_query("Air raid".to_string());
        room.submit().unwrap();
        for _ in 0..SPINNER_FRAMES.len() + 3 {
            let _ = room.update(Message::Tick);
        }
        assert_eq!(room.loading_frame(), 3);
    }
}
