//! Page reading engine
//!
//! Owns the segment sequence and the Idle/Reading/Paused state machine,
//! and drives speech synthesis one segment at a time in document order.
//! Control calls (`pause`, `stop`, a fresh `start`) invalidate the running
//! loop through a run token; the loop re-checks the token after every
//! suspension point before touching state or visual marks, so stale
//! completions can never corrupt a newer session.

use crate::capability::{PageAccess, SpeechOutcome, SpeechSynthesis};
use crate::settings::SettingsStore;
use crate::{Result, VoxmateError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One readable span of page text, tied to its position in document order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Text content, immutable once captured
    pub text: String,
    /// Back-reference the page collaborator uses to mark/unmark the span
    pub node: u64,
}

impl Segment {
    pub fn new(text: impl Into<String>, node: u64) -> Self {
        Self {
            text: text.into(),
            node,
        }
    }
}

/// Reading session state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadingState {
    /// No session; index is 0
    #[default]
    Idle,
    /// Speaking segments sequentially
    Reading,
    /// Suspended; the index of the last started segment is preserved
    Paused,
}

impl ReadingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ReadingState::Idle)
    }

    pub fn is_reading(&self) -> bool {
        matches!(self, ReadingState::Reading)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, ReadingState::Paused)
    }
}

impl std::fmt::Display for ReadingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadingState::Idle => write!(f, "Idle"),
            ReadingState::Reading => write!(f, "Reading"),
            ReadingState::Paused => write!(f, "Paused"),
        }
    }
}

#[derive(Default)]
struct Session {
    state: ReadingState,
    segments: Vec<Segment>,
    /// Next unread segment (points at the last started one until it completes)
    index: usize,
    /// Bumped by every control transition; a loop whose token no longer
    /// matches must exit without side effects
    run_token: u64,
}

struct EngineShared {
    session: Mutex<Session>,
    page: Arc<dyn PageAccess>,
    speech: Arc<dyn SpeechSynthesis>,
    settings: SettingsStore,
}

/// The page-reading state machine
///
/// One instance per page context; `start` while already Reading is a no-op,
/// so at most one reading loop is ever active.
#[derive(Clone)]
pub struct ReadingEngine {
    shared: Arc<EngineShared>,
}

impl ReadingEngine {
    pub fn new(
        page: Arc<dyn PageAccess>,
        speech: Arc<dyn SpeechSynthesis>,
        settings: SettingsStore,
    ) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                session: Mutex::new(Session::default()),
                page,
                speech,
                settings,
            }),
        }
    }

    pub fn state(&self) -> ReadingState {
        self.shared.session.lock().state
    }

    /// Index of the next unread segment.
    pub fn current_index(&self) -> usize {
        self.shared.session.lock().index
    }

    pub fn segment_count(&self) -> usize {
        self.shared.session.lock().segments.len()
    }

    /// Start or resume reading.
    ///
    /// From Paused, resumes at the saved index without re-collecting; the
    /// segment that had started when the pause hit is spoken again. From
    /// Idle, captures a fresh segment sequence; an empty capture fails with
    /// `NoReadableContent` and the engine stays Idle. While Reading this is
    /// a no-op.
    pub fn start(&self) -> Result<()> {
        let token = {
            let mut session = self.shared.session.lock();
            match session.state {
                ReadingState::Reading => {
                    debug!("start ignored: already reading");
                    return Ok(());
                }
                ReadingState::Paused => {
                    info!("resuming reading at segment {}", session.index);
                    session.state = ReadingState::Reading;
                    session.run_token += 1;
                    session.run_token
                }
                ReadingState::Idle => {
                    let segments = self.shared.page.collect_segments();
                    if segments.is_empty() {
                        return Err(VoxmateError::NoReadableContent);
                    }
                    info!("starting reading: {} segments", segments.len());
                    session.segments = segments;
                    session.index = 0;
                    session.state = ReadingState::Reading;
                    session.run_token += 1;
                    session.run_token
                }
            }
        };

        let shared = Arc::clone(&self.shared);
        tokio::spawn(run_loop(shared, token));
        Ok(())
    }

    /// Pause reading, preserving the index of the last started segment.
    ///
    /// Cancellation of in-flight speech is best-effort fire-and-forget.
    /// No-op when Idle; idempotent when already Paused.
    pub fn pause(&self) {
        {
            let mut session = self.shared.session.lock();
            match session.state {
                ReadingState::Idle => return,
                ReadingState::Paused => return,
                ReadingState::Reading => {
                    info!("paused at segment {}", session.index);
                    session.state = ReadingState::Paused;
                    session.run_token += 1;
                }
            }
        }
        self.shared.speech.cancel();
    }

    /// Stop reading entirely: cancel speech, reset to Idle at index 0.
    /// No-op when Idle.
    pub fn stop(&self) {
        {
            let mut session = self.shared.session.lock();
            if session.state.is_idle() {
                return;
            }
            info!("reading stopped");
            session.state = ReadingState::Idle;
            session.segments.clear();
            session.index = 0;
            session.run_token += 1;
        }
        self.shared.speech.cancel();
    }
}

/// Sequential reading loop for one session run.
///
/// Exits silently as soon as the run token no longer matches.
async fn run_loop(shared: Arc<EngineShared>, token: u64) {
    loop {
        let segment = {
            let mut session = shared.session.lock();
            if session.run_token != token || !session.state.is_reading() {
                return;
            }
            if session.index >= session.segments.len() {
                info!("finished reading all segments");
                session.state = ReadingState::Idle;
                session.segments.clear();
                session.index = 0;
                return;
            }
            session.segments[session.index].clone()
        };

        // A segment removed from the page since capture is skipped without
        // losing progress.
        if !shared.page.segment_available(&segment) {
            debug!("segment {} no longer available, skipping", segment.node);
            let mut session = shared.session.lock();
            if session.run_token != token {
                return;
            }
            session.index += 1;
            continue;
        }

        shared.page.mark(&segment);

        let lang = shared.settings.user_language().await;
        {
            let session = shared.session.lock();
            if session.run_token != token || !session.state.is_reading() {
                return;
            }
        }

        let outcome = shared.speech.speak(&segment.text, &lang).await;

        {
            let mut session = shared.session.lock();
            if session.run_token != token {
                // Paused, stopped, or superseded while speaking; the saved
                // index still points at this segment so a resume replays it.
                return;
            }
            match outcome {
                SpeechOutcome::Completed => {}
                SpeechOutcome::Error(err) => {
                    // Treated as completion: log and move on, no retry.
                    warn!("speech error on segment {}: {}", segment.node, err);
                }
                SpeechOutcome::Cancelled => {
                    // Cancelled by something other than pause/stop (the
                    // speech channel is monophonic); keep going.
                    warn!("speech cancelled externally on segment {}", segment.node);
                }
            }
            session.index += 1;
        }
        shared.page.unmark(&segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{speech_completion, SpeechSignal};
    use crate::settings::MemoryStorage;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct MockPage {
        segments: Vec<Segment>,
        collect_calls: AtomicUsize,
        unavailable: Mutex<HashSet<u64>>,
        marks: Mutex<Vec<u64>>,
        unmarks: Mutex<Vec<u64>>,
    }

    impl MockPage {
        fn with_texts(texts: &[&str]) -> Self {
            Self {
                segments: texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Segment::new(*t, i as u64))
                    .collect(),
                collect_calls: AtomicUsize::new(0),
                unavailable: Mutex::new(HashSet::new()),
                marks: Mutex::new(Vec::new()),
                unmarks: Mutex::new(Vec::new()),
            }
        }

        fn remove(&self, node: u64) {
            self.unavailable.lock().insert(node);
        }
    }

    impl PageAccess for MockPage {
        fn collect_segments(&self) -> Vec<Segment> {
            self.collect_calls.fetch_add(1, Ordering::SeqCst);
            self.segments.clone()
        }

        fn segment_available(&self, segment: &Segment) -> bool {
            !self.unavailable.lock().contains(&segment.node)
        }

        fn mark(&self, segment: &Segment) {
            self.marks.lock().push(segment.node);
        }

        fn unmark(&self, segment: &Segment) {
            self.unmarks.lock().push(segment.node);
        }

        fn page_text(&self, max_chars: usize) -> String {
            let joined = self
                .segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            joined.chars().take(max_chars).collect()
        }

        fn apply_translation(&self, _translated: &str) {}
    }

    struct SpeakRequest {
        text: String,
        signal: Arc<SpeechSignal>,
    }

    struct MockSpeech {
        requests: mpsc::UnboundedSender<SpeakRequest>,
        active: Mutex<Option<Arc<SpeechSignal>>>,
    }

    impl MockSpeech {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SpeakRequest>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Arc::new(Self {
                    requests: tx,
                    active: Mutex::new(None),
                }),
                rx,
            )
        }
    }

    #[async_trait]
    impl SpeechSynthesis for MockSpeech {
        async fn speak(&self, text: &str, _lang: &str) -> SpeechOutcome {
            let (signal, completion) = speech_completion();
            let signal = Arc::new(signal);
            *self.active.lock() = Some(Arc::clone(&signal));
            let _ = self.requests.send(SpeakRequest {
                text: text.to_string(),
                signal,
            });
            completion.wait().await
        }

        fn cancel(&self) {
            if let Some(signal) = self.active.lock().take() {
                signal.settle(SpeechOutcome::Cancelled);
            }
        }
    }

    fn engine_with(page: Arc<MockPage>) -> (ReadingEngine, mpsc::UnboundedReceiver<SpeakRequest>) {
        let (speech, requests) = MockSpeech::new();
        let settings = SettingsStore::new(Arc::new(MemoryStorage::new()));
        let engine = ReadingEngine::new(page, speech, settings);
        (engine, requests)
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..1000 {
            if condition() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_empty_page_fails_and_stays_idle() {
        let page = Arc::new(MockPage::with_texts(&[]));
        let (engine, _requests) = engine_with(page);

        assert_eq!(engine.start().unwrap_err(), VoxmateError::NoReadableContent);
        assert!(engine.state().is_idle());
        assert_eq!(engine.current_index(), 0);
    }

    #[tokio::test]
    async fn test_reads_segments_in_order_to_completion() {
        let page = Arc::new(MockPage::with_texts(&["one", "two", "three"]));
        let (engine, mut requests) = engine_with(Arc::clone(&page));

        engine.start().unwrap();
        assert!(engine.state().is_reading());

        for expected in ["one", "two", "three"] {
            let request = requests.recv().await.unwrap();
            assert_eq!(request.text, expected);
            request.signal.settle(SpeechOutcome::Completed);
        }

        wait_for(|| engine.state().is_idle()).await;
        assert_eq!(engine.current_index(), 0);
        assert_eq!(*page.marks.lock(), vec![0, 1, 2]);
        assert_eq!(*page.unmarks.lock(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_start_while_reading_is_noop() {
        let page = Arc::new(MockPage::with_texts(&["one", "two"]));
        let (engine, mut requests) = engine_with(Arc::clone(&page));

        engine.start().unwrap();
        let first = requests.recv().await.unwrap();

        engine.start().unwrap();
        assert_eq!(page.collect_calls.load(Ordering::SeqCst), 1);

        first.signal.settle(SpeechOutcome::Completed);
        let second = requests.recv().await.unwrap();
        assert_eq!(second.text, "two");
    }

    #[tokio::test]
    async fn test_speech_error_treated_as_completion() {
        let page = Arc::new(MockPage::with_texts(&["one", "two"]));
        let (engine, mut requests) = engine_with(page);

        engine.start().unwrap();
        let first = requests.recv().await.unwrap();
        first.signal.settle(SpeechOutcome::Error("engine hiccup".into()));

        // The loop continues with the next segment, no retry of the first.
        let second = requests.recv().await.unwrap();
        assert_eq!(second.text, "two");
        second.signal.settle(SpeechOutcome::Completed);

        wait_for(|| engine.state().is_idle()).await;
    }

    #[tokio::test]
    async fn test_unavailable_segment_skipped() {
        let page = Arc::new(MockPage::with_texts(&["one", "two", "three"]));
        page.remove(1);
        let (engine, mut requests) = engine_with(Arc::clone(&page));

        engine.start().unwrap();

        let first = requests.recv().await.unwrap();
        assert_eq!(first.text, "one");
        first.signal.settle(SpeechOutcome::Completed);

        let next = requests.recv().await.unwrap();
        assert_eq!(next.text, "three");
        next.signal.settle(SpeechOutcome::Completed);

        wait_for(|| engine.state().is_idle()).await;
        // The removed segment was never marked.
        assert_eq!(*page.marks.lock(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_pause_is_idempotent() {
        let page = Arc::new(MockPage::with_texts(&["one", "two", "three"]));
        let (engine, mut requests) = engine_with(page);

        engine.start().unwrap();
        let first = requests.recv().await.unwrap();
        first.signal.settle(SpeechOutcome::Completed);
        let _second = requests.recv().await.unwrap();

        engine.pause();
        assert!(engine.state().is_paused());
        let index = engine.current_index();

        engine.pause();
        assert!(engine.state().is_paused());
        assert_eq!(engine.current_index(), index);
    }

    #[tokio::test]
    async fn test_pause_when_idle_is_noop() {
        let page = Arc::new(MockPage::with_texts(&["one"]));
        let (engine, _requests) = engine_with(page);

        engine.pause();
        assert!(engine.state().is_idle());
    }

    #[tokio::test]
    async fn test_resume_replays_started_segment() {
        let page = Arc::new(MockPage::with_texts(&["one", "two", "three", "four"]));
        let (engine, mut requests) = engine_with(Arc::clone(&page));

        engine.start().unwrap();
        for _ in 0..2 {
            let request = requests.recv().await.unwrap();
            request.signal.settle(SpeechOutcome::Completed);
        }

        // Segment 2 has started but not completed when the pause hits.
        let third = requests.recv().await.unwrap();
        assert_eq!(third.text, "three");
        engine.pause();
        assert_eq!(engine.current_index(), 2);

        // Resume re-speaks segment 2 rather than skipping it.
        engine.start().unwrap();
        let replayed = requests.recv().await.unwrap();
        assert_eq!(replayed.text, "three");
        assert_eq!(page.collect_calls.load(Ordering::SeqCst), 1);

        replayed.signal.settle(SpeechOutcome::Completed);
        let fourth = requests.recv().await.unwrap();
        assert_eq!(fourth.text, "four");
    }

    #[tokio::test]
    async fn test_stop_resets_and_restart_recollects() {
        let page = Arc::new(MockPage::with_texts(&["a", "b", "c", "d", "e"]));
        let (engine, mut requests) = engine_with(Arc::clone(&page));

        engine.start().unwrap();
        for _ in 0..2 {
            let request = requests.recv().await.unwrap();
            request.signal.settle(SpeechOutcome::Completed);
        }
        let third = requests.recv().await.unwrap();
        assert_eq!(third.text, "c");

        engine.stop();
        assert!(engine.state().is_idle());
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.segment_count(), 0);

        // A fresh start captures the sequence again and begins at 0.
        engine.start().unwrap();
        assert_eq!(page.collect_calls.load(Ordering::SeqCst), 2);
        let restarted = requests.recv().await.unwrap();
        assert_eq!(restarted.text, "a");
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let page = Arc::new(MockPage::with_texts(&["one"]));
        let (engine, _requests) = engine_with(Arc::clone(&page));

        engine.stop();
        assert!(engine.state().is_idle());
        assert_eq!(page.collect_calls.load(Ordering::SeqCst), 0);
    }
}
