//! Recording workflow: capture → staging → diarization → session.
//!
//! Final transcript fragments are staged together with the time they were
//! heard. When the recording stops the staged text is diarized in one call
//! and merged into the session as a single snapshot.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use scribe_core::capture::{
    CaptureController, CaptureEvent, CaptureStatus, MediaAcquisition, MediaConstraints,
    MediaDevices, MediaStream, RecognitionEngine, RecognitionEvent,
};
use scribe_core::config::CaptureConfig;
use scribe_core::diarization::{Diarizer, SpeakerSegment};
use scribe_core::error::{Result, ScribeError};
use scribe_core::session::{Message, Sender};

use crate::capture_driver::CaptureDriver;
use crate::lock;
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq)]
struct StagedFragment {
    /// Seconds since the recording started.
    offset_secs: f64,
    text: String,
}

#[derive(Default)]
struct Staging {
    started_at: Option<Instant>,
    fragments: Vec<StagedFragment>,
}

/// Receives controller events and stages final fragments.
struct CaptureInbox {
    events: Mutex<UnboundedReceiver<CaptureEvent>>,
    staging: Mutex<Staging>,
    forward: Mutex<Option<UnboundedSender<CaptureEvent>>>,
}

impl CaptureInbox {
    fn drain(&self) {
        let mut events = lock(&self.events);
        while let Ok(event) = events.try_recv() {
            if let CaptureEvent::FinalTranscript(text) = &event {
                let mut staging = lock(&self.staging);
                let offset_secs = staging
                    .started_at
                    .map(|t| t.elapsed().as_secs_f64())
                    .unwrap_or(0.0);
                tracing::debug!("Staged fragment at {:.1}s", offset_secs);
                staging.fragments.push(StagedFragment {
                    offset_secs,
                    text: text.clone(),
                });
            }
            if let Some(forward) = lock(&self.forward).as_ref() {
                let _ = forward.send(event);
            }
        }
    }

    fn begin(&self) {
        let mut staging = lock(&self.staging);
        if !staging.fragments.is_empty() {
            tracing::warn!(
                "Discarding {} staged fragments that were never diarized",
                staging.fragments.len()
            );
        }
        staging.fragments.clear();
        staging.started_at = Some(Instant::now());
    }

    /// Moves the staged fragments out for diarization. Fragments staged
    /// while it runs belong to whatever recording comes next.
    fn take(&self) -> Vec<StagedFragment> {
        std::mem::take(&mut lock(&self.staging).fragments)
    }

    /// Puts back fragments whose diarization failed, ahead of anything
    /// staged in the meantime.
    fn restore(&self, mut fragments: Vec<StagedFragment>) {
        let mut staging = lock(&self.staging);
        fragments.append(&mut staging.fragments);
        staging.fragments = fragments;
    }
}

pub struct RecordingService<E: RecognitionEngine> {
    store: Arc<SessionStore>,
    capture: CaptureDriver<E>,
    diarizer: Arc<dyn Diarizer>,
    inbox: Arc<CaptureInbox>,
    media: Option<Arc<dyn MediaDevices>>,
    acquisition: Mutex<MediaAcquisition>,
    stream: Mutex<Option<Box<dyn MediaStream>>>,
}

impl<E: RecognitionEngine + 'static> RecordingService<E> {
    pub fn new(
        store: Arc<SessionStore>,
        engine: E,
        config: CaptureConfig,
        diarizer: Arc<dyn Diarizer>,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        let inbox = Arc::new(CaptureInbox {
            events: Mutex::new(rx),
            staging: Mutex::new(Staging::default()),
            forward: Mutex::new(None),
        });

        let hook_inbox = Arc::clone(&inbox);
        let capture = CaptureDriver::new(CaptureController::new(engine, config, tx))
            .with_resume_hook(Arc::new(move || hook_inbox.drain()));

        Self {
            store,
            capture,
            diarizer,
            inbox,
            media: None,
            acquisition: Mutex::new(MediaAcquisition::new()),
            stream: Mutex::new(None),
        }
    }

    pub fn with_media(mut self, devices: Arc<dyn MediaDevices>) -> Self {
        self.media = Some(devices);
        self
    }

    /// Forwards every capture event (after staging) to `events`.
    pub fn forward_events(&self, events: UnboundedSender<CaptureEvent>) {
        *lock(&self.inbox.forward) = Some(events);
    }

    pub fn status(&self) -> CaptureStatus {
        self.capture.status()
    }

    pub fn is_listening(&self) -> bool {
        self.capture.is_listening()
    }

    pub fn staged_count(&self) -> usize {
        lock(&self.inbox.staging).fragments.len()
    }

    /// Starts a new recording, optionally switching the session language.
    pub fn start(&self, language: Option<&str>) -> Result<()> {
        let mut session_language = String::new();
        self.store.update(
            |session| {
                session.ensure_transcript_source();
                if let Some(language) = language {
                    session.settings.language = language.to_string();
                }
                session_language = session.settings.language.clone();
            },
            false,
        );

        self.inbox.drain();
        self.inbox.begin();
        self.capture.set_language(&session_language);
        let started = self.capture.start();
        self.inbox.drain();
        started?;

        tracing::info!("Recording started ({})", session_language);
        Ok(())
    }

    /// Acquires microphone (and optionally camera) before starting.
    ///
    /// If a newer acquisition or a stop overtakes this one, the stream that
    /// arrives late is released and nothing is started.
    pub async fn start_with_media(&self, video: bool, language: Option<&str>) -> Result<()> {
        let devices = self
            .media
            .clone()
            .ok_or_else(|| ScribeError::media("no media devices available"))?;

        let ticket = lock(&self.acquisition).begin();
        let previous_video = self.store.current().settings.video_enabled;
        self.store
            .update(|session| session.settings.video_enabled = video, true);

        let stream = match devices.acquire(MediaConstraints::with_video(video)).await {
            Ok(stream) => stream,
            Err(e) => {
                if lock(&self.acquisition).is_current(ticket) {
                    self.store
                        .update(|session| session.settings.video_enabled = previous_video, true);
                }
                tracing::warn!("Media acquisition failed: {}", e);
                return Err(match e {
                    ScribeError::Media(_) => e,
                    other => ScribeError::media(other.to_string()),
                });
            }
        };

        let Some(stream) = lock(&self.acquisition).complete(ticket, stream) else {
            tracing::debug!("Media arrived after the recording was abandoned");
            return Ok(());
        };
        if let Some(mut previous) = lock(&self.stream).replace(stream) {
            previous.stop();
        }

        if let Err(e) = self.start(language) {
            self.release_media();
            self.store
                .update(|session| session.settings.video_enabled = previous_video, true);
            return Err(e);
        }
        Ok(())
    }

    /// Feeds a native recognizer callback through the capture controller.
    pub fn handle_recognition_event(&self, event: RecognitionEvent) -> Option<JoinHandle<()>> {
        let timer = self.capture.handle_event(event);
        self.inbox.drain();
        timer
    }

    pub fn pause(&self) {
        self.capture.pause();
        self.inbox.drain();
    }

    pub fn resume(&self) -> Result<()> {
        let resumed = self.capture.resume();
        self.inbox.drain();
        resumed
    }

    /// Changes the recognition language of the session and the recognizer.
    pub fn set_language(&self, language: &str) {
        self.store
            .update(|session| session.settings.language = language.to_string(), false);
        self.capture.set_language(language);
        self.inbox.drain();
    }

    /// Stops the recording and merges the staged fragments into the
    /// session. Returns the number of messages added.
    ///
    /// If diarization fails the staged fragments are kept for
    /// [`retry_diarization`](Self::retry_diarization) and the session is
    /// left untouched.
    pub async fn stop(&self) -> Result<usize> {
        self.capture.stop();
        self.inbox.drain();
        self.release_media();
        tracing::info!("Recording stopped");
        self.flush_staging().await
    }

    pub async fn retry_diarization(&self) -> Result<usize> {
        self.flush_staging().await
    }

    fn release_media(&self) {
        lock(&self.acquisition).cancel();
        if let Some(mut stream) = lock(&self.stream).take() {
            stream.stop();
        }
    }

    async fn flush_staging(&self) -> Result<usize> {
        let fragments = self.inbox.take();
        if fragments.is_empty() {
            return Ok(0);
        }

        let settings = self.store.current().settings.clone();
        let messages = if settings.diarization_enabled {
            let (joined, _) = join_fragments(&fragments);
            let segments = match self.diarizer.diarize(&joined, &settings.language).await {
                Ok(segments) => segments,
                Err(e) => {
                    tracing::warn!(
                        "Diarization failed, keeping {} fragments: {}",
                        fragments.len(),
                        e
                    );
                    self.inbox.restore(fragments);
                    return Err(e);
                }
            };
            if segments.is_empty() {
                tracing::warn!("Diarization returned no segments, storing fragments as spoken");
                undiarized(&fragments)
            } else {
                place_segments(&fragments, segments)
            }
        } else {
            undiarized(&fragments)
        };

        let count = messages.len();
        self.store.update(
            move |session| {
                session.ensure_transcript_source();
                session.messages.extend(messages);
                session.sync_transcript_source();
            },
            false,
        );

        tracing::info!("Added {} transcript messages", count);
        Ok(count)
    }
}

/// Joins fragments with single spaces. Also returns the byte offset at which
/// each fragment starts in the joined text.
fn join_fragments(fragments: &[StagedFragment]) -> (String, Vec<usize>) {
    let mut joined = String::new();
    let mut starts = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        if !joined.is_empty() {
            joined.push(' ');
        }
        starts.push(joined.len());
        joined.push_str(&fragment.text);
    }
    (joined, starts)
}

fn undiarized(fragments: &[StagedFragment]) -> Vec<Message> {
    fragments
        .iter()
        .map(|f| Message::transcript(Sender::User, f.text.clone(), f.offset_secs))
        .collect()
}

/// Builds transcript messages from segments, timestamping each one with the
/// staged fragment that contains the segment's start.
///
/// Segments are located in order; one that cannot be found verbatim is
/// placed right after the previous one.
fn place_segments(fragments: &[StagedFragment], segments: Vec<SpeakerSegment>) -> Vec<Message> {
    let (joined, starts) = join_fragments(fragments);
    let mut cursor = 0;

    segments
        .into_iter()
        .map(|segment| {
            let needle = segment.text.trim();
            let offset = match joined[cursor..].find(needle) {
                Some(found) if !needle.is_empty() => {
                    let at = cursor + found;
                    cursor = at + needle.len();
                    at
                }
                _ => cursor,
            };
            let index = starts
                .partition_point(|&start| start <= offset)
                .saturating_sub(1);
            Message::transcript(segment.sender, segment.text, fragments[index].offset_secs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingEngine, ScriptedDiarizer};
    use async_trait::async_trait;
    use scribe_core::capture::{RecognitionAlternative, RecognitionErrorCode};
    use scribe_core::session::Session;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn final_result(text: &str) -> RecognitionEvent {
        RecognitionEvent::Result(vec![RecognitionAlternative::finalized(text)])
    }

    fn service() -> (
        RecordingService<RecordingEngine>,
        Arc<SessionStore>,
        Arc<ScriptedDiarizer>,
        RecordingEngine,
    ) {
        let store = Arc::new(SessionStore::new(Session::new("Recording"), 0));
        let diarizer = Arc::new(ScriptedDiarizer::default());
        let engine = RecordingEngine::default();
        let service = RecordingService::new(
            store.clone(),
            engine.clone(),
            CaptureConfig::default(),
            diarizer.clone(),
        );
        (service, store, diarizer, engine)
    }

    fn fragment(offset_secs: f64, text: &str) -> StagedFragment {
        StagedFragment {
            offset_secs,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_place_segments_uses_fragment_offsets() {
        let fragments = vec![fragment(0.0, "Hello there"), fragment(4.0, "how are you")];
        let segments = vec![
            SpeakerSegment::new(Sender::User, "Hello there"),
            SpeakerSegment::new(Sender::Interlocutor, "how are you"),
        ];

        let messages = place_segments(&fragments, segments);

        assert_eq!(messages[0].timestamp, 0.0);
        assert_eq!(messages[1].timestamp, 4.0);
        assert_eq!(messages[1].sender, Sender::Interlocutor);
    }

    #[test]
    fn test_place_segments_split_inside_fragment() {
        let fragments = vec![fragment(1.0, "Hi. Hello, who is this?"), fragment(6.0, "It's me")];
        let segments = vec![
            SpeakerSegment::new(Sender::User, "Hi."),
            SpeakerSegment::new(Sender::Interlocutor, "Hello, who is this?"),
            SpeakerSegment::new(Sender::User, "It's me"),
        ];

        let timestamps: Vec<f64> = place_segments(&fragments, segments)
            .iter()
            .map(|m| m.timestamp)
            .collect();

        assert_eq!(timestamps, vec![1.0, 1.0, 6.0]);
    }

    #[test]
    fn test_place_segments_rephrased_text_follows_previous() {
        let fragments = vec![fragment(0.0, "one"), fragment(3.0, "two")];
        let segments = vec![
            SpeakerSegment::new(Sender::User, "one"),
            SpeakerSegment::new(Sender::User, "Two!"),
        ];

        let messages = place_segments(&fragments, segments);
        assert_eq!(messages[1].timestamp, 0.0);
        assert_eq!(messages[1].text, "Two!");
    }

    #[tokio::test]
    async fn test_stop_merges_diarized_fragments_in_one_snapshot() {
        let (service, store, diarizer, _engine) = service();
        diarizer.push(Ok(vec![
            SpeakerSegment::new(Sender::User, "Hello"),
            SpeakerSegment::new(Sender::Interlocutor, "how are you"),
        ]));

        service.start(None).unwrap();
        let history_after_start = store.history_len();
        service.handle_recognition_event(final_result("Hello"));
        service.handle_recognition_event(final_result("how are you"));
        assert_eq!(service.staged_count(), 2);

        let added = service.stop().await.unwrap();

        assert_eq!(added, 2);
        assert_eq!(store.history_len(), history_after_start + 1);
        assert_eq!(diarizer.inputs.lock().unwrap()[0], "Hello how are you");

        let session = store.current();
        assert_eq!(session.messages.len(), 2);
        let transcript = session.transcript_source().unwrap();
        assert!(transcript.content.contains("Hello"));
        assert!(transcript.content.contains("how are you"));
        assert_eq!(service.staged_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timestamps_follow_elapsed_time() {
        let (service, store, diarizer, _engine) = service();
        diarizer.push(Ok(vec![
            SpeakerSegment::new(Sender::User, "first"),
            SpeakerSegment::new(Sender::Interlocutor, "second"),
        ]));

        service.start(None).unwrap();
        service.handle_recognition_event(final_result("first"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        service.handle_recognition_event(final_result("second"));
        service.stop().await.unwrap();

        let session = store.current();
        assert_eq!(session.messages[0].timestamp, 0.0);
        assert!((session.messages[1].timestamp - 5.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_diarization_failure_keeps_staging() {
        let (service, store, diarizer, _engine) = service();
        diarizer.push(Err(ScribeError::remote("overloaded")));

        service.start(None).unwrap();
        service.handle_recognition_event(final_result("keep me"));
        let before = store.current();

        assert!(service.stop().await.unwrap_err().is_remote());
        assert_eq!(service.staged_count(), 1);
        assert!(Arc::ptr_eq(&before, &store.current()));

        assert_eq!(service.retry_diarization().await.unwrap(), 1);
        assert_eq!(store.current().messages[0].text, "keep me");
        assert_eq!(service.staged_count(), 0);
    }

    /// Diarizer that holds its first call until released, then echoes.
    #[derive(Default)]
    struct HeldDiarizer {
        called: tokio::sync::Notify,
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<Result<()>>>>,
    }

    #[async_trait]
    impl Diarizer for HeldDiarizer {
        async fn diarize(&self, text: &str, _language: &str) -> Result<Vec<SpeakerSegment>> {
            let gate = self.gate.lock().await.take();
            self.called.notify_one();
            if let Some(gate) = gate {
                gate.await
                    .unwrap_or_else(|_| Err(ScribeError::internal("gate dropped")))?;
            }
            Ok(vec![SpeakerSegment::new(Sender::User, text)])
        }
    }

    fn held_service(
        gate: oneshot::Receiver<Result<()>>,
    ) -> (Arc<RecordingService<RecordingEngine>>, Arc<SessionStore>, Arc<HeldDiarizer>) {
        let store = Arc::new(SessionStore::new(Session::new("Recording"), 0));
        let diarizer = Arc::new(HeldDiarizer::default());
        *diarizer.gate.try_lock().unwrap() = Some(gate);
        let service = RecordingService::new(
            store.clone(),
            RecordingEngine::default(),
            CaptureConfig::default(),
            diarizer.clone(),
        );
        (Arc::new(service), store, diarizer)
    }

    fn transcript_texts(store: &SessionStore) -> Vec<String> {
        store
            .current()
            .messages
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_recording_started_during_diarization_keeps_its_fragments() {
        let (release, gate) = oneshot::channel();
        let (service, store, diarizer) = held_service(gate);

        service.start(None).unwrap();
        service.handle_recognition_event(final_result("first take"));
        let first_stop = {
            let service = service.clone();
            tokio::spawn(async move { service.stop().await })
        };
        diarizer.called.notified().await;

        service.handle_recognition_event(RecognitionEvent::End);
        service.start(None).unwrap();
        service.handle_recognition_event(final_result("second take"));
        assert_eq!(service.staged_count(), 1);

        release.send(Ok(())).unwrap();
        assert_eq!(first_stop.await.unwrap().unwrap(), 1);
        assert_eq!(service.staged_count(), 1);

        assert_eq!(service.stop().await.unwrap(), 1);
        assert_eq!(transcript_texts(&store), vec!["first take", "second take"]);
    }

    #[tokio::test]
    async fn test_failed_diarization_restores_ahead_of_newer_fragments() {
        let (release, gate) = oneshot::channel();
        let (service, store, diarizer) = held_service(gate);

        service.start(None).unwrap();
        service.handle_recognition_event(final_result("first take"));
        let first_stop = {
            let service = service.clone();
            tokio::spawn(async move { service.stop().await })
        };
        diarizer.called.notified().await;

        service.handle_recognition_event(RecognitionEvent::End);
        service.start(None).unwrap();
        service.handle_recognition_event(final_result("second take"));

        release.send(Err(ScribeError::remote("overloaded"))).unwrap();
        assert!(first_stop.await.unwrap().is_err());
        assert_eq!(service.staged_count(), 2);

        assert_eq!(service.stop().await.unwrap(), 1);
        assert_eq!(transcript_texts(&store), vec!["first take second take"]);
    }

    #[tokio::test]
    async fn test_final_after_stop_is_not_staged() {
        let (service, store, _diarizer, _engine) = service();
        service.start(None).unwrap();
        service.handle_recognition_event(final_result("said"));

        assert_eq!(service.stop().await.unwrap(), 1);
        service.handle_recognition_event(final_result("tail"));
        service.handle_recognition_event(RecognitionEvent::End);

        assert_eq!(service.staged_count(), 0);
        service.start(None).unwrap();
        assert_eq!(service.staged_count(), 0);
        assert_eq!(store.current().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_without_fragments_adds_nothing() {
        let (service, store, _diarizer, _engine) = service();
        service.start(None).unwrap();
        let before = store.current();

        assert_eq!(service.stop().await.unwrap(), 0);
        assert!(Arc::ptr_eq(&before, &store.current()));
    }

    #[tokio::test]
    async fn test_diarization_disabled_stores_fragments_as_user() {
        let (service, store, diarizer, _engine) = service();
        store.update(|s| s.settings.diarization_enabled = false, false);

        service.start(None).unwrap();
        service.handle_recognition_event(final_result("one"));
        service.handle_recognition_event(final_result("two"));

        assert_eq!(service.stop().await.unwrap(), 2);
        assert!(diarizer.inputs.lock().unwrap().is_empty());
        assert!(
            store
                .current()
                .messages
                .iter()
                .all(|m| m.sender == Sender::User)
        );
    }

    #[tokio::test]
    async fn test_start_sets_language_and_transcript_source() {
        let (service, store, _diarizer, _engine) = service();
        service.start(Some("ja-JP")).unwrap();

        let session = store.current();
        assert_eq!(session.settings.language, "ja-JP");
        assert!(session.transcript_source().is_some());
        assert_eq!(service.status().language, "ja-JP");
        assert!(service.is_listening());
    }

    #[tokio::test]
    async fn test_duplicate_finals_are_staged_once() {
        let (service, _store, _diarizer, _engine) = service();
        service.start(None).unwrap();

        service.handle_recognition_event(final_result("hello"));
        service.handle_recognition_event(final_result("hello"));
        service.handle_recognition_event(final_result("hello world"));

        assert_eq!(service.staged_count(), 2);
    }

    #[tokio::test]
    async fn test_pause_and_resume_keep_staging() {
        let (service, _store, _diarizer, engine) = service();
        service.start(None).unwrap();
        service.handle_recognition_event(final_result("before pause"));

        service.pause();
        assert!(service.handle_recognition_event(RecognitionEvent::End).is_none());
        assert!(!service.is_listening());

        service.resume().unwrap();
        service.handle_recognition_event(final_result("before pause"));
        service.handle_recognition_event(final_result("after pause"));

        assert!(service.is_listening());
        assert_eq!(engine.starts.load(Ordering::SeqCst), 2);
        assert_eq!(service.staged_count(), 2);
    }

    #[tokio::test]
    async fn test_set_language_restarts_recognizer() {
        let (service, store, _diarizer, engine) = service();
        service.start(None).unwrap();

        service.set_language("fr-FR");
        assert_eq!(engine.stops.load(Ordering::SeqCst), 1);
        assert!(service.handle_recognition_event(RecognitionEvent::End).is_none());

        assert_eq!(engine.starts.load(Ordering::SeqCst), 2);
        assert_eq!(store.current().settings.language, "fr-FR");
        assert_eq!(service.status().language, "fr-FR");
    }

    #[tokio::test]
    async fn test_events_are_forwarded() {
        let (service, _store, _diarizer, _engine) = service();
        let (tx, mut rx) = unbounded_channel();
        service.forward_events(tx);

        service.start(None).unwrap();
        service.handle_recognition_event(RecognitionEvent::Error(
            RecognitionErrorCode::AudioCapture,
        ));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events[0], CaptureEvent::ListeningChanged(true)));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, CaptureEvent::Error(ScribeError::Recognition { .. })))
        );
        assert!(!service.is_listening());
    }

    struct FakeStream {
        stops: Arc<AtomicUsize>,
    }

    impl MediaStream for FakeStream {
        fn has_video(&self) -> bool {
            false
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeDevices {
        fail: bool,
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
        stops: Arc<AtomicUsize>,
    }

    impl FakeDevices {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                gate: tokio::sync::Mutex::new(None),
                stops: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl MediaDevices for FakeDevices {
        async fn acquire(&self, _constraints: MediaConstraints) -> Result<Box<dyn MediaStream>> {
            if let Some(gate) = self.gate.lock().await.take() {
                let _ = gate.await;
            }
            if self.fail {
                return Err(ScribeError::media("permission denied"));
            }
            Ok(Box::new(FakeStream {
                stops: self.stops.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn test_media_failure_rolls_back_video() {
        let (service, store, _diarizer, engine) = service();
        let service = service.with_media(Arc::new(FakeDevices::new(true)));

        let err = service.start_with_media(true, None).await.unwrap_err();

        assert!(matches!(err, ScribeError::Media(_)));
        assert!(!store.current().settings.video_enabled);
        assert!(!service.is_listening());
        assert_eq!(engine.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_media_success_starts_and_stop_releases() {
        let (service, store, _diarizer, _engine) = service();
        let devices = Arc::new(FakeDevices::new(false));
        let stops = devices.stops.clone();
        let service = service.with_media(devices);

        service.start_with_media(true, None).await.unwrap();
        assert!(service.is_listening());
        assert!(store.current().settings.video_enabled);

        service.stop().await.unwrap();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_late_media_is_discarded_after_stop() {
        let (service, _store, _diarizer, engine) = service();
        let devices = Arc::new(FakeDevices::new(false));
        let (release, gate) = oneshot::channel();
        *devices.gate.lock().await = Some(gate);
        let stops = devices.stops.clone();
        let service = Arc::new(service.with_media(devices));

        let pending = {
            let service = service.clone();
            tokio::spawn(async move { service.start_with_media(false, None).await })
        };
        tokio::task::yield_now().await;

        service.stop().await.unwrap();
        release.send(()).unwrap();
        pending.await.unwrap().unwrap();

        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(engine.starts.load(Ordering::SeqCst), 0);
        assert!(!service.is_listening());
    }
}
