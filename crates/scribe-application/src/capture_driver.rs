//! Runs a [`CaptureController`] on the tokio runtime.
//!
//! The controller itself is synchronous and only *asks* for delayed resumes;
//! the driver owns it behind a mutex and performs those resumes on spawned
//! timer tasks.

use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use scribe_core::capture::{
    CaptureController, CaptureStatus, EndOutcome, RecognitionEngine, RecognitionEvent,
    ScheduledResume,
};
use scribe_core::error::Result;

use crate::lock;

/// Callback invoked after a scheduled resume ran.
pub type ResumeHook = Arc<dyn Fn() + Send + Sync>;

pub struct CaptureDriver<E: RecognitionEngine> {
    controller: Arc<Mutex<CaptureController<E>>>,
    after_resume: Option<ResumeHook>,
}

impl<E: RecognitionEngine> Clone for CaptureDriver<E> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            after_resume: self.after_resume.clone(),
        }
    }
}

impl<E: RecognitionEngine + 'static> CaptureDriver<E> {
    pub fn new(controller: CaptureController<E>) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            after_resume: None,
        }
    }

    pub fn with_resume_hook(mut self, hook: ResumeHook) -> Self {
        self.after_resume = Some(hook);
        self
    }

    /// Feeds a native recognizer callback to the controller.
    ///
    /// A spontaneous end schedules the resume; its timer task is returned.
    pub fn handle_event(&self, event: RecognitionEvent) -> Option<JoinHandle<()>> {
        let resume = lock(&self.controller).handle_event(event)?;
        Some(self.schedule(resume))
    }

    fn schedule(&self, resume: ScheduledResume) -> JoinHandle<()> {
        let controller = Arc::clone(&self.controller);
        let hook = self.after_resume.clone();
        tokio::spawn(async move {
            tokio::time::sleep(resume.delay).await;
            let outcome = lock(&controller).resume_due(resume.ticket);
            match outcome {
                EndOutcome::Restarted => tracing::debug!("Recognition resumed"),
                EndOutcome::GaveUp => tracing::error!("Recognition could not be resumed"),
                _ => tracing::debug!("Scheduled resume skipped ({:?})", outcome),
            }
            if let Some(hook) = hook {
                hook();
            }
        })
    }

    pub fn start(&self) -> Result<()> {
        lock(&self.controller).start_listening()
    }

    pub fn stop(&self) {
        lock(&self.controller).stop_listening();
    }

    pub fn pause(&self) {
        lock(&self.controller).pause_listening();
    }

    pub fn resume(&self) -> Result<()> {
        lock(&self.controller).resume_listening()
    }

    pub fn restart(&self) -> bool {
        lock(&self.controller).restart_listening()
    }

    pub fn set_language(&self, language: &str) {
        lock(&self.controller).set_language(language);
    }

    pub fn is_listening(&self) -> bool {
        lock(&self.controller).is_listening()
    }

    pub fn status(&self) -> CaptureStatus {
        lock(&self.controller).status()
    }
}
