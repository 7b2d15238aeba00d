//! Microphone/camera acquisition.
//!
//! Acquiring a device is asynchronous and may take a while (permission
//! prompts). [`MediaAcquisition`] makes sure a stream that arrives after the
//! caller gave up is stopped instead of being handed to anyone.

use async_trait::async_trait;

use crate::error::Result;

/// Which tracks to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: false,
        }
    }

    pub fn with_video(video: bool) -> Self {
        Self { audio: true, video }
    }
}

/// A live capture stream.
pub trait MediaStream: Send {
    fn has_video(&self) -> bool;

    /// Stops every track. Must be idempotent.
    fn stop(&mut self);
}

/// Platform device access.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<Box<dyn MediaStream>>;
}

/// Token for one acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionTicket(u64);

/// Liveness guard for in-flight acquisitions.
///
/// Only the most recent [`begin`](Self::begin) is current, and only while it
/// has not been cancelled.
#[derive(Debug, Default)]
pub struct MediaAcquisition {
    generation: u64,
    active: Option<u64>,
}

impl MediaAcquisition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new attempt, superseding any earlier one.
    pub fn begin(&mut self) -> AcquisitionTicket {
        self.generation += 1;
        self.active = Some(self.generation);
        AcquisitionTicket(self.generation)
    }

    /// Abandons the in-flight attempt (e.g. the recording was stopped).
    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_current(&self, ticket: AcquisitionTicket) -> bool {
        self.active == Some(ticket.0)
    }

    /// Hands back the stream if `ticket` is still current; otherwise stops it.
    pub fn complete(
        &mut self,
        ticket: AcquisitionTicket,
        mut stream: Box<dyn MediaStream>,
    ) -> Option<Box<dyn MediaStream>> {
        if self.is_current(ticket) {
            self.active = None;
            return Some(stream);
        }
        tracing::debug!("Discarding media stream from an abandoned acquisition");
        stream.stop();
        None
    }
}
