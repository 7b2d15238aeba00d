//! Speech capture domain module.
//!
//! # Module Structure
//!
//! - `engine`: The native recognizer interface and its events
//! - `controller`: Continuous capture state machine on top of the engine
//! - `media`: Microphone/camera acquisition and its liveness guard

mod controller;
mod engine;
mod media;

pub use controller::{
    CaptureController, CaptureEvent, CaptureState, CaptureStatus, EndOutcome, RecordingIntent,
    ResumeTicket, ScheduledResume,
};
pub use engine::{
    EngineError, RecognitionAlternative, RecognitionEngine, RecognitionErrorCode,
    RecognitionEvent,
};
pub use media::{AcquisitionTicket, MediaAcquisition, MediaConstraints, MediaDevices, MediaStream};
