//! Native speech recognition surface.
//!
//! The controller only needs a handful of capabilities from the platform
//! recognizer. Callbacks from the platform are delivered to the controller
//! as [`RecognitionEvent`] values by whoever owns the native session.

use std::fmt;
use thiserror::Error;

/// Error raised synchronously by the native `start()` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A continuous speech recognition session provided by the host platform.
pub trait RecognitionEngine: Send {
    /// Whether the platform provides speech recognition at all.
    fn is_supported(&self) -> bool {
        true
    }

    fn set_continuous(&mut self, continuous: bool);

    fn set_interim_results(&mut self, interim_results: bool);

    fn set_language(&mut self, language: &str);

    /// Starts a native session. May fail synchronously (e.g. already started).
    fn start(&mut self) -> Result<(), EngineError>;

    /// Asks the native session to stop. Completion is reported later as
    /// [`RecognitionEvent::End`].
    fn stop(&mut self);
}

/// One recognition alternative reported by a result event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionAlternative {
    pub transcript: String,
    /// Finalized results will not be revised by the engine any more.
    pub is_final: bool,
}

impl RecognitionAlternative {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn finalized(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// Error codes reported by the native session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorCode {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    BadGrammar,
    LanguageNotSupported,
    Other(String),
}

impl RecognitionErrorCode {
    /// Parses the platform's error string (`"not-allowed"`, `"no-speech"`, ...).
    pub fn parse(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "bad-grammar" => Self::BadGrammar,
            "language-not-supported" => Self::LanguageNotSupported,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::BadGrammar => "bad-grammar",
            Self::LanguageNotSupported => "language-not-supported",
            Self::Other(code) => code,
        }
    }

    /// Errors after which the logical recording is terminated without retry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotAllowed
                | Self::ServiceNotAllowed
                | Self::AudioCapture
                | Self::Network
                | Self::Aborted
        )
    }
}

impl fmt::Display for RecognitionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A callback from the native session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Partial results: all alternatives of one result event.
    Result(Vec<RecognitionAlternative>),
    Error(RecognitionErrorCode),
    /// The native session terminated (requested or not).
    End,
}
