//! Session status transitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Recording,
    Stopped,
    Playing,
    Paused,
}

impl SessionStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }

    /// Whether a playback buffer is loaded in this state
    pub const fn has_playback(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Compute the next status for `event`.
    ///
    /// State machine:
    ///   IDLE -> RECORDING (start_recording)
    ///   RECORDING -> STOPPED (stop_recording)
    ///   STOPPED | PAUSED -> PLAYING (play_recording)
    ///   PLAYING -> PLAYING (play_recording, no-op)
    ///   PLAYING -> PAUSED (pause_playback)
    ///   PLAYING | PAUSED -> STOPPED (stop_playback, playback_finished)
    ///   RECORDING | STOPPED | PLAYING | PAUSED -> IDLE (cancel_recording)
    ///   STOPPED -> IDLE (save_recording)
    ///   PLAYING | PAUSED -> same (seek)
    pub fn transition(self, event: SessionEvent) -> Result<SessionStatus, InvalidStateTransition> {
        use SessionEvent as E;
        use SessionStatus as S;

        let next = match (self, event) {
            (S::Idle, E::StartRecording) => S::Recording,
            (S::Recording, E::StopRecording) => S::Stopped,
            (S::Stopped | S::Paused | S::Playing, E::PlayRecording) => S::Playing,
            (S::Playing, E::PausePlayback) => S::Paused,
            (S::Playing | S::Paused, E::StopPlayback) => S::Stopped,
            (S::Playing, E::PlaybackFinished) => S::Stopped,
            (S::Recording | S::Stopped | S::Playing | S::Paused, E::CancelRecording) => S::Idle,
            (S::Stopped, E::SaveRecording) => S::Idle,
            (S::Playing | S::Paused, E::Seek) => self,
            _ => {
                return Err(InvalidStateTransition {
                    current_state: self,
                    action: event.as_str().to_string(),
                })
            }
        };
        Ok(next)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Commands and device notifications that drive the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    StartRecording,
    StopRecording,
    PlayRecording,
    PausePlayback,
    StopPlayback,
    PlaybackFinished,
    CancelRecording,
    SaveRecording,
    Seek,
}

impl SessionEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StartRecording => "start recording",
            Self::StopRecording => "stop recording",
            Self::PlayRecording => "play recording",
            Self::PausePlayback => "pause playback",
            Self::StopPlayback => "stop playback",
            Self::PlaybackFinished => "finish playback",
            Self::CancelRecording => "cancel recording",
            Self::SaveRecording => "save recording",
            Self::Seek => "seek",
        }
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionStatus,
    pub action: String,
}
