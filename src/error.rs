use std::fmt;

use thiserror::Error;

use crate::capture::CaptureKind;

/// Remote procedures the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Identify,
    Generate,
    Save,
    Chat,
    Load,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Identify => "identification",
            Operation::Generate => "generation",
            Operation::Save => "save",
            Operation::Chat => "chat",
            Operation::Load => "load",
            Operation::Update => "update",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum CompanionError {
    #[error("{0} permission denied")]
    PermissionDenied(CaptureKind),

    /// Network or remote-processing failure; never split further for the user.
    #[error("{operation} failed: {source:#}")]
    Remote {
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("{0} already in flight")]
    InFlight(Operation),
}

impl CompanionError {
    pub fn remote(operation: Operation, source: anyhow::Error) -> Self {
        CompanionError::Remote { operation, source }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        CompanionError::MalformedPayload(msg.into())
    }

    /// The single message shown to the user for this failure.
    pub fn alert(&self) -> UserAlert {
        match self {
            CompanionError::PermissionDenied(CaptureKind::Camera) => UserAlert::new(
                "Camera Permission Required",
                "Please enable camera access in Settings to identify meals.",
            ),
            CompanionError::PermissionDenied(CaptureKind::Library) => UserAlert::new(
                "Photo Library Permission Required",
                "Please enable photo library access in Settings.",
            ),
            CompanionError::Remote { operation, .. } => match operation {
                Operation::Identify => UserAlert::new(
                    "Identification Failed",
                    "Could not identify the meal. Please try again with a clearer photo.",
                ),
                Operation::Generate => UserAlert::new(
                    "Generation Failed",
                    "Could not generate recipe. Please try again.",
                ),
                Operation::Save => {
                    UserAlert::new("Save Failed", "Could not save. Please try again.")
                }
                Operation::Chat => UserAlert::new(
                    "Chat Unavailable",
                    "Sorry, I encountered an issue getting a response. Please try again in a moment.",
                ),
                Operation::Load | Operation::Update => {
                    UserAlert::new("Error", "Something went wrong. Please try again.")
                }
            },
            CompanionError::MalformedPayload(_) => {
                UserAlert::new("Error", "Could not load recipe data")
            }
            CompanionError::InvalidTransition { .. } | CompanionError::InFlight(_) => {
                UserAlert::new("Please wait", "That action is not available right now.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAlert {
    pub title: &'static str,
    pub message: &'static str,
}

impl UserAlert {
    fn new(title: &'static str, message: &'static str) -> Self {
        Self { title, message }
    }
}
