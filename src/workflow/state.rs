use uuid::Uuid;

use crate::domain::IdentifiedMeal;
use crate::error::CompanionError;

/// Lifecycle of the capture screen's meal.
///
/// ```text
/// Idle ─begin_capture→ Capturing ─identified→ Identified ─begin_save→ Saving ─ok→ Saved
///   ↑                      │ failed/cancelled                  ↑          │ failed
///   └──────────────────────┘                                   └──────────┘
/// ```
/// `reset` returns to `Idle` from anywhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
    Identified {
        meal: IdentifiedMeal,
    },
    Saving {
        meal: IdentifiedMeal,
    },
    Saved {
        meal: IdentifiedMeal,
        id: Uuid,
    },
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Capturing => "capturing",
            CaptureState::Identified { .. } => "identified",
            CaptureState::Saving { .. } => "saving",
            CaptureState::Saved { .. } => "saved",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, CaptureState::Capturing | CaptureState::Saving { .. })
    }

    pub fn meal(&self) -> Option<&IdentifiedMeal> {
        match self {
            CaptureState::Identified { meal }
            | CaptureState::Saving { meal }
            | CaptureState::Saved { meal, .. } => Some(meal),
            CaptureState::Idle | CaptureState::Capturing => None,
        }
    }

    fn invalid(&self, action: &'static str) -> CompanionError {
        CompanionError::InvalidTransition {
            action,
            state: self.name(),
        }
    }

    pub fn begin_capture(&mut self) -> Result<(), CompanionError> {
        match self {
            CaptureState::Idle => {
                *self = CaptureState::Capturing;
                Ok(())
            }
            _ => Err(self.invalid("identify")),
        }
    }

    /// `None` means the capture was abandoned or failed.
    pub fn finish_capture(&mut self, meal: Option<IdentifiedMeal>) -> Result<(), CompanionError> {
        if !matches!(self, CaptureState::Capturing) {
            return Err(self.invalid("finish identification"));
        }
        *self = match meal {
            Some(meal) => CaptureState::Identified { meal },
            None => CaptureState::Idle,
        };
        Ok(())
    }

    /// Returns the meal to submit.
    pub fn begin_save(&mut self) -> Result<IdentifiedMeal, CompanionError> {
        match std::mem::take(self) {
            CaptureState::Identified { meal } => {
                *self = CaptureState::Saving { meal: meal.clone() };
                Ok(meal)
            }
            other => {
                *self = other;
                Err(self.invalid("save"))
            }
        }
    }

    /// `None` means the submission failed and saving may be retried.
    pub fn finish_save(&mut self, id: Option<Uuid>) -> Result<(), CompanionError> {
        match std::mem::take(self) {
            CaptureState::Saving { meal } => {
                *self = match id {
                    Some(id) => CaptureState::Saved { meal, id },
                    None => CaptureState::Identified { meal },
                };
                Ok(())
            }
            other => {
                *self = other;
                Err(self.invalid("finish save"))
            }
        }
    }

    pub fn reset(&mut self) {
        *self = CaptureState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Confidence, Macros};

    fn meal() -> IdentifiedMeal {
        IdentifiedMeal {
            dish_name: "Ramen".into(),
            ingredients: vec![],
            calories: 550.0,
            macros: Macros::default(),
            cuisine_type: None,
            difficulty: None,
            confidence: Confidence::new(0.9),
        }
    }

    #[test]
    fn happy_path() {
        let mut s = CaptureState::default();
        s.begin_capture().unwrap();
        assert!(s.is_busy());
        s.finish_capture(Some(meal())).unwrap();
        assert_eq!(s.name(), "identified");
        let m = s.begin_save().unwrap();
        assert_eq!(m.dish_name, "Ramen");
        assert!(s.is_busy());
        let id = Uuid::new_v4();
        s.finish_save(Some(id)).unwrap();
        assert_eq!(s, CaptureState::Saved { meal: meal(), id });
        assert!(!s.is_busy());
    }

    #[test]
    fn save_only_from_identified() {
        let mut s = CaptureState::Idle;
        let err = s.begin_save().unwrap_err();
        assert!(matches!(
            err,
            CompanionError::InvalidTransition { action: "save", state: "idle" }
        ));
        assert_eq!(s, CaptureState::Idle);

        let mut saved = CaptureState::Saved {
            meal: meal(),
            id: Uuid::new_v4(),
        };
        assert!(saved.begin_save().is_err());
        assert_eq!(saved.name(), "saved");
    }

    #[test]
    fn identify_only_from_idle() {
        let mut s = CaptureState::Identified { meal: meal() };
        assert!(s.begin_capture().is_err());
        assert_eq!(s.name(), "identified");
    }

    #[test]
    fn failed_save_returns_to_identified() {
        let mut s = CaptureState::Identified { meal: meal() };
        s.begin_save().unwrap();
        s.finish_save(None).unwrap();
        assert_eq!(s, CaptureState::Identified { meal: meal() });
    }

    #[test]
    fn failed_capture_clears_busy() {
        let mut s = CaptureState::Idle;
        s.begin_capture().unwrap();
        s.finish_capture(None).unwrap();
        assert_eq!(s, CaptureState::Idle);
        assert!(!s.is_busy());
    }
}
