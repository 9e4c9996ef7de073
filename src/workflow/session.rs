use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::detail::RecipeDetail;
use super::guard::InFlight;
use super::state::CaptureState;
use crate::api::{GenerateRecipeRequest, LogMealRequest, MealApi, RecipePreferences};
use crate::capture::{CaptureKind, CaptureOutcome, CaptureSource, Permission};
use crate::domain::{IdentifiedMeal, DEFAULT_SERVINGS};
use crate::error::{CompanionError, Operation};
use crate::normalize;

/// Transient state of one capture screen: identify, then optionally generate
/// a recipe and log the meal.
///
/// Shared by `Arc`; the state lock is never held across a remote call.
pub struct MealSession {
    api: Arc<dyn MealApi>,
    state: Mutex<CaptureState>,
    /// Bumped on every reset; results tagged with an older epoch are dropped.
    epoch: AtomicU64,
    saves: InFlight<u64>,
    generations: InFlight<u64>,
}

impl MealSession {
    pub fn new(api: Arc<dyn MealApi>) -> Self {
        Self {
            api,
            state: Mutex::new(CaptureState::Idle),
            epoch: AtomicU64::new(0),
            saves: InFlight::new(),
            generations: InFlight::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> CaptureState {
        self.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    pub fn identified(&self) -> Option<IdentifiedMeal> {
        self.lock().meal().cloned()
    }

    pub fn saved_id(&self) -> Option<Uuid> {
        match &*self.lock() {
            CaptureState::Saved { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// "Capture another": discards the current meal. Late responses become no-ops.
    pub fn reset(&self) {
        let mut state = self.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        state.reset();
    }

    /// Captures or picks a photo and identifies it.
    ///
    /// `Ok(None)` when the user cancels or the session was reset meanwhile.
    #[instrument(skip(self, source))]
    pub async fn capture_and_identify(
        &self,
        source: &dyn CaptureSource,
        kind: CaptureKind,
    ) -> Result<Option<IdentifiedMeal>, CompanionError> {
        let epoch = {
            let mut state = self.lock();
            state.begin_capture()?;
            self.current_epoch()
        };

        let result = self.run_identify(source, kind).await;

        let mut state = self.lock();
        if self.current_epoch() != epoch {
            debug!("session reset during identification; dropping result");
            return Ok(None);
        }
        match result {
            Ok(Some(meal)) => {
                info!(dish = %meal.dish_name, confidence = %meal.confidence, "meal identified");
                state.finish_capture(Some(meal.clone()))?;
                Ok(Some(meal))
            }
            Ok(None) => {
                state.finish_capture(None)?;
                Ok(None)
            }
            Err(e) => {
                state.finish_capture(None)?;
                Err(e)
            }
        }
    }

    async fn run_identify(
        &self,
        source: &dyn CaptureSource,
        kind: CaptureKind,
    ) -> Result<Option<IdentifiedMeal>, CompanionError> {
        if source.request_permission(kind).await == Permission::Denied {
            warn!(%kind, "capture permission denied");
            return Err(CompanionError::PermissionDenied(kind));
        }
        let image = match source.acquire(kind).await {
            Ok(CaptureOutcome::Captured(image)) => image,
            Ok(CaptureOutcome::Cancelled) => return Ok(None),
            Err(e) => {
                error!(error = %e, "capture failed");
                return Err(CompanionError::remote(Operation::Identify, e));
            }
        };
        match self.api.identify_meal(image).await {
            Ok(meal) => Ok(Some(meal)),
            Err(e) => {
                error!(error = %e, "meal identification failed");
                Err(CompanionError::remote(Operation::Identify, e))
            }
        }
    }

    /// Logs the identified meal exactly once.
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<Uuid, CompanionError> {
        let (epoch, _token, meal) = {
            let mut state = self.lock();
            let epoch = self.current_epoch();
            let token = self
                .saves
                .try_acquire(epoch)
                .ok_or(CompanionError::InFlight(Operation::Save))?;
            let meal = state.begin_save()?;
            (epoch, token, meal)
        };
        let request = LogMealRequest::from_identified(&meal);
        let result = self.api.log_meal(request).await;

        let mut state = self.lock();
        if self.current_epoch() != epoch {
            debug!("session reset during save; dropping result");
            return result
                .map(|c| c.id)
                .map_err(|e| CompanionError::remote(Operation::Save, e));
        }
        match result {
            Ok(created) => {
                info!(id = %created.id, dish = %meal.dish_name, "meal saved to history");
                state.finish_save(Some(created.id))?;
                Ok(created.id)
            }
            Err(e) => {
                error!(error = %e, "failed to save meal");
                state.finish_save(None)?;
                Err(CompanionError::remote(Operation::Save, e))
            }
        }
    }

    /// Requests a full recipe for the identified meal.
    ///
    /// The returned detail owns the recipe; it never fetches it again.
    #[instrument(skip(self))]
    pub async fn generate_recipe(
        &self,
        servings: Option<u32>,
    ) -> Result<RecipeDetail, CompanionError> {
        let epoch = self.current_epoch();
        let meal = {
            let state = self.lock();
            match &*state {
                CaptureState::Identified { meal } | CaptureState::Saved { meal, .. } => meal.clone(),
                other => {
                    return Err(CompanionError::InvalidTransition {
                        action: "generate a recipe",
                        state: other.name(),
                    })
                }
            }
        };
        let _token = self
            .generations
            .try_acquire(epoch)
            .ok_or(CompanionError::InFlight(Operation::Generate))?;

        let request = GenerateRecipeRequest {
            ingredients: meal.ingredient_names(),
            preferences: RecipePreferences {
                cuisine_type: meal.cuisine_type.clone(),
                servings: Some(servings.unwrap_or(DEFAULT_SERVINGS)),
            },
        };
        let raw = self.api.generate_recipe(request).await.map_err(|e| {
            error!(error = %e, "failed to generate recipe");
            CompanionError::remote(Operation::Generate, e)
        })?;
        let recipe = normalize::recipe_from_value(&raw.0).map_err(|e| {
            error!(error = %e, "generated recipe unusable");
            CompanionError::remote(Operation::Generate, anyhow::Error::new(e))
        })?;
        info!(name = %recipe.name, steps = recipe.instructions.len(), "recipe generated");
        Ok(RecipeDetail::new(Arc::clone(&self.api), recipe))
    }
}
