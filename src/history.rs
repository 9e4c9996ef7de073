//! Local, read-only views over fetched history and saved recipes.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::api::{MealApi, SavedRecipeUpdate};
use crate::domain::{LoggedMeal, SavedRecipeEntry};
use crate::error::{CompanionError, Operation};
use crate::workflow::InFlight;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    All,
    Today,
    Week,
}

impl DateFilter {
    /// `now` should carry the user's local offset; "today" compares calendar dates in it.
    pub fn matches(&self, at: OffsetDateTime, now: OffsetDateTime) -> bool {
        match self {
            DateFilter::All => true,
            DateFilter::Today => at.to_offset(now.offset()).date() == now.date(),
            DateFilter::Week => at >= now - Duration::days(7),
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            DateFilter::All => "Total",
            DateFilter::Today => "Today's",
            DateFilter::Week => "This Week's",
        }
    }
}

pub fn filter_meals(meals: &[LoggedMeal], filter: DateFilter, now: OffsetDateTime) -> Vec<&LoggedMeal> {
    meals
        .iter()
        .filter(|m| filter.matches(m.identified_at, now))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalorieSummary {
    pub total: f64,
    pub count: usize,
    /// Rounded; 0 when there are no meals.
    pub average: f64,
}

pub fn summarize<'a, I>(meals: I) -> CalorieSummary
where
    I: IntoIterator<Item = &'a LoggedMeal>,
{
    let (total, count) = meals
        .into_iter()
        .fold((0.0, 0usize), |(t, c), m| (t + m.calories(), c + 1));
    let average = if count == 0 {
        0.0
    } else {
        (total / count as f64).round()
    };
    CalorieSummary {
        total,
        count,
        average,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SavedFilter {
    #[default]
    All,
    FavoritesOnly,
}

pub fn filter_saved(entries: &[SavedRecipeEntry], filter: SavedFilter) -> Vec<&SavedRecipeEntry> {
    entries
        .iter()
        .filter(|e| filter == SavedFilter::All || e.saved_recipe.is_favorite)
        .collect()
}

pub fn favorites_count(entries: &[SavedRecipeEntry]) -> usize {
    entries.iter().filter(|e| e.saved_recipe.is_favorite).count()
}

/// Meal history screen state.
pub struct HistoryView {
    meals: Vec<LoggedMeal>,
    pub filter: DateFilter,
}

impl HistoryView {
    pub fn new(meals: Vec<LoggedMeal>) -> Self {
        Self {
            meals,
            filter: DateFilter::All,
        }
    }

    #[instrument(skip(api))]
    pub async fn load(api: &dyn MealApi, limit: u32) -> Result<Self, CompanionError> {
        let meals = api.get_history(limit).await.map_err(|e| {
            error!(error = %e, "failed to load meal history");
            CompanionError::remote(Operation::Load, e)
        })?;
        Ok(Self::new(meals))
    }

    pub fn all(&self) -> &[LoggedMeal] {
        &self.meals
    }

    pub fn visible(&self, now: OffsetDateTime) -> Vec<&LoggedMeal> {
        filter_meals(&self.meals, self.filter, now)
    }

    pub fn summary(&self, now: OffsetDateTime) -> CalorieSummary {
        summarize(self.visible(now))
    }
}

/// Saved recipes screen state.
pub struct SavedView {
    api: Arc<dyn MealApi>,
    entries: Vec<SavedRecipeEntry>,
    pub filter: SavedFilter,
    updates: InFlight<Uuid>,
}

impl SavedView {
    #[instrument(skip(api))]
    pub async fn load(api: Arc<dyn MealApi>) -> Result<Self, CompanionError> {
        let entries = api.get_saved().await.map_err(|e| {
            error!(error = %e, "failed to load saved recipes");
            CompanionError::remote(Operation::Load, e)
        })?;
        Ok(Self {
            api,
            entries,
            filter: SavedFilter::All,
            updates: InFlight::new(),
        })
    }

    pub fn visible(&self) -> Vec<&SavedRecipeEntry> {
        filter_saved(&self.entries, self.filter)
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn favorites(&self) -> usize {
        favorites_count(&self.entries)
    }

    /// Flips `isFavorite` remotely, then locally on success.
    #[instrument(skip(self))]
    pub async fn toggle_favorite(&mut self, saved_id: Uuid) -> Result<bool, CompanionError> {
        let _token = self
            .updates
            .try_acquire(saved_id)
            .ok_or(CompanionError::InFlight(Operation::Update))?;
        let current = self
            .entries
            .iter()
            .find(|e| e.saved_recipe.id == saved_id)
            .map(|e| e.saved_recipe.is_favorite)
            .ok_or_else(|| CompanionError::malformed(format!("unknown saved recipe {saved_id}")))?;

        let update = SavedRecipeUpdate {
            is_favorite: Some(!current),
            notes: None,
        };
        let saved = self.api.update_saved(saved_id, update).await.map_err(|e| {
            error!(error = %e, %saved_id, "failed to toggle favorite");
            CompanionError::remote(Operation::Update, e)
        })?;
        if let Some(entry) = self.entries.iter_mut().find(|e| e.saved_recipe.id == saved_id) {
            entry.saved_recipe = saved;
        }
        Ok(!current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MealSource, Nutrition, SavedRecipe};
    use crate::testing::FakeApi;
    use time::macros::datetime;

    fn meal(at: OffsetDateTime, calories: Option<f64>) -> LoggedMeal {
        LoggedMeal {
            id: Uuid::new_v4(),
            dish_name: "x".into(),
            ingredients: vec![],
            nutrition: calories.map(|c| Nutrition {
                calories: c,
                ..Default::default()
            }),
            cuisine_type: None,
            source: MealSource::Camera,
            confidence: None,
            identified_at: at,
        }
    }

    fn meals() -> Vec<LoggedMeal> {
        vec![
            meal(datetime!(2026-10-18 08:00 +2), Some(400.0)),
            meal(datetime!(2026-10-15 12:00 +2), None),
            meal(datetime!(2026-10-17 23:30 UTC), Some(250.0)),
            meal(datetime!(2026-09-01 12:00 +2), Some(900.0)),
        ]
    }

    const NOW: OffsetDateTime = datetime!(2026-10-18 20:00 +2);

    #[test]
    fn all_is_identity() {
        let source = meals();
        let all = filter_meals(&source, DateFilter::All, NOW);
        assert_eq!(all.len(), source.len());
        assert!(all.iter().zip(source.iter()).all(|(a, b)| a.id == b.id));
    }

    #[test]
    fn today_compares_local_calendar_date() {
        let source = meals();
        let today = filter_meals(&source, DateFilter::Today, NOW);
        // 23:30 UTC on the 17th is 01:30 on the 18th at +2.
        let ids: Vec<_> = today.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![source[0].id, source[2].id]);
    }

    #[test]
    fn week_is_subset_preserving_order() {
        let source = meals();
        let week = filter_meals(&source, DateFilter::Week, NOW);
        let ids: Vec<_> = week.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![source[0].id, source[1].id, source[2].id]);
        assert_eq!(source.len(), 4);
    }

    #[test]
    fn summary_treats_missing_nutrition_as_zero() {
        let source = meals();
        let s = summarize(filter_meals(&source, DateFilter::Week, NOW));
        assert_eq!(s.total, 650.0);
        assert_eq!(s.count, 3);
        assert_eq!(s.average, 217.0);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let s = summarize(std::iter::empty::<&LoggedMeal>());
        assert_eq!(s, CalorieSummary::default());
        assert_eq!(s.average, 0.0);
    }

    fn entry(favorite: bool) -> SavedRecipeEntry {
        SavedRecipeEntry {
            recipe: None,
            saved_recipe: SavedRecipe {
                id: Uuid::new_v4(),
                recipe_id: Uuid::new_v4(),
                is_favorite: favorite,
                notes: None,
            },
        }
    }

    #[test]
    fn favorites_filter() {
        let entries = vec![entry(true), entry(false), entry(true)];
        let favs = filter_saved(&entries, SavedFilter::FavoritesOnly);
        assert_eq!(favs.len(), 2);
        assert!(favs.iter().all(|e| e.saved_recipe.is_favorite));
        assert_eq!(filter_saved(&entries, SavedFilter::All).len(), 3);
        assert_eq!(favorites_count(&entries), 2);
    }

    #[tokio::test]
    async fn toggle_favorite_updates_local_entry() {
        let api = Arc::new(FakeApi::default());
        let seeded = entry(false);
        let id = seeded.saved_recipe.id;
        api.saved.lock().unwrap().push(seeded);

        let mut view = SavedView::load(api.clone()).await.unwrap();
        view.filter = SavedFilter::FavoritesOnly;
        assert!(view.visible().is_empty());

        assert!(view.toggle_favorite(id).await.unwrap());
        assert_eq!(view.visible().len(), 1);
        assert_eq!(view.favorites(), 1);
        assert!(view.toggle_favorite(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn history_view_loads_and_filters() {
        let api = FakeApi::default();
        api.history.lock().unwrap().extend(meals());
        let mut view = HistoryView::load(&api, 100).await.unwrap();
        assert_eq!(view.all().len(), 4);
        view.filter = DateFilter::Today;
        assert_eq!(view.summary(NOW).total, 650.0);
        assert_eq!(view.filter.headline(), "Today's");
    }
}
