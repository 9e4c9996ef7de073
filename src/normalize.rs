//! Coalescing of loosely-shaped analyzer and navigation payloads.
//!
//! Every field that upstream may spell more than one way is resolved here,
//! once, with a fixed precedence:
//!
//! 1. the explicit named field,
//! 2. the alternate named field,
//! 3. a positional or bare-string fallback,
//! 4. a numeric or empty default.
//!
//! Render and persistence code only ever sees the normalized domain types.

use serde_json::Value;

use crate::domain::{
    Confidence, Difficulty, GeneratedRecipe, IdentifiedMeal, Ingredient, InstructionStep, Macros,
    Nutrition, DEFAULT_RECIPE_SOURCE, DEFAULT_SERVINGS,
};
use crate::error::CompanionError;

pub const DEFAULT_QUANTITY: &str = "As needed";

/// First key present with a non-null value.
fn first<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_at(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(as_number)
}

fn text_at(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(as_text)
}

fn non_negative(n: f64) -> f64 {
    if n.is_sign_negative() {
        0.0
    } else {
        n
    }
}

fn minutes(n: f64) -> u32 {
    non_negative(n).round() as u32
}

/// `name` or a bare string; entries with neither are dropped.
pub fn ingredient_from_value(v: &Value) -> Option<Ingredient> {
    if let Value::String(s) = v {
        let name = s.trim();
        return (!name.is_empty()).then(|| Ingredient::new(name, DEFAULT_QUANTITY, ""));
    }
    let name = text_at(v, &["name"])?;
    let quantity = text_at(v, &["quantity", "amount"]).unwrap_or_else(|| DEFAULT_QUANTITY.into());
    let unit = text_at(v, &["unit"]).unwrap_or_default();
    Some(Ingredient::new(name, quantity, unit))
}

pub fn ingredients_from_value(v: Option<&Value>) -> Vec<Ingredient> {
    v.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(ingredient_from_value).collect())
        .unwrap_or_default()
}

/// `index` is the 0-based array position; it supplies the step number when absent.
pub fn instruction_from_value(index: usize, v: &Value) -> InstructionStep {
    let fallback_step = index as u32 + 1;
    if let Value::String(s) = v {
        return InstructionStep {
            step: fallback_step,
            description: s.trim().to_string(),
            duration: 0,
        };
    }
    let step = number_at(v, &["step"])
        .filter(|n| *n >= 1.0)
        .map(|n| n.round() as u32)
        .unwrap_or(fallback_step);
    let description = text_at(v, &["description", "instruction"]).unwrap_or_default();
    // An explicit zero does not shadow the alternate field.
    let duration = ["duration", "time"]
        .iter()
        .filter_map(|k| v.get(*k))
        .find_map(|n| as_number(n).filter(|n| *n > 0.0))
        .map(minutes)
        .unwrap_or(0);
    InstructionStep {
        step,
        description,
        duration,
    }
}

pub fn instructions_from_value(v: Option<&Value>) -> Vec<InstructionStep> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| instruction_from_value(i, item))
                .collect()
        })
        .unwrap_or_default()
}

/// `nutrition.<field>`, then top-level `<field>`, then 0.
pub fn nutrition_from_value(root: &Value) -> Nutrition {
    let nested = root.get("nutrition").filter(|n| n.is_object());
    let pick = |field: &str| {
        nested
            .and_then(|n| number_at(n, &[field]))
            .or_else(|| number_at(root, &[field]))
            .map(non_negative)
            .unwrap_or(0.0)
    };
    Nutrition {
        calories: pick("calories"),
        protein: pick("protein"),
        carbs: pick("carbs"),
        fat: pick("fat"),
    }
}

/// Accepts `[0, 1]` fractions and `(1, 100]` percentages.
pub fn confidence_from_value(v: Option<&Value>) -> Confidence {
    match v.and_then(as_number) {
        Some(n) if n > 1.0 && n <= 100.0 => Confidence::new(n / 100.0),
        Some(n) => Confidence::new(n),
        None => Confidence::new(0.0),
    }
}

fn difficulty_from_value(v: &Value) -> Option<Difficulty> {
    text_at(v, &["difficulty"]).and_then(|s| s.parse().ok())
}

/// Builds an [`IdentifiedMeal`] from an analyzer response.
pub fn identified_meal_from_value(v: &Value) -> Result<IdentifiedMeal, CompanionError> {
    if !v.is_object() {
        return Err(CompanionError::malformed("identification result is not an object"));
    }
    let dish_name = text_at(v, &["dishName", "name"])
        .ok_or_else(|| CompanionError::malformed("identification result has no dish name"))?;

    let nutrition = nutrition_from_value(v);
    let macros_obj = v.get("macros").filter(|m| m.is_object());
    let macro_field = |field: &str, fallback: f64| {
        macros_obj
            .and_then(|m| number_at(m, &[field]))
            .map(non_negative)
            .unwrap_or(fallback)
    };
    let macros = Macros {
        protein: macro_field("protein", nutrition.protein),
        fat: macro_field("fat", nutrition.fat),
        carbs: macro_field("carbs", nutrition.carbs),
    };

    Ok(IdentifiedMeal {
        dish_name,
        ingredients: ingredients_from_value(v.get("ingredients")),
        calories: nutrition.calories,
        macros,
        cuisine_type: text_at(v, &["cuisineType", "cuisine"]),
        difficulty: difficulty_from_value(v),
        confidence: confidence_from_value(v.get("confidence")),
    })
}

/// Builds a fully-defaulted [`GeneratedRecipe`].
///
/// Defaults: difficulty `medium`, servings 2, source `ai_generated`.
pub fn recipe_from_value(v: &Value) -> Result<GeneratedRecipe, CompanionError> {
    if !v.is_object() {
        return Err(CompanionError::malformed("recipe is not an object"));
    }
    let name = text_at(v, &["name", "dishName"])
        .ok_or_else(|| CompanionError::malformed("recipe has no name"))?;

    let servings = number_at(v, &["servings"])
        .filter(|n| *n >= 1.0)
        .map(|n| n.round() as u32)
        .unwrap_or(DEFAULT_SERVINGS);

    Ok(GeneratedRecipe {
        name,
        description: text_at(v, &["description"]),
        source: text_at(v, &["source"]).unwrap_or_else(|| DEFAULT_RECIPE_SOURCE.into()),
        ingredients: ingredients_from_value(v.get("ingredients")),
        instructions: instructions_from_value(first(v, &["instructions", "steps"])),
        nutrition: nutrition_from_value(v),
        prep_time: number_at(v, &["prepTime"]).map(minutes),
        cook_time: number_at(v, &["cookTime"]).map(minutes),
        servings,
        difficulty: difficulty_from_value(v).unwrap_or_default(),
        cuisine_type: text_at(v, &["cuisineType", "cuisine"]),
    })
}

/// Parses a recipe serialized into a navigation parameter.
pub fn recipe_from_json(raw: &str) -> Result<GeneratedRecipe, CompanionError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CompanionError::malformed(format!("recipe data: {e}")))?;
    recipe_from_value(&value)
}
