//! Shopping list built from recipe ingredients.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Ingredient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Meat,
    Produce,
    Dairy,
    Pantry,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Meat => "Meat",
            Category::Produce => "Produce",
            Category::Dairy => "Dairy",
            Category::Pantry => "Pantry",
            Category::Other => "Other",
        };
        f.write_str(s)
    }
}

const MEAT: &[&str] = &[
    "chicken", "beef", "pork", "lamb", "turkey", "bacon", "sausage", "salmon", "tuna", "shrimp",
    "fish", "steak", "ham",
];
const PRODUCE: &[&str] = &[
    "tomato", "onion", "garlic", "pepper", "cucumber", "lettuce", "spinach", "broccoli", "carrot",
    "potato", "lemon", "lime", "avocado", "basil", "cilantro", "parsley", "apple", "banana",
    "mushroom", "zucchini", "celery", "ginger",
];
const DAIRY: &[&str] = &[
    "milk", "cheese", "feta", "yogurt", "butter", "cream", "egg", "parmesan", "mozzarella",
];
const PANTRY: &[&str] = &[
    "rice", "quinoa", "pasta", "penne", "flour", "sugar", "salt", "oil", "vinegar", "sauce",
    "tortilla", "bread", "beans", "lentil", "spice", "honey", "stock", "broth", "noodle",
];

/// Keyword match on the lowercased name; first table hit wins.
pub fn categorize(name: &str) -> Category {
    let lower = name.to_lowercase();
    let tables = [
        (Category::Meat, MEAT),
        (Category::Dairy, DAIRY),
        (Category::Produce, PRODUCE),
        (Category::Pantry, PANTRY),
    ];
    tables
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(c, _)| *c)
        .unwrap_or(Category::Other)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub checked: bool,
    /// Number of recipe lines merged into this item.
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
}

impl ShoppingList {
    /// Merges case-insensitive duplicates, keeping first-seen order.
    pub fn from_ingredients(ingredients: &[Ingredient]) -> Self {
        let mut list = Self::default();
        for ing in ingredients {
            list.add(&ing.name);
        }
        list
    }

    pub fn add(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.name.eq_ignore_ascii_case(name))
        {
            item.quantity += 1;
            return;
        }
        self.items.push(ShoppingItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: categorize(name),
            checked: false,
            quantity: 1,
        });
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    /// Categories in order of first appearance.
    pub fn categories(&self) -> Vec<Category> {
        let mut seen = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.category) {
                seen.push(item.category);
            }
        }
        seen
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &ShoppingItem> {
        self.items.iter().filter(move |i| i.category == category)
    }

    /// Returns false if no item has `id`.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.checked = !item.checked;
                true
            }
            None => false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|i| !i.checked).count()
    }
}
