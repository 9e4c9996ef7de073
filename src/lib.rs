//! Meal companion: the identify → generate recipe → persist workflow.
//!
//! The client half (`workflow`, `chat`, `history`, `shopping`) drives the
//! backend through [`api::MealApi`]; the server half (`app` and the route
//! modules) implements the same contract over axum and Postgres.

pub mod api;
pub mod capture;
pub mod chat;
pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod normalize;
pub mod shopping;
pub mod workflow;

pub mod ai;
pub mod analyzer;
pub mod app;
pub mod auth;
pub mod images;
pub mod meals;
pub mod recipes;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;

pub use error::{CompanionError, UserAlert};
