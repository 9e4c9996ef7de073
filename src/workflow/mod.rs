//! Client-side identify → generate → persist workflow.

mod detail;
mod guard;
mod session;
mod state;

pub use detail::RecipeDetail;
pub use guard::{InFlight, InFlightToken};
pub use session::MealSession;
pub use state::CaptureState;
