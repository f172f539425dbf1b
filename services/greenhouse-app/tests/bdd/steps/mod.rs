//! BDD step definitions for the greenhouse dashboard app

pub mod chart_steps;
pub mod feedback_steps;
pub mod live_data_steps;
