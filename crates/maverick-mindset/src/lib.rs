//! Trainee onboarding: weekly plans, progress tracking, badges, leaderboards and the
//! AI-assisted content that feeds them.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod telemetry;
