//! Diet-plan client — onboarding wizard, plan submission and session
//! handling for the diet-plan backend.

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod forms;
pub mod navigation;
pub mod profile;
pub mod store;
