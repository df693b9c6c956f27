//! HTTP server for the Gym Tracker API.
//!
//! Exposes registration, login, logout, token refresh and user profile
//! endpoints over the [`gym_tracker`] core.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
