//! `TaskDash`: terminal dashboard for a remote task-management API.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod net;
pub mod tasks;
pub mod ui;
