//! Taskboard Library
//!
//! This module exports the core components for testing and integration.

pub mod api;
pub mod assist;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod history;
pub mod logging;
pub mod prompts;
pub mod types;
