//! permctl: terminal console for users and application permissions
//!
//! This library provides:
//! - Headless list, dialog and lookup state for the console screens
//! - A gateway abstraction over the server's REST API, plus an in-memory one
//! - A ratatui front end and a scriptable command line front end

pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod gateway;
pub mod locale;
pub mod models;
pub mod tui;
