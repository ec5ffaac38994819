//! # Rolestore Admin Library
//!
//! Operator tooling for a rolestore deployment.
//!
//! ## Modules
//!
//! - `cli`: command-line definitions
//! - `config`: configuration management
//! - `commands`: subcommand execution against a `UserStore`

pub mod cli;
pub mod commands;
pub mod config;
