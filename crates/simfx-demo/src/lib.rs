#![forbid(unsafe_code)]

//! Terminal showcase for the simfx animation controllers.
//!
//! Lays every controller out on one scrolling page, feeds it real or virtual
//! time, and renders snapshots as plain text.

pub mod app;
pub mod cli;
pub mod config_file;
pub mod error;
pub mod input;
pub mod render;
pub mod runner;
pub mod terminal;
