//! Food inspection reports: load an inspection dataset, aggregate
//! compliance statistics and render it as table, cards, category groups and
//! statistics views.

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod render;
pub mod stats;
pub mod tutorial;
pub mod types;
pub mod util;
pub mod views;
