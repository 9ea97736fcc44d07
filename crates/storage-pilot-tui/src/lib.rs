//! storage-pilot-tui: Terminal UI for storage-pilot
//!
//! A Ratatui front end over [`storage_pilot_core::Wizard`], built with the
//! Component pattern. Cluster data is loaded in the background and results
//! come back to the main loop over a channel.

pub mod action;
pub mod app;
pub mod components;
pub mod tui;

pub use app::App;
