//! Publishes a spreadsheet guest list to a Firebase Realtime Database.
//!
//! - [`api`]: Google Sheets and Realtime Database clients behind traits
//! - [`config`]: environment configuration
//! - [`sync`]: invitation building, link regeneration and publishing

pub mod api;
pub mod config;
pub mod sync;
