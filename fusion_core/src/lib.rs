// fusion_core/src/lib.rs

// This file defines the public modules of the library.
pub mod config;
pub mod error;
pub mod estimation;
pub mod messages;
pub mod metrics;
pub mod models;
pub mod prelude;
pub mod state;
pub mod types;
pub mod utils;
