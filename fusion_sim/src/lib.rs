// fusion_sim/src/lib.rs

// This crate is the application layer around `fusion_core`: it reads sensor
// logs or generates synthetic ones, drives the filter and reports results.
pub mod cli;
pub mod config;
pub mod error;
pub mod log_reader;
pub mod output;
pub mod runner;
pub mod synthetic;
