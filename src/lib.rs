//! # Burn TextCNN
#![forbid(unsafe_code)]

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Tokenization
pub mod tokenizer;

/// Run tracking
pub mod tracking;

/// Prediction server
pub mod server;

/// Utilities
pub mod utils;

/// Error macros
#[macro_use]
extern crate anyhow;
