//! adfps - FPS signal aggregation and threshold derivation for audio description
//!
//! This library ingests per-video, per-FPS signal measurements, aggregates
//! them per content tier and frame rate, derives the frame rates at which
//! each signal is sufficiently resolved, maps those onto audio-description
//! quality tiers and compares tiers and study cohorts statistically.

pub mod aggregate;
pub mod cli;
pub mod compare;
pub mod config;
pub mod corpus;
pub mod csv_output;
pub mod json_output;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod stats;
pub mod summary;
pub mod threshold;
pub mod tier_map;
