//! gacha-audit - statistical audit engine for randomized reward systems
//!
//! Decides whether observed success/failure sequences are consistent with
//! independent trials at the published rates. The library covers
//! Benjamini-Hochberg correction, per-row dispersion and bias classification,
//! an exact binomial test on the flagged-row count, and fair-vs-rigged
//! outcome distribution analytics.

pub mod audit;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod distribution;
pub mod error;
pub mod ingest;
pub mod json_output;
pub mod row;
