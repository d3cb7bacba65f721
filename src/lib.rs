//! Region classification gateway.
//!
//! Takes an uploaded image plus a selection rectangle, validates and clamps
//! the selection, crops it and asks a remote GPU worker for the top labels.
//! [`selection::prepare_selection`] is the same pipeline for callers that
//! start from a box drawn on a scaled view.

pub mod cache;
pub mod client_ip;
pub mod config;
pub mod crop;
pub mod error;
pub mod geometry;
pub mod handlers;
pub mod housekeeping;
pub mod inference;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod selection;
pub mod state;
pub mod worker;
