//! Key-value persistence contracts.

pub mod app_state;
