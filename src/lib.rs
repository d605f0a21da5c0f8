//! Small daemon and cli for a time tracking backend. The daemon keeps count of the time worked
//! today and warns when the day's work quota is close to being exceeded.
//!

pub mod api;
pub mod cli;
pub mod daemon;
pub mod utils;
