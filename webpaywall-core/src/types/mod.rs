//! Core types used across webpaywall.

mod common;
mod config;
mod outcome;

pub use common::*;
pub use config::*;
pub use outcome::*;
