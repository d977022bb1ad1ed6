#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Wire models and configuration shared by the Votacion client crates.

pub mod config;
pub mod models;
