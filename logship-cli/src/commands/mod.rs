//! Command handlers

pub mod patterns;
pub mod run;
