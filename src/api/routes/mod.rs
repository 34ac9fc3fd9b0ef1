//! Route handlers

pub mod alerts;
pub mod health;
pub mod jobs;
