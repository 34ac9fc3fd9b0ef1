//! vigia - fleet monitoring hub
//!
//! Collects resource metrics for registered cloud servers, evaluates
//! user-configured threshold rules and delivers notifications through
//! email and WhatsApp. The pipeline is triggered over HTTP (cron or
//! manual) and is stateless between invocations: every run reads the
//! fleet from the data store, processes each server sequentially and
//! leaves an audit trail of everything it attempted.

pub mod api;
pub mod collector;
pub mod config;
pub mod notify;
pub mod pipeline;
pub mod providers;
pub mod store;
