//! `postbox-server` — HTTP intake boundary for the contact-form pipeline.
//!
//! The binary scaffolds its working directory on first run, loads the JSON
//! config, and serves three routes: the cached homepage, static assets, and
//! `POST /write-email`, which validates a submission and schedules delivery
//! asynchronously while acknowledging the caller immediately.

pub mod bootstrap;
pub mod intake;
