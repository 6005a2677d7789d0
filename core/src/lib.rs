//! `postbox-core` — the contact-form submission pipeline.
//!
//! A submission travels through three stages:
//!
//! 1. [`validator::check`] evaluates the declarative per-field rule table
//!    and produces a map of field name → error message. An empty map means
//!    the submission is accepted.
//! 2. [`store::AppendStore`] records the accepted submission in a JSON-array
//!    file by splicing the new record in place instead of rewriting the
//!    whole file.
//! 3. [`delivery::DeliveryCoordinator`] runs store-then-notify as a
//!    fire-and-forget task; each step's failure is logged independently and
//!    neither suppresses the other.
//!
//! The HTTP boundary lives in `postbox-server`; this crate has no knowledge
//! of the wire protocol beyond the serde shape of [`submission::Submission`].

pub mod config;
pub mod delivery;
pub mod mailer;
pub mod store;
pub mod submission;
pub mod validator;
