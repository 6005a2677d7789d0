//! The contact-form submission record.

use serde::{Deserialize, Serialize};

/// One contact-form submission: six free-text fields as they arrive on the
/// wire and as they are persisted in the store file.
///
/// The record is immutable once validated. The request that decoded it owns
/// it until it is handed to the delivery coordinator, which owns it for the
/// duration of persist + send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub business: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub details: String,
}
