use serde::{Deserialize, Serialize};

/// Identity record returned by a successful credential check.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
    pub active: bool,
}

/// Result of an identity lookup, used only at login time.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdentityStatus {
    pub active: bool,
}
