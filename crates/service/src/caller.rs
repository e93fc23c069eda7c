use serde::{Deserialize, Serialize};

/// Authenticated caller as asserted by the gateway's token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub sub: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Caller {
    pub fn new(sub: impl Into<String>, role: impl Into<String>) -> Self {
        Self { sub: sub.into(), role: role.into(), email: None }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.eq_ignore_ascii_case(role)
    }
}
