use serde::Serialize;

use crate::domain::user::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
}

/// Per-request caller information handed to every service call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub current_identity: Option<Identity>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            current_identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.current_identity.as_ref()
    }
}
