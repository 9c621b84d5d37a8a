//! Acting principal resolved from an authenticated session.

use std::sync::Arc;

/// The user on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Arc<str>,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<Arc<str>>, roles: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}
