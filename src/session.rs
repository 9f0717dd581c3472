//! The signed-in user, carried explicitly instead of living in a global.

use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

/// Events from the authentication backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(UserProfile),
    SignedOut,
}

/// Session state handed to whatever needs to know who is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    user: Option<UserProfile>,
}

impl SessionContext {
    pub fn new(user: Option<UserProfile>) -> Self {
        Self { user }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// The only place the session changes.
    pub fn apply(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(user) => {
                info!("signed in as {}", user.email);
                self.user = Some(user);
            }
            AuthEvent::SignedOut => {
                if let Some(user) = self.user.take() {
                    info!("signed out {}", user.email);
                }
            }
        }
    }
}
