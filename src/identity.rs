//! Placeholder identity provider
//!
//! There is no real SSO yet: signing in creates a demo profile and stores it
//! next to the configuration. The profile is only used for display text and
//! is never attached to requests.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::utils::error::ChatResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: String,
    pub company: String,
}

pub trait IdentityProvider {
    fn profile(&self) -> Option<&Profile>;

    fn is_authenticated(&self) -> bool {
        self.profile().is_some()
    }
}

/// Profile persisted as JSON in a local file
#[derive(Debug, Default)]
pub struct LocalIdentity {
    path: Option<PathBuf>,
    user: Option<Profile>,
}

impl LocalIdentity {
    /// Load a stored profile from `path`. A missing or unreadable file means
    /// "signed out".
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let user = match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<Profile>(&json) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!("Ignoring unreadable profile {}: {}", path.display(), e);
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            path: Some(path),
            user,
        }
    }

    /// Identity that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Placeholder sign-in: create a demo user and store it
    pub fn login(&mut self) -> ChatResult<&Profile> {
        let profile = Profile {
            id: format!("user_{}", random_base36(9)),
            email: "demo@greenchoice.com".to_string(),
            name: "Demo User".to_string(),
            avatar: "src/assets/avatar.png".to_string(),
            company: "GreenChoice Inc.".to_string(),
        };

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&profile)?)?;
        }

        info!(id = %profile.id, "Signed in");
        Ok(&*self.user.insert(profile))
    }

    pub fn logout(&mut self) -> ChatResult<()> {
        if let Some(user) = self.user.take() {
            info!(id = %user.id, "Signed out");
        }
        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl IdentityProvider for LocalIdentity {
    fn profile(&self) -> Option<&Profile> {
        self.user.as_ref()
    }
}

fn random_base36(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..len)
        .map(|_| ALPHABET[fastrand::usize(..ALPHABET.len())] as char)
        .collect()
}
