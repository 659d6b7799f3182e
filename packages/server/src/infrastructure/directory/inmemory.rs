//! InMemory UserDirectory 実装
//!
//! Seeded from a JSON array of user records exported from the platform's
//! user store:
//!
//! ```json
//! [{"id": "u1", "name": "Ada", "avatar": "/a.png", "profession": "Engineer"}]
//! ```

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{UserDirectory, UserId, UserProfile, ValueObjectError};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read user directory file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse user directory: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("user record '{id}' is invalid: {source}")]
    InvalidRecord {
        id: String,
        source: ValueObjectError,
    },
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(alias = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    profession: Option<String>,
}

/// インメモリ UserDirectory 実装
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<UserId, UserProfile>,
}

impl InMemoryUserDirectory {
    pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            users: profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let records: Vec<UserRecord> = serde_json::from_str(json)?;
        let profiles = records
            .into_iter()
            .map(|record| {
                let id = UserId::new(record.id.clone()).map_err(|source| {
                    DirectoryError::InvalidRecord {
                        id: record.id.clone(),
                        source,
                    }
                })?;
                Ok(UserProfile {
                    id,
                    name: record.name,
                    email: record.email,
                    avatar: record.avatar,
                    profession: record.profession,
                })
            })
            .collect::<Result<Vec<_>, DirectoryError>>()?;
        Ok(Self::new(profiles))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> Option<UserProfile> {
        self.users.get(user_id).cloned()
    }
}
