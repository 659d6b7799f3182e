//! Directory that admits every syntactically valid user id.
//!
//! Used when the server runs without a user export; every user resolves to a
//! minimal profile whose display name is the id.

use async_trait::async_trait;

use crate::domain::{UserDirectory, UserId, UserProfile};

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenUserDirectory;

#[async_trait]
impl UserDirectory for OpenUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> Option<UserProfile> {
        Some(UserProfile::minimal(user_id.clone()))
    }
}
