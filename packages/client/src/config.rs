//! Client configuration.

use swaphere_server::domain::{UserId, UserProfile};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay WebSocket endpoint, e.g. `ws://127.0.0.1:5000/ws`
    pub url: String,
    pub user_id: UserId,
    pub display_name: String,
    pub email: Option<String>,
    /// Session token issued by the platform login
    pub token: String,
    /// Conference host used by the headless video widget
    pub widget_base_url: String,
}

impl ClientConfig {
    /// The local participant as announced to peers.
    pub fn profile(&self) -> UserProfile {
        let mut profile = UserProfile::new(self.user_id.clone(), self.display_name.clone());
        profile.email = self.email.clone();
        profile
    }

    /// Endpoint with the identity and credential as query parameters.
    pub fn connect_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}userId={}&token={}",
            self.url, separator, self.user_id, self.token
        )
    }
}
