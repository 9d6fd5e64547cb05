//! Facade bundling the dispatcher with the endpoint groups built on it.

use std::sync::Arc;

use fishpi_settings::ApiSettings;

use crate::auth::SessionAuthenticator;
use crate::chat::ChatApi;
use crate::dispatcher::{DispatcherConfig, RequestDispatcher};
use crate::user::AccountApi;

/// One logical FishPi session. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct FishpiClient {
    dispatcher: Arc<RequestDispatcher>,
    auth: SessionAuthenticator,
    chat: ChatApi,
    account: AccountApi,
}

impl FishpiClient {
    /// Build a client from API settings, adopting a configured token.
    pub fn from_settings(api: &ApiSettings) -> Self {
        Self::with_dispatcher(Arc::new(RequestDispatcher::from_settings(api)), &api.client_name)
    }

    /// Build a client with explicit connection parameters and no token.
    pub fn new(config: DispatcherConfig, client_name: &str) -> Self {
        Self::with_dispatcher(Arc::new(RequestDispatcher::new(config)), client_name)
    }

    fn with_dispatcher(dispatcher: Arc<RequestDispatcher>, client_name: &str) -> Self {
        Self {
            auth: SessionAuthenticator::new(dispatcher.clone()),
            chat: ChatApi::new(dispatcher.clone(), client_name),
            account: AccountApi::new(dispatcher.clone()),
            dispatcher,
        }
    }

    /// The shared dispatcher (token, rate limiter).
    pub fn dispatcher(&self) -> &Arc<RequestDispatcher> {
        &self.dispatcher
    }

    /// Login, token validation, profile.
    pub fn auth(&self) -> &SessionAuthenticator {
        &self.auth
    }

    /// Chat room endpoints.
    pub fn chat(&self) -> &ChatApi {
        &self.chat
    }

    /// Account status endpoints.
    pub fn account(&self) -> &AccountApi {
        &self.account
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_session() {
        let client = FishpiClient::new(DispatcherConfig::default(), "test");
        let other = client.clone();
        client.dispatcher().set_token("shared");
        assert!(other.auth().is_logged_in());
        assert!(Arc::ptr_eq(other.chat().dispatcher(), client.dispatcher()));
    }

    #[test]
    fn from_settings_carries_key() {
        let api = ApiSettings {
            api_key: Some("k".to_string()),
            ..ApiSettings::default()
        };
        assert!(FishpiClient::from_settings(&api).auth().is_logged_in());
    }
}
