// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Chat client lifecycle.
//!
//! Messaging itself belongs to an external chat service. The backend only
//! connects a user's chat client when they sign in and disconnects it when
//! they sign out. The provider is built once from configuration and passed
//! in, so there is never more than one client per process.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::AuthenticatedUser;
use crate::retry::{RetryPolicy, TransientError, retry_transient};

/// Chat provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// The provider did not answer in time.
    #[error("Chat provider timed out")]
    Timeout,
    /// The provider could not be reached.
    #[error("Chat provider unreachable: {0}")]
    Connectivity(String),
    /// The provider refused the request.
    #[error("Chat provider rejected the request: {0}")]
    Rejected(String),
}

impl TransientError for ChatError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connectivity(_))
    }
}

/// A chat backend that can hold a connection per user.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Connects the user's chat client.
    ///
    /// # Errors
    ///
    /// Fails if the provider cannot be reached or refuses the user.
    async fn connect_user(&self, user: &AuthenticatedUser) -> Result<(), ChatError>;

    /// Disconnects the user's chat client. Disconnecting a user who is not
    /// connected is not an error.
    ///
    /// # Errors
    ///
    /// Fails if the provider cannot be reached.
    async fn disconnect_user(&self, user_id: i64) -> Result<(), ChatError>;
}

/// In-process provider that tracks connections in memory.
///
/// It stands in for the hosted chat service and is keyed by the configured
/// API key.
pub struct LocalChatProvider {
    api_key: String,
    connected: Mutex<HashSet<i64>>,
}

impl LocalChatProvider {
    /// Creates a provider for the given API key.
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            connected: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the API key this provider was built with.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns whether the user currently has a connected client.
    pub async fn is_connected(&self, user_id: i64) -> bool {
        self.connected.lock().await.contains(&user_id)
    }

    /// Returns the number of connected clients.
    pub async fn connected_count(&self) -> usize {
        self.connected.lock().await.len()
    }
}

#[async_trait]
impl ChatProvider for LocalChatProvider {
    async fn connect_user(&self, user: &AuthenticatedUser) -> Result<(), ChatError> {
        if self.api_key.trim().is_empty() {
            return Err(ChatError::Rejected(String::from("empty API key")));
        }
        self.connected.lock().await.insert(user.user_id);
        Ok(())
    }

    async fn disconnect_user(&self, user_id: i64) -> Result<(), ChatError> {
        self.connected.lock().await.remove(&user_id);
        Ok(())
    }
}

/// Ties chat connections to sign-in and sign-out.
///
/// Chat failures are logged and swallowed, so they never fail a login.
#[derive(Clone)]
pub struct ChatSessions {
    provider: Option<Arc<dyn ChatProvider>>,
    retry: RetryPolicy,
}

impl ChatSessions {
    /// Creates chat sessions backed by the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn ChatProvider>, retry: RetryPolicy) -> Self {
        Self {
            provider: Some(provider),
            retry,
        }
    }

    /// Creates chat sessions with chat turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            provider: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Returns whether a provider is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Connects the user's chat client, retrying transient failures.
    ///
    /// Returns whether the client ended up connected.
    pub async fn connect(&self, user: &AuthenticatedUser) -> bool {
        let Some(provider) = &self.provider else {
            debug!(user_id = user.user_id, "Chat disabled, skipping connect");
            return false;
        };

        match retry_transient(self.retry, || provider.connect_user(user)).await {
            Ok(()) => {
                info!(user_id = user.user_id, "Chat client connected");
                true
            }
            Err(err) => {
                warn!(user_id = user.user_id, error = %err, "Chat connect failed");
                false
            }
        }
    }

    /// Disconnects the user's chat client.
    ///
    /// The client is shared by all of the user's sign-ins, so this is only
    /// called once the last one ends.
    pub async fn disconnect(&self, user_id: i64) {
        let Some(provider) = &self.provider else {
            return;
        };

        match retry_transient(self.retry, || provider.disconnect_user(user_id)).await {
            Ok(()) => info!(user_id, "Chat client disconnected"),
            Err(err) => warn!(user_id, error = %err, "Chat disconnect failed"),
        }
    }
}
