use std::sync::Arc;

use anyhow::{Context, Result};

use taskdeck_core::api::HttpGateway;
use taskdeck_core::config::AppConfig;
use taskdeck_core::session::AuthStore;
use taskdeck_core::storage::SessionStorage;
use taskdeck_core::tasks::TaskStore;

/// The two stores every command works through, sharing one gateway.
#[derive(Clone)]
pub struct AppContext {
    pub tasks: TaskStore,
    pub auth: AuthStore,
}

impl AppContext {
    pub fn connect(config: &AppConfig) -> Result<Self> {
        let storage = SessionStorage::open(config.session_path()).with_context(|| {
            format!(
                "failed to open session storage at {}",
                config.session_path().display()
            )
        })?;
        let gateway = Arc::new(
            HttpGateway::new(config, storage.clone()).context("failed to initialize HTTP gateway")?,
        );

        let auth = AuthStore::new(gateway.clone(), storage, config.auth_enabled());
        gateway.observe_session(auth.observer());
        tracing::debug!(
            api_url = %config.api_url(),
            auth_enabled = config.auth_enabled(),
            "connected stores"
        );

        Ok(Self::from_parts(TaskStore::new(gateway), auth))
    }

    pub fn from_parts(tasks: TaskStore, auth: AuthStore) -> Self {
        Self { tasks, auth }
    }
}
