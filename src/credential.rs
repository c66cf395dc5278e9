// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use once_cell::sync::OnceCell;
use secrecy::SecretString;
use tokio::sync::RwLock;

use crate::error::{self, Result};

/// Something that can exchange the ambient refresh cookie for a new access
/// token.
#[async_trait]
pub(crate) trait Refresh: Send + Sync {
    async fn refresh(&self) -> Result<SecretString>;
}

/// The access token every adapter attaches to its requests, and the way to
/// ask for a new one.
///
/// Clones share the same cell. The token only ever lives in memory.
#[derive(Clone, Default)]
pub(crate) struct Credential {
    token: Arc<RwLock<Option<SecretString>>>,
    refresher: Arc<OnceCell<Arc<dyn Refresh>>>,
}

impl Credential {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn token(&self) -> Option<SecretString> {
        let guard = self.token.read().await;
        guard.clone()
    }

    pub(crate) async fn set(&self, token: SecretString) {
        let mut guard = self.token.write().await;
        *guard = Some(token);
    }

    pub(crate) async fn clear(&self) {
        let mut guard = self.token.write().await;
        *guard = None;
    }

    /// Replace the token only if `apply` agrees, deciding while no other
    /// writer can get in between.
    pub(crate) async fn store_if<F: FnOnce() -> bool>(
        &self,
        token: Option<SecretString>,
        apply: F,
    ) -> bool {
        let mut guard = self.token.write().await;
        if !apply() {
            return false;
        }
        *guard = token;
        true
    }

    /// Late-bind the refresh capability. Only the first binding takes effect.
    pub(crate) fn bind(&self, refresher: Arc<dyn Refresh>) {
        if self.refresher.set(refresher).is_err() {
            warn!("A refresher is already bound to this credential, so we're ignoring another one");
        }
    }

    pub(crate) async fn refresh(&self) -> Result<SecretString> {
        let refresher = self
            .refresher
            .get()
            .ok_or(error::Internal::RefresherUnavailable)?;
        refresher.refresh().await
    }
}
