// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::role::Role;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum UserId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(ref s) => write!(f, "{s}"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub(crate) struct User {
    #[serde(alias = "_id")]
    #[tabled(rename = "ID")]
    pub(crate) id: UserId,
    #[serde(default)]
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[serde(default)]
    #[tabled(rename = "Email")]
    pub(crate) email: String,
    #[tabled(rename = "Role")]
    pub(crate) role: Role,
    /// Role-specific fields, such as a student's class or an accountant's
    /// department.
    #[serde(flatten)]
    #[tabled(skip)]
    pub(crate) details: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Fold the server's canonical copy of the profile into this one.
    pub(crate) fn merge(&mut self, canonical: Self) {
        self.id = canonical.id;
        if !canonical.name.is_empty() {
            self.name = canonical.name;
        }
        if !canonical.email.is_empty() {
            self.email = canonical.email;
        }
        self.role = canonical.role;
        self.details.extend(canonical.details);
    }
}

/// What the server hands back from login and refresh.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenGrant {
    pub(crate) access_token: SecretString,
    #[serde(default)]
    pub(crate) user: Option<User>,
}

/// A partial profile; absent fields are left alone by the server.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) phone: Option<String>,
}

impl ProfileUpdate {
    pub(crate) const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Phase {
    /// The startup refresh has not resolved yet; redirect decisions wait.
    Uninitialized,
    Unauthenticated,
    Authenticated,
}

/// The process-wide authentication state.
///
/// Only the session authority mutates it; everything else sees snapshots.
#[derive(Clone, Debug, Default)]
pub(crate) struct Session {
    is_authenticated: bool,
    user: Option<User>,
    access_token: Option<SecretString>,
    is_loading: bool,
    is_initialized: bool,
    error: Option<String>,
    login_attempts: u32,
}

impl Session {
    pub(crate) const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub(crate) const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub(crate) const fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    pub(crate) const fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub(crate) const fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) const fn login_attempts(&self) -> u32 {
        self.login_attempts
    }

    pub(crate) const fn phase(&self) -> Phase {
        if !self.is_initialized {
            Phase::Uninitialized
        } else if self.is_authenticated {
            Phase::Authenticated
        } else {
            Phase::Unauthenticated
        }
    }

    pub(crate) fn begin(&mut self) {
        self.is_loading = true;
    }

    pub(crate) fn finish_initialization(&mut self) {
        self.is_loading = false;
        self.is_initialized = true;
    }

    pub(crate) fn authenticate(&mut self, token: SecretString, user: User) {
        self.is_authenticated = true;
        self.user = Some(user);
        self.access_token = Some(token);
        self.is_loading = false;
        self.is_initialized = true;
        self.error = None;
        self.login_attempts = 0;
    }

    /// Swap in a rotated token. The session only counts as authenticated
    /// when we know whose token it is.
    pub(crate) fn rotate(&mut self, token: SecretString, user: Option<User>) {
        if let Some(user) = user {
            self.user = Some(user);
        }
        self.access_token = Some(token);
        self.is_authenticated = self.user.is_some();
    }

    pub(crate) fn record_login_failure(&mut self, message: String) {
        self.login_attempts = self.login_attempts.saturating_add(1);
        self.error = Some(message);
        self.is_loading = false;
        if self.access_token.is_none() {
            self.is_authenticated = false;
        }
    }

    pub(crate) fn record_error(&mut self, message: String) {
        self.error = Some(message);
        self.is_loading = false;
    }

    pub(crate) fn merge_profile(&mut self, canonical: User) {
        match self.user.as_mut() {
            Some(user) => user.merge(canonical),
            None => self.user = Some(canonical),
        }
        self.is_loading = false;
        self.error = None;
    }

    /// Back to the default unauthenticated state. Initialization is a
    /// once-per-process fact, so it survives.
    pub(crate) fn sign_out(&mut self) {
        *self = Self {
            is_initialized: self.is_initialized,
            ..Self::default()
        };
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.is_authenticated == other.is_authenticated
            && self.user == other.user
            && self.access_token.as_ref().map(|t| t.expose_secret())
                == other.access_token.as_ref().map(|t| t.expose_secret())
            && self.is_loading == other.is_loading
            && self.is_initialized == other.is_initialized
            && self.error == other.error
            && self.login_attempts == other.login_attempts
    }
}
