// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, result, sync::Arc, time::Duration};

use reqwest::StatusCode;
use thiserror::Error;

use crate::role::{Role, Section};

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("transport error: {0}")]
    Transport(#[from] Transport),
    #[error("API error: {0}")]
    Api(#[from] Api),
    #[error("authentication error: {0}")]
    Auth(#[from] Auth),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("internal communication error: {0}")]
    Internal(#[from] Internal),
    #[error("the {role} role does not have access to {section}")]
    Forbidden { role: Role, section: Section },
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the user has to log in again before anything else can succeed.
    pub(crate) const fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Auth(Auth::SessionExpired(_) | Auth::NotAuthenticated)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(Transport::Http(value))
    }
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

/// Failures where no HTTP response was received at all.
#[derive(Error, Debug)]
pub(crate) enum Transport {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not reach the server: {0}")]
    Unreachable(String),
}

/// Failures reported by the server through a response status.
#[derive(Error, Debug)]
pub(crate) enum Api {
    #[error("server rejected our credentials ({status}): {message}")]
    Unauthorized { status: StatusCode, message: String },
    #[error("server rejected the request ({status}): {message}")]
    Validation { status: StatusCode, message: String },
    #[error("server failed to process the request ({status}): {message}")]
    Server { status: StatusCode, message: String },
    #[error("server responded with unexpected status {0}")]
    UnexpectedStatus(StatusCode),
}

impl Api {
    pub(crate) fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message =
            message.unwrap_or_else(|| status.canonical_reason().unwrap_or("no details").to_owned());
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized { status, message }
        } else if status.is_client_error() {
            Self::Validation { status, message }
        } else if status.is_server_error() {
            Self::Server { status, message }
        } else {
            Self::UnexpectedStatus(status)
        }
    }

    pub(crate) const fn status(&self) -> StatusCode {
        match *self {
            Self::Unauthorized { status, .. }
            | Self::Validation { status, .. }
            | Self::Server { status, .. }
            | Self::UnexpectedStatus(status) => status,
        }
    }
}

#[derive(Error, Debug)]
pub(crate) enum Auth {
    #[error("login rejected: {0}")]
    CredentialsRejected(String),
    #[error("session expired: {0}")]
    SessionExpired(Arc<Error>),
    #[error("no user is logged in")]
    NotAuthenticated,
    #[error("server granted a token but did not say who it belongs to")]
    MissingUser,
    #[error("the session was replaced while the token was being refreshed")]
    Superseded,
}

#[derive(Error, Debug)]
pub(crate) enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
    #[error("gave up after {0} rejected login attempts")]
    AttemptsExhausted(u32),
}

#[derive(Error, Debug)]
pub(crate) enum Internal {
    #[error("no session authority is bound to the credential")]
    RefresherUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_failure_classes() {
        assert!(matches!(
            Api::from_status(StatusCode::UNAUTHORIZED, None),
            Api::Unauthorized { .. }
        ));
        assert!(matches!(
            Api::from_status(StatusCode::UNPROCESSABLE_ENTITY, Some("bad email".to_owned())),
            Api::Validation { ref message, .. } if message == "bad email"
        ));
        assert!(matches!(
            Api::from_status(StatusCode::BAD_GATEWAY, None),
            Api::Server { ref message, .. } if message == "Bad Gateway"
        ));
        assert!(matches!(
            Api::from_status(StatusCode::FOUND, None),
            Api::UnexpectedStatus(StatusCode::FOUND)
        ));
    }

    #[test]
    fn expired_sessions_are_recognized() {
        let cause = Arc::new(Error::Api(Api::from_status(StatusCode::UNAUTHORIZED, None)));
        assert!(Error::Auth(Auth::SessionExpired(cause)).is_session_expired());
        assert!(Error::Auth(Auth::NotAuthenticated).is_session_expired());
        assert!(!Error::Auth(Auth::CredentialsRejected("nope".to_owned())).is_session_expired());
    }
}
