// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The single owner of the authenticated session.
//!
//! Every change to who is logged in goes through one of the five operations
//! here. The authority also keeps the shared [`Credential`] in step with the
//! session and binds itself into it, so adapters can ask for a refresh
//! without holding a reference to the authority.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures_util::{
    future::{BoxFuture, Shared},
    lock::Mutex,
    FutureExt as _,
};
use log::{debug, info, warn};
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{
    adapter::Adapter,
    config::Config,
    credential::{Credential, Refresh},
    error::{self, Error, Result},
    session::{Phase, ProfileUpdate, Session, TokenGrant, User},
    transport::{Request, Transport},
};

pub(crate) const LOGIN: &str = "/auth/login";
pub(crate) const LOGOUT: &str = "/auth/logout";
pub(crate) const REFRESH_TOKEN: &str = "/auth/refresh-token";
pub(crate) const PROFILE: &str = "/auth/profile";

const GENERIC_LOGIN_FAILURE: &str = "Login failed. Please check your credentials and try again.";

type PendingRefresh = Shared<BoxFuture<'static, Result<SecretString, Arc<Error>>>>;

#[derive(Serialize)]
struct LoginBody<'a> {
    identifier: &'a str,
    secret: &'a str,
}

#[derive(Deserialize)]
struct ProfileEnvelope {
    user: User,
}

struct Inner {
    state: watch::Sender<Session>,
    credential: Credential,
    adapter: Adapter,
    refresh_timeout: Duration,
    pending_refresh: Mutex<Option<PendingRefresh>>,
    /// Bumped whenever someone logs in or out. A refresh only lands if the
    /// generation it started in is still current.
    generation: AtomicU64,
}

/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub(crate) struct Authority {
    inner: Arc<Inner>,
}

/// The refresh capability handed to the credential. It only holds a weak
/// reference so the credential never keeps the authority alive.
struct Refresher(Weak<Inner>);

#[async_trait]
impl Refresh for Refresher {
    async fn refresh(&self) -> Result<SecretString> {
        let inner = self.0.upgrade().ok_or(error::Internal::RefresherUnavailable)?;
        Authority { inner }.refresh().await
    }
}

impl Authority {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        let credential = Credential::new();
        let (state, _) = watch::channel(Session::default());
        let inner = Arc::new(Inner {
            state,
            adapter: Adapter::new(transport, credential.clone()),
            credential,
            refresh_timeout: config.refresh_timeout(),
            pending_refresh: Mutex::new(None),
            generation: AtomicU64::new(0),
        });
        inner
            .credential
            .bind(Arc::new(Refresher(Arc::downgrade(&inner))));

        Self { inner }
    }

    /// The cell adapters read the access token from.
    pub(crate) fn credential(&self) -> Credential {
        self.inner.credential.clone()
    }

    pub(crate) fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Try to resume a session from the refresh cookie alone. Failing to do
    /// so just means nobody is logged in, so it is never reported as an
    /// error.
    pub(crate) async fn initialize(&self) -> Phase {
        if self.inner.state.borrow().is_initialized() {
            debug!("Session is already initialized, so there's nothing to do");
            return self.inner.state.borrow().phase();
        }

        self.inner.state.send_modify(Session::begin);
        match self.refresh().await {
            Ok(_) => info!("Resumed the previous session"),
            Err(e) => debug!("No session to resume: {}", e),
        }
        self.inner.state.send_modify(Session::finish_initialization);

        self.inner.state.borrow().phase()
    }

    pub(crate) async fn login(&self, identifier: &str, secret: &SecretString) -> Result<User> {
        self.inner.state.send_modify(Session::begin);

        let body = LoginBody {
            identifier,
            secret: secret.expose_secret(),
        };
        let grant = match self.inner.adapter.post::<_, TokenGrant>(LOGIN, &body).await {
            Ok(grant) => grant,
            Err(e) => {
                let (message, err) = match e {
                    Error::Api(ref api) if api.status().is_client_error() => {
                        let message = match *api {
                            error::Api::Unauthorized { ref message, .. }
                            | error::Api::Validation { ref message, .. } => message.clone(),
                            error::Api::Server { .. } | error::Api::UnexpectedStatus(_) => {
                                GENERIC_LOGIN_FAILURE.to_owned()
                            }
                        };
                        (
                            message.clone(),
                            error::Auth::CredentialsRejected(message).into(),
                        )
                    }
                    other => (GENERIC_LOGIN_FAILURE.to_owned(), other),
                };
                warn!("Login as {} failed: {}", identifier, err);
                self.inner
                    .state
                    .send_modify(|session| session.record_login_failure(message));
                return Err(err);
            }
        };

        let Some(user) = grant.user else {
            let err = Error::Auth(error::Auth::MissingUser);
            self.inner
                .state
                .send_modify(|session| session.record_login_failure(err.to_string()));
            return Err(err);
        };

        let _ = self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.credential.set(grant.access_token.clone()).await;
        self.inner
            .state
            .send_modify(|session| session.authenticate(grant.access_token, user.clone()));
        info!("Logged in as {} ({})", user.email, user.role);

        Ok(user)
    }

    /// Forget the session. Telling the server is best-effort; locally this
    /// always succeeds.
    pub(crate) async fn logout(&self) {
        if let Err(e) = self
            .inner
            .adapter
            .send(Request::new(Method::POST, LOGOUT))
            .await
        {
            warn!("The server did not acknowledge our logout, but we're logged out locally anyway: {}", e);
        }

        let _ = self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.credential.clear().await;
        self.inner.state.send_modify(Session::sign_out);
        info!("Logged out");
    }

    /// Exchange the refresh cookie for a new access token.
    ///
    /// Concurrent callers share a single exchange with the server and all
    /// observe its outcome. On failure the session is signed out before the
    /// error is returned. An exchange that straddles a login or logout is
    /// discarded and leaves the newer session alone.
    pub(crate) async fn refresh(&self) -> Result<SecretString> {
        let pending = {
            let mut slot = self.inner.pending_refresh.lock().await;
            match slot.as_ref() {
                Some(pending) => {
                    debug!("A refresh is already in flight, so we'll wait for it");
                    pending.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let pending = async move {
                        let outcome = inner.exchange().await.map_err(Arc::new);
                        // Settled, so the next caller has to start afresh.
                        *inner.pending_refresh.lock().await = None;
                        outcome
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending
            .await
            .map_err(|e| error::Auth::SessionExpired(e).into())
    }

    pub(crate) async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        if !self.inner.state.borrow().is_authenticated() {
            return Err(error::Auth::NotAuthenticated.into());
        }

        self.inner.state.send_modify(Session::begin);
        match self
            .inner
            .adapter
            .put::<_, ProfileEnvelope>(PROFILE, update)
            .await
        {
            Ok(ProfileEnvelope { user }) => {
                self.inner
                    .state
                    .send_modify(|session| session.merge_profile(user));
                self.inner
                    .state
                    .borrow()
                    .user()
                    .cloned()
                    .ok_or_else(|| error::Auth::NotAuthenticated.into())
            }
            Err(e) => {
                self.inner
                    .state
                    .send_modify(|session| session.record_error(e.to_string()));
                Err(e)
            }
        }
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn exchange(&self) -> Result<SecretString> {
        let generation = self.generation.load(Ordering::SeqCst);
        let req = Request::new(Method::POST, REFRESH_TOKEN);
        let outcome = match tokio::time::timeout(self.refresh_timeout, self.adapter.send(req)).await
        {
            Ok(resp) => resp.and_then(|resp| resp.json::<TokenGrant>()),
            Err(_) => Err(error::Transport::Timeout(self.refresh_timeout).into()),
        };

        match outcome {
            Ok(grant) => {
                let token = grant.access_token.clone();
                let applied = self
                    .credential
                    .store_if(Some(grant.access_token.clone()), || {
                        self.is_current(generation) && {
                            self.state.send_modify(|session| {
                                session.rotate(grant.access_token, grant.user);
                            });
                            true
                        }
                    })
                    .await;
                if applied {
                    debug!("Access token rotated");
                    Ok(token)
                } else {
                    debug!("Someone logged in or out during the refresh, so we're discarding its token");
                    Err(error::Auth::Superseded.into())
                }
            }
            Err(e) => {
                let applied = self
                    .credential
                    .store_if(None, || {
                        self.is_current(generation) && {
                            self.state.send_modify(Session::sign_out);
                            true
                        }
                    })
                    .await;
                if applied {
                    debug!("Refreshing the access token failed, so we're signing out: {}", e);
                } else {
                    debug!("Refreshing the access token failed, but the session has moved on: {}", e);
                }
                Err(e)
            }
        }
    }
}
