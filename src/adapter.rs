// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Per-resource HTTP clients that attach the current access token and
//! recover from exactly one expired-token rejection.

use std::sync::Arc;

use log::{debug, info};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    credential::Credential,
    error::Result,
    transport::{Request, Response, Transport},
};

/// Endpoints that hand out or revoke credentials. A 401 from one of these is
/// final, otherwise a failed refresh would try to refresh itself.
const AUTH_ENDPOINTS: &[&str] = &[
    "/auth/login",
    "/auth/logout",
    "/auth/refresh-token",
    "/auth/register",
    "/auth/forgot-password",
    "/auth/reset-password",
];

pub(crate) fn is_auth_endpoint(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    let path = path.trim_end_matches('/');
    AUTH_ENDPOINTS.iter().any(|endpoint| {
        path.strip_prefix(endpoint)
            .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'))
    })
}

fn same_token(a: Option<&SecretString>, b: Option<&SecretString>) -> bool {
    a.map(ExposeSecret::expose_secret) == b.map(ExposeSecret::expose_secret)
}

#[derive(Clone)]
pub(crate) struct Adapter {
    transport: Arc<dyn Transport>,
    credential: Credential,
}

impl Adapter {
    pub(crate) fn new(transport: Arc<dyn Transport>, credential: Credential) -> Self {
        Self {
            transport,
            credential,
        }
    }

    /// Send a request with the bearer attached, refreshing and resending at
    /// most once on a 401. Any non-success response ends up as an error.
    pub(crate) async fn send(&self, req: Request) -> Result<Response> {
        let sent_with = self.credential.token().await;
        let resp = self
            .transport
            .send(req.clone().with_bearer(sent_with.clone()))
            .await?;

        if resp.status() != StatusCode::UNAUTHORIZED || is_auth_endpoint(req.path()) {
            return resp.error_for_status();
        }

        // Someone else may have rotated the token while this request was in
        // flight, in which case the current one is worth a try as is.
        let current = self.credential.token().await;
        let token = if current.is_some() && !same_token(current.as_ref(), sent_with.as_ref()) {
            debug!(
                "Token changed while {} {} was in flight, so we're retrying with the new one",
                req.method(),
                req.path()
            );
            current
        } else {
            info!(
                "Access token rejected for {} {}, so we need to refresh it",
                req.method(),
                req.path()
            );
            Some(self.credential.refresh().await?)
        };

        self.transport
            .send(req.with_bearer(token))
            .await?
            .error_for_status()
    }

    pub(crate) async fn get<R: DeserializeOwned>(&self, req: Request) -> Result<R> {
        self.send(req).await?.json()
    }

    pub(crate) async fn get_path<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.get(Request::new(Method::GET, path)).await
    }

    pub(crate) async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        self.send(Request::new(Method::POST, path).with_body(serde_json::to_value(body)?))
            .await?
            .json()
    }

    pub(crate) async fn put<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        self.send(Request::new(Method::PUT, path).with_body(serde_json::to_value(body)?))
            .await?
            .json()
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let _resp = self.send(Request::new(Method::DELETE, path)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        credential::Refresh,
        error::{self, Error},
        testing::ScriptedTransport,
    };

    /// Hands out tok2, tok3, ... and counts how often it was asked.
    struct Rotating {
        credential: Credential,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Refresh for Rotating {
        async fn refresh(&self) -> Result<SecretString> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                self.credential.clear().await;
                return Err(error::Auth::SessionExpired(Arc::new(
                    error::Api::from_status(StatusCode::UNAUTHORIZED, None).into(),
                ))
                .into());
            }
            let token = SecretString::new(format!("tok{}", n + 2));
            self.credential.set(token.clone()).await;
            Ok(token)
        }
    }

    async fn setup(fail: bool) -> (Arc<ScriptedTransport>, Adapter, Arc<Rotating>) {
        let transport = Arc::new(ScriptedTransport::new());
        let credential = Credential::new();
        credential.set(SecretString::new("tok1".to_owned())).await;
        let refresher = Arc::new(Rotating {
            credential: credential.clone(),
            calls: AtomicUsize::new(0),
            fail,
        });
        let bound: Arc<dyn Refresh> = Arc::<Rotating>::clone(&refresher);
        credential.bind(bound);
        let adapter = Adapter::new(ScriptedTransport::handle(&transport), credential);
        (transport, adapter, refresher)
    }

    #[test]
    fn auth_endpoints_are_recognized() {
        assert!(is_auth_endpoint("/auth/login"));
        assert!(is_auth_endpoint("/auth/refresh-token/"));
        assert!(is_auth_endpoint("/auth/reset-password/abc123"));
        assert!(is_auth_endpoint("/auth/login?next=/students"));
        assert!(!is_auth_endpoint("/auth/profile"));
        assert!(!is_auth_endpoint("/auth/login-history"));
        assert!(!is_auth_endpoint("/users/profile"));
    }

    #[tokio::test]
    async fn bearer_is_read_at_send_time() {
        let (transport, adapter, _) = setup(false).await;
        transport.respond(Method::GET, "/students", 200, json!([]));

        let _: Vec<serde_json::Value> = adapter.get_path("/students").await.unwrap();
        adapter
            .credential
            .set(SecretString::new("tok7".to_owned()))
            .await;
        let _: Vec<serde_json::Value> = adapter.get_path("/students").await.unwrap();

        let bearers: Vec<_> = transport.sent().into_iter().map(|s| s.bearer).collect();
        assert_eq!(bearers, [Some("tok1".to_owned()), Some("tok7".to_owned())]);
    }

    #[tokio::test]
    async fn no_bearer_without_token() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::GET, "/navigation", 200, json!([]));
        let adapter = Adapter::new(
            ScriptedTransport::handle(&transport),
            Credential::new(),
        );

        let _: Vec<serde_json::Value> = adapter.get_path("/navigation").await.unwrap();
        assert_eq!(transport.sent()[0].bearer, None);
    }

    #[tokio::test]
    async fn single_401_is_healed_by_one_retry() {
        let (transport, adapter, refresher) = setup(false).await;
        transport.respond(Method::GET, "/users/profile", 401, json!({"message": "jwt expired"}));
        transport.respond(Method::GET, "/users/profile", 200, json!({"id": 1}));

        let profile: serde_json::Value = adapter.get_path("/users/profile").await.unwrap();
        assert_eq!(profile, json!({"id": 1}));

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].bearer.as_deref(), Some("tok1"));
        assert_eq!(sent[1].bearer.as_deref(), Some("tok2"));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            adapter.credential.token().await.unwrap().expose_secret(),
            "tok2"
        );
    }

    #[tokio::test]
    async fn second_401_is_final() {
        let (transport, adapter, refresher) = setup(false).await;
        transport.respond(Method::GET, "/students", 401, json!({"message": "jwt expired"}));

        let err = adapter
            .get_path::<serde_json::Value>("/students")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(error::Api::Unauthorized { .. })));
        assert_eq!(transport.count(&Method::GET, "/students"), 2);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn auth_endpoints_never_refresh() {
        let (transport, adapter, refresher) = setup(false).await;
        transport.respond(
            Method::POST,
            "/auth/login",
            401,
            json!({"message": "Invalid credentials"}),
        );

        let err = adapter
            .post::<_, serde_json::Value>("/auth/login", &json!({"identifier": "a@b.com"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Api(error::Api::Unauthorized { ref message, .. }) if message == "Invalid credentials"
        ));
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_failure_replaces_the_401() {
        let (transport, adapter, _) = setup(true).await;
        transport.respond(Method::GET, "/payments", 401, json!({}));

        let err = adapter
            .get_path::<serde_json::Value>("/payments")
            .await
            .unwrap_err();
        assert!(err.is_session_expired());
        assert_eq!(transport.count(&Method::GET, "/payments"), 1);
    }

    #[tokio::test]
    async fn other_failures_pass_through() {
        let (transport, adapter, refresher) = setup(false).await;
        transport.respond(
            Method::POST,
            "/students",
            422,
            json!({"message": "Email is required"}),
        );
        transport.respond(Method::GET, "/fee-structures", 503, json!({}));
        transport.drop_connection(Method::GET, "/navigation");

        assert!(matches!(
            adapter.post::<_, serde_json::Value>("/students", &json!({})).await,
            Err(Error::Api(error::Api::Validation { ref message, .. })) if message == "Email is required"
        ));
        assert!(matches!(
            adapter.get_path::<serde_json::Value>("/fee-structures").await,
            Err(Error::Api(error::Api::Server { .. }))
        ));
        assert!(matches!(
            adapter.get_path::<serde_json::Value>("/navigation").await,
            Err(Error::Transport(error::Transport::Unreachable(_)))
        ));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rotated_token_is_reused_without_refreshing() {
        let transport = Arc::new(ScriptedTransport::new());
        let credential = Credential::new();
        credential.set(SecretString::new("tok1".to_owned())).await;
        let refresher = Arc::new(Rotating {
            credential: credential.clone(),
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let bound: Arc<dyn Refresh> = Arc::<Rotating>::clone(&refresher);
        credential.bind(bound);

        // A transport that rotates the token behind the adapter's back
        // before answering 401, as a concurrent refresh would.
        struct Racing {
            inner: Arc<ScriptedTransport>,
            credential: Credential,
        }

        #[async_trait]
        impl Transport for Racing {
            async fn send(&self, req: Request) -> Result<Response> {
                let resp = self.inner.send(req).await?;
                if resp.status() == StatusCode::UNAUTHORIZED {
                    self.credential
                        .set(SecretString::new("tok-other".to_owned()))
                        .await;
                }
                Ok(resp)
            }
        }

        transport.respond(Method::GET, "/students", 401, json!({}));
        transport.respond(Method::GET, "/students", 200, json!([]));
        let adapter = Adapter::new(
            Arc::new(Racing {
                inner: Arc::clone(&transport),
                credential: credential.clone(),
            }),
            credential,
        );

        let _: Vec<serde_json::Value> = adapter.get_path("/students").await.unwrap();
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            transport.sent()[1].bearer.as_deref(),
            Some("tok-other")
        );
    }
}
