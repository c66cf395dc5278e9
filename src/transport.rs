// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The low-level HTTP transport shared by every adapter.
//!
//! A transport only moves bytes: it reports a response for any status the
//! server sends back and fails only when no response arrived. Interpreting
//! statuses is left to [`Response::error_for_status`].

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{header, Method, StatusCode};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use crate::{
    config::Config,
    error::{self, Result},
    metadata,
};

#[derive(Clone, Debug)]
pub(crate) struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    bearer: Option<SecretString>,
}

impl Request {
    pub(crate) fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            query: vec![],
            body: None,
            bearer: None,
        }
    }

    pub(crate) fn with_query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub(crate) fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn with_bearer(mut self, bearer: Option<SecretString>) -> Self {
        self.bearer = bearer;
        self
    }

    pub(crate) const fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub(crate) const fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub(crate) const fn bearer(&self) -> Option<&SecretString> {
        self.bearer.as_ref()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Response {
    status: StatusCode,
    body: Vec<u8>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: Option<String>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

impl Response {
    pub(crate) fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub(crate) const fn status(&self) -> StatusCode {
        self.status
    }

    /// The human-readable failure message the server put in the body, if any.
    pub(crate) fn message(&self) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.is_empty())
    }

    pub(crate) fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(error::Api::from_status(self.status, self.message()).into())
        }
    }

    /// Decode the body, looking through a `{"data": ...}` envelope when the
    /// server wraps its payload in one.
    pub(crate) fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match serde_json::from_slice::<T>(&self.body) {
            Ok(value) => Ok(value),
            Err(e) => serde_json::from_slice::<Envelope<T>>(&self.body)
                .map(|envelope| envelope.data)
                .map_err(|_| e.into()),
        }
    }
}

#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, req: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, req: Request) -> Result<Response> {
        (**self).send(req).await
    }
}

/// A reqwest client bound to one backend. The cookie store keeps the
/// refresh cookie the server sets for as long as the process lives.
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .user_agent(metadata::USER_AGENT.as_str())
            .build()?;

        Ok(Self {
            client,
            base: normalize_base(config.base_url().clone()),
            timeout: config.request_timeout(),
        })
    }
}

fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn endpoint_url(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url> {
    let mut url = base.join(path.trim_start_matches('/'))?;
    if !query.is_empty() {
        let _ = url
            .query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: Request) -> Result<Response> {
        let url = endpoint_url(&self.base, req.path(), req.query())?;
        debug!("Sending {} {}", req.method(), url);

        let mut builder = self
            .client
            .request(req.method().clone(), url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = req.bearer() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = req.body() {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| self.classify(e))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| self.classify(e))?;
        debug!("Received {} for {} {}", status, req.method(), req.path());

        Ok(Response::new(status, body.to_vec()))
    }
}

impl HttpTransport {
    fn classify(&self, e: reqwest::Error) -> error::Error {
        if e.is_timeout() {
            error::Transport::Timeout(self.timeout).into()
        } else if e.is_connect() {
            error::Transport::Unreachable(e.to_string()).into()
        } else {
            error::Transport::Http(e).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let base = normalize_base(Url::parse("https://fees.example.edu/api").unwrap());
        assert_eq!(base.as_str(), "https://fees.example.edu/api/");

        let base = normalize_base(Url::parse("https://fees.example.edu/api/").unwrap());
        assert_eq!(base.as_str(), "https://fees.example.edu/api/");
    }

    #[test]
    fn endpoint_keeps_base_path_and_appends_query() {
        let base = normalize_base(Url::parse("https://fees.example.edu/api").unwrap());
        let url = endpoint_url(
            &base,
            "/students",
            &[("search".to_owned(), "ada lovelace".to_owned())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://fees.example.edu/api/students?search=ada+lovelace"
        );
    }

    #[test]
    fn message_is_read_from_either_key() {
        let resp = Response::new(
            StatusCode::BAD_REQUEST,
            br#"{"message":"Email already registered"}"#.to_vec(),
        );
        assert_eq!(resp.message().as_deref(), Some("Email already registered"));

        let resp = Response::new(StatusCode::BAD_REQUEST, br#"{"error":"Bad class"}"#.to_vec());
        assert_eq!(resp.message().as_deref(), Some("Bad class"));

        let resp = Response::new(StatusCode::BAD_GATEWAY, b"<html>oops</html>".to_vec());
        assert_eq!(resp.message(), None);
    }

    #[test]
    fn json_looks_through_data_envelope() {
        let resp = Response::new(StatusCode::OK, br#"{"data":[1,2,3]}"#.to_vec());
        assert_eq!(resp.json::<Vec<u32>>().unwrap(), vec![1, 2, 3]);

        let resp = Response::new(StatusCode::OK, br#"[4,5]"#.to_vec());
        assert_eq!(resp.json::<Vec<u32>>().unwrap(), vec![4, 5]);
    }

    #[test]
    fn error_for_status_keeps_server_message() {
        let resp = Response::new(
            StatusCode::CONFLICT,
            br#"{"message":"Fee already assigned"}"#.to_vec(),
        );
        match resp.error_for_status() {
            Err(error::Error::Api(error::Api::Validation { status, message })) => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(message, "Fee already assigned");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = Config::new(Url::parse(&format!("http://127.0.0.1:{port}/api/")).unwrap());
        let transport = HttpTransport::new(&config).unwrap();

        let outcome = transport.send(Request::new(Method::GET, "/students")).await;
        assert!(matches!(
            outcome,
            Err(error::Error::Transport(error::Transport::Unreachable(_)))
        ));
    }
}
