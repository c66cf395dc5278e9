// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! An in-memory transport that replays canned responses and records what
//! was sent.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret as _;

use crate::{
    error::{self, Result},
    transport::{Request, Response, Transport},
};

#[derive(Clone, Debug)]
enum Reply {
    Respond(StatusCode, serde_json::Value),
    Drop(String),
}

#[derive(Clone, Debug)]
struct Scripted {
    reply: Reply,
    delay: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Sent {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) bearer: Option<String>,
    pub(crate) body: Option<serde_json::Value>,
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The same transport behind the trait object adapters are built from.
    pub(crate) fn handle(this: &Arc<Self>) -> Arc<dyn Transport> {
        Arc::<Self>::clone(this)
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(scripted);
    }

    /// Queue a response for the next matching request. Replies are consumed
    /// in order; the last one for a route is repeated once the queue would
    /// otherwise run dry.
    pub(crate) fn respond(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.push(
            method,
            path,
            Scripted {
                reply: Reply::Respond(StatusCode::from_u16(status).unwrap(), body),
                delay: None,
            },
        );
    }

    pub(crate) fn respond_after(
        &self,
        delay: Duration,
        method: Method,
        path: &str,
        status: u16,
        body: serde_json::Value,
    ) {
        self.push(
            method,
            path,
            Scripted {
                reply: Reply::Respond(StatusCode::from_u16(status).unwrap(), body),
                delay: Some(delay),
            },
        );
    }

    /// Make the next matching request fail without any response.
    pub(crate) fn drop_connection(&self, method: Method, path: &str) {
        self.push(
            method,
            path,
            Scripted {
                reply: Reply::Drop("connection refused".to_owned()),
                delay: None,
            },
        );
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: &Method, path: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|sent| &sent.method == method && sent.path == path)
            .count()
    }

    fn next(&self, method: &Method, path: &str) -> Option<Scripted> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(&(method.clone(), path.to_owned()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, req: Request) -> Result<Response> {
        self.sent.lock().unwrap().push(Sent {
            method: req.method().clone(),
            path: req.path().to_owned(),
            query: req.query().to_vec(),
            bearer: req.bearer().map(|token| token.expose_secret().clone()),
            body: req.body().cloned(),
        });

        let scripted = self.next(req.method(), req.path());
        if let Some(delay) = scripted.as_ref().and_then(|s| s.delay) {
            tokio::time::sleep(delay).await;
        }

        match scripted.map(|s| s.reply) {
            Some(Reply::Respond(status, body)) => Ok(Response::new(
                status,
                if body.is_null() {
                    vec![]
                } else {
                    serde_json::to_vec(&body)?
                },
            )),
            Some(Reply::Drop(reason)) => Err(error::Transport::Unreachable(reason).into()),
            None => Ok(Response::new(
                StatusCode::NOT_FOUND,
                serde_json::to_vec(&serde_json::json!({"message": "no such route"}))?,
            )),
        }
    }
}
