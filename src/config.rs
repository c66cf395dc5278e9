// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use url::Url;

pub(crate) const DEFAULT_URL: &str = "http://127.0.0.1:5000/api/";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_LOGIN_ATTEMPTS: u32 = 3;

/// Settings shared by the transport and the session authority.
#[derive(Clone, Debug)]
pub(crate) struct Config {
    base_url: Url,
    request_timeout: Duration,
    refresh_timeout: Duration,
    login_attempts: u32,
}

impl Config {
    pub(crate) fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            refresh_timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
            login_attempts: DEFAULT_LOGIN_ATTEMPTS,
        }
    }

    pub(crate) const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The refresh exchange never gets more time than an ordinary request.
    pub(crate) fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout.min(self.request_timeout);
        self
    }

    pub(crate) fn with_login_attempts(mut self, attempts: u32) -> Self {
        self.login_attempts = attempts.max(1);
        self
    }

    pub(crate) const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub(crate) const fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    pub(crate) const fn login_attempts(&self) -> u32 {
        self.login_attempts
    }
}

impl Default for Config {
    fn default() -> Self {
        // LINT: The default is a literal that always parses.
        #[allow(clippy::expect_used)]
        Self::new(Url::parse(DEFAULT_URL).expect("default URL is valid"))
    }
}
