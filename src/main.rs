// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod adapter;
mod api;
mod authority;
mod command;
mod config;
mod credential;
mod error;
mod metadata;
mod password;
mod role;
mod session;
mod signin;
#[cfg(test)]
mod testing;
mod transport;

use std::{path::PathBuf, process, sync::Arc, time::Duration};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use error::Result;
use log::{debug, error, info};
use url::Url;

use crate::{
    api::Api,
    authority::Authority,
    command::Context,
    config::Config,
    session::Phase,
    transport::{HttpTransport, Transport},
};

#[derive(Debug, Subcommand)]
enum Command {
    Whoami(command::whoami::Command),
    Dashboard(command::dashboard::Command),
    Students(command::students::Command),
    Fees(command::fees::Command),
    Payments(command::payments::Command),
    Profile(command::profile::Command),
    Users(command::users::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Whoami(cmd) => cmd.execute(ctx).await,
            Self::Dashboard(cmd) => cmd.execute(ctx).await,
            Self::Students(cmd) => cmd.execute(ctx).await,
            Self::Fees(cmd) => cmd.execute(ctx).await,
            Self::Payments(cmd) => cmd.execute(ctx).await,
            Self::Profile(cmd) => cmd.execute(ctx).await,
            Self::Users(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the SmartFee API.
    #[arg(long, env = "SMARTFEE_URL", default_value = config::DEFAULT_URL, value_parser = Url::parse)]
    url: Url,

    /// The email address or student ID to log in with when there is no
    /// session to resume.
    #[arg(long, short, env = "SMARTFEE_IDENTIFIER")]
    identifier: Option<String>,

    /// How long to wait for any single API request, in seconds.
    #[arg(long, default_value_t = config::DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout: u64,

    /// How long to wait for a token refresh, in seconds.
    #[arg(long, default_value_t = config::DEFAULT_REFRESH_TIMEOUT_SECS)]
    refresh_timeout: u64,

    /// How many times to ask for the password before giving up.
    #[arg(long, default_value_t = config::DEFAULT_LOGIN_ATTEMPTS)]
    login_attempts: u32,

    /// The path to the Pinentry program to use when asking for the login
    /// password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    /// Keep the server-side session alive after the command finishes.
    #[arg(long)]
    no_logout: bool,

    #[clap(subcommand)]
    command: Command,
}

impl Args {
    fn config(&self) -> Config {
        Config::new(self.url.clone())
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_refresh_timeout(Duration::from_secs(self.refresh_timeout))
            .with_login_attempts(self.login_attempts)
    }
}

/// Trace every session transition until the authority goes away.
fn watch_session(authority: &Authority) {
    let mut changes = authority.subscribe();
    let _watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let session = changes.borrow_and_update().clone();
            debug!(
                "Session changed: initialized={} loading={} authenticated={} token={} attempts={}",
                session.is_initialized(),
                session.is_loading(),
                session.is_authenticated(),
                session.access_token().is_some(),
                session.login_attempts()
            );
            if let Some(error) = session.error() {
                debug!("Last session error: {}", error);
            }
        }
    });
}

async fn run(args: Args) -> Result<()> {
    let config = args.config();
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
    let authority = Authority::new(Arc::clone(&transport), &config);
    watch_session(&authority);

    if authority.initialize().await != Phase::Authenticated {
        let Some(identifier) = args.identifier.as_deref() else {
            error!("Nobody is logged in; pass --identifier or set SMARTFEE_IDENTIFIER to log in");
            return Err(error::Error::Command);
        };

        let prompt: Vec<Box<dyn password::Prompt>> = vec![
            Box::new(args.pinentry_program.clone().map_or_else(
                password::PinentryPrompt::new,
                password::PinentryPrompt::new_with_executable,
            )),
            Box::new(password::RpasswordPrompt),
        ];
        let user =
            signin::sign_in(&authority, &prompt, identifier, config.login_attempts()).await?;
        info!("Landing on {}", user.role.dashboard().home);
    }

    let ctx = Context {
        api: Api::new(&transport, &authority.credential()),
        authority,
    };
    let result = command::Command::execute(args.command, &ctx).await;

    if !args.no_logout {
        ctx.authority.logout().await;
    }

    result
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("SMARTFEE_LOG", "warn")
        .write_style("SMARTFEE_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn config_follows_flags() {
        let args = Args::parse_from([
            "smartfee",
            "--url",
            "https://fees.example.edu/api",
            "--refresh-timeout",
            "5",
            "whoami",
        ]);
        let config = args.config();
        assert_eq!(config.base_url().as_str(), "https://fees.example.edu/api");
        assert_eq!(config.refresh_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.request_timeout(),
            Duration::from_secs(config::DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert!(matches!(args.command, Command::Whoami(_)));
    }
}
