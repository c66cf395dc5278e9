// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::{debug, warn};

use crate::{
    authority::Authority,
    error::{self, Error, Result},
    password::{self, Prompt},
    session::User,
};

/// Ask for a password and log in, giving the user another go after each
/// rejection. The reason for the last rejection is shown with the next
/// prompt.
pub(crate) async fn sign_in<P: Prompt + ?Sized>(
    authority: &Authority,
    prompt: &P,
    identifier: &str,
    attempts: u32,
) -> Result<User> {
    let mut prompt_error: Option<String> = None;

    for attempt in 1..=attempts {
        let mut req = password::RequestBuilder::new(identifier);
        if let Some(ref error) = prompt_error {
            req = req.with_error(error);
        }

        let password = prompt
            .prompt(req.into_request())
            .await?
            .ok_or(error::Password::NoPrompt)?;

        match authority.login(identifier, &password).await {
            Ok(user) => return Ok(user),
            Err(Error::Auth(error::Auth::CredentialsRejected(message))) => {
                debug!("Login attempt {} of {} was rejected", attempt, attempts);
                prompt_error = Some(message);
            }
            Err(e) => return Err(e),
        }
    }

    warn!("Giving up after {} rejected login attempts", attempts);
    Err(error::Password::AttemptsExhausted(attempts).into())
}
