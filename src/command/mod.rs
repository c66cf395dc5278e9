// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use log::error;

use crate::{
    api::Api,
    authority::Authority,
    error::{self, Result},
    role::Section,
    session::User,
};

pub(crate) mod dashboard;
pub(crate) mod fees;
pub(crate) mod payments;
pub(crate) mod profile;
pub(crate) mod students;
pub(crate) mod users;
pub(crate) mod whoami;

/// What a command gets to work with: the session and the resource clients
/// bound to it.
pub(crate) struct Context {
    pub(crate) authority: Authority,
    pub(crate) api: Api,
}

impl Context {
    /// The logged-in user, provided their role grants the given section.
    pub(crate) fn require(&self, section: Section) -> Result<User> {
        let user = self
            .authority
            .snapshot()
            .user()
            .cloned()
            .ok_or(error::Auth::NotAuthenticated)?;
        if user.role.permits(section) {
            Ok(user)
        } else {
            error!("{} accounts cannot use {}", user.role, section);
            Err(error::Error::Forbidden {
                role: user.role,
                section,
            })
        }
    }
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, ctx: &Context) -> Result<()>;
}
