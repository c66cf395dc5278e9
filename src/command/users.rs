// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table};

use crate::{
    error::Result,
    role::{Role, Section},
};

use super::Context;

/// List user accounts.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Only list accounts with this role.
    #[arg(long, value_enum)]
    role: Option<Role>,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let _ = ctx.require(Section::Users)?;
        let users = ctx.api.users.list(self.role).await?;
        if !users.is_empty() {
            println!("{}", Table::new(&users).with(Style::rounded()));
        }
        Ok(())
    }
}
