// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table};

use crate::{error::Result, role::Section};

use super::Context;

/// Show who is logged in.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Ask the server for the current profile instead of using the one from
    /// login.
    #[arg(long)]
    fresh: bool,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let mut user = ctx.require(Section::Profile)?;
        if self.fresh {
            user = ctx.api.users.profile().await?;
        }

        println!("{}", Table::new([&user]).with(Style::rounded()));
        for (key, value) in &user.details {
            println!("{key}: {value}");
        }
        Ok(())
    }
}
