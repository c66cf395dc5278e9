// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::{error, info};
use tabled::{settings::Style, Table};

use crate::{
    error::{self, Result},
    role::Section,
    session::ProfileUpdate,
};

use super::Context;

/// Update the logged-in user's profile.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let _ = ctx.require(Section::Profile)?;
        let update = ProfileUpdate {
            name: self.name,
            email: self.email,
            phone: self.phone,
        };
        if update.is_empty() {
            error!("Nothing to update; pass at least one of --name, --email or --phone");
            return Err(error::Error::Command);
        }

        let user = ctx.authority.update_profile(&update).await?;
        info!("Updated profile for {}", user.email);
        println!("{}", Table::new([&user]).with(Style::rounded()));
        Ok(())
    }
}
