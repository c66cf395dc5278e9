// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::warn;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    error::{self, Result},
    role::Section,
};

use super::Context;

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Section")]
    section: Section,
}

/// Show the dashboard for the logged-in user's role.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Also show the navigation menu the server offers.
    #[arg(long)]
    menu: bool,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let user = ctx
            .authority
            .snapshot()
            .user()
            .cloned()
            .ok_or(error::Auth::NotAuthenticated)?;
        let dashboard = user.role.dashboard();

        println!("{} ({})", dashboard.title, dashboard.home);
        println!(
            "{}",
            Table::new(dashboard.sections.iter().map(|&section| Row { section }))
                .with(Style::rounded())
        );

        if self.menu {
            match ctx.api.navigation.menu().await {
                Ok(items) if !items.is_empty() => {
                    println!("{}", Table::new(items).with(Style::rounded()));
                }
                Ok(_) => {}
                Err(e) if e.is_session_expired() => return Err(e),
                Err(e) => warn!("The server did not send a navigation menu: {}", e),
            }
        }
        Ok(())
    }
}
