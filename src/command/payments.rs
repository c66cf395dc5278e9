// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::info;
use tabled::{settings::Style, Table};

use crate::{
    api::payments::Confirmation,
    error::Result,
    role::{Role, Section},
};

use super::Context;

#[derive(Debug, Subcommand)]
enum Action {
    /// List payments. Students only ever see their own.
    List {
        #[arg(long)]
        student: Option<String>,
    },
    /// Open a gateway order to pay (part of) an assigned fee.
    Order { student_fee: String, amount: f64 },
    /// Confirm a completed gateway payment.
    Verify {
        order: String,
        payment: String,
        signature: String,
    },
}

/// Record and review fee payments.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[command(subcommand)]
    action: Action,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let section = match ctx.authority.snapshot().user().map(|user| user.role) {
            Some(Role::Student) => Section::MyPayments,
            Some(Role::Admin | Role::Accountant) | None => Section::Payments,
        };
        let user = ctx.require(section)?;
        let payments = &ctx.api.payments;

        match self.action {
            Action::List { student } => {
                let student = match user.role {
                    Role::Student => Some(user.id.to_string()),
                    Role::Admin | Role::Accountant => student,
                };
                let found = payments.list(student.as_deref()).await?;
                if !found.is_empty() {
                    println!("{}", Table::new(&found).with(Style::rounded()));
                }
            }
            Action::Order {
                student_fee,
                amount,
            } => {
                let order = payments.create_order(&student_fee, amount).await?;
                info!("Opened payment order {}", order.order_id);
                println!("{}", Table::new([&order]).with(Style::rounded()));
            }
            Action::Verify {
                order,
                payment,
                signature,
            } => {
                let recorded = payments
                    .verify(&Confirmation {
                        order_id: order,
                        payment_id: payment,
                        signature,
                    })
                    .await?;
                println!("{}", Table::new([&recorded]).with(Style::rounded()));
            }
        }
        Ok(())
    }
}
