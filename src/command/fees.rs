// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::{error, info};
use tabled::{settings::Style, Table};

use crate::{
    api::fees::{FeeComponent, NewFeeStructure},
    error::{self, Result},
    role::Section,
};

use super::Context;

#[derive(Debug, Subcommand)]
enum Action {
    /// List the configured fee structures.
    List,
    /// Show a fee structure with its components.
    Show { id: String },
    /// Define a new fee structure.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        academic_year: Option<String>,
        #[arg(long = "class")]
        class_name: Option<String>,
        #[arg(long)]
        due_date: Option<String>,
        /// A component of the fee, as NAME=AMOUNT. Repeat for each one.
        #[arg(long = "component", required = true, value_parser = parse_component)]
        components: Vec<FeeComponent>,
    },
    /// Delete a fee structure.
    Remove { id: String },
    /// Assign a fee structure to one or more students.
    Assign {
        id: String,
        #[arg(required = true)]
        students: Vec<String>,
    },
    /// Show the logged-in student's own fees.
    Mine,
}

fn parse_component(value: &str) -> Result<FeeComponent, String> {
    let (name, amount) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got {value:?}"))?;
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount {amount:?}: {e}"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount must be a non-negative number, got {amount}"));
    }
    Ok(FeeComponent {
        name: name.trim().to_owned(),
        amount,
    })
}

/// Work with fee structures and assignments.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[command(subcommand)]
    action: Action,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let fees = &ctx.api.fees;

        match self.action {
            Action::List => {
                let _ = ctx.require(Section::FeeStructures)?;
                let structures = fees.list().await?;
                if !structures.is_empty() {
                    println!("{}", Table::new(&structures).with(Style::rounded()));
                }
            }
            Action::Show { id } => {
                let _ = ctx.require(Section::FeeStructures)?;
                let structure = fees.get(&id).await?;
                println!("{}", Table::new([&structure]).with(Style::rounded()));
                for component in &structure.components {
                    println!("  {}: {:.2}", component.name, component.amount);
                }
                println!("Total: {:.2}", structure.total());
            }
            Action::Add {
                name,
                academic_year,
                class_name,
                due_date,
                components,
            } => {
                let _ = ctx.require(Section::FeeStructures)?;
                let created = fees
                    .create(&NewFeeStructure {
                        name,
                        academic_year,
                        class_name,
                        components,
                        due_date,
                    })
                    .await?;
                info!("Created fee structure {}", created.id);
                println!("{}", Table::new([&created]).with(Style::rounded()));
            }
            Action::Remove { id } => {
                let _ = ctx.require(Section::FeeStructures)?;
                fees.delete(&id).await?;
                info!("Removed fee structure {}", id);
            }
            Action::Assign { id, students } => {
                let _ = ctx.require(Section::FeeAssignments)?;
                let assigned = fees.assign(&id, &students).await?;
                if assigned.assigned < students.len() {
                    error!(
                        "Only {} of {} students were assigned fee structure {}",
                        assigned.assigned,
                        students.len(),
                        id
                    );
                    return Err(error::Error::Command);
                }
                info!("Assigned fee structure {} to {} students", id, assigned.assigned);
            }
            Action::Mine => {
                let user = ctx.require(Section::MyFees)?;
                let mine = ctx.api.students.fees(&user.id.to_string()).await?;
                if !mine.is_empty() {
                    println!("{}", Table::new(&mine).with(Style::rounded()));
                }
            }
        }
        Ok(())
    }
}
