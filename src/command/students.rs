// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::info;
use tabled::{settings::Style, Table};

use crate::{api::students::NewStudent, error::Result, role::Section};

use super::Context;

#[derive(Debug, clap::Args)]
struct Details {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    student_id: Option<String>,
    #[arg(long = "class")]
    class_name: Option<String>,
    #[arg(long)]
    section: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

impl From<Details> for NewStudent {
    fn from(details: Details) -> Self {
        Self {
            name: details.name,
            email: details.email,
            student_id: details.student_id,
            class_name: details.class_name,
            section: details.section,
            phone: details.phone,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Action {
    /// List students, optionally matching a search string.
    List {
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Show a single student.
    Show { id: String },
    /// Register a new student.
    Add {
        #[command(flatten)]
        details: Details,
    },
    /// Replace a student's details.
    Edit {
        id: String,
        #[command(flatten)]
        details: Details,
    },
    /// Remove a student record.
    Remove { id: String },
    /// Show the fees assigned to a student.
    Fees { id: String },
}

/// Manage student records.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[command(subcommand)]
    action: Action,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let _ = ctx.require(Section::Students)?;
        let students = &ctx.api.students;

        match self.action {
            Action::List { search } => {
                let found = students.list(search.as_deref()).await?;
                if !found.is_empty() {
                    println!("{}", Table::new(&found).with(Style::rounded()));
                }
            }
            Action::Show { id } => {
                let student = students.get(&id).await?;
                println!("{}", Table::new([&student]).with(Style::rounded()));
            }
            Action::Add { details } => {
                let created = students.create(&details.into()).await?;
                info!("Registered student {}", created.id);
                println!("{}", Table::new([&created]).with(Style::rounded()));
            }
            Action::Edit { id, details } => {
                let updated = students.update(&id, &details.into()).await?;
                info!("Updated student {}", updated.id);
                println!("{}", Table::new([&updated]).with(Style::rounded()));
            }
            Action::Remove { id } => {
                students.delete(&id).await?;
                info!("Removed student {}", id);
            }
            Action::Fees { id } => {
                let fees = students.fees(&id).await?;
                if !fees.is_empty() {
                    println!("{}", Table::new(&fees).with(Style::rounded()));
                    let outstanding: f64 = fees.iter().map(|fee| fee.outstanding()).sum();
                    println!("Outstanding: {outstanding:.2}");
                }
            }
        }
        Ok(())
    }
}
