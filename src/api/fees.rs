// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{adapter::Adapter, error::Result};

use super::{display_amount, display_option, member_path};

const FEE_STRUCTURES: &str = "/fee-structures";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeeComponent {
    pub(crate) name: String,
    pub(crate) amount: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Tabled)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeeStructure {
    #[serde(alias = "_id")]
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Academic Year", display_with = "display_option")]
    pub(crate) academic_year: Option<String>,
    #[serde(rename = "class")]
    #[tabled(rename = "Class", display_with = "display_option")]
    pub(crate) class_name: Option<String>,
    #[serde(default)]
    #[tabled(skip)]
    pub(crate) components: Vec<FeeComponent>,
    #[serde(default)]
    #[tabled(rename = "Total", display_with("Self::display_total", self))]
    pub(crate) total_amount: f64,
    #[tabled(rename = "Due", display_with = "display_option")]
    pub(crate) due_date: Option<String>,
}

impl FeeStructure {
    /// The total, falling back to the sum of the components when the server
    /// leaves it out.
    pub(crate) fn total(&self) -> f64 {
        if self.total_amount > 0.0 {
            self.total_amount
        } else {
            self.components.iter().map(|c| c.amount).sum()
        }
    }

    fn display_total(&self) -> String {
        display_amount(&self.total())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewFeeStructure {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) academic_year: Option<String>,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub(crate) class_name: Option<String>,
    pub(crate) components: Vec<FeeComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) due_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Assignment<'a> {
    student_ids: &'a [String],
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct Assigned {
    pub(crate) assigned: usize,
}

#[derive(Clone)]
pub(crate) struct FeeStructures {
    adapter: Adapter,
}

impl FeeStructures {
    pub(crate) const fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    pub(crate) async fn list(&self) -> Result<Vec<FeeStructure>> {
        self.adapter.get_path(FEE_STRUCTURES).await
    }

    pub(crate) async fn get(&self, id: &str) -> Result<FeeStructure> {
        self.adapter
            .get_path(&member_path(FEE_STRUCTURES, id))
            .await
    }

    pub(crate) async fn create(&self, fee: &NewFeeStructure) -> Result<FeeStructure> {
        self.adapter.post(FEE_STRUCTURES, fee).await
    }

    pub(crate) async fn delete(&self, id: &str) -> Result<()> {
        self.adapter.delete(&member_path(FEE_STRUCTURES, id)).await
    }

    /// Assign a fee structure to a set of students.
    pub(crate) async fn assign(&self, id: &str, student_ids: &[String]) -> Result<Assigned> {
        self.adapter
            .post(
                &format!("{}/assign", member_path(FEE_STRUCTURES, id)),
                &Assignment { student_ids },
            )
            .await
    }
}
