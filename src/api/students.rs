// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{adapter::Adapter, error::Result, transport::Request};

use super::{display_amount, display_option, member_path};

const STUDENTS: &str = "/students";

#[derive(Clone, Debug, Deserialize, PartialEq, Tabled)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Student {
    #[serde(alias = "_id")]
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Student ID", display_with = "display_option")]
    pub(crate) student_id: Option<String>,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Email")]
    pub(crate) email: String,
    #[serde(rename = "class")]
    #[tabled(rename = "Class", display_with = "display_option")]
    pub(crate) class_name: Option<String>,
    #[tabled(rename = "Section", display_with = "display_option")]
    pub(crate) section: Option<String>,
    #[tabled(skip)]
    pub(crate) phone: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewStudent {
    pub(crate) name: String,
    pub(crate) email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) student_id: Option<String>,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub(crate) class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) phone: Option<String>,
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FeeStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl std::fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            Self::Pending => "Pending",
            Self::Partial => "Partially paid",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
        };
        write!(f, "{name}")
    }
}

/// A fee structure as it applies to one student.
#[derive(Clone, Debug, Deserialize, PartialEq, Tabled)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentFee {
    #[serde(alias = "_id")]
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Fee")]
    pub(crate) fee_name: String,
    #[tabled(rename = "Amount", display_with = "display_amount")]
    pub(crate) amount: f64,
    #[serde(default)]
    #[tabled(rename = "Paid", display_with = "display_amount")]
    pub(crate) paid_amount: f64,
    #[tabled(rename = "Due", display_with = "display_option")]
    pub(crate) due_date: Option<String>,
    #[tabled(rename = "Status")]
    pub(crate) status: FeeStatus,
}

impl StudentFee {
    pub(crate) fn outstanding(&self) -> f64 {
        (self.amount - self.paid_amount).max(0.0)
    }
}

#[derive(Clone)]
pub(crate) struct Students {
    adapter: Adapter,
}

impl Students {
    pub(crate) const fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    pub(crate) async fn list(&self, search: Option<&str>) -> Result<Vec<Student>> {
        let mut req = Request::new(Method::GET, STUDENTS);
        if let Some(search) = search {
            req = req.with_query("search", search);
        }
        self.adapter.get(req).await
    }

    pub(crate) async fn get(&self, id: &str) -> Result<Student> {
        self.adapter.get_path(&member_path(STUDENTS, id)).await
    }

    pub(crate) async fn create(&self, student: &NewStudent) -> Result<Student> {
        self.adapter.post(STUDENTS, student).await
    }

    pub(crate) async fn update(&self, id: &str, student: &NewStudent) -> Result<Student> {
        self.adapter.put(&member_path(STUDENTS, id), student).await
    }

    pub(crate) async fn delete(&self, id: &str) -> Result<()> {
        self.adapter.delete(&member_path(STUDENTS, id)).await
    }

    pub(crate) async fn fees(&self, id: &str) -> Result<Vec<StudentFee>> {
        self.adapter
            .get_path(&format!("{}/fees", member_path(STUDENTS, id)))
            .await
    }
}
