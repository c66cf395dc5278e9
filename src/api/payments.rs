// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{adapter::Adapter, error::Result, transport::Request};

use super::{display_amount, display_option};

const PAYMENTS: &str = "/payments";
const ORDERS: &str = "/payments/orders";
const VERIFY: &str = "/payments/verify";

#[derive(Clone, Debug, Deserialize, PartialEq, Tabled)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Payment {
    #[serde(alias = "_id")]
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Student", display_with = "display_option")]
    pub(crate) student_id: Option<String>,
    #[tabled(rename = "Amount", display_with = "display_amount")]
    pub(crate) amount: f64,
    #[tabled(rename = "Status")]
    pub(crate) status: String,
    #[tabled(rename = "Reference", display_with = "display_option")]
    pub(crate) payment_id: Option<String>,
    #[tabled(rename = "Date", display_with = "display_option")]
    pub(crate) created_at: Option<String>,
}

/// An order opened with the payment gateway, to be completed by the payer.
#[derive(Clone, Debug, Deserialize, PartialEq, Tabled)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentOrder {
    #[tabled(rename = "Order")]
    pub(crate) order_id: String,
    #[tabled(rename = "Amount", display_with = "display_amount")]
    pub(crate) amount: f64,
    #[tabled(rename = "Currency")]
    pub(crate) currency: String,
    #[tabled(rename = "Gateway Key", display_with = "display_option")]
    pub(crate) key_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest<'a> {
    student_fee_id: &'a str,
    amount: f64,
}

/// What the gateway hands back to the payer once a payment completes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Confirmation {
    pub(crate) order_id: String,
    pub(crate) payment_id: String,
    pub(crate) signature: String,
}

#[derive(Clone)]
pub(crate) struct Payments {
    adapter: Adapter,
}

impl Payments {
    pub(crate) const fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    pub(crate) async fn list(&self, student_id: Option<&str>) -> Result<Vec<Payment>> {
        let mut req = Request::new(Method::GET, PAYMENTS);
        if let Some(student_id) = student_id {
            req = req.with_query("studentId", student_id);
        }
        self.adapter.get(req).await
    }

    pub(crate) async fn create_order(&self, student_fee_id: &str, amount: f64) -> Result<PaymentOrder> {
        self.adapter
            .post(
                ORDERS,
                &OrderRequest {
                    student_fee_id,
                    amount,
                },
            )
            .await
    }

    pub(crate) async fn verify(&self, confirmation: &Confirmation) -> Result<Payment> {
        self.adapter.post(VERIFY, confirmation).await
    }
}
