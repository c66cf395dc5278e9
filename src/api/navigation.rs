// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use tabled::Tabled;

use crate::{adapter::Adapter, error::Result};

const NAVIGATION: &str = "/navigation";

#[derive(Clone, Debug, Deserialize, PartialEq, Tabled)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MenuItem {
    #[tabled(rename = "Label")]
    pub(crate) label: String,
    #[tabled(rename = "Path")]
    pub(crate) path: String,
}

/// The menu the server builds for the caller's role.
#[derive(Clone)]
pub(crate) struct Navigation {
    adapter: Adapter,
}

impl Navigation {
    pub(crate) const fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    pub(crate) async fn menu(&self) -> Result<Vec<MenuItem>> {
        self.adapter.get_path(NAVIGATION).await
    }
}
