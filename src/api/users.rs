// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use reqwest::Method;

use crate::{adapter::Adapter, error::Result, role::Role, session::User, transport::Request};

const USERS: &str = "/users";
const PROFILE: &str = "/users/profile";

#[derive(Clone)]
pub(crate) struct Users {
    adapter: Adapter,
}

impl Users {
    pub(crate) const fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    pub(crate) async fn profile(&self) -> Result<User> {
        self.adapter.get_path(PROFILE).await
    }

    pub(crate) async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut req = Request::new(Method::GET, USERS);
        if let Some(role) = role {
            req = req.with_query("role", serde_json::to_value(role)?.as_str().unwrap_or_default());
        }
        self.adapter.get(req).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{credential::Credential, testing::ScriptedTransport};

    #[tokio::test]
    async fn list_filters_by_wire_role_name() {
        let transport = Arc::new(ScriptedTransport::new());
        let users = Users::new(Adapter::new(
            ScriptedTransport::handle(&transport),
            Credential::new(),
        ));
        transport.respond(
            Method::GET,
            USERS,
            200,
            json!([{"id": 7, "name": "Ledger", "email": "l@b.com", "role": "accountant"}]),
        );

        let found = users.list(Some(Role::Accountant)).await.unwrap();
        assert_eq!(found[0].role, Role::Accountant);
        assert_eq!(
            transport.sent()[0].query,
            [("role".to_owned(), "accountant".to_owned())]
        );
    }
}
