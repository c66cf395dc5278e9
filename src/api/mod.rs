// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Typed clients for each group of backend resources. Each one sits on its
//! own [`Adapter`], all sharing the session's credential.

pub(crate) mod fees;
pub(crate) mod navigation;
pub(crate) mod payments;
pub(crate) mod students;
pub(crate) mod users;

use std::sync::Arc;

use crate::{adapter::Adapter, credential::Credential, transport::Transport};

#[derive(Clone)]
pub(crate) struct Api {
    pub(crate) students: students::Students,
    pub(crate) fees: fees::FeeStructures,
    pub(crate) payments: payments::Payments,
    pub(crate) users: users::Users,
    pub(crate) navigation: navigation::Navigation,
}

impl Api {
    pub(crate) fn new(transport: &Arc<dyn Transport>, credential: &Credential) -> Self {
        let adapter = || Adapter::new(Arc::clone(transport), credential.clone());
        Self {
            students: students::Students::new(adapter()),
            fees: fees::FeeStructures::new(adapter()),
            payments: payments::Payments::new(adapter()),
            users: users::Users::new(adapter()),
            navigation: navigation::Navigation::new(adapter()),
        }
    }
}

/// Join a collection path and an identifier, escaping the identifier.
pub(crate) fn member_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(id))
}

pub(crate) fn display_option<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(String::new, ToString::to_string)
}

pub(crate) fn display_amount(value: &f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_path_escapes_identifier() {
        assert_eq!(member_path("/students", "S-001"), "/students/S-001");
        assert_eq!(member_path("/students", "a/b c"), "/students/a%2Fb%20c");
    }

    #[test]
    fn display_helpers() {
        assert_eq!(display_option::<String>(&None), "");
        assert_eq!(display_option(&Some(3)), "3");
        assert_eq!(display_amount(&1250.5), "1250.50");
    }
}
