// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use clap::ValueEnum;
use inflector::Inflector as _;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Admin,
    Accountant,
    Student,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.to_possible_value().ok_or(std::fmt::Error)?;
        write!(f, "{}", value.get_name().to_title_case())
    }
}

/// A part of the application a role may be allowed into.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Section {
    Students,
    FeeStructures,
    FeeAssignments,
    Payments,
    Users,
    Reports,
    MyFees,
    MyPayments,
    Profile,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{self:?}").to_title_case())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Dashboard {
    pub(crate) title: &'static str,
    pub(crate) home: &'static str,
    pub(crate) sections: &'static [Section],
}

impl Role {
    pub(crate) const fn dashboard(self) -> Dashboard {
        match self {
            Self::Admin => Dashboard {
                title: "Administration",
                home: "/admin/dashboard",
                sections: &[
                    Section::Students,
                    Section::FeeStructures,
                    Section::FeeAssignments,
                    Section::Payments,
                    Section::Users,
                    Section::Reports,
                    Section::Profile,
                ],
            },
            Self::Accountant => Dashboard {
                title: "Accounts",
                home: "/accountant/dashboard",
                sections: &[
                    Section::Students,
                    Section::FeeStructures,
                    Section::FeeAssignments,
                    Section::Payments,
                    Section::Reports,
                    Section::Profile,
                ],
            },
            Self::Student => Dashboard {
                title: "My Fees",
                home: "/student/dashboard",
                sections: &[Section::MyFees, Section::MyPayments, Section::Profile],
            },
        }
    }

    pub(crate) fn permits(self, section: Section) -> bool {
        self.dashboard().sections.contains(&section)
    }
}

#[cfg(test)]
mod tests {
    use serde_test::{assert_tokens, Token};

    use super::*;

    #[test]
    fn role_wire_names() {
        assert_tokens(
            &Role::Accountant,
            &[Token::UnitVariant {
                name: "Role",
                variant: "accountant",
            }],
        );
        assert_tokens(
            &Role::Admin,
            &[Token::UnitVariant {
                name: "Role",
                variant: "admin",
            }],
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(Role::Student.to_string(), "Student");
        assert_eq!(Section::FeeStructures.to_string(), "Fee Structures");
        assert_eq!(Section::MyPayments.to_string(), "My Payments");
    }

    #[test]
    fn students_only_see_their_own_fees() {
        assert!(Role::Student.permits(Section::MyFees));
        assert!(!Role::Student.permits(Section::Students));
        assert!(!Role::Student.permits(Section::FeeStructures));
    }

    #[test]
    fn only_admins_manage_users() {
        assert!(Role::Admin.permits(Section::Users));
        assert!(!Role::Accountant.permits(Section::Users));
        assert!(Role::Accountant.permits(Section::Payments));
    }

    #[test]
    fn every_role_lands_somewhere_distinct() {
        let homes: Vec<_> = Role::value_variants()
            .iter()
            .map(|role| role.dashboard().home)
            .collect();
        assert_eq!(
            homes,
            ["/admin/dashboard", "/accountant/dashboard", "/student/dashboard"]
        );
    }
}
