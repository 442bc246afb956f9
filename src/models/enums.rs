//! Closed value sets shared by users, live reports and the fake-report archive.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Campus department. Doubles as the report category: a new report is routed
/// to the department matching its category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Department {
    #[sea_orm(string_value = "road")]
    Road,
    #[sea_orm(string_value = "electric")]
    Electric,
    #[sea_orm(string_value = "water")]
    Water,
    #[sea_orm(string_value = "building")]
    Building,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::Road,
        Department::Electric,
        Department::Water,
        Department::Building,
        Department::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Road => "road",
            Department::Electric => "electric",
            Department::Water => "water",
            Department::Building => "building",
            Department::Other => "other",
        }
    }
}

/// Lifecycle position of a report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    /// Only ever stored on archive rows.
    #[sea_orm(string_value = "fake")]
    Fake,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Verified => "verified",
            ReportStatus::Assigned => "assigned",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Fake => "fake",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "maintainer")]
    Maintainer,
    #[sea_orm(string_value = "field_head")]
    FieldHead,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Maintainer => "maintainer",
            Role::FieldHead => "field_head",
        }
    }

    /// Staff roles act on behalf of a department and must have one.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Maintainer | Role::FieldHead)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

macro_rules! impl_str_conversions {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_str_conversions!(
    Department,
    "department",
    [
        Department::Road,
        Department::Electric,
        Department::Water,
        Department::Building,
        Department::Other,
    ]
);

impl_str_conversions!(
    ReportStatus,
    "status",
    [
        ReportStatus::Pending,
        ReportStatus::Verified,
        ReportStatus::Assigned,
        ReportStatus::InProgress,
        ReportStatus::Resolved,
        ReportStatus::Fake,
    ]
);

impl_str_conversions!(
    Role,
    "role",
    [Role::User, Role::Maintainer, Role::FieldHead]
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("water".parse::<Department>().unwrap(), Department::Water);
        assert_eq!(
            "in_progress".parse::<ReportStatus>().unwrap(),
            ReportStatus::InProgress
        );
        assert_eq!("field_head".parse::<Role>().unwrap(), Role::FieldHead);
    }

    #[test]
    fn rejects_unknown_values() {
        let err = "plumbing".parse::<Department>().unwrap_err();
        assert_eq!(err.to_string(), "invalid department 'plumbing'");
        assert!("admin".parse::<Role>().is_err());
        assert!("InProgress".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn serde_matches_display() {
        for dept in Department::ALL {
            let json = serde_json::to_value(dept).unwrap();
            assert_eq!(json, dept.to_string());
        }
        let json = serde_json::to_value(ReportStatus::InProgress).unwrap();
        assert_eq!(json, "in_progress");
    }

    #[test]
    fn only_maintainers_and_field_heads_are_staff() {
        assert!(!Role::User.is_staff());
        assert!(Role::Maintainer.is_staff());
        assert!(Role::FieldHead.is_staff());
    }
}
