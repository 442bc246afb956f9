//! Access policy for reports.
//!
//! Every role/department decision the report endpoints make goes through this
//! module. The functions are pure: they map an actor plus the filters a request
//! asked for onto a [`ReportScope`] (or a denial), and the storage layer turns
//! that scope into a query.

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Department, ReportStatus, Role};
use std::str::FromStr;

/// Statuses a maintainer works on and sees by default.
pub const MAINTAINER_QUEUE: [ReportStatus; 3] = [
    ReportStatus::Assigned,
    ReportStatus::Verified,
    ReportStatus::InProgress,
];

/// Named views a client may request instead of a raw status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    /// The field head's verification queue (pending only).
    VerifySection,
}

impl FromStr for ReportView {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "verify_section" => Ok(ReportView::VerifySection),
            other => Err(AppError::Validation(format!("invalid view '{other}'"))),
        }
    }
}

/// Filters as requested by the client, already parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub status: Option<ReportStatus>,
    pub view: Option<ReportView>,
    pub category: Option<Department>,
    pub department: Option<Department>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    Any,
    Only(ReportStatus),
    AnyOf(Vec<ReportStatus>),
    Except(ReportStatus),
    /// Matches nothing in the live set.
    Never,
}

/// A validated description of which live reports a query may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportScope {
    pub reporter_id: Option<i32>,
    pub department: Option<Department>,
    pub category: Option<Department>,
    pub status: StatusFilter,
}

impl ReportScope {
    pub fn is_empty(&self) -> bool {
        self.status == StatusFilter::Never
    }
}

/// Which rows the department history endpoint reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFilter {
    /// Live and archived rows together.
    All,
    /// Archived rows only.
    Fake,
    /// Live rows, optionally narrowed to one status.
    Live(Option<ReportStatus>),
}

impl HistoryFilter {
    pub fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(HistoryFilter::Live(None)),
            Some("all") => Ok(HistoryFilter::All),
            Some("fake") => Ok(HistoryFilter::Fake),
            Some(other) => other
                .parse::<ReportStatus>()
                .map(|s| HistoryFilter::Live(Some(s)))
                .map_err(|e| AppError::Validation(e.to_string())),
        }
    }
}

/// The department a staff actor acts for. Staff without one can act nowhere.
pub fn staff_department(actor: &AuthUser) -> AppResult<Department> {
    actor.department.ok_or(AppError::Forbidden)
}

pub fn require_role(actor: &AuthUser, role: Role) -> AppResult<()> {
    if actor.role == role {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Staff may only touch reports of their own department.
pub fn ensure_same_department(actor: &AuthUser, department: Department) -> AppResult<()> {
    if staff_department(actor)? == department {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Role-filtered listing for `GET /reports`.
pub fn list_scope(actor: &AuthUser, filters: &ListFilters) -> AppResult<ReportScope> {
    match actor.role {
        Role::User => Ok(ReportScope {
            reporter_id: Some(actor.user_id),
            department: filters.department,
            category: filters.category,
            status: match filters.status {
                Some(ReportStatus::Fake) => StatusFilter::Never,
                Some(status) => StatusFilter::Only(status),
                None => StatusFilter::Except(ReportStatus::Fake),
            },
        }),
        Role::FieldHead => {
            let department = own_department_filter(actor, filters.department)?;
            let status = if filters.view == Some(ReportView::VerifySection) {
                StatusFilter::Only(ReportStatus::Pending)
            } else {
                match filters.status {
                    // Fakes live in the archive and are read through the history view.
                    Some(ReportStatus::Fake) => StatusFilter::Never,
                    Some(status) => StatusFilter::Only(status),
                    None => StatusFilter::Only(ReportStatus::Pending),
                }
            };
            Ok(ReportScope {
                reporter_id: None,
                department: Some(department),
                category: filters.category,
                status,
            })
        }
        Role::Maintainer => {
            let department = own_department_filter(actor, filters.department)?;
            let status = match filters.status {
                Some(ReportStatus::Fake) => StatusFilter::Never,
                Some(status) => StatusFilter::Only(status),
                None => StatusFilter::AnyOf(MAINTAINER_QUEUE.to_vec()),
            };
            Ok(ReportScope {
                reporter_id: None,
                department: Some(department),
                category: filters.category,
                status,
            })
        }
    }
}

/// Scope for `GET /reports/user/:id`. Users may only list their own reports;
/// staff see that reporter's reports within their own department.
pub fn reporter_scope(actor: &AuthUser, reporter_id: i32) -> AppResult<ReportScope> {
    let department = if actor.role.is_staff() {
        Some(staff_department(actor)?)
    } else if actor.user_id == reporter_id {
        None
    } else {
        return Err(AppError::Forbidden);
    };

    Ok(ReportScope {
        reporter_id: Some(reporter_id),
        department,
        category: None,
        status: StatusFilter::Except(ReportStatus::Fake),
    })
}

/// Gate for the field-head department endpoints. The path segment is compared
/// verbatim with the actor's department, so an unknown department is a 403
/// like any other foreign one.
pub fn department_access(actor: &AuthUser, requested: &str) -> AppResult<Department> {
    require_role(actor, Role::FieldHead)?;
    let own = staff_department(actor)?;
    if own.as_str() == requested.trim() {
        Ok(own)
    } else {
        Err(AppError::Forbidden)
    }
}

/// Reporters can always see their own report; staff see their department's.
pub fn can_view(actor: &AuthUser, reporter_id: i32, department: Department) -> bool {
    if actor.user_id == reporter_id {
        return true;
    }
    actor.role.is_staff() && actor.department == Some(department)
}

fn own_department_filter(
    actor: &AuthUser,
    requested: Option<Department>,
) -> AppResult<Department> {
    let own = staff_department(actor)?;
    match requested {
        Some(dept) if dept != own => Err(AppError::Forbidden),
        _ => Ok(own),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, department: Option<Department>) -> AuthUser {
        AuthUser {
            user_id: 7,
            name: "Asha".to_string(),
            role,
            department,
        }
    }

    #[test]
    fn user_sees_only_own_non_fake_reports() {
        let scope = list_scope(&actor(Role::User, None), &ListFilters::default()).unwrap();
        assert_eq!(scope.reporter_id, Some(7));
        assert_eq!(scope.department, None);
        assert_eq!(scope.status, StatusFilter::Except(ReportStatus::Fake));
    }

    #[test]
    fn user_status_filter_narrows() {
        let filters = ListFilters {
            status: Some(ReportStatus::Resolved),
            ..Default::default()
        };
        let scope = list_scope(&actor(Role::User, None), &filters).unwrap();
        assert_eq!(scope.status, StatusFilter::Only(ReportStatus::Resolved));
        assert_eq!(scope.reporter_id, Some(7));
    }

    #[test]
    fn field_head_defaults_to_pending_in_own_department() {
        let head = actor(Role::FieldHead, Some(Department::Water));
        let scope = list_scope(&head, &ListFilters::default()).unwrap();
        assert_eq!(scope.department, Some(Department::Water));
        assert_eq!(scope.reporter_id, None);
        assert_eq!(scope.status, StatusFilter::Only(ReportStatus::Pending));
    }

    #[test]
    fn verify_section_overrides_status() {
        let head = actor(Role::FieldHead, Some(Department::Road));
        let filters = ListFilters {
            status: Some(ReportStatus::Resolved),
            view: Some(ReportView::VerifySection),
            ..Default::default()
        };
        let scope = list_scope(&head, &filters).unwrap();
        assert_eq!(scope.status, StatusFilter::Only(ReportStatus::Pending));
    }

    #[test]
    fn fake_filter_is_always_empty_on_live_set() {
        let filters = ListFilters {
            status: Some(ReportStatus::Fake),
            ..Default::default()
        };
        for role in [Role::User, Role::FieldHead, Role::Maintainer] {
            let scope = list_scope(&actor(role, Some(Department::Water)), &filters).unwrap();
            assert!(scope.is_empty(), "{role:?} should get an empty scope");
        }
    }

    #[test]
    fn maintainer_default_queue_excludes_pending() {
        let maintainer = actor(Role::Maintainer, Some(Department::Electric));
        let scope = list_scope(&maintainer, &ListFilters::default()).unwrap();
        assert_eq!(scope.department, Some(Department::Electric));
        match scope.status {
            StatusFilter::AnyOf(statuses) => {
                assert!(!statuses.contains(&ReportStatus::Pending));
                assert!(!statuses.contains(&ReportStatus::Fake));
                assert_eq!(statuses.len(), 3);
            }
            other => panic!("unexpected filter {other:?}"),
        }
    }

    #[test]
    fn explicit_foreign_department_is_denied_for_staff() {
        let filters = ListFilters {
            department: Some(Department::Road),
            ..Default::default()
        };
        for role in [Role::FieldHead, Role::Maintainer] {
            let err = list_scope(&actor(role, Some(Department::Water)), &filters).unwrap_err();
            assert!(matches!(err, AppError::Forbidden));
        }
    }

    #[test]
    fn staff_without_department_is_denied() {
        let err = list_scope(&actor(Role::Maintainer, None), &ListFilters::default()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn department_access_requires_matching_field_head() {
        let head = actor(Role::FieldHead, Some(Department::Water));
        assert_eq!(department_access(&head, "water").unwrap(), Department::Water);
        assert!(matches!(
            department_access(&head, "road"),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            department_access(&head, "nonsense"),
            Err(AppError::Forbidden)
        ));

        let maintainer = actor(Role::Maintainer, Some(Department::Water));
        assert!(matches!(
            department_access(&maintainer, "water"),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn reporter_scope_rules() {
        let user = actor(Role::User, None);
        assert_eq!(reporter_scope(&user, 7).unwrap().reporter_id, Some(7));
        assert!(matches!(reporter_scope(&user, 8), Err(AppError::Forbidden)));

        let head = actor(Role::FieldHead, Some(Department::Building));
        let scope = reporter_scope(&head, 8).unwrap();
        assert_eq!(scope.reporter_id, Some(8));
        assert_eq!(scope.department, Some(Department::Building));
    }

    #[test]
    fn view_rules() {
        let user = actor(Role::User, None);
        assert!(can_view(&user, 7, Department::Road));
        assert!(!can_view(&user, 8, Department::Road));

        let maintainer = actor(Role::Maintainer, Some(Department::Road));
        assert!(can_view(&maintainer, 8, Department::Road));
        assert!(!can_view(&maintainer, 8, Department::Water));
    }

    #[test]
    fn history_filter_parsing() {
        assert_eq!(HistoryFilter::parse(None).unwrap(), HistoryFilter::Live(None));
        assert_eq!(HistoryFilter::parse(Some("all")).unwrap(), HistoryFilter::All);
        assert_eq!(HistoryFilter::parse(Some("fake")).unwrap(), HistoryFilter::Fake);
        assert_eq!(
            HistoryFilter::parse(Some("resolved")).unwrap(),
            HistoryFilter::Live(Some(ReportStatus::Resolved))
        );
        assert!(matches!(
            HistoryFilter::parse(Some("bogus")),
            Err(AppError::Validation(_))
        ));
    }
}
