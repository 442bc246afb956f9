use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        fake_report, report, Department, FakeReport, FakeReportModel, Report, ReportModel,
        ReportStatus, Role, UserModel,
    },
    services::{
        lifecycle::{check_advance, check_assign, VerifyDecision, WorkStatus},
        notification::{Notice, NotificationDispatcher, Recipient},
        policy::{self, HistoryFilter, ListFilters, ReportScope, StatusFilter},
        user::UserService,
    },
};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ActiveValue, ColumnTrait, Condition,
    DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Fields a reporter supplies. Everything is optional at the wire level so
/// that missing fields surface as validation errors.
#[derive(Debug, Default, Clone)]
pub struct ReportDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
}

/// A row from either the live table or the fake archive.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Live(ReportModel),
    Archived(FakeReportModel),
}

impl HistoryEntry {
    fn created_at(&self) -> chrono::NaiveDateTime {
        match self {
            HistoryEntry::Live(r) => r.created_at,
            HistoryEntry::Archived(f) => f.created_at,
        }
    }
}

/// The report lifecycle engine: owns every status change and the side
/// effects attached to it.
pub struct ReportService {
    db: DatabaseConnection,
    dispatcher: NotificationDispatcher,
}

impl ReportService {
    pub fn new(db: DatabaseConnection, dispatcher: NotificationDispatcher) -> Self {
        Self { db, dispatcher }
    }

    pub async fn submit(&self, reporter: &AuthUser, draft: ReportDraft) -> AppResult<ReportModel> {
        let title = required_text("title", draft.title)?;
        let description = required_text("description", draft.description)?;
        let location = required_text("location", draft.location)?;
        let category = required_text("category", draft.category)?
            .parse::<Department>()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let image_url = draft
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let now = chrono::Utc::now().naive_utc();
        let model = report::ActiveModel {
            title: ActiveValue::Set(title),
            description: ActiveValue::Set(description),
            category: ActiveValue::Set(category),
            location: ActiveValue::Set(location),
            image_url: ActiveValue::Set(image_url),
            status: ActiveValue::Set(ReportStatus::Pending),
            reporter_id: ActiveValue::Set(reporter.user_id),
            reporter_name: ActiveValue::Set(reporter.name.clone()),
            department: ActiveValue::Set(category),
            version: ActiveValue::Set(1),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        tracing::info!(
            report_id = saved.id,
            actor_id = reporter.user_id,
            category = %saved.category,
            "Report submitted"
        );

        let maintainers = self.users_with_role(Role::Maintainer).await;
        self.notify(
            maintainers,
            Notice::new(
                "New Issue Reported",
                format!(
                    "A new issue has been reported: {}. Please review and verify.",
                    saved.title
                ),
            ),
        );

        Ok(saved)
    }

    pub async fn get(&self, actor: &AuthUser, report_id: i32) -> AppResult<ReportModel> {
        let report = self.find_live(report_id).await?;
        if !policy::can_view(actor, report.reporter_id, report.department) {
            return Err(AppError::Forbidden);
        }
        Ok(report)
    }

    pub async fn list(&self, actor: &AuthUser, filters: &ListFilters) -> AppResult<Vec<ReportModel>> {
        let scope = policy::list_scope(actor, filters)?;
        self.fetch_scope(&scope).await
    }

    pub async fn list_by_reporter(
        &self,
        actor: &AuthUser,
        reporter_id: i32,
    ) -> AppResult<Vec<ReportModel>> {
        let scope = policy::reporter_scope(actor, reporter_id)?;
        self.fetch_scope(&scope).await
    }

    /// Live reports of the field head's own department.
    pub async fn department_reports(
        &self,
        actor: &AuthUser,
        department: &str,
    ) -> AppResult<Vec<ReportModel>> {
        let department = policy::department_access(actor, department)?;
        let scope = ReportScope {
            reporter_id: None,
            department: Some(department),
            category: None,
            status: StatusFilter::Except(ReportStatus::Fake),
        };
        self.fetch_scope(&scope).await
    }

    /// Department history, optionally including the fake archive. Newest first.
    pub async fn department_history(
        &self,
        actor: &AuthUser,
        department: &str,
        filter: HistoryFilter,
    ) -> AppResult<Vec<HistoryEntry>> {
        let department = policy::department_access(actor, department)?;

        let live_scope = |status| ReportScope {
            reporter_id: None,
            department: Some(department),
            category: None,
            status,
        };

        let mut entries: Vec<HistoryEntry> = match filter {
            HistoryFilter::Live(status) => {
                let status = status.map_or(StatusFilter::Any, |s| match s {
                    ReportStatus::Fake => StatusFilter::Never,
                    s => StatusFilter::Only(s),
                });
                self.fetch_scope(&live_scope(status))
                    .await?
                    .into_iter()
                    .map(HistoryEntry::Live)
                    .collect()
            }
            HistoryFilter::Fake => self
                .fetch_archive(department)
                .await?
                .into_iter()
                .map(HistoryEntry::Archived)
                .collect(),
            HistoryFilter::All => {
                let mut all: Vec<HistoryEntry> = self
                    .fetch_scope(&live_scope(StatusFilter::Any))
                    .await?
                    .into_iter()
                    .map(HistoryEntry::Live)
                    .collect();
                all.extend(
                    self.fetch_archive(department)
                        .await?
                        .into_iter()
                        .map(HistoryEntry::Archived),
                );
                all
            }
        };

        entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(entries)
    }

    /// Field-head review. `verified` reopens the report for any maintainer of
    /// the target department and returns it; `fake` moves it into the archive
    /// unchanged (the department override does not apply) and returns `None`.
    pub async fn verify(
        &self,
        actor: &AuthUser,
        report_id: i32,
        decision: &str,
        department: Option<&str>,
    ) -> AppResult<Option<ReportModel>> {
        policy::require_role(actor, Role::FieldHead)?;
        let report = self.find_live(report_id).await?;
        let decision: VerifyDecision = decision.parse()?;
        policy::ensure_same_department(actor, report.department)?;

        let department = match department.map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => raw
                .parse::<Department>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
            None => report.department,
        };

        match decision {
            VerifyDecision::Fake => {
                self.archive_as_fake(actor, report).await?;
                Ok(None)
            }
            VerifyDecision::Verified => {
                let now = chrono::Utc::now().naive_utc();
                let mut next = report.clone();
                next.status = ReportStatus::Verified;
                next.maintainer_id = None;
                next.maintainer_name = None;
                next.department = department;
                next.verified_at = Some(now);
                let saved = self.save(&report, next).await?;
                tracing::info!(
                    report_id,
                    actor_id = actor.user_id,
                    department = %saved.department,
                    "Report verified"
                );

                let maintainers = self.users_with_role(Role::Maintainer).await;
                self.notify(
                    maintainers,
                    Notice::new(
                        "New Verified Issue Ready",
                        format!(
                            "A new issue has been verified and is ready for maintenance: {}. Please review and start work.",
                            saved.title
                        ),
                    ),
                );
                self.notify_reporter(
                    &saved.title,
                    saved.reporter_id,
                    "Your Report Has Been Verified",
                    "has been verified and forwarded to maintenance",
                )
                .await;
                Ok(Some(saved))
            }
        }
    }

    /// Hand a verified report to a field head.
    pub async fn assign(
        &self,
        actor: &AuthUser,
        report_id: i32,
        field_head_id: i32,
    ) -> AppResult<ReportModel> {
        let report = self.find_live(report_id).await?;
        check_assign(report.status)?;

        let field_head = match UserService::new(self.db.clone()).get_by_id(field_head_id).await {
            Ok(user) if user.role == Role::FieldHead => user,
            Ok(_) | Err(AppError::NotFound) => {
                return Err(AppError::Validation(
                    "fieldHeadId must name a field head".to_string(),
                ))
            }
            Err(e) => return Err(e),
        };

        let now = chrono::Utc::now().naive_utc();
        let mut next = report.clone();
        next.status = ReportStatus::Assigned;
        next.field_head_id = Some(field_head.id);
        next.field_head_name = Some(field_head.name.clone());
        next.assigned_at = Some(now);
        let saved = self.save(&report, next).await?;
        tracing::info!(
            report_id,
            actor_id = actor.user_id,
            field_head_id = field_head.id,
            "Report assigned"
        );

        self.notify(
            vec![field_head],
            Notice::new(
                "New Issue Assigned",
                format!(
                    "A new issue has been assigned to you: {}. Please review and update the status.",
                    saved.title
                ),
            ),
        );
        self.notify_reporter(
            &saved.title,
            saved.reporter_id,
            "Your Report Has Been Assigned",
            "has been assigned to a field head for resolution",
        )
        .await;

        Ok(saved)
    }

    /// Maintainer work progress: start work or close the report.
    pub async fn advance_status(
        &self,
        actor: &AuthUser,
        report_id: i32,
        target: &str,
        closure_image_url: Option<String>,
    ) -> AppResult<ReportModel> {
        policy::require_role(actor, Role::Maintainer)?;
        let target: WorkStatus = target.parse()?;

        let report = match Report::find_by_id(report_id).one(&self.db).await? {
            Some(report) => report,
            None if self.is_archived(report_id).await? => {
                return Err(AppError::InvalidTransition(
                    "report was rejected as fake".to_string(),
                ));
            }
            None => return Err(AppError::NotFound),
        };
        policy::ensure_same_department(actor, report.department)?;
        check_advance(report.status)?;

        let now = chrono::Utc::now().naive_utc();
        let mut next = report.clone();
        next.status = target.status();
        next.maintainer_id = Some(actor.user_id);
        next.maintainer_name = Some(actor.name.clone());
        match target {
            WorkStatus::InProgress => next.in_progress_at = Some(now),
            WorkStatus::Resolved => {
                next.resolved_at = Some(now);
                if let Some(url) = closure_image_url
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty())
                {
                    next.closure_image_url = Some(url);
                }
            }
        }
        let saved = self.save(&report, next).await?;
        tracing::info!(
            report_id,
            actor_id = actor.user_id,
            status = %saved.status,
            "Report status updated"
        );

        self.notify_reporter(
            &saved.title,
            saved.reporter_id,
            "Report Status Update",
            target.describe(),
        )
        .await;

        Ok(saved)
    }

    /// Copy the report into the archive, then delete the live row. The copy
    /// keeps every field of the live row; only the status, `verified_at` and
    /// `original_report_id` differ. The insert is keyed by the original id, so
    /// re-running after a crash between the two steps re-uses the existing copy.
    async fn archive_as_fake(&self, actor: &AuthUser, report: ReportModel) -> AppResult<()> {
        let now = chrono::Utc::now().naive_utc();
        let archive = fake_report::ActiveModel {
            original_report_id: ActiveValue::Set(report.id),
            title: ActiveValue::Set(report.title.clone()),
            description: ActiveValue::Set(report.description.clone()),
            category: ActiveValue::Set(report.category),
            location: ActiveValue::Set(report.location.clone()),
            image_url: ActiveValue::Set(report.image_url.clone()),
            status: ActiveValue::Set(ReportStatus::Fake),
            reporter_id: ActiveValue::Set(report.reporter_id),
            reporter_name: ActiveValue::Set(report.reporter_name.clone()),
            maintainer_id: ActiveValue::Set(report.maintainer_id),
            maintainer_name: ActiveValue::Set(report.maintainer_name.clone()),
            field_head_id: ActiveValue::Set(report.field_head_id),
            field_head_name: ActiveValue::Set(report.field_head_name.clone()),
            department: ActiveValue::Set(report.department),
            verified_at: ActiveValue::Set(now),
            assigned_at: ActiveValue::Set(report.assigned_at),
            in_progress_at: ActiveValue::Set(report.in_progress_at),
            resolved_at: ActiveValue::Set(report.resolved_at),
            closure_image_url: ActiveValue::Set(report.closure_image_url.clone()),
            created_at: ActiveValue::Set(report.created_at),
            ..Default::default()
        };

        let inserted = FakeReport::insert(archive)
            .on_conflict(
                OnConflict::column(fake_report::Column::OriginalReportId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        if inserted == 0 {
            tracing::warn!(report_id = report.id, "Archive copy already present, completing move");
        }

        Report::delete_by_id(report.id).exec(&self.db).await?;
        tracing::info!(
            report_id = report.id,
            actor_id = actor.user_id,
            "Report archived as fake"
        );

        self.notify_reporter(
            &report.title,
            report.reporter_id,
            "Your Report Has Been Marked as Fake",
            "has been reviewed and marked as fake",
        )
        .await;
        Ok(())
    }

    /// Full-row write guarded by the version the caller read. A concurrent
    /// writer that got there first turns this into a `Conflict`.
    async fn save(&self, current: &ReportModel, mut next: ReportModel) -> AppResult<ReportModel> {
        next.version = current.version + 1;
        next.updated_at = chrono::Utc::now().naive_utc();

        let mut active = next.clone().into_active_model().reset_all();
        active.id = ActiveValue::NotSet;

        let result = Report::update_many()
            .set(active)
            .filter(report::Column::Id.eq(current.id))
            .filter(report::Column::Version.eq(current.version))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            if Report::find_by_id(current.id).one(&self.db).await?.is_none() {
                return Err(AppError::NotFound);
            }
            tracing::warn!(report_id = current.id, "Lost update race on report");
            return Err(AppError::Conflict(
                "Report was modified concurrently, reload and retry".to_string(),
            ));
        }

        Ok(next)
    }

    async fn find_live(&self, report_id: i32) -> AppResult<ReportModel> {
        Report::find_by_id(report_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn is_archived(&self, report_id: i32) -> AppResult<bool> {
        let count = FakeReport::find()
            .filter(fake_report::Column::OriginalReportId.eq(report_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn fetch_scope(&self, scope: &ReportScope) -> AppResult<Vec<ReportModel>> {
        let Some(condition) = scope_condition(scope) else {
            return Ok(Vec::new());
        };
        Ok(Report::find()
            .filter(condition)
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn fetch_archive(&self, department: Department) -> AppResult<Vec<FakeReportModel>> {
        Ok(FakeReport::find()
            .filter(fake_report::Column::Department.eq(department))
            .order_by_desc(fake_report::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Recipient lookups happen after the transition has been written, so a
    /// failure here is logged and the notification dropped.
    async fn users_with_role(&self, role: Role) -> Vec<UserModel> {
        match UserService::new(self.db.clone()).find_by_role(role, None).await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "Failed to resolve notification recipients");
                Vec::new()
            }
        }
    }

    async fn notify_reporter(&self, title: &str, reporter_id: i32, subject: &str, what: &str) {
        match UserService::new(self.db.clone()).get_by_id(reporter_id).await {
            Ok(reporter) => self.notify(
                vec![reporter],
                Notice::new(subject, format!("Your report \"{title}\" {what}.")),
            ),
            Err(e) => {
                tracing::warn!(reporter_id, error = %e, "Failed to resolve reporter for notification")
            }
        }
    }

    fn notify(&self, users: Vec<UserModel>, notice: Notice) {
        if users.is_empty() {
            return;
        }
        let recipients = users.into_iter().map(Recipient::from).collect();
        // Fire-and-forget: the handle is dropped and the fan-out runs detached.
        drop(self.dispatcher.dispatch(recipients, notice));
    }
}

/// Translate a validated scope into a query condition. `None` means the scope
/// can match nothing and the query can be skipped.
pub fn scope_condition(scope: &ReportScope) -> Option<Condition> {
    if scope.is_empty() {
        return None;
    }
    let mut condition = Condition::all();

    if let Some(reporter_id) = scope.reporter_id {
        condition = condition.add(report::Column::ReporterId.eq(reporter_id));
    }
    if let Some(department) = scope.department {
        condition = condition.add(report::Column::Department.eq(department));
    }
    if let Some(category) = scope.category {
        condition = condition.add(report::Column::Category.eq(category));
    }

    condition = match &scope.status {
        StatusFilter::Any | StatusFilter::Never => condition,
        StatusFilter::Only(status) => condition.add(report::Column::Status.eq(*status)),
        StatusFilter::AnyOf(statuses) => {
            condition.add(report::Column::Status.is_in(statuses.iter().copied()))
        }
        StatusFilter::Except(status) => condition.add(report::Column::Status.ne(*status)),
    };

    Some(condition)
}

fn required_text(field: &str, value: Option<String>) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}
