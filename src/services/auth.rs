use crate::{
    error::{AppError, AppResult},
    models::{user, Department, Role, User, UserModel},
    utils::{encode_token, hash_password, verify_password},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

#[derive(Debug, Clone)]
pub struct Registration {
    pub college_id: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub department: Option<Department>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new account. Returns (user_model, token).
    pub async fn register(&self, registration: Registration) -> AppResult<(UserModel, String)> {
        if registration.role.is_staff() && registration.department.is_none() {
            return Err(AppError::Validation(format!(
                "department is required for role '{}'",
                registration.role
            )));
        }

        if self.find_by_college_id(&registration.college_id).await?.is_some() {
            return Err(AppError::Conflict(
                "User already exists with this college ID".to_string(),
            ));
        }

        let password_hash = hash_password(&registration.password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            college_id: sea_orm::ActiveValue::Set(registration.college_id),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            name: sea_orm::ActiveValue::Set(registration.name),
            role: sea_orm::ActiveValue::Set(registration.role),
            department: sea_orm::ActiveValue::Set(registration.department),
            email: sea_orm::ActiveValue::Set(registration.email),
            phone: sea_orm::ActiveValue::Set(registration.phone),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        let token = encode_token(user.id)?;
        tracing::info!(user_id = user.id, role = %user.role, "User registered");

        Ok((user, token))
    }

    /// Log in as `role`. Unknown account, wrong role and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(
        &self,
        college_id: &str,
        password: &str,
        role: Role,
    ) -> AppResult<(UserModel, String)> {
        let user = self
            .find_by_college_id(college_id)
            .await?
            .filter(|u| u.role == role)
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = encode_token(user.id)?;
        Ok((user, token))
    }

    async fn find_by_college_id(&self, college_id: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find()
            .filter(user::Column::CollegeId.eq(college_id))
            .one(&self.db)
            .await?)
    }
}
