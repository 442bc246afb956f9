use crate::{
    error::{AppError, AppResult},
    models::{user, Department, Role, User, UserModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Profile fields a user may change. `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<Department>,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, user_id: i32) -> AppResult<UserModel> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Users holding `role`, optionally restricted to one department.
    pub async fn find_by_role(
        &self,
        role: Role,
        department: Option<Department>,
    ) -> AppResult<Vec<UserModel>> {
        let mut query = User::find().filter(user::Column::Role.eq(role));
        if let Some(dept) = department {
            query = query.filter(user::Column::Department.eq(dept));
        }
        Ok(query.order_by_asc(user::Column::Id).all(&self.db).await?)
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> AppResult<UserModel> {
        let existing = self.get_by_id(user_id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = non_blank(update.name) {
            active.name = sea_orm::ActiveValue::Set(name);
        }
        if let Some(email) = non_blank(update.email) {
            active.email = sea_orm::ActiveValue::Set(Some(email));
        }
        if let Some(phone) = non_blank(update.phone) {
            active.phone = sea_orm::ActiveValue::Set(Some(phone));
        }
        if let Some(department) = update.department {
            active.department = sea_orm::ActiveValue::Set(Some(department));
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        Ok(active.update(&self.db).await?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
