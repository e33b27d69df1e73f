//! Account creation. Anything that must happen after the row exists is an
//! explicit [`PostCreationStep`] rather than a hook on every save.

use crate::auth::password::hash_password;
use crate::error::AppError;
use crate::model::role::Role;
use crate::utils::forms::{FieldErrors, REQUIRED};
use crate::utils::username_index::UsernameIndex;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewUser {
    #[schema(example = "mgonzalez")]
    pub username: String,
    #[schema(example = "cambiar-2024")]
    pub password: String,
    #[schema(example = "María")]
    pub first_name: String,
    #[schema(example = "González")]
    pub last_name: String,
    #[schema(example = "mgonzalez@cesfam.cl")]
    pub email: String,
    #[schema(example = "12.345.678-5")]
    pub rut: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Enfermera")]
    pub position: Option<String>,
    /// Role id: 1 Administrator, 2 Direction, 3 Subdirection, 4 Staff
    #[schema(example = 4)]
    pub role_id: u8,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCreationStep {
    AssignAdministratorRole,
}

impl NewUser {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();

        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        } else if !self
            .username
            .trim()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | '+'))
        {
            errors.add("username", "Letters, digits and . _ - @ + only.");
        }
        if self.password.len() < 8 {
            errors.add("password", "Use at least 8 characters.");
        }
        if !self.email.trim().is_empty() && !self.email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }
        if Role::from_id(self.role_id).is_none() {
            errors.add("role_id", "Unknown role.");
        }

        errors
    }

    /// Steps to run once the user row has been inserted.
    pub fn post_creation_steps(&self) -> Vec<PostCreationStep> {
        let mut steps = Vec::new();
        if self.is_superuser && self.role_id != Role::Administrator.id() {
            steps.push(PostCreationStep::AssignAdministratorRole);
        }
        steps
    }
}

pub async fn assign_administrator_role(pool: &MySqlPool, user_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE app_user SET role_id = ? WHERE id = ?")
        .bind(Role::Administrator.id())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Creates the account and runs its post-creation steps. Returns the new id.
pub async fn provision_user(
    pool: &MySqlPool,
    index: &UsernameIndex,
    new_user: &NewUser,
) -> Result<u64, AppError> {
    new_user.validate().into_result()?;

    let username = new_user.username.trim();
    if !index.is_available(username, pool).await {
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let hashed = hash_password(&new_user.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO app_user
            (username, password, first_name, last_name, email, rut, phone, position, role_id, is_superuser)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(&hashed)
    .bind(new_user.first_name.trim())
    .bind(new_user.last_name.trim())
    .bind(new_user.email.trim())
    .bind(new_user.rut.as_deref().map(str::trim).filter(|r| !r.is_empty()))
    .bind(&new_user.phone)
    .bind(&new_user.position)
    .bind(new_user.role_id)
    .bind(new_user.is_superuser)
    .execute(pool)
    .await
    .map_err(|e| {
        if AppError::is_duplicate_key(&e) {
            AppError::Conflict("Username or RUT already exists".into())
        } else {
            AppError::Database(e)
        }
    })?;

    let user_id = result.last_insert_id();
    index.mark_taken(username).await;

    for step in new_user.post_creation_steps() {
        match step {
            PostCreationStep::AssignAdministratorRole => {
                assign_administrator_role(pool, user_id).await?;
                tracing::info!(user_id, "Assigned Administrator role to superuser");
            }
        }
    }

    tracing::info!(user_id, username, "User provisioned");
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(role_id: u8, is_superuser: bool) -> NewUser {
        NewUser {
            username: "mgonzalez".into(),
            password: "cambiar-2024".into(),
            first_name: "María".into(),
            last_name: "González".into(),
            email: "mgonzalez@cesfam.cl".into(),
            rut: None,
            phone: None,
            position: Some("Enfermera".into()),
            role_id,
            is_superuser,
        }
    }

    #[test]
    fn superusers_get_the_administrator_step() {
        let steps = new_user(Role::Staff.id(), true).post_creation_steps();
        assert_eq!(steps, vec![PostCreationStep::AssignAdministratorRole]);
    }

    #[test]
    fn regular_users_keep_their_role() {
        assert!(new_user(Role::Direction.id(), false).post_creation_steps().is_empty());
        // already an administrator: nothing to assign
        assert!(new_user(Role::Administrator.id(), true).post_creation_steps().is_empty());
    }

    #[test]
    fn validation_flags_each_bad_field() {
        let mut user = new_user(9, false);
        user.username = "juan perez".into();
        user.password = "short".into();
        user.email = "no-at-sign".into();

        let errors = user.validate();
        for field in ["username", "password", "email", "role_id"] {
            assert!(errors.get(field).is_some(), "{field} not flagged");
        }
        assert!(new_user(4, false).validate().is_empty());
    }
}
