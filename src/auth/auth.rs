use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use crate::models::TokenType;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

/// Validates the bearer access token carried by a request.
pub fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or(AppError::Internal("Config missing".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized("Missing token"))?;

    let claims =
        verify_token(token, &config.jwt_secret).map_err(|_| AppError::Unauthorized("Invalid token"))?;

    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized("Access token required"));
    }

    let role = Role::from_id(claims.role).ok_or(AppError::Unauthorized("Invalid role"))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
    })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already validated by the scope middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }
        ready(authenticate(req))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator only"))
        }
    }

    pub fn require_office(&self) -> Result<(), AppError> {
        if self.role.is_office() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Direction/Subdirection only"))
        }
    }

    /// Owners and administrators may modify a record.
    pub fn require_owner_or_admin(&self, owner_id: u64) -> Result<(), AppError> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Only the author or an administrator may do this"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 5,
            username: "tester".into(),
            role,
        }
    }

    #[test]
    fn role_guards() {
        assert!(user(Role::Administrator).require_admin().is_ok());
        assert!(user(Role::Direction).require_admin().is_err());
        assert!(user(Role::Subdirection).require_office().is_ok());
        assert!(user(Role::Staff).require_office().is_err());
    }

    #[test]
    fn owners_and_admins_may_modify() {
        assert!(user(Role::Staff).require_owner_or_admin(5).is_ok());
        assert!(user(Role::Staff).require_owner_or_admin(6).is_err());
        assert!(user(Role::Administrator).require_owner_or_admin(6).is_ok());
    }
}
