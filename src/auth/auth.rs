use crate::config::Config;
use crate::error::AppError;
use crate::{auth::jwt::verify_token, model::role::Role, models::Claims};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// Identity attached to a request by the credential verifier. Trusted
/// verbatim by the handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    /// User id for admins, employee id for employees
    pub subject_id: String,
    pub username: String,
    pub role: Role,

    /// Present only for employees
    pub store_id: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            subject_id: claims.sub,
            username: claims.username,
            role: claims.role,
            store_id: claims.store_id,
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Token no proporcionado".into()))
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match bearer_token(req) {
            Ok(t) => t,
            Err(e) => return ready(Err(e)),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(AppError::internal("Config missing"))),
        };

        match verify_token(token, &config.jwt_secret) {
            Ok(claims) => ready(Ok(claims.into())),
            Err(_) => ready(Err(AppError::Unauthorized("Token inválido o expirado".into()))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Acceso denegado. Solo administradores".into()))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            subject_id: "x".into(),
            username: "x".into(),
            role,
            store_id: None,
        }
    }

    #[test]
    fn only_admins_pass_admin_check() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(matches!(
            user(Role::Employee).require_admin(),
            Err(AppError::Forbidden(_))
        ));
    }
}
