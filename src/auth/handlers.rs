use crate::{
    auth::{
        auth::bearer_token,
        jwt::{generate_access_token, verify_token},
        password::verify_password,
    },
    config::Config,
    directory::DirectoryAdmin,
    error::{AppError, AppResult},
    model::role::Role,
    models::{LoginReqDto, LoginResponse, LoginUser},
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;
use tracing::{debug, error, info, instrument};

/// Resolved login candidate, either a back-office user or an employee.
struct Account {
    user: LoginUser,
    password_hash: String,
}

async fn find_account(directory: &dyn DirectoryAdmin, username: &str) -> AppResult<Option<Account>> {
    // back-office users first, then employees by employee code
    if let Some(user) = directory.find_user_by_username(username).await? {
        let Some(role) = Role::from_name(&user.role) else {
            error!(user_id = %user.id, role = %user.role, "Unrecognised role on user account");
            return Err(AppError::Unauthorized("Credenciales inválidas".into()));
        };
        return Ok(Some(Account {
            user: LoginUser {
                id: user.id,
                username: user.username,
                name: user.name,
                role,
                store_id: None,
            },
            password_hash: user.password,
        }));
    }

    Ok(directory.find_employee_by_code(username).await?.map(|account| Account {
        user: LoginUser {
            id: account.employee.id,
            username: account.employee.employee_code,
            name: account.employee.name,
            role: Role::Employee,
            store_id: Some(account.employee.store_id),
        },
        password_hash: account.password,
    }))
}

/// Login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(directory, config, payload))]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    directory: web::Data<dyn DirectoryAdmin>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    let payload = payload.into_inner();
    let (username, password) = match (payload.username, payload.password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u, p),
        _ => {
            info!("Validation failed: empty username or password");
            return Err(AppError::InvalidArgument("Usuario y contraseña requeridos".into()));
        }
    };
    let username = username.trim();

    let Some(account) = find_account(directory.get_ref(), username).await? else {
        info!(username, "Invalid credentials: account not found");
        return Err(AppError::Unauthorized("Credenciales inválidas".into()));
    };

    debug!(user_id = %account.user.id, "Verifying password");

    match verify_password(&password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(username, "Invalid credentials: password mismatch");
            return Err(AppError::Unauthorized("Credenciales inválidas".into()));
        }
        Err(e) => {
            error!(error = %e, user_id = %account.user.id, "Stored password hash is unreadable");
            return Err(AppError::Unauthorized("Credenciales inválidas".into()));
        }
    }

    let user = account.user;
    let token = generate_access_token(
        &user.id,
        &user.username,
        user.role,
        user.store_id.clone(),
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(AppError::internal)?;

    info!(user_id = %user.id, role = user.role.as_str(), "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}

/// Verify token
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = Object, example = json!({
            "valid": true,
            "user": { "sub": "admin-1", "username": "admin", "role": "admin", "exp": 1704931200, "iat": 1704902400, "jti": "..." }
        })),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn verify(req: HttpRequest, config: web::Data<Config>) -> AppResult<HttpResponse> {
    let token = bearer_token(&req)?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Token inválido".into()))?;

    Ok(HttpResponse::Ok().json(json!({ "valid": true, "user": claims })))
}
