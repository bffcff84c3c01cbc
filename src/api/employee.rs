use crate::{
    auth::{
        auth::AuthUser,
        password::{hash_password, verify_password},
    },
    directory::{DirectoryAdmin, DirectoryError},
    error::{AppError, AppResult},
    model::employee::{EmployeeChanges, NewEmployee},
    utils::employee_code_cache,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 4;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "Juan Pérez", value_type = String)]
    pub name: Option<String>,
    /// Login name; the initial password is the code itself
    #[schema(example = "EMP-001", value_type = String)]
    pub employee_code: Option<String>,
    #[schema(example = "store-1", value_type = String)]
    pub store_id: Option<String>,
    #[schema(example = "Cajero")]
    pub position: Option<String>,
    #[schema(example = "809-555-0101")]
    pub phone: Option<String>,
    #[schema(example = "juan@empresa.com")]
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: Option<String>,
    #[schema(example = "nueva-clave")]
    pub new_password: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn not_found() -> AppError {
    AppError::NotFound("Empleado no encontrado".into())
}

/// List employees (admin)
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All employees ordered by name", body = Vec<Employee>),
        (status = 403, description = "Not an administrator")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let employees = directory.list_employees().await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// List the employees of one store (admin)
#[utoipa::path(
    get,
    path = "/api/employees/store/{storeId}",
    params(
        ("storeId", Path, description = "Store id")
    ),
    responses(
        (status = 200, description = "Employees of the store", body = Vec<Employee>),
        (status = 403, description = "Not an administrator")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_by_store(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let employees = directory.list_employees_by_store(&path).await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Get one employee; employees may only read their own record
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 403, description = "Another employee's record"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let employee = directory.get_employee(&id).await?.ok_or_else(not_found)?;

    if !auth.is_admin() && auth.subject_id != id {
        return Err(AppError::Forbidden("No autorizado".into()));
    }

    Ok(HttpResponse::Ok().json(employee))
}

/// Create Employee (admin)
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing fields, duplicate code or unknown store", body = Object, example = json!({
            "error": "El código de empleado ya existe"
        })),
        (status = 403, description = "Not an administrator")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "create_employee", skip_all)]
pub async fn create_employee(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    payload: web::Json<CreateEmployee>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let (name, code, store_id) = match (
        filled(payload.name),
        filled(payload.employee_code),
        filled(payload.store_id),
    ) {
        (Some(name), Some(code), Some(store_id)) => (name, code, store_id),
        _ => {
            return Err(AppError::InvalidArgument(
                "Nombre, código de empleado y tienda son requeridos".into(),
            ));
        }
    };

    if !employee_code_cache::is_code_available(&code, directory.get_ref()).await? {
        debug!(code = %code, "Employee code already taken");
        return Err(AppError::InvalidArgument("El código de empleado ya existe".into()));
    }

    if directory.get_store(&store_id).await?.is_none() {
        return Err(AppError::InvalidArgument("Tienda no encontrada".into()));
    }

    let password_hash = hash_password(&code).map_err(AppError::internal)?;

    let new = NewEmployee {
        id: Uuid::new_v4().to_string(),
        employee_code: code.clone(),
        name,
        store_id,
        position: filled(payload.position).unwrap_or_else(|| "Empleado".to_string()),
        phone: payload.phone.unwrap_or_default(),
        email: payload.email.unwrap_or_default(),
        password_hash,
    };

    let employee = match directory.add_employee(new).await {
        Ok(employee) => employee,
        Err(DirectoryError::AlreadyExists) => {
            employee_code_cache::mark_taken(&code).await;
            return Err(AppError::InvalidArgument("El código de empleado ya existe".into()));
        }
        Err(DirectoryError::InvalidReference) => {
            return Err(AppError::InvalidArgument("Tienda no encontrada".into()));
        }
        Err(e) => return Err(e.into()),
    };

    employee_code_cache::mark_taken(&employee.employee_code).await;
    info!(employee_id = %employee.id, code = %employee.employee_code, "Employee created");

    Ok(HttpResponse::Created().json(employee))
}

/// Change the authenticated employee's password
#[utoipa::path(
    put,
    path = "/api/employees/change-password",
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = Object, example = json!({
            "message": "Contraseña actualizada correctamente"
        })),
        (status = 400, description = "Missing fields, short password or wrong current password"),
        (status = 404, description = "Caller is not an employee")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "change_password", skip_all, fields(employee_id = %auth.subject_id))]
pub async fn change_password(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    payload: web::Json<ChangePassword>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    let (current, new) = match (payload.current_password, payload.new_password) {
        (Some(c), Some(n)) if !c.is_empty() && !n.is_empty() => (c, n),
        _ => {
            return Err(AppError::InvalidArgument(
                "Contraseña actual y nueva contraseña requeridas".into(),
            ));
        }
    };

    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidArgument(
            "La nueva contraseña debe tener al menos 4 caracteres".into(),
        ));
    }

    let account = directory
        .get_employee_account(&auth.subject_id)
        .await?
        .ok_or_else(not_found)?;

    match verify_password(&current, &account.password) {
        Ok(true) => {}
        Ok(false) => {
            return Err(AppError::InvalidArgument("Contraseña actual incorrecta".into()));
        }
        Err(e) => {
            warn!(error = %e, "Stored password hash is unreadable");
            return Err(AppError::InvalidArgument("Contraseña actual incorrecta".into()));
        }
    }

    let hashed = hash_password(&new).map_err(AppError::internal)?;
    if !directory.set_employee_password(&auth.subject_id, &hashed).await? {
        return Err(not_found());
    }

    info!("Password changed");
    Ok(HttpResponse::Ok().json(json!({ "message": "Contraseña actualizada correctamente" })))
}

/// Update Employee (admin)
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee id")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Updated employee", body = Employee),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    path: web::Path<String>,
    payload: web::Json<UpdateEmployee>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let changes = EmployeeChanges {
        name: payload.name,
        position: payload.position,
        phone: payload.phone,
        email: payload.email,
        active: payload.active,
    };

    let employee = directory
        .update_employee(&path, changes)
        .await?
        .ok_or_else(not_found)?;

    debug!(employee_id = %employee.id, active = employee.active, "Employee updated");
    Ok(HttpResponse::Ok().json(employee))
}

/// Delete Employee (admin). Past punches are kept.
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Employee deleted", body = Object, example = json!({
            "message": "Empleado eliminado correctamente"
        })),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let employee = directory.get_employee(&path).await?.ok_or_else(not_found)?;

    if !directory.delete_employee(&employee.id).await? {
        return Err(not_found());
    }
    employee_code_cache::forget(&employee.employee_code).await;

    info!(employee_id = %employee.id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Empleado eliminado correctamente" })))
}
