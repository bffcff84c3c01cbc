use crate::{
    auth::auth::AuthUser,
    directory::DirectoryAdmin,
    error::{AppError, AppResult},
    model::store::{NewStore, StoreChanges},
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct CreateStore {
    #[schema(example = "Tienda Oeste", value_type = String)]
    pub name: Option<String>,
    #[schema(example = "Zona Oeste #500")]
    pub address: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStore {
    pub name: Option<String>,
    pub address: Option<String>,
}

fn not_found() -> AppError {
    AppError::NotFound("Tienda no encontrada".into())
}

/// List stores
#[utoipa::path(
    get,
    path = "/api/stores",
    responses(
        (status = 200, description = "All stores ordered by name", body = Vec<Store>)
    ),
    tag = "Store",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_stores(_auth: AuthUser, directory: web::Data<dyn DirectoryAdmin>) -> AppResult<HttpResponse> {
    let stores = directory.list_stores().await?;
    Ok(HttpResponse::Ok().json(stores))
}

/// Get one store
#[utoipa::path(
    get,
    path = "/api/stores/{id}",
    params(
        ("id", Path, description = "Store id")
    ),
    responses(
        (status = 200, description = "Store", body = Store),
        (status = 404, description = "Store not found")
    ),
    tag = "Store",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_store(
    _auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let store = directory.get_store(&path).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(store))
}

/// Create Store (admin)
#[utoipa::path(
    post,
    path = "/api/stores",
    request_body = CreateStore,
    responses(
        (status = 201, description = "Store created", body = Store),
        (status = 400, description = "Missing or duplicate name", body = Object, example = json!({
            "error": "Ya existe una tienda con ese nombre"
        })),
        (status = 403, description = "Not an administrator")
    ),
    tag = "Store",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_store(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    payload: web::Json<CreateStore>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let name = match payload.name.map(|n| n.trim().to_string()) {
        Some(name) if !name.is_empty() => name,
        _ => return Err(AppError::InvalidArgument("El nombre de la tienda es requerido".into())),
    };

    let taken = directory
        .list_stores()
        .await?
        .iter()
        .any(|s| s.name.to_lowercase() == name.to_lowercase());
    if taken {
        return Err(AppError::InvalidArgument("Ya existe una tienda con ese nombre".into()));
    }

    let store = directory
        .add_store(NewStore {
            id: Uuid::new_v4().to_string(),
            name,
            address: payload.address.unwrap_or_default(),
        })
        .await?;

    info!(store_id = %store.id, name = %store.name, "Store created");
    Ok(HttpResponse::Created().json(store))
}

/// Update Store (admin)
#[utoipa::path(
    put,
    path = "/api/stores/{id}",
    params(
        ("id", Path, description = "Store id")
    ),
    request_body = UpdateStore,
    responses(
        (status = 200, description = "Updated store", body = Store),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "Store not found")
    ),
    tag = "Store",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_store(
    auth: AuthUser,
    directory: web::Data<dyn DirectoryAdmin>,
    path: web::Path<String>,
    payload: web::Json<UpdateStore>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let changes = StoreChanges {
        name: payload.name,
        address: payload.address,
    };

    let store = directory
        .update_store(&path, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(store))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn any_authenticated_user_reads_stores() {
        let config = test_config();
        let (state, directory) = memory_state();
        let ana = hire(&directory, "store-reader", "STORE-READER", "Ana", "store-1").await;
        let app = test_app!(state, config);
        let token = employee_token(&config, &ana);

        let req = get("/api/stores", &token).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 4);

        let req = get("/api/stores/store-2", &token).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["name"], "Tienda Norte");

        let req = get("/api/stores/store-99", &token).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Tienda no encontrada");
    }

    #[actix_web::test]
    async fn store_names_are_unique_ignoring_case() {
        let config = test_config();
        let (state, _) = memory_state();
        let app = test_app!(state, config);
        let admin = admin_token(&config);

        let req = post("/api/stores", &admin)
            .set_json(json!({ "name": "Tienda Oeste" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["address"], "");
        let id = body["id"].as_str().unwrap().to_string();

        let req = post("/api/stores", &admin)
            .set_json(json!({ "name": "TIENDA OESTE" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Ya existe una tienda con ese nombre");

        let req = post("/api/stores", &admin).set_json(json!({ "address": "x" })).to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["error"], "El nombre de la tienda es requerido");

        let req = put(&format!("/api/stores/{id}"), &admin)
            .set_json(json!({ "address": "Zona Oeste #500" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["name"], "Tienda Oeste");
        assert_eq!(body["address"], "Zona Oeste #500");
    }

    #[actix_web::test]
    async fn body_without_json_content_type_is_rejected() {
        let config = test_config();
        let (state, _) = memory_state();
        let app = test_app!(state, config);

        let req = post("/api/stores", &admin_token(&config))
            .set_payload(r#"{"name":"Tienda Oeste"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Cuerpo de la solicitud inválido");
    }

    #[actix_web::test]
    async fn employees_cannot_manage_stores() {
        let config = test_config();
        let (state, directory) = memory_state();
        let ana = hire(&directory, "store-writer", "STORE-WRITER", "Ana", "store-1").await;
        let app = test_app!(state, config);

        let req = post("/api/stores", &employee_token(&config, &ana))
            .set_json(json!({ "name": "Tienda Pirata" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
