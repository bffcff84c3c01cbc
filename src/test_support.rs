//! Fixtures shared by the HTTP tests: an in-memory backend seeded like a
//! fresh install, tokens for both roles, and requests with a peer address
//! (the rate limiter keys on it).

use std::sync::Arc;

use actix_web::test::TestRequest;

use crate::auth::{jwt::generate_access_token, password::hash_password};
use crate::config::{Config, StorageBackend};
use crate::db::{ADMIN_ID, ADMIN_USERNAME, seeded_memory_directory};
use crate::directory::{DirectoryAdmin, InMemoryDirectory};
use crate::ledger::InMemoryPunchStore;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::role::Role;
use crate::state::AppState;

pub const ADMIN_PASSWORD: &str = "admin123";

pub fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        storage: StorageBackend::Memory,
        database_url: None,
        jwt_secret: "test-secret".into(),
        access_token_ttl: 3600,
        rate_login_per_min: 10_000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".into(),
        admin_password: ADMIN_PASSWORD.into(),
        log_dir: "logs".into(),
    }
}

pub fn memory_state() -> (AppState, Arc<InMemoryDirectory>) {
    let directory = Arc::new(seeded_memory_directory(ADMIN_PASSWORD).unwrap());
    let state = AppState::new(Arc::new(InMemoryPunchStore::new()), directory.clone());
    (state, directory)
}

/// Adds an active employee whose password is its own code.
pub async fn hire(directory: &InMemoryDirectory, id: &str, code: &str, name: &str, store_id: &str) -> Employee {
    directory
        .add_employee(NewEmployee {
            id: id.into(),
            employee_code: code.into(),
            name: name.into(),
            store_id: store_id.into(),
            position: "Empleado".into(),
            phone: String::new(),
            email: String::new(),
            password_hash: hash_password(code).unwrap(),
        })
        .await
        .unwrap()
}

pub fn admin_token(config: &Config) -> String {
    generate_access_token(
        ADMIN_ID,
        ADMIN_USERNAME,
        Role::Admin,
        None,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .unwrap()
}

pub fn employee_token(config: &Config, employee: &Employee) -> String {
    generate_access_token(
        &employee.id,
        &employee.employee_code,
        Role::Employee,
        Some(employee.store_id.clone()),
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .unwrap()
}

pub fn get(uri: &str, token: &str) -> TestRequest {
    from_peer(TestRequest::get().uri(uri)).insert_header(("Authorization", format!("Bearer {token}")))
}

pub fn post(uri: &str, token: &str) -> TestRequest {
    from_peer(TestRequest::post().uri(uri)).insert_header(("Authorization", format!("Bearer {token}")))
}

pub fn put(uri: &str, token: &str) -> TestRequest {
    from_peer(TestRequest::put().uri(uri)).insert_header(("Authorization", format!("Bearer {token}")))
}

pub fn delete(uri: &str, token: &str) -> TestRequest {
    from_peer(TestRequest::delete().uri(uri)).insert_header(("Authorization", format!("Bearer {token}")))
}

pub fn from_peer(req: TestRequest) -> TestRequest {
    req.peer_addr("127.0.0.1:40000".parse().unwrap())
}

/// Builds the full application (routes, middleware, shared state) around
/// the given state and config.
macro_rules! test_app {
    ($state:expr, $config:expr) => {{
        let state = $state.clone();
        let config = $config.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(config.clone()))
                .configure(|cfg| state.register(cfg))
                .configure(|cfg| crate::routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

pub(crate) use test_app;
