use crate::api::employee::{ChangePassword, CreateEmployee, UpdateEmployee};
use crate::api::punch::{BathroomStat, CreatePunch};
use crate::api::store::{CreateStore, UpdateStore};
use crate::ledger::StoreStats;
use crate::model::employee::Employee;
use crate::model::punch::{EnrichedPunch, Punch, PunchType};
use crate::model::store::Store;
use crate::models::{LoginReqDto, LoginResponse, LoginUser};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ponche API",
        version = "1.0.0",
        description = r#"
## Employee time clock

Employees register attendance punches (**entrada**, **salida**, lunch and
bathroom breaks) against their store; administrators review the ledger and
manage employees and stores.

### 🔹 Key Features
- **Punches**
  - One `in`, `out`, `lunch-out` and `lunch-in` per employee per day (America/Santo_Domingo)
  - Unlimited bathroom breaks
- **Dashboards**
  - Punch totals per store and bathroom-break ranking
- **Employee & Store Management**

### 🔐 Security
Every endpoint except login and health requires a **JWT Bearer** token.
Administrative operations require the `admin` role.

### 📦 Response Format
- JSON bodies; errors are `{"error": "<mensaje>"}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::verify,

        crate::api::health::health,

        crate::api::punch::register_punch,
        crate::api::punch::list_punches,
        crate::api::punch::my_punches,
        crate::api::punch::stats_by_store,
        crate::api::punch::bathroom_stats,

        crate::api::employee::list_employees,
        crate::api::employee::list_by_store,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::change_password,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::store::list_stores,
        crate::api::store::get_store,
        crate::api::store::create_store,
        crate::api::store::update_store
    ),
    components(
        schemas(
            LoginReqDto,
            LoginUser,
            LoginResponse,
            PunchType,
            Punch,
            EnrichedPunch,
            CreatePunch,
            StoreStats,
            BathroomStat,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            ChangePassword,
            Store,
            CreateStore,
            UpdateStore
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token verification"),
        (name = "Health", description = "Liveness probe"),
        (name = "Punch", description = "Attendance punches and dashboards"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Store", description = "Store management APIs"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_punch_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/punches"));
        assert!(doc.paths.paths.contains_key("/api/punches/stats/bathroom"));
        assert!(doc.paths.paths.contains_key("/api/employees/change-password"));

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("EnrichedPunch"));
    }
}
