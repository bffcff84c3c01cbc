use std::collections::HashMap;

use crate::{
    auth::auth::AuthUser,
    directory::DirectoryAdmin,
    error::{AppError, AppResult},
    ledger::{DEFAULT_RANKING_LIMIT, Ledger, PunchFilter, parse_punch_type},
    model::punch::{EnrichedPunch, Punch},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

const UNKNOWN: &str = "Desconocido";
const MAX_RANKING_LIMIT: usize = 100;

#[derive(Deserialize, ToSchema)]
pub struct CreatePunch {
    /// One of `in`, `out`, `lunch-out`, `lunch-in`, `bathroom-out`, `bathroom-in`
    #[serde(rename = "type")]
    #[schema(example = "in", value_type = String)]
    pub kind: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchQuery {
    pub date: Option<String>,
    pub store_id: Option<String>,
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BathroomStat {
    pub employee_id: String,
    pub employee_name: String,
    pub store_name: String,
    #[schema(example = 2)]
    pub count: usize,
}

/// Query values sent as `?date=` count as absent.
fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(raw: &Option<String>) -> AppResult<Option<NaiveDate>> {
    present(raw)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| AppError::InvalidArgument("Fecha inválida, use AAAA-MM-DD".into()))
        })
        .transpose()
}

fn parse_limit(raw: &Option<String>) -> AppResult<usize> {
    match present(raw) {
        None => Ok(DEFAULT_RANKING_LIMIT),
        Some(v) => v
            .parse::<usize>()
            .map(|n| n.clamp(1, MAX_RANKING_LIMIT))
            .map_err(|_| AppError::InvalidArgument("Límite inválido".into())),
    }
}

/// Name lookups for employees and stores, built once per request.
struct Names {
    employees: HashMap<String, String>,
    stores: HashMap<String, String>,
}

impl Names {
    async fn load(directory: &dyn DirectoryAdmin) -> AppResult<Self> {
        let employees = directory
            .list_employees()
            .await?
            .into_iter()
            .map(|e| (e.id, e.name))
            .collect();
        let stores = directory
            .list_stores()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        Ok(Self { employees, stores })
    }

    fn employee(&self, id: &str) -> String {
        self.employees.get(id).map_or_else(|| UNKNOWN.to_string(), Clone::clone)
    }

    fn store(&self, id: &str) -> String {
        self.stores.get(id).map_or_else(|| UNKNOWN.to_string(), Clone::clone)
    }

    fn enrich(&self, punch: Punch) -> EnrichedPunch {
        EnrichedPunch {
            employee_name: self.employee(&punch.employee_id),
            store_name: self.store(&punch.store_id),
            punch,
        }
    }
}

async fn enrich_one(directory: &dyn DirectoryAdmin, punch: Punch) -> AppResult<EnrichedPunch> {
    let employee_name = directory
        .get_employee(&punch.employee_id)
        .await?
        .map_or_else(|| UNKNOWN.to_string(), |e| e.name);
    let store_name = directory
        .get_store(&punch.store_id)
        .await?
        .map_or_else(|| UNKNOWN.to_string(), |s| s.name);

    Ok(EnrichedPunch {
        punch,
        employee_name,
        store_name,
    })
}

/// Register a punch for the authenticated employee
#[utoipa::path(
    post,
    path = "/api/punches",
    request_body = CreatePunch,
    responses(
        (status = 201, description = "Punch registered", body = EnrichedPunch),
        (status = 400, description = "Invalid punch type or already registered today", body = Object, example = json!({
            "error": "Ya registraste un ponche de entrada hoy a las 08:00"
        })),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Employee inactive"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Punch",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "create_punch", skip_all, fields(employee_id = %auth.subject_id, username = %auth.username))]
pub async fn register_punch(
    auth: AuthUser,
    ledger: web::Data<Ledger>,
    directory: web::Data<dyn DirectoryAdmin>,
    payload: web::Json<CreatePunch>,
) -> AppResult<HttpResponse> {
    // a non-string `type` is reported like an unknown one
    let raw = payload.kind.as_ref().and_then(Value::as_str).unwrap_or_default();
    let kind = parse_punch_type(raw)?;

    let punch = ledger.register_punch(&auth.subject_id, kind).await?;
    info!(punch_id = %punch.id, kind = %kind, time = %punch.time, "Punch registered");
    if auth.store_id.as_deref().is_some_and(|s| s != punch.store_id) {
        debug!(token_store = ?auth.store_id, store_id = %punch.store_id, "Employee changed store since login");
    }

    let enriched = enrich_one(directory.get_ref(), punch).await?;
    Ok(HttpResponse::Created().json(enriched))
}

/// List punches (admin)
#[utoipa::path(
    get,
    path = "/api/punches",
    params(
        ("date", Query, description = "Santo Domingo date, YYYY-MM-DD"),
        ("storeId", Query, description = "Filter by store"),
        ("employeeId", Query, description = "Filter by employee")
    ),
    responses(
        (status = 200, description = "Punches matching every given filter", body = Vec<EnrichedPunch>),
        (status = 400, description = "Malformed date"),
        (status = 403, description = "Not an administrator")
    ),
    tag = "Punch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_punches(
    auth: AuthUser,
    ledger: web::Data<Ledger>,
    directory: web::Data<dyn DirectoryAdmin>,
    query: web::Query<PunchQuery>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let filter = PunchFilter {
        date: parse_date(&query.date)?,
        store_id: present(&query.store_id).map(str::to_string),
        employee_id: present(&query.employee_id).map(str::to_string),
        kind: None,
    };
    debug!(?filter, "Listing punches");

    let punches = ledger.list_punches(&filter).await?;
    let names = Names::load(directory.get_ref()).await?;

    let data: Vec<EnrichedPunch> = punches.into_iter().map(|p| names.enrich(p)).collect();
    Ok(HttpResponse::Ok().json(data))
}

/// Punch history of the authenticated employee, newest first
#[utoipa::path(
    get,
    path = "/api/punches/my-punches",
    params(
        ("date", Query, description = "Santo Domingo date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Own punches, newest first", body = Vec<Punch>),
        (status = 400, description = "Malformed date")
    ),
    tag = "Punch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_punches(
    auth: AuthUser,
    ledger: web::Data<Ledger>,
    query: web::Query<DateQuery>,
) -> AppResult<HttpResponse> {
    let date = parse_date(&query.date)?;
    let punches = ledger.employee_history(&auth.subject_id, date).await?;

    Ok(HttpResponse::Ok().json(punches))
}

/// Punch totals per store (admin)
#[utoipa::path(
    get,
    path = "/api/punches/stats/by-store",
    params(
        ("date", Query, description = "Santo Domingo date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "One entry per store", body = Vec<StoreStats>),
        (status = 403, description = "Not an administrator")
    ),
    tag = "Punch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn stats_by_store(
    auth: AuthUser,
    ledger: web::Data<Ledger>,
    query: web::Query<DateQuery>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let date = parse_date(&query.date)?;
    let stats = ledger.stats_by_store(date).await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// Employees with the most bathroom breaks (admin)
#[utoipa::path(
    get,
    path = "/api/punches/stats/bathroom",
    params(
        ("limit", Query, description = "Maximum entries, default 10, at most 100")
    ),
    responses(
        (status = 200, description = "Ranking by bathroom-out count", body = Vec<BathroomStat>),
        (status = 403, description = "Not an administrator")
    ),
    tag = "Punch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn bathroom_stats(
    auth: AuthUser,
    ledger: web::Data<Ledger>,
    directory: web::Data<dyn DirectoryAdmin>,
    query: web::Query<RankingQuery>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let limit = parse_limit(&query.limit)?;
    let ranking = ledger.top_bathroom_offenders(limit).await?;
    let names = Names::load(directory.get_ref()).await?;

    let data: Vec<BathroomStat> = ranking
        .into_iter()
        .map(|tally| BathroomStat {
            employee_name: names.employee(&tally.employee_id),
            store_name: names.store(&tally.store_id),
            employee_id: tally.employee_id,
            count: tally.count,
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}
