use std::sync::Arc;

use actix_web::web::{self, Data};
use tracing::debug;

use crate::directory::DirectoryAdmin;
use crate::error::AppError;
use crate::ledger::{Ledger, PunchStore};

/// Shared services handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Data<Ledger>,
    pub directory: Data<dyn DirectoryAdmin>,
}

impl AppState {
    pub fn new<D>(punches: Arc<dyn PunchStore>, directory: Arc<D>) -> Self
    where
        D: DirectoryAdmin + 'static,
    {
        let ledger = Ledger::new(punches, directory.clone());
        let directory: Arc<dyn DirectoryAdmin> = directory;

        Self {
            ledger: Data::new(ledger),
            directory: Data::from(directory),
        }
    }

    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.ledger.clone())
            .app_data(self.directory.clone())
            .app_data(json_config());
    }
}

/// Unparseable bodies get the same `{"error": ...}` shape as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        debug!(error = %err, path = req.path(), "Rejected request body");
        AppError::InvalidArgument("Cuerpo de la solicitud inválido".into()).into()
    })
}
