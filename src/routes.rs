use crate::{
    api::{employee, health, punch, store},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond((60_000 / requests_per_min as u64).max(1))
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            // Public routes
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(login_limiter.clone())
                            .route(web::post().to(handlers::login)),
                    )
                    .service(
                        web::resource("/verify")
                            .wrap(login_limiter)
                            .route(web::get().to(handlers::verify)),
                    ),
            )
            .service(web::resource("/health").route(web::get().to(health::health)))
            // Protected routes: rate limited, then authenticated
            .service(
                web::scope("/punches")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    // /punches
                    .service(
                        web::resource("")
                            .route(web::post().to(punch::register_punch))
                            .route(web::get().to(punch::list_punches)),
                    )
                    .service(web::resource("/my-punches").route(web::get().to(punch::my_punches)))
                    .service(
                        web::resource("/stats/by-store").route(web::get().to(punch::stats_by_store)),
                    )
                    .service(
                        web::resource("/stats/bathroom").route(web::get().to(punch::bathroom_stats)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    // must be registered before /{id}
                    .service(
                        web::resource("/change-password")
                            .route(web::put().to(employee::change_password)),
                    )
                    .service(
                        web::resource("/store/{store_id}").route(web::get().to(employee::list_by_store)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/stores")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter)
                    // /stores
                    .service(
                        web::resource("")
                            .route(web::get().to(store::list_stores))
                            .route(web::post().to(store::create_store)),
                    )
                    // /stores/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(store::get_store))
                            .route(web::put().to(store::update_store)),
                    ),
            ),
    );
}

// LOGIN
//  └─ token (8 h by default)

// API REQUEST
//  └─ Authorization: Bearer token
