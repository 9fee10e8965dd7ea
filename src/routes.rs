use crate::{
    api::{balance, holiday, leave, policy},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::my_leaves))
                            .route(web::post().to(leave::apply_leave)),
                    )
                    // /leave/approvals
                    .service(
                        web::resource("/approvals")
                            .route(web::get().to(leave::pending_approvals)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    )
                    // /leave/{id}/withdraw
                    .service(
                        web::resource("/{id}/withdraw")
                            .route(web::put().to(leave::withdraw_leave)),
                    ),
            )
            .service(
                web::scope("/balance")
                    .service(web::resource("").route(web::get().to(balance::my_balances)))
                    .service(
                        web::resource("/special-credit")
                            .route(web::post().to(balance::special_credit)),
                    )
                    .service(
                        web::resource("/{user_id}/annual-credit")
                            .route(web::post().to(balance::annual_credit_user)),
                    ),
            )
            .service(
                web::scope("/policy").service(
                    web::resource("")
                        .route(web::get().to(policy::list_policies))
                        .route(web::post().to(policy::create_policy)),
                ),
            )
            .service(
                web::scope("/holiday")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(holiday::delete_holiday)),
                    ),
            ),
    );
}
