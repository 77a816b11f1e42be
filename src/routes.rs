use crate::{
    api::{attendance, intern, leave_request, scanner, supervisor, user},
    auth::{handlers, middleware::auth_middleware, reset},
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
        let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("rate limiter needs a non-zero period and burst");
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register-intern")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register_intern)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/forgot-password")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(reset::forgot_password)),
            )
            .service(
                web::resource("/verify-code")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(reset::verify_code)),
            )
            .service(
                web::resource("/reset-password")
                    .wrap(register_limiter)
                    .route(web::post().to(reset::reset_password)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/users")
                    // /users
                    .service(web::resource("").route(web::post().to(handlers::create_user)))
                    // /users/{id}/password
                    .service(
                        web::resource("/{id}/password")
                            .route(web::put().to(handlers::change_password)),
                    )
                    // /users/{id}/intern | supervisor | handler
                    .service(
                        web::resource("/{id}/intern")
                            .route(web::post().to(user::create_intern_profile)),
                    )
                    .service(
                        web::resource("/{id}/supervisor")
                            .route(web::post().to(user::create_supervisor_profile)),
                    )
                    .service(
                        web::resource("/{id}/handler")
                            .route(web::post().to(user::create_handler_profile)),
                    ),
            )
            .service(
                web::scope("/interns")
                    .service(web::resource("").route(web::get().to(intern::list_interns)))
                    // batch routes before /{id}
                    .service(
                        web::resource("/approve").route(web::put().to(intern::approve_interns)),
                    )
                    .service(
                        web::resource("/archive").route(web::put().to(intern::archive_interns)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(intern::get_intern))
                            .route(web::put().to(intern::update_intern)),
                    )
                    .service(
                        web::resource("/{id}/hours").route(web::get().to(intern::intern_hours)),
                    )
                    .service(
                        web::resource("/{id}/hours/recalculate")
                            .route(web::post().to(intern::recalculate_hours)),
                    )
                    .service(
                        web::resource("/{id}/fcm-token")
                            .route(web::put().to(intern::update_fcm_token)),
                    ),
            )
            .service(
                web::scope("/supervisors")
                    .service(
                        web::resource("").route(web::get().to(supervisor::list_supervisors)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(supervisor::get_supervisor))
                            .route(web::put().to(supervisor::update_supervisor)),
                    )
                    .service(
                        web::resource("/{id}/archive")
                            .route(web::put().to(supervisor::archive_supervisor)),
                    ),
            )
            .service(
                web::resource("/handlers/{id}").route(web::put().to(supervisor::update_handler)),
            )
            .service(
                web::scope("/dtr")
                    .service(web::resource("").route(web::get().to(scanner::list_dtr)))
                    .service(web::resource("/scan").route(web::post().to(scanner::scan)))
                    .service(
                        web::resource("/slot/{slot}").route(web::put().to(scanner::set_slot)),
                    )
                    .service(
                        web::resource("/default-time-in")
                            .route(web::post().to(scanner::default_time_in)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/same-day before /leave/{id}
                    .service(
                        web::resource("/same-day")
                            .route(web::post().to(leave_request::create_same_day_leave)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    .service(
                        web::resource("/{id}/excuse-letter")
                            .route(web::get().to(leave_request::view_excuse_letter)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/summary/{date}")
                            .route(web::get().to(attendance::attendance_summary)),
                    )
                    .service(
                        web::resource("/status/{status}")
                            .route(web::get().to(attendance::attendance_by_status)),
                    )
                    .service(
                        web::resource("/weekly-late").route(web::get().to(attendance::weekly_late)),
                    )
                    .service(
                        web::resource("/monthly")
                            .route(web::get().to(attendance::monthly_attendance)),
                    ),
            )
            .service(
                web::resource("/analytics/school-count")
                    .route(web::get().to(attendance::school_count)),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token
