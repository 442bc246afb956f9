use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(protected)
}

/// Unauthenticated routes: register and login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Everything behind a bearer token.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/me", routing::get(handlers::get_current_user))
        // Users
        .route("/users", routing::get(handlers::user::list_field_heads))
        .route(
            "/users/{user_id}",
            routing::get(handlers::user::get_user).put(handlers::user::update_user),
        )
        // Reports
        .route(
            "/reports",
            routing::post(handlers::report::create_report).get(handlers::report::list_reports),
        )
        .route(
            "/reports/user/{user_id}",
            routing::get(handlers::report::list_user_reports),
        )
        .route(
            "/reports/department/{department}",
            routing::get(handlers::report::department_reports),
        )
        .route(
            "/reports/department-history/{department}",
            routing::get(handlers::report::department_history),
        )
        .route(
            "/reports/{report_id}",
            routing::get(handlers::report::get_report),
        )
        .route(
            "/reports/{report_id}/verify",
            routing::put(handlers::report::verify_report),
        )
        .route(
            "/reports/{report_id}/assign",
            routing::put(handlers::report::assign_report),
        )
        .route(
            "/reports/{report_id}/status",
            routing::put(handlers::report::update_report_status),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!(?rule, "Invalid rate limit rule, serving without a limit");
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
