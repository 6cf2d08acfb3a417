use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{self, CorsLayer},
    trace::TraceLayer,
};
use tracing::info_span;

use crate::core::error;
use crate::core::state::AppState;
use crate::routes::{auth, comment, post as posts, user};
use crate::utils;

pub(crate) fn routes(state: AppState) -> Router {
    let authenticate = middleware::from_fn_with_state(state.clone(), utils::auth::authenticate);

    // /users/...
    let user_router = Router::new()
        .route("/", get(user::get_all))
        .route("/register", post(user::register))
        .route("/email/{email}", get(user::email_available))
        .route("/nickname/{nickname}", get(user::nickname_available))
        .route("/{id}", get(user::get))
        .route("/{id}", delete(user::delete).layer(authenticate.clone()))
        .route("/{id}/image", get(user::image))
        .route(
            "/{id}/password",
            put(user::update_password).layer(authenticate.clone()),
        )
        .route(
            "/{id}/profile",
            put(user::update_profile).layer(authenticate.clone()),
        );

    // /posts/...
    let post_router = Router::new()
        .route("/", get(posts::get_all))
        .route("/", post(posts::create).layer(authenticate.clone()))
        .route("/{id}", get(posts::get))
        .route(
            "/{id}",
            put(posts::update)
                .delete(posts::delete)
                .layer(authenticate.clone()),
        )
        .route("/{id}/image", get(posts::image))
        .route("/{id}/views", post(posts::increment_views))
        .route("/{id}/comments", get(comment::get_by_post));

    // /comments/...
    let comment_router = Router::new()
        .route("/", post(comment::create).layer(authenticate.clone()))
        .route(
            "/{id}",
            put(comment::update)
                .delete(comment::delete)
                .layer(authenticate),
        );

    Router::new()
        .route("/", get(|| async { "Hello, World!" }))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .nest("/users", user_router)
        .nest("/posts", post_router)
        .nest("/comments", comment_router)
        .with_state(state)
        .route_layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        let matched_path = request
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str);

                        info_span!(
                            "request",
                            method = ?request.method(),
                            matched_path,
                        )
                    }),
                )
                .layer(axum::error_handling::HandleErrorLayer::new(
                    error::handle_middleware_errors,
                ))
                .buffer(128)
                .rate_limit(10, Duration::from_secs(1))
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                        .allow_origin(cors::Any),
                ),
        )
}
