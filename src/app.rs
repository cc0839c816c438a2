use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page))
        .route("/log/:date", get(handlers::log_page))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/me", get(handlers::me))
        .route("/api/routines", get(handlers::get_routines))
        .route("/api/exercises", get(handlers::get_exercises))
        .route("/api/history", get(handlers::get_history))
        .route(
            "/api/log/:date",
            get(handlers::get_day).delete(handlers::delete_day),
        )
        .route("/api/log/:date/toggle", post(handlers::toggle))
        .route("/api/log/:date/routines", post(handlers::post_routines))
        .route(
            "/api/log/:date/routines/:routine_id",
            delete(handlers::delete_routine),
        )
        .route(
            "/api/log/:date/memo",
            post(handlers::post_memo).put(handlers::put_memo),
        )
        .with_state(state)
}
