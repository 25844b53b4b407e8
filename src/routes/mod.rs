pub mod questions;
pub mod sign_up;
pub mod users;
pub mod web;

use axum::Router;
use crate::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(web::routes())
        .merge(questions::routes())
        .merge(sign_up::routes())
        .merge(users::routes())
        .fallback(web::not_found)
}
