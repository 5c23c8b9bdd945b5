pub mod auth;
pub mod contact;
pub mod error;
pub mod health;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::infrastructure::rate_limit::rate_limit_middleware;
use crate::infrastructure::AppState;

/// All rate-limited routes. The limiter is a route layer so it sees the
/// matched route template and runs before any extractor.
pub fn api_router(state: AppState) -> Router {
    let limited = Router::new()
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        // Contacts
        .route(
            "/contacts/",
            get(contact::list_contacts).post(contact::create_contact),
        )
        .route("/contacts/birthdays/", get(contact::upcoming_birthdays))
        .route(
            "/contacts/:id",
            get(contact::get_contact)
                .patch(contact::update_contact)
                .delete(contact::delete_contact),
        )
        .route_layer(from_fn_with_state(state.clone(), rate_limit_middleware));

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .merge(limited)
        .with_state(state)
}
