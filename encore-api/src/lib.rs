use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod events;
pub mod middleware;
pub mod reservations;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = Router::new()
        .route("/v1/events", get(events::list_events))
        .route("/v1/events/{event_id}/pricing", get(events::event_pricing))
        .route("/v1/organizers/{organizer_id}/slots", get(reservations::organizer_slots));

    let protected = Router::new()
        .route("/v1/events/recommended", get(events::recommended_events))
        .route(
            "/v1/bookings",
            get(bookings::list_my_bookings).post(bookings::confirm_booking),
        )
        .route("/v1/bookings/payment-return", get(bookings::payment_return))
        .route("/v1/reservations", axum::routing::post(reservations::create_reservation))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
