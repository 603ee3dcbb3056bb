use tracing::info;

use crate::error::AppError;
use crate::models::route::{NewRoute, Route};
use crate::state::AppState;

pub fn create_route(state: &AppState, request: NewRoute) -> Result<Route, AppError> {
    for (field, value) in [
        ("name", &request.name),
        ("origin_city", &request.origin_city),
        ("destination_city", &request.destination_city),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::required(field));
        }
    }
    if !request.distance_km.is_finite() || request.distance_km <= 0.0 {
        return Err(AppError::validation("distance_km", "distance_km must be > 0"));
    }
    if !request.estimated_duration_hours.is_finite() || request.estimated_duration_hours <= 0.0 {
        return Err(AppError::validation(
            "estimated_duration_hours",
            "estimated_duration_hours must be > 0",
        ));
    }

    let route = Route {
        id: state.route_ids.next(),
        name: request.name.trim().to_string(),
        origin_city: request.origin_city.trim().to_string(),
        destination_city: request.destination_city.trim().to_string(),
        distance_km: request.distance_km,
        estimated_duration_hours: request.estimated_duration_hours,
        transport_mode: request.transport_mode,
        is_active: true,
        created_at: state.clock.now(),
    };
    state.routes.insert(route.id, route.clone());

    info!(route_id = route.id, name = %route.name, "route added to catalog");
    Ok(route)
}

pub fn list_active_routes(state: &AppState) -> Vec<Route> {
    let mut routes: Vec<Route> = state
        .routes
        .iter()
        .filter(|entry| entry.is_active)
        .map(|entry| entry.value().clone())
        .collect();
    routes.sort_by_key(|route| route.id);
    routes
}
