use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::auth::Actor;
use crate::engine::catalog::{create_route, list_active_routes};
use crate::error::AppError;
use crate::models::route::{NewRoute, Route};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/routes", post(create).get(list))
}

#[derive(Serialize)]
pub struct RouteList {
    pub routes: Vec<Route>,
}

async fn create(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<NewRoute>,
) -> Result<(StatusCode, Json<Route>), AppError> {
    actor.require_admin()?;
    let route = create_route(&state, payload)?;
    Ok((StatusCode::CREATED, Json(route)))
}

async fn list(State(state): State<Arc<AppState>>, _actor: Actor) -> Json<RouteList> {
    Json(RouteList {
        routes: list_active_routes(&state),
    })
}
