//! `/events` handlers.
//!
//! Each handler checks the caller's role permission, opens one unit of work,
//! runs the [`EventManager`] operation and settles the unit on the outcome.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use eventhub_auth::Permission;
use eventhub_core::EventId;
use eventhub_ticketing::{settle, EventManager, EventUpdate};

use crate::app::dto::{CreateEventRequest, ListEventsQuery, UpdateEventRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/", get(list_events).post(create_event))
        .route("/events/:id", put(update_event).delete(delete_event))
}

fn guard(principal: &PrincipalContext, required: &Permission) -> Result<(), axum::response::Response> {
    crate::authz::require(principal, required)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}

fn parse_event_id(raw: &str) -> Result<EventId, axum::response::Response> {
    EventId::from_str(raw)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

fn bad_body(rejection: JsonRejection) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = guard(&principal, &Permission::EVENTS_CREATE) {
        return resp;
    }
    let Json(fields) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    let mut uow = match services.begin().await {
        Ok(uow) => uow,
        Err(e) => return errors::store_error_to_response(e),
    };
    let result = EventManager::create(uow.as_mut(), fields, principal.user_id()).await;

    match settle(uow, result).await {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(e) => errors::manager_error_to_response(e),
    }
}

/// `?event_id=N` returns that single event; without it, all of them.
pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<ListEventsQuery>, QueryRejection>,
) -> axum::response::Response {
    if let Err(resp) = guard(&principal, &Permission::EVENTS_READ) {
        return resp;
    }
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
        }
    };

    let mut uow = match services.begin().await {
        Ok(uow) => uow,
        Err(e) => return errors::store_error_to_response(e),
    };

    // Ids start at 1, so `event_id=0` is treated like an absent filter.
    match query.event_id.filter(|id| *id != 0).map(EventId::new) {
        Some(event_id) => {
            let result = EventManager::get(uow.as_mut(), event_id).await;
            match settle(uow, result).await {
                Ok(event) => Json(event).into_response(),
                Err(e) => errors::manager_error_to_response(e),
            }
        }
        None => {
            let result = EventManager::list(uow.as_mut()).await;
            match settle(uow, result).await {
                Ok(events) => Json(events).into_response(),
                Err(e) => errors::manager_error_to_response(e),
            }
        }
    }
}

pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = guard(&principal, &Permission::EVENTS_UPDATE) {
        return resp;
    }
    let event_id = match parse_event_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let update = match EventUpdate::new(body.fields, body.status) {
        Ok(update) => update,
        Err(e) => return errors::manager_error_to_response(e.into()),
    };

    let mut uow = match services.begin().await {
        Ok(uow) => uow,
        Err(e) => return errors::store_error_to_response(e),
    };
    let result = EventManager::update(uow.as_mut(), event_id, principal.user_id(), update).await;

    match settle(uow, result).await {
        Ok(event) => Json(event).into_response(),
        Err(e) => errors::manager_error_to_response(e),
    }
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = guard(&principal, &Permission::EVENTS_DELETE) {
        return resp;
    }
    let event_id = match parse_event_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut uow = match services.begin().await {
        Ok(uow) => uow,
        Err(e) => return errors::store_error_to_response(e),
    };
    let result = EventManager::delete(uow.as_mut(), event_id, principal.user_id()).await;

    match settle(uow, result).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::manager_error_to_response(e),
    }
}
