use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use store::{validate_key, KeySnapshot, PutOutcome, Value};
use tracing::debug;

use crate::errors::JsonApiError;
use crate::observability::{GET_MISS_TOTAL, GET_TOTAL, PUT_TOTAL};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub key: Option<String>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct PutSummary {
    pub created: usize,
    pub replaced: usize,
}

#[derive(Debug, Serialize)]
pub struct CountBody {
    pub count: usize,
}

/// `GET /get?key=K`: the stored JSON value, or 404 when the key is absent.
pub async fn get_value(
    State(state): State<AppState>,
    query: Result<Query<GetParams>, QueryRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Query(params) = query.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
    let key = params
        .key
        .ok_or_else(|| JsonApiError::bad_request("missing `key` query parameter"))?;
    validate_key(&key)?;

    GET_TOTAL.inc();
    match state.store.get(&key).await? {
        Some(value) => Ok(Json(value)),
        None => {
            GET_MISS_TOTAL.inc();
            debug!(%key, "get miss");
            Err(JsonApiError::not_found(format!("key `{key}` not found")))
        }
    }
}

/// `PUT /put` with a JSON object body; every top-level field is stored as one entry.
///
/// The whole body is checked before the first write, so a rejected request
/// stores nothing. Accepted fields are written one by one; there is no
/// cross-key atomicity.
pub async fn put_values(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PutSummary>, JsonApiError> {
    let parsed: Value = serde_json::from_slice(&body)
        .map_err(|e| JsonApiError::bad_request(format!("could not parse body: {e}")))?;
    let Value::Object(fields) = parsed else {
        return Err(JsonApiError::bad_request("body must be a JSON object"));
    };
    for key in fields.keys() {
        validate_key(key)?;
    }

    let mut summary = PutSummary::default();
    for (key, value) in fields {
        match state.store.put(key, value).await? {
            PutOutcome::Created => summary.created += 1,
            PutOutcome::Replaced => summary.replaced += 1,
        }
        PUT_TOTAL.inc();
    }
    debug!(created = summary.created, replaced = summary.replaced, "put applied");
    Ok(Json(summary))
}

/// `GET /keys`: keys and count from one snapshot.
pub async fn list_keys(State(state): State<AppState>) -> Json<KeySnapshot> {
    Json(state.store.snapshot().await)
}

/// `GET /count`
pub async fn count_keys(State(state): State<AppState>) -> Json<CountBody> {
    Json(CountBody { count: state.store.count().await })
}
