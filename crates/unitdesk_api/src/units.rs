//! Unit request handlers.
//!
//! # Responsibility
//! - Parse and validate request input before touching the service.
//! - Shape successful results into `{ "unit": ... }` / `{ "units": [...] }`.
//!
//! # Invariants
//! - Handlers never panic and always return a response.
//! - Store failures surface as 500 with a generic message.

use crate::error::ApiError;
use crate::response::{ApiResponse, StatusCode};
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use unitdesk_core::validate::{parse_create, parse_filter, parse_update, unwrap_envelope};
use unitdesk_core::{UnitId, UnitRepository, UnitService};

const UNIT_KEY: &str = "unit";

/// Raw list query; each field is the untouched query-string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Handler set over one `UnitService`.
pub struct UnitsApi<R: UnitRepository> {
    service: UnitService<R>,
}

impl<R: UnitRepository> UnitsApi<R> {
    pub fn new(service: UnitService<R>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &UnitService<R> {
        &self.service
    }

    /// `GET /units`.
    ///
    /// # Contract
    /// - 200 `{ "units": [...] }` in stored order.
    /// - 400 when `status` or `type` names no declared value.
    pub fn list(&self, query: &ListQuery) -> ApiResponse {
        self.try_list(query).unwrap_or_else(ApiError::into_response)
    }

    /// `GET /units/:id`.
    ///
    /// # Contract
    /// - 200 `{ "unit": ... }`.
    /// - 404 with no body when the id is unknown or not a UUID.
    pub fn get_one(&self, id: &str) -> ApiResponse {
        let Some(id) = parse_id(id) else {
            return ApiResponse::empty(StatusCode::NOT_FOUND);
        };
        match self.service.get_one(id) {
            Ok(Some(unit)) => ApiResponse::json(StatusCode::OK, json!({ UNIT_KEY: unit })),
            Ok(None) => ApiResponse::empty(StatusCode::NOT_FOUND),
            Err(err) => ApiError::from(err).into_response(),
        }
    }

    /// `POST /units` with `{ "unit": { name, type, status } }`.
    ///
    /// # Contract
    /// - 201 `{ "unit": <full record> }`.
    /// - 400 when the payload is malformed.
    pub fn create(&self, body: &Value) -> ApiResponse {
        self.try_create(body).unwrap_or_else(ApiError::into_response)
    }

    /// `PUT /units/:id` with `{ "unit": <partial> }`.
    ///
    /// # Contract
    /// - 200 `{ "unit": { id, ...applied fields, lastUpdated } }`.
    /// - 400 for malformed payloads and forbidden status moves.
    /// - 404 `{ "error": "Unit not found!" }`.
    /// - The body is validated before the id is looked up.
    pub fn update(&self, id: &str, body: &Value) -> ApiResponse {
        self.try_update(id, body).unwrap_or_else(ApiError::into_response)
    }

    fn try_list(&self, query: &ListQuery) -> Result<ApiResponse, ApiError> {
        let filter = parse_filter(
            query.name.as_deref(),
            query.status.as_deref(),
            query.kind.as_deref(),
        )?;
        let units = self.service.get_all(filter)?;
        Ok(ApiResponse::json(StatusCode::OK, json!({ "units": units })))
    }

    fn try_create(&self, body: &Value) -> Result<ApiResponse, ApiError> {
        let payload = parse_create(unwrap_envelope(body, UNIT_KEY)?)?;
        let unit = self.service.create_unit(payload)?;
        Ok(ApiResponse::json(StatusCode::CREATED, json!({ UNIT_KEY: unit })))
    }

    fn try_update(&self, raw_id: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        let patch = parse_update(unwrap_envelope(body, UNIT_KEY)?)?;
        let id = parse_id(raw_id).ok_or_else(|| ApiError::UnknownId(raw_id.to_string()))?;
        let applied = self.service.update_one(id, patch)?;

        let mut fields = serde_json::Map::new();
        fields.insert("id".to_string(), Value::String(id.to_string()));
        fields.extend(applied.to_json_fields());
        Ok(ApiResponse::json(
            StatusCode::OK,
            json!({ UNIT_KEY: Value::Object(fields) }),
        ))
    }
}

fn parse_id(raw: &str) -> Option<UnitId> {
    match UnitId::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(err) => {
            debug!("event=unit_id_parse module=api status=rejected id={raw} error={err}");
            None
        }
    }
}
