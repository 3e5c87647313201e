//! Parsing of untrusted JSON into typed unit payloads.
//!
//! # Responsibility
//! - Provide the full, create and update schemas.
//! - Report every invalid or missing field in one pass.
//!
//! # Invariants
//! - A parse either returns a complete typed payload or only errors.
//! - Server-assigned fields (`id`, `lastUpdated`) are never read from
//!   create or update input.

mod field;

use crate::model::timestamp::Timestamp;
use crate::model::unit::{CreateUnit, Unit, UnitPatch, UnitStatus, UnitType};
use crate::repo::unit_repo::UnitFilter;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub use field::{FieldError, FieldIssue, ROOT_FIELD};

/// All field failures found in one input value. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the error reported for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|err| err.field == field)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, err) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Accumulates field results so every failure is reported, not only the first.
struct Collector<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Collector<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            errors: Vec::new(),
        }
    }

    fn required<T>(
        &mut self,
        name: &'static str,
        check: fn(&Value) -> Result<T, FieldIssue>,
    ) -> Option<T> {
        match self.object.get(name) {
            None | Some(Value::Null) => {
                self.errors.push(FieldError::new(name, None, FieldIssue::Missing));
                None
            }
            Some(value) => self.run(name, value, check),
        }
    }

    fn optional<T>(
        &mut self,
        name: &'static str,
        check: fn(&Value) -> Result<T, FieldIssue>,
    ) -> Option<T> {
        match self.object.get(name) {
            None | Some(Value::Null) => None,
            Some(value) => self.run(name, value, check),
        }
    }

    fn run<T>(
        &mut self,
        name: &'static str,
        value: &Value,
        check: fn(&Value) -> Result<T, FieldIssue>,
    ) -> Option<T> {
        match check(value) {
            Ok(parsed) => Some(parsed),
            Err(issue) => {
                self.errors
                    .push(FieldError::new(name, Some(value.clone()), issue));
                None
            }
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

fn as_object(arg: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    arg.as_object().ok_or_else(|| {
        ValidationErrors(vec![FieldError::new(
            ROOT_FIELD,
            Some(arg.clone()),
            FieldIssue::NotAnObject,
        )])
    })
}

/// Parses a complete persisted-shape unit record.
pub fn parse_unit(arg: &Value) -> Result<Unit, ValidationErrors> {
    let object = as_object(arg)?;
    let mut collector = Collector::new(object);

    let id = collector.required("id", check_id);
    let name = collector.required("name", check_name);
    let kind = collector.required("type", check_type);
    let status = collector.required("status", check_status);
    let last_updated = collector.required("lastUpdated", check_timestamp);
    collector.finish()?;

    match (id, name, kind, status, last_updated) {
        (Some(id), Some(name), Some(kind), Some(status), Some(last_updated)) => Ok(Unit {
            id,
            name,
            kind,
            status,
            last_updated,
        }),
        _ => Err(incomplete()),
    }
}

/// Parses a create payload (`name`, `type`, `status`).
pub fn parse_create(arg: &Value) -> Result<CreateUnit, ValidationErrors> {
    let object = as_object(arg)?;
    let mut collector = Collector::new(object);

    let name = collector.required("name", check_name);
    let kind = collector.required("type", check_type);
    let status = collector.required("status", check_status);
    collector.finish()?;

    match (name, kind, status) {
        (Some(name), Some(kind), Some(status)) => Ok(CreateUnit { name, kind, status }),
        _ => Err(incomplete()),
    }
}

/// Parses an update payload; every field is optional.
pub fn parse_update(arg: &Value) -> Result<UnitPatch, ValidationErrors> {
    let object = as_object(arg)?;
    let mut collector = Collector::new(object);

    let name = collector.optional("name", check_name);
    let kind = collector.optional("type", check_type);
    let status = collector.optional("status", check_status);
    collector.finish()?;

    Ok(UnitPatch {
        name,
        kind,
        status,
        last_updated: None,
    })
}

/// Returns `arg[key]` for request envelopes such as `{ "unit": {...} }`.
pub fn unwrap_envelope<'a>(
    arg: &'a Value,
    key: &'static str,
) -> Result<&'a Value, ValidationErrors> {
    let object = as_object(arg)?;
    match object.get(key) {
        None | Some(Value::Null) => Err(ValidationErrors(vec![FieldError::new(
            key,
            None,
            FieldIssue::Missing,
        )])),
        Some(value) => Ok(value),
    }
}

/// Builds a list filter from raw query-string values.
///
/// Absent and empty values leave a field unconstrained; enum values must be
/// declared members.
pub fn parse_filter(
    name: Option<&str>,
    status: Option<&str>,
    kind: Option<&str>,
) -> Result<UnitFilter, ValidationErrors> {
    fn present(value: Option<&str>) -> Option<&str> {
        value.filter(|text| !text.is_empty())
    }

    let mut errors = Vec::new();

    let status = present(status).and_then(|text| match UnitStatus::parse(text) {
        Some(status) => Some(status),
        None => {
            errors.push(FieldError::new(
                "status",
                Some(Value::String(text.to_string())),
                FieldIssue::NotOneOf(UnitStatus::ALL.map(UnitStatus::as_str).to_vec()),
            ));
            None
        }
    });
    let kind = present(kind).and_then(|text| match UnitType::parse(text) {
        Some(kind) => Some(kind),
        None => {
            errors.push(FieldError::new(
                "type",
                Some(Value::String(text.to_string())),
                FieldIssue::NotOneOf(UnitType::ALL.map(UnitType::as_str).to_vec()),
            ));
            None
        }
    });

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }
    Ok(UnitFilter {
        name: present(name).map(str::to_string),
        status,
        kind,
    })
}

// Every `None` above already pushed an error; this only satisfies the match.
fn incomplete() -> ValidationErrors {
    ValidationErrors(vec![FieldError::new(
        ROOT_FIELD,
        None,
        FieldIssue::Invalid("incomplete payload".to_string()),
    )])
}

fn check_id(value: &Value) -> Result<Uuid, FieldIssue> {
    let text = value.as_str().ok_or(FieldIssue::WrongType("string"))?;
    let id = Uuid::parse_str(text).map_err(|_| FieldIssue::Invalid("not a UUID".to_string()))?;
    if id.is_nil() {
        return Err(FieldIssue::Invalid("nil UUID".to_string()));
    }
    Ok(id)
}

fn check_name(value: &Value) -> Result<String, FieldIssue> {
    let text = value.as_str().ok_or(FieldIssue::WrongType("string"))?;
    if text.trim().is_empty() {
        return Err(FieldIssue::Invalid("must not be blank".to_string()));
    }
    Ok(text.to_string())
}

fn check_type(value: &Value) -> Result<UnitType, FieldIssue> {
    let text = value.as_str().ok_or(FieldIssue::WrongType("string"))?;
    UnitType::parse(text)
        .ok_or_else(|| FieldIssue::NotOneOf(UnitType::ALL.map(UnitType::as_str).to_vec()))
}

fn check_status(value: &Value) -> Result<UnitStatus, FieldIssue> {
    let text = value.as_str().ok_or(FieldIssue::WrongType("string"))?;
    UnitStatus::parse(text)
        .ok_or_else(|| FieldIssue::NotOneOf(UnitStatus::ALL.map(UnitStatus::as_str).to_vec()))
}

fn check_timestamp(value: &Value) -> Result<Timestamp, FieldIssue> {
    let text = value.as_str().ok_or(FieldIssue::WrongType("string"))?;
    Timestamp::parse_canonical(text).map_err(|err| FieldIssue::Invalid(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{
        parse_create, parse_filter, parse_unit, parse_update, unwrap_envelope, FieldIssue,
        ROOT_FIELD,
    };
    use crate::model::unit::{UnitStatus, UnitType};
    use serde_json::json;

    #[test]
    fn full_schema_collects_every_bad_field() {
        let errors = parse_unit(&json!({
            "id": 7,
            "name": "",
            "type": "yurt",
            "status": "Occupied",
            "lastUpdated": "2024-03-01T08:15:30Z"
        }))
        .unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.field("id").unwrap().issue, FieldIssue::WrongType("string"));
        assert!(errors.field("name").is_some());
        assert!(errors.field("type").is_some());
        assert!(errors.field("status").is_none());
        assert!(errors.field("lastUpdated").is_some());
    }

    #[test]
    fn create_schema_reports_missing_fields() {
        let errors = parse_create(&json!({ "name": "Pod 1" })).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.field("type").unwrap().issue, FieldIssue::Missing);
        assert_eq!(errors.field("status").unwrap().issue, FieldIssue::Missing);
    }

    #[test]
    fn create_schema_ignores_server_assigned_fields() {
        let payload = parse_create(&json!({
            "id": "not-even-a-uuid",
            "lastUpdated": "yesterday",
            "name": "Cabin A",
            "type": "cabin",
            "status": "Occupied"
        }))
        .unwrap();
        assert_eq!(payload.kind, UnitType::Cabin);
        assert_eq!(payload.status, UnitStatus::Occupied);
    }

    #[test]
    fn update_schema_accepts_empty_and_partial_objects() {
        assert!(parse_update(&json!({})).unwrap().is_empty());

        let patch = parse_update(&json!({ "status": "Cleaning In Progress" })).unwrap();
        assert_eq!(patch.status, Some(UnitStatus::CleaningInProgress));
        assert_eq!(patch.name, None);
        assert_eq!(patch.last_updated, None);
    }

    #[test]
    fn update_schema_rejects_present_but_invalid_fields() {
        let errors = parse_update(&json!({ "status": "Dirty", "name": 3 })).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn non_object_input_is_a_root_error() {
        let errors = parse_update(&json!(["status"])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().field, ROOT_FIELD);
    }

    #[test]
    fn envelope_requires_key() {
        let body = json!({ "unit": { "status": "Occupied" } });
        assert_eq!(
            unwrap_envelope(&body, "unit").unwrap(),
            &json!({ "status": "Occupied" })
        );

        let errors = unwrap_envelope(&json!({ "units": {} }), "unit").unwrap_err();
        assert_eq!(errors.field("unit").unwrap().issue, FieldIssue::Missing);
    }

    #[test]
    fn filter_skips_empty_values_and_rejects_unknown_members() {
        let filter = parse_filter(Some(""), Some("Occupied"), Some("cabin")).unwrap();
        assert_eq!(filter.name, None);
        assert_eq!(filter.status, Some(UnitStatus::Occupied));
        assert_eq!(filter.kind, Some(UnitType::Cabin));

        let errors = parse_filter(None, Some("occupied"), Some("igloo")).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
