//! Unit domain model.
//!
//! # Responsibility
//! - Define the canonical record for a rentable capsule or cabin.
//! - Provide the defaulting factory used for trusted construction.
//! - Expose schema predicates for route-level validation.
//!
//! # Invariants
//! - `id` is stable and never reused for another unit.
//! - `name` is never blank.
//! - `last_updated` is canonical and advances on every successful update.

use crate::model::timestamp::Timestamp;
use crate::validate::{self, FieldError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every unit.
pub type UnitId = Uuid;

/// Physical category of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    #[serde(rename = "capsule")]
    Capsule,
    #[serde(rename = "cabin")]
    Cabin,
}

impl UnitType {
    pub const ALL: [UnitType; 2] = [UnitType::Capsule, UnitType::Cabin];

    /// Wire/storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Capsule => "capsule",
            Self::Cabin => "cabin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for UnitType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Housekeeping/occupancy lifecycle state.
///
/// New units start as `Available`. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Ready for a guest.
    Available,
    /// A guest is checked in.
    Occupied,
    /// Housekeeping is turning the unit over.
    #[serde(rename = "Cleaning In Progress")]
    CleaningInProgress,
    /// Blocked until repaired.
    #[serde(rename = "Maintenance Needed")]
    MaintenanceNeeded,
}

impl UnitStatus {
    pub const ALL: [UnitStatus; 4] = [
        UnitStatus::Available,
        UnitStatus::Occupied,
        UnitStatus::CleaningInProgress,
        UnitStatus::MaintenanceNeeded,
    ];

    /// Wire/storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Occupied => "Occupied",
            Self::CleaningInProgress => "Cleaning In Progress",
            Self::MaintenanceNeeded => "Maintenance Needed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl Display for UnitStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for a typed unit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitValidationError {
    /// `id` must not be the nil UUID.
    NilId,
    /// `name` must contain at least one non-whitespace character.
    BlankName,
}

impl Display for UnitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "unit id must not be nil"),
            Self::BlankName => write!(f, "unit name must not be blank"),
        }
    }
}

impl Error for UnitValidationError {}

/// Canonical unit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UnitRecord")]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: UnitType,
    pub status: UnitStatus,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Timestamp,
}

/// Unchecked wire shape; every deserialized `Unit` passes `validate()`.
#[derive(Deserialize)]
struct UnitRecord {
    id: UnitId,
    name: String,
    #[serde(rename = "type")]
    kind: UnitType,
    status: UnitStatus,
    #[serde(rename = "lastUpdated")]
    last_updated: Timestamp,
}

impl TryFrom<UnitRecord> for Unit {
    type Error = UnitValidationError;

    fn try_from(record: UnitRecord) -> Result<Self, Self::Error> {
        let unit = Unit {
            id: record.id,
            name: record.name,
            kind: record.kind,
            status: record.status,
            last_updated: record.last_updated,
        };
        unit.validate()?;
        Ok(unit)
    }
}

/// Caller-supplied overrides for `Unit::new`. Unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitDraft {
    pub id: Option<UnitId>,
    pub name: Option<String>,
    pub kind: Option<UnitType>,
    pub status: Option<UnitStatus>,
    pub last_updated: Option<Timestamp>,
}

/// Validated create payload. `id` and `lastUpdated` are server-assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUnit {
    pub name: String,
    pub kind: UnitType,
    pub status: UnitStatus,
}

/// Partial update. Unset fields are left untouched by `apply_to`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitPatch {
    pub name: Option<String>,
    pub kind: Option<UnitType>,
    pub status: Option<UnitStatus>,
    pub last_updated: Option<Timestamp>,
}

impl UnitPatch {
    /// Patch that only moves `status`.
    pub fn status(status: UnitStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.status.is_none()
            && self.last_updated.is_none()
    }

    /// Merges set fields over `unit`.
    pub fn apply_to(&self, unit: &mut Unit) {
        if let Some(name) = &self.name {
            unit.name = name.clone();
        }
        if let Some(kind) = self.kind {
            unit.kind = kind;
        }
        if let Some(status) = self.status {
            unit.status = status;
        }
        if let Some(last_updated) = self.last_updated {
            unit.last_updated = last_updated;
        }
    }

    /// JSON object of the set fields, using wire names.
    pub fn to_json_fields(&self) -> serde_json::Map<String, Value> {
        let mut fields = serde_json::Map::new();
        if let Some(name) = &self.name {
            fields.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(kind) = self.kind {
            fields.insert("type".to_string(), Value::String(kind.as_str().to_string()));
        }
        if let Some(status) = self.status {
            fields.insert(
                "status".to_string(),
                Value::String(status.as_str().to_string()),
            );
        }
        if let Some(last_updated) = self.last_updated {
            fields.insert(
                "lastUpdated".to_string(),
                Value::String(last_updated.to_string()),
            );
        }
        fields
    }
}

impl Unit {
    /// Builds a unit from defaults overlaid with `draft`, then validates it.
    ///
    /// Defaults: fresh v4 id, empty name, `Capsule`, `Available`, now.
    /// This is for trusted construction; raw request input goes through
    /// `validate::parse_create` first.
    ///
    /// # Errors
    /// - `BlankName` when no usable name was supplied.
    /// - `NilId` when the supplied id is nil.
    pub fn new(draft: UnitDraft) -> Result<Self, UnitValidationError> {
        let unit = Self {
            id: draft.id.unwrap_or_else(Uuid::new_v4),
            name: draft.name.unwrap_or_default(),
            kind: draft.kind.unwrap_or(UnitType::Capsule),
            status: draft.status.unwrap_or(UnitStatus::Available),
            last_updated: draft.last_updated.unwrap_or_else(Timestamp::now),
        };
        unit.validate()?;
        Ok(unit)
    }

    /// Checks record invariants not already enforced by the field types.
    pub fn validate(&self) -> Result<(), UnitValidationError> {
        if self.id.is_nil() {
            return Err(UnitValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(UnitValidationError::BlankName);
        }
        Ok(())
    }

    /// Returns whether `arg` satisfies the full-record schema.
    ///
    /// `on_error` is called once per failing field.
    pub fn test(arg: &Value, on_error: impl FnMut(&FieldError)) -> bool {
        report(validate::parse_unit(arg), on_error)
    }

    /// Returns whether `arg` satisfies the create schema.
    pub fn test_create(arg: &Value, on_error: impl FnMut(&FieldError)) -> bool {
        report(validate::parse_create(arg), on_error)
    }

    /// Returns whether `arg` satisfies the update schema.
    pub fn test_update(arg: &Value, on_error: impl FnMut(&FieldError)) -> bool {
        report(validate::parse_update(arg), on_error)
    }
}

fn report<T>(
    result: Result<T, validate::ValidationErrors>,
    mut on_error: impl FnMut(&FieldError),
) -> bool {
    match result {
        Ok(_) => true,
        Err(errors) => {
            errors.iter().for_each(&mut on_error);
            false
        }
    }
}
