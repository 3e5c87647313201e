//! Route table.

pub const BASE: &str = "/api";
pub const UNITS: &str = "/units";
/// Item route under `BASE`; `:id` is the unit id as sent by the client.
pub const UNIT_ITEM: &str = "/units/:id";
