use serde_json::{json, Value};
use unitdesk_api::{ApiResponse, ListQuery, StatusCode, UnitsApi};
use unitdesk_core::{
    CreateStatusPolicy, JsonFileStore, MemoryStore, StoreUnitRepository, UnitService,
    OCCUPIED_TO_AVAILABLE_ERR, UNIT_NOT_FOUND_ERR,
};
use uuid::Uuid;

type MemoryApi = UnitsApi<StoreUnitRepository<MemoryStore>>;

fn memory_api(policy: CreateStatusPolicy) -> MemoryApi {
    let service = UnitService::new(StoreUnitRepository::new(MemoryStore::new()))
        .with_create_status(policy);
    UnitsApi::new(service)
}

fn body(response: &ApiResponse) -> &Value {
    response.body.as_ref().unwrap()
}

fn create(api: &MemoryApi, name: &str, kind: &str, status: &str) -> String {
    let response = api.create(&json!({ "unit": { "name": name, "type": kind, "status": status } }));
    assert_eq!(response.status, StatusCode::CREATED);
    body(&response)["unit"]["id"].as_str().unwrap().to_string()
}

#[test]
fn create_returns_full_record_with_forced_available() {
    let api = memory_api(CreateStatusPolicy::ForceAvailable);
    let response = api.create(&json!({
        "unit": { "name": "Test-Cabin", "type": "cabin", "status": "Occupied" }
    }));

    assert_eq!(response.status, StatusCode::CREATED);
    let unit = &body(&response)["unit"];
    assert_eq!(unit["name"], "Test-Cabin");
    assert_eq!(unit["type"], "cabin");
    assert_eq!(unit["status"], "Available");
    assert!(Uuid::parse_str(unit["id"].as_str().unwrap()).is_ok());
    assert!(unit["lastUpdated"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn create_honors_requested_status_when_configured() {
    let api = memory_api(CreateStatusPolicy::HonorRequested);
    let response = api.create(&json!({
        "unit": { "name": "Test-Cabin", "type": "cabin", "status": "Maintenance Needed" }
    }));
    assert_eq!(body(&response)["unit"]["status"], "Maintenance Needed");
}

#[test]
fn create_rejects_malformed_payloads() {
    let api = memory_api(CreateStatusPolicy::ForceAvailable);

    let missing_envelope = api.create(&json!({ "name": "x", "type": "cabin", "status": "Available" }));
    assert_eq!(missing_envelope.status, StatusCode::BAD_REQUEST);

    let bad_type = api.create(&json!({
        "unit": { "name": "x", "type": "villa", "status": "Available" }
    }));
    assert_eq!(bad_type.status, StatusCode::BAD_REQUEST);
    assert!(bad_type.error_message().unwrap().contains("type"));

    let list = api.list(&Default::default());
    assert_eq!(body(&list)["units"], json!([]));
}

#[test]
fn get_one_returns_unit_or_empty_404() {
    let api = memory_api(CreateStatusPolicy::ForceAvailable);
    let id = create(&api, "Test-Capsule", "capsule", "Available");

    let found = api.get_one(&id);
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(body(&found)["unit"]["id"], id.as_str());

    let missing = api.get_one(&Uuid::new_v4().to_string());
    assert_eq!(missing, ApiResponse::empty(StatusCode::NOT_FOUND));

    let garbage = api.get_one("not-a-uuid");
    assert_eq!(garbage, ApiResponse::empty(StatusCode::NOT_FOUND));
}

#[test]
fn list_filters_by_type_and_status_and_rejects_unknown_values() {
    let api = memory_api(CreateStatusPolicy::HonorRequested);
    create(&api, "A", "capsule", "Available");
    create(&api, "B", "cabin", "Occupied");
    create(&api, "C", "cabin", "Available");

    let response = api.list(&ListQuery {
        kind: Some("cabin".to_string()),
        status: Some("Available".to_string()),
        ..ListQuery::default()
    });
    assert_eq!(response.status, StatusCode::OK);
    let units = body(&response)["units"].as_array().unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0]["name"], "C");

    let unknown = api.list(&ListQuery {
        status: Some("Dirty".to_string()),
        ..ListQuery::default()
    });
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let all = api.list(&ListQuery {
        name: Some(String::new()),
        ..ListQuery::default()
    });
    let names: Vec<&str> = body(&all)["units"]
        .as_array()
        .unwrap()
        .iter()
        .map(|unit| unit["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn update_returns_id_applied_fields_and_timestamp() {
    let api = memory_api(CreateStatusPolicy::ForceAvailable);
    let id = create(&api, "Test-Capsule", "capsule", "Available");

    let response = api.update(&id, &json!({ "unit": { "status": "Occupied" } }));
    assert_eq!(response.status, StatusCode::OK);
    let unit = body(&response)["unit"].as_object().unwrap();
    assert_eq!(unit["id"], id.as_str());
    assert_eq!(unit["status"], "Occupied");
    assert!(unit.contains_key("lastUpdated"));
    assert!(!unit.contains_key("name"));
    assert!(!unit.contains_key("type"));
}

#[test]
fn occupied_to_available_is_a_400_with_fixed_message() {
    let api = memory_api(CreateStatusPolicy::HonorRequested);
    let id = create(&api, "Test-Capsule", "capsule", "Occupied");

    let response = api.update(&id, &json!({ "unit": { "status": "Available" } }));
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_message(), Some(OCCUPIED_TO_AVAILABLE_ERR));

    let stored = api.get_one(&id);
    assert_eq!(body(&stored)["unit"]["status"], "Occupied");

    let cleaning = api.update(&id, &json!({ "unit": { "status": "Cleaning In Progress" } }));
    assert_eq!(cleaning.status, StatusCode::OK);
}

#[test]
fn update_unknown_id_is_404_with_message() {
    let api = memory_api(CreateStatusPolicy::ForceAvailable);
    let payload = json!({ "unit": { "status": "Occupied" } });

    let unknown = api.update(&Uuid::new_v4().to_string(), &payload);
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.error_message(), Some(UNIT_NOT_FOUND_ERR));

    let garbage = api.update("nope", &payload);
    assert_eq!(garbage.status, StatusCode::NOT_FOUND);
    assert_eq!(garbage.error_message(), Some(UNIT_NOT_FOUND_ERR));
}

#[test]
fn update_validates_body_before_looking_up_id() {
    let api = memory_api(CreateStatusPolicy::ForceAvailable);
    let response = api.update("nope", &json!({ "unit": { "status": "Sleeping" } }));
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[test]
fn store_failure_is_a_generic_500() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("units.json");
    std::fs::write(&path, "{ not json").unwrap();
    let api = UnitsApi::new(UnitService::new(StoreUnitRepository::new(JsonFileStore::new(&path))));

    let response = api.list(&Default::default());
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = response.error_message().unwrap();
    assert!(!message.contains("units.json"));
}
