use pretty_assertions::assert_eq;
use serde_json::json;
use specguard_core::{
    GenericRequest, GenericResponse, GuardError, OperationIndex, SpecCache, SwaggerValidator,
    ViolationKind,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn validator() -> SwaggerValidator {
    let cache = SpecCache::new();
    SwaggerValidator::open(&cache, data("swagger.yaml")).unwrap()
}

#[test]
fn test_load_is_cached_per_source() {
    let cache = SpecCache::new();
    let first = cache.load(data("swagger.yaml")).unwrap();
    let second = cache.load(data("swagger.yaml")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.as_ref(), second.as_ref());
    assert_eq!(cache.parse_count(), 1);
}

#[test]
fn test_load_failures_have_distinct_kinds() {
    let cache = SpecCache::new();
    assert!(matches!(
        cache.load(data("dunno.yaml")),
        Err(GuardError::SpecNotFound { .. })
    ));
    assert!(matches!(
        cache.load(data("notyaml.txt")),
        Err(GuardError::SpecFormat { .. })
    ));
    assert!(matches!(
        cache.load(data("notswagger.yaml")),
        Err(GuardError::SpecSchema { .. })
    ));
    assert!(cache.is_empty());
}

#[test]
fn test_load_rejects_schema_objects_breaking_meta_schema() {
    let cache = SpecCache::new();
    match cache.load(data("badschema.yaml")) {
        Err(GuardError::SpecSchema { problems, .. }) => {
            let pointers: Vec<&str> = problems
                .iter()
                .filter_map(|p| p.split(':').next())
                .collect();
            assert!(pointers.contains(&"#/paths/~1subjects/get/parameters/0"));
            assert!(pointers.contains(&"#/paths/~1subjects/get/responses/200"));
            assert!(pointers.contains(&"#/definitions/Broken/type"));
        }
        other => panic!("expected SpecSchema, got {:?}", other.map(|_| ())),
    }
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_first_loads_share_one_entry() {
    let cache = Arc::new(SpecCache::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || cache.load(data("swagger.yaml")).unwrap())
        })
        .collect();
    let loaded: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(cache.len(), 1);
    assert!(cache.parse_count() >= 1);
    let cached = cache.get(data("swagger.yaml")).unwrap();
    for doc in &loaded {
        assert!(Arc::ptr_eq(doc, &cached));
    }
}

#[test]
fn test_operation_lookup() {
    let v = validator();
    let op = v.operation("api.views.listSubjects").unwrap();
    assert_eq!(op.operation_id, "api_views_listSubjects");
    assert_eq!(op.signature(), "GET /subjects");
    assert!(v.operation("api_views_listSubjects").is_ok());
    assert!(matches!(
        v.operation("dunno"),
        Err(GuardError::UnknownOperation { .. })
    ));
}

#[test]
fn test_index_build_is_pure() {
    let v = validator();
    let rebuilt = OperationIndex::build(v.document()).unwrap();
    assert_eq!(v.operations().unwrap(), &rebuilt);
    let ids: Vec<&str> = rebuilt.iter().map(|op| op.operation_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "api_views_listSubjects",
            "api_views_createSubject",
            "api_views_fetchSubject",
            "api_views_deleteSubject",
            "api_views_uploadPhoto",
        ]
    );
}

#[test]
fn test_status_lookup() {
    let v = validator();
    let op = v.operation("api.views.listSubjects").unwrap();
    assert!(op.response_for("200").is_some());
    assert!(matches!(
        v.validate_response("api.views.listSubjects", &GenericResponse::json(123, json!([]))),
        Err(GuardError::NoMatchingResponse { ref status, .. }) if status == "123"
    ));
}

#[test]
fn test_valid_response_as_mapping_and_text() {
    let v = validator();
    let body = json!({ "id": "123", "name": "dunno" });
    assert!(v
        .validate_response("api.views.fetchSubject", &GenericResponse::json(200, body.clone()))
        .is_ok());
    assert!(v
        .validate_response(
            "api.views.fetchSubject",
            &GenericResponse::json(200, body.to_string())
        )
        .is_ok());
    let with_notes = r#"{"id": "123", "name": "dunno", "notes": "optional things are okay too"}"#;
    assert!(v
        .validate_response("api.views.fetchSubject", &GenericResponse::json("200", with_notes))
        .is_ok());
}

#[test]
fn test_extraneous_fields_are_accepted() {
    let v = validator();
    let body = json!({ "id": "123", "name": "dunno", "extra": "ok" });
    assert!(v
        .validate_response("api.views.fetchSubject", &GenericResponse::json(200, body))
        .is_ok());
}

#[test]
fn test_schema_violations() {
    let v = validator();

    let err = v
        .validate_response(
            "api.views.fetchSubject",
            &GenericResponse::json(200, json!({ "id": 123, "name": "dunno" })),
        )
        .unwrap_err();
    match err {
        GuardError::SchemaViolation { pointer, .. } => assert_eq!(pointer, "/id"),
        other => panic!("expected SchemaViolation, got {:?}", other),
    }

    assert!(matches!(
        v.validate_response(
            "api.views.fetchSubject",
            &GenericResponse::json(200, json!({ "invalid": "huzzah" }))
        ),
        Err(GuardError::SchemaViolation { .. })
    ));
}

#[test]
fn test_list_body_against_array_and_object_schemas() {
    let v = validator();
    let body = json!([{ "id": "123", "name": "dunno" }]);
    assert!(v
        .validate_response("api.views.listSubjects", &GenericResponse::json(200, body.clone()))
        .is_ok());
    assert!(matches!(
        v.validate_response("api.views.fetchSubject", &GenericResponse::json(200, body)),
        Err(GuardError::SchemaViolation { .. })
    ));
}

#[test]
fn test_content_type_mismatch_is_distinct() {
    let v = validator();
    let resp = GenericResponse::new(
        200,
        json!({ "id": "123", "name": "dunno" }),
        "application/xml",
        BTreeMap::new(),
    );
    match v.validate_response("api.views.fetchSubject", &resp).unwrap_err() {
        GuardError::ContentTypeMismatch { expected, actual } => {
            assert_eq!(expected, vec!["application/json".to_string()]);
            assert_eq!(actual, "application/xml");
        }
        other => panic!("expected ContentTypeMismatch, got {:?}", other),
    }
}

#[test]
fn test_malformed_bodies() {
    let v = validator();
    assert!(matches!(
        v.validate_response("api.views.fetchSubject", &GenericResponse::json(200, "{nope")),
        Err(GuardError::BodyDecode { .. })
    ));
    assert!(matches!(
        v.validate_response("api.views.fetchSubject", &GenericResponse::json(200, json!(7))),
        Err(GuardError::BodyShape { found: "integer" })
    ));
}

#[test]
fn test_shared_error_response_and_empty_bodies() {
    let v = validator();
    assert!(v
        .validate_response(
            "api.views.fetchSubject",
            &GenericResponse::json(404, json!({ "message": "no such subject" }))
        )
        .is_ok());
    assert!(v
        .validate_response("api.views.createSubject", &GenericResponse::json(500, json!({ "message": "boom" })))
        .is_ok());
    assert!(v
        .validate_response("api.views.deleteSubject", &GenericResponse::json(204, ""))
        .is_ok());
    assert!(matches!(
        v.validate_response("api.views.deleteSubject", &GenericResponse::json(204, json!([1]))),
        Err(GuardError::BodyNotEmpty)
    ));
}

#[test]
fn test_request_validation() {
    let v = validator();

    let ok = GenericRequest::new("/api/subjects").with_query_string("limit=10&kind=person");
    assert!(v.validate_request("api.views.listSubjects", &ok).is_ok());

    let bad = GenericRequest::new("/api/subjects").with_query_string("limit=0&kind=robot");
    match v.validate_request("api.views.listSubjects", &bad).unwrap_err() {
        GuardError::Request(violations) => {
            let kinds: Vec<ViolationKind> = violations.iter().map(|v| v.kind).collect();
            assert_eq!(kinds, vec![ViolationKind::Constraint, ViolationKind::Enum]);
        }
        other => panic!("expected Request, got {:?}", other),
    }

    let fetch = GenericRequest::new("/api/subjects/abc");
    assert!(v.validate_request("api.views.fetchSubject", &fetch).is_err());
    let fetch = GenericRequest::new("/api/subjects/42").with_header("x-request-id", "r1");
    assert!(v.validate_request("api.views.fetchSubject", &fetch).is_ok());

    let create = GenericRequest::new("/api/subjects").with_body(r#"{"id": "1", "name": "n"}"#);
    assert!(v.validate_request("api.views.createSubject", &create).is_ok());
}

#[test]
fn test_validators_do_not_share_indexes() {
    let cache = SpecCache::new();
    let a = SwaggerValidator::open(&cache, data("swagger.yaml")).unwrap();
    let b = SwaggerValidator::open(&cache, data("swagger.yaml")).unwrap();
    assert!(Arc::ptr_eq(a.document(), b.document()));
    assert!(!std::ptr::eq(a.operations().unwrap(), b.operations().unwrap()));
    assert_eq!(cache.parse_count(), 1);
}
