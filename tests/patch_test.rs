//! End-to-end patch tests: `Parameters` in, patched resource out.

use fhirpatch::{FhirPatch, PatchError};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn practitioner() -> Value {
    json!({
        "resourceType": "Practitioner",
        "id": "prac-1",
        "name": [{"family": "Willis", "given": ["Sam"]}],
        "telecom": [
            {"system": "phone", "value": "v1"},
            {"system": "phone", "value": "v2"},
            {"system": "phone", "value": "v3"},
            {"system": "phone", "value": "v4"}
        ]
    })
}

fn patch_of(parts: Vec<Value>) -> Value {
    json!({
        "resourceType": "Parameters",
        "parameter": [{"name": "operation", "part": parts}]
    })
}

fn apply(resource: &Value, parts: Vec<Value>) -> Result<Value, PatchError> {
    FhirPatch::apply_to(resource, &patch_of(parts))
}

#[test]
fn replace_a_scalar_field() {
    let patient = json!({
        "resourceType": "Patient",
        "id": "pat-1",
        "birthDate": "1920-01-01"
    });
    let result = apply(
        &patient,
        vec![
            json!({"name": "type", "valueCode": "replace"}),
            json!({"name": "path", "valueString": "Patient.birthDate"}),
            json!({"name": "value", "valueDate": "1930-01-01"}),
        ],
    )
    .unwrap();
    assert_eq!(result["birthDate"], json!("1930-01-01"));
    assert_eq!(result["id"], json!("pat-1"));
}

#[test]
fn replace_an_array_element_by_index() {
    let result = apply(
        &practitioner(),
        vec![
            json!({"name": "type", "valueCode": "replace"}),
            json!({"name": "path", "valueString": "Practitioner.telecom[2]"}),
            json!({"name": "value", "valueContactPoint": {"system": "fax", "value": "f1"}}),
        ],
    )
    .unwrap();
    assert_eq!(result["telecom"][2], json!({"system": "fax", "value": "f1"}));
    assert_eq!(result["telecom"][1], json!({"system": "phone", "value": "v2"}));
}

#[test]
fn add_then_delete_restores_the_original() {
    let original = practitioner();
    let added = apply(
        &original,
        vec![
            json!({"name": "type", "valueCode": "add"}),
            json!({"name": "path", "valueString": "Practitioner"}),
            json!({"name": "name", "valueString": "gender"}),
            json!({"name": "value", "valueCode": "male"}),
        ],
    )
    .unwrap();
    assert_eq!(added["gender"], json!("male"));

    let restored = apply(
        &added,
        vec![
            json!({"name": "type", "valueCode": "delete"}),
            json!({"name": "path", "valueString": "Practitioner.gender"}),
        ],
    )
    .unwrap();
    assert_eq!(restored, original);
}

#[test]
fn delete_of_a_missing_path_is_a_no_op() {
    let original = practitioner();
    let result = apply(
        &original,
        vec![
            json!({"name": "type", "valueCode": "delete"}),
            json!({"name": "path", "valueString": "Practitioner.gender"}),
        ],
    )
    .unwrap();
    assert_eq!(result, original);
}

#[test]
fn delete_an_indexed_array_element() {
    let result = apply(
        &practitioner(),
        vec![
            json!({"name": "type", "valueCode": "delete"}),
            json!({"name": "path", "valueString": "Practitioner.telecom[0]"}),
        ],
    )
    .unwrap();
    assert_eq!(
        result["telecom"],
        json!([
            {"system": "phone", "value": "v2"},
            {"system": "phone", "value": "v3"},
            {"system": "phone", "value": "v4"}
        ])
    );
}

#[test]
fn delete_through_a_filter_removes_every_match() {
    let resource = json!({
        "resourceType": "Practitioner",
        "id": "prac-1",
        "telecom": [
            {"system": "phone", "value": "crowded"},
            {"system": "email", "value": "keep@example.org"},
            {"system": "phone", "value": "crowded"}
        ]
    });
    let result = apply(
        &resource,
        vec![
            json!({"name": "type", "valueCode": "delete"}),
            json!({"name": "path", "valueString": "Practitioner.telecom.where(value='crowded')"}),
        ],
    )
    .unwrap();
    assert_eq!(
        result["telecom"],
        json!([{"system": "email", "value": "keep@example.org"}])
    );
}

#[test]
fn insert_at_an_interior_index() {
    let resource = json!({
        "resourceType": "Patient",
        "id": "pat-1",
        "identifier": [
            {"system": "urn:a", "value": "1"},
            {"system": "urn:b", "value": "2"}
        ]
    });
    let result = apply(
        &resource,
        vec![
            json!({"name": "type", "valueCode": "insert"}),
            json!({"name": "path", "valueString": "Patient.identifier"}),
            json!({"name": "value", "valueIdentifier": {"system": "urn:c", "value": "3"}}),
            json!({"name": "index", "valueInteger": 1}),
        ],
    )
    .unwrap();
    assert_eq!(
        result["identifier"],
        json!([
            {"system": "urn:a", "value": "1"},
            {"system": "urn:c", "value": "3"},
            {"system": "urn:b", "value": "2"}
        ])
    );
}

#[test]
fn insert_creates_a_missing_list() {
    let resource = json!({"resourceType": "Patient", "id": "pat-1"});
    let result = apply(
        &resource,
        vec![
            json!({"name": "type", "valueCode": "insert"}),
            json!({"name": "path", "valueString": "Patient.identifier"}),
            json!({"name": "value", "valueIdentifier": {"system": "urn:a", "value": "1"}}),
            json!({"name": "index", "valueInteger": 5}),
        ],
    )
    .unwrap();
    // the out-of-range index clamps to the end of the fresh list
    assert_eq!(result["identifier"], json!([{"system": "urn:a", "value": "1"}]));
}

#[test]
fn insert_into_a_scalar_field_fails_without_mutating() {
    let resource = json!({
        "resourceType": "Patient",
        "id": "pat-1",
        "birthDate": "1974-12-25"
    });
    let result = apply(
        &resource,
        vec![
            json!({"name": "type", "valueCode": "insert"}),
            json!({"name": "path", "valueString": "Patient.birthDate"}),
            json!({"name": "value", "valueString": "x"}),
            json!({"name": "index", "valueInteger": 0}),
        ],
    );
    assert!(matches!(result, Err(PatchError::InvalidPatch { .. })));
    assert_eq!(resource["birthDate"], json!("1974-12-25"));
}

#[test]
fn move_reorders_a_list() {
    let result = apply(
        &practitioner(),
        vec![
            json!({"name": "type", "valueCode": "move"}),
            json!({"name": "path", "valueString": "Practitioner.telecom"}),
            json!({"name": "source", "valueInteger": 3}),
            json!({"name": "destination", "valueInteger": 1}),
        ],
    )
    .unwrap();
    let values: Vec<&str> = result["telecom"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["v1", "v4", "v2", "v3"]);
}

#[test]
fn move_with_an_out_of_range_source_fails() {
    let result = apply(
        &practitioner(),
        vec![
            json!({"name": "type", "valueCode": "move"}),
            json!({"name": "path", "valueString": "Practitioner.telecom"}),
            json!({"name": "source", "valueInteger": 9}),
            json!({"name": "destination", "valueInteger": 0}),
        ],
    );
    assert!(matches!(
        result,
        Err(PatchError::IndexOutOfBounds { index: 9, .. })
    ));
}

#[test]
fn operations_for_another_resource_type_are_skipped() {
    let original = practitioner();
    let result = apply(
        &original,
        vec![
            json!({"name": "type", "valueCode": "delete"}),
            json!({"name": "path", "valueString": "Patient.telecom"}),
        ],
    )
    .unwrap();
    assert_eq!(result, original);
}

#[test]
fn results_are_cleaned_of_nulls_and_empty_containers() {
    let resource = json!({
        "resourceType": "Patient",
        "id": "pat-1",
        "active": false,
        "deceasedBoolean": null,
        "name": [],
        "maritalStatus": {"coding": []}
    });
    // an empty patch still normalizes the document on the way out
    let patch = FhirPatch::from_value(&json!({"resourceType": "Parameters"})).unwrap();
    let result = patch.apply(&resource).unwrap();
    assert_eq!(
        result,
        json!({"resourceType": "Patient", "id": "pat-1", "active": false})
    );
}

#[test]
fn operations_apply_in_order_against_one_working_copy() {
    let resource = json!({"resourceType": "Patient", "id": "pat-1"});
    let patch = json!({
        "resourceType": "Parameters",
        "parameter": [
            {"name": "operation", "part": [
                {"name": "type", "valueCode": "add"},
                {"name": "path", "valueString": "Patient"},
                {"name": "name", "valueString": "birthDate"},
                {"name": "value", "valueDate": "1930-01-01"},
            ]},
            {"name": "operation", "part": [
                {"name": "type", "valueCode": "replace"},
                {"name": "path", "valueString": "Patient.birthDate"},
                {"name": "value", "valueDate": "1931-02-02"},
            ]},
        ]
    });
    let result = FhirPatch::apply_to(&resource, &patch).unwrap();
    assert_eq!(result["birthDate"], json!("1931-02-02"));
}

#[test]
fn the_input_resource_is_never_mutated() {
    let original = practitioner();
    let snapshot = original.clone();
    apply(
        &original,
        vec![
            json!({"name": "type", "valueCode": "delete"}),
            json!({"name": "path", "valueString": "Practitioner.telecom"}),
        ],
    )
    .unwrap();
    assert_eq!(original, snapshot);
}

#[test]
fn rejects_malformed_patches() {
    assert!(FhirPatch::from_value(&json!({"resourceType": "Parameters", "parameter": "bar"})).is_err());
    assert!(FhirPatch::from_value(&json!({"resourceType": "Patient"})).is_err());
    assert!(FhirPatch::from_value(&json!("not an object")).is_err());
    // missing required fields for the operation type
    let incomplete = patch_of(vec![
        json!({"name": "type", "valueCode": "add"}),
        json!({"name": "path", "valueString": "Patient"}),
    ]);
    assert!(matches!(
        FhirPatch::from_value(&incomplete),
        Err(PatchError::MissingField { .. })
    ));
}

#[test]
fn applying_to_a_resource_without_a_type_fails() {
    let result = apply(
        &json!({"id": "anonymous"}),
        vec![
            json!({"name": "type", "valueCode": "delete"}),
            json!({"name": "path", "valueString": "Patient.id"}),
        ],
    );
    assert!(matches!(result, Err(PatchError::InvalidResource { .. })));
}

#[test]
fn complex_values_fold_from_nested_part_lists() {
    let resource = json!({"resourceType": "Patient", "id": "pat-1"});
    let result = apply(
        &resource,
        vec![
            json!({"name": "type", "valueCode": "add"}),
            json!({"name": "path", "valueString": "Patient"}),
            json!({"name": "name", "valueString": "contact"}),
            json!({"name": "value", "part": [
                {"name": "gender", "valueCode": "female"},
            ]}),
        ],
    )
    .unwrap();
    assert_eq!(result["contact"], json!([{"gender": "female"}]));
}

#[test]
fn patches_round_trip_through_the_wire_form() {
    let wire = json!({
        "resourceType": "Parameters",
        "parameter": [{
            "name": "operation",
            "parameter": [
                {"name": "type", "valueCode": "move"},
                {"name": "path", "valueString": "Practitioner.telecom"},
                {"name": "source", "valueInteger": 3},
                {"name": "destination", "valueInteger": 1},
            ]
        }]
    });
    let patch = FhirPatch::from_value(&wire).unwrap();
    assert_eq!(patch.to_value(), wire);
    assert_eq!(patch.operations().len(), 1);
}
