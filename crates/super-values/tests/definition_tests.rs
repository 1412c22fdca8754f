//! Tests for item definitions and type checks.
//!
//! Covers:
//! - parsing raw definitions (shorthand and record forms)
//! - definition errors (unknown type, non-boolean flags, bad default)
//! - type correspondence, including null and container kinds
//! - initial value resolution

use serde_json::json;
use super_values::{
    definitions_from_object, is_corresponding_type, resolve_initial_value, ItemDefinition,
    MapContainer, Object, TypeTag, Value,
};
use sprog_types::ErrorCategory;

// ══════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════

fn parse(raw: serde_json::Value) -> sprog_types::Result<ItemDefinition> {
    ItemDefinition::from_value(&Value::from(raw))
}

fn obj(raw: serde_json::Value) -> Object {
    match Value::from(raw) {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_shorthand_type_name() {
    let def = parse(json!("number")).unwrap();
    assert_eq!(def.type_tag, TypeTag::Number);
    assert!(!def.is_required());
    assert!(!def.is_readonly());
    assert!(!def.is_nullable());
}

#[test]
fn test_record_keeps_explicit_flags() {
    let def = parse(json!({ "type": "string", "readonly": false, "default": "x" })).unwrap();
    assert_eq!(def.type_tag, TypeTag::String);
    assert_eq!(def.readonly, Some(false));
    assert_eq!(def.required, None);
    assert_eq!(def.default, Some(Value::from("x")));
}

#[test]
fn test_record_without_type_is_any() {
    let def = parse(json!({ "required": true })).unwrap();
    assert_eq!(def.type_tag, TypeTag::Any);
    assert!(def.is_required());
}

#[test]
fn test_unknown_type_is_definition_error() {
    let err = parse(json!({ "type": "bignum" })).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Definition);
}

#[test]
fn test_non_boolean_flag_is_definition_error() {
    let err = parse(json!({ "type": "number", "nullable": "yes" })).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Definition);
}

#[test]
fn test_default_must_match_type() {
    let err = parse(json!({ "type": "number", "default": "five" })).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Definition);
    assert!(parse(json!({ "type": "number", "default": null, "nullable": true })).is_ok());
}

#[test]
fn test_definitions_keep_declaration_order() {
    let defs = definitions_from_object(&obj(json!({
        "z": "number",
        "a": { "type": "string" },
        "m": "any"
    })))
    .unwrap();
    assert_eq!(defs.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
}

#[test]
fn test_definitions_name_the_bad_key() {
    let err = definitions_from_object(&obj(json!({ "ok": "number", "bad": "nope" }))).unwrap_err();
    assert!(err.message().contains("bad"));
}

#[test]
fn test_definition_to_value_round_trips_flags() {
    let def = ItemDefinition::new(TypeTag::List).nullable().readonly();
    let back = ItemDefinition::from_value(&def.to_value()).unwrap();
    assert_eq!(back, def);
}

// ══════════════════════════════════════════════════════════════════════════
// Type correspondence
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_null_only_passes_nullable_or_null_type() {
    assert!(!is_corresponding_type(&Value::Null, TypeTag::Number, false));
    assert!(is_corresponding_type(&Value::Null, TypeTag::Number, true));
    assert!(is_corresponding_type(&Value::Null, TypeTag::Null, false));
    assert!(is_corresponding_type(&Value::Null, TypeTag::Any, false));
}

#[test]
fn test_any_accepts_everything() {
    for value in [
        Value::Undefined,
        Value::from(1),
        Value::from("s"),
        Value::Array(vec![]),
    ] {
        assert!(is_corresponding_type(&value, TypeTag::Any, false));
    }
}

#[test]
fn test_containers_match_by_kind() {
    let map = Value::Data(MapContainer::empty());
    assert!(is_corresponding_type(&map, TypeTag::Data, false));
    assert!(!is_corresponding_type(&map, TypeTag::Struct, false));
    assert!(!is_corresponding_type(&map, TypeTag::Object, false));
    assert!(!is_corresponding_type(&Value::Object(Object::new()), TypeTag::Data, false));
}

#[test]
fn test_promise_matches_no_runtime_value() {
    assert!(!is_corresponding_type(&Value::from(1), TypeTag::Promise, false));
    assert!(is_corresponding_type(&Value::Null, TypeTag::Promise, true));
}

// ══════════════════════════════════════════════════════════════════════════
// Initial values
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_zero_values_for_primitives() {
    assert_eq!(resolve_initial_value(TypeTag::String, false).unwrap(), Value::from(""));
    assert_eq!(resolve_initial_value(TypeTag::Number, false).unwrap(), Value::from(0));
    assert_eq!(resolve_initial_value(TypeTag::Boolean, false).unwrap(), Value::Bool(false));
    assert_eq!(resolve_initial_value(TypeTag::Array, false).unwrap(), Value::Array(vec![]));
    assert_eq!(
        resolve_initial_value(TypeTag::Object, false).unwrap(),
        Value::Object(Object::new())
    );
    assert_eq!(resolve_initial_value(TypeTag::Any, false).unwrap(), Value::Null);
}

#[test]
fn test_nullable_starts_null() {
    assert_eq!(resolve_initial_value(TypeTag::Number, true).unwrap(), Value::Null);
    assert_eq!(resolve_initial_value(TypeTag::Data, true).unwrap(), Value::Null);
}

#[test]
fn test_containers_have_no_zero_value() {
    for tag in [TypeTag::Data, TypeTag::Struct, TypeTag::List, TypeTag::Function, TypeTag::Promise] {
        let err = resolve_initial_value(tag, false).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Definition);
    }
}

#[test]
fn test_required_without_default_stays_unresolved() {
    let def = ItemDefinition::new(TypeTag::Number).required();
    assert_eq!(def.initial_value().unwrap(), None);
    let def = def.with_default(3);
    assert_eq!(def.initial_value().unwrap(), Some(Value::from(3)));
}
