//! Tests for callable units, the standard library and host evaluation.
//!
//! Covers:
//! - function / exec / apply / call
//! - parameter validation and readonly props
//! - closures over the defining scope, recursion, local variables
//! - NotCallable errors
//! - standard library functions
//! - eval with and without a host evaluator

use serde_json::json;
use sprog_eval::{HostEvaluator, Runtime, Scope, SuperFunc};
use sprog_types::{Result, SprogError};
use std::rc::Rc;
use super_values::{definitions_from_object, Object, Value};

// ══════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════

fn run(program: serde_json::Value) -> Value {
    Runtime::new().run(&program).unwrap()
}

fn run_err(program: serde_json::Value) -> SprogError {
    Runtime::new().run(&program).unwrap_err()
}

fn val(raw: serde_json::Value) -> Value {
    Value::from(raw)
}

fn obj(raw: serde_json::Value) -> Object {
    match Value::from(raw) {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn get(path: &str) -> serde_json::Value {
    json!({ "$sprog": "getValue", "path": path })
}

fn set(path: &str, value: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "setValue", "path": path, "value": value })
}

fn ret(value: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "return", "value": value })
}

fn function(params: serde_json::Value, lines: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "function", "params": params, "lines": lines })
}

fn exec(function: serde_json::Value, values: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "exec", "function": function, "values": values })
}

fn add(left: serde_json::Value, right: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "add", "left": left, "right": right })
}

/// `f(a, b) = a + b`, stored under `f`.
fn define_sum() -> serde_json::Value {
    set(
        "f",
        function(
            json!({ "a": "number", "b": "number" }),
            json!([ret(add(get("props.a"), get("props.b")))]),
        ),
    )
}

struct VarHost;

impl HostEvaluator for VarHost {
    fn evaluate(&self, scope: &Scope, code: &str) -> Result<Value> {
        match code.strip_prefix("var:") {
            Some(name) => scope.get(name),
            None => Err(SprogError::Host(format!("cannot evaluate '{code}'"))),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// exec
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_exec_returns_param() {
    let out = run(json!([
        set("f", function(json!({ "p1": { "type": "number" } }), json!([ret(get("props.p1"))]))),
        ret(exec(get("f"), json!({ "p1": 5 }))),
    ]));
    assert_eq!(out, val(json!(5)));
}

#[test]
fn test_exec_uses_param_default() {
    let out = run(json!([
        ret(exec(
            function(json!({ "p1": { "type": "number", "default": 5 } }), json!([ret(get("props.p1"))])),
            json!({}),
        )),
    ]));
    assert_eq!(out, val(json!(5)));
}

#[test]
fn test_exec_without_return_is_undefined() {
    let out = run(json!([
        ret(exec(function(json!({}), json!([set("x", json!(1))])), json!({}))),
    ]));
    assert_eq!(out, Value::Undefined);
}

#[test]
fn test_exec_wrong_param_type_fails() {
    let err = run_err(json!([
        define_sum(),
        exec(get("f"), json!({ "a": "one", "b": 2 })),
    ]));
    assert!(matches!(err, SprogError::Validation(_)));
}

#[test]
fn test_exec_unknown_param_fails() {
    let err = run_err(json!([
        define_sum(),
        exec(get("f"), json!({ "a": 1, "c": 2 })),
    ]));
    assert!(matches!(err, SprogError::Validation(_)));
}

#[test]
fn test_exec_missing_required_param_fails() {
    let err = run_err(json!([
        ret(exec(
            function(json!({ "p": { "type": "string", "required": true } }), json!([])),
            json!({}),
        )),
    ]));
    assert!(matches!(err, SprogError::Validation(_)));
}

#[test]
fn test_props_are_readonly() {
    let err = run_err(json!([
        ret(exec(
            function(json!({ "p": "number" }), json!([set("props.p", json!(2))])),
            json!({ "p": 1 }),
        )),
    ]));
    assert!(matches!(err, SprogError::Validation(_)));

    let err = run_err(json!([
        ret(exec(function(json!({}), json!([set("props", json!(2))])), json!({}))),
    ]));
    assert!(matches!(err, SprogError::Validation(_)));
}

#[test]
fn test_function_sees_defining_scope_live() {
    let out = run(json!([
        set("base", json!(10)),
        set("f", function(json!({ "a": "number" }), json!([ret(add(get("props.a"), get("base")))]))),
        set("base", json!(20)),
        ret(exec(get("f"), json!({ "a": 1 }))),
    ]));
    assert_eq!(out, val(json!(21)));
}

#[test]
fn test_function_can_update_outer_variable() {
    let out = run(json!([
        set("count", json!(0)),
        set("bump", function(json!({}), json!([set("count", add(get("count"), json!(1)))]))),
        exec(get("bump"), json!({})),
        exec(get("bump"), json!({})),
        ret(get("count")),
    ]));
    assert_eq!(out, val(json!(2)));
}

#[test]
fn test_function_locals_do_not_leak() {
    let out = run(json!([
        exec(function(json!({}), json!([
            { "$sprog": "declare", "name": "tmp", "value": 1 },
            set("fresh", json!(2)),
        ])), json!({})),
        ret(json!([get("tmp"), get("fresh"), get("props")])),
    ]));
    assert_eq!(
        out,
        Value::Array(vec![Value::Undefined, Value::Undefined, Value::Undefined])
    );
}

#[test]
fn test_recursive_call() {
    let fact = function(
        json!({ "n": "number" }),
        json!([
            { "$sprog": "if", "branches": [
                { "condition": { "$sprog": "lessOrEqual", "left": get("props.n"), "right": 1 },
                  "lines": [ret(json!(1))] },
            ] },
            ret(json!({ "$sprog": "multiply",
                "left": get("props.n"),
                "right": { "$sprog": "call", "path": "fact", "args": {
                    "n": { "$sprog": "subtract", "left": get("props.n"), "right": 1 } } } })),
        ]),
    );
    let out = run(json!([
        set("fact", fact),
        ret(json!({ "$sprog": "call", "path": "fact", "args": { "n": 5 } })),
    ]));
    assert_eq!(out, val(json!(120)));
}

#[test]
fn test_break_in_function_body_is_ignored() {
    let out = run(json!([
        ret(exec(function(json!({}), json!([{ "$sprog": "break" }, ret(json!(1))])), json!({}))),
    ]));
    assert_eq!(out, val(json!(1)));
}

#[test]
fn test_return_inside_loop_only_ends_loop() {
    let out = run(json!([
        ret(exec(function(json!({}), json!([
            { "$sprog": "forEach", "in": [1, 2, 3], "lines": [
                { "$sprog": "if", "branches": [
                    { "condition": { "$sprog": "equal", "left": get("item"), "right": 2 },
                      "lines": [ret(json!("found"))] },
                ] },
            ] },
            ret(json!("missed")),
        ])), json!({}))),
    ]));
    // the loop yields "found" as its value; the function keeps going
    assert_eq!(out, val(json!("missed")));
}

// ══════════════════════════════════════════════════════════════════════════
// apply / call
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_apply_binds_arguments() {
    let out = run(json!([
        define_sum(),
        set("inc", json!({ "$sprog": "apply", "function": get("f"), "values": { "a": 1 } })),
        ret(exec(get("inc"), json!({ "b": 41 }))),
    ]));
    assert_eq!(out, val(json!(42)));
}

#[test]
fn test_call_values_override_applied() {
    let out = run(json!([
        define_sum(),
        set("g", json!({ "$sprog": "apply", "function": get("f"), "values": { "a": 1, "b": 1 } })),
        ret(exec(get("g"), json!({ "b": 5 }))),
    ]));
    assert_eq!(out, val(json!(6)));
}

#[test]
fn test_call_by_path() {
    let out = run(json!([
        set("lib.sum", function(
            json!({ "a": "number", "b": "number" }),
            json!([ret(add(get("props.a"), get("props.b")))]),
        )),
        ret(json!({ "$sprog": "call", "path": "lib.sum", "args": { "a": 2, "b": 3 } })),
    ]));
    assert_eq!(out, val(json!(5)));
}

#[test]
fn test_not_callable() {
    let err = run_err(json!([
        set("x", json!(5)),
        { "$sprog": "call", "path": "x" },
    ]));
    assert!(matches!(err, SprogError::NotCallable(_)));

    let err = run_err(json!(exec(json!("text"), json!({}))));
    assert!(matches!(err, SprogError::NotCallable(_)));

    let err = run_err(json!({ "$sprog": "call", "path": "missing" }));
    assert!(matches!(err, SprogError::NotCallable(_)));
}

#[test]
fn test_function_params_must_be_record() {
    let err = run_err(json!({ "$sprog": "function", "params": [1], "lines": [] }));
    assert!(matches!(err, SprogError::Definition(_)));
    let err = run_err(json!({ "$sprog": "function", "params": { "p": { "type": "nope" } } }));
    assert!(matches!(err, SprogError::Definition(_)));
}

#[test]
fn test_super_func_from_rust() {
    let runtime = Runtime::new();
    let scope = runtime.root_scope(obj(json!({ "factor": 3 }))).unwrap();
    let defs = definitions_from_object(&obj(json!({ "n": "number" }))).unwrap();
    let body = vec![val(json!({ "$sprog": "return", "value": {
        "$sprog": "multiply", "left": { "$sprog": "getValue", "path": "props.n" },
        "right": { "$sprog": "getValue", "path": "factor" } } }))];
    let triple = SuperFunc::new(&scope, "triple", defs, body);
    assert_eq!(triple.exec(obj(json!({ "n": 4 }))).unwrap(), val(json!(12)));
    assert!(matches!(
        triple.exec(obj(json!({ "n": 4, "zz": 1 }))),
        Err(SprogError::Validation(_))
    ));
}

// ══════════════════════════════════════════════════════════════════════════
// Standard library
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_library_functions() {
    let lib = |name: &str, args: serde_json::Value| {
        run(json!({ "$sprog": "call", "path": format!("_.{name}"), "args": args }))
    };
    assert_eq!(
        lib("spliceValue", json!({ "array": [1, 2, 3, 2], "value": 2 })),
        val(json!([1, 3, 2]))
    );
    assert_eq!(lib("dedup", json!({ "array": [1, 1, 2, 1] })), val(json!([1, 2])));
    assert_eq!(
        lib("splitPath", json!({ "path": "a['b c'][2]" })),
        val(json!(["a", "b c", "2"]))
    );
    assert_eq!(
        lib("joinPath", json!({ "segments": ["items", 2, "name"] })),
        val(json!("items[2].name"))
    );
    assert_eq!(
        lib("omit", json!({ "object": { "a": 1, "b": 2, "c": 3 }, "keys": ["a", "c"] })),
        val(json!({ "b": 2 }))
    );
}

#[test]
fn test_library_reads_containers_as_data() {
    let out = run(json!([
        set("items", json!({ "$sprog": "list", "values": [3, 3, 4] })),
        ret(json!({ "$sprog": "call", "path": "_.dedup", "args": { "array": get("items") } })),
    ]));
    assert_eq!(out, val(json!([3, 4])));
}

#[test]
fn test_library_cannot_be_replaced() {
    let err = run_err(json!(set("_.dedup", json!(1))));
    assert!(matches!(err, SprogError::Validation(_)));
}

// ══════════════════════════════════════════════════════════════════════════
// eval
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_eval_without_host_fails() {
    let err = run_err(json!({ "$sprog": "eval", "code": "1 + 1" }));
    assert!(matches!(err, SprogError::Host(_)));
}

#[test]
fn test_eval_delegates_to_host() {
    let runtime = Runtime::builder().host(Rc::new(VarHost)).build();
    let out = runtime
        .run(&json!([
            set("answer", json!(42)),
            ret(json!({ "$sprog": "eval", "code": "var:answer" })),
        ]))
        .unwrap();
    assert_eq!(out, val(json!(42)));
}

#[test]
fn test_eval_host_failure_propagates() {
    let runtime = Runtime::builder().host(Rc::new(VarHost)).build();
    let err = runtime
        .run(&json!({ "$sprog": "eval", "code": "launch()" }))
        .unwrap_err();
    assert!(matches!(err, SprogError::Host(_)));
}

#[test]
fn test_eval_code_must_be_string() {
    let runtime = Runtime::builder().host(Rc::new(VarHost)).build();
    let err = runtime.run(&json!({ "$sprog": "eval", "code": 7 })).unwrap_err();
    assert!(matches!(err, SprogError::Validation(_)));
}
