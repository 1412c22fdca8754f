//! Tests for control-flow and value operations.
//!
//! Covers:
//! - if: conditions, condition lists, switch/case, default, branch checks
//! - forEach: arrays, objects, containers, reverse, loop variables
//! - forEach step controls: skipNext, skip, toStep (forward and reverse)
//! - continue / break / return / implicit early return
//! - and / or / not, comparisons
//! - arithmetic
//! - getValue / setValue / deleteValue / declare, blocks

use serde_json::json;
use sprog_eval::Runtime;
use sprog_types::SprogError;
use super_values::Value;

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

fn get(path: &str) -> serde_json::Value {
    json!({ "$sprog": "getValue", "path": path })
}

fn set(path: &str, value: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "setValue", "path": path, "value": value })
}

fn ret(value: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "return", "value": value })
}

fn call(path: &str, args: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "call", "path": path, "args": args })
}

/// `acc = acc + item`, for string items.
fn append_item() -> serde_json::Value {
    set(
        "acc",
        json!({ "$sprog": "add", "left": get("acc"), "right": get("item") }),
    )
}

/// Run `forEach` over `items` with `extra` lines after the append, and
/// return the concatenated items visited.
fn visit(items: serde_json::Value, reverse: bool, extra: Vec<serde_json::Value>) -> Value {
    let mut body = vec![append_item()];
    body.extend(extra);
    run(json!([
        set("acc", json!("")),
        { "$sprog": "forEach", "in": items, "reverse": reverse, "lines": body },
        ret(get("acc")),
    ]))
}

/// `if item == target { <line> }`.
fn when_item(target: &str, line: serde_json::Value) -> serde_json::Value {
    json!({ "$sprog": "if", "branches": [
        { "condition": { "$sprog": "equal", "left": get("item"), "right": target },
          "lines": [line] }
    ] })
}

// ══════════════════════════════════════════════════════════════════════════
// if
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_if_first_matching_branch_runs() {
    let out = run(json!([
        set("x", json!(5)),
        { "$sprog": "if", "branches": [
            { "condition": { "$sprog": "greater", "left": get("x"), "right": 10 },
              "lines": [ret(json!("big"))] },
            { "condition": { "$sprog": "greater", "left": get("x"), "right": 1 },
              "lines": [ret(json!("medium"))] },
            { "default": true, "lines": [ret(json!("small"))] },
        ] },
    ]));
    assert_eq!(out, val(json!("medium")));
}

#[test]
fn test_if_default_branch() {
    let out = run(json!([
        { "$sprog": "if", "branches": [
            { "condition": false, "lines": [ret(json!(1))] },
            { "default": true, "lines": [ret(json!(2))] },
        ] },
    ]));
    assert_eq!(out, val(json!(2)));
}

#[test]
fn test_if_condition_list_needs_every_entry() {
    let program = |second: bool| {
        json!([
            { "$sprog": "if", "branches": [
                { "condition": [true, second], "lines": [ret(json!("all"))] },
                { "default": true, "lines": [ret(json!("some"))] },
            ] },
        ])
    };
    assert_eq!(run(program(true)), val(json!("all")));
    assert_eq!(run(program(false)), val(json!("some")));
}

#[test]
fn test_if_condition_list_stops_at_first_falsy() {
    let out = run(json!([
        set("hits", json!(0)),
        { "$sprog": "if", "branches": [
            { "condition": [false, { "$sprog": "frobnicate" }], "lines": [] },
        ] },
        ret(get("hits")),
    ]));
    assert_eq!(out, val(json!(0)));
}

#[test]
fn test_if_no_match_yields_undefined() {
    let out = run(json!({ "$sprog": "if", "branches": [
        { "condition": false, "lines": [ret(json!(1))] },
    ] }));
    assert_eq!(out, Value::Undefined);
}

#[test]
fn test_if_switch_case() {
    let program = |color: &str| {
        json!([
            set("color", json!(color)),
            { "$sprog": "if", "switch": get("color"), "branches": [
                { "case": "red", "lines": [ret(json!(1))] },
                { "case": "green", "lines": [ret(json!(2))] },
                { "default": true, "lines": [ret(json!(0))] },
            ] },
        ])
    };
    assert_eq!(run(program("green")), val(json!(2)));
    assert_eq!(run(program("blue")), val(json!(0)));
}

#[test]
fn test_if_branch_scope_is_child() {
    let out = run(json!([
        set("outer", json!(1)),
        { "$sprog": "if", "branches": [
            { "condition": true, "lines": [
                { "$sprog": "declare", "name": "inner", "value": 2 },
                set("outer", json!(3)),
            ] },
        ] },
        ret(json!([get("outer"), get("inner")])),
    ]));
    assert_eq!(out, Value::Array(vec![val(json!(3)), Value::Undefined]));
}

#[test]
fn test_if_first_branch_without_condition_is_definition_error() {
    let err = run_err(json!({ "$sprog": "if", "branches": [
        { "lines": [] },
        { "condition": true, "lines": [] },
    ] }));
    assert!(matches!(err, SprogError::Definition(_)));
}

#[test]
fn test_if_middle_branch_without_condition_is_definition_error() {
    let err = run_err(json!({ "$sprog": "if", "branches": [
        { "condition": false, "lines": [] },
        { "lines": [] },
        { "condition": true, "lines": [] },
    ] }));
    assert!(matches!(err, SprogError::Definition(_)));
}

#[test]
fn test_if_branch_check_precedes_evaluation() {
    // the bad branch is reported even though the first one would match
    let err = run_err(json!({ "$sprog": "if", "branches": [
        { "condition": true, "lines": [] },
        { "lines": [] },
        { "condition": true, "lines": [] },
    ] }));
    assert!(matches!(err, SprogError::Definition(_)));
}

// ══════════════════════════════════════════════════════════════════════════
// forEach
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_for_each_visits_in_order() {
    assert_eq!(visit(json!(["a", "b", "c"]), false, vec![]), val(json!("abc")));
}

#[test]
fn test_for_each_reverse() {
    assert_eq!(visit(json!(["a", "b", "c"]), true, vec![]), val(json!("cba")));
}

#[test]
fn test_for_each_sums_numbers() {
    let out = run(json!([
        set("sum", json!(0)),
        { "$sprog": "forEach", "in": [1, 2, 3, 4], "lines": [
            set("sum", json!({ "$sprog": "add", "left": get("sum"), "right": get("item") })),
        ] },
        ret(get("sum")),
    ]));
    assert_eq!(out, val(json!(10)));
}

#[test]
fn test_for_each_object_keys() {
    let out = run(json!([
        set("acc", json!("")),
        { "$sprog": "forEach", "in": { "x": 1, "y": 2 }, "reverse": true, "lines": [
            set("acc", json!({ "$sprog": "add", "left": get("acc"), "right": get("key") })),
        ] },
        ret(get("acc")),
    ]));
    assert_eq!(out, val(json!("yx")));
}

#[test]
fn test_for_each_over_list_container() {
    let out = run(json!([
        set("items", json!({ "$sprog": "list", "values": ["p", "q"] })),
        set("acc", json!("")),
        { "$sprog": "forEach", "in": get("items"), "lines": [append_item()] },
        ret(get("acc")),
    ]));
    assert_eq!(out, val(json!("pq")));
}

#[test]
fn test_for_each_over_map_container() {
    let out = run(json!([
        set("m", json!({ "$sprog": "data", "values": { "a": "1", "b": "2" } })),
        set("acc", json!("")),
        { "$sprog": "forEach", "in": get("m"), "lines": [
            set("acc", json!({ "$sprog": "add", "left": get("acc"), "right": get("key") })),
            append_item(),
        ] },
        ret(get("acc")),
    ]));
    assert_eq!(out, val(json!("a1b2")));
}

#[test]
fn test_for_each_first_and_last_flags() {
    let out = run(json!([
        set("flags", json!("")),
        { "$sprog": "forEach", "in": [1, 2, 3], "lines": [
            { "$sprog": "if", "branches": [
                { "condition": get("isFirst"), "lines": [
                    set("flags", json!({ "$sprog": "add", "left": get("flags"), "right": "F" })) ] },
                { "condition": get("isLast"), "lines": [
                    set("flags", json!({ "$sprog": "add", "left": get("flags"), "right": "L" })) ] },
                { "default": true, "lines": [
                    set("flags", json!({ "$sprog": "add", "left": get("flags"), "right": "-" })) ] },
            ] },
        ] },
        ret(get("flags")),
    ]));
    assert_eq!(out, val(json!("F-L")));
}

#[test]
fn test_for_each_loop_vars_do_not_leak() {
    let out = run(json!([
        { "$sprog": "forEach", "in": [1], "lines": [] },
        ret(get("item")),
    ]));
    assert_eq!(out, Value::Undefined);
}

#[test]
fn test_for_each_rejects_non_iterable() {
    let err = run_err(json!({ "$sprog": "forEach", "in": 5, "lines": [] }));
    assert!(matches!(err, SprogError::Validation(_)));
}

#[test]
fn test_for_each_empty_collection() {
    assert_eq!(visit(json!([]), false, vec![]), val(json!("")));
}

// ══════════════════════════════════════════════════════════════════════════
// Step controls
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_skip_next_forward() {
    let out = visit(
        json!(["a", "b", "c", "d"]),
        false,
        vec![when_item("a", call("skipNext", json!({})))],
    );
    assert_eq!(out, val(json!("acd")));
}

#[test]
fn test_skip_next_reverse() {
    let out = visit(
        json!(["a", "b", "c", "d"]),
        true,
        vec![when_item("d", call("skipNext", json!({})))],
    );
    assert_eq!(out, val(json!("dba")));
}

#[test]
fn test_skip_n_forward() {
    let out = visit(
        json!(["a", "b", "c", "d", "e"]),
        false,
        vec![when_item("a", call("skip", json!({ "n": 2 })))],
    );
    assert_eq!(out, val(json!("ade")));
}

#[test]
fn test_skip_n_reverse() {
    let out = visit(
        json!(["a", "b", "c", "d", "e"]),
        true,
        vec![when_item("e", call("skip", json!({ "n": 2 })))],
    );
    assert_eq!(out, val(json!("eba")));
}

#[test]
fn test_skip_past_end_stops() {
    let out = visit(
        json!(["a", "b", "c"]),
        false,
        vec![when_item("a", call("skip", json!({ "n": 10 })))],
    );
    assert_eq!(out, val(json!("a")));
}

#[test]
fn test_to_step_forward() {
    let out = visit(
        json!(["a", "b", "c", "d"]),
        false,
        vec![when_item("a", call("toStep", json!({ "n": 3 })))],
    );
    assert_eq!(out, val(json!("ad")));
}

#[test]
fn test_to_step_backwards_revisits() {
    let out = run(json!([
        set("acc", json!("")),
        set("done", json!(false)),
        { "$sprog": "forEach", "in": ["a", "b", "c"], "lines": [
            append_item(),
            { "$sprog": "if", "branches": [
                { "condition": [
                    { "$sprog": "equal", "left": get("item"), "right": "c" },
                    { "$sprog": "not", "value": get("done") } ],
                  "lines": [ set("done", json!(true)), call("toStep", json!({ "n": 1 })) ] },
            ] },
        ] },
        ret(get("acc")),
    ]));
    assert_eq!(out, val(json!("abcbc")));
}

#[test]
fn test_to_step_reverse_targets_collection_index() {
    // reverse order is d c b a; toStep(1) continues at collection index 1
    let out = visit(
        json!(["a", "b", "c", "d"]),
        true,
        vec![when_item("d", call("toStep", json!({ "n": 1 })))],
    );
    assert_eq!(out, val(json!("dba")));
}

#[test]
fn test_to_step_outside_collection_stops() {
    let out = visit(
        json!(["a", "b", "c"]),
        true,
        vec![when_item("c", call("toStep", json!({ "n": 7 })))],
    );
    assert_eq!(out, val(json!("c")));
}

#[test]
fn test_single_element_reverse_boundary() {
    let skip = visit(
        json!(["x"]),
        true,
        vec![call("skip", json!({ "n": 1 }))],
    );
    assert_eq!(skip, val(json!("x")));

    let to_step = visit(
        json!(["x"]),
        true,
        vec![call("toStep", json!({ "n": 1 }))],
    );
    assert_eq!(to_step, val(json!("x")));

    let flags = run(json!({ "$sprog": "forEach", "in": ["x"], "reverse": true, "lines": [
        ret(json!({ "$sprog": "and", "values": [get("isFirst"), get("isLast")] })),
    ] }));
    assert_eq!(flags, Value::Bool(true));
}

#[test]
fn test_step_control_requires_count() {
    let err = run_err(json!({ "$sprog": "forEach", "in": [1], "lines": [
        call("skip", json!({})),
    ] }));
    assert!(matches!(err, SprogError::Validation(_)));
}

// ══════════════════════════════════════════════════════════════════════════
// continue / break / return
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_continue_skips_rest_of_iteration() {
    let out = run(json!([
        set("acc", json!("")),
        { "$sprog": "forEach", "in": ["a", "b", "c"], "lines": [
            when_item("b", json!({ "$sprog": "continue" })),
            append_item(),
        ] },
        ret(get("acc")),
    ]));
    assert_eq!(out, val(json!("ac")));
}

#[test]
fn test_break_stops_loop() {
    let out = run(json!([
        set("acc", json!("")),
        { "$sprog": "forEach", "in": ["a", "b", "c"], "lines": [
            when_item("b", json!({ "$sprog": "break" })),
            append_item(),
        ] },
        ret(get("acc")),
    ]));
    assert_eq!(out, val(json!("a")));
}

#[test]
fn test_return_makes_loop_value() {
    let out = run(json!([
        ret(json!({ "$sprog": "forEach", "in": [1, 2, 3], "lines": [
            { "$sprog": "if", "branches": [
                { "condition": { "$sprog": "greater", "left": get("item"), "right": 1 },
                  "lines": [ret(get("item"))] },
            ] },
        ] })),
    ]));
    assert_eq!(out, val(json!(2)));
}

#[test]
fn test_defined_line_value_is_early_return() {
    let out = run(json!([
        ret(json!({ "$sprog": "forEach", "in": [4, 5], "lines": [get("item")] })),
    ]));
    assert_eq!(out, val(json!(4)));
}

#[test]
fn test_top_level_return_stops_program() {
    let out = run(json!([
        ret(json!(1)),
        { "$sprog": "frobnicate" },
    ]));
    assert_eq!(out, val(json!(1)));
}

#[test]
fn test_program_without_return_is_undefined() {
    assert_eq!(run(json!([set("x", json!(1))])), Value::Undefined);
}

// ══════════════════════════════════════════════════════════════════════════
// Logic and comparison
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_and_or_not() {
    assert_eq!(run(json!({ "$sprog": "and", "values": [true, 1, "x"] })), Value::Bool(true));
    assert_eq!(run(json!({ "$sprog": "and", "values": [true, 0] })), Value::Bool(false));
    assert_eq!(run(json!({ "$sprog": "or", "values": [false, null, 3] })), Value::Bool(true));
    assert_eq!(run(json!({ "$sprog": "or", "values": [] })), Value::Bool(false));
    assert_eq!(run(json!({ "$sprog": "not", "value": "" })), Value::Bool(true));
}

#[test]
fn test_and_short_circuits() {
    // the unknown operation after the falsy operand is never run
    let out = run(json!({ "$sprog": "and", "values": [false, { "$sprog": "frobnicate" }] }));
    assert_eq!(out, Value::Bool(false));
    let out = run(json!({ "$sprog": "or", "values": [true, { "$sprog": "frobnicate" }] }));
    assert_eq!(out, Value::Bool(true));
}

#[test]
fn test_comparisons() {
    let cmp = |op: &str, left: serde_json::Value, right: serde_json::Value| {
        run(json!({ "$sprog": op, "left": left, "right": right }))
    };
    assert_eq!(cmp("equal", json!(1), json!(1)), Value::Bool(true));
    assert_eq!(cmp("equal", json!(1), json!("1")), Value::Bool(false));
    assert_eq!(cmp("notEqual", json!("a"), json!("b")), Value::Bool(true));
    assert_eq!(cmp("equal", json!([1, 2]), json!([1, 2])), Value::Bool(true));
    assert_eq!(cmp("greater", json!(3), json!(2)), Value::Bool(true));
    assert_eq!(cmp("less", json!("apple"), json!("banana")), Value::Bool(true));
    assert_eq!(cmp("greaterOrEqual", json!(2), json!(2)), Value::Bool(true));
    assert_eq!(cmp("lessOrEqual", json!(3), json!(2)), Value::Bool(false));
}

#[test]
fn test_incomparable_pairs_compare_false() {
    let cmp = |op: &str| run(json!({ "$sprog": op, "left": 1, "right": "1" }));
    for op in ["greater", "less", "greaterOrEqual", "lessOrEqual"] {
        assert_eq!(cmp(op), Value::Bool(false), "{op}");
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Arithmetic
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_arithmetic() {
    let math = |op: &str, left: f64, right: f64| {
        run(json!({ "$sprog": op, "left": left, "right": right }))
    };
    assert_eq!(math("add", 2.0, 3.0), val(json!(5)));
    assert_eq!(math("subtract", 2.0, 3.0), val(json!(-1)));
    assert_eq!(math("multiply", 2.5, 4.0), val(json!(10)));
    assert_eq!(math("divide", 9.0, 2.0), val(json!(4.5)));
    assert_eq!(math("modulo", 9.0, 4.0), val(json!(1)));
}

#[test]
fn test_add_concatenates_strings() {
    let out = run(json!({ "$sprog": "add", "left": "foo", "right": "bar" }));
    assert_eq!(out, val(json!("foobar")));
}

#[test]
fn test_arithmetic_rejects_mixed_types() {
    let err = run_err(json!({ "$sprog": "add", "left": "1", "right": 1 }));
    assert!(matches!(err, SprogError::Validation(_)));
    let err = run_err(json!({ "$sprog": "multiply", "left": "2", "right": 2 }));
    assert!(matches!(err, SprogError::Validation(_)));
}

// ══════════════════════════════════════════════════════════════════════════
// Paths, declarations, blocks
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_set_value_creates_intermediate_segments() {
    let out = run(json!([
        set("a.b[1].c", json!(1)),
        ret(get("a")),
    ]));
    // the skipped slot is undefined, which serializes as null
    assert_eq!(out.to_json(), json!({ "b": [null, { "c": 1 }] }));
}

#[test]
fn test_delete_value() {
    let out = run(json!([
        set("user", json!({ "name": "ada", "age": 36 })),
        { "$sprog": "deleteValue", "path": "user.age" },
        ret(get("user")),
    ]));
    assert_eq!(out, val(json!({ "name": "ada" })));
}

#[test]
fn test_declare_with_definition() {
    let out = run(json!([
        { "$sprog": "declare", "name": "n", "definition": { "type": "number", "default": 3 } },
        ret(get("n")),
    ]));
    assert_eq!(out, val(json!(3)));

    let err = run_err(json!([
        { "$sprog": "declare", "name": "n", "definition": "number" },
        set("n", json!("x")),
    ]));
    assert!(matches!(err, SprogError::Validation(_)));
}

#[test]
fn test_declare_readonly_variable() {
    let err = run_err(json!([
        { "$sprog": "declare", "name": "k",
          "definition": { "type": "number", "readonly": true }, "value": 1 },
        set("k", json!(2)),
    ]));
    assert!(matches!(err, SprogError::Validation(_)));
}

#[test]
fn test_lines_block_runs_in_child_scope() {
    let out = run(json!([
        set("x", json!(1)),
        { "$sprog": "lines", "lines": [
            { "$sprog": "declare", "name": "y", "value": 2 },
            set("x", json!({ "$sprog": "add", "left": get("x"), "right": get("y") })),
        ] },
        ret(json!([get("x"), get("y")])),
    ]));
    assert_eq!(out, Value::Array(vec![val(json!(3)), Value::Undefined]));
}

#[test]
fn test_lines_block_propagates_return() {
    let out = run(json!([
        { "$sprog": "lines", "lines": [ret(json!("inner"))] },
        ret(json!("outer")),
    ]));
    assert_eq!(out, val(json!("inner")));
}

#[test]
fn test_log_yields_undefined() {
    let out = run(json!({ "$sprog": "log", "value": { "$sprog": "add", "left": 1, "right": 1 } }));
    assert_eq!(out, Value::Undefined);
}
