//! The six worked examples from spec.md §8, each driven end to end through
//! `exec_program` against a fresh `Environment`/`Runtime` pair, plus a
//! couple of cross-module properties not already covered by an inline
//! `#[cfg(test)]` module elsewhere in the crate.
//!
//! No parser exists in this repo (out of scope, spec.md §1), so every
//! program below is a hand-assembled AST via the `common` helpers.

mod common;

use std::sync::Arc;

use common::*;
use hemlock_runtime::ast::{BinaryOp, Expr, Stmt};
use hemlock_runtime::builtins::BuiltinRegistry;
use hemlock_runtime::{Environment, Runtime, Value};

fn setup() -> (Environment, Runtime) {
    common::init_tracing();
    let env = Environment::root();
    BuiltinRegistry::with_standard_library().install_into(&env);
    (env, Runtime::default())
}

/// `let a = 2; let b = 3; print(a + b * 4);` (spec.md §8, example 1).
#[test]
fn example_1_arithmetic_precedence() {
    let (env, runtime) = setup();
    let program = vec![
        let_stmt("a", lit_i64(2), false),
        let_stmt("b", lit_i64(3), false),
        let_stmt(
            "result",
            bin(BinaryOp::Add, ident("a"), bin(BinaryOp::Mul, ident("b"), lit_i64(4))),
            false,
        ),
        expr_stmt(call_ident("print", vec![ident("result")])),
    ];
    hemlock_runtime::exec_program(&program, &env, &runtime).unwrap();
    assert_eq!(env.lookup("result").unwrap(), Value::I64(14));
}

/// `let s = "hello"; s[0] = 72; print(s); print(s.length);` — strings are
/// byte-indexed and mutable in place (spec.md §8, example 2).
#[test]
fn example_2_byte_indexed_string_mutation() {
    let (env, runtime) = setup();
    let program = vec![
        let_stmt("s", lit_str("hello"), false),
        expr_stmt(index_assign(ident("s"), lit_i64(0), lit_i64(72))),
        let_stmt("len", Arc::new(Expr::Property { target: ident("s"), name: "length".to_string() }), false),
    ];
    hemlock_runtime::exec_program(&program, &env, &runtime).unwrap();
    let Value::String(h) = env.lookup("s").unwrap() else { panic!("expected a string") };
    assert_eq!(h.get().unwrap().as_str_lossy(), "Hello");
    assert_eq!(env.lookup("len").unwrap(), Value::I64(5));
}

/// `let arr = [1,2,3]; arr.push(4); print(arr.slice(1, 100));` — `slice`
/// clamps an out-of-range end rather than erroring (spec.md §8, example 3;
/// SPEC_FULL.md's clamp-vs-error split for bounds semantics).
#[test]
fn example_3_array_push_and_clamped_slice() {
    let (env, runtime) = setup();
    let program = vec![
        let_stmt("arr", array_lit(vec![lit_i64(1), lit_i64(2), lit_i64(3)]), false),
        expr_stmt(method_call(ident("arr"), "push", vec![lit_i64(4)])),
        let_stmt("sliced", method_call(ident("arr"), "slice", vec![lit_i64(1), lit_i64(100)]), false),
    ];
    hemlock_runtime::exec_program(&program, &env, &runtime).unwrap();
    let Value::Array(h) = env.lookup("sliced").unwrap() else { panic!("expected an array") };
    assert_eq!(h.get().unwrap().to_vec(), vec![Value::I64(2), Value::I64(3), Value::I64(4)]);
}

/// `let ch = channel(2); ch.send("a"); ch.send("b"); ch.close(); ...` — a
/// closed channel keeps draining buffered values before `recv` starts
/// returning `null` (spec.md §8, example 4).
#[test]
fn example_4_buffered_channel_drains_then_returns_null() {
    let (env, runtime) = setup();
    let program = vec![
        let_stmt("ch", call_ident("channel", vec![lit_i64(2)]), false),
        expr_stmt(method_call(ident("ch"), "send", vec![lit_str("a")])),
        expr_stmt(method_call(ident("ch"), "send", vec![lit_str("b")])),
        expr_stmt(method_call(ident("ch"), "close", vec![])),
        let_stmt("r1", method_call(ident("ch"), "recv", vec![]), false),
        let_stmt("r2", method_call(ident("ch"), "recv", vec![]), false),
        let_stmt("r3", method_call(ident("ch"), "recv", vec![]), false),
    ];
    hemlock_runtime::exec_program(&program, &env, &runtime).unwrap();
    assert_eq!(env.lookup("r1").unwrap(), Value::string("a"));
    assert_eq!(env.lookup("r2").unwrap(), Value::string("b"));
    assert_eq!(env.lookup("r3").unwrap(), Value::Null);
    assert_eq!(runtime.stats().open_channel_count, 0);
}

/// `try { throw "oops"; } catch (e) { print("caught: " + e); } finally {
/// print("done"); }` (spec.md §8, example 5). `catch` binds the raw thrown
/// value and `finally` always runs; both bodies get their own child scope
/// (`exec_stmt`'s `Stmt::Try` arm), so assertions go through a shared
/// recorder builtin rather than `env.lookup` on scope-local bindings.
#[test]
fn example_5_try_catch_finally_runs_in_order() {
    let (env, runtime) = setup();
    let (record, log) = recorder();
    env.define("record", record, true).unwrap();

    let program = vec![Arc::new(Stmt::Try {
        body: block(vec![Arc::new(Stmt::Throw(lit_str("oops")))]),
        catch_name: Some("e".to_string()),
        catch_body: Some(block(vec![expr_stmt(call_ident(
            "record",
            vec![bin(BinaryOp::Add, lit_str("caught: "), ident("e"))],
        ))])),
        finally_body: Some(block(vec![expr_stmt(call_ident("record", vec![lit_str("done")]))])),
    })];
    hemlock_runtime::exec_program(&program, &env, &runtime).unwrap();

    let entries = log.lock().unwrap();
    assert_eq!(*entries, vec![Value::string("caught: oops"), Value::string("done")]);
}

/// `async fn f() { return 42; } let t = spawn(f); print(await t);` then a
/// second `join(t)` fails with `task handle already joined` (spec.md §8,
/// example 6).
#[test]
fn example_6_spawn_await_then_double_join_fails() {
    let (env, runtime) = setup();
    let f = function_literal(vec![], vec![return_stmt(lit_i64(42))], true);
    let program = vec![
        let_stmt("f", f, true),
        let_stmt("t", call_ident("spawn", vec![ident("f")]), false),
        let_stmt("awaited", await_expr(ident("t")), false),
    ];
    hemlock_runtime::exec_program(&program, &env, &runtime).unwrap();
    assert_eq!(env.lookup("awaited").unwrap(), Value::I64(42));

    let second_join = vec![expr_stmt(call_ident("join", vec![ident("t")]))];
    let err = hemlock_runtime::exec_program(&second_join, &env, &runtime).unwrap_err();
    let message = hemlock_runtime::methods::property_get(&err.into_inner(), "message").unwrap();
    assert_eq!(message, Value::string("task handle already joined"));
}

/// Property 6 (spec.md §8, invariant C1): "a value sent on a channel is
/// retained exactly once by the channel and released exactly once by the
/// receiver; net refcount change is zero." `send` retains its argument into
/// the buffer; `recv` transfers that buffer slot to the caller by move,
/// without an extra retain. So after `send` then `recv`, the only live
/// references are the two ordinary bindings holding the value — if the
/// channel leaked its internal retain, this count would be 3, not 2.
#[test]
fn channel_send_recv_conserves_refcount() {
    let (env, runtime) = setup();
    let program = vec![
        let_stmt("ch", call_ident("channel", vec![lit_i64(1)]), false),
        let_stmt("payload", array_lit(vec![lit_i64(1)]), false),
        expr_stmt(method_call(ident("ch"), "send", vec![ident("payload")])),
        let_stmt("received", method_call(ident("ch"), "recv", vec![]), false),
    ];
    hemlock_runtime::exec_program(&program, &env, &runtime).unwrap();
    let Value::Array(before) = env.lookup("payload").unwrap() else { panic!("expected an array") };
    let Value::Array(after) = env.lookup("received").unwrap() else { panic!("expected an array") };
    assert!(hemlock_core::handle::Handle::ptr_eq(&before, &after));
    assert_eq!(before.strong_count(), 2); // `payload` binding + `received` binding, no leaked channel retain
}

/// Property 9 (spec.md §8): object field insertion order is preserved
/// through iteration (`for...in`).
#[test]
fn object_field_order_is_preserved_on_iteration() {
    let (env, runtime) = setup();
    let (record, log) = recorder();
    env.define("record", record, true).unwrap();

    let obj = Arc::new(Expr::ObjectLiteral {
        type_name: None,
        fields: vec![
            ("z".to_string(), lit_i64(1)),
            ("a".to_string(), lit_i64(2)),
            ("m".to_string(), lit_i64(3)),
        ],
    });
    let program = vec![
        let_stmt("obj", obj, false),
        Arc::new(Stmt::ForIn {
            binding: "pair".to_string(),
            iterable: ident("obj"),
            body: block(vec![expr_stmt(call_ident("record", vec![method_call(ident("pair"), "get", vec![lit_i64(0)])]))]),
        }),
    ];
    hemlock_runtime::exec_program(&program, &env, &runtime).unwrap();
    let entries = log.lock().unwrap();
    assert_eq!(*entries, vec![Value::string("z"), Value::string("a"), Value::string("m")]);
}
