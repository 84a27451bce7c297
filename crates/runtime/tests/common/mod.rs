//! Hand-built AST construction helpers shared across integration tests.
//!
//! The execution core never parses source text (spec.md §1 scopes lexing
//! and parsing to a separate front-end crate), so every integration test
//! assembles a `Program` directly the way a front end's parser would.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use hemlock_runtime::ast::{CallArgs, Expr, ExprRef, Literal, Param, ResolvedSlot, Stmt, StmtRef};
use hemlock_runtime::value::{BuiltinFnValue, Value};

pub fn lit_i64(n: i64) -> ExprRef {
    Arc::new(Expr::Literal(Literal::I64(n)))
}

pub fn lit_bool(b: bool) -> ExprRef {
    Arc::new(Expr::Literal(Literal::Bool(b)))
}

pub fn lit_str(s: &str) -> ExprRef {
    Arc::new(Expr::Literal(Literal::String(s.to_string())))
}

pub fn ident(name: &str) -> ExprRef {
    Arc::new(Expr::Identifier {
        name: name.to_string(),
        resolved: ResolvedSlot::empty(),
    })
}

pub fn bin(op: hemlock_runtime::ast::BinaryOp, l: ExprRef, r: ExprRef) -> ExprRef {
    Arc::new(Expr::Binary { op, left: l, right: r })
}

pub fn call(callee: ExprRef, positional: Vec<ExprRef>) -> ExprRef {
    Arc::new(Expr::Call {
        callee,
        args: CallArgs { positional, named: Vec::new(), spread: None },
    })
}

pub fn call_ident(name: &str, positional: Vec<ExprRef>) -> ExprRef {
    call(ident(name), positional)
}

pub fn method_call(receiver: ExprRef, method: &str, positional: Vec<ExprRef>) -> ExprRef {
    Arc::new(Expr::MethodCall {
        receiver,
        method: method.to_string(),
        args: CallArgs { positional, named: Vec::new(), spread: None },
    })
}

pub fn index_assign(target: ExprRef, index: ExprRef, value: ExprRef) -> ExprRef {
    Arc::new(Expr::IndexAssign { target, index, value })
}

pub fn array_lit(items: Vec<ExprRef>) -> ExprRef {
    Arc::new(Expr::ArrayLiteral(items))
}

pub fn await_expr(inner: ExprRef) -> ExprRef {
    Arc::new(Expr::Await(inner))
}

pub fn function_literal(params: Vec<&str>, body: Vec<StmtRef>, is_async: bool) -> ExprRef {
    Arc::new(Expr::FunctionLiteral {
        params: params
            .into_iter()
            .map(|name| Param { name: name.to_string(), type_hint: None, default: None })
            .collect(),
        rest_param: None,
        return_type: None,
        body: Arc::new(Stmt::Block(body)),
        is_async,
    })
}

pub fn let_stmt(name: &str, value: ExprRef, is_const: bool) -> StmtRef {
    Arc::new(Stmt::Let { name: name.to_string(), type_hint: None, value, is_const })
}

pub fn expr_stmt(e: ExprRef) -> StmtRef {
    Arc::new(Stmt::Expr(e))
}

pub fn return_stmt(e: ExprRef) -> StmtRef {
    Arc::new(Stmt::Return(Some(e)))
}

pub fn block(stmts: Vec<StmtRef>) -> StmtRef {
    Arc::new(Stmt::Block(stmts))
}

/// Installs a `tracing` subscriber for the duration of the test binary, so
/// `debug!`/`warn!` calls in the evaluator/task/channel/memory modules are
/// visible with `--nocapture` instead of silently going nowhere. Safe to
/// call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A one-argument builtin that records every call's argument into a shared
/// log, for asserting evaluation order/values from inside a scope the test
/// can't otherwise observe (e.g. a `finally` block's own child scope).
pub fn recorder() -> (Value, Arc<Mutex<Vec<Value>>>) {
    let log: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let log_for_closure = log.clone();
    let value = Value::BuiltinFn(BuiltinFnValue {
        name: Arc::from("record"),
        arity: 1,
        variadic: false,
        implementation: Arc::new(move |args: &[Value]| {
            log_for_closure.lock().unwrap().push(args[0].clone());
            Ok(Value::Null)
        }),
        captured_env: None,
    });
    (value, log)
}
