//! The recursive-descent tree walker (spec.md §4.4 "Expression evaluator",
//! §4.8 "Control flow: exceptions and defer").
//!
//! Throws propagate as `Err(Thrown)` through ordinary `?`, which is the
//! idiomatic Rust shape for "unwind until someone catches this" — it is
//! also exactly what `try`/`catch` below intercepts. `break`/`continue`
//! instead propagate as a `Signal` returned from statement execution,
//! since they only ever unwind as far as the nearest loop, never past a
//! function boundary.

use std::sync::Arc;

use hemlock_core::error::RuntimeError;
use hemlock_core::numeric::{self, IntWidth};

use crate::ast::{BinaryOp, CallArgs, Expr, ExprRef, InterpSegment, Literal, Stmt, StmtRef, SwitchCase, UnaryOp};
use crate::environment::Environment;
use crate::error::{raise, Thrown};
use crate::heap::FunctionObj;
use crate::runtime::Runtime;
use crate::value::Value;

use hemlock_core::handle::Handle;

/// Outcome of executing a statement: either plain fall-through, or a
/// control-flow signal that must propagate past this statement (spec.md
/// §4.8). `Throw` is not a variant here — it travels as `Err(Thrown)`.
pub enum Signal {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// One call frame's LIFO `defer` stack (spec.md §4.8 "`defer` expr
/// registers a deferred call on the current function's frame").
#[derive(Default)]
struct DeferStack {
    calls: Vec<(ExprRef, Environment)>,
}

impl DeferStack {
    fn push(&mut self, expr: ExprRef, env: Environment) {
        self.calls.push((expr, env));
    }

    /// Runs every deferred call LIFO regardless of how the frame is
    /// exiting. Deferred calls cannot themselves be cancelled or skipped
    /// (spec.md §4.8); a throwing deferred call overrides whatever
    /// previously-computed outcome the caller was about to return.
    fn run_all(self, runtime: &Runtime) -> Result<(), Thrown> {
        for (expr, env) in self.calls.into_iter().rev() {
            eval_expr(&expr, &env, runtime)?;
        }
        Ok(())
    }
}

pub fn eval_expr(expr: &Expr, env: &Environment, runtime: &Runtime) -> Result<Value, Thrown> {
    match expr {
        Expr::Literal(lit) => Ok(eval_literal(lit)),
        Expr::Identifier { name, resolved } => match resolved.get() {
            Some(r) => env
                .lookup_resolved(r.depth, r.slot)
                .or_else(|_| env.lookup(name))
                .map_err(Into::into),
            None => env.lookup(name).map_err(Into::into),
        },
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, env, runtime),
        Expr::Unary { op, operand } => eval_unary(*op, operand, env, runtime),
        Expr::Assign { target, value } => {
            let v = eval_expr(value, env, runtime)?;
            assign_to(target, v.clone(), env, runtime)?;
            Ok(v)
        }
        Expr::IndexAssign { target, index, value } => {
            let container = eval_expr(target, env, runtime)?;
            let idx = eval_expr(index, env, runtime)?;
            let v = eval_expr(value, env, runtime)?;
            crate::methods::index_set(&container, &idx, v.clone())?;
            Ok(v)
        }
        Expr::Call { callee, args } => eval_call(callee, args, env, runtime),
        Expr::MethodCall { receiver, method, args } => eval_method_call(receiver, method, args, env, runtime),
        Expr::Ternary { cond, then_branch, else_branch } => {
            if eval_expr(cond, env, runtime)?.truthiness() {
                eval_expr(then_branch, env, runtime)
            } else {
                eval_expr(else_branch, env, runtime)
            }
        }
        Expr::NullCoalesce { left, right } => {
            let l = eval_expr(left, env, runtime)?;
            if matches!(l, Value::Null) {
                eval_expr(right, env, runtime)
            } else {
                Ok(l)
            }
        }
        Expr::PreIncDec { target, increment } => {
            let cur = eval_expr(target, env, runtime)?;
            let next = step_numeric(&cur, *increment)?;
            assign_to(target, next.clone(), env, runtime)?;
            Ok(next)
        }
        Expr::PostIncDec { target, increment } => {
            let cur = eval_expr(target, env, runtime)?;
            let next = step_numeric(&cur, *increment)?;
            assign_to(target, next, env, runtime)?;
            Ok(cur)
        }
        Expr::ArrayLiteral(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_expr(item, env, runtime)?);
            }
            Ok(Value::new_array(values))
        }
        Expr::ObjectLiteral { type_name, fields } => {
            let mut entries = Vec::with_capacity(fields.len());
            for (name, value_expr) in fields {
                entries.push((name.clone(), eval_expr(value_expr, env, runtime)?));
            }
            Ok(Value::new_object(crate::heap::ObjectObj::from_entries(
                type_name.clone(),
                entries,
            )))
        }
        Expr::FunctionLiteral { params, rest_param, return_type, body, is_async } => {
            let func = FunctionObj::new(
                None,
                params.clone(),
                rest_param.clone(),
                return_type.clone(),
                body.clone(),
                env.clone(),
                *is_async,
            );
            Ok(Value::Function(Handle::new(func)))
        }
        Expr::Property { target, name } => {
            let receiver = eval_expr(target, env, runtime)?;
            crate::methods::property_get(&receiver, name)
        }
        Expr::Index { target, index } => {
            let receiver = eval_expr(target, env, runtime)?;
            let idx = eval_expr(index, env, runtime)?;
            crate::methods::index_get(&receiver, &idx)
        }
        Expr::Interpolation(segments) => {
            let mut out = String::new();
            for seg in segments {
                match seg {
                    InterpSegment::Literal(s) => out.push_str(s),
                    InterpSegment::Expr(e) => out.push_str(&eval_expr(e, env, runtime)?.to_display_string()),
                }
            }
            Ok(Value::string(out))
        }
        Expr::Await(inner) => {
            let v = eval_expr(inner, env, runtime)?;
            match v {
                Value::Task(handle) => {
                    let task = handle.get().map_err(RuntimeError::from)?;
                    task.join()
                }
                other => Ok(other),
            }
        }
    }
}

fn eval_literal(lit: &Literal) -> Value {
    match lit {
        Literal::I8(n) => Value::I8(*n),
        Literal::I16(n) => Value::I16(*n),
        Literal::I32(n) => Value::I32(*n),
        Literal::I64(n) => Value::I64(*n),
        Literal::U8(n) => Value::U8(*n),
        Literal::U16(n) => Value::U16(*n),
        Literal::U32(n) => Value::U32(*n),
        Literal::U64(n) => Value::U64(*n),
        Literal::F32(n) => Value::F32(*n),
        Literal::F64(n) => Value::F64(*n),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Rune(r) => Value::Rune(*r),
        Literal::String(s) => Value::string(s.as_str()),
        Literal::Null => Value::Null,
    }
}

fn step_numeric(v: &Value, increment: bool) -> Result<Value, Thrown> {
    let delta: i64 = if increment { 1 } else { -1 };
    match v {
        Value::I8(n) => Ok(Value::I8((*n as i64 + delta) as i8)),
        Value::I16(n) => Ok(Value::I16((*n as i64 + delta) as i16)),
        Value::I32(n) => Ok(Value::I32((*n as i64 + delta) as i32)),
        Value::I64(n) => Ok(Value::I64(n + delta)),
        Value::U8(n) => Ok(Value::U8((*n as i64 + delta).max(0) as u8)),
        Value::U16(n) => Ok(Value::U16((*n as i64 + delta).max(0) as u16)),
        Value::U32(n) => Ok(Value::U32((*n as i64 + delta).max(0) as u32)),
        Value::U64(n) => Ok(Value::U64((*n as i64 + delta).max(0) as u64)),
        Value::F32(n) => Ok(Value::F32(n + delta as f32)),
        Value::F64(n) => Ok(Value::F64(n + delta as f64)),
        _ => raise(RuntimeError::type_error("inc/dec requires a numeric operand")),
    }
}

fn assign_to(target: &Expr, value: Value, env: &Environment, runtime: &Runtime) -> Result<(), Thrown> {
    match target {
        Expr::Identifier { name, resolved } => {
            if let Some(r) = resolved.get() {
                if env.assign_resolved(r.depth, r.slot, value.clone()).is_ok() {
                    return Ok(());
                }
            }
            env.assign(name, value).map_err(Into::into)
        }
        Expr::Index { target, index } => {
            let container = eval_expr(target, env, runtime)?;
            let idx = eval_expr(index, env, runtime)?;
            crate::methods::index_set(&container, &idx, value)
        }
        Expr::Property { target, name } => {
            let container = eval_expr(target, env, runtime)?;
            crate::methods::property_set(&container, name, value)
        }
        _ => raise(RuntimeError::type_error("invalid assignment target")),
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, env: &Environment, runtime: &Runtime) -> Result<Value, Thrown> {
    if matches!(op, BinaryOp::And) {
        let l = eval_expr(left, env, runtime)?;
        return if !l.truthiness() {
            Ok(Value::Bool(false))
        } else {
            Ok(Value::Bool(eval_expr(right, env, runtime)?.truthiness()))
        };
    }
    if matches!(op, BinaryOp::Or) {
        let l = eval_expr(left, env, runtime)?;
        return if l.truthiness() {
            Ok(Value::Bool(true))
        } else {
            Ok(Value::Bool(eval_expr(right, env, runtime)?.truthiness()))
        };
    }

    let l = eval_expr(left, env, runtime)?;
    let r = eval_expr(right, env, runtime)?;
    apply_binary(op, &l, &r)
}

fn apply_binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Thrown> {
    use BinaryOp::*;
    match op {
        Eq => return Ok(Value::Bool(l.equal(r))),
        NotEq => return Ok(Value::Bool(!l.equal(r))),
        _ => {}
    }
    match op {
        Lt | LtEq | Gt | GtEq => {
            if l.is_numeric() && r.is_numeric() {
                let (lf, rf) = (l.as_f64().unwrap(), r.as_f64().unwrap());
                let result = match op {
                    Lt => lf < rf,
                    LtEq => lf <= rf,
                    Gt => lf > rf,
                    GtEq => lf >= rf,
                    _ => unreachable!(),
                };
                return Ok(Value::Bool(result));
            }
            return raise(RuntimeError::type_error("comparison requires numeric operands"));
        }
        BitAnd | BitOr | BitXor | Shl | Shr => {
            let (a, b) = (
                l.as_i64().ok_or_else(|| RuntimeError::type_error("bitwise operator requires integer operands"))?,
                r.as_i64().ok_or_else(|| RuntimeError::type_error("bitwise operator requires integer operands"))?,
            );
            if l.is_float() || r.is_float() {
                return raise(RuntimeError::type_error("bitwise operators require integer operands"));
            }
            let result = match op {
                BitAnd => a & b,
                BitOr => a | b,
                BitXor => a ^ b,
                Shl => a << b,
                Shr => a >> b,
                _ => unreachable!(),
            };
            return rewrap_int(l, r, result);
        }
        _ => {}
    }

    // Add/Sub/Mul/Div/Rem, promoting to float if either side is a float
    // (spec.md §4.1 "promotes to the widest operand type").
    if l.is_float() || r.is_float() {
        let (a, b) = (
            l.as_f64().ok_or_else(|| RuntimeError::type_error("arithmetic requires numeric operands"))?,
            r.as_f64().ok_or_else(|| RuntimeError::type_error("arithmetic requires numeric operands"))?,
        );
        let result = match op {
            Add => a + b,
            Sub => a - b,
            Mul => a * b,
            Div => numeric::checked_float_div(a, b)?,
            Rem => {
                if b == 0.0 {
                    return raise(RuntimeError::type_error("float modulo by zero"));
                }
                a % b
            }
            _ => unreachable!(),
        };
        return Ok(Value::F64(result));
    }

    if op == Add && matches!((l, r), (Value::String(_), _) | (_, Value::String(_))) {
        if let (Value::String(_), Value::String(_)) = (l, r) {
            let a = string_contents(l)?;
            let b = string_contents(r)?;
            return Ok(Value::string(format!("{a}{b}")));
        }
    }

    let a = l.as_i64().ok_or_else(|| RuntimeError::type_error("arithmetic requires numeric operands"))?;
    let b = r.as_i64().ok_or_else(|| RuntimeError::type_error("arithmetic requires numeric operands"))?;
    let result = match op {
        Add => a.wrapping_add(b),
        Sub => a.wrapping_sub(b),
        Mul => a.wrapping_mul(b),
        Div => numeric::checked_int_div(a, b)?,
        Rem => numeric::checked_int_rem(a, b)?,
        _ => unreachable!(),
    };
    rewrap_int(l, r, result)
}

fn string_contents(v: &Value) -> Result<String, Thrown> {
    match v {
        Value::String(h) => Ok(h.get().map_err(RuntimeError::from)?.as_str_lossy()),
        other => Ok(other.to_display_string()),
    }
}

/// Re-wraps an integer arithmetic result in the wider of the two operand
/// widths (spec.md §4.1), enforcing that width's range.
fn rewrap_int(l: &Value, r: &Value, result: i64) -> Result<Value, Thrown> {
    let width = wider_width(l.int_width(), r.int_width()).unwrap_or(IntWidth::I64);
    let checked = width.check(result).map_err(Thrown::from)?;
    Ok(match width {
        IntWidth::I8 => Value::I8(checked as i8),
        IntWidth::I16 => Value::I16(checked as i16),
        IntWidth::I32 => Value::I32(checked as i32),
        IntWidth::I64 => Value::I64(checked),
        IntWidth::U8 => Value::U8(checked as u8),
        IntWidth::U16 => Value::U16(checked as u16),
        IntWidth::U32 => Value::U32(checked as u32),
        IntWidth::U64 => Value::U64(checked as u64),
    })
}

fn width_rank(w: IntWidth) -> u8 {
    match w {
        IntWidth::I8 | IntWidth::U8 => 1,
        IntWidth::I16 | IntWidth::U16 => 2,
        IntWidth::I32 | IntWidth::U32 => 3,
        IntWidth::I64 | IntWidth::U64 => 4,
    }
}

fn wider_width(a: Option<IntWidth>, b: Option<IntWidth>) -> Option<IntWidth> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if width_rank(a) >= width_rank(b) { a } else { b }),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn eval_unary(op: UnaryOp, operand: &Expr, env: &Environment, runtime: &Runtime) -> Result<Value, Thrown> {
    let v = eval_expr(operand, env, runtime)?;
    match op {
        UnaryOp::Not => Ok(Value::Bool(!v.truthiness())),
        UnaryOp::Neg => match v {
            Value::I8(n) => Ok(Value::I8(-n)),
            Value::I16(n) => Ok(Value::I16(-n)),
            Value::I32(n) => Ok(Value::I32(-n)),
            Value::I64(n) => Ok(Value::I64(-n)),
            Value::F32(n) => Ok(Value::F32(-n)),
            Value::F64(n) => Ok(Value::F64(-n)),
            _ => raise(RuntimeError::type_error("unary '-' requires a numeric operand")),
        },
        UnaryOp::BitNot => {
            let a = v.as_i64().ok_or_else(|| RuntimeError::type_error("'~' requires an integer operand"))?;
            if v.is_float() {
                return raise(RuntimeError::type_error("'~' requires an integer operand"));
            }
            rewrap_int(&v, &v, !a)
        }
    }
}

fn eval_args(args: &CallArgs, env: &Environment, runtime: &Runtime) -> Result<(Vec<Value>, Vec<(String, Value)>), Thrown> {
    let mut positional = Vec::with_capacity(args.positional.len());
    for e in &args.positional {
        positional.push(eval_expr(e, env, runtime)?);
    }
    let mut named = Vec::with_capacity(args.named.len());
    for (name, e) in &args.named {
        named.push((name.clone(), eval_expr(e, env, runtime)?));
    }
    if let Some(spread) = &args.spread {
        let v = eval_expr(spread, env, runtime)?;
        if let Value::Array(h) = v {
            let arr = h.get().map_err(RuntimeError::from)?;
            positional.extend(arr.to_vec());
        } else {
            return raise(RuntimeError::type_error("spread argument must be an array"));
        }
    }
    Ok((positional, named))
}

fn eval_call(callee: &Expr, args: &CallArgs, env: &Environment, runtime: &Runtime) -> Result<Value, Thrown> {
    if let Expr::Identifier { name, .. } = callee {
        if let Some(result) = eval_intrinsic(name, args, env, runtime)? {
            return Ok(result);
        }
    }
    let callee_val = eval_expr(callee, env, runtime)?;
    let (positional, named) = eval_args(args, env, runtime)?;
    dispatch_call(&callee_val, positional, named, runtime)
}

/// `spawn`/`channel`/`join`/`detach`/`free` need a `&Runtime` that an
/// ordinary `BuiltinFnValue` implementation has no way to carry (its
/// signature is `Fn(&[Value]) -> Result<Value, Thrown>`, with no runtime
/// parameter, to keep `Value` itself free of a dependency on `Runtime`).
/// The evaluator recognizes these five names directly instead of routing
/// them through the builtin table.
fn eval_intrinsic(name: &str, args: &CallArgs, env: &Environment, runtime: &Runtime) -> Result<Option<Value>, Thrown> {
    match name {
        "spawn" => {
            let (positional, _named) = eval_args(args, env, runtime)?;
            let (func, rest) = positional
                .split_first()
                .ok_or_else(|| RuntimeError::arity("spawn expects a function argument"))?;
            Ok(Some(crate::task::spawn(func, rest.to_vec(), runtime)?))
        }
        "channel" => {
            let (positional, _named) = eval_args(args, env, runtime)?;
            let capacity = positional.first().and_then(Value::as_i64);
            Ok(Some(crate::channel::make(capacity, runtime)?))
        }
        "join" => {
            let (positional, _named) = eval_args(args, env, runtime)?;
            match positional.first() {
                Some(Value::Task(h)) => Ok(Some(crate::task::join(h)?)),
                _ => raise(RuntimeError::type_error("join expects a task argument")).map(Some),
            }
        }
        "detach" => {
            let (positional, _named) = eval_args(args, env, runtime)?;
            match positional.first() {
                Some(Value::Task(h)) => {
                    crate::task::detach(h)?;
                    Ok(Some(Value::Null))
                }
                _ => raise(RuntimeError::type_error("detach expects a task argument")).map(Some),
            }
        }
        "free" => {
            let (positional, _named) = eval_args(args, env, runtime)?;
            let target = positional.first().cloned().unwrap_or(Value::Null);
            crate::memory::free(&target, runtime)?;
            Ok(Some(Value::Null))
        }
        _ => Ok(None),
    }
}

fn eval_method_call(
    receiver: &Expr,
    method: &str,
    args: &CallArgs,
    env: &Environment,
    runtime: &Runtime,
) -> Result<Value, Thrown> {
    let receiver_val = eval_expr(receiver, env, runtime)?;
    let (positional, _named) = eval_args(args, env, runtime)?;
    crate::methods::call_method(&receiver_val, method, &positional, runtime)
}

pub fn dispatch_call(
    callee: &Value,
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
    runtime: &Runtime,
) -> Result<Value, Thrown> {
    match callee {
        Value::Function(handle) => {
            let func = handle.get().map_err(RuntimeError::from)?;
            call_function(func, positional, named, runtime)
        }
        Value::BuiltinFn(b) => {
            if !b.variadic && positional.len() != b.arity {
                return raise(RuntimeError::arity(format!(
                    "'{}' expects {} argument(s), got {}",
                    b.name,
                    b.arity,
                    positional.len()
                )));
            }
            if b.variadic && positional.len() < b.arity {
                return raise(RuntimeError::arity(format!(
                    "'{}' expects at least {} argument(s), got {}",
                    b.name,
                    b.arity,
                    positional.len()
                )));
            }
            (b.implementation)(&positional)
        }
        _ => raise(RuntimeError::type_error("value is not callable")),
    }
}

/// Binds positional/named/defaulted/rest parameters into a fresh child
/// scope of `captured_env`, evaluates the body, and runs that frame's
/// defers on every exit path (spec.md §4.4 "Call: Function", §4.8).
pub fn call_function(
    func: &FunctionObj,
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
    runtime: &Runtime,
) -> Result<Value, Thrown> {
    let required = func.required_arity();
    if positional.len() < required && named.is_empty() {
        return raise(RuntimeError::arity(format!(
            "expected at least {required} argument(s), got {}",
            positional.len()
        )));
    }
    if positional.len() > func.max_positional() && func.rest_param.is_none() {
        return raise(RuntimeError::arity(format!(
            "expected at most {} argument(s), got {}",
            func.max_positional(),
            positional.len()
        )));
    }

    let call_env = func.captured_env.child();
    for (i, param) in func.parameters.iter().enumerate() {
        let value = if let Some(v) = positional.get(i) {
            v.clone()
        } else if let Some((_, v)) = named.iter().find(|(n, _)| n == &param.name) {
            v.clone()
        } else if let Some(default_expr) = &param.default {
            eval_expr(default_expr, &call_env, runtime)?
        } else {
            return raise(RuntimeError::arity(format!("missing required argument '{}'", param.name)));
        };
        call_env.define(&param.name, value, false).map_err(Thrown::from)?;
    }
    if let Some(rest_name) = &func.rest_param {
        let rest: Vec<Value> = positional
            .iter()
            .skip(func.parameters.len())
            .cloned()
            .collect();
        call_env.define(rest_name, Value::new_array(rest), false).map_err(Thrown::from)?;
    }

    let mut defers = DeferStack::default();
    let result = exec_stmt(&func.body, &call_env, runtime, &mut defers);
    let return_value = match result {
        Ok(Signal::Return(v)) => Ok(v),
        Ok(Signal::Normal) | Ok(Signal::Break) | Ok(Signal::Continue) => Ok(Value::Null),
        Err(e) => Err(e),
    };
    defers.run_all(runtime)?;
    return_value
}

pub fn exec_program(statements: &[StmtRef], env: &Environment, runtime: &Runtime) -> Result<(), Thrown> {
    let mut defers = DeferStack::default();
    for stmt in statements {
        exec_stmt(stmt, env, runtime, &mut defers)?;
    }
    defers.run_all(runtime)
}

fn exec_block(statements: &[StmtRef], env: &Environment, runtime: &Runtime, defers: &mut DeferStack) -> Result<Signal, Thrown> {
    let block_env = env.child();
    for stmt in statements {
        match exec_stmt(stmt, &block_env, runtime, defers)? {
            Signal::Normal => {}
            other => return Ok(other),
        }
    }
    Ok(Signal::Normal)
}

fn exec_stmt(stmt: &Stmt, env: &Environment, runtime: &Runtime, defers: &mut DeferStack) -> Result<Signal, Thrown> {
    match stmt {
        Stmt::Let { name, value, is_const, .. } => {
            let v = eval_expr(value, env, runtime)?;
            env.define(name, v, *is_const).map_err(Thrown::from)?;
            Ok(Signal::Normal)
        }
        Stmt::Block(statements) => exec_block(statements, env, runtime, defers),
        Stmt::If { cond, then_branch, else_branch } => {
            if eval_expr(cond, env, runtime)?.truthiness() {
                exec_stmt(then_branch, env, runtime, defers)
            } else if let Some(else_branch) = else_branch {
                exec_stmt(else_branch, env, runtime, defers)
            } else {
                Ok(Signal::Normal)
            }
        }
        Stmt::While { cond, body } => {
            while eval_expr(cond, env, runtime)?.truthiness() {
                match exec_stmt(body, env, runtime, defers)? {
                    Signal::Break => break,
                    Signal::Continue | Signal::Normal => {}
                    Signal::Return(v) => return Ok(Signal::Return(v)),
                }
            }
            Ok(Signal::Normal)
        }
        Stmt::ForClassic { init, cond, post, body } => {
            let loop_env = env.child();
            if let Some(init) = init {
                exec_stmt(init, &loop_env, runtime, defers)?;
            }
            loop {
                if let Some(cond) = cond {
                    if !eval_expr(cond, &loop_env, runtime)?.truthiness() {
                        break;
                    }
                }
                match exec_stmt(body, &loop_env, runtime, defers)? {
                    Signal::Break => break,
                    Signal::Continue | Signal::Normal => {}
                    Signal::Return(v) => return Ok(Signal::Return(v)),
                }
                if let Some(post) = post {
                    eval_expr(post, &loop_env, runtime)?;
                }
            }
            Ok(Signal::Normal)
        }
        Stmt::ForIn { binding, iterable, body } => {
            let iterable_val = eval_expr(iterable, env, runtime)?;
            let items = crate::methods::iterate(&iterable_val)?;
            for item in items {
                let loop_env = env.child();
                loop_env.define(binding, item, false).map_err(Thrown::from)?;
                match exec_stmt(body, &loop_env, runtime, defers)? {
                    Signal::Break => break,
                    Signal::Continue | Signal::Normal => {}
                    Signal::Return(v) => return Ok(Signal::Return(v)),
                }
            }
            Ok(Signal::Normal)
        }
        Stmt::Return(expr) => {
            let v = match expr {
                Some(e) => eval_expr(e, env, runtime)?,
                None => Value::Null,
            };
            Ok(Signal::Return(v))
        }
        Stmt::Break => Ok(Signal::Break),
        Stmt::Continue => Ok(Signal::Continue),
        Stmt::Switch { subject, cases } => {
            let subject_val = eval_expr(subject, env, runtime)?;
            let switch_env = env.child();
            for case in cases {
                match case {
                    SwitchCase::Pattern { value, body } => {
                        let pattern_val = eval_expr(value, &switch_env, runtime)?;
                        if subject_val.equal(&pattern_val) {
                            return match exec_block(body, &switch_env, runtime, defers)? {
                                Signal::Break => Ok(Signal::Normal),
                                other => Ok(other),
                            };
                        }
                    }
                    SwitchCase::Default { .. } => {}
                }
            }
            for case in cases {
                if let SwitchCase::Default { body } = case {
                    return match exec_block(body, &switch_env, runtime, defers)? {
                        Signal::Break => Ok(Signal::Normal),
                        other => Ok(other),
                    };
                }
            }
            Ok(Signal::Normal)
        }
        Stmt::Try { body, catch_name, catch_body, finally_body } => {
            let result = exec_stmt(body, env, runtime, defers);
            let mut outcome = match result {
                Err(thrown) => {
                    if let Some(catch_body) = catch_body {
                        let catch_env = env.child();
                        if let Some(name) = catch_name {
                            catch_env
                                .define(name, thrown.clone().into_inner(), false)
                                .map_err(Thrown::from)?;
                        }
                        exec_stmt(catch_body, &catch_env, runtime, defers)
                    } else {
                        Err(thrown)
                    }
                }
                ok => ok,
            };
            if let Some(finally_body) = finally_body {
                // A finally that itself returns/throws/breaks overrides the
                // prior outcome (spec.md §4.8).
                match exec_stmt(finally_body, env, runtime, defers) {
                    Ok(Signal::Normal) => {}
                    other => outcome = other,
                }
            }
            outcome
        }
        Stmt::Throw(expr) => {
            let v = eval_expr(expr, env, runtime)?;
            Err(crate::error::thrown(v))
        }
        Stmt::Defer(expr) => {
            defers.push(expr.clone(), env.clone());
            Ok(Signal::Normal)
        }
        Stmt::Expr(expr) => {
            eval_expr(expr, env, runtime)?;
            Ok(Signal::Normal)
        }
    }
}

/// Convenience used by `crate::task::spawn`: runs a function body on
/// whatever thread calls this, returning the same `Result` `await`/`join`
/// would see.
pub fn call_spawned(func: Handle<FunctionObj>, args: Vec<Value>, runtime: Runtime) -> Result<Value, Thrown> {
    let f = func.get().map_err(RuntimeError::from)?;
    call_function(f, args, Vec::new(), &runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, Param};

    fn lit(l: Literal) -> ExprRef {
        Arc::new(Expr::Literal(l))
    }

    #[test]
    fn arithmetic_precedence_like_expression() {
        // 2 + 3 * 4
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            left: lit(Literal::I64(2)),
            right: Arc::new(Expr::Binary {
                op: BinaryOp::Mul,
                left: lit(Literal::I64(3)),
                right: lit(Literal::I64(4)),
            }),
        };
        let env = Environment::root();
        let runtime = Runtime::default();
        assert_eq!(eval_expr(&expr, &env, &runtime).unwrap(), Value::I64(14));
    }

    #[test]
    fn try_catch_finally_runs_once_on_throw() {
        let env = Environment::root();
        let runtime = Runtime::default();
        let mut defers = DeferStack::default();
        let mut finally_count = 0;
        for _ in 0..1 {
            let stmt = Stmt::Try {
                body: Arc::new(Stmt::Throw(lit(Literal::String("oops".to_string())))),
                catch_name: Some("e".to_string()),
                catch_body: Some(Arc::new(Stmt::Expr(lit(Literal::Null)))),
                finally_body: Some(Arc::new(Stmt::Expr(lit(Literal::Null)))),
            };
            let signal = exec_stmt(&stmt, &env, &runtime, &mut defers);
            assert!(signal.is_ok());
            finally_count += 1;
        }
        assert_eq!(finally_count, 1);
    }

    #[test]
    fn defer_runs_lifo_on_function_exit() {
        let order = std::sync::Arc::new(std::sync::Mutex::new(Vec::<i64>::new()));
        let o1 = order.clone();
        let o2 = order.clone();
        let env = Environment::root();
        env.define(
            "record",
            Value::BuiltinFn(crate::value::BuiltinFnValue {
                name: Arc::from("record"),
                arity: 1,
                variadic: false,
                implementation: Arc::new(move |args: &[Value]| {
                    if let Some(Value::I64(n)) = args.first() {
                        o1.lock().unwrap().push(*n);
                    }
                    Ok(Value::Null)
                }),
                captured_env: None,
            }),
            false,
        )
        .unwrap();
        let _ = o2;

        let body = Arc::new(Stmt::Block(vec![
            Arc::new(Stmt::Defer(Arc::new(Expr::Call {
                callee: Arc::new(Expr::Identifier { name: "record".to_string(), resolved: crate::ast::ResolvedSlot::empty() }),
                args: CallArgs { positional: vec![lit(Literal::I64(1))], named: vec![], spread: None },
            }))),
            Arc::new(Stmt::Defer(Arc::new(Expr::Call {
                callee: Arc::new(Expr::Identifier { name: "record".to_string(), resolved: crate::ast::ResolvedSlot::empty() }),
                args: CallArgs { positional: vec![lit(Literal::I64(2))], named: vec![], spread: None },
            }))),
        ]));
        let func = FunctionObj::new(None, vec![], None, None, body, env.clone(), false);
        let runtime = Runtime::default();
        call_function(&func, vec![], vec![], &runtime).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![2, 1]);
    }

    #[test]
    fn break_exits_while_loop() {
        let env = Environment::root();
        env.define("i", Value::I64(0), false).unwrap();
        let runtime = Runtime::default();
        let body = Stmt::While {
            cond: lit(Literal::Bool(true)),
            body: Arc::new(Stmt::Break),
        };
        let mut defers = DeferStack::default();
        let signal = exec_stmt(&body, &env, &runtime, &mut defers).unwrap();
        assert!(matches!(signal, Signal::Normal));
    }

    #[test]
    fn break_inside_switch_does_not_escape_enclosing_loop() {
        let order = std::sync::Arc::new(std::sync::Mutex::new(Vec::<i64>::new()));
        let o1 = order.clone();
        let env = Environment::root();
        env.define(
            "record",
            Value::BuiltinFn(crate::value::BuiltinFnValue {
                name: Arc::from("record"),
                arity: 1,
                variadic: false,
                implementation: Arc::new(move |args: &[Value]| {
                    if let Some(Value::I64(n)) = args.first() {
                        o1.lock().unwrap().push(*n);
                    }
                    Ok(Value::Null)
                }),
                captured_env: None,
            }),
            false,
        )
        .unwrap();

        let i_ident = || Arc::new(Expr::Identifier { name: "i".to_string(), resolved: crate::ast::ResolvedSlot::empty() });
        let record_call = |arg: ExprRef| {
            Arc::new(Stmt::Expr(Arc::new(Expr::Call {
                callee: Arc::new(Expr::Identifier { name: "record".to_string(), resolved: crate::ast::ResolvedSlot::empty() }),
                args: CallArgs { positional: vec![arg], named: vec![], spread: None },
            })))
        };

        // for (let i = 0; i < 3; i++) { switch (1) { case 1: record(i); break; } }
        let switch_stmt = Stmt::Switch {
            subject: lit(Literal::I64(1)),
            cases: vec![SwitchCase::Pattern {
                value: lit(Literal::I64(1)),
                body: vec![record_call(i_ident()), Arc::new(Stmt::Break)],
            }],
        };
        let for_stmt = Stmt::ForClassic {
            init: Some(Arc::new(Stmt::Let { name: "i".to_string(), type_hint: None, value: lit(Literal::I64(0)), is_const: false })),
            cond: Some(Arc::new(Expr::Binary { op: BinaryOp::Lt, left: i_ident(), right: lit(Literal::I64(3)) })),
            post: Some(Arc::new(Expr::PostIncDec { target: i_ident(), increment: true })),
            body: Arc::new(Stmt::Block(vec![Arc::new(switch_stmt)])),
        };

        let runtime = Runtime::default();
        let mut defers = DeferStack::default();
        let signal = exec_stmt(&for_stmt, &env, &runtime, &mut defers).unwrap();
        assert!(matches!(signal, Signal::Normal));
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn scope_isolation_for_block() {
        let env = Environment::root();
        env.define("x", Value::I64(1), false).unwrap();
        let runtime = Runtime::default();
        let mut defers = DeferStack::default();
        let block = Stmt::Block(vec![Arc::new(Stmt::Let {
            name: "x".to_string(),
            type_hint: None,
            value: lit(Literal::I64(2)),
            is_const: false,
        })]);
        exec_stmt(&block, &env, &runtime, &mut defers).unwrap();
        assert_eq!(env.lookup("x").unwrap(), Value::I64(1));
    }

    #[test]
    fn missing_required_argument_is_arity_error() {
        let env = Environment::root();
        let runtime = Runtime::default();
        let func = FunctionObj::new(
            None,
            vec![Param { name: "a".to_string(), type_hint: None, default: None }],
            None,
            None,
            Arc::new(Stmt::Return(None)),
            env,
            false,
        );
        assert!(call_function(&func, vec![], vec![], &runtime).is_err());
    }
}
