//! `FunctionObj`: an AST body closed over an environment (spec.md §3, §4.4
//! "Function literal").
//!
//! Immutable after construction, so no `UnsafeCell` is needed here — unlike
//! the other heap objects, a function's own fields never change after
//! `FunctionLiteral` evaluation builds it.

use crate::ast::{Param, StmtRef};
use crate::environment::Environment;

pub struct FunctionObj {
    pub name: Option<String>,
    pub parameters: Vec<Param>,
    pub rest_param: Option<String>,
    pub return_type: Option<String>,
    pub body: StmtRef,
    pub captured_env: Environment,
    pub is_async: bool,
}

impl FunctionObj {
    pub fn new(
        name: Option<String>,
        parameters: Vec<Param>,
        rest_param: Option<String>,
        return_type: Option<String>,
        body: StmtRef,
        captured_env: Environment,
        is_async: bool,
    ) -> Self {
        Self {
            name,
            parameters,
            rest_param,
            return_type,
            body,
            captured_env,
            is_async,
        }
    }

    pub fn required_arity(&self) -> usize {
        self.parameters.iter().filter(|p| p.default.is_none()).count()
    }

    pub fn max_positional(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_variadic(&self) -> bool {
        self.rest_param.is_some()
    }
}

impl std::fmt::Debug for FunctionObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionObj")
            .field("name", &self.name)
            .field("arity", &self.parameters.len())
            .field("is_async", &self.is_async)
            .finish()
    }
}
