//! Script resolution.
//!
//! [`Game::run`] dispatches on the shape of what it is handed:
//!
//! - native function: called directly with the params
//! - bound native: its pre-bound params merge under the caller's
//! - instruction: its own params merge under the caller's, then its
//!   name resolves like an expression string
//! - plain name: registry lookup, invoked with the params
//! - chained expression: the head resolves as a zero-argument call and
//!   must yield an accessor, which interprets the remainder; a
//!   runnable result runs with the caller's params
//!
//! On key collision the caller's params always win, which is what lets
//! an option action override defaults baked into a stored instruction.
//! A terminal accessor collapses through its default value. Depth is
//! guarded so a self-referencing script fails loudly instead of
//! overflowing the stack.

use crate::engine::accessor::{split_expr, ExprShape};
use crate::engine::errors::EngineError;
use crate::engine::script::{merge_params, Action, Params, Script, Value};
use crate::engine::state::Game;

/// Nesting depth at which resolution gives up.
const RECURSION_LIMIT: u32 = 64;

impl Game {
    /// Runs any runtime script shape.
    pub fn run(&mut self, script: &Script, params: &Params) -> Result<Value, EngineError> {
        self.enter_depth()?;
        let out = match script {
            Script::Native(f) => f(self, params),
            Script::Bound(f, bound) => {
                let merged = merge_params(bound, params);
                f(self, &merged)
            }
            Script::Expr(text) => self.run_name(text, params),
            Script::Call(inst) => {
                let merged = merge_params(&inst.params, params);
                self.run_name(&inst.name, &merged)
            }
        };
        self.exit_depth();
        out
    }

    /// Runs a stored action (the serializable script subset).
    pub fn run_action(&mut self, action: &Action, params: &Params) -> Result<Value, EngineError> {
        self.enter_depth()?;
        let out = match action {
            Action::Expr(text) => self.run_name(text, params),
            Action::Call(inst) => {
                let merged = merge_params(&inst.params, params);
                self.run_name(&inst.name, &merged)
            }
        };
        self.exit_depth();
        out
    }

    /// Absent actions are a no-op; anything else runs normally.
    pub fn run_opt(
        &mut self,
        action: Option<&Action>,
        params: &Params,
    ) -> Result<Value, EngineError> {
        match action {
            None => Ok(Value::null()),
            Some(action) => self.run_action(action, params),
        }
    }

    /// Evaluates an expression string with no parameters, as template
    /// interpolation does.
    pub fn eval(&mut self, expr: &str) -> Result<Value, EngineError> {
        self.enter_depth()?;
        let out = self.run_name(expr, &Params::new());
        self.exit_depth();
        out
    }

    fn run_name(&mut self, text: &str, params: &Params) -> Result<Value, EngineError> {
        match split_expr(text) {
            ExprShape::Plain(name) => {
                let Some(f) = self.content.script(name) else {
                    return Err(EngineError::ScriptNotFound(name.to_string()));
                };
                let value = f(self, params)?;
                self.collapse(value)
            }
            ExprShape::Chained { head, rest } => {
                let Some(f) = self.content.script(head) else {
                    return Err(EngineError::ScriptNotFound(head.to_string()));
                };
                // The head of a chain takes no arguments; the caller's
                // params belong to whatever the chain resolves to.
                let value = f(self, &Params::new())?;
                let Value::Accessor(accessor) = value else {
                    return Err(EngineError::NotAnAccessor(head.to_string()));
                };
                match accessor.resolve(self, rest)? {
                    Value::Script(script) => self.run(&script, params),
                    other => self.collapse(other),
                }
            }
        }
    }

    /// A terminal accessor stands for its default value.
    fn collapse(&mut self, value: Value) -> Result<Value, EngineError> {
        match value {
            Value::Accessor(accessor) => accessor.default(self),
            other => Ok(other),
        }
    }

    fn enter_depth(&mut self) -> Result<(), EngineError> {
        if self.depth >= RECURSION_LIMIT {
            return Err(EngineError::RecursionLimit(RECURSION_LIMIT));
        }
        self.depth += 1;
        Ok(())
    }

    fn exit_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
