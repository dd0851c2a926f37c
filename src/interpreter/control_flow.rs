//! Control Flow Execution
//!
//! Handles control flow constructs:
//! - if/elif/else
//! - for loops
//! - C-style for loops
//! - while loops
//! - until loops
//! - case statements
//! - break/continue

use regex_lite::Regex;

use crate::ast::types::StatementNode;
use crate::interpreter::errors::{ExecutionLimitError, InterpreterError, LimitType};
use crate::interpreter::helpers::condition::ConditionResult;
use crate::interpreter::types::{ExecResult, InterpreterState};

/// Validate that a variable name is a valid identifier.
/// Returns true if valid, false otherwise.
pub fn is_valid_identifier(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
    re.is_match(name)
}

/// Result of executing an if/for/while/until construct.
#[derive(Debug, Clone, Default)]
pub struct ForResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Prepend already-accumulated output onto a propagating error before rethrowing it,
/// mirroring the pattern used at the script/statement level.
fn prepend_to_error(mut err: InterpreterError, stdout: &str, stderr: &str) -> InterpreterError {
    use crate::interpreter::errors::ControlFlowError;
    match &mut err {
        InterpreterError::Break(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Continue(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Return(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Errexit(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Nounset(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Exit(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Arithmetic(e) => e.prepend_output(stdout, stderr),
        InterpreterError::BadSubstitution(e) => e.prepend_output(stdout, stderr),
        InterpreterError::Glob(e) => e.prepend_output(stdout, stderr),
        InterpreterError::BraceExpansion(e) => e.prepend_output(stdout, stderr),
        InterpreterError::ExecutionLimit(e) => e.prepend_output(stdout, stderr),
        InterpreterError::SubshellExit(e) => e.prepend_output(stdout, stderr),
        InterpreterError::PosixFatal(e) => e.prepend_output(stdout, stderr),
    }
    err
}

/// Execute an if/elif/else chain. `clauses` holds (condition, body) pairs in source order;
/// the first clause whose condition exits 0 has its body executed and the rest are skipped.
pub fn execute_if<CondFn, BodyFn>(
    state: &mut InterpreterState,
    clauses: &[(Vec<&StatementNode>, Vec<&StatementNode>)],
    else_body: Option<&[&StatementNode]>,
    mut cond_fn: CondFn,
    mut body_fn: BodyFn,
) -> Result<ForResult, InterpreterError>
where
    CondFn: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    BodyFn: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;

    for (condition, body) in clauses {
        let prev_in_condition = state.in_condition;
        state.in_condition = true;
        let mut cond_exit = 0;
        let mut cond_error = None;
        for stmt in condition.iter() {
            match cond_fn(state, *stmt) {
                Ok(res) => {
                    stdout.push_str(&res.stdout);
                    stderr.push_str(&res.stderr);
                    cond_exit = res.exit_code;
                }
                Err(e) => {
                    cond_error = Some(e);
                    break;
                }
            }
        }
        state.in_condition = prev_in_condition;
        if let Some(e) = cond_error {
            return Err(prepend_to_error(e, &stdout, &stderr));
        }

        if cond_exit == 0 {
            for stmt in body.iter() {
                match body_fn(state, *stmt) {
                    Ok(res) => {
                        stdout.push_str(&res.stdout);
                        stderr.push_str(&res.stderr);
                        exit_code = res.exit_code;
                    }
                    Err(e) => return Err(prepend_to_error(e, &stdout, &stderr)),
                }
            }
            return Ok(ForResult { stdout, stderr, exit_code });
        }
    }

    if let Some(else_stmts) = else_body {
        for stmt in else_stmts.iter() {
            match body_fn(state, *stmt) {
                Ok(res) => {
                    stdout.push_str(&res.stdout);
                    stderr.push_str(&res.stderr);
                    exit_code = res.exit_code;
                }
                Err(e) => return Err(prepend_to_error(e, &stdout, &stderr)),
            }
        }
    }

    Ok(ForResult { stdout, stderr, exit_code })
}

/// Execute a `for name in words; do body; done` loop.
pub fn execute_for<BodyFn>(
    state: &mut InterpreterState,
    variable: &str,
    words: &[String],
    body: &[&StatementNode],
    max_iterations: u64,
    mut body_fn: BodyFn,
) -> Result<ForResult, InterpreterError>
where
    BodyFn: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;
    let mut iterations: u64 = 0;

    let prev_loop_depth = state.loop_depth;
    state.loop_depth += 1;

    for word in words {
        iterations += 1;
        if iterations > max_iterations {
            state.loop_depth = prev_loop_depth;
            return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::new(
                format!("for: maximum iteration count of {} exceeded", max_iterations),
                LimitType::Iterations,
                stdout,
                stderr,
            )));
        }

        state.env.insert(variable.to_string(), word.clone());

        let mut broke = false;
        for stmt in body.iter() {
            match body_fn(state, *stmt) {
                Ok(res) => {
                    stdout.push_str(&res.stdout);
                    stderr.push_str(&res.stderr);
                    exit_code = res.exit_code;
                }
                Err(InterpreterError::Break(mut e)) => {
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    if e.levels > 1 {
                        e.levels -= 1;
                        e.stdout = std::mem::take(&mut stdout);
                        e.stderr = std::mem::take(&mut stderr);
                        state.loop_depth = prev_loop_depth;
                        return Err(InterpreterError::Break(e));
                    }
                    broke = true;
                    break;
                }
                Err(InterpreterError::Continue(mut e)) => {
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    if e.levels > 1 {
                        e.levels -= 1;
                        e.stdout = std::mem::take(&mut stdout);
                        e.stderr = std::mem::take(&mut stderr);
                        state.loop_depth = prev_loop_depth;
                        return Err(InterpreterError::Continue(e));
                    }
                    break;
                }
                Err(e) => {
                    state.loop_depth = prev_loop_depth;
                    return Err(prepend_to_error(e, &stdout, &stderr));
                }
            }
        }
        if broke {
            break;
        }
    }

    state.loop_depth = prev_loop_depth;
    Ok(ForResult { stdout, stderr, exit_code })
}

/// Shared driver for `while`/`until`, which differ only in how the condition's
/// exit status is interpreted.
fn execute_pretest_loop(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    continue_while_zero: bool,
    cond_fn: &mut dyn FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    body_fn: &mut dyn FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
) -> Result<ForResult, InterpreterError> {
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;
    let mut iterations: u64 = 0;

    let prev_loop_depth = state.loop_depth;
    state.loop_depth += 1;

    loop {
        let prev_in_condition = state.in_condition;
        state.in_condition = true;
        let mut cond_exit = 0;
        let mut cond_error = None;
        for stmt in condition.iter() {
            match cond_fn(state, *stmt) {
                Ok(res) => {
                    stdout.push_str(&res.stdout);
                    stderr.push_str(&res.stderr);
                    cond_exit = res.exit_code;
                }
                Err(e) => {
                    cond_error = Some(e);
                    break;
                }
            }
        }
        state.in_condition = prev_in_condition;
        if let Some(e) = cond_error {
            state.loop_depth = prev_loop_depth;
            return Err(prepend_to_error(e, &stdout, &stderr));
        }

        let keep_going = (cond_exit == 0) == continue_while_zero;
        if !keep_going {
            break;
        }

        iterations += 1;
        if iterations > max_iterations {
            state.loop_depth = prev_loop_depth;
            return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::new(
                format!("loop: maximum iteration count of {} exceeded", max_iterations),
                LimitType::Iterations,
                stdout,
                stderr,
            )));
        }

        let mut broke = false;
        for stmt in body.iter() {
            match body_fn(state, *stmt) {
                Ok(res) => {
                    stdout.push_str(&res.stdout);
                    stderr.push_str(&res.stderr);
                    exit_code = res.exit_code;
                }
                Err(InterpreterError::Break(mut e)) => {
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    if e.levels > 1 {
                        e.levels -= 1;
                        e.stdout = std::mem::take(&mut stdout);
                        e.stderr = std::mem::take(&mut stderr);
                        state.loop_depth = prev_loop_depth;
                        return Err(InterpreterError::Break(e));
                    }
                    broke = true;
                    break;
                }
                Err(InterpreterError::Continue(mut e)) => {
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    if e.levels > 1 {
                        e.levels -= 1;
                        e.stdout = std::mem::take(&mut stdout);
                        e.stderr = std::mem::take(&mut stderr);
                        state.loop_depth = prev_loop_depth;
                        return Err(InterpreterError::Continue(e));
                    }
                    break;
                }
                Err(e) => {
                    state.loop_depth = prev_loop_depth;
                    return Err(prepend_to_error(e, &stdout, &stderr));
                }
            }
        }
        if broke {
            break;
        }
    }

    state.loop_depth = prev_loop_depth;
    Ok(ForResult { stdout, stderr, exit_code })
}

/// Execute a `while condition; do body; done` loop: runs while the condition exits 0.
pub fn execute_while<CondFn, BodyFn>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    mut cond_fn: CondFn,
    mut body_fn: BodyFn,
) -> Result<ForResult, InterpreterError>
where
    CondFn: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    BodyFn: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    execute_pretest_loop(state, condition, body, max_iterations, true, &mut cond_fn, &mut body_fn)
}

/// Execute an `until condition; do body; done` loop: runs while the condition exits non-zero.
pub fn execute_until<CondFn, BodyFn>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    mut cond_fn: CondFn,
    mut body_fn: BodyFn,
) -> Result<ForResult, InterpreterError>
where
    CondFn: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    BodyFn: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    execute_pretest_loop(state, condition, body, max_iterations, false, &mut cond_fn, &mut body_fn)
}

/// Case statement terminator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTerminator {
    /// ;; - stop, no fall-through
    Break,
    /// ;& - unconditional fall-through (execute next body without pattern check)
    FallThrough,
    /// ;;& - continue pattern matching (check next case patterns)
    ContinueMatching,
}

impl CaseTerminator {
    /// Parse a terminator string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            ";;" => Some(CaseTerminator::Break),
            ";&" => Some(CaseTerminator::FallThrough),
            ";;&" => Some(CaseTerminator::ContinueMatching),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseTerminator::Break => ";;",
            CaseTerminator::FallThrough => ";&",
            CaseTerminator::ContinueMatching => ";;&",
        }
    }
}
