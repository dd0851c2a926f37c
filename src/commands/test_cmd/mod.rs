// src/commands/test_cmd/mod.rs
use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct TestCommand;

#[async_trait]
impl Command for TestCommand {
    fn name(&self) -> &'static str {
        "test"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let args = &ctx.args;

        // empty argument list returns 1
        if args.is_empty() {
            return CommandResult::with_exit_code(String::new(), String::new(), 1);
        }

        // handle [ ] syntax
        let args: Vec<&str> = if !args.is_empty() && args[0] == "[" {
            if args.last().map(|s| s.as_str()) != Some("]") {
                return CommandResult::error("test: missing ']'\n".to_string());
            }
            args[1..args.len()-1].iter().map(|s| s.as_str()).collect()
        } else {
            args.iter().map(|s| s.as_str()).collect()
        };

        if args.is_empty() {
            return CommandResult::with_exit_code(String::new(), String::new(), 1);
        }

        let result = evaluate_expression(&args, &ctx).await;
        let exit_code = if result { 0 } else { 1 };
        CommandResult::with_exit_code(String::new(), String::new(), exit_code)
    }
}

async fn evaluate_expression(args: &[&str], ctx: &CommandContext) -> bool {
    // single argument: nonempty string is true
    if args.len() == 1 {
        return !args[0].is_empty();
    }

    // handle ! negation
    if args[0] == "!" {
        return !Box::pin(evaluate_expression(&args[1..], ctx)).await;
    }

    // binary operator
    if args.len() >= 3 {
        // find operator
        for i in 1..args.len() {
            let op = args[i];
            match op {
                // logical operator
                "-a" => {
                    let left = Box::pin(evaluate_expression(&args[..i], ctx)).await;
                    let right = Box::pin(evaluate_expression(&args[i+1..], ctx)).await;
                    return left && right;
                }
                "-o" => {
                    let left = Box::pin(evaluate_expression(&args[..i], ctx)).await;
                    let right = Box::pin(evaluate_expression(&args[i+1..], ctx)).await;
                    return left || right;
                }
                _ => {}
            }
        }
    }

    // binary expression
    if args.len() == 3 {
        let left = args[0];
        let op = args[1];
        let right = args[2];

        match op {
            // string comparison
            "=" | "==" => return left == right,
            "!=" => return left != right,

            // numeric comparison
            "-eq" => {
                let l: i64 = left.parse().unwrap_or(0);
                let r: i64 = right.parse().unwrap_or(0);
                return l == r;
            }
            "-ne" => {
                let l: i64 = left.parse().unwrap_or(0);
                let r: i64 = right.parse().unwrap_or(0);
                return l != r;
            }
            "-lt" => {
                let l: i64 = left.parse().unwrap_or(0);
                let r: i64 = right.parse().unwrap_or(0);
                return l < r;
            }
            "-le" => {
                let l: i64 = left.parse().unwrap_or(0);
                let r: i64 = right.parse().unwrap_or(0);
                return l <= r;
            }
            "-gt" => {
                let l: i64 = left.parse().unwrap_or(0);
                let r: i64 = right.parse().unwrap_or(0);
                return l > r;
            }
            "-ge" => {
                let l: i64 = left.parse().unwrap_or(0);
                let r: i64 = right.parse().unwrap_or(0);
                return l >= r;
            }
            _ => {}
        }
    }

    // unary expression
    if args.len() == 2 {
        let op = args[0];
        let operand = args[1];

        match op {
            // string test
            "-z" => return operand.is_empty(),
            "-n" => return !operand.is_empty(),

            // file test
            "-e" => {
                let path = ctx.fs.resolve_path(&ctx.cwd, operand);
                return ctx.fs.exists(&path).await;
            }
            "-f" => {
                let path = ctx.fs.resolve_path(&ctx.cwd, operand);
                if let Ok(stat) = ctx.fs.stat(&path).await {
                    return stat.is_file;
                }
                return false;
            }
            "-d" => {
                let path = ctx.fs.resolve_path(&ctx.cwd, operand);
                if let Ok(stat) = ctx.fs.stat(&path).await {
                    return stat.is_directory;
                }
                return false;
            }
            "-s" => {
                let path = ctx.fs.resolve_path(&ctx.cwd, operand);
                if let Ok(stat) = ctx.fs.stat(&path).await {
                    return stat.size > 0;
                }
                return false;
            }
            "-r" | "-w" | "-x" => {
                // simplified: only checks whether the file exists
                let path = ctx.fs.resolve_path(&ctx.cwd, operand);
                return ctx.fs.exists(&path).await;
            }
            "-L" | "-h" => {
                let path = ctx.fs.resolve_path(&ctx.cwd, operand);
                if let Ok(stat) = ctx.fs.lstat(&path).await {
                    return stat.is_symlink;
                }
                return false;
            }
            _ => {}
        }
    }

    false
}

// also provide the [ command
pub struct BracketCommand;

#[async_trait]
impl Command for BracketCommand {
    fn name(&self) -> &'static str {
        "["
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        // check the last argument is ]
        if ctx.args.last().map(|s| s.as_str()) != Some("]") {
            return CommandResult::error("[: missing ']'\n".to_string());
        }

        // strip ] then call the test logic
        let args: Vec<&str> = ctx.args[..ctx.args.len()-1].iter().map(|s| s.as_str()).collect();

        if args.is_empty() {
            return CommandResult::with_exit_code(String::new(), String::new(), 1);
        }

        let result = evaluate_expression(&args, &ctx).await;
        let exit_code = if result { 0 } else { 1 };
        CommandResult::with_exit_code(String::new(), String::new(), exit_code)
    }
}
