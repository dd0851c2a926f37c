// src/commands/seq/mod.rs
use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct SeqCommand;

#[async_trait]
impl Command for SeqCommand {
    fn name(&self) -> &'static str { "seq" }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let args = &ctx.args;
        let mut separator = "\n".to_string();
        let mut equalize_width = false;
        let mut nums: Vec<String> = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            if arg == "-s" && i + 1 < args.len() {
                separator = args[i + 1].clone();
                i += 2;
                continue;
            }
            if arg == "-w" {
                equalize_width = true;
                i += 1;
                continue;
            }
            if arg == "--" {
                i += 1;
                break;
            }
            if arg.starts_with('-') && arg != "-" {
                // Check for -sSTRING
                if arg.starts_with("-s") && arg.len() > 2 {
                    separator = arg[2..].to_string();
                    i += 1;
                    continue;
                }
                if arg == "-ws" || arg == "-sw" {
                    equalize_width = true;
                    if i + 1 < args.len() {
                        separator = args[i + 1].clone();
                        i += 2;
                        continue;
                    }
                }
                // Could be negative number
            }
            nums.push(arg.clone());
            i += 1;
        }
        // Collect remaining args
        while i < args.len() {
            nums.push(args[i].clone());
            i += 1;
        }

        if nums.is_empty() {
            return CommandResult::with_exit_code("".into(), "seq: missing operand\n".into(), 1);
        }

        let (first, increment, last) = if nums.len() == 1 {
            (1.0, 1.0, parse_num(&nums[0]))
        } else if nums.len() == 2 {
            (parse_num(&nums[0]), 1.0, parse_num(&nums[1]))
        } else {
            (parse_num(&nums[0]), parse_num(&nums[1]), parse_num(&nums[2]))
        };

        // Validate numbers
        if first.is_nan() || increment.is_nan() || last.is_nan() {
            let invalid = nums.iter().find(|n| parse_num(n).is_nan()).unwrap();
            return CommandResult::with_exit_code("".into(), format!("seq: invalid floating point argument: '{}'\n", invalid), 1);
        }

        if increment == 0.0 {
            return CommandResult::with_exit_code("".into(), "seq: invalid Zero increment value: '0'\n".into(), 1);
        }

        // Determine precision
        let precision = [first, increment, last].iter().map(|n| get_precision(*n)).max().unwrap_or(0);

        let mut results: Vec<String> = Vec::new();
        let max_iterations = 100000;
        let mut iterations = 0;

        if increment > 0.0 {
            let mut n = first;
            while n <= last + 1e-10 {
                if iterations > max_iterations { break; }
                iterations += 1;
                if precision > 0 { results.push(format!("{:.prec$}", n, prec = precision)); }
                else { results.push(format!("{}", n.round() as i64)); }
                n += increment;
            }
        } else {
            let mut n = first;
            while n >= last - 1e-10 {
                if iterations > max_iterations { break; }
                iterations += 1;
                if precision > 0 { results.push(format!("{:.prec$}", n, prec = precision)); }
                else { results.push(format!("{}", n.round() as i64)); }
                n += increment;
            }
        }

        // Equalize width
        if equalize_width && !results.is_empty() {
            let max_len = results.iter().map(|r| r.replace('-', "").len()).max().unwrap_or(0);
            for r in results.iter_mut() {
                let is_negative = r.starts_with('-');
                let num = if is_negative { &r[1..] } else { &r[..] };
                let padded = format!("{:0>width$}", num, width = max_len);
                *r = if is_negative { format!("-{}", padded) } else { padded };
            }
        }

        let output = results.join(&separator);
        if output.is_empty() {
            CommandResult::success("".into())
        } else {
            CommandResult::success(format!("{}\n", output))
        }
    }
}

fn parse_num(s: &str) -> f64 {
    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn get_precision(n: f64) -> usize {
    let s = format!("{}", n);
    match s.find('.') {
        Some(i) => s.len() - i - 1,
        None => 0,
    }
}
