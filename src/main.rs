// ABOUTME: Command-line driver: script execution, -c evaluation, and the REPL

use clap::Parser;
use lisp_cps::error::EvalError;
use lisp_cps::printer;
use lisp_cps::reader;
use lisp_cps::scanner::Scanner;
use lisp_cps::trampoline::Interpreter;
use lisp_cps::value::Value;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Trampolined continuation-passing Lisp interpreter
#[derive(Parser, Debug)]
#[command(name = "lisp")]
#[command(version)]
#[command(about = "A trampolined continuation-passing Lisp interpreter with callcc")]
struct CliArgs {
    /// Script file to execute (optional - without one, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Arguments for the script, bound to `args` as a list of strings
    #[arg(value_name = "SCRIPT_ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    script_args: Vec<String>,

    /// Evaluate CODE (one or more forms), printing each result
    #[arg(short = 'c', long = "code", value_name = "CODE")]
    code: Option<String>,

    /// Enter the interactive shell even after a file or -c code ran
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,

    /// Trace every continuation step, rendering ASTs at most DEPTH pairs deep
    #[arg(
        long = "log-conts",
        value_name = "DEPTH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "3"
    )]
    log_conts: Option<usize>,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // --log-conts raises the default filter so the step trace is visible
    let default_filter = if args.log_conts.is_some() { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let interp = match args.log_conts {
        Some(depth) => Interpreter::with_trace(depth),
        None => Interpreter::new(),
    };

    // Script arguments are visible to programs as a string list named `args`
    let script_args = Value::list(
        args.script_args
            .iter()
            .map(|arg| Value::Str(arg.clone()))
            .collect(),
    );
    interp.global_env().define("args".to_string(), script_args);

    let mut failed = false;

    if let Some(ref code) = args.code {
        failed |= !run_forms(&interp, code, true);
    }

    if let Some(ref path) = args.script {
        failed |= !run_script(&interp, path);
    }

    if args.interactive || (args.script.is_none() && args.code.is_none()) {
        if repl(&interp).is_err() {
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Evaluate every form of `src` in order. With `print_results`, each result
/// is printed on its own line. Returns false when a diagnostic was reported.
fn run_forms(interp: &Interpreter, src: &str, print_results: bool) -> bool {
    let mut scan = Scanner::new(src);
    loop {
        let form = match reader::read_progressing(&mut scan) {
            Ok(Some(form)) => form,
            Ok(None) => return true,
            Err(err) => {
                report_error(&err, None);
                return false;
            }
        };
        match interp.eval_form(form.clone()) {
            Ok(result) => {
                if print_results {
                    println!("{}", printer::print(&result));
                }
            }
            Err(err) => {
                report_error(&err, Some(&form));
                return false;
            }
        }
    }
}

fn run_script(interp: &Interpreter, path: &Path) -> bool {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", path.display(), err);
            return false;
        }
    };
    run_forms(interp, &contents, false)
}

/// One line beginning `error:`, then the offending form when known
fn report_error(err: &EvalError, form: Option<&Value>) {
    eprintln!("error: {}", err);
    if let Some(form) = form {
        eprintln!("  in: {}", printer::print(form));
    }
}

fn repl(interp: &Interpreter) -> rustyline::Result<()> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_file = ".lisp_history";
    let _ = rl.load_history(history_file);

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                // A diagnostic abandons the rest of the line; the REPL
                // itself stays alive for the next one
                let _ = run_forms(interp, &line, true);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Bye. Have a nice day :)");
                break;
            }
            Err(err) => {
                eprintln!("error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_code_flag() {
        let args = CliArgs::try_parse_from(["lisp", "-c", "(plus 1 2)"]).unwrap();
        assert_eq!(args.code.as_deref(), Some("(plus 1 2)"));
        assert!(args.script.is_none());
        assert!(!args.interactive);
    }

    #[test]
    fn test_cli_parses_script_with_trailing_args() {
        let args = CliArgs::try_parse_from(["lisp", "prog.lisp", "a", "-b", "c"]).unwrap();
        assert_eq!(args.script, Some(PathBuf::from("prog.lisp")));
        assert_eq!(args.script_args, vec!["a", "-b", "c"]);
    }

    #[test]
    fn test_cli_log_conts_depth_defaults() {
        let args = CliArgs::try_parse_from(["lisp", "--log-conts"]).unwrap();
        assert_eq!(args.log_conts, Some(3));

        let args = CliArgs::try_parse_from(["lisp", "--log-conts=7"]).unwrap();
        assert_eq!(args.log_conts, Some(7));

        let args = CliArgs::try_parse_from(["lisp"]).unwrap();
        assert_eq!(args.log_conts, None);
    }

    #[test]
    fn test_run_forms_reports_failure() {
        let interp = Interpreter::new();
        assert!(run_forms(&interp, "(plus 1 2)", false));
        assert!(!run_forms(&interp, "(plus 1 \"a\")", false));
        assert!(!run_forms(&interp, "(1 2", false));
    }

    #[test]
    fn test_script_args_binding() {
        let interp = Interpreter::new();
        interp.global_env().define(
            "args".to_string(),
            Value::list(vec![Value::Str("x".to_string())]),
        );
        assert_eq!(
            interp.eval_source("(first args)").unwrap(),
            Value::Str("x".to_string())
        );
    }
}
