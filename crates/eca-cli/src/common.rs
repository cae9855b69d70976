use owo_colors::OwoColorize;

use eca_compiler::{CompileError, Warning};
use eca_syntax::error::Error;

/// Prints a syntax error with the offending source line and a caret.
pub fn render_error(kind: &str, source: &str, err: &Error) {
    eprintln!("{}: {}", kind.red().bold(), err.msg.red());
    if let (Some(line), Some(col)) = (err.line, err.col) {
        eprintln!("  --> line {}, column {}", line, col);
        if let Some(src_line) = source.lines().nth(line.saturating_sub(1)) {
            let line_num_str = format!("{:3} | ", line);
            eprintln!("     |");
            eprintln!("{}{}", line_num_str.bright_black(), src_line);

            let mut marker = " ".repeat(line_num_str.len());
            if col > 1 {
                marker.push_str(&" ".repeat(col - 1));
            }
            marker.push('^');
            eprintln!("{}{}", marker.red(), " error here".red());
            eprintln!("     |");
        }
    }
    provide_error_suggestions(&err.msg);
}

pub fn render_compile_error(err: &CompileError) {
    eprintln!("{}: {}", "Compile error".red().bold(), err.to_string().red());
    match err {
        CompileError::UndefinedVariable(_) => {
            eprintln!("{}", "Help: define it with '#name' in top-level code before pushing '@name'.".yellow());
        }
        CompileError::UndefinedFunction(_) => {
            eprintln!("{}", "Help: functions are declared as 'name(in, out):' with an indented body.".yellow());
        }
        CompileError::IllegalVariableUse(_) => {
            eprintln!("{}", "Help: variables are only visible to top-level code; pass values on the stack instead.".yellow());
        }
        CompileError::LiteralSizeMismatch { expected, .. } => {
            eprintln!(
                "{}",
                format!("Help: write exactly {} bytes, e.g. 0x{}.", expected, "00".repeat(*expected)).yellow()
            );
        }
        CompileError::UnknownOpcode(name) => {
            eprintln!("{}", format!("Help: add '{}' to the --opcodes table.", name).yellow());
        }
        CompileError::NonConvergent { .. } => {
            eprintln!("{}", "Help: this is likely an assembler bug; please report the input.".yellow());
        }
        _ => {}
    }
}

pub fn render_warning(warning: &Warning) {
    eprintln!("{}: {}", "warning".yellow().bold(), warning.to_string().yellow());
}

pub fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", "error".red().bold(), msg.to_string().red());
    std::process::exit(1);
}

fn provide_error_suggestions(err_msg: &str) {
    if err_msg.contains("Invalid push size") {
        eprintln!("{}", "Help: push opcodes run from PUSH1 to PUSH32.".yellow());
    } else if err_msg.contains("odd number of hex digits") {
        eprintln!("{}", "Help: each byte takes two hex digits; pad with a leading 0.".yellow());
    } else if err_msg.contains("empty body") {
        eprintln!("{}", "Help: indent each body line by two spaces under the header.".yellow());
    }
}
