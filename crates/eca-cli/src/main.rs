mod common;
mod logger;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::debug;

use eca_bytecode::OpcodeCatalog;
use eca_compiler::{Artifact, Compiler};
use eca_lexer::Lexer;
use eca_parser::Parser as EcaParser;

use common::{fail, render_compile_error, render_error, render_warning};

#[derive(Parser, Debug)]
#[command(name = "eca", version, about = "Assemble ECA source into EVM bytecode")]
struct Cli {
    /// Source file to assemble
    file: PathBuf,

    /// JSON object mapping opcode names to values; defaults to the built-in table
    #[arg(long = "opcodes")]
    opcodes: Option<PathBuf>,

    /// Write the bytecode here instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Emit raw bytes instead of 0x-prefixed hex
    #[arg(long = "raw", default_value_t = false)]
    raw: bool,

    /// Print the parsed program as JSON and exit
    #[arg(long = "dump-ast", default_value_t = false)]
    dump_ast: bool,

    /// Print the resolved allocation units instead of the bytecode
    #[arg(long = "dump-units", default_value_t = false)]
    dump_units: bool,

    /// Log compiler phases to stderr (-vv for every resolution pass)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn load_catalog(path: Option<&PathBuf>) -> OpcodeCatalog {
    let Some(path) = path else {
        return OpcodeCatalog::standard();
    };
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path.display(), e)));
    let catalog = OpcodeCatalog::from_json(&text)
        .unwrap_or_else(|e| fail(format!("Invalid opcode table {}: {}", path.display(), e)));
    debug!("loaded {} opcodes from {}", catalog.len(), path.display());
    catalog
}

fn dump_units(artifact: &Artifact) {
    println!("{:>8}  {:>5}  unit", "offset", "size");
    for (i, unit) in artifact.units.iter().enumerate() {
        println!("{:>8}  {:>5}  {}", format!("0x{:04x}", artifact.layout.offset(i)), artifact.layout.unit_size(i), unit);
    }
    println!("{:>8}  {:>5}  ({} passes)", format!("0x{:04x}", artifact.layout.total_len()), "", artifact.layout.passes);
}

fn write_output(cli: &Cli, artifact: &Artifact) {
    let bytes: Vec<u8> = if cli.raw {
        artifact.bytecode.to_vec()
    } else {
        format!("{}\n", artifact.bytecode).into_bytes()
    };
    let result = match &cli.output {
        Some(path) => fs::write(path, &bytes).map_err(|e| format!("Failed to write {}: {}", path.display(), e)),
        None => std::io::stdout()
            .write_all(&bytes)
            .map_err(|e| format!("Failed to write output: {}", e)),
    };
    if let Err(msg) = result {
        fail(msg);
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    if !cli.file.exists() {
        fail(format!("File not found: {}", cli.file.display()));
    }
    let src = fs::read_to_string(&cli.file)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", cli.file.display(), e)));
    let catalog = load_catalog(cli.opcodes.as_ref());

    let mut lexer = Lexer::new(&src);
    let tokens = match lexer.tokenize() {
        Ok(t) => t,
        Err(e) => {
            render_error("Lex error", &src, &e);
            std::process::exit(1);
        }
    };

    let mut parser = EcaParser::new(tokens);
    let program = match parser.parse_program() {
        Ok(p) => p,
        Err(e) => {
            render_error("Parse error", &src, &e);
            std::process::exit(1);
        }
    };

    if cli.dump_ast {
        match serde_json::to_string_pretty(&program) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(format!("Failed to serialize AST: {}", e)),
        }
        return;
    }

    let artifact = match Compiler::new(&catalog).compile(program) {
        Ok(a) => a,
        Err(e) => {
            render_compile_error(&e);
            std::process::exit(1);
        }
    };
    for warning in &artifact.warnings {
        render_warning(warning);
    }

    if cli.dump_units {
        dump_units(&artifact);
    } else {
        write_output(&cli, &artifact);
    }
}
