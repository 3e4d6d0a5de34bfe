use anyhow::Result;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tsg_diagnostics::Diagnostics;

#[derive(Parser)]
#[command(name = "tsg")]
#[command(version)]
#[command(about = "tsg language compiler and JIT runner", long_about = None)]
struct Cli {
    /// Source file; reads standard input when omitted
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Stop after verification
    #[arg(long)]
    check: bool,

    /// Print the LLVM IR of the lowered module to stderr
    #[arg(long)]
    emit_llvm: bool,

    /// Print the parsed AST as JSON and exit
    #[arg(long)]
    emit_ast: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn read_source(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn print_diagnostics(diags: &Diagnostics) {
    for diag in diags {
        eprintln!("{diag}");
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let source = read_source(cli.input.as_ref())?;

    let (mut ast, diags) = tsg_parser::parse(&source);
    if !diags.is_empty() {
        print_diagnostics(&diags);
        return Ok(ExitCode::FAILURE);
    }

    if cli.emit_ast {
        println!("{}", serde_json::to_string_pretty(&ast)?);
        return Ok(ExitCode::SUCCESS);
    }

    let diags = tsg_compiler::resolve(&mut ast);
    if !diags.is_empty() {
        print_diagnostics(&diags);
        return Ok(ExitCode::FAILURE);
    }

    let (root_env, diags) = tsg_compiler::verify(&ast);
    if !diags.is_empty() {
        print_diagnostics(&diags);
        return Ok(ExitCode::FAILURE);
    }
    println!("syntax ok");

    if cli.check {
        return Ok(ExitCode::SUCCESS);
    }

    let root_env = root_env.ok_or_else(|| anyhow::anyhow!("verifier produced no environment"))?;
    log::info!("running jit-compiled program");
    let result = tsg_compiler::run_jit(&ast, &root_env, cli.emit_llvm)?;
    println!("result = {result}");

    Ok(ExitCode::SUCCESS)
}
