//! Cell - AWK-like scripting for spreadsheet workbooks

mod cli;
mod logger;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use cell_core::Document;
use cli::Cli;

/// Evaluation recurses on the native stack; unoptimized builds need
/// tens of kilobytes per nested call.
const INTERPRETER_STACK_SIZE: usize = 512 * 1024 * 1024;

/// Split the positional arguments into program text and input files.
fn program_and_files(cli: &Cli) -> Result<(String, Vec<PathBuf>)> {
    let mut args = cli.args.iter();
    let program = match &cli.program_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read program file {}", path.display()))?,
        None => match args.next() {
            Some(text) => text.clone(),
            None => bail!("no program given (pass PROGRAM or -f PATH)"),
        },
    };
    Ok((program, args.map(PathBuf::from).collect()))
}

/// The `gets()` stream: the named files back to back, or stdin.
fn open_input(files: &[PathBuf]) -> Result<Box<dyn BufRead>> {
    if files.is_empty() {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let mut input: Box<dyn Read> = Box::new(io::empty());
    for path in files {
        let file =
            File::open(path).with_context(|| format!("cannot open input {}", path.display()))?;
        input = Box::new(input.chain(file));
    }
    Ok(Box::new(BufReader::new(input)))
}

fn run(cli: &Cli) -> Result<i32> {
    let (program, files) = program_and_files(cli)?;
    let input = open_input(&files)?;

    let mut doc = Document::open(cli.from.as_deref())?;
    let outcome = doc.run_script(&program, &cli.settings(), input, io::stdout())?;

    if outcome.aborted {
        info!("aborted, workbook not written");
    } else if let Some(to) = &cli.to {
        doc.save_as(to)?;
    }
    Ok(outcome.exit_code)
}

/// Run the script on a thread whose stack fits `MAX_CALL_DEPTH` nested calls.
fn run_on_interpreter_stack(cli: Cli) -> Result<i32> {
    let worker = thread::Builder::new()
        .name("interpreter".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || run(&cli))
        .context("cannot start interpreter thread")?;
    match worker.join() {
        Ok(result) => result,
        Err(_) => bail!("interpreter thread panicked"),
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.version {
        println!("Cell {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    logger::init(cli.verbose);

    match run_on_interpreter_stack(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(1);
        }
    }
}
