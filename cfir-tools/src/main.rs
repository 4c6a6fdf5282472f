//! `cfir`: read an IR file (or stdin), run the canonical pipeline, write the result to stdout
//! (or a chosen file).
//!
//! Grounded in the teacher's CLI-binary split: a thin `main.rs` that installs `env_logger` and
//! delegates argument parsing to a `clap`-derived struct, mirroring `midenc`'s
//! `Midenc::run`/`register_flags` shape without the multi-crate session plumbing this system
//! has no use for.

mod pipeline;

use anyhow::Context;
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;

use pipeline::Stage;

/// Reads an IR file (or stdin), applies the canonical simplification/SSA pipeline, and writes
/// the transformed IR back out.
#[derive(Parser, Debug)]
#[command(name = "cfir", author, version, about)]
struct Cli {
    /// IR source file. Omit (or pass `-`) to read from stdin.
    input: Option<PathBuf>,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Raise log verbosity. Repeatable. Logging is otherwise driven by `RUST_LOG`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Stop the pipeline after this stage and emit its intermediate IR.
    #[arg(long, value_enum, default_value = "final")]
    emit_stage: Stage,

    /// Annotate the emitted IR with `# dominator:`/`# post-dominator:`/`# dominance frontier:`
    /// comments wherever the corresponding tree is valid at the stop point.
    #[arg(long)]
    print_dom: bool,
}

fn main() {
    // `Cli::parse()` exits 2 on a usage error; `--help`/`--version` still exit 0, but every
    // other parse failure exits 1 to match every other error path in this binary.
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        use clap::error::ErrorKind;
        if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
            e.exit();
        }
        eprint!("{e}");
        std::process::exit(1);
    });
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if verbose > 0 && std::env::var_os("RUST_LOG").is_none() {
        let level = match verbose {
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        builder.filter_level(level);
    }
    builder.init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let (file_name, source) = read_input(cli.input.as_deref())?;

    let mut program = match cfir_reader::parse(&source) {
        Ok(p) => p,
        Err(e) => {
            let ctx = cfir_reader::FileSrcContext::new(&file_name, &source);
            anyhow::bail!("{}", ctx.render(&e));
        }
    };

    pipeline::run(&mut program, cli.emit_stage)?;

    let opts = if cli.print_dom {
        cfir_reader::WriteOptions::verbose()
    } else {
        cfir_reader::WriteOptions::bare()
    };
    let text = cfir_reader::write_program(&program, opts);
    write_output(cli.output.as_deref(), &text)
}

fn read_input(path: Option<&std::path::Path>) -> anyhow::Result<(String, String)> {
    match path {
        None => read_stdin(),
        Some(p) if p == std::path::Path::new("-") => read_stdin(),
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            Ok((p.display().to_string(), text))
        }
    }
}

fn read_stdin() -> anyhow::Result<(String, String)> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading from stdin")?;
    Ok(("<stdin>".to_string(), buf))
}

fn write_output(path: Option<&std::path::Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
        }
        None => std::io::stdout()
            .write_all(text.as_bytes())
            .context("writing to stdout"),
    }
}
