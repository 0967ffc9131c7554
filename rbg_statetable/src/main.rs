//! CLI entry point for rbg_statetable.
//! Usage: cargo run -p rbg_statetable -- compile StateTable.toml --out rbg_statetable.h

use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use rbg_data::validate_table;
use rbg_statetable::{
    Compilation, CompileError, Config, DelimitedSheet, Diagnostic, InitStyle, TomlWorkbook, compile, emit_header,
    emit_ron,
};

#[derive(Parser)]
#[command(author, version, about = "Compile an RBG state table spreadsheet into a firmware header.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a sheet and write the state table.
    Compile(CompileArgs),
    /// Compile and validate a sheet without writing anything.
    Check(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Workbook (`.toml`) or tab-delimited sheet export.
    input: PathBuf,
    /// Sheet holding the state table.
    #[arg(long)]
    sheet: Option<String>,
    /// Optional `rbg.toml` settings file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct CompileArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Output file; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::C)]
    format: Format,
    /// Initializer syntax for the C table.
    #[arg(long, value_enum)]
    init: Option<InitStyle>,
    /// Fail without writing output if any error is reported.
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    C,
    Ron,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let failed = match cli.command {
        Commands::Compile(args) => run_compile(&args)?,
        Commands::Check(args) => run_check(&args)?,
    };
    if failed {
        process::exit(1);
    }
    Ok(())
}

/// Compile and write output. Returns true if the run should exit non-zero.
fn run_compile(args: &CompileArgs) -> Result<bool> {
    let mut config = load_config(&args.input)?;
    if let Some(init) = args.init {
        config.init_style = init;
    }
    config.strict |= args.strict;

    let compilation = match compile_input(&args.input.input, &config)? {
        Ok(compilation) => compilation,
        Err(errors) => {
            print_diagnostics(&errors);
            eprintln!("error: {} error(s); no output written", errors.len());
            return Ok(true);
        },
    };
    print_diagnostics(&compilation.diagnostics);

    let text = match args.format {
        Format::C => emit_header(&compilation.table, &config.emit_options()),
        Format::Ron => emit_ron(&compilation.table).context("serializing table to RON")?,
    };
    match &args.out {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {} rows to {}", compilation.table.rows.len(), path.display());
        },
        None => print!("{text}"),
    }
    Ok(compilation.has_errors())
}

/// Compile, validate, and report. Returns true if anything is wrong.
fn run_check(args: &InputArgs) -> Result<bool> {
    let config = load_config(args)?;
    let compilation = match compile_input(&args.input, &config)? {
        Ok(compilation) => compilation,
        Err(errors) => {
            print_diagnostics(&errors);
            return Ok(true);
        },
    };
    print_diagnostics(&compilation.diagnostics);

    let problems = validate_table(&compilation.table);
    for problem in &problems {
        eprintln!("error: {problem}");
    }
    let failed = compilation.has_errors() || !problems.is_empty();
    if !failed {
        println!(
            "{}: {} rows, {} blocks, {} jump targets",
            args.input.display(),
            compilation.table.rows.len(),
            compilation.table.symbols.len(),
            compilation.table.targets.len()
        );
    }
    Ok(failed)
}

fn load_config(args: &InputArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(sheet) = &args.sheet {
        config.sheet.clone_from(sheet);
    }
    Ok(config)
}

/// Run the compiler. A strict-mode rejection comes back as the inner `Err`
/// so callers can report it without treating it as an I/O failure.
fn compile_input(path: &Path, config: &Config) -> Result<Result<Compilation, Vec<Diagnostic>>> {
    let options = config.compile_options();
    let is_workbook = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let result = if is_workbook {
        let workbook = TomlWorkbook::load(path).with_context(|| format!("loading workbook {}", path.display()))?;
        compile(&workbook, &options)
    } else {
        let sheet = DelimitedSheet::load(path).with_context(|| format!("loading sheet {}", path.display()))?;
        compile(&sheet, &options)
    };
    match result {
        Ok(compilation) => Ok(Ok(compilation)),
        Err(CompileError::Rejected { errors }) => Ok(Err(errors)),
        Err(other) => Err(other).with_context(|| format!("compiling {}", path.display())),
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}: {diagnostic}", diagnostic.severity());
    }
}
