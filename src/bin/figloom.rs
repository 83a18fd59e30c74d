use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "figloom", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every figure, compose multi-panel figures and concatenate the pages.
    Build(BuildArgs),
    /// Check a figure document without rendering anything.
    Validate(DocArgs),
    /// Print the top-level figures as `id<TAB>type`.
    List(DocArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Figure document (JSON).
    json: PathBuf,

    /// Combined PDF path; relative paths are taken inside the page directory.
    #[arg(short, long, default_value = "figures.pdf")]
    output: PathBuf,

    /// Directory receiving the per-figure pages.
    #[arg(short = 'd', long, default_value = "fig")]
    out_dir: PathBuf,

    /// Verbosity: 0 quiet, 1 normal, 2+ debug. Also passed to renderers.
    #[arg(short, long, default_value_t = 1)]
    verbosity: u8,

    /// Skip figures whose renderer fails instead of aborting.
    #[arg(long, default_value_t = false)]
    best_effort: bool,

    /// Render only this top-level figure and skip concatenation.
    #[arg(long, value_name = "ID")]
    only: Option<String>,
}

#[derive(Parser, Debug)]
struct DocArgs {
    /// Figure document (JSON).
    json: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = match &cli.cmd {
        Command::Build(args) => args.verbosity,
        Command::Validate(_) | Command::List(_) => 0,
    };
    init_tracing(verbosity);

    let outcome = match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Validate(args) => cmd_validate(args),
        Command::List(args) => cmd_list(args),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            if let Some(id) = err
                .downcast_ref::<figloom::FigError>()
                .and_then(figloom::FigError::figure_id)
            {
                eprintln!("failed figure: {id}");
            }
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<ExitCode> {
    let opts = figloom::BuildOpts {
        out_dir: args.out_dir,
        output_name: args.output,
        verbosity: args.verbosity,
        best_effort: args.best_effort,
    };
    let mut session = figloom::FigureSession::open(&args.json, opts)?;
    let report = match &args.only {
        Some(id) => session.build_one(id)?,
        None => session.build()?,
    };

    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.ids().join(" <- "), skipped.error);
    }
    if !report.skipped.is_empty() {
        eprintln!("{} figure(s) skipped", report.skipped.len());
    }
    match &report.combined {
        Some(path) => println!("{}", path.display()),
        None => {
            for page in report.pages() {
                println!("{}", page.display());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(args: DocArgs) -> anyhow::Result<ExitCode> {
    let findings = figloom::validate(&args.json);
    if findings.is_empty() {
        println!("OK");
        return Ok(ExitCode::SUCCESS);
    }
    for finding in &findings {
        println!("{finding}");
    }
    Ok(ExitCode::from(2))
}

fn cmd_list(args: DocArgs) -> anyhow::Result<ExitCode> {
    let figures = figloom::load(&args.json)
        .with_context(|| format!("load '{}'", args.json.display()))?;
    for figure in &figures {
        println!("{}\t{}", figure.id, figure.type_name());
    }
    Ok(ExitCode::SUCCESS)
}
