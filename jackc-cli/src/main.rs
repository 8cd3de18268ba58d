//! Entrypoint for CLI
use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use clap::{error::ErrorKind as ClapErrorKind, Parser, Subcommand};
use jackc::{
    lex::{tokens_to_xml, Lexer},
    prelude::*,
};
use log::{error, info, LevelFilter};

mod config;
mod driver;
mod error;

use self::error::AppResult;

/// FreeBSD EX_USAGE
const EXIT_USAGE: i32 = 64;
const EXIT_FAILURE: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "jackc", version, about = "Compile Jack classes into Hack VM code")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML file with compiler settings
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Limit on block and expression nesting, overrides the configuration file
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compile a .jack file, or every .jack file in a directory
    Compile { path: PathBuf },
    /// Print the tokens of a source file
    Tokens {
        file: PathBuf,
        /// Print the analyzer XML instead of a table
        #[arg(long)]
        xml: bool,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                process::exit(EXIT_USAGE)
            }
        },
    };

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(err) = simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()
    {
        eprintln!("failed to initialize logger: {err}");
    }

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_FAILURE),
        Err(err) => {
            error!("{err}");
            process::exit(EXIT_FAILURE)
        }
    }
}

/// Returns `false` when any unit failed.
fn run(cli: Cli) -> AppResult<bool> {
    let mut conf = match &cli.config {
        Some(filepath) => config::load_conf(filepath)?,
        None => CompileConf::default(),
    };
    if let Some(max_depth) = cli.max_depth {
        conf.max_depth = max_depth;
    }

    match cli.command {
        Cmd::Compile { path } => {
            let reports = driver::compile_path(&path, &conf)?;
            let failed = reports.iter().filter(|report| report.result.is_err()).count();
            info!("compiled {} of {} units", reports.len() - failed, reports.len());
            Ok(failed == 0)
        }
        Cmd::Tokens { file, xml } => {
            print_tokens(&file, xml)?;
            Ok(true)
        }
    }
}

fn print_tokens(filepath: &Path, xml: bool) -> AppResult<()> {
    let file_bytes = fs::read(filepath)?;
    let source_code = String::from_utf8(file_bytes).map_err(JackError::from)?;
    let tokens = Lexer::new(source_code.as_str()).tokenize();

    if xml {
        print!("{}", tokens_to_xml(&tokens));
        return Ok(());
    }

    println!("line:col | token                | fragment ");
    for token in &tokens {
        let position = format!("{}:{}", token.line, token.start_column);
        let kind = format!("{:?}", token.kind); // cannot format debug print {:?} into columns
        let fragment = token.span.fragment(&source_code);
        println!("{position: <8} | {kind: <20} | {fragment}");
    }

    Ok(())
}
