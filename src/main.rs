use std::{fs::read_to_string, path::PathBuf, process::ExitCode, rc::Rc, time::Instant};

use clap::Parser;
use lufa::{
    check_source, display_diagnostic, display_error, lexer::lexer::tokenize_with_config,
    parser::parser::parse, Config,
};

/// Checks a lufa source file and reports syntax and type errors.
#[derive(Parser, Debug)]
#[command(name = "lufa", author, version, long_about = None)]
struct Args {
    /// Path to the source file
    file: PathBuf,

    /// Columns a tab counts for in indentation
    #[arg(long, default_value_t = 4)]
    tab_width: usize,

    /// Fail on warnings as well as errors
    #[arg(long)]
    deny_warnings: bool,

    /// Print the token stream and stop
    #[arg(long)]
    dump_tokens: bool,

    /// Print the syntax tree and stop
    #[arg(long)]
    dump_ast: bool,

    /// Increase log verbosity, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let source = match read_to_string(&args.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: failed to read {}: {}", args.file.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.to_string_lossy().into_owned());

    let config = Config {
        tab_width: args.tab_width,
        deny_warnings: args.deny_warnings,
    };

    if args.dump_tokens || args.dump_ast {
        return dump(&args, source, file_name, &config);
    }

    let start = Instant::now();
    let report = match check_source(source.clone(), Some(file_name), &config) {
        Ok(report) => report,
        Err(error) => {
            display_error(&error, &source);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(elapsed = ?start.elapsed(), "checked {}", args.file.display());

    for diagnostic in &report.diagnostics {
        display_diagnostic(diagnostic, &source);
    }

    let (errors, warnings) = (report.errors().count(), report.warnings().count());
    if errors > 0 || warnings > 0 {
        eprintln!("{} error(s), {} warning(s)", errors, warnings);
    }

    if report.is_failure(&config) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn dump(args: &Args, source: String, file_name: String, config: &Config) -> ExitCode {
    let tokens = match tokenize_with_config(source.clone(), Some(file_name.clone()), config) {
        Ok(tokens) => tokens,
        Err(error) => {
            display_error(&error, &source);
            return ExitCode::FAILURE;
        }
    };

    if args.dump_tokens {
        for token in &tokens {
            println!("{:?}", token);
        }
        return ExitCode::SUCCESS;
    }

    match parse(tokens, Rc::new(file_name)) {
        Ok(program) => {
            println!("{:#?}", program);
            ExitCode::SUCCESS
        }
        Err(error) => {
            display_error(&error, &source);
            ExitCode::FAILURE
        }
    }
}
