use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use mandira::{Environment, Template};
use tracing_subscriber::EnvFilter;

mod cli;

const STDIN: &str = "-";

fn init_logging() {
    let filter = EnvFilter::try_from_env("MANDIRA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn load_context(path: &Path) -> Result<serde_json::Value, Error> {
    let contents = if path == Path::new(STDIN) {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("unable to read context from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("unable to read context file '{}'", path.display()))?
    };
    serde_json::from_str(&contents)
        .with_context(|| format!("unable to parse context file '{}'", path.display()))
}

fn load_template(path: &Path) -> Result<Template, Error> {
    Template::from_file(path)
        .with_context(|| format!("unable to load template '{}'", path.display()))
}

fn execute() -> Result<i32, Error> {
    let matches = cli::make_command().get_matches();

    // both positionals are required so clap has already rejected their absence
    let template_path = matches
        .get_one::<PathBuf>("template")
        .context("missing template argument")?;
    let context_path = matches
        .get_one::<PathBuf>("context")
        .context("missing context argument")?;

    let tmpl = load_template(template_path)?;
    let ctx = load_context(context_path)?;
    let layout = match matches.get_one::<PathBuf>("layout") {
        Some(path) => Some(load_template(path)?),
        None => None,
    };

    let env = Environment::new();
    let chain = [mandira::Value::from_serialize(&ctx)];
    let mut rendered = match layout {
        Some(ref layout) => env.render_in_layout(&tmpl, layout, &chain),
        None => env.render(&tmpl, &chain),
    };
    if !matches.get_flag("no-newline") {
        rendered.push('\n');
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(0)
}

pub fn print_error(err: &Error) {
    eprintln!("error: {err}");
    let mut source_opt = err.source();
    while let Some(source) = source_opt {
        eprintln!();
        eprintln!("caused by: {source}");
        source_opt = source.source();
    }
}

fn main() {
    init_logging();
    match execute() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            print_error(&err);
            std::process::exit(1);
        }
    }
}
