use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use scrawl::host::{Host, Snapshot};
use scrawl::object::Object;

#[derive(Parser, Debug)]
#[clap(name = "scrawl", version, about = "Runs scrawl scripts")]
struct Cli {
    /// Script to run
    #[clap(required_unless_present = "eval")]
    script: Option<PathBuf>,

    /// Arguments for the script, returned by args()
    args: Vec<String>,

    /// Evaluate CODE and print its value instead of running a script
    #[clap(short, long, value_name = "CODE")]
    eval: Option<String>,

    /// Extra directories searched by import()
    #[clap(short = 'I', long = "include", value_name = "DIR", env = "SCRAWL_PATH", value_delimiter = ':')]
    include: Vec<PathBuf>,

    /// Folder where snapshots are written
    #[clap(short, long, value_name = "DIR", default_value = ".")]
    directory: PathBuf,

    /// Snapshot file name prefix, defaults to the script name
    #[clap(short, long, value_name = "NAME")]
    prefix: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("{} {}", "error:".red().bold(), err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut search_paths = cli.include;
    let script_dir = cli.script.as_ref().and_then(|script| script.parent()).map(PathBuf::from);
    search_paths.extend(script_dir);

    let prefix = cli.prefix.or_else(|| {
        cli.script
            .as_ref()
            .and_then(|script| script.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
    });

    let host = Host::new()
        .with_args(cli.args)
        .with_search_paths(search_paths)
        .with_snapshot(Snapshot::new(cli.directory, prefix));
    let host = Rc::new(host);

    if let Some(code) = cli.eval {
        match scrawl::run(&code, host)? {
            Some(Object::Null) | None => {}
            Some(value) => println!("{}", value),
        }
        return Ok(());
    }

    if let Some(script) = cli.script {
        tracing::debug!(script = %script.display(), "running script");
        scrawl::run_file(&script, host)?;
    }

    Ok(())
}
