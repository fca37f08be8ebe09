use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use preflight_runner::{
    exit_code, render_json, render_rules, render_text, RuleSource, Runner, CONFIG_ERROR_EXIT_CODE,
};

#[derive(Parser)]
#[command(name = "preflight", version)]
struct Cli {
    /// Repo root holding .preflight/preflight.toml (defaults to the current dir)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(clap::Args)]
struct RuleArgs {
    /// Built-in rule profile (deploy, secrets)
    #[arg(long, conflicts_with = "rules")]
    profile: Option<String>,

    /// Declarative rule file (yaml or toml)
    #[arg(long)]
    rules: Option<PathBuf>,
}

impl RuleArgs {
    fn source(&self) -> RuleSource {
        match (&self.profile, &self.rules) {
            (_, Some(path)) => RuleSource::File(path.clone()),
            (Some(p), None) => RuleSource::Profile(p.clone()),
            (None, None) => RuleSource::Configured,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Write .preflight/preflight.toml and a starter rule file
    Init,

    /// Validate the deployment environment; exits 1 when blocked
    Check {
        #[command(flatten)]
        rules: RuleArgs,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Also list passing checks
        #[arg(long, short)]
        verbose: bool,
    },

    /// Show the effective rule set
    Rules {
        #[command(flatten)]
        rules: RuleArgs,
    },
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let repo_root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.cmd {
        Command::Init => {
            Runner::init_repo(&repo_root)?;
            println!("Initialized preflight in {}", repo_root.display());
            Ok(0)
        }
        Command::Check { rules, format, verbose } => {
            let r = Runner::open(repo_root)?;
            let run = r.check(&rules.source())?;
            match format {
                Format::Text => print!("{}", render_text(&run, verbose)),
                Format::Json => println!("{}", render_json(&run)?),
            }
            Ok(exit_code(run.report.status()))
        }
        Command::Rules { rules } => {
            let r = Runner::open(repo_root)?;
            let set = r.rule_set(&rules.source())?;
            let fp = preflight_rules::fingerprint(&set)?;
            print!("{}", render_rules(&set, &fp));
            Ok(0)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            CONFIG_ERROR_EXIT_CODE
        }
    };
    ExitCode::from(code as u8)
}
