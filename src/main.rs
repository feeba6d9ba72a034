use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use yamanifest::manifest::wildcard;
use yamanifest::{AddOptions, CheckOptions, Condition, HashKind, HashVals, Manifest, ManifestConfig};

#[derive(Parser)]
#[command(name = "yamf")]
#[command(version)]
#[command(about = "Record and verify file fingerprints in a YAML manifest", long_about = None)]
struct Cli {
    /// Log debug diagnostics to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ManifestArgs {
    /// Manifest file name
    #[arg(short = 'n', long = "name", default_value = "manifest.yaml")]
    name: PathBuf,

    /// Hash kinds to use (repeatable); defaults to binhash and md5
    #[arg(short = 's', long = "hashfn")]
    hashfn: Vec<String>,

    /// Bytes of content covered by the bounded kinds (default 100MB)
    #[arg(long)]
    hashmax: Option<u64>,

    /// Worker threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Show a progress bar while hashing
    #[arg(long)]
    progress: bool,
}

impl ManifestArgs {
    fn config(&self) -> ManifestConfig {
        let mut config = ManifestConfig::new()
            .with_hashmax(self.hashmax)
            .with_progress(self.progress);
        if let Some(jobs) = self.jobs {
            config = config.with_workers(jobs);
        }
        config
    }

    fn kinds(&self) -> Option<Vec<HashKind>> {
        if self.hashfn.is_empty() {
            None
        } else {
            Some(self.hashfn.iter().map(|name| HashKind::from(name.as_str())).collect())
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add files to a manifest
    Add {
        #[command(flatten)]
        manifest: ManifestArgs,

        /// Ignore an existing manifest and overwrite recorded hashes
        #[arg(short, long)]
        force: bool,

        /// Stop hashing a file once one kind succeeds
        #[arg(long)]
        shortcircuit: bool,

        /// Files to add (glob patterns are expanded)
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Check files in a manifest
    Check {
        #[command(flatten)]
        manifest: ManifestArgs,

        /// Pass a file if any of its hashes match, instead of all
        #[arg(long)]
        any: bool,

        /// Decide each file on the first hash tested
        #[arg(long)]
        shortcircuit: bool,

        /// Print mismatches as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::Add {
            manifest,
            force,
            shortcircuit,
            inputs,
        } => {
            add(&manifest, force, shortcircuit, &inputs)?;
            Ok(true)
        }
        Commands::Check {
            manifest,
            any,
            shortcircuit,
            json,
        } => check(&manifest, any, shortcircuit, json),
    }
}

fn add(args: &ManifestArgs, force: bool, shortcircuit: bool, inputs: &[String]) -> Result<()> {
    let mut manifest = Manifest::with_config(&args.name, args.config());

    // Extend an existing manifest unless forced to start over
    if args.name.exists() && !force {
        manifest
            .load()
            .with_context(|| format!("loading {}", args.name.display()))?;
    }

    let files = wildcard::expand_inputs(inputs)?;
    let mut options = AddOptions::new().force(force).shortcircuit(shortcircuit);
    if let Some(kinds) = args.kinds() {
        options = options.kinds(kinds);
    }

    manifest.add(&files, &options)?;
    manifest
        .dump()
        .with_context(|| format!("writing {}", args.name.display()))?;

    info!(entries = manifest.len(), "wrote {}", args.name.display());
    Ok(())
}

fn check(args: &ManifestArgs, any: bool, shortcircuit: bool, json: bool) -> Result<bool> {
    let manifest = Manifest::open_with_config(&args.name, args.config())
        .with_context(|| format!("loading {}", args.name.display()))?;

    let condition = if any { Condition::Any } else { Condition::All };
    let mut options = CheckOptions::new()
        .condition(condition)
        .shortcircuit(shortcircuit);
    if let Some(kinds) = args.kinds() {
        options = options.kinds(kinds);
    }

    let mut hashvals = HashVals::new();
    let ok = manifest.check(&options, Some(&mut hashvals));

    if json {
        println!("{}", serde_json::to_string_pretty(&hashvals)?);
    } else {
        report(&args.name, ok, &manifest, &hashvals);
    }
    Ok(ok)
}

fn report(name: &Path, ok: bool, manifest: &Manifest, hashvals: &HashVals) {
    if ok {
        println!("{} :: hashes are correct", name.display());
        return;
    }

    println!("{} :: hashes do not match!", name.display());
    for (path, kinds) in hashvals {
        println!("  {}", path);
        for (kind, actual) in kinds {
            let expected = manifest
                .entry(path)
                .and_then(|entry| entry.hashes.get(kind))
                .map(String::as_str)
                .unwrap_or("-");
            println!("    {}", kind);
            println!("      Expected: {}", expected);
            println!("      Actual:   {}", actual.as_deref().unwrap_or("<unreadable>"));
        }
    }
}
