//! ccswitch - switch between named CLI settings profiles and back them up.
//!
//! Backups are `.ccx` containers: optionally password-encrypted, always
//! compressed and checksummed.

use ccswitch::codec::{ContainerCodec, ContainerMetadata};
use ccswitch::config::CONTAINER_EXTENSION;
use ccswitch::profile::{FileStore, ProfileStore};
use ccswitch::transfer::{Exporter, ImportOptions, ImportResult, Importer};
use ccswitch::{AppConfig, Error, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ccswitch")]
#[command(author, version)]
#[command(
    about = "Switch between named settings profiles and back them up",
    long_about = "Manages named profiles for a CLI settings file and exports/imports them as encrypted, compressed, checksummed .ccx containers."
)]
struct Cli {
    /// Directory holding profiles (default: ~/.ccswitch/profiles)
    #[arg(long, global = true)]
    profiles_dir: Option<PathBuf>,

    /// Settings file profiles are switched onto (default: ~/.cc/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one profile, the active profile, or all profiles to a container
    #[command(group(ArgGroup::new("selection").required(true).args(["name", "all", "current"])))]
    Export {
        /// Profile to export
        name: Option<String>,

        /// Export every profile
        #[arg(long)]
        all: bool,

        /// Export the active profile
        #[arg(long)]
        current: bool,

        /// Output container path (.ccx appended if no extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Encrypt with this password
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Import profiles from a container
    Import {
        /// Container to import
        path: PathBuf,

        /// Password for an encrypted container (prompted if omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Replace existing profiles with the same name
        #[arg(long)]
        overwrite: bool,

        /// Prefix added to every imported profile name
        #[arg(long, default_value = "")]
        prefix: String,

        /// Show what would be imported without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip profiles whose name already exists instead of renaming them
        #[arg(long)]
        skip_existing: bool,
    },

    /// Show container metadata without decrypting it
    Inspect {
        /// Container to inspect
        path: PathBuf,
    },

    /// List profiles in a container that clash with existing ones
    Conflicts {
        /// Container to check
        path: PathBuf,

        /// Password for an encrypted container (prompted if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List stored profiles
    List,

    /// Switch the settings file to a profile
    Use {
        /// Profile to activate
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let config = AppConfig::resolve(cli.profiles_dir, cli.settings)?;
    let store = FileStore::open(&config)?;

    match cli.command {
        Commands::Export {
            name,
            all,
            current,
            output,
            password,
        } => cmd_export(&store, name, all, current, &output, password),

        Commands::Import {
            path,
            password,
            overwrite,
            prefix,
            dry_run,
            skip_existing,
        } => {
            let options = ImportOptions {
                overwrite,
                prefix,
                dry_run,
                skip_existing,
            };
            cmd_import(&store, &path, password, &options)
        }

        Commands::Inspect { path } => cmd_inspect(&store, &path),

        Commands::Conflicts { path, password } => cmd_conflicts(&store, &path, password),

        Commands::List => cmd_list(&store),

        Commands::Use { name } => {
            store.switch_to(&name)?;
            println!("Switched to {}", name);
            Ok(0)
        }
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    Ok(rpassword::prompt_password(prompt)?)
}

/// Use the given password, or prompt when the container needs one.
fn resolve_password(
    importer: &Importer<'_, FileStore>,
    path: &Path,
    password: Option<String>,
) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    if importer.validate_file(File::open(path)?)?.is_encrypted() {
        return prompt_password("Password: ");
    }
    Ok(String::new())
}

fn cmd_export(
    store: &FileStore,
    name: Option<String>,
    all: bool,
    current: bool,
    output: &Path,
    password: Option<String>,
) -> Result<i32> {
    let output = if output.extension().is_none() {
        output.with_extension(CONTAINER_EXTENSION)
    } else {
        output.to_path_buf()
    };
    let password = password.unwrap_or_default();
    let exporter = Exporter::new(store, ContainerCodec::default());

    let metadata = match name {
        Some(name) => exporter.export_profile(&name, &password, &output)?,
        None if all => exporter.export_all(&password, &output)?,
        None if current => exporter.export_current(&password, &output)?,
        None => return Err(Error::Config("name a profile, --all or --current".into())),
    };

    println!(
        "Exported {} profile(s) to {}{}",
        metadata.profile_count,
        output.display(),
        if metadata.is_encrypted() {
            " (encrypted)"
        } else {
            ""
        }
    );
    Ok(0)
}

fn cmd_import(
    store: &FileStore,
    path: &Path,
    password: Option<String>,
    options: &ImportOptions,
) -> Result<i32> {
    let importer = Importer::new(store, ContainerCodec::default());
    let password = resolve_password(&importer, path, password)?;

    let result = importer.import(File::open(path)?, &password, options)?;
    print_import_result(&result, options.dry_run);

    Ok(if result.is_complete() { 0 } else { 1 })
}

fn print_import_result(result: &ImportResult, dry_run: bool) {
    if dry_run {
        println!("Dry run - nothing was changed");
    }
    for name in &result.profiles_imported {
        println!("  + {}", name);
    }
    for renamed in &result.profiles_renamed {
        println!("  ~ {} imported as {}", renamed.from, renamed.to);
    }
    for conflict in &result.conflicts {
        println!(
            "  ! {} conflicts with existing {} (suggest {})",
            conflict.original_name, conflict.conflicting_name, conflict.suggested_alternative
        );
    }
    for name in &result.profiles_skipped {
        println!("  - {} (exists, skipped)", name);
    }
    for failure in &result.errors {
        println!("  x {}: {}", failure.name, failure.error);
    }

    let summary = result.summary();
    println!();
    println!(
        "Total: {}  Imported: {}  Renamed: {}  Skipped: {}  Failed: {}",
        summary.total, summary.imported, summary.renamed, summary.skipped, summary.errored
    );
}

fn cmd_inspect(store: &FileStore, path: &Path) -> Result<i32> {
    let importer = Importer::new(store, ContainerCodec::default());
    let metadata = importer.validate_file(File::open(path)?)?;
    print_metadata(path, &metadata);
    Ok(0)
}

fn print_metadata(path: &Path, metadata: &ContainerMetadata) {
    println!("Container: {}", path.display());
    println!("=====================");
    println!("Format version:   {}", metadata.format_version);
    println!("Exported at:      {}", metadata.exported_at.to_rfc3339());
    println!("Producer:         ccswitch {}", metadata.producer_version);
    println!("Export type:      {:?}", metadata.export_type);
    println!("Profiles:         {}", metadata.profile_count);
    println!(
        "Encryption:       {}",
        if metadata.is_encrypted() {
            metadata.encryption_algorithm.as_str()
        } else {
            "none"
        }
    );
    println!(
        "Compression:      {}",
        if metadata.is_compressed() {
            metadata.compression_algorithm.as_str()
        } else {
            "none"
        }
    );
}

fn cmd_conflicts(store: &FileStore, path: &Path, password: Option<String>) -> Result<i32> {
    let importer = Importer::new(store, ContainerCodec::default());
    let password = resolve_password(&importer, path, password)?;
    let conflicts = importer.check_conflicts(File::open(path)?, &password)?;

    if conflicts.is_empty() {
        println!("No conflicts");
    } else {
        for conflict in &conflicts {
            println!(
                "{:<24} exists, suggest {}",
                conflict.conflicting_name, conflict.suggested_alternative
            );
        }
    }
    Ok(0)
}

fn cmd_list(store: &FileStore) -> Result<i32> {
    let profiles = store.list()?;

    if profiles.is_empty() {
        println!("(no profiles)");
    } else {
        for profile in profiles {
            let marker = if profile.is_current { '*' } else { ' ' };
            println!(
                "{} {:<24} modified {}",
                marker,
                profile.name,
                profile.modified_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(0)
}
