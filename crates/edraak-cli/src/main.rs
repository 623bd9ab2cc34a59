use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use edraak_core::forus::validator::DATE_TIME_FORMAT;
use edraak_core::forus::{self, ForUsValidator, SignedRequest};
use edraak_core::university::{self, UniversityId, UniversityIdForm};
use edraak_core::{Error, InMemoryCatalog, InMemoryDirectory, Settings};

/// Edraak — ForUs request checks and University ID tools
///
/// Sign and verify ForUs partner requests, mark conflicting university IDs,
/// and validate University ID form input.
#[derive(Parser)]
#[command(name = "edraak", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a ForUs request (JSON object of fields)
    Sign {
        /// Path to request .json file
        file: PathBuf,
        /// Settings file providing the secret
        #[arg(long)]
        config: Option<PathBuf>,
        /// Secret key, overrides settings and environment
        #[arg(long)]
        secret: Option<String>,
        /// Print the canonical message instead of the signed request
        #[arg(long)]
        message: bool,
    },

    /// Validate a signed ForUs request
    Verify {
        /// Path to request .json file
        file: PathBuf,
        /// Settings file with secret, choices, courses and accounts
        #[arg(long)]
        config: PathBuf,
        /// Validation time (YYYY-MM-DDTHH:MM:SS, UTC); defaults to now
        #[arg(long)]
        now: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sort university IDs of a course and mark conflicts
    Conflicts {
        /// Path to .json array of university ID records
        file: PathBuf,
        /// Course key to report on
        #[arg(long)]
        course: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate University ID form input
    CheckForm {
        /// Path to form .json file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Settings plus the in-memory collaborators used by `verify`
#[derive(serde::Deserialize)]
struct VerifyConfig {
    #[serde(flatten)]
    settings: Settings,
    #[serde(default)]
    courses: InMemoryCatalog,
    #[serde(default)]
    accounts: InMemoryDirectory,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Sign {
            file,
            config,
            secret,
            message,
        } => cmd_sign(&file, config.as_deref(), secret, message),
        Commands::Verify {
            file,
            config,
            now,
            json,
        } => cmd_verify(&file, &config, now.as_deref(), json),
        Commands::Conflicts { file, course, json } => cmd_conflicts(&file, &course, json),
        Commands::CheckForm { file, json } => cmd_check_form(&file, json),
        Commands::Version => {
            println!(
                "edraak {} (edraak-core {})",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_VERSION")
            );
            Ok(0)
        }
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            2
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

// ── sign ──────────────────────────────────────────────────

fn cmd_sign(
    file: &Path,
    config: Option<&Path>,
    secret: Option<String>,
    message: bool,
) -> Result<i32> {
    let request: SignedRequest = read_json(file)?;

    if message {
        println!("{}", forus::canonical_message(&request));
        return Ok(0);
    }

    let mut settings = match config {
        Some(path) => Settings::load(path)?,
        None => {
            let mut settings = Settings::default();
            settings.apply_env();
            settings
        }
    };
    if let Some(secret) = secret {
        settings.forus.secret_key = secret;
    }

    let signed = forus::sign_request(request, settings.secret_key()?.as_bytes())?;
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(0)
}

// ── verify ────────────────────────────────────────────────

fn cmd_verify(file: &Path, config: &Path, now: Option<&str>, json: bool) -> Result<i32> {
    tracing::debug!(file = %file.display(), "verifying ForUs request");
    let request: SignedRequest = read_json(file)?;
    let mut config: VerifyConfig = read_json(config)?;
    config.settings.apply_env();

    let now = match now {
        Some(raw) => parse_now(raw)?,
        None => Utc::now(),
    };

    let validator =
        ForUsValidator::from_settings(&config.settings, &config.courses, &config.accounts)?;

    match validator.validate_at(&request, now) {
        Ok(clean) => {
            if json {
                let out = serde_json::json!({"valid": true, "fields": clean});
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{} request accepted for {}", "✓".green(), clean.email);
            }
            Ok(0)
        }
        Err(err @ (Error::SignatureError(_) | Error::ValidationError(_))) => {
            let errors = err.field_messages();
            if json {
                let out = serde_json::json!({
                    "valid": false,
                    "errors": errors,
                    "message": forus::error_message(&forus::error_messages(&err)),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for (field, messages) in errors.iter() {
                    for message in messages {
                        eprintln!("{} [{}]: {}", "error".red(), field, message);
                    }
                }
            }
            Ok(1)
        }
        Err(other) => Err(other.into()),
    }
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .with_context(|| format!("--now must look like 2017-06-01T12:00:00, got '{}'", raw))?;
    Ok(naive.and_utc())
}

// ── conflicts ─────────────────────────────────────────────

fn cmd_conflicts(file: &Path, course: &str, json: bool) -> Result<i32> {
    let records: Vec<UniversityId> = read_json(file)?;
    let marked = university::mark_conflicts(course, &records);

    if json {
        println!("{}", serde_json::to_string_pretty(&marked)?);
        return Ok(0);
    }

    for entry in &marked {
        let id = format!("{:?}", entry.record.university_id);
        if entry.is_conflicted {
            println!("{}  {}  {}", id.yellow(), entry.record.username, "conflict".yellow().bold());
        } else {
            println!("{}  {}", id, entry.record.username);
        }
    }
    let conflicts = marked.iter().filter(|m| m.is_conflicted).count();
    println!("{} IDs, {} conflicted", marked.len(), conflicts);
    Ok(0)
}

// ── check-form ────────────────────────────────────────────

fn cmd_check_form(file: &Path, json: bool) -> Result<i32> {
    let form: UniversityIdForm = read_json(file)?;

    match form.clean() {
        Ok(cleaned) => {
            if json {
                let out = serde_json::json!({"valid": true, "fields": cleaned});
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{} form is valid", "✓".green());
            }
            Ok(0)
        }
        Err(Error::ValidationError(errors)) => {
            if json {
                let out = serde_json::json!({"valid": false, "errors": errors});
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for (field, messages) in errors.iter() {
                    for message in messages {
                        eprintln!("{} [{}]: {}", "error".red(), field, message);
                    }
                }
            }
            Ok(1)
        }
        Err(other) => Err(other.into()),
    }
}
