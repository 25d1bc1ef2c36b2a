use std::fmt;

use exam_core::model::ExamId;
use services::{AppServices, Clock, ExamSettings};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod seed;
mod take;

use take::TakePlan;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidExamId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidValue { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidExamId { raw } => write!(f, "invalid --exam-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  exam seed [--db <sqlite_url>]");
    eprintln!("  exam list [--db <sqlite_url>]");
    eprintln!("  exam take --exam-id <id> [--db <sqlite_url>] [--answer <qid>=<A-D|1-4>]...");
    eprintln!("            [--upload <qid>=<image_path>]... [--confirm] [--time-up]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:exam.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_MARK_PER_CORRECT, EXAM_WRONG_PENALTY, EXAM_PASS_PERCENT,");
    eprintln!("  EXAM_TICK_MILLIS, EXAM_MAX_IMAGES_PER_QUESTION, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Seed,
    List,
    Take,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "seed" => Some(Self::Seed),
            "list" => Some(Self::List),
            "take" => Some(Self::Take),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    take: TakePlan,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:exam.sqlite3".into()), normalize_sqlite_url);
        let mut take = TakePlan::default();

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (_, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                (Command::Take, "--exam-id") => {
                    let value = require_value(args, "--exam-id")?;
                    let parsed: ExamId = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidExamId { raw: value.clone() })?;
                    take.exam_id = Some(parsed);
                }
                (Command::Take, "--answer") => {
                    let value = require_value(args, "--answer")?;
                    take.push_answer(&value)?;
                }
                (Command::Take, "--upload") => {
                    let value = require_value(args, "--upload")?;
                    take.push_upload(&value)?;
                }
                (Command::Take, "--confirm") => take.confirm = true,
                (Command::Take, "--time-up") => take.time_up = true,
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, take })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut iter = argv.into_iter();

    let cmd = match iter.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let settings = ExamSettings::from_env()?;
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::default(), settings).await?;

    match cmd {
        Command::Seed => {
            seed::seed_demo(app.storage(), Clock::default()).await?;
            println!(
                "Seeded MCQ exam {} and written exam {} into {}.",
                seed::DEMO_MCQ_EXAM,
                seed::DEMO_WRITTEN_EXAM,
                parsed.db_url
            );
            Ok(())
        }
        Command::List => {
            for exam in app.active_exams(128).await? {
                println!(
                    "{:>4}  {:<8} {:>3} min  {}",
                    exam.id(),
                    exam.kind().as_str(),
                    exam.duration_minutes(),
                    exam.title()
                );
            }
            Ok(())
        }
        Command::Take => {
            let exam_id = parsed
                .take
                .exam_id
                .ok_or(ArgsError::MissingValue { flag: "--exam-id" })?;
            take::run_take(&app, exam_id, parsed.take).await
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,services=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
