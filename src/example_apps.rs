use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum, error::ErrorKind};
use url::Url;

use crate::config::{ShareLimits, ViewerConfig};
use crate::constants::schema::{
    COL_COLD_CALL, COL_COMMON_USES, COL_DEFINITION, COL_EMAIL_SEQUENCES, COL_EXPLANATION,
    COL_OBJECTIONS, COL_POSITIONING, COL_REBUTTALS, COL_URL,
};
use crate::data::ProductRecord;
use crate::ingestion::UploadFormat;
use crate::link::InboundLink;
use crate::namespace::Namespace;
use crate::progress::{Curriculum, TrainingProgress};
use crate::session::{Notice, NoticeLevel, UploadOutcome, ViewerSession};
use crate::store::{FileStore, PersistenceStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NamespaceArg {
    Lmp,
    Bmp,
}

impl From<NamespaceArg> for Namespace {
    fn from(value: NamespaceArg) -> Self {
        match value {
            NamespaceArg::Lmp => Namespace::Lmp,
            NamespaceArg::Bmp => Namespace::Bmp,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "viewer_cli",
    disable_help_subcommand = true,
    about = "Sales-training product viewer",
    long_about = "Upload product spreadsheets, browse them per department, build view-only share links, and track curriculum progress.",
    after_help = "State is persisted in a single store file; by default .salesdeck_store/viewer_store.bin."
)]
/// CLI for `viewer_cli`.
///
/// Common usage:
/// - Load a sheet: `upload products.xlsx --namespace lmp`
/// - Copy a trainee link: `share --origin https://training.example`
/// - Open a trainee link: `open 'https://training.example/?mode=trainee#data=...'`
struct ViewerCli {
    #[arg(
        long = "store-path",
        value_name = "STORE_PATH",
        help = "Optional path for the persisted viewer state file"
    )]
    store_path: Option<PathBuf>,
    #[arg(
        long = "store-dir",
        value_name = "DIR",
        conflicts_with = "store_path",
        help = "Optional directory for the persisted viewer state file (uses viewer_store.bin filename)"
    )]
    store_dir: Option<PathBuf>,
    #[arg(
        long = "max-token-len",
        value_parser = parse_positive_usize,
        help = "Reject share tokens longer than this many characters"
    )]
    max_token_len: Option<usize>,
    #[command(subcommand)]
    command: ViewerCommand,
}

#[derive(Debug, Subcommand)]
enum ViewerCommand {
    /// Replace a department's products with a .xlsx or .csv file.
    Upload {
        file: PathBuf,
        #[arg(long, value_enum)]
        namespace: Option<NamespaceArg>,
    },
    /// Print a view-only share link for a department's products.
    Share {
        #[arg(long, default_value = "http://localhost:8080")]
        origin: String,
        #[arg(long, value_enum)]
        namespace: Option<NamespaceArg>,
    },
    /// Open a viewer link, importing any shared data it carries.
    Open { url: String },
    /// List products and show the selected one.
    Show {
        #[arg(long, help = "Only list products whose name or definition matches")]
        search: Option<String>,
        #[arg(long, value_enum)]
        namespace: Option<NamespaceArg>,
    },
    /// Remember a product as the selected one.
    Select {
        product: String,
        #[arg(long, value_enum)]
        namespace: Option<NamespaceArg>,
    },
    /// Make a department the active one.
    Switch {
        #[arg(value_enum)]
        namespace: NamespaceArg,
    },
    /// Clear a department's products and selection.
    Reset {
        #[arg(long, value_enum)]
        namespace: Option<NamespaceArg>,
    },
    /// Show or update curriculum progress.
    Progress {
        #[arg(long, value_name = "LESSON_ID", help = "Toggle a lesson, repeat as needed")]
        toggle: Vec<String>,
        #[arg(long, help = "Clear all completions first")]
        reset: bool,
    },
}

/// Run the viewer CLI against a file-backed store.
///
/// `args_iter` excludes the program name. `--help` prints usage and returns `Ok(())`.
pub fn run_viewer_cli<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<ViewerCli, _>(std::iter::once("viewer_cli".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let mut config = ViewerConfig::default();
    if let Some(path) = cli.store_path {
        config = config.with_store_path(path);
    } else if let Some(dir) = cli.store_dir {
        config = config.with_store_path(FileStore::default_path_in_dir(dir));
    }
    if let Some(max_token_len) = cli.max_token_len {
        config = config.with_limits(ShareLimits::with_max_token_len(max_token_len));
    }

    let store: Arc<dyn PersistenceStore> = Arc::new(FileStore::open(&config.store_path)?);

    match cli.command {
        ViewerCommand::Upload { file, namespace } => {
            let bytes = fs::read(&file)?;
            let name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut session = open_session(config, store, namespace);
            let outcome = session.upload(&bytes, UploadFormat::detect(&name, &bytes));
            print_notices(session.drain_notices());
            if let UploadOutcome::Loaded(count) = outcome {
                println!(
                    "{} now holds {} products from {}",
                    session.active_namespace(),
                    count,
                    file.display()
                );
            }
        }
        ViewerCommand::Share { origin, namespace } => {
            let origin = Url::parse(&origin)?;
            let mut session = open_session(config, store, namespace);
            let link = session.share_link(&origin);
            print_notices(session.drain_notices());
            if let Some(link) = link {
                println!("{link}");
            }
        }
        ViewerCommand::Open { url } => {
            let link = InboundLink::parse(&url)?;
            let mut session = ViewerSession::bootstrap(config, store, link);
            print_notices(session.drain_notices());
            if session.is_trainee() {
                println!("(read-only trainee view)");
            }
            print_products(&session, None);
        }
        ViewerCommand::Show { search, namespace } => {
            let session = open_session(config, store, namespace);
            print_products(&session, search.as_deref());
        }
        ViewerCommand::Select { product, namespace } => {
            let mut session = open_session(config, store, namespace);
            if session.select(&product) {
                println!("Selected '{product}' in {}", session.active_namespace());
            } else {
                eprintln!(
                    "No product named '{product}' in {}",
                    session.active_namespace()
                );
            }
        }
        ViewerCommand::Switch { namespace } => {
            let session = open_session(config, store, Some(namespace));
            println!(
                "Active department: {} ({} products)",
                session.active_namespace(),
                session.records().len()
            );
        }
        ViewerCommand::Reset { namespace } => {
            let mut session = open_session(config, store, namespace);
            session.reset();
            print_notices(session.drain_notices());
        }
        ViewerCommand::Progress { toggle, reset } => {
            let mut progress = TrainingProgress::load(store, Curriculum::three_day());
            if reset {
                progress.reset()?;
            }
            for lesson in &toggle {
                let complete = progress.toggle(lesson)?;
                println!(
                    "{lesson}: {}",
                    if complete { "complete" } else { "not complete" }
                );
            }
            print_progress(&progress);
        }
    }

    Ok(())
}

fn open_session(
    config: ViewerConfig,
    store: Arc<dyn PersistenceStore>,
    namespace: Option<NamespaceArg>,
) -> ViewerSession {
    let mut session = ViewerSession::bootstrap(config, store, InboundLink::default());
    if let Some(namespace) = namespace {
        session.switch_namespace(namespace.into());
    }
    session
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw.parse::<usize>().map_err(|_| {
        format!(
            "Could not parse --max-token-len value '{}' as a positive integer",
            raw
        )
    })?;
    if parsed == 0 {
        return Err("--max-token-len must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => println!("{}", notice.message),
        }
    }
}

fn print_products(session: &ViewerSession, search: Option<&str>) {
    let namespace = session.active_namespace();
    let records = session.records();
    if records.is_empty() {
        println!("{namespace} has no products. Upload a .xlsx or .csv file to get started.");
        return;
    }
    let selected_name = session.selected().map(|record| record.name.as_str());
    let listed = session.search(search.unwrap_or_default());
    println!(
        "--- {namespace}: {} of {} products ({:?}) ---",
        listed.len(),
        records.len(),
        session.origin()
    );
    for record in listed {
        let marker = if Some(record.name.as_str()) == selected_name {
            '*'
        } else {
            ' '
        };
        println!(
            "{marker} {}  {}",
            record.name,
            record.definition.as_deref().unwrap_or_default()
        );
    }
    if let Some(record) = session.selected() {
        print_record(record);
    }
}

fn print_record(record: &ProductRecord) {
    println!("=== {} ===", record.name);
    for column in [
        COL_URL,
        COL_DEFINITION,
        COL_EXPLANATION,
        COL_COMMON_USES,
        COL_POSITIONING,
        COL_COLD_CALL,
    ] {
        if let Some(text) = record.field(column) {
            println!("{column}:\n  {text}");
        }
    }
    let profiles = record.customer_profiles();
    if !profiles.is_empty() {
        println!("Customer profiles: {}", profiles.join(" | "));
    }
    for (column, body) in COL_EMAIL_SEQUENCES.iter().zip(record.email_sequences()) {
        if let Some(body) = body {
            println!("{column}:\n  {body}");
        }
    }
    for column in [COL_OBJECTIONS, COL_REBUTTALS] {
        if let Some(text) = record.field(column) {
            println!("{column}:\n  {text}");
        }
    }
    for (column, text) in &record.extra {
        println!("{column}: {text}");
    }
}

fn print_progress(progress: &TrainingProgress) {
    println!(
        "Training progress: {} / {} lessons ({:.0}%)",
        progress.completed_count(),
        progress.total_lessons(),
        progress.completion_percentage()
    );
    for day in &progress.curriculum().days {
        let (done, total) = progress.day_progress(day.day).unwrap_or((0, 0));
        println!("Day {}: {} [{done}/{total}]", day.day, day.title);
        for lesson in &day.lessons {
            let mark = if progress.is_complete(&lesson.id) {
                'x'
            } else {
                ' '
            };
            println!("  [{mark}] {} ({})", lesson.title, lesson.id);
        }
    }
}
