//! CLI entry point for `smsg`.

use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use humansize::{format_size, BINARY};

use smolmsg::config::{self, Config};
use smolmsg::export::attachment::export_attachments;
use smolmsg::export::msg::{write_draft, DraftFile, MessageDraft};
use smolmsg::id::MessageId;
use smolmsg::model::address::Author;
use smolmsg::model::message::Message;
use smolmsg::store::reader::{parse_file, MessageStore};
use smolmsg::store::scan::scan_dir;

#[derive(Parser)]
#[command(name = "smsg", version, about = "Read, write and list smolmsg messages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Messages root directory (overrides $SMSG_MSGDIR; defaults to ~/.smolmsg)
    #[arg(short = 'C', long = "dir", value_name = "DIR", global = true)]
    dir: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List messages in your inbox (default)
    List {
        /// Number of messages to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Parse a message file and print its fields
    Parse {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Decode a message id
    Id { id: String },
    /// Extract the attachments of a message file
    Extract {
        path: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write a new message (into the outbox unless --output is given)
    Compose {
        /// Sender address
        #[arg(long)]
        from: String,
        /// Sender display name
        #[arg(long)]
        from_name: Option<String>,
        /// Recipient address
        #[arg(long)]
        to: String,
        #[arg(short, long, default_value = "")]
        subject: String,
        /// File holding the body ("-" for stdin)
        #[arg(short, long, value_name = "FILE")]
        body: Option<PathBuf>,
        /// Attach a file (repeatable)
        #[arg(short, long, value_name = "FILE")]
        attach: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the configuration (or write the defaults with --init)
    Config {
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let msg_dir = config::msg_dir(&config, cli.dir.as_deref());
    tracing::debug!(msg_dir = %msg_dir.display(), "Resolved message directory");

    match cli.command {
        None => cmd_list(&config, &msg_dir, None, false),
        Some(Commands::List { limit, json }) => cmd_list(&config, &msg_dir, limit, json),
        Some(Commands::Parse { path, json }) => cmd_parse(&path, json),
        Some(Commands::Id { id }) => cmd_id(&id),
        Some(Commands::Extract { path, output }) => cmd_extract(&path, &output),
        Some(Commands::Compose {
            from,
            from_name,
            to,
            subject,
            body,
            attach,
            output,
        }) => {
            let draft = build_draft(&from, from_name.as_deref(), &to, subject, body.as_deref(), &attach)?;
            cmd_compose(&msg_dir, &draft, output)
        }
        Some(Commands::Config { init }) => cmd_config(&config, init),
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_file = config::log_file_path(config);
    let log_dir = log_file.parent().map(Path::to_path_buf).unwrap_or_default();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "smsg.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// List inbox messages, newest first.
fn cmd_list(config: &Config, msg_dir: &Path, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let inbox = config::inbox_dir(msg_dir);
    if !inbox.exists() {
        println!("  No inbox at {}", inbox.display());
        return Ok(());
    }

    let report = scan_dir(&inbox)?;
    let limit = limit.unwrap_or(config.list.limit);
    let shown: Vec<&Message> = report.messages.iter().take(limit).collect();

    if json {
        let output = serde_json::json!({
            "message_count": report.messages.len(),
            "failed_count": report.failed.len(),
            "messages": shown.iter().map(|m| message_summary_json(m)).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!(
        "  {:<4} {:<20} {:<35} {:<17} {:>8}",
        "#", "From", "Subject", "Time", "Files"
    );
    println!("  {}", "-".repeat(88));
    for (i, msg) in shown.iter().enumerate() {
        let from: String = msg.from.short_name().chars().take(19).collect();
        let subject: String = msg.subject.chars().take(34).collect();
        let when = msg
            .time
            .with_timezone(&chrono::Local)
            .format(&config.list.date_format)
            .to_string();
        let files = if msg.files.is_empty() {
            String::new()
        } else {
            format_size(msg.attachments_size(), BINARY)
        };
        println!(
            "  {:<4} {:<20} {:<35} {:<17} {:>8}",
            i + 1,
            from,
            subject,
            when,
            files
        );
    }
    if report.messages.len() > shown.len() {
        println!("  ({} more)", report.messages.len() - shown.len());
    }
    if !report.failed.is_empty() {
        println!("  {} file(s) could not be read", report.failed.len());
    }
    println!();
    Ok(())
}

/// Parse one message file and print it.
fn cmd_parse(path: &Path, json: bool) -> anyhow::Result<()> {
    let msg = parse_file(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&msg)?);
        return Ok(());
    }

    println!();
    println!("  {:<10} {}", "Id", msg.id());
    println!("  {:<10} {}", "Time", msg.time.to_rfc3339());
    println!("  {:<10} {}", "From", msg.from);
    println!("  {:<10} {}", "To", msg.to);
    println!("  {:<10} {}", "Subject", msg.subject);
    for (i, file) in msg.files.iter().enumerate() {
        println!(
            "  {:<10} {} ({}, offset {})",
            if i == 0 { "Files" } else { "" },
            if file.name.is_empty() { "(unnamed)" } else { file.name.as_str() },
            format_size(file.data_len, BINARY),
            file.data_start
        );
    }
    println!();
    println!("{}", msg.body_text());
    Ok(())
}

/// Decode a base-62 id.
fn cmd_id(text: &str) -> anyhow::Result<()> {
    let id: MessageId = text.parse()?;
    println!("  {:<10} {}", "Time", id.time().to_rfc3339());
    println!("  {:<10} {}", "Timestamp", id.timestamp());
    println!("  {:<10} {}", "Hex", id.to_hex());
    Ok(())
}

/// Extract all attachments of a message file.
fn cmd_extract(path: &Path, output: &Path) -> anyhow::Result<()> {
    let mut store = MessageStore::open(path)?;
    let msg = store.message()?;
    if msg.files.is_empty() {
        println!("  No attachments in {}", path.display());
        return Ok(());
    }
    let paths = export_attachments(&mut store, &msg, output)?;
    println!(
        "  Extracted {} of {} attachment(s) to {}",
        paths.len(),
        msg.files.len(),
        output.display()
    );
    Ok(())
}

fn build_draft(
    from: &str,
    from_name: Option<&str>,
    to: &str,
    subject: String,
    body: Option<&Path>,
    attach: &[PathBuf],
) -> anyhow::Result<MessageDraft> {
    let from = Author::new(from, from_name.unwrap_or_default())?;
    let to = Author::new(to, "")?;
    let mut draft = MessageDraft::new(from, to, chrono::Local::now().fixed_offset());
    draft.subject = subject.trim().to_string();
    draft.body = match body {
        Some(path) if path == Path::new("-") => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?,
        None => Vec::new(),
    };
    for path in attach {
        draft.files.push(DraftFile::from_path(path)?);
    }
    Ok(draft)
}

/// Write a new message file and print its id.
fn cmd_compose(msg_dir: &Path, draft: &MessageDraft, output: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match output {
        Some(path) => path,
        None => {
            let outbox = config::outbox_dir(msg_dir);
            std::fs::create_dir_all(&outbox)?;
            outbox.join(draft.file_name())
        }
    };
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
    let (written, msg) = match write_message_file(file, &path, draft) {
        Ok(done) => done,
        Err(e) => {
            // Leave no unreadable file behind
            if let Err(rm) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %rm, "Failed to remove partial message");
            }
            return Err(e);
        }
    };
    println!(
        "  Wrote {} ({}) id {}",
        path.display(),
        format_size(written, BINARY),
        msg.id()
    );
    Ok(())
}

/// Write `draft` into the freshly created `file`, then parse it back.
fn write_message_file(
    file: std::fs::File,
    path: &Path,
    draft: &MessageDraft,
) -> anyhow::Result<(u64, Message)> {
    let mut writer = BufWriter::new(file);
    let written = write_draft(&mut writer, draft)?;
    writer.flush()?;
    drop(writer);
    Ok((written, parse_file(path)?))
}

/// Print the active configuration, or write the defaults.
fn cmd_config(config: &Config, init: bool) -> anyhow::Result<()> {
    let path = config::config_file_path();
    if init {
        config::save_config(&Config::default())?;
        if let Some(path) = path {
            println!("  Wrote default config to {}", path.display());
        }
        return Ok(());
    }
    if let Some(path) = path {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "smsg", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn message_summary_json(msg: &Message) -> serde_json::Value {
    serde_json::json!({
        "id": msg.id().to_string(),
        "time": msg.time.to_rfc3339(),
        "from": {
            "address": msg.from.address,
            "name": msg.from.name,
        },
        "subject": msg.subject,
        "files": msg.files.len(),
    })
}
