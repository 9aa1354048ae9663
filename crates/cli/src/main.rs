use clap::{Parser, Subcommand, ValueEnum};
use lib::analysis::{AnalysisOptions, AnalysisReport};
use lib::config::{Config, SourceConfig};
use lib::filter::MessageFilter;
use lib::pairing::PairingStrategy;
use lib::stats::ResponseStatistics;

#[derive(Parser)]
#[command(name = "replystat")]
#[command(about = "Chatbot response-time analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Inbound message immediately followed by a reply.
    Adjacent,
    /// Per-participant pending inbound settled by the next reply.
    Session,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: REPLYSTAT_CONFIG_PATH or ~/.replystat/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Fetch chat history and report response-time statistics.
    /// --file/--url replace the configured sources when given.
    Analyze {
        /// Config file path (default: REPLYSTAT_CONFIG_PATH or ~/.replystat/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Local JSON export to read (repeatable).
        #[arg(long, value_name = "PATH")]
        file: Vec<std::path::PathBuf>,

        /// History endpoint to fetch (repeatable).
        #[arg(long, value_name = "URL")]
        url: Vec<String>,

        /// Participant id of the responder; unset counts every outbound message.
        #[arg(long, value_name = "ID")]
        responder: Option<String>,

        /// Plausibility ceiling in seconds.
        #[arg(long, value_name = "SECS")]
        ceiling: Option<f64>,

        /// Pairing strategy (default from config).
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Session strategy: abandon pending inbound messages older than this.
        #[arg(long, value_name = "SECS")]
        session_timeout: Option<u64>,

        /// Only messages from this source label.
        #[arg(long, value_name = "LABEL")]
        source: Option<String>,

        /// Only this participant's messages (and the responder's replies).
        #[arg(long, value_name = "NAME")]
        user: Option<String>,

        /// First day to include (YYYY-MM-DD).
        #[arg(long, value_name = "DATE")]
        from: Option<chrono::NaiveDate>,

        /// Last day to include (YYYY-MM-DD).
        #[arg(long, value_name = "DATE")]
        to: Option<chrono::NaiveDate>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("replystat {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Analyze {
            config,
            file,
            url,
            responder,
            ceiling,
            strategy,
            session_timeout,
            source,
            user,
            from,
            to,
            json,
        }) => {
            let overrides = Overrides {
                file,
                url,
                responder,
                ceiling,
                strategy,
                session_timeout,
            };
            let filter = MessageFilter {
                source,
                participant: user,
                from,
                to,
            };
            if let Err(e) = run_analyze(config, overrides, filter, json).await {
                log::error!("analyze failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Command-line values that take precedence over the config file.
/// `responder` is applied after env resolution, see `run_analyze`.
struct Overrides {
    file: Vec<std::path::PathBuf>,
    url: Vec<String>,
    responder: Option<String>,
    ceiling: Option<f64>,
    strategy: Option<Strategy>,
    session_timeout: Option<u64>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if !self.file.is_empty() || !self.url.is_empty() {
            config.sources = self
                .file
                .into_iter()
                .map(|path| SourceConfig::File { path, label: None })
                .chain(self.url.into_iter().map(|url| SourceConfig::Http {
                    url,
                    label: None,
                    action: "read-history-message".to_string(),
                }))
                .collect();
        }
        if let Some(c) = self.ceiling {
            config.analysis.ceiling_secs = c;
        }
        if let Some(s) = self.strategy {
            config.analysis.strategy = match s {
                Strategy::Adjacent => lib::config::StrategyKind::Adjacent,
                Strategy::Session => lib::config::StrategyKind::Session,
            };
        }
        if let Some(t) = self.session_timeout {
            config.analysis.session_timeout_secs = Some(t);
        }
    }
}

async fn run_analyze(
    config_path: Option<std::path::PathBuf>,
    overrides: Overrides,
    filter: MessageFilter,
    json: bool,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    let responder = overrides.responder.clone();
    overrides.apply(&mut config);
    if config.sources.is_empty() {
        anyhow::bail!(
            "no sources configured; add sources to {} or pass --file/--url",
            path.display()
        );
    }
    let mut options = AnalysisOptions::from_config(&config)?;
    // --responder beats REPLYSTAT_RESPONDER, which beats the config file.
    if responder.is_some() {
        options.responder = responder;
    }

    let sources = lib::sources::from_config(&config.sources);
    let loaded = lib::analysis::load(&sources).await;
    for f in &loaded.source_failures {
        eprintln!("warning: source {} unavailable: {}", f.label, f.reason);
    }
    if !loaded.normalized.failures.is_empty() {
        eprintln!(
            "warning: dropped {} record(s) with undecodable timestamp or direction",
            loaded.normalized.failures.len()
        );
    }

    let report =
        lib::analysis::analyze_filtered(&loaded.normalized.messages, &filter, &options);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &options);
    }
    Ok(())
}

fn print_report(report: &AnalysisReport, options: &AnalysisOptions) {
    let o = &report.overview;
    println!("Messages:      {}", o.total);
    println!("  inbound:     {}", o.inbound);
    println!("  outbound:    {}", o.outbound);
    println!("Participants:  {}", o.unique_participants);
    for (source, count) in &o.per_source {
        println!("  source {}: {}", source, count);
    }
    if let Some((minute, count)) = o.per_minute.iter().max_by_key(|(_, c)| **c) {
        println!("Busiest minute: {} ({} message(s))", minute.format("%Y-%m-%d %H:%M"), count);
    }
    println!();
    let strategy = match options.strategy {
        PairingStrategy::Adjacent => "adjacent",
        PairingStrategy::Session { .. } => "session",
    };
    println!(
        "Pairs ({}):  {} formed, {} over {} or non-positive",
        strategy,
        report.pairs_total,
        report.pairs_discarded,
        format_secs(report.ceiling_secs)
    );
    print_stats(
        &format!(
            "Working hours ({}-{})",
            options.window.start().format("%H:%M"),
            options.window.end().format("%H:%M")
        ),
        &report.response_time.working,
    );
    print_stats("Wall clock", &report.response_time.raw);
}

fn print_stats(title: &str, stats: &ResponseStatistics) {
    println!("{}:", title);
    match &stats.summary {
        None => println!("  no data"),
        Some(s) => {
            println!("  samples: {}", stats.sample_count);
            println!("  mean:    {}", format_secs(s.mean));
            println!("  median:  {}", format_secs(s.median));
            println!("  min:     {}", format_secs(s.min));
            println!("  max:     {}", format_secs(s.max));
        }
    }
}

/// Render seconds as "Xm Ys".
fn format_secs(secs: f64) -> String {
    let total = secs.round() as i64;
    format!("{}m {}s", total / 60, total % 60)
}
