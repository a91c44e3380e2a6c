//! chat-search: cached, rate-limit-aware lookups from the command line
//!
//! Usage:
//!   chat-search <tool> <query...>     One lookup through the named tool
//!   chat-search repl                  Interactive session ("tool: query" per line)
//!   chat-search tools                 List available tools
//!   chat-search version               Show version information

use anyhow::{bail, Context};
use chat_search::config::CONFIG_PATH_ENV;
use chat_search::session::{ResearchSession, GREETING};
use chat_search::warning::ConsoleWarningSink;
use chat_search::SearchConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (config_path, args) = split_config_flag(std::env::args().skip(1).collect());
    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[0].as_str() {
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "tools" => build_session(config_path).map(|s| cmd_tools(&s)),
        "repl" => match build_session(config_path) {
            Ok(session) => cmd_repl(&session).await,
            Err(e) => Err(e),
        },
        _ => match build_session(config_path) {
            Ok(session) => cmd_lookup(&session, &args).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"chat-search: cached lookups for search-enabled chat agents

USAGE:
    chat-search [--config <path>] <COMMAND>

COMMANDS:
    <tool> <query...>           Look up a query with one tool (Search, arxiv, wikipedia)
    repl                        Read "tool: query" lines from stdin, caching results
    tools                       List available tools
    version                     Show version information
    help                        Show this help message

REPL COMMANDS:
    :stats                      Per-tool cache and retry counters
    :quit                       Leave the session

ENVIRONMENT:
    CHAT_SEARCH_CONFIG          YAML config file path
    CHAT_SEARCH_MAX_ATTEMPTS    Attempts per lookup (default 5)
    RUST_LOG                    Diagnostic log filter"#
    );
}

fn cmd_version() {
    println!("chat-search {}", env!("CARGO_PKG_VERSION"));
}

/// Pulls `--config <path>` out of the argument list.
fn split_config_flag(args: Vec<String>) -> (Option<PathBuf>, Vec<String>) {
    let mut path = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            path = iter.next().map(PathBuf::from);
        } else {
            rest.push(arg);
        }
    }
    (path, rest)
}

fn build_session(config_path: Option<PathBuf>) -> anyhow::Result<ResearchSession> {
    let path = config_path.or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));
    let config = match path {
        Some(p) => SearchConfig::from_file(&p)
            .with_context(|| format!("loading config from {}", p.display()))?,
        None => SearchConfig::from_env()?,
    };
    let session = ResearchSession::from_config(&config)?
        .with_warning_sink(Arc::new(ConsoleWarningSink::default()));
    Ok(session)
}

fn cmd_tools(session: &ResearchSession) {
    for def in session.definitions() {
        println!(
            "  {:<12} {}",
            def.function.name,
            def.function.description.unwrap_or_default()
        );
    }
}

async fn cmd_lookup(session: &ResearchSession, args: &[String]) -> anyhow::Result<()> {
    let tool = &args[0];
    let query = args[1..].join(" ");
    if query.trim().is_empty() {
        bail!("missing query for tool '{tool}'");
    }
    let result = session.lookup(tool, &query).await?;
    println!("{}", ResearchSession::answer_text(&result));
    Ok(())
}

async fn cmd_repl(session: &ResearchSession) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{GREETING}");
    println!("Tools: {}", session.tool_names().join(", "));

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":stats" => {
                print_stats(session);
                continue;
            }
            _ => {}
        }

        let Some((tool, query)) = line.split_once(':') else {
            println!("Expected \"tool: query\", e.g. \"wikipedia: Alan Turing\"");
            continue;
        };
        match session.lookup(tool.trim(), query.trim()).await {
            Ok(result) => println!("{}", ResearchSession::answer_text(&result)),
            Err(e) => println!("{}", ResearchSession::error_text(&e)),
        }
    }
    Ok(())
}

fn print_stats(session: &ResearchSession) {
    for name in session.tool_names() {
        if let Some(stats) = session.stats(&name) {
            println!(
                "  {:<12} hits={} misses={} calls={} rate_limited={} exhausted={} failures={} cached={}",
                name,
                stats.cache_hits,
                stats.cache_misses,
                stats.tool_calls,
                stats.rate_limited,
                stats.exhausted,
                stats.failures,
                session.cache(&name).map(|c| c.len()).unwrap_or(0),
            );
        }
    }
}
