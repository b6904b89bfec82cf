//! abpvm CLI
//!
//! Matches URIs against Adblock Plus filter lists and inspects the
//! compiled bytecode.

mod bench;
mod rules;

use clap::{Parser, Subcommand};
use serde::Serialize;

use abp_compiler::ErrorPolicy;
use abp_core::disasm::{write_listing, ProgramStats};
use abp_core::matcher::{ExclusionMode, Matcher};
use abp_core::query::Query;

#[derive(Parser)]
#[command(name = "abpvm")]
#[command(about = "Adblock Plus URL filter compiler and matcher")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match URIs against filter lists
    Match {
        /// Filter list files, loaded in order
        #[arg(short, long = "rules", required = true)]
        rules: Vec<String>,

        /// Reject rules whose excluded domains appear in the URI domain
        #[arg(long)]
        enforce_exclusions: bool,

        /// Skip rules that fail to compile instead of aborting
        #[arg(long)]
        skip_invalid: bool,

        /// Print a JSON report
        #[arg(long)]
        json: bool,

        /// Read URIs one per line from a file (`-` for stdin)
        #[arg(long)]
        uris: Option<String>,

        /// URIs to match
        uri: Vec<String>,
    },

    /// Compile filter lists and report every rule that fails
    Check {
        /// Filter list files
        #[arg(short, long = "rules", required = true)]
        rules: Vec<String>,
    },

    /// Print the compiled bytecode of filter lists
    Dump {
        /// Filter list files
        #[arg(short, long = "rules", required = true)]
        rules: Vec<String>,

        /// Print only instruction counts, as JSON
        #[arg(long)]
        json: bool,
    },

    /// Time matching a URI batch against filter lists
    Bench {
        /// Filter list files
        #[arg(short, long = "rules", required = true)]
        rules: Vec<String>,

        /// URI file, one per line (`-` for stdin)
        #[arg(long)]
        uris: String,

        /// Timed passes over the batch
        #[arg(long, default_value_t = 100)]
        iterations: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Match {
            rules,
            enforce_exclusions,
            skip_invalid,
            json,
            uris,
            uri,
        } => cmd_match(&rules, enforce_exclusions, skip_invalid, json, uris.as_deref(), uri),
        Commands::Check { rules } => cmd_check(&rules),
        Commands::Dump { rules, json } => cmd_dump(&rules, json),
        Commands::Bench { rules, uris, iterations } => cmd_bench(&rules, &uris, iterations),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[derive(Serialize)]
struct MatchReport<'a> {
    rules: usize,
    queries: usize,
    matched: usize,
    results: Vec<QueryMatches<'a>>,
}

#[derive(Serialize)]
struct QueryMatches<'a> {
    uri: &'a str,
    domain: &'a str,
    rules: Vec<&'a str>,
}

fn cmd_match(
    lists: &[String],
    enforce_exclusions: bool,
    skip_invalid: bool,
    json: bool,
    uri_file: Option<&str>,
    uri_args: Vec<String>,
) -> Result<(), String> {
    let mode = if enforce_exclusions { ExclusionMode::Enforced } else { ExclusionMode::Inert };
    let policy = if skip_invalid { ErrorPolicy::Skip } else { ErrorPolicy::Abort };

    let mut matcher = Matcher::with_exclusion_mode(mode);
    rules::load_lists(lists, &mut matcher, policy)?;

    let queries: Vec<Query> = rules::read_uris(uri_file, uri_args)?
        .into_iter()
        .map(Query::new)
        .collect();
    if queries.is_empty() {
        return Err("No URIs specified".to_string());
    }

    let results: Vec<QueryMatches<'_>> = queries
        .iter()
        .map(|query| QueryMatches {
            uri: query.uri(),
            domain: query.domain(),
            rules: matcher.match_query(query),
        })
        .collect();

    if json {
        let report = MatchReport {
            rules: matcher.len(),
            queries: queries.len(),
            matched: results.iter().filter(|r| !r.rules.is_empty()).count(),
            results,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        println!("{out}");
        return Ok(());
    }

    for result in &results {
        for rule in &result.rules {
            println!("{}\t{}", result.uri, rule);
        }
    }

    Ok(())
}

fn cmd_check(lists: &[String]) -> Result<(), String> {
    let mut matcher = Matcher::new();
    let loaded = rules::load_lists(lists, &mut matcher, ErrorPolicy::Skip)?;

    let mut failed = 0usize;
    for list in &loaded {
        let stats = &list.stats;
        println!("{}", list.path);
        println!("  Lines:          {}", stats.lines);
        println!("  Rules:          {}", stats.rules);
        println!("  Comments:       {}", stats.comments);
        println!("  Blank:          {}", stats.blank);
        println!("  Element hiding: {}", stats.element_hiding);
        println!("  Errors:         {}", stats.errors.len());
        for err in &stats.errors {
            println!("    {err}");
        }
        failed += stats.errors.len();
    }

    println!("Total: {} rules compiled, {} failed", matcher.len(), failed);

    if failed > 0 {
        return Err(format!("{} rule(s) failed to compile", failed));
    }
    Ok(())
}

fn cmd_dump(lists: &[String], json: bool) -> Result<(), String> {
    let mut matcher = Matcher::new();
    rules::load_lists(lists, &mut matcher, ErrorPolicy::Abort)?;

    if json {
        let stats = ProgramStats::collect(matcher.rules());
        let out = serde_json::to_string_pretty(&stats)
            .map_err(|e| format!("Failed to serialize stats: {}", e))?;
        println!("{out}");
        return Ok(());
    }

    let mut listing = String::new();
    write_listing(&mut listing, matcher.rules()).map_err(|e| format!("Failed to render listing: {}", e))?;
    print!("{listing}");
    Ok(())
}

fn cmd_bench(lists: &[String], uri_file: &str, iterations: usize) -> Result<(), String> {
    let mut matcher = Matcher::new();
    rules::load_lists(lists, &mut matcher, ErrorPolicy::Skip)?;

    let uris = rules::read_uris(Some(uri_file), Vec::new())?;
    let opts = bench::BenchOptions {
        iterations,
        warmup: (iterations / 10).max(1),
    };
    bench::run(&matcher, &uris, &opts)
}
