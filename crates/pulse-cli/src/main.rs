use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pulse_core::error::ExitCode;
use pulse_core::{AppConfig, ScoredRecord};
use pulse_science::export;
use pulse_science::{BatchOutcome, BatchReport, RimPipeline, ScienceError};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "scholar-pulse",
    about = "Research Integrity Measure for a Google Scholar author profile",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting SCHOLAR_PULSE_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging on stderr (overrides RUST_LOG).
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the publications of one author profile.
    Analyze {
        /// Google Scholar author id (the `user=` value of a profile URL).
        author_id: String,
        /// Maximum number of publications to analyze.
        #[arg(long)]
        limit: Option<usize>,
        /// Year citations-per-year is measured against.
        #[arg(long)]
        reference_year: Option<i32>,
        /// Write one CSV row per paper to this path.
        #[arg(long)]
        export: Option<PathBuf>,
        /// Bypass the on-disk response cache.
        #[arg(long)]
        no_cache: bool,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration.
    List,
    /// Print the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let json_output = cli.json || std::env::var("SCHOLAR_PULSE_JSON").as_deref() == Ok("1");

    let mut config = match AppConfig::load() {
        Ok(config) => {
            debug!(path = %AppConfig::config_path().display(), "configuration loaded");
            config
        }
        Err(err) => {
            report_error(json_output, "invalid_config", &err.to_string(), start)?;
            std::process::exit(ExitCode::InvalidArgs as i32);
        }
    };

    match cli.command {
        // ── Analyze ────────────────────────────────────────────────────────
        Commands::Analyze {
            author_id,
            limit,
            reference_year,
            export,
            no_cache,
        } => {
            if let Some(limit) = limit {
                config.batch.max_publications = limit;
            }
            if let Some(year) = reference_year {
                config.batch.reference_year = year;
            }
            if no_cache {
                config.cache.enabled = false;
            }
            if let Err(err) = config.validate() {
                report_error(json_output, "invalid_args", &err.to_string(), start)?;
                std::process::exit(ExitCode::InvalidArgs as i32);
            }

            let pipeline = RimPipeline::from_config(&config)?;
            let outcome = match pipeline.run(&author_id).await {
                Ok(outcome) => outcome,
                Err(err @ ScienceError::ProfileFetch(_)) => {
                    report_error(json_output, "profile_fetch", &err.to_string(), start)?;
                    std::process::exit(ExitCode::NetworkError as i32);
                }
                Err(err) => return Err(err.into()),
            };

            match outcome {
                BatchOutcome::NoPublications { author_name } => {
                    let dur = start.elapsed().as_millis();
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": {"authorName": author_name, "records": []},
                            "meta": {"duration_ms": dur, "no_publications": true}
                        }))?;
                    } else {
                        println!("No publications found for this scholar id.");
                    }
                }
                BatchOutcome::Scored(report) => {
                    if let Some(path) = &export {
                        let rows = export::rows(&report.author_name, &report.records);
                        export::save_csv(path, &rows)
                            .with_context(|| format!("exporting to {}", path.display()))?;
                    }

                    let dur = start.elapsed().as_millis();
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": report,
                            "meta": {
                                "duration_ms": dur,
                                "reference_year": config.batch.reference_year,
                                "export": export.as_ref().map(|p| p.display().to_string()),
                            }
                        }))?;
                    } else {
                        print_report(&report);
                        if let Some(path) = &export {
                            println!("\nSaved: {}", path.display());
                        }
                    }
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::List => {
                    let kv = config_key_values(&config);
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":kv,"meta":{"duration_ms":dur}}))?;
                    } else {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    }
                }
                ConfigAction::Path => {
                    let path = AppConfig::config_path();
                    if json_output {
                        print_json(&serde_json::json!({
                            "status":"ok",
                            "data":{"path":path.display().to_string(),"exists":path.exists()},
                            "meta":{"duration_ms":dur}
                        }))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
            }
        }

        // ── Version ────────────────────────────────────────────────────────
        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("scholar-pulse v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn report_error(json_output: bool, code: &str, message: &str, start: Instant) -> Result<()> {
    if json_output {
        let dur = start.elapsed().as_millis();
        print_json(&serde_json::json!({"status":"error","error":code,"message":message,"meta":{"duration_ms":dur}}))?;
    } else {
        eprintln!("Error: {message}");
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    let summary = &report.summary;
    println!("Scholar: {}", report.author_name);
    println!("  Papers analyzed:  {}", summary.paper_count);
    println!("  Mean RIM:         {:.1}", summary.mean_rim);
    println!("  Total citations:  {}", summary.total_citations);
    println!("  Open access:      {:.0}%", summary.open_access_percent());

    for (idx, scored) in report.records.iter().enumerate() {
        println!();
        print_card(idx + 1, scored);
    }
}

fn print_card(n: usize, scored: &ScoredRecord) {
    let r = &scored.record;
    println!("{n}. {}", truncate(&r.title, 80));
    let venue = if r.venue.is_empty() { "N/A" } else { &r.venue };
    let year = r.year.map_or_else(|| "N/A".to_string(), |y| y.to_string());
    println!("   {venue} ({year})");
    println!(
        "   Citations: {}  CPY: {:.2}  Authors: {}",
        r.citations, r.citations_per_year, r.num_authors
    );
    let doi = r.doi.as_deref().unwrap_or("N/A");
    println!("   DOI: {doi}");

    let mut markers = Vec::new();
    if r.is_retracted {
        markers.push("RETRACTED");
    }
    if r.is_open_access {
        markers.push("Open Access");
    }
    if !markers.is_empty() {
        println!("   [{}]", markers.join("] ["));
    }
    println!(
        "   RIM: {:.2} ({})  Risk: {:.2}",
        scored.rim(),
        scored.band(),
        scored.risk_factor()
    );
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}...")
}

fn config_key_values(config: &AppConfig) -> BTreeMap<&'static str, String> {
    let secret = |v: &Option<String>| {
        if v.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            "(set)".to_string()
        } else {
            "(unset)".to_string()
        }
    };

    let mut map = BTreeMap::new();
    map.insert("config_path", AppConfig::config_path().display().to_string());
    map.insert("sources.serpapi_key", secret(&config.sources.serpapi_key));
    map.insert("sources.unpaywall_email", config.sources.unpaywall_email.clone());
    map.insert(
        "sources.semantic_scholar_api_key",
        secret(&config.sources.semantic_scholar_api_key),
    );
    map.insert(
        "sources.polite_pool_email",
        config.sources.polite_pool_email.clone().unwrap_or_default(),
    );
    map.insert("batch.reference_year", config.batch.reference_year.to_string());
    map.insert("batch.max_publications", config.batch.max_publications.to_string());
    map.insert("batch.politeness_delay_ms", config.batch.politeness_delay_ms.to_string());
    map.insert("http.resolver_timeout_secs", config.http.resolver_timeout_secs.to_string());
    map.insert("http.max_retries", config.http.max_retries.to_string());
    map.insert("cache.enabled", config.cache.enabled.to_string());
    map.insert("cache.ttl_hours", config.cache.ttl_hours.to_string());
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 80), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn secrets_are_not_printed() {
        let mut config = AppConfig::default();
        config.sources.serpapi_key = Some("abc123".to_string());
        let kv = config_key_values(&config);
        assert_eq!(kv["sources.serpapi_key"], "(set)");
        assert_eq!(kv["sources.semantic_scholar_api_key"], "(unset)");
    }

    #[test]
    fn analyze_flags_parse() {
        let cli = Cli::try_parse_from([
            "scholar-pulse",
            "analyze",
            "AbCdEf",
            "--limit",
            "5",
            "--reference-year",
            "2023",
            "--no-cache",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Analyze {
                author_id,
                limit,
                reference_year,
                no_cache,
                export,
            } => {
                assert_eq!(author_id, "AbCdEf");
                assert_eq!(limit, Some(5));
                assert_eq!(reference_year, Some(2023));
                assert!(no_cache);
                assert!(export.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }
}
