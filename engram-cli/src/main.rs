//! Engram CLI: move knowledge between machines and inspect the local stores.
//!
//! ## Commands
//!
//! - `export`: write selected Tier 2 patterns to a signed portable document
//! - `import`: reconcile a portable document against the local store
//! - `stats`: show aggregates for both memory tiers

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use engram_core::constants::CONFIG_FILE;
use engram_core::{EngramConfig, Namespace};
use engram_knowledge::KnowledgeGraph;
use engram_transfer::{
    export_patterns, import_document, ExportDocument, ExportScope, ImportStrategy,
};
use engram_working::WorkingMemory;

#[derive(Parser)]
#[command(name = "engram")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tiered memory and knowledge engine", long_about = None)]
struct Cli {
    /// Directory holding the store files (overrides the configured one)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file path (default: engram.toml in the working directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and machine-readable reports
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export Tier 2 patterns to a signed portable document
    Export {
        /// Which patterns to include: workspace, core, or all
        #[arg(short, long, default_value = "workspace")]
        scope: String,

        /// Minimum confidence to include (default: configured export floor)
        #[arg(short, long)]
        min_confidence: Option<f64>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a portable document into the local store
    Import {
        /// Path to the document to import
        path: PathBuf,

        /// Conflict strategy: auto, replace, or skip
        #[arg(short, long, default_value = "auto")]
        strategy: String,

        /// Run the full decision pipeline without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show store aggregates for both memory tiers
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Export {
            scope,
            min_confidence,
            output,
        } => cmd_export(&config, &scope, min_confidence, output.as_deref()),
        Commands::Import {
            path,
            strategy,
            dry_run,
        } => cmd_import(&config, &path, &strategy, dry_run, cli.json),
        Commands::Stats => cmd_stats(&config, cli.json),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngramConfig> {
    match path {
        Some(path) => EngramConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(EngramConfig::load_or_default(Path::new(CONFIG_FILE))?),
    }
}

fn open_graph(config: &EngramConfig) -> Result<KnowledgeGraph> {
    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data dir {}", config.data_dir.display()))?;
    KnowledgeGraph::open(&config.knowledge_db_path(), config.knowledge.clone())
        .context("failed to open the knowledge store")
}

/// Namespace for this invocation, named after the working directory.
fn workspace_namespace() -> Namespace {
    std::env::current_dir()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .and_then(|name| Namespace::parse(&name).ok())
        .unwrap_or_else(|| Namespace::Project("workspace".to_string()))
}

fn cmd_export(
    config: &EngramConfig,
    scope: &str,
    min_confidence: Option<f64>,
    output: Option<&Path>,
) -> Result<()> {
    let scope = ExportScope::parse(scope).map_err(|e| anyhow::anyhow!(e))?;
    let graph = open_graph(config)?;
    let document = export_patterns(&graph, scope, min_confidence, &config.transfer)?;
    let json = document.to_json()?;

    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Exported {} patterns to {}",
                document.manifest.pattern_count,
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_import(
    config: &EngramConfig,
    path: &Path,
    strategy: &str,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let strategy = ImportStrategy::parse(strategy).map_err(|e| anyhow::anyhow!(e))?;
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document = ExportDocument::from_json(&raw)?;
    info!(
        source = %document.source,
        patterns = document.manifest.pattern_count,
        "importing document"
    );

    let graph = open_graph(config)?;
    let report = import_document(&graph, &document, strategy, dry_run)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mode = if report.dry_run { " (dry run)" } else { "" };
    println!(
        "Import of {} entries{}: {} new, {} merged, {} replaced, {} skipped",
        report.total(),
        mode,
        report.new,
        report.merged,
        report.replaced,
        report.skipped
    );
    for audit in &report.audits {
        println!(
            "  {:<8} {}: {}",
            audit.decision.as_str(),
            audit.pattern_id,
            audit.reason
        );
    }
    Ok(())
}

fn cmd_stats(config: &EngramConfig, json: bool) -> Result<()> {
    let graph = open_graph(config)?;
    let knowledge = graph.stats()?;
    let working = WorkingMemory::open(
        &config.working_db_path(),
        config.working.clone(),
        workspace_namespace(),
    )
    .context("failed to open the working store")?
    .stats()?;

    if json {
        let combined = serde_json::json!({
            "working": working,
            "knowledge": knowledge,
        });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }

    println!("Working memory (Tier 1)");
    println!(
        "  conversations:  {} ({} strategic)",
        working.conversation_count, working.strategic_count
    );
    println!("  messages:       {}", working.message_count);
    match &working.active_conversation {
        Some(id) => println!("  active:         {id}"),
        None => println!("  active:         none"),
    }
    println!();
    println!("Knowledge graph (Tier 2)");
    println!(
        "  patterns:       {} ({} core)",
        knowledge.pattern_count, knowledge.core_count
    );
    println!("  avg confidence: {:.2}", knowledge.average_confidence);
    println!("  total accesses: {}", knowledge.total_accesses);
    for (namespace, count) in &knowledge.namespace_counts {
        println!("    {namespace}: {count}");
    }
    Ok(())
}

/// Initialize the global tracing subscriber.
///
/// Log lines go to stderr so `export` can own stdout for the document.
/// Respects `RUST_LOG`; falls back to the supplied level when unset.
/// Safe to call more than once; only the first call takes effect.
fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use engram_core::pattern::*;

    fn make_pattern(id: &str, title: &str, namespace: Namespace) -> Pattern {
        let payload = PatternPayload::Workflow(WorkflowContent {
            steps: vec![format!("step for {id}")],
            trigger: None,
            outcome: None,
        });
        let content_hash = Pattern::compute_content_hash(&payload).unwrap();
        Pattern {
            id: id.to_string(),
            kind: "workflow".to_string(),
            title: title.to_string(),
            description: payload.describe(),
            payload,
            confidence: Confidence::new(0.8),
            namespaces: vec![namespace],
            access_count: 0,
            last_accessed: Utc::now(),
            created_at: Utc::now(),
            content_hash,
        }
    }

    fn config_at(dir: &Path) -> EngramConfig {
        EngramConfig {
            data_dir: dir.to_path_buf(),
            ..EngramConfig::default()
        }
    }

    #[test]
    fn export_then_import_moves_patterns_between_stores() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let config_a = config_at(dir_a.path());
        let config_b = config_at(dir_b.path());

        let source = open_graph(&config_a).unwrap();
        source
            .put_pattern(&make_pattern(
                "p1",
                "retry on busy",
                Namespace::Project("alpha".into()),
            ))
            .unwrap();
        drop(source);

        let document_path = dir_a.path().join("export.json");
        cmd_export(&config_a, "workspace", None, Some(&document_path)).unwrap();
        cmd_import(&config_b, &document_path, "auto", false, false).unwrap();

        let target = open_graph(&config_b).unwrap();
        let patterns = target.list().unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].id, "p1");

        dir_a.close().unwrap();
        dir_b.close().unwrap();
    }

    #[test]
    fn import_dry_run_leaves_the_store_empty() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let config_a = config_at(dir_a.path());
        let config_b = config_at(dir_b.path());

        let source = open_graph(&config_a).unwrap();
        source
            .put_pattern(&make_pattern(
                "p1",
                "retry on busy",
                Namespace::Project("alpha".into()),
            ))
            .unwrap();
        drop(source);

        let document_path = dir_a.path().join("export.json");
        cmd_export(&config_a, "all", None, Some(&document_path)).unwrap();
        cmd_import(&config_b, &document_path, "auto", true, false).unwrap();

        let target = open_graph(&config_b).unwrap();
        assert!(target.list().unwrap().is_empty());

        dir_a.close().unwrap();
        dir_b.close().unwrap();
    }

    #[test]
    fn tampered_document_fails_the_import() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let config_a = config_at(dir_a.path());
        let config_b = config_at(dir_b.path());

        let source = open_graph(&config_a).unwrap();
        source
            .put_pattern(&make_pattern(
                "p1",
                "retry on busy",
                Namespace::Project("alpha".into()),
            ))
            .unwrap();
        drop(source);

        let document_path = dir_a.path().join("export.json");
        cmd_export(&config_a, "all", None, Some(&document_path)).unwrap();
        let raw = fs::read_to_string(&document_path).unwrap();
        fs::write(&document_path, raw.replace("retry on busy", "retry on idle")).unwrap();

        assert!(cmd_import(&config_b, &document_path, "auto", false, false).is_err());
        let target = open_graph(&config_b).unwrap();
        assert!(target.list().unwrap().is_empty());

        dir_a.close().unwrap();
        dir_b.close().unwrap();
    }

    #[test]
    fn unknown_scope_and_strategy_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(dir.path());

        assert!(cmd_export(&config, "everything", None, None).is_err());
        assert!(cmd_import(&config, Path::new("missing.json"), "merge", false, false).is_err());

        dir.close().unwrap();
    }

    #[test]
    fn stats_runs_on_fresh_stores() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(dir.path());

        cmd_stats(&config, false).unwrap();
        cmd_stats(&config, true).unwrap();

        dir.close().unwrap();
    }

    #[test]
    fn config_file_overrides_take_effect() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("engram.toml");
        fs::write(&config_path, "data_dir = \"/tmp/elsewhere\"\n").unwrap();

        let config = load_config(Some(&config_path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/elsewhere"));

        let missing = load_config(Some(&dir.path().join("absent.toml")));
        assert!(missing.is_err());

        dir.close().unwrap();
    }
}
