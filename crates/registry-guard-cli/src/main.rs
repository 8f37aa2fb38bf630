use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use registry_guard_core::{
    catalog, evaluate, AuditTrail, AuditTrailBuilder, ExtractedRecord, GuardrailReport,
    GuardrailVerdict, SourceMap, StagingConfirmation,
};
use registry_guard_runtime::{Pipeline, RuntimeConfig};

/// Exit code when any field requires manual action.
const EXIT_ACTION_REQUIRED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "registry-guard",
    version,
    about = "Audit trails and guardrail checks for abstracted registry fields"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the audit trail for an extracted record
    Audit {
        record: PathBuf,

        /// YAML/JSON map of section name to source-document category
        #[arg(long)]
        sources: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Apply the guardrails to an extracted record
    Check {
        record: PathBuf,

        #[arg(long)]
        sources: Option<PathBuf>,

        #[command(flatten)]
        staging: StagingArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print only the counts digest
        #[arg(long, default_value_t = false)]
        digest: bool,
    },

    /// Run the full pipeline for one patient
    Run {
        patient_id: String,

        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        staging: StagingArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the field catalog
    Fields {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct StagingArgs {
    /// Imaging confirms the stage group
    #[arg(long, default_value_t = false)]
    imaging_confirmed: bool,

    /// A physician note documents the stage group
    #[arg(long, default_value_t = false)]
    note_confirmed: bool,
}

impl From<StagingArgs> for StagingConfirmation {
    fn from(args: StagingArgs) -> Self {
        StagingConfirmation::new(args.imaging_confirmed, args.note_confirmed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Audit {
            record,
            sources,
            format,
        } => {
            let record = load_record(&record)?;
            let trail = AuditTrailBuilder::with_sources(load_sources(sources.as_deref())?)
                .build(&record)
                .context("failed to build audit trail")?;

            match format {
                OutputFormat::Json => print_json(&trail)?,
                OutputFormat::Text => print!("{}", render_audit(&record.patient_id, &trail)),
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Check {
            record,
            sources,
            staging,
            format,
            digest,
        } => {
            let record = load_record(&record)?;
            let evaluation = evaluate(
                &record,
                load_sources(sources.as_deref())?,
                staging.into(),
            )
            .context("guardrail evaluation failed")?;
            let report = evaluation.report;

            match (format, digest) {
                (OutputFormat::Json, true) => print_json(&report.digest())?,
                (OutputFormat::Json, false) => print_json(&report)?,
                (OutputFormat::Text, true) => {
                    let d = report.digest();
                    println!(
                        "safe to populate: {}  needing review: {}  action required: {}",
                        d.fields_safe_to_populate, d.fields_needing_review, d.action_required
                    );
                }
                (OutputFormat::Text, false) => print!("{}", render_report(&report)),
            }

            Ok(exit_for(&report))
        }

        Commands::Run {
            patient_id,
            config,
            staging,
            format,
        } => {
            let config = match config {
                Some(path) => RuntimeConfig::from_yaml_file(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => RuntimeConfig::default(),
            };

            tracing::info!(patient_id = %patient_id, extractor = ?config.extraction.kind, "Running pipeline");
            let pipeline = Pipeline::from_config(config)?;
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            let outcome = runtime.block_on(pipeline.run(&patient_id, staging.into()))?;

            match format {
                OutputFormat::Json => print_json(&outcome)?,
                OutputFormat::Text => {
                    println!(
                        "{} ({:?}): {} populated, completion {}",
                        outcome.patient_id,
                        outcome.mode,
                        outcome.completion.populated_count,
                        outcome.completion.completion_rate
                    );
                    println!("audit log: {}", outcome.audit_file.display());
                    print!("{}", render_report(&outcome.report));
                }
            }

            Ok(exit_for(&outcome.report))
        }

        Commands::Fields { format } => {
            match format {
                OutputFormat::Json => {
                    let fields: Vec<_> = catalog::fields()
                        .iter()
                        .map(|spec| {
                            serde_json::json!({
                                "fieldKey": spec.key,
                                "ruleReference": spec.rule_reference(),
                                "guardrail": spec.guardrail.name(),
                                "mandatoryReview": spec.mandatory_review,
                                "emptyBeatsWrong": spec.empty_beats_wrong,
                            })
                        })
                        .collect();
                    print_json(&fields)?;
                }
                OutputFormat::Text => print!("{}", render_fields()),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_for(report: &GuardrailReport) -> ExitCode {
    ExitCode::from(exit_status(report))
}

fn exit_status(report: &GuardrailReport) -> u8 {
    if report.digest().action_required {
        EXIT_ACTION_REQUIRED
    } else {
        0
    }
}

/// Records ending in `.yaml`/`.yml` are YAML, anything else JSON.
fn load_record(path: &Path) -> Result<ExtractedRecord> {
    let record = if is_yaml(path) {
        ExtractedRecord::from_yaml_file(path)
    } else {
        ExtractedRecord::from_json_file(path)
    };
    record.with_context(|| format!("failed to load record {}", path.display()))
}

fn load_sources(path: Option<&Path>) -> Result<SourceMap> {
    match path {
        Some(path) => SourceMap::from_file(path)
            .with_context(|| format!("failed to load sources {}", path.display())),
        None => Ok(SourceMap::canonical()),
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn display_value(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn render_audit(patient_id: &str, trail: &AuditTrail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Audit trail for {}", patient_id);

    for entry in &trail.entries {
        let _ = writeln!(
            out,
            "  {:<32} {:<9} {:<40} [{}]",
            entry.field_key,
            if entry.is_populated() { "POPULATED" } else { "EMPTY" },
            display_value(entry.value.as_deref()),
            entry.rule_reference
        );
    }

    let s = &trail.summary;
    let _ = writeln!(
        out,
        "{} of {} fields populated ({})",
        s.populated_count, s.total_fields, s.completion_rate
    );
    out
}

fn render_verdicts(out: &mut String, title: &str, verdicts: &[GuardrailVerdict]) {
    if verdicts.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({}):", title, verdicts.len());
    for verdict in verdicts {
        let _ = writeln!(
            out,
            "  {:<32} {:<40} {}",
            verdict.field_key,
            display_value(verdict.value.as_deref()),
            verdict.reason
        );
    }
}

fn render_report(report: &GuardrailReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Guardrail report for {}", report.patient_id);

    render_verdicts(&mut out, "REJECTED", &report.rejected);
    render_verdicts(&mut out, "HUMAN REVIEW", &report.human_review_required);

    let s = &report.summary;
    let _ = writeln!(
        out,
        "{} checked: {} approved, {} rejected, {} for review; {} safe to auto-populate",
        s.total_checked, s.approved, s.rejected, s.human_review_required, s.safe_to_auto_populate
    );
    out
}

fn render_fields() -> String {
    let mut out = String::new();
    for spec in catalog::fields() {
        let mut flags = Vec::new();
        if spec.mandatory_review {
            flags.push("review");
        }
        if spec.empty_beats_wrong {
            flags.push("empty-beats-wrong");
        }
        let _ = writeln!(
            out,
            "{:<32} {:<24} {} {}",
            spec.key,
            spec.guardrail.name(),
            spec.rule_reference(),
            if flags.is_empty() { String::new() } else { format!("({})", flags.join(", ")) }
        );
    }
    out
}
