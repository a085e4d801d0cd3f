//! CSA Bootstrap CLI
//!
//! The `csa` command derives draft control-system topologies from
//! engineering artifacts.
//!
//! ## Commands
//!
//! - `bootstrap`: derive a topology from an equipment list and an
//!   instrument I/O database
//! - `templates`: list the registered architecture templates
//! - `validate`: re-run structural validation on a topology document

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::Level;

use csa_core::bootstrap::{bootstrap, BootstrapOptions};
use csa_core::equipment::RawEquipmentList;
use csa_core::io::RawIoSignal;
use csa_core::suggestion::{Mode, Suggestion};
use csa_core::template::{PolicyOverrides, TemplateRegistry};
use csa_core::topology::Topology;
use csa_core::{init_tracing, validate_structure, CsaError};

#[derive(Parser)]
#[command(name = "csa")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CSA topology bootstrap from equipment and I/O lists", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a draft topology from an equipment list and instrument
    /// database
    Bootstrap {
        /// Equipment list file (JSON or YAML)
        #[arg(short, long)]
        equipment: PathBuf,

        /// Instrument I/O database file (JSON or YAML)
        #[arg(short, long)]
        io: PathBuf,

        /// Project name recorded on the topology
        #[arg(short, long)]
        project: String,

        /// Architecture template name
        #[arg(short, long, default_value = "centralized")]
        template: String,

        /// Template version
        #[arg(long, default_value = "1.0")]
        template_version: String,

        /// Validation mode: strict or lenient
        #[arg(short, long, default_value = "lenient")]
        mode: String,

        /// Template override file (JSON or YAML map)
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// Output format: yaml or json
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered architecture templates
    Templates {
        /// Output format: yaml or json
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Run structural validation on an existing topology document
    Validate {
        /// Topology file (JSON or YAML)
        #[arg(short, long)]
        topology: PathBuf,

        /// Validation mode: strict or lenient
        #[arg(short, long, default_value = "strict")]
        mode: String,
    },
}

/// Instrument database input: a bare signal list or a wrapped document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignalInput {
    List(Vec<RawIoSignal>),
    Wrapped { signals: Vec<RawIoSignal> },
}

impl SignalInput {
    fn into_signals(self) -> Vec<RawIoSignal> {
        match self {
            SignalInput::List(signals) => signals,
            SignalInput::Wrapped { signals } => signals,
        }
    }
}

fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    } else {
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }
}

fn render<T: serde::Serialize>(value: &T, format: &str) -> Result<String> {
    match format {
        "yaml" => serde_yaml::to_string(value).context("rendering YAML"),
        "json" => serde_json::to_string_pretty(value).context("rendering JSON"),
        other => bail!("unsupported format '{other}', expected yaml or json"),
    }
}

fn parse_mode(raw: &str) -> Result<Mode> {
    match raw {
        "strict" => Ok(Mode::Strict),
        "lenient" => Ok(Mode::Lenient),
        other => bail!("unsupported mode '{other}', expected strict or lenient"),
    }
}

fn print_suggestions(suggestions: &[Suggestion]) {
    for suggestion in suggestions {
        eprintln!(
            "[{:?}] {}: {}",
            suggestion.severity, suggestion.subject, suggestion.message
        );
        if let Some(resolution) = &suggestion.proposed_resolution {
            eprintln!("    -> {resolution}");
        }
    }
}

fn write_output(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Bootstrap {
            equipment,
            io,
            project,
            template,
            template_version,
            mode,
            overrides,
            format,
            output,
        } => {
            let mode = parse_mode(&mode)?;
            let equipment_list: RawEquipmentList = read_input(&equipment)?;
            let signals: SignalInput = read_input(&io)?;
            let policy_overrides: PolicyOverrides = match &overrides {
                Some(path) => read_input(path)?,
                None => PolicyOverrides::new(),
            };

            let registry = TemplateRegistry::builtin();
            let options = BootstrapOptions::new(project)
                .with_template(template, template_version)
                .with_mode(mode)
                .with_overrides(policy_overrides);

            let records = equipment_list.into_records();
            match bootstrap(&registry, &records, &signals.into_signals(), &options) {
                Ok(result) => {
                    print_suggestions(&result.suggestions);
                    let rendered = render(&result, &format)?;
                    write_output(&rendered, output.as_deref())?;
                    Ok(())
                }
                Err(CsaError::AllocationRejected { suggestions }) => {
                    print_suggestions(&suggestions);
                    bail!(
                        "strict bootstrap rejected with {} unresolved suggestion(s)",
                        suggestions.len()
                    );
                }
                Err(err) => Err(err.into()),
            }
        }

        Commands::Templates { format } => {
            let registry = TemplateRegistry::builtin();
            let rendered = render(&registry.list_templates(), &format)?;
            println!("{rendered}");
            Ok(())
        }

        Commands::Validate { topology, mode } => {
            let mode = parse_mode(&mode)?;
            let document: Topology = read_input(&topology)?;
            let findings = validate_structure(&document);

            if findings.is_empty() {
                println!("topology is structurally valid");
                return Ok(());
            }

            print_suggestions(&findings);
            if mode == Mode::Strict {
                bail!("structural validation failed with {} finding(s)", findings.len());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("strict").expect("strict"), Mode::Strict);
        assert_eq!(parse_mode("lenient").expect("lenient"), Mode::Lenient);
        assert!(parse_mode("loose").is_err());
    }

    #[test]
    fn test_read_yaml_equipment_list() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            "- tag: 200-B-01\n  feeder_type: VFD\n  control_responsibility: PLC"
        )
        .expect("write");

        let list: RawEquipmentList = read_input(file.path()).expect("read");
        let records = list.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag.as_deref(), Some("200-B-01"));
    }

    #[test]
    fn test_read_json_signals_wrapped() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("tempfile");
        write!(
            file,
            r#"{{"signals": [{{"equipment_tag": "200-B-01", "io_type": "DI", "count": 3}}]}}"#
        )
        .expect("write");

        let input: SignalInput = read_input(file.path()).expect("read");
        let signals = input.into_signals();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].count, 3);
    }

    #[test]
    fn test_render_formats() {
        let summary = TemplateRegistry::builtin().list_templates();
        assert!(render(&summary, "yaml").expect("yaml").contains("centralized"));
        assert!(render(&summary, "json").expect("json").contains("centralized"));
        assert!(render(&summary, "toml").is_err());
    }
}
