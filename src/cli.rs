//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::config_validation::{
    optional_number, optional_string, require_number, require_string, validate_rules_config,
    EVALUATION_SECTION, INDICATOR_PREFIX, SIGNAL_PREFIX,
};
use crate::domain::error::SignalbookError;
use crate::domain::evaluator::{SignalEvaluator, SignalReport};
use crate::domain::frame::PriceFrame;
use crate::domain::indicator::apply_indicator;
use crate::domain::indicator::lr_proj::LinearRegressionProjection;
use crate::domain::registry::{SignalLookup, SignalRegistry, ThresholdParams};
use crate::domain::signal_rule::SignalRule;
use crate::logging::init_logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "signalbook", about = "Evaluate trading signal rules over indicator tables")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate every rule against a price/indicator table
    Evaluate {
        #[arg(short, long)]
        rules: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
        /// Only report each symbol's most recent row
        #[arg(long)]
        latest: bool,
    },
    /// Validate a rules file
    Validate {
        #[arg(short, long)]
        rules: PathBuf,
    },
    /// Show one registered rule, or all of them
    Show {
        #[arg(short, long)]
        rules: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose, cli.log_json);

    let result = match cli.command {
        Command::Evaluate {
            rules,
            data,
            output,
            format,
            latest,
        } => run_evaluate(&rules, &data, output.as_deref(), format, latest),
        Command::Validate { rules } => run_validate(&rules),
        Command::Show { rules, name, json } => run_show(&rules, name.as_deref(), json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SignalbookError> {
    FileConfigAdapter::from_file(path).map_err(|e| SignalbookError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Build the registry from `[signal.*]` sections in file order.
pub fn build_registry(config: &dyn ConfigPort) -> Result<SignalRegistry, SignalbookError> {
    let mut registry = SignalRegistry::new();
    for section in config.sections() {
        let Some(name) = section.strip_prefix(SIGNAL_PREFIX) else {
            continue;
        };
        match require_string(config, &section, "type")?.as_str() {
            "threshold" => {
                let buy_operator = require_string(config, &section, "buy_operator")?;
                let sell_operator = require_string(config, &section, "sell_operator")?;
                let buy_max_operator = optional_string(config, &section, "buy_max_operator");
                let sell_max_operator = optional_string(config, &section, "sell_max_operator");
                let params = ThresholdParams {
                    buy: require_number(config, &section, "buy")?,
                    sell: require_number(config, &section, "sell")?,
                    buy_operator: &buy_operator,
                    sell_operator: &sell_operator,
                    buy_max: optional_number(config, &section, "buy_max")?,
                    sell_max: optional_number(config, &section, "sell_max")?,
                    buy_max_operator: buy_max_operator.as_deref(),
                    sell_max_operator: sell_max_operator.as_deref(),
                };
                registry.register_threshold(name, params)?;
            }
            "comparison" => {
                let key = registry.register_comparison(
                    &require_string(config, &section, "indicator_a")?,
                    &require_string(config, &section, "indicator_b")?,
                    &require_string(config, &section, "buy_operator")?,
                    &require_string(config, &section, "sell_operator")?,
                )?;
                if key != name {
                    info!(
                        section = %section,
                        key = %key,
                        "comparison rule registered under derived key"
                    );
                }
            }
            other => {
                return Err(SignalbookError::ConfigInvalid {
                    section: section.clone(),
                    key: "type".into(),
                    reason: format!("unknown signal type '{other}'"),
                });
            }
        }
    }
    Ok(registry)
}

/// Build computed columns from `[indicator.*]` sections in file order.
pub fn build_indicators(
    config: &dyn ConfigPort,
) -> Result<Vec<LinearRegressionProjection>, SignalbookError> {
    let mut indicators = Vec::new();
    for section in config.sections() {
        let Some(name) = section.strip_prefix(INDICATOR_PREFIX) else {
            continue;
        };
        let period_str = require_string(config, &section, "period")?;
        let period = period_str
            .parse::<usize>()
            .map_err(|_| SignalbookError::ConfigInvalid {
                section: section.clone(),
                key: "period".into(),
                reason: format!("expected an integer, got '{period_str}'"),
            })?;
        let source = optional_string(config, &section, "source").unwrap_or_else(|| "close".into());
        indicators.push(LinearRegressionProjection::new(name, source, period)?);
    }
    Ok(indicators)
}

/// Compute configured indicators into `frame`, then evaluate every rule.
pub fn evaluate_with_config(
    config: &dyn ConfigPort,
    frame: &mut PriceFrame,
) -> Result<SignalReport, SignalbookError> {
    validate_rules_config(config)?;
    let registry = build_registry(config)?;
    for indicator in build_indicators(config)? {
        apply_indicator(frame, &indicator)?;
    }
    if registry.is_empty() {
        warn!("no [signal.*] sections configured");
    }
    Ok(SignalEvaluator::new(&registry).evaluate(&*frame))
}

fn run_evaluate(
    rules_path: &Path,
    data_path: &Path,
    output_path: Option<&Path>,
    format: ReportFormat,
    latest_flag: bool,
) -> Result<(), SignalbookError> {
    info!(path = %rules_path.display(), "loading rules");
    let config = load_config(rules_path)?;

    let table = CsvAdapter::new(data_path);
    info!(path = %table.path().display(), "loading table");
    let mut frame = table.load()?;
    info!(symbols = frame.groups().len(), rows = frame.row_count(), "table loaded");

    let report = evaluate_with_config(&config, &mut frame)?;
    let contradictory = report
        .symbols
        .iter()
        .flat_map(|s| s.states.iter().flatten())
        .filter(|state| state.is_contradictory())
        .count();
    if contradictory > 0 {
        warn!(count = contradictory, "rows where buy and sell both fired");
    }

    let latest_only = latest_flag || config.get_bool(EVALUATION_SECTION, "latest_only", false);
    let writer: &dyn ReportPort = match format {
        ReportFormat::Csv => &CsvReportAdapter,
        ReportFormat::Json => &JsonReportAdapter,
    };

    match output_path {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            writer.write(&report, latest_only, &mut out)?;
            out.flush()?;
            info!(path = %path.display(), "verdicts written");
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            writer.write(&report, latest_only, &mut out)?;
        }
    }
    Ok(())
}

fn run_validate(rules_path: &Path) -> Result<(), SignalbookError> {
    let config = load_config(rules_path)?;
    validate_rules_config(&config)?;
    let registry = build_registry(&config)?;
    let indicators = build_indicators(&config)?;
    println!(
        "{}: {} signal rule(s), {} indicator(s) OK",
        rules_path.display(),
        registry.len(),
        indicators.len()
    );
    Ok(())
}

fn run_show(rules_path: &Path, name: Option<&str>, json: bool) -> Result<(), SignalbookError> {
    let config = load_config(rules_path)?;
    validate_rules_config(&config)?;
    let registry = build_registry(&config)?;

    let lookup = registry
        .get_signal(name)
        .ok_or_else(|| SignalbookError::UnknownRule {
            name: name.unwrap_or_default().to_string(),
        })?;
    println!("{}", render_lookup(&lookup, json)?);
    Ok(())
}

/// One registry entry in `show --json` output, in registration order.
#[derive(Serialize)]
struct KeyedRule<'a> {
    key: &'a str,
    rule: &'a SignalRule,
}

pub fn render_lookup(lookup: &SignalLookup<'_>, json: bool) -> Result<String, SignalbookError> {
    if json {
        let text = match lookup {
            SignalLookup::One(rule) => serde_json::to_string_pretty(rule)?,
            SignalLookup::All(all) => {
                let rules: Vec<KeyedRule<'_>> =
                    all.iter().map(|&(key, rule)| KeyedRule { key, rule }).collect();
                serde_json::to_string_pretty(&rules)?
            }
        };
        return Ok(text);
    }
    let lines: Vec<String> = match lookup {
        SignalLookup::One(rule) => vec![format!("{:<10} {}", rule.kind(), rule)],
        SignalLookup::All(all) => all
            .iter()
            .map(|(key, rule)| format!("{:<24} {:<10} {}", key, rule.kind(), rule))
            .collect(),
    };
    Ok(lines.join("\n"))
}
