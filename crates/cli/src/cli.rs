use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use saltmatch_core::{ComponentType, MatchConfig};

/// Match salted reconstruction output to simulated reconstruction output
/// through the simulation truth.
#[derive(Parser, Debug)]
#[command(name = "saltmatch", version, about)]
pub struct CliArgs {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Match salted events to simulated events
    Events(InputArgs),
    /// Match salted peaks of one component to simulated peaks
    Peaks(PeakArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Truth table (Parquet)
    #[arg(long, env = "SALTMATCH_TRUTH")]
    pub truth: PathBuf,

    /// Truth-to-simulated match table (Parquet)
    #[arg(long = "match", env = "SALTMATCH_MATCH")]
    pub matches: PathBuf,

    /// Simulated reconstruction (Parquet)
    #[arg(long, env = "SALTMATCH_SIMU")]
    pub simu: PathBuf,

    /// Salted reconstruction (Parquet)
    #[arg(long, env = "SALTMATCH_SALT")]
    pub salt: PathBuf,

    /// Output directory (overrides OUTPUT_DIR)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Accept truth tables whose event numbers have gaps
    #[arg(long)]
    pub allow_gaps: bool,
}

#[derive(Args, Debug)]
pub struct PeakArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Peak component: s1, s2 or a numeric type code
    #[arg(long, value_parser = parse_component)]
    pub component: Option<ComponentType>,

    /// Truth rows considered before filtering
    #[arg(long)]
    pub max_truth_rows: Option<usize>,

    /// Overlap tolerance in time units
    #[arg(long)]
    pub safeguard: Option<i64>,

    /// Salted S2 peaks at or below this area are dropped as pile-up
    #[arg(long)]
    pub pileup_area: Option<f64>,
}

fn parse_component(raw: &str) -> Result<ComponentType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "s1" => Ok(ComponentType::S1),
        "s2" => Ok(ComponentType::S2),
        other => other
            .parse::<i64>()
            .map(ComponentType::from_code)
            .map_err(|_| format!("unknown component '{raw}', expected s1, s2 or a type code")),
    }
}

impl InputArgs {
    fn apply(&self, config: &mut MatchConfig) {
        if let Some(dir) = &self.out_dir {
            config.output.dir = dir.clone();
        }
        if self.allow_gaps {
            config.ingest.require_dense_events = false;
        }
    }
}

impl CliArgs {
    /// Resolve the config from the environment and apply flag overrides.
    pub fn resolve_config(&self) -> MatchConfig {
        let mut config = match &self.profile {
            Some(profile) => MatchConfig::for_profile(profile),
            None => MatchConfig::from_env(),
        };
        match &self.command {
            Command::Events(inputs) => inputs.apply(&mut config),
            Command::Peaks(args) => {
                args.inputs.apply(&mut config);
                if let Some(component) = args.component {
                    config.peaks.component = component;
                }
                if let Some(rows) = args.max_truth_rows {
                    config.peaks.max_truth_rows = rows;
                }
                if let Some(safeguard) = args.safeguard {
                    config.peaks.safeguard = safeguard;
                }
                if let Some(area) = args.pileup_area {
                    config.peaks.pileup_area_threshold = area;
                }
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUTS: [&str; 8] = [
        "--truth",
        "t.parquet",
        "--match",
        "m.parquet",
        "--simu",
        "s.parquet",
        "--salt",
        "x.parquet",
    ];

    #[test]
    fn component_names_and_codes() {
        assert_eq!(parse_component("S1").unwrap(), ComponentType::S1);
        assert_eq!(parse_component("s2").unwrap(), ComponentType::S2);
        assert_eq!(parse_component("0").unwrap(), ComponentType::Other(0));
        assert!(parse_component("s3").is_err());
    }

    #[test]
    fn peak_flags_override_config() {
        let mut argv = vec!["saltmatch", "--profile", "clitest", "peaks"];
        argv.extend(INPUTS);
        argv.extend(["--component", "s1", "--safeguard", "250"]);
        argv.extend(["--out-dir", "out", "--allow-gaps"]);

        let args = CliArgs::try_parse_from(argv).unwrap();
        let config = args.resolve_config();
        assert_eq!(config.peaks.component, ComponentType::S1);
        assert_eq!(config.peaks.safeguard, 250);
        assert_eq!(config.peaks.max_truth_rows, 10_000);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert!(!config.ingest.require_dense_events);
    }

    #[test]
    fn events_requires_all_inputs() {
        let args = CliArgs::try_parse_from(["saltmatch", "events", "--truth", "t.parquet"]);
        assert!(args.is_err());

        let mut argv = vec!["saltmatch", "events"];
        argv.extend(INPUTS);
        let args = CliArgs::try_parse_from(argv).unwrap();
        match args.command {
            Command::Events(inputs) => assert_eq!(inputs.matches, PathBuf::from("m.parquet")),
            Command::Peaks(_) => panic!("expected events"),
        }
    }
}
