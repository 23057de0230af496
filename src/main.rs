use argh::FromArgs;
use eck_fragmentation::analysis::constants::{
    DEFAULT_BASE_DIR, DEFAULT_BIN_WIDTH, DEFAULT_DATASET_IDS, DEFAULT_OUTPUT_FILE,
};
use eck_fragmentation::{run, Config, Dataset};
use log::{error, info};
use std::path::PathBuf;

/// Renders the cluster fragmentation sensitivity chart for the shuffled/random ECK datasets
#[derive(FromArgs, Debug)]
pub struct Args {
    /// directory containing the eck_<id> dataset folders (default: .)
    #[argh(option, short = 'b', default = "PathBuf::from(DEFAULT_BASE_DIR)")]
    base_dir: PathBuf,

    /// dataset id to load; repeat for several (default: 1 2 3 4 5)
    #[argh(option, short = 'd')]
    dataset: Vec<String>,

    /// output PDF path (default: eckFragmentationShuffledRandomSensitivity.pdf)
    #[argh(option, short = 'o', default = "PathBuf::from(DEFAULT_OUTPUT_FILE)")]
    output: PathBuf,

    /// width of an inflation bin (default: 0.1)
    #[argh(option, short = 'w', default = "DEFAULT_BIN_WIDTH")]
    bin_width: f64,

    /// also write a text summary of cluster counts per bucket to this path
    #[argh(option)]
    summary: Option<PathBuf>,

    /// also write per-(metric, inflation) cluster totals as JSON to this path
    #[argh(option)]
    totals_json: Option<PathBuf>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let ids: Vec<String> = if args.dataset.is_empty() {
            DEFAULT_DATASET_IDS.iter().map(|id| id.to_string()).collect()
        } else {
            args.dataset
        };

        Config {
            base_dir: args.base_dir,
            datasets: ids.into_iter().map(Dataset::new).collect(),
            output: args.output,
            bin_width: args.bin_width,
            summary: args.summary,
            totals_json: args.totals_json,
        }
    }
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Args = argh::from_env();
    let config = Config::from(args);

    match run(&config) {
        Ok(summary) => info!(
            "Rendered {} rows into {}",
            summary.rows,
            summary.output.display()
        ),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
