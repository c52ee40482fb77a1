//! Command line tool to serve the best recorded run over HTTP

use anyhow::Result;
use burn_textcnn::{
    server::{self, ServerConfig},
    tracking::Objective,
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: serve [OPTIONS]

Options:
  -h, --help           Print help
  -a, --address        The address to bind (defaults to '127.0.0.1:5000')
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  --metric             The metric used to select the run to serve (defaults to 'test_loss')
  --objective          'minimize' or 'maximize' (defaults to 'minimize')
  --dashboard-url      Where the /experiments endpoint redirects to
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// The address to bind
    address: Option<String>,

    /// The top-level data directory
    data_dir: Option<String>,

    /// The run-selection metric
    metric: Option<String>,

    /// The run-selection objective
    objective: Option<String>,

    /// The experiment dashboard URL
    dashboard_url: Option<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = Arguments::from_env();

    let args = Args {
        help: pargs.contains(["-h", "--help"]),
        address: pargs.opt_value_from_str(["-a", "--address"])?,
        data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
        metric: pargs.opt_value_from_str("--metric")?,
        objective: pargs.opt_value_from_str("--objective")?,
        dashboard_url: pargs.opt_value_from_str("--dashboard-url")?,
    };

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args()?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    let mut config = ServerConfig::default();

    if let Some(address) = args.address {
        config.address = address.parse()?;
    }

    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    if let Some(metric) = args.metric {
        config.metric = metric;
    }

    if let Some(objective) = args.objective.as_deref() {
        config.objective = Objective::try_from(objective)?;
    }

    if let Some(dashboard_url) = args.dashboard_url {
        config.dashboard_url = dashboard_url;
    }

    server::run(config).await
}
