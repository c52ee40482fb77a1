//! Command line tool to classify sampled texts with the best recorded run

use anyhow::{anyhow, Result};
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use burn_textcnn::{
    datasets::{projects, Dataset},
    models::cnn,
    pipelines::text_classification::infer,
    tracking::{Objective, RunStore},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer DATASET [OPTIONS]

Arguments:
  DATASET              The dataset to sample texts from (e.g., 'projects')

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// The dataset to sample texts from
    dataset: String,

    /// The top-level data directory
    data_dir: Option<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = Arguments::from_env();

    let args = Args {
        help: pargs.contains(["-h", "--help"]),
        data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
        dataset: pargs.free_from_str()?,
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

    Dataset::try_from(args.dataset.as_str())?;

    let data_dir = args.data_dir.unwrap_or_else(|| "data".to_string());

    let store = RunStore::new(format!("{}/runs", data_dir));
    let run = store.best("test_loss", Objective::Minimize)?;
    let artifact_dir = store.run_dir(&run.run_id);

    log::info!("using run {}", run.run_id);

    let device = NdArrayDevice::default();

    let samples = projects::Dataset::get_samples(&data_dir).await?;
    let input: Vec<String> = samples.iter().map(|(text, _)| text.clone()).collect();

    // Get model predictions
    let (predictions, config) = infer::<Autodiff<NdArray>, cnn::Model<Autodiff<NdArray>>>(
        device,
        &artifact_dir,
        input,
    )?;

    // Print out predictions for each sample
    for (i, (text, expected)) in samples.into_iter().enumerate() {
        // Get predictions for current sample
        #[allow(clippy::single_range_in_vec_init)]
        let prediction = predictions.clone().slice([i..i + 1]);

        let class_indexes = prediction.argmax(1).into_data().convert::<i64>().value;

        let classes = class_indexes
            .into_iter()
            .map(|index| &config.id2label[&(index as usize)])
            .collect::<Vec<_>>();

        let class = classes.first().ok_or_else(|| anyhow!("empty prediction"))?;

        // Print sample text and predicted class name
        println!(
            "\n=== Item {i} ===\
             \n- Text: {text}\
             \n- Class: {class}\
             \n- Expected: {expected}\
             \n================"
        );
    }

    Ok(())
}
