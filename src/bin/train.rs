//! Command line tool to train the classifier on a dataset

use anyhow::anyhow;
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use burn_textcnn::{
    datasets::{projects, Dataset},
    models::cnn,
    pipelines::text_classification,
    tokenizer::WordVocab,
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train DATASET [OPTIONS]

Arguments:
  DATASET              The dataset to use (e.g., 'projects')

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  -l, --learning-rate  Learning rate, held constant over training
  --max-vocab          Cap the vocabulary at this many entries
  --min-frequency      Drop words seen fewer times than this in the corpus
  --max-seq-length     Fixed sequence length inputs are padded or truncated to
  --no-tui             Disable TUI
";

#[derive(Debug)]
struct Args {
    dataset: String,
    data_dir: Option<String>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    learning_rate: Option<f64>,
    max_vocab: Option<usize>,
    min_frequency: Option<usize>,
    max_seq_length: Option<usize>,
    use_tui: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            learning_rate: pargs.opt_value_from_str(["-l", "--learning-rate"])?,
            max_vocab: pargs.opt_value_from_str("--max-vocab")?,
            min_frequency: pargs.opt_value_from_str("--min-frequency")?,
            max_seq_length: pargs.opt_value_from_str("--max-seq-length")?,
            use_tui: !(pargs.contains("--no-tui")),
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATASET"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let output = Args::parse()?;

    if output.is_none() {
        print!("{}", HELP);

        return Ok(());
    }
    let args = output.unwrap();

    let dataset = Dataset::try_from(args.dataset.as_str())?;

    match dataset {
        Dataset::Projects => handle_projects(&args).await,
    }
}

async fn handle_projects(args: &Args) -> anyhow::Result<()> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| "data".to_string());

    let train = projects::Dataset::load(&data_dir, "train").await?;
    let test = projects::Dataset::load(&data_dir, "test").await?;

    let mut config = text_classification::Training::new(
        projects::DATASET.to_string(),
        train.labels.clone(),
    );
    config.data_dir = data_dir;

    if let Some(num_epochs) = args.num_epochs {
        config.num_epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }

    let vocab = WordVocab::build(
        &train.texts(),
        args.max_vocab,
        args.min_frequency.unwrap_or(1),
    )?;

    let mut model_config = cnn::Config::new_with_labels(vocab.vocab_size(), &train.labels);
    model_config.pad_token_id = vocab.pad_token_id();

    if let Some(max_seq_length) = args.max_seq_length {
        model_config.max_seq_length = max_seq_length;
    }

    let device = NdArrayDevice::default();

    let run = text_classification::train::<
        Autodiff<NdArray>,
        cnn::Model<Autodiff<NdArray>>,
        projects::Item,
        projects::Dataset,
    >(
        vec![device],
        train,
        test,
        model_config,
        vocab,
        config,
        args.use_tui,
    )
    .await?;

    log::info!(
        "run {} completed with test_loss {:.4}",
        run.run_id,
        run.metrics.get("test_loss").copied().unwrap_or(f64::NAN),
    );

    Ok(())
}
