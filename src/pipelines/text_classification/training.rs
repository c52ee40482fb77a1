use std::path::Path;

use burn::{
    config::Config as _,
    data::{
        dataloader::DataLoaderBuilder,
        dataset::{transform::SamplerDataset, Dataset},
    },
    module::AutodiffModule,
    optim::AdamConfig,
    record::{CompactRecorder, Recorder},
    tensor::{backend::AutodiffBackend, ElementConversion},
    train::{
        metric::{AccuracyMetric, LearningRateMetric, LossMetric},
        ClassificationOutput, LearnerBuilder, ValidStep,
    },
};

use crate::{
    tokenizer::WordVocab,
    tracking::{Run, RunStore},
    utils::renderer,
};

use super::{batcher::Train, Batcher, Item, Model, ModelConfig, Training};

/// Define train function
pub async fn train<B, M, I, D>(
    devices: Vec<B::Device>, // Devices on which to perform computation (e.g., CPU or CUDA device)
    dataset_train: D,        // Training dataset
    dataset_test: D,         // Testing dataset
    model_config: M::Config, // Model configuration
    vocab: WordVocab,        // Vocabulary built from the training split
    config: Training,        // Experiment configuration
    use_tui: bool,           // Enable the terminal training dashboard
) -> anyhow::Result<Run>
where
    B: AutodiffBackend,
    M: Model<B>,
    I: Item + 'static,
    D: Dataset<I> + 'static,
    M::InnerModule: ValidStep<
        Train<<B as AutodiffBackend>::InnerBackend>,
        ClassificationOutput<<B as AutodiffBackend>::InnerBackend>,
    >,
{
    let device = &devices[0];

    let store = RunStore::new(format!("{}/runs", config.data_dir));
    let run_id = format!("{:016x}", rand::random::<u64>());
    let artifact_dir = store.run_dir(&run_id);

    std::fs::create_dir_all(&artifact_dir)?;

    let model = M::init_with(device, model_config.clone());

    // Initialize batchers for training and testing data
    let batcher_train = Batcher::<B>::new(
        vocab.clone(),
        model_config.pipeline_config(),
        device.clone(),
    );
    let batcher_test = Batcher::<B::InnerBackend>::new(
        vocab.clone(),
        model_config.pipeline_config(),
        device.clone(),
    );

    let workers = std::thread::available_parallelism()?;

    // Initialize data loaders for training and testing data
    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .num_workers(workers.into())
        .build(SamplerDataset::new(dataset_train, 10_000));

    let dataloader_test = DataLoaderBuilder::new(batcher_test)
        .batch_size(config.batch_size * 2)
        .num_workers(workers.into())
        .build(SamplerDataset::new(dataset_test, 1_000));

    // Initialize optimizer
    let optimizer = AdamConfig::new().with_epsilon(config.adam_epsilon).init();

    // Initialize learner
    let mut builder = LearnerBuilder::new(&artifact_dir)
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .metric_train_numeric(LearningRateMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(devices.clone())
        .num_epochs(config.num_epochs)
        .summary();

    if !use_tui {
        builder = builder.renderer(renderer::Simple::new());
    }

    let learner = builder.build(model, optimizer, config.learning_rate);

    // Train the model
    let model_trained = learner.fit(dataloader_train, dataloader_test.clone());

    // Save the configuration, the trained weights, the activation model, and
    // the vocabulary
    model_config
        .save(format!("{artifact_dir}/config.json"))
        .map_err(|e| anyhow!("Unable to save model config: {}", e))?;

    CompactRecorder::new()
        .record(
            model_trained.clone().into_record(),
            format!("{artifact_dir}/model").into(),
        )
        .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))?;

    model_trained.save_activation_model(Path::new(&artifact_dir))?;

    vocab.save(format!("{artifact_dir}/tokenizer.json"))?;

    // Evaluate the final model on the test split
    let model_valid = model_trained.valid();

    let mut total = 0usize;
    let mut correct = 0i64;
    let mut loss_sum = 0.0f64;

    for batch in dataloader_test.iter() {
        let batch_size = batch.targets.dims()[0];
        let output = model_valid.step(batch);

        let predictions = output.output.argmax(1).squeeze::<1>(1);
        let batch_correct: i64 = predictions
            .equal(output.targets)
            .int()
            .sum()
            .into_scalar()
            .elem();

        loss_sum += output.loss.into_scalar().elem::<f64>() * batch_size as f64;
        correct += batch_correct;
        total += batch_size;
    }

    let test_loss = loss_sum / total.max(1) as f64;
    let test_accuracy = correct as f64 / total.max(1) as f64;

    log::info!(
        "run {}: test_loss {:.4}, test_accuracy {:.4} over {} samples",
        run_id,
        test_loss,
        test_accuracy,
        total,
    );

    // Record the run beside its artifacts
    let mut run = Run::new(run_id, config.dataset_name.clone());

    run.log_param("batch_size", config.batch_size.to_string());
    run.log_param("num_epochs", config.num_epochs.to_string());
    run.log_param("learning_rate", config.learning_rate.to_string());

    run.log_metric("test_loss", test_loss);
    run.log_metric("test_accuracy", test_accuracy);

    for artifact in ["config.json", "model.mpk", "conv_outputs.mpk", "tokenizer.json"] {
        run.log_artifact(artifact);
    }

    run.complete();
    store.save(&run)?;

    Ok(run)
}
