use std::{
    sync::Arc,
    time::Instant,
};

use burn::{
    backend::{ndarray::NdArrayDevice, NdArray},
    config::Config as _,
    data::dataloader::batcher::Batcher as BatcherTrait,
    module::Module,
    record::{CompactRecorder, Recorder},
};

use crate::{
    models::cnn,
    pipelines::text_classification::{batcher, Batcher, ModelConfig},
    tokenizer::WordVocab,
    tracking::Run,
};

use super::{ActivationMap, Prediction, ServerConfig};

/// The backend predictions are served on
pub type ServeBackend = NdArray;

/// The artifacts of a trained run, loaded once and shared across requests
pub struct Components {
    /// The model configuration of the run
    pub config: cnn::Config,

    /// The trained classifier
    pub model: cnn::Model<ServeBackend>,

    /// The activation model, loaded from its own record
    pub conv_outputs: cnn::ConvOutputs<ServeBackend>,

    /// Batcher reusing the run's vocabulary
    pub batcher: Batcher<ServeBackend>,
}

impl Components {
    /// Load every artifact of a run directory
    pub fn load(artifact_dir: &str) -> anyhow::Result<Self> {
        let device = NdArrayDevice::default();

        let config = cnn::Config::load(format!("{artifact_dir}/config.json").as_str())
            .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

        let vocab = WordVocab::from_file(format!("{artifact_dir}/tokenizer.json"))?;

        let record = CompactRecorder::new()
            .load(format!("{artifact_dir}/model").into(), &device)
            .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;
        let model = config.init::<ServeBackend>(&device).load_record(record);

        let record = CompactRecorder::new()
            .load(format!("{artifact_dir}/conv_outputs").into(), &device)
            .map_err(|e| anyhow!("Unable to load activation model weights: {}", e))?;
        let conv_outputs = config
            .init_conv_outputs::<ServeBackend>(&device)
            .load_record(record);

        let batcher = Batcher::new(vocab, config.pipeline_config(), device);

        Ok(Self {
            config,
            model,
            conv_outputs,
            batcher,
        })
    }

    /// Classify a batch of texts, optionally extracting activation maps
    pub fn predict(&self, texts: Vec<String>, include_activations: bool) -> Vec<Prediction> {
        let batch: batcher::Infer<ServeBackend> = self.batcher.batch(texts.clone());

        let probabilities = self.model.infer(batch.clone());
        let [batch_size, n_classes] = probabilities.dims();
        let scores: Vec<f32> = probabilities.into_data().convert::<f32>().value;

        // Activation maps are only materialized on demand
        let maps = include_activations.then(|| {
            self.conv_outputs
                .forward(batch.tokens)
                .into_iter()
                .map(|map| {
                    let [_, num_filters, seq_length] = map.dims();
                    let values = map.into_data().convert::<f32>().value;

                    (num_filters, seq_length, values)
                })
                .collect::<Vec<_>>()
        });

        let mut predictions = Vec::with_capacity(batch_size);

        for (i, text) in texts.into_iter().enumerate() {
            let row = &scores[i * n_classes..(i + 1) * n_classes];

            let winner = row
                .iter()
                .enumerate()
                .fold(
                    (0, f32::NEG_INFINITY),
                    |best, (id, p)| if *p > best.1 { (id, *p) } else { best },
                )
                .0;

            let label = self
                .config
                .id2label
                .get(&winner)
                .cloned()
                .unwrap_or_default();

            let probabilities = self
                .config
                .id2label
                .iter()
                .map(|(id, label)| (label.clone(), row.get(*id).copied().unwrap_or(0.0)))
                .collect();

            let tokens = include_activations.then(|| {
                let mut tokens = self.batcher.vocab.tokens(&text).unwrap_or_default();
                tokens.truncate(self.batcher.max_seq_length);
                tokens
            });

            let activations = maps.as_ref().map(|maps| {
                let token_count = tokens.as_ref().map(Vec::len).unwrap_or(0);

                maps.iter()
                    .enumerate()
                    .map(|(w, (num_filters, seq_length, values))| {
                        let filters = (0..*num_filters)
                            .map(|f| {
                                let start = (i * num_filters + f) * seq_length;

                                values[start..start + token_count.min(*seq_length)].to_vec()
                            })
                            .collect();

                        ActivationMap {
                            filter_width: self.config.filter_sizes.get(w).copied().unwrap_or(0),
                            filters,
                        }
                    })
                    .collect()
            });

            predictions.push(Prediction {
                text,
                label,
                probabilities,
                tokens,
                activations,
            });
        }

        predictions
    }
}

/// Shared state for the prediction server
#[derive(Clone)]
pub struct AppState {
    /// The run whose artifacts are loaded
    pub run: Arc<Run>,

    /// Loaded model components
    pub components: Arc<Components>,

    /// Server configuration
    pub config: ServerConfig,

    /// Server start time, for uptime reporting
    started: Instant,
}

impl AppState {
    /// Create the shared state for a loaded run
    pub fn new(run: Run, components: Components, config: ServerConfig) -> Self {
        Self {
            run: Arc::new(run),
            components: Arc::new(components),
            config,
            started: Instant::now(),
        }
    }

    /// Seconds since the server started
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Whether an experiment id refers to the loaded run
    pub fn serves(&self, experiment_id: &str) -> bool {
        experiment_id == "latest" || experiment_id == self.run.run_id
    }
}
