use std::collections::BTreeMap;

use burn::LearningRate;

/// The common model configuration properties needed for the pipeline
pub struct Config {
    /// The padding token ID
    pub pad_token_id: usize,

    /// Fixed sequence length inputs are padded or truncated to
    pub max_seq_length: usize,

    /// A mapping from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,

    /// A mapping from class name labels to class ids
    pub label2id: BTreeMap<String, usize>,
}

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct Training {
    /// Batch size
    #[config(default = 32)]
    pub batch_size: usize,

    /// Number of epochs
    #[config(default = 10)]
    pub num_epochs: usize,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,

    /// Learning rate, held constant over training
    #[config(default = 1e-3)]
    pub learning_rate: LearningRate,

    /// The location of the top-level data directory
    #[config(default = "\"data\".to_string()")]
    pub data_dir: String,

    /// The dataset to train on (e.g., "projects")
    pub dataset_name: String,

    /// Class labels for the selected dataset
    pub labels: Vec<String>,
}
