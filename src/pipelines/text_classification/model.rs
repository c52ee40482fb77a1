use std::{fmt::Display, path::Path};

use burn::{
    module::AutodiffModule,
    tensor::{backend::AutodiffBackend, Tensor},
    train::{ClassificationOutput, TrainStep},
};

use super::{batcher, config};

/// A trait for models that can be used for Text Classification
pub trait Model<B>:
    AutodiffModule<B> + TrainStep<batcher::Train<B>, ClassificationOutput<B>> + Display + 'static
where
    B: AutodiffBackend,
{
    /// The model configuration
    type Config: ModelConfig;

    /// Initialize the model from its configuration
    fn init_with(device: &B::Device, config: Self::Config) -> Self;

    /// Defines forward pass for inference
    fn infer(&self, input: batcher::Infer<B>) -> Tensor<B, 2>;

    /// Save the auxiliary activation model derived from this classifier
    /// beside the other run artifacts
    fn save_activation_model(&self, artifact_dir: &Path) -> anyhow::Result<()>;
}

/// A trait for configs that can be used for Text Classification models
pub trait ModelConfig: burn::config::Config + Clone {
    /// Return the Config needed for the text classification pipeline
    fn pipeline_config(&self) -> config::Config;
}
