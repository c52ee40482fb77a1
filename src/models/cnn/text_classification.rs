//! Adapt the convolutional classifier to the text classification pipeline

use std::path::Path;

use burn::{
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::{backend::AutodiffBackend, Tensor},
};

use crate::pipelines::text_classification::{self, batcher};

use super::{Config, ConvOutputs, Model};

impl<B: AutodiffBackend> text_classification::Model<B> for Model<B> {
    type Config = Config;

    /// Initialize the model from its configuration
    fn init_with(device: &B::Device, config: Config) -> Self {
        config.init(device)
    }

    /// Defines forward pass for inference
    fn infer(&self, input: batcher::Infer<B>) -> Tensor<B, 2> {
        self.infer(input)
    }

    /// Save the auxiliary activation model derived from this classifier
    fn save_activation_model(&self, artifact_dir: &Path) -> anyhow::Result<()> {
        let conv_outputs = ConvOutputs::from_classifier(self);

        CompactRecorder::new()
            .record(conv_outputs.into_record(), artifact_dir.join("conv_outputs"))
            .map_err(|e| anyhow!("Unable to save activation model weights: {}", e))?;

        Ok(())
    }
}

impl text_classification::ModelConfig for Config {
    /// Return the Config needed for the text classification pipeline
    fn pipeline_config(&self) -> text_classification::Config {
        text_classification::Config {
            pad_token_id: self.pad_token_id,
            max_seq_length: self.max_seq_length,
            id2label: self.id2label.clone(),
            label2id: self.label2id.clone(),
        }
    }
}
