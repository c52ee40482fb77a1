use burn::{
    config::Config as _,
    data::dataloader::batcher::Batcher as BatcherTrait,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::{backend::AutodiffBackend, Tensor},
};

use crate::tokenizer::WordVocab;

use super::{Batcher, Model, ModelConfig};

/// Define inference function
pub fn infer<B, M>(
    device: B::Device,    // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: &str,   // Directory containing model and config files
    samples: Vec<String>, // Text samples for inference
) -> anyhow::Result<(Tensor<B, 2>, M::Config)>
where
    B: AutodiffBackend,
    M: Model<B>,
{
    // Load experiment configuration
    let config = M::Config::load(format!("{artifact_dir}/config.json").as_str())
        .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

    // Load the vocabulary saved during training
    let vocab = WordVocab::from_file(format!("{artifact_dir}/tokenizer.json"))?;

    // Initialize batcher for batching samples
    let batcher = Batcher::<B>::new(vocab, config.pipeline_config(), device.clone());

    // Load trained model weights
    let record = CompactRecorder::new()
        .load(format!("{artifact_dir}/model").into(), &device)
        .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

    // Create model using loaded weights
    let model = M::init_with(&device, config.clone()).load_record(record);

    // Run inference on the given text samples
    let item = batcher.batch(samples);

    Ok((model.infer(item), config))
}
