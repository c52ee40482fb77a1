/// The model configuration
pub mod config;

/// The classifier model
pub mod model;

/// The auxiliary activation model
pub mod conv_outputs;

/// Training routine
pub mod train;

/// Adapt the classifier to the text classification pipeline
pub mod text_classification;

pub use config::Config;
pub use conv_outputs::ConvOutputs;
pub use model::Model;
