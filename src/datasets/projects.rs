use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pipelines::text_classification;

/// The name of the projects dataset
pub static DATASET: &str = "projects";

/// A text snippet paired with its topic label
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// The text for classification
    pub text: String,

    /// The topic label of the text
    pub label: String,
}

impl text_classification::Item for Item {
    fn input(&self) -> &str {
        &self.text
    }

    fn class_label(&self) -> &str {
        &self.label
    }
}

/// Struct for the projects dataset
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,

    /// The distinct labels of the split, sorted
    pub labels: Vec<String>,
}

/// Implement the Dataset trait for the projects dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

// Implement methods for constructing the projects dataset
impl Dataset {
    /// Constructs the dataset for a mode (either "train" or "test")
    pub async fn load(data_dir: &str, mode: &str) -> std::io::Result<Self> {
        let dataset_dir = format!("{}/datasets/{}", data_dir, DATASET);
        let reader = csv::ReaderBuilder::new();

        let dataset: InMemDataset<Item> =
            InMemDataset::from_csv(format!("{}/{}.csv", dataset_dir, mode), &reader)?;

        let mut labels: Vec<String> = dataset.iter().map(|item| item.label).collect();
        labels.sort();
        labels.dedup();

        Ok(Self { dataset, labels })
    }

    /// Collect every input text of the split, for vocabulary building
    pub fn texts(&self) -> Vec<String> {
        self.dataset.iter().map(|item| item.text).collect()
    }

    /// Returns random samples from the dataset
    pub async fn get_samples(data_dir: &str) -> std::io::Result<Vec<(String, String)>> {
        let mut rng = rand::thread_rng();

        let data = Self::load(data_dir, "train").await?;

        let mut samples = Vec::with_capacity(10);
        for _ in 0..10 {
            let i = rng.gen_range(0..data.len());
            let item = data.get(i).unwrap();

            samples.push((item.text, item.label));
        }

        Ok(samples)
    }
}
