use serde::{Deserialize, Serialize};

/// Delimiter used everywhere: between tokens in model output, between
/// labels, and inside the persisted `tokens`/`labels` CSV columns.
pub const PART_DELIMITER: char = '|';

/// The closed set of token categories the classification pass may emit.
pub const CATEGORIES: [&str; 7] = ["材料", "形式", "工艺", "风味", "地名", "品牌", "其他"];

/// Fallback category for anything the model emits outside [`CATEGORIES`].
pub const FALLBACK_CATEGORY: &str = "其他";

/// One unit of work: a dish name and its evolving annotation state.
///
/// `tokens` is empty until the segmentation pass completes; `labels` is
/// empty until classification completes and has the same length as `tokens`
/// once populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    pub index: u64,
    pub source_text: String,
    pub tokens: Vec<String>,
    pub labels: Vec<String>,
}

impl DishRecord {
    /// A freshly ingested record with no annotations yet.
    pub fn new(index: u64, source_text: impl Into<String>) -> Self {
        Self {
            index,
            source_text: source_text.into(),
            tokens: Vec::new(),
            labels: Vec::new(),
        }
    }
}

/// Runtime configuration for an annotation pass.
#[derive(Debug, Clone)]
pub struct AnnotateConfig {
    pub model: String,
    pub batch_size: usize,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-r1:32b".to_string(),
            batch_size: 200,
            base_url: "http://localhost:11434".to_string(),
            timeout_seconds: 300,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnnotatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model backend returned HTTP {status}: {body}")]
    Backend { status: u16, body: String },

    #[error(
        "chunk {chunk}: got {actual} responses for {expected} inputs; raw responses: {responses:?}"
    )]
    Alignment {
        chunk: usize,
        expected: usize,
        actual: usize,
        responses: Vec<String>,
    },

    #[error("an annotation task requires at least one few-shot exemplar")]
    EmptyExemplars,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
