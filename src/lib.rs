pub mod annotate;
pub mod backend;
pub mod dispatch;
pub mod normalize;
pub mod prompt;
pub mod store;
pub mod types;

pub use annotate::{merge_chunk, run_pass, Pass, PassOutcome};
pub use backend::{ModelBackend, ModelResponse, OllamaBackend, StubBackend};
pub use dispatch::dispatch_batch;
pub use normalize::normalize_response;
pub use prompt::{classification_task, segmentation_task, AnnotationTask, ChatMessage, Exemplar, TaskKind};
pub use store::{load_records, save_records, FieldSet};
pub use types::*;
