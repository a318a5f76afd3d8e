use crate::backend::ModelBackend;
use crate::dispatch::dispatch_batch;
use crate::normalize::normalize_response;
use crate::prompt::AnnotationTask;
use crate::store::{save_records, FieldSet};
use crate::types::{
    AnnotatorError, DishRecord, Result, CATEGORIES, FALLBACK_CATEGORY, PART_DELIMITER,
};
use std::path::Path;
use tracing::{info, warn};

/// Which annotation pass is running: it selects the input field, the
/// output field, and the checkpoint field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// `source_text` in, `tokens` out.
    Segmentation,
    /// `tokens` (joined) in, `labels` out.
    Classification,
}

impl Pass {
    fn input_text(self, record: &DishRecord) -> String {
        match self {
            Pass::Segmentation => record.source_text.clone(),
            Pass::Classification => record.tokens.join(&PART_DELIMITER.to_string()),
        }
    }

    fn write_output(self, record: &mut DishRecord, parts: Vec<String>) {
        match self {
            Pass::Segmentation => record.tokens = parts,
            Pass::Classification => {
                let labels: Vec<String> =
                    parts.into_iter().map(|p| clamp_category(p, record.index)).collect();
                if labels.len() != record.tokens.len() {
                    warn!(
                        "Record {}: {} labels for {} tokens",
                        record.index,
                        labels.len(),
                        record.tokens.len()
                    );
                }
                record.labels = labels;
            }
        }
    }

    pub fn field_set(self) -> FieldSet {
        match self {
            Pass::Segmentation => FieldSet::Segmentation,
            Pass::Classification => FieldSet::Classification,
        }
    }
}

/// Clamp a model-emitted label to the closed category set.
fn clamp_category(label: String, index: u64) -> String {
    if CATEGORIES.contains(&label.as_str()) {
        label
    } else {
        warn!(
            "Record {}: unknown category {:?} clamped to {}",
            index, label, FALLBACK_CATEGORY
        );
        FALLBACK_CATEGORY.to_string()
    }
}

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub records_annotated: usize,
    pub chunks_completed: usize,
}

/// Normalize a chunk's responses and write them into the records.
///
/// The alignment check happens here, before any record is touched: if the
/// response count disagrees with the chunk size there is no way to know
/// which response belongs to which input, so the whole pass must abort
/// with the raw responses surfaced for inspection and no record mutated.
pub fn merge_chunk(
    records: &mut [DishRecord],
    chunk: &[(usize, String)],
    responses: &[String],
    pass: Pass,
    chunk_no: usize,
) -> Result<()> {
    if responses.len() != chunk.len() {
        return Err(AnnotatorError::Alignment {
            chunk: chunk_no,
            expected: chunk.len(),
            actual: responses.len(),
            responses: responses.to_vec(),
        });
    }

    for ((position, _input), response) in chunk.iter().zip(responses) {
        let parts = normalize_response(response);
        pass.write_output(&mut records[*position], parts);
    }
    Ok(())
}

/// Drive one full annotation pass over `records` in fixed-size chunks.
///
/// Chunks run sequentially; only the requests within one chunk are
/// concurrent. After every chunk the full collection is checkpointed to
/// `output_path` (whole-file overwrite), so a crash loses at most the
/// in-flight chunk. There are no automatic retries: an alignment or
/// backend failure aborts the pass, and re-running it from the last
/// checkpoint is the recovery path.
///
/// An empty collection still writes one header-only checkpoint so the next
/// pipeline stage always finds a well-formed file.
pub async fn run_pass(
    records: &mut [DishRecord],
    task: &AnnotationTask,
    pass: Pass,
    backend: &dyn ModelBackend,
    batch_size: usize,
    output_path: impl AsRef<Path>,
) -> Result<PassOutcome> {
    let output_path = output_path.as_ref();
    let batch_size = batch_size.max(1);

    let candidates: Vec<(usize, String)> = records
        .iter()
        .enumerate()
        .map(|(position, record)| (position, pass.input_text(record)))
        .collect();

    if candidates.is_empty() {
        save_records(records, output_path, pass.field_set())?;
        info!("{:?} pass: no records, wrote header-only checkpoint", pass);
        return Ok(PassOutcome { records_annotated: 0, chunks_completed: 0 });
    }

    let total_chunks = candidates.len().div_ceil(batch_size);
    info!(
        "{:?} pass: {} records in {} chunk(s) of up to {} via {}",
        pass,
        candidates.len(),
        total_chunks,
        batch_size,
        backend.backend_name()
    );

    let mut outcome = PassOutcome { records_annotated: 0, chunks_completed: 0 };

    for (chunk_no, chunk) in candidates.chunks(batch_size).enumerate() {
        let inputs: Vec<String> = chunk.iter().map(|(_, input)| input.clone()).collect();

        let responses = dispatch_batch(task, backend, &inputs).await?;
        merge_chunk(records, chunk, &responses, pass, chunk_no)?;
        save_records(records, output_path, pass.field_set())?;

        outcome.records_annotated += chunk.len();
        outcome.chunks_completed += 1;
        info!(
            "{:?} pass: chunk {}/{} checkpointed ({} records done)",
            pass,
            chunk_no + 1,
            total_chunks,
            outcome.records_annotated
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DishRecord;

    fn record_with_tokens(index: u64, text: &str, tokens: &[&str]) -> DishRecord {
        DishRecord {
            index,
            source_text: text.to_string(),
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
            labels: Vec::new(),
        }
    }

    #[test]
    fn alignment_mismatch_mutates_nothing() {
        let mut records = vec![
            DishRecord::new(0, "酸辣土豆丝"),
            DishRecord::new(1, "水煮肉片"),
        ];
        let chunk = vec![(0, "酸辣土豆丝".to_string()), (1, "水煮肉片".to_string())];
        let responses = vec!["酸辣|土豆丝".to_string()];

        let before = records.clone();
        let err = merge_chunk(&mut records, &chunk, &responses, Pass::Segmentation, 3)
            .unwrap_err();

        match err {
            AnnotatorError::Alignment { chunk, expected, actual, responses } => {
                assert_eq!(chunk, 3);
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
                assert_eq!(responses, vec!["酸辣|土豆丝"]);
            }
            other => panic!("expected Alignment, got {other:?}"),
        }
        assert_eq!(records, before);
    }

    #[test]
    fn segmentation_merge_fills_tokens() {
        let mut records = vec![DishRecord::new(0, "韭菜猪肉水饺")];
        let chunk = vec![(0, "韭菜猪肉水饺".to_string())];
        let responses = vec!["<think>拆分</think>\n\n韭菜|猪肉|水饺".to_string()];

        merge_chunk(&mut records, &chunk, &responses, Pass::Segmentation, 0).unwrap();
        assert_eq!(records[0].tokens, vec!["韭菜", "猪肉", "水饺"]);
    }

    #[test]
    fn classification_merge_clamps_unknown_categories() {
        let mut records = vec![record_with_tokens(0, "孜然羊肉盖烧饭", &["孜然", "羊肉", "盖烧饭"])];
        let chunk = vec![(0, "孜然|羊肉|盖烧饭".to_string())];
        let responses = vec!["原材料|材料|形式".to_string()];

        merge_chunk(&mut records, &chunk, &responses, Pass::Classification, 0).unwrap();
        assert_eq!(records[0].labels, vec!["其他", "材料", "形式"]);
    }

    #[test]
    fn classification_input_joins_tokens() {
        let record = record_with_tokens(0, "腊味饭", &["腊味", "饭"]);
        assert_eq!(Pass::Classification.input_text(&record), "腊味|饭");
        assert_eq!(Pass::Segmentation.input_text(&record), "腊味饭");
    }
}
