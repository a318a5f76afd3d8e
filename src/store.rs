use crate::types::{DishRecord, Result, PART_DELIMITER};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Which columns a checkpoint carries. Each pass persists exactly the
/// fields it has produced so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSet {
    /// `index,text,tokens`, written by the segmentation pass.
    Segmentation,
    /// `index,text,tokens,labels`, written by the classification pass.
    Classification,
}

impl FieldSet {
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            FieldSet::Segmentation => &["index", "text", "tokens"],
            FieldSet::Classification => &["index", "text", "tokens", "labels"],
        }
    }
}

/// Raw CSV row as stored on disk. `tokens` and `labels` are
/// delimiter-joined strings and may be absent entirely in files produced
/// by earlier pipeline stages.
#[derive(Debug, Deserialize)]
struct StoredRow {
    index: u64,
    text: String,
    #[serde(default)]
    tokens: Option<String>,
    #[serde(default)]
    labels: Option<String>,
}

fn join_parts(parts: &[String]) -> String {
    parts.join(&PART_DELIMITER.to_string())
}

fn split_parts(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        Vec::new()
    } else {
        joined.split(PART_DELIMITER).map(str::to_string).collect()
    }
}

/// Load an ordered collection of dish records from a CSV file.
///
/// Absent `tokens`/`labels` columns default to empty sequences, so the
/// same loader serves every pipeline stage.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<DishRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for row in reader.deserialize() {
        let row: StoredRow = row?;
        records.push(DishRecord {
            index: row.index,
            source_text: row.text,
            tokens: row.tokens.as_deref().map(split_parts).unwrap_or_default(),
            labels: row.labels.as_deref().map(split_parts).unwrap_or_default(),
        });
    }

    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Persist the full record collection, overwriting `path`.
///
/// Writes a header row naming exactly the requested field set, then one
/// row per record in collection order. This is the checkpoint primitive:
/// every call replaces the whole file, so re-running a pass is idempotent
/// at the file level.
///
/// One lossy corner of the `|`-joined encoding: a part list holding a
/// single empty string serializes to an empty cell and reloads as an empty
/// sequence, since the two are indistinguishable on disk.
pub fn save_records(
    records: &[DishRecord],
    path: impl AsRef<Path>,
    fields: FieldSet,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(fields.headers())?;
    for record in records {
        let index = record.index.to_string();
        let tokens = join_parts(&record.tokens);
        match fields {
            FieldSet::Segmentation => {
                writer.write_record([
                    index.as_str(),
                    record.source_text.as_str(),
                    tokens.as_str(),
                ])?;
            }
            FieldSet::Classification => {
                let labels = join_parts(&record.labels);
                writer.write_record([
                    index.as_str(),
                    record.source_text.as_str(),
                    tokens.as_str(),
                    labels.as_str(),
                ])?;
            }
        }
    }
    writer.flush()?;

    debug!(
        "Checkpointed {} records to {} ({:?})",
        records.len(),
        path.display(),
        fields
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_records() -> Vec<DishRecord> {
        vec![
            DishRecord {
                index: 0,
                source_text: "酸辣土豆丝".to_string(),
                tokens: vec!["酸辣".to_string(), "土豆丝".to_string()],
                labels: vec!["风味".to_string(), "材料".to_string()],
            },
            DishRecord::new(1, "水煮肉片"),
        ]
    }

    #[test]
    fn round_trips_with_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        let records = sample_records();

        save_records(&records, &path, FieldSet::Classification).unwrap();
        let loaded = load_records(&path).unwrap();

        assert_eq!(loaded, records);
    }

    #[test]
    fn segmentation_field_set_drops_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokenized.csv");
        let records = sample_records();

        save_records(&records, &path, FieldSet::Segmentation).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("index,text,tokens\n"));
        assert!(!contents.contains("风味"));

        // Labels default to empty when the column is absent
        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded[0].tokens, records[0].tokens);
        assert!(loaded[0].labels.is_empty());
    }

    #[test]
    fn loads_source_files_without_token_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dishes.csv");
        std::fs::write(&path, "index,text\n0,韭菜猪肉水饺\n1,腊味饭\n").unwrap();

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].source_text, "腊味饭");
        assert!(loaded[0].tokens.is_empty());
        assert!(loaded[0].labels.is_empty());
    }

    #[test]
    fn single_empty_part_collapses_to_empty_on_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokenized.csv");
        let mut record = DishRecord::new(0, "腊味饭");
        record.tokens = vec![String::new()];

        save_records(&[record], &path, FieldSet::Segmentation).unwrap();
        let loaded = load_records(&path).unwrap();
        assert!(loaded[0].tokens.is_empty());
    }

    #[test]
    fn empty_collection_writes_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        save_records(&[], &path, FieldSet::Segmentation).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "index,text,tokens\n");
    }
}
