// src/utils/table.rs - CSV loading and annotated output for subject rosters

use anyhow::{anyhow, bail, Context, Result};
use csv::StringRecord;
use log::{debug, info};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::clustering::canonical::CanonicalMapping;
use crate::models::core::{parse_id_column, SubjectId, SubjectRecord};

/// The input table, kept verbatim so every original column can be written back.
#[derive(Debug, Clone)]
pub struct SubjectTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    records: Vec<SubjectRecord>,
    row_by_id: HashMap<SubjectId, usize>,
}

impl SubjectTable {
    pub fn read_csv(path: &Path, id_column: &str, name_column: &str) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open subject table {}", path.display()))?;
        let table = Self::from_reader(file, id_column, name_column)
            .with_context(|| format!("Failed to load subject table {}", path.display()))?;
        info!(
            "Loaded {} subject rows from {}",
            table.records.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, id_column: &str, name_column: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .context("Failed to read CSV header row")?
            .clone();
        let id_idx = column_index(&headers, id_column)?;
        let name_idx = column_index(&headers, name_column)?;

        let mut rows = Vec::new();
        let mut raw_ids = Vec::new();
        let mut names = Vec::new();

        for (row_index, result) in csv_reader.records().enumerate() {
            let row = result.with_context(|| format!("Failed to parse CSV row {}", row_index + 1))?;
            let raw_id = row
                .get(id_idx)
                .ok_or_else(|| anyhow!("Row {} has no '{}' value", row_index + 1, id_column))?
                .to_string();
            let subject_name = row
                .get(name_idx)
                .ok_or_else(|| anyhow!("Row {} has no '{}' value", row_index + 1, name_column))?
                .to_string();

            raw_ids.push(raw_id);
            names.push(subject_name);
            rows.push(row);
        }

        // The id ordering is decided once for the whole column.
        let subject_ids = parse_id_column(&raw_ids);

        let mut records = Vec::with_capacity(rows.len());
        let mut row_by_id = HashMap::new();
        for (row_index, (subject_id, subject_name)) in subject_ids.into_iter().zip(names).enumerate() {
            if let Some(previous) = row_by_id.insert(subject_id.clone(), row_index) {
                bail!(
                    "Duplicate subject id '{}' in rows {} and {}",
                    subject_id,
                    previous + 1,
                    row_index + 1
                );
            }
            records.push(SubjectRecord {
                subject_id,
                subject_name,
            });
        }

        debug!("Parsed {} rows with {} columns", rows.len(), headers.len());

        Ok(Self {
            headers,
            rows,
            records,
            row_by_id,
        })
    }

    pub fn records(&self) -> &[SubjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the annotated table to `path`, creating its directory if needed.
    pub fn write_annotated_csv(
        &self,
        path: &Path,
        mapping: &CanonicalMapping,
        output_column: &str,
    ) -> Result<usize> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
                info!("Created output directory {}", parent.display());
            }
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        let written = self
            .write_annotated(file, mapping, output_column)
            .with_context(|| format!("Failed to write annotated table {}", path.display()))?;
        info!("Wrote {} annotated rows to {}", written, path.display());
        Ok(written)
    }

    /// Writes rows in the mapping's traversal order, each followed by its
    /// canonical subject id.
    pub fn write_annotated<W: Write>(
        &self,
        writer: W,
        mapping: &CanonicalMapping,
        output_column: &str,
    ) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = self.headers.clone();
        header.push_field(output_column);
        csv_writer
            .write_record(&header)
            .context("Failed to write CSV header row")?;

        let mut written = 0;
        for (subject_id, canonical_id) in mapping.iter() {
            let row_idx = *self
                .row_by_id
                .get(subject_id)
                .ok_or_else(|| anyhow!("Subject id '{}' is not in the input table", subject_id))?;
            let mut row = self.rows[row_idx].clone();
            row.push_field(canonical_id.as_str());
            csv_writer
                .write_record(&row)
                .with_context(|| format!("Failed to write row for subject '{}'", subject_id))?;
            written += 1;
        }

        csv_writer.flush().context("Failed to flush CSV writer")?;
        Ok(written)
    }
}

fn column_index(headers: &StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| {
            anyhow!(
                "Column '{}' not found (available: {})",
                column,
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::subject_clustering::run_subject_clustering;
    use crate::models::core::{SubjectComponent, SubjectNode};

    const ROSTER: &str = "\
subject_id,subject_name,school
3,qwe qwe,St Mary
1,foo bar,St Mary
2,foo baz bar,St Paul
";

    #[test]
    fn test_reads_records_and_keeps_row_order() {
        let table = SubjectTable::from_reader(ROSTER.as_bytes(), "subject_id", "subject_name")
            .unwrap();
        assert_eq!(table.len(), 3);
        let ids: Vec<SubjectId> = table.records().iter().map(|r| r.subject_id.clone()).collect();
        assert_eq!(ids, vec![SubjectId::from(3), SubjectId::from(1), SubjectId::from(2)]);
        assert_eq!(table.records()[1].subject_name, "foo bar");
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let err = SubjectTable::from_reader(ROSTER.as_bytes(), "pupil_id", "subject_name")
            .unwrap_err();
        assert!(err.to_string().contains("pupil_id"));
    }

    #[test]
    fn test_duplicate_id_is_an_error() {
        let roster = "subject_id,subject_name\n1,foo\n1,bar\n";
        let err = SubjectTable::from_reader(roster.as_bytes(), "subject_id", "subject_name")
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate subject id '1'"));
    }

    #[test]
    fn test_write_annotated_follows_mapping_order() {
        let table = SubjectTable::from_reader(ROSTER.as_bytes(), "subject_id", "subject_name")
            .unwrap();
        let components = vec![
            SubjectComponent::new(vec![
                SubjectNode::new(2, "foo baz bar"),
                SubjectNode::new(1, "foo bar"),
            ]),
            SubjectComponent::new(vec![SubjectNode::new(3, "qwe qwe")]),
        ];
        let mapping = CanonicalMapping::from_components(&components);

        let mut buffer = Vec::new();
        let written = table
            .write_annotated(&mut buffer, &mapping, "similar_subject_id")
            .unwrap();
        assert_eq!(written, 3);

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "subject_id,subject_name,school,similar_subject_id\n\
             2,foo baz bar,St Paul,1\n\
             1,foo bar,St Mary,1\n\
             3,qwe qwe,St Mary,3\n"
        );
    }

    fn annotate(roster: &str) -> String {
        let table = SubjectTable::from_reader(roster.as_bytes(), "subject_id", "subject_name")
            .unwrap();
        let outcome = run_subject_clustering(table.records(), 7, None);
        let mapping = CanonicalMapping::from_components(&outcome.components);
        let mut buffer = Vec::new();
        table
            .write_annotated(&mut buffer, &mapping, "similar_subject_id")
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_canonical_id_keeps_leading_zeros() {
        let output = annotate("subject_id,subject_name\n007,ada obi\n012,zzz qqq\n");
        assert_eq!(
            output,
            "subject_id,subject_name,similar_subject_id\n\
             007,ada obi,007\n\
             012,zzz qqq,012\n"
        );
    }

    #[test]
    fn test_numeric_column_uses_numeric_minimum() {
        let output = annotate("subject_id,subject_name\n10,foo bar\n9,bar foo\n");
        assert_eq!(
            output,
            "subject_id,subject_name,similar_subject_id\n\
             10,foo bar,9\n\
             9,bar foo,9\n"
        );
    }

    #[test]
    fn test_mixed_column_uses_string_minimum() {
        let output = annotate("subject_id,subject_name\n10,foo bar\n9,bar foo\nA1,foo bar baz\n");
        assert_eq!(
            output,
            "subject_id,subject_name,similar_subject_id\n\
             10,foo bar,10\n\
             9,bar foo,10\n\
             A1,foo bar baz,10\n"
        );
    }

    #[test]
    fn test_write_annotated_rejects_unknown_ids() {
        let table = SubjectTable::from_reader(ROSTER.as_bytes(), "subject_id", "subject_name")
            .unwrap();
        let components = vec![SubjectComponent::new(vec![SubjectNode::new(99, "ghost")])];
        let mapping = CanonicalMapping::from_components(&components);
        assert!(table
            .write_annotated(Vec::new(), &mapping, "similar_subject_id")
            .is_err());
    }
}
