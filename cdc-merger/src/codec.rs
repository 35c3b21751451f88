//! Delimited text encoding of snapshots and change batches.
//!
//! Every row must match the positional layout of [`SnapshotSchema`] exactly;
//! the first row that does not fails the whole run.

use std::sync::Arc;

use cdc_config::shared::FormatConfig;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::debug;

use crate::bail;
use crate::error::{CdcResult, ErrorKind};
use crate::types::{ChangeBatch, ChangeRecord, CommitTime, EntityId, SnapshotRow, SnapshotSchema};

/// Reads and writes rows in the configured delimited format.
#[derive(Debug, Clone)]
pub struct DelimitedCodec {
    schema: Arc<SnapshotSchema>,
    format: FormatConfig,
}

impl DelimitedCodec {
    pub fn new(schema: Arc<SnapshotSchema>, format: FormatConfig) -> Self {
        Self { schema, format }
    }

    pub fn schema(&self) -> &SnapshotSchema {
        &self.schema
    }

    /// Decodes snapshot rows from `bytes`. `source` names the part in errors.
    pub fn decode_snapshot(&self, source: &str, bytes: &[u8]) -> CdcResult<Vec<SnapshotRow>> {
        let mut rows = Vec::new();
        for record in self.reader(bytes).records() {
            let record = record?;
            check_width(source, &record, self.schema.snapshot_width())?;
            rows.push(self.decode_row(source, &record, 0)?);
        }

        debug!(%source, rows = rows.len(), "decoded snapshot part");

        Ok(rows)
    }

    /// Decodes change records from `bytes`. `source` names the part in errors.
    pub fn decode_changes(&self, source: &str, bytes: &[u8]) -> CdcResult<ChangeBatch> {
        let mut records = Vec::new();
        for record in self.reader(bytes).records() {
            let record = record?;
            check_width(source, &record, self.schema.change_width())?;

            let tag = &record[0];
            let operation = tag.parse().map_err(|_| {
                crate::cdc_error!(
                    ErrorKind::InvalidOperation,
                    "Unrecognized operation tag",
                    format!("{}: found `{tag}`", location(source, &record))
                )
            })?;
            let row = self.decode_row(source, &record, 1)?;

            records.push(ChangeRecord::new(operation, row));
        }

        debug!(%source, records = records.len(), "decoded change part");

        Ok(ChangeBatch::new(records))
    }

    /// Encodes `rows` in order, preceded by a header when configured.
    pub fn encode_snapshot<'a, I>(&self, rows: I) -> CdcResult<Vec<u8>>
    where
        I: IntoIterator<Item = &'a SnapshotRow>,
    {
        let mut writer = WriterBuilder::new()
            .delimiter(self.format.delimiter_byte())
            .has_headers(false)
            .from_writer(Vec::new());

        if self.format.has_header {
            writer.write_record(self.schema.snapshot_header())?;
        }

        for row in rows {
            let commit_time = row.commit_time().to_string();
            writer.write_record(
                [commit_time.as_str(), row.entity_id().as_str()]
                    .into_iter()
                    .chain(row.attributes().iter().map(String::as_str)),
            )?;
        }

        writer.into_inner().map_err(|err| err.into_error().into())
    }

    fn reader<'b>(&self, bytes: &'b [u8]) -> csv::Reader<&'b [u8]> {
        ReaderBuilder::new()
            .delimiter(self.format.delimiter_byte())
            .has_headers(self.format.has_header)
            .flexible(true)
            .from_reader(bytes)
    }

    /// Decodes the snapshot fields of `record`, starting at field `offset`.
    fn decode_row(
        &self,
        source: &str,
        record: &StringRecord,
        offset: usize,
    ) -> CdcResult<SnapshotRow> {
        let commit_time: CommitTime = record[offset].parse().map_err(|_| {
            crate::cdc_error!(
                ErrorKind::SchemaViolation,
                "Invalid commit timestamp",
                format!(
                    "{}: `{}` is not a timestamp",
                    location(source, record),
                    &record[offset]
                )
            )
        })?;

        let entity_id = &record[offset + 1];
        if entity_id.trim().is_empty() {
            bail!(
                ErrorKind::SchemaViolation,
                "Missing entity id",
                format!(
                    "{}: the {} field is empty",
                    location(source, record),
                    self.schema.entity_id_column()
                )
            );
        }

        let attributes = record
            .iter()
            .skip(offset + 2)
            .map(str::to_string)
            .collect();

        Ok(SnapshotRow::new(
            commit_time,
            EntityId::new(entity_id),
            attributes,
        ))
    }
}

fn check_width(source: &str, record: &StringRecord, expected: usize) -> CdcResult<()> {
    if record.len() != expected {
        bail!(
            ErrorKind::SchemaViolation,
            "Row does not match the record layout",
            format!(
                "{}: expected {expected} fields, found {}",
                location(source, record),
                record.len()
            )
        );
    }

    Ok(())
}

fn location(source: &str, record: &StringRecord) -> String {
    match record.position() {
        Some(position) => format!("{source} line {}", position.line()),
        None => source.to_string(),
    }
}
