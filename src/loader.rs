//! Partition loader for the monthly FII disclosure files
//!
//! Each (category, year) pair lives at
//! `<data_dir>/inf_mensal_fii_<year>/inf_mensal_fii_<stem>_<year>.csv`,
//! `;`-delimited and encoded in a legacy single-byte code page.

use csv::{ByteRecord, ReaderBuilder};
use encoding_rs::{Encoding, WINDOWS_1252};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::models::Category;
use crate::table::RawTable;

pub const DEFAULT_DELIMITER: u8 = b';';

#[derive(Debug, Clone)]
pub struct PartitionLoader {
    data_dir: PathBuf,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl PartitionLoader {
    /// ISO-8859-1 files decode through the WHATWG windows-1252 table,
    /// which is a superset for every printable byte.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            delimiter: DEFAULT_DELIMITER,
            encoding: WINDOWS_1252,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn partition_path(&self, category: Category, year: i32) -> PathBuf {
        self.data_dir
            .join(format!("inf_mensal_fii_{}", year))
            .join(format!("inf_mensal_fii_{}_{}.csv", category.file_stem(), year))
    }

    /// Read the full record set of one (category, year) partition
    pub fn load(&self, category: Category, year: i32) -> Result<RawTable> {
        let path = self.partition_path(category, year);
        debug!("Reading {} partition {} from {}", category, year, path.display());

        let file = std::fs::File::open(&path).map_err(|e| PipelineError::DataUnavailable {
            category,
            year,
            reason: format!("{}: {}", path.display(), e),
        })?;

        let table = self.read(file, category, year)?;
        info!(
            "📄 Loaded {} {} partition: {} rows, {} columns",
            category,
            year,
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }

    /// Decode a partition from any reader; malformed content is `DataUnavailable`.
    pub fn read<R: Read>(&self, source: R, category: Category, year: i32) -> Result<RawTable> {
        let malformed = |reason: String| PipelineError::DataUnavailable {
            category,
            year,
            reason,
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(source);

        let headers = reader
            .byte_headers()
            .map_err(|e| malformed(format!("unreadable header: {}", e)))?
            .clone();
        if headers.is_empty() {
            return Err(malformed("empty file".to_string()));
        }

        let mut table = RawTable::new(self.decode_record(&headers));
        let mut record = ByteRecord::new();
        loop {
            match reader.read_byte_record(&mut record) {
                Ok(true) => table.rows.push(self.decode_record(&record)),
                Ok(false) => break,
                Err(e) => return Err(malformed(format!("malformed row: {}", e))),
            }
        }

        Ok(table)
    }

    fn decode_record(&self, record: &ByteRecord) -> Vec<String> {
        record
            .iter()
            .map(|field| {
                let (text, _had_errors) = self.encoding.decode_without_bom_handling(field);
                text.into_owned()
            })
            .collect()
    }
}
