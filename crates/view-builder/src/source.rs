//! Source records
//!
//! A source record is a flat mapping from hyphenated field name to string value, as produced
//! by the upstream entry store. [`CsvSource`] reads them from a dataset CSV file whose header
//! row names the fields.

use crate::error::Result;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Flat key/value record from the source store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRecord(BTreeMap<String, String>);

impl SourceRecord {
    /// Raw value of a field, including empty strings
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for SourceRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Reads source records from CSV, one record per data row
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    headers: csv::StringRecord,
}

impl CsvSource<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Count data rows without keeping them, for progress reporting
    pub fn count_rows(path: impl AsRef<Path>) -> Result<u64> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut count = 0;
        for row in reader.records() {
            row?;
            count += 1;
        }
        Ok(count)
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(input: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);
        let headers = reader.headers()?.clone();
        Ok(Self { reader, headers })
    }
}

impl<R: Read> Iterator for CsvSource<R> {
    type Item = Result<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut row = csv::StringRecord::new();
        match self.reader.read_record(&mut row) {
            Ok(true) => Some(Ok(self
                .headers
                .iter()
                .zip(row.iter())
                .collect::<SourceRecord>())),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}
