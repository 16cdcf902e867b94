//! Reading samples from delimited text.
//!
//! Every record (line) holds one sample, every field one dimension. Records that cannot be used are
//! skipped and collected as [`SkippedRecord`]s instead of aborting the load:
//! - a field that does not parse as a number ([`RecordError::InvalidNumber`])
//! - a field count differing from the first accepted record ([`RecordError::DimensionMismatch`])
//! - a record that is not valid UTF-8 ([`RecordError::Unreadable`])
//! - a blank line ([`RecordError::Empty`])
//!
//! Fields are not quoted, and trailing empty fields (`1,2,3,`) are dropped. Only I/O failures abort a load.

use crate::{KMeans, RecordError, Result, memory::*};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use std::{fs::File, io::{BufRead, BufReader, Read}, path::Path};

/// A record that was dropped while loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Line (1-based) the record started on
    pub line: u64,
    pub reason: RecordError,
}

/// Result of a load: the accepted samples [row-major], plus everything that was skipped.
#[derive(Clone, Debug)]
pub struct LoadedSamples<T: Primitive> {
    pub samples: Vec<T>,
    pub sample_cnt: usize,
    pub sample_dims: usize,
    pub skipped: Vec<SkippedRecord>,
}
impl<T: Primitive> LoadedSamples<T> {
    fn empty() -> Self {
        Self { samples: Vec::new(), sample_cnt: 0, sample_dims: 0, skipped: Vec::new() }
    }

    fn push(&mut self, line: u64, values: Vec<T>) {
        if self.sample_cnt == 0 {
            self.sample_dims = values.len();
        } else if values.len() != self.sample_dims {
            let reason = RecordError::DimensionMismatch { expected: self.sample_dims, found: values.len() };
            return self.skip(line, reason);
        }
        self.samples.extend(values);
        self.sample_cnt += 1;
    }

    fn skip(&mut self, line: u64, reason: RecordError) {
        tracing::warn!(line, %reason, "skipping invalid or incomplete data");
        self.skipped.push(SkippedRecord { line, reason });
    }

    /// Amount of records that were dropped.
    pub fn skipped_cnt(&self) -> usize { self.skipped.len() }

    /// Hand the accepted samples over to a new [`KMeans`] instance.
    pub fn into_kmeans(self) -> Result<KMeans<T>> {
        KMeans::new(self.samples, self.sample_cnt, self.sample_dims)
    }
}

/// Parse every field of **record** as a number. Trailing empty fields are not part of the sample.
pub fn parse_record<T: Primitive>(record: &StringRecord) -> std::result::Result<Vec<T>, RecordError> {
    let field_cnt = record.len() - record.iter().rev().take_while(|value| value.is_empty()).count();
    if field_cnt == 0 {
        return Err(RecordError::Empty);
    }
    record.iter().take(field_cnt).enumerate()
        .map(|(field, value)| value.parse::<T>().map_err(|_| RecordError::InvalidNumber {
            field: field + 1,
            value: value.to_string(),
        }))
        .collect()
}

/// Loader for delimited numeric text files (comma separated by default).
#[derive(Clone, Debug)]
pub struct DataLoader {
    delimiter: u8,
}
impl Default for DataLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}
impl DataLoader {
    pub fn new() -> Self { Self::default() }

    /// Set the field delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter; self
    }

    /// Load all samples from the file at **path**.
    pub fn load_path<T: Primitive, P: AsRef<Path>>(&self, path: P) -> Result<LoadedSamples<T>> {
        let path = path.as_ref();
        let loaded = self.load_reader(File::open(path)?)?;
        tracing::info!(path = %path.display(), points = loaded.sample_cnt, "loaded data points");
        if loaded.skipped_cnt() > 0 {
            tracing::info!(skipped = loaded.skipped_cnt(), "skipped lines due to invalid data");
        }
        Ok(loaded)
    }

    /// Load all samples from **reader**.
    pub fn load_reader<T: Primitive, R: Read>(&self, reader: R) -> Result<LoadedSamples<T>> {
        let builder = self.record_reader();
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut record = ByteRecord::new();

        let mut loaded = LoadedSamples::empty();
        let mut line = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line += 1;
            let content = strip_line_end(&buf);
            if content.iter().all(u8::is_ascii_whitespace) {
                loaded.skip(line, RecordError::Empty);
                continue;
            }

            let parsed = match builder.from_reader(content).read_byte_record(&mut record) {
                Ok(true) => StringRecord::from_byte_record(record.clone())
                    .map_err(|err| RecordError::Unreadable(err.to_string()))
                    .and_then(|record| parse_record(&record)),
                Ok(false) => Err(RecordError::Empty),
                Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
                Err(err) => Err(RecordError::Unreadable(err.to_string())),
            };
            match parsed {
                Ok(values) => loaded.push(line, values),
                Err(reason) => loaded.skip(line, reason),
            }
        }
        Ok(loaded)
    }

    /// Reader settings for a single line. Quotes have no special meaning.
    fn record_reader(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .delimiter(self.delimiter);
        builder
    }
}

fn strip_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
