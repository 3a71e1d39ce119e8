//! Reader and writer for the `XiML` binary record format.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;

use crate::error::{Result, XimlError};
use crate::util::{check_file_readable, create_parent_dirs};

/// Four-byte file signature.
pub const SIGNATURE: &[u8; 4] = b"XiML";

/// Size in bytes of one stored value (u32 id or f32 weight).
const VALUE_SIZE: usize = 4;

/// How records identify themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// Every record starts with an explicit `u32` id.
    Keyed,
    /// Records carry only weights; the id is the 0-based position.
    Indexed,
}

impl RecordLayout {
    fn record_size(self, width: usize) -> u64 {
        let weights = (width as u64).saturating_mul(VALUE_SIZE as u64);
        match self {
            RecordLayout::Keyed => weights.saturating_add(VALUE_SIZE as u64),
            RecordLayout::Indexed => weights,
        }
    }
}

/// A single dense record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: u32,
    pub weights: Vec<f32>,
}

impl Record {
    pub fn new(id: u32, weights: Vec<f32>) -> Self {
        Record { id, weights }
    }
}

/// Streaming writer for the binary format.
///
/// The width header is written by [`write_header`](Self::write_header) or
/// together with the first record, and every later record must have the same
/// width.
pub struct BinaryModelWriter<W: Write> {
    writer: W,
    layout: RecordLayout,
    width: Option<usize>,
    records: usize,
}

impl<W: Write> BinaryModelWriter<W> {
    /// Create a writer and emit the signature.
    pub fn new(mut writer: W, layout: RecordLayout) -> Result<Self> {
        writer.write_all(SIGNATURE)?;
        Ok(BinaryModelWriter {
            writer,
            layout,
            width: None,
            records: 0,
        })
    }

    /// Write the width header ahead of any record.
    ///
    /// Calling it again with the same width is a no-op; a different width is a
    /// [`XimlError::Data`] error.
    pub fn write_header(&mut self, width: usize) -> Result<()> {
        match self.width {
            None => {
                let header = u32::try_from(width).map_err(|_| {
                    XimlError::data(format!("Record width {width} does not fit in u32"))
                })?;
                self.writer.write_u32::<LittleEndian>(header)?;
                self.width = Some(width);
                Ok(())
            }
            Some(expected) if expected != width => Err(XimlError::data(format!(
                "All records must share the same width: expected {expected}, got {width}"
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Width fixed by the header, if it has been written.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Append one record. In indexed layout the id is ignored.
    pub fn write_record(&mut self, id: u32, weights: &[f32]) -> Result<()> {
        self.write_header(weights.len())?;

        if self.layout == RecordLayout::Keyed {
            self.writer.write_u32::<LittleEndian>(id)?;
        }
        for &weight in weights {
            self.writer.write_f32::<LittleEndian>(weight)?;
        }
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Flush and return the inner writer.
    ///
    /// A writer that never saw a record still emits a zero width header so the
    /// output decodes as an empty model.
    pub fn finish(mut self) -> Result<W> {
        if self.width.is_none() {
            self.writer.write_u32::<LittleEndian>(0)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Streaming reader for the binary format.
///
/// Iterates records until end of input. A truncated trailing record is a
/// [`XimlError::Data`] error.
pub struct BinaryModelReader<R: Read> {
    reader: R,
    layout: RecordLayout,
    width: usize,
    record_size: u64,
    next_index: u32,
    buffer: Vec<u8>,
    done: bool,
}

impl<R: Read> BinaryModelReader<R> {
    /// Validate the signature and read the width header.
    pub fn new(mut reader: R, layout: RecordLayout) -> Result<Self> {
        let mut signature = [0u8; 4];
        if read_full(&mut reader, &mut signature)? != signature.len() || &signature != SIGNATURE {
            return Err(XimlError::data("Invalid binary format"));
        }

        let width = match reader.read_u32::<LittleEndian>() {
            Ok(width) => width as usize,
            Err(e) if e.kind() == IoErrorKind::UnexpectedEof => {
                return Err(XimlError::data("Invalid binary format: missing width header"));
            }
            Err(e) => return Err(e.into()),
        };

        let record_size = layout.record_size(width);
        Ok(BinaryModelReader {
            reader,
            layout,
            width,
            record_size,
            next_index: 0,
            // Grows with the bytes actually present, never with the header.
            buffer: Vec::new(),
            // Zero-width indexed records take no bytes; there is nothing to read.
            done: record_size == 0,
        })
    }

    /// Number of floats per record.
    pub fn width(&self) -> usize {
        self.width
    }

    fn read_record(&mut self) -> Result<Option<Record>> {
        self.buffer.clear();
        let read = (&mut self.reader)
            .take(self.record_size)
            .read_to_end(&mut self.buffer)?;
        if read == 0 {
            return Ok(None);
        }
        if (read as u64) < self.record_size {
            return Err(XimlError::data(format!(
                "Truncated record {}: expected {} bytes, found {read}",
                self.next_index, self.record_size
            )));
        }

        let mut cursor = &self.buffer[..];
        let id = match self.layout {
            RecordLayout::Keyed => cursor.read_u32::<LittleEndian>()?,
            RecordLayout::Indexed => self.next_index,
        };
        let mut weights = vec![0f32; self.width];
        cursor.read_f32_into::<LittleEndian>(&mut weights)?;

        self.next_index = self.next_index.wrapping_add(1);
        Ok(Some(Record { id, weights }))
    }
}

impl<R: Read> Iterator for BinaryModelReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the input allows and return the byte count.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Encode records into an in-memory buffer.
pub fn encode(records: &[Record], layout: RecordLayout) -> Result<Vec<u8>> {
    let capacity = SIGNATURE.len()
        + VALUE_SIZE
        + records.first().map_or(0, |r| {
            usize::try_from(layout.record_size(r.weights.len()))
                .unwrap_or(0)
                .saturating_mul(records.len())
        });
    let mut writer = BinaryModelWriter::new(Vec::with_capacity(capacity), layout)?;
    for record in records {
        writer.write_record(record.id, &record.weights)?;
    }
    writer.finish()
}

/// Decode every record from a buffer.
pub fn decode(bytes: &[u8], layout: RecordLayout) -> Result<Vec<Record>> {
    BinaryModelReader::new(bytes, layout)?.collect()
}

/// Decode only the records whose id is in `wanted`.
///
/// Unwanted records are still read in full so the stream stays aligned.
pub fn decode_partial(bytes: &[u8], layout: RecordLayout, wanted: &HashSet<u32>) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for record in BinaryModelReader::new(bytes, layout)? {
        let record = record?;
        if wanted.contains(&record.id) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Read a binary model file into an id-ordered map.
pub fn read_model(path: &Path, layout: RecordLayout) -> Result<BTreeMap<u32, Vec<f32>>> {
    read_model_filtered(path, layout, |_| true)
}

/// Read only the given ids from a binary model file.
pub fn read_partial_model(
    path: &Path,
    layout: RecordLayout,
    ids: &HashSet<u32>,
) -> Result<BTreeMap<u32, Vec<f32>>> {
    read_model_filtered(path, layout, |id| ids.contains(&id))
}

fn read_model_filtered<F>(path: &Path, layout: RecordLayout, keep: F) -> Result<BTreeMap<u32, Vec<f32>>>
where
    F: Fn(u32) -> bool,
{
    check_file_readable(path)?;
    let file = File::open(path)
        .map_err(|e| XimlError::config(format!("Cannot open '{}': {e}", path.display())))?;

    let mut model = BTreeMap::new();
    let reader = BinaryModelReader::new(BufReader::new(file), layout)?;
    for record in reader {
        let record = record?;
        if keep(record.id) {
            model.insert(record.id, record.weights);
        }
    }

    debug!("Read {} records from '{}'", model.len(), path.display());
    Ok(model)
}

/// Write records to a binary model file, creating parent directories.
pub fn write_model<'a, I>(path: &Path, layout: RecordLayout, records: I) -> Result<usize>
where
    I: IntoIterator<Item = (u32, &'a [f32])>,
{
    create_parent_dirs(path)?;
    let file = File::create(path)?;
    let mut writer = BinaryModelWriter::new(BufWriter::new(file), layout)?;
    for (id, weights) in records {
        writer.write_record(id, weights)?;
    }
    let written = writer.len();
    writer.finish()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::new(0, vec![0.25, -1.5, 3.0]),
            Record::new(7, vec![1.0, 0.0, -0.125]),
            Record::new(3, vec![f32::MAX, f32::MIN_POSITIVE, 42.0]),
        ]
    }

    #[test]
    fn test_keyed_round_trip() {
        let records = sample_records();
        let bytes = encode(&records, RecordLayout::Keyed).unwrap();
        assert_eq!(&bytes[..4], SIGNATURE);
        assert_eq!(bytes.len(), 4 + 4 + 3 * (4 + 3 * 4));
        assert_eq!(decode(&bytes, RecordLayout::Keyed).unwrap(), records);
    }

    #[test]
    fn test_indexed_layout_uses_positions() {
        let records = sample_records();
        let bytes = encode(&records, RecordLayout::Indexed).unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 3 * 3 * 4);

        let decoded = decode(&bytes, RecordLayout::Indexed).unwrap();
        let ids: Vec<u32> = decoded.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(decoded[1].weights, records[1].weights);
    }

    #[test]
    fn test_header_is_little_endian() {
        let bytes = encode(&[Record::new(0x0102_0304, vec![1.0, 2.0])], RecordLayout::Keyed).unwrap();
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[4, 3, 2, 1]);
        assert_eq!(&bytes[12..16], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_width_mismatch_is_rejected_on_write() {
        let mut writer = BinaryModelWriter::new(Vec::new(), RecordLayout::Keyed).unwrap();
        writer.write_record(0, &[1.0, 2.0]).unwrap();
        let err = writer.write_record(1, &[1.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_invalid_signature() {
        let mut bytes = encode(&sample_records(), RecordLayout::Keyed).unwrap();
        bytes[0] = b'X';
        bytes[1] = b'X';
        let err = decode(&bytes, RecordLayout::Keyed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.to_string().contains("Invalid binary format"));

        assert!(decode(b"Xi", RecordLayout::Keyed).is_err());
        assert!(decode(b"", RecordLayout::Keyed).is_err());
    }

    #[test]
    fn test_truncated_record() {
        let bytes = encode(&sample_records(), RecordLayout::Keyed).unwrap();
        let truncated = &bytes[..bytes.len() - 3];
        let err = decode(truncated, RecordLayout::Keyed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.to_string().contains("Truncated record 2"));
    }

    #[test]
    fn test_missing_width_header() {
        let err = decode(b"XiML\x01", RecordLayout::Keyed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_oversized_width_header_is_truncation() {
        let mut bytes = b"XiML".to_vec();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 12]);

        for layout in [RecordLayout::Keyed, RecordLayout::Indexed] {
            let err = decode(&bytes, layout).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Data);
            assert!(err.to_string().contains("Truncated record 0"), "{err}");
        }
    }

    #[test]
    fn test_header_without_records() {
        let mut writer = BinaryModelWriter::new(Vec::new(), RecordLayout::Keyed).unwrap();
        writer.write_header(3).unwrap();
        writer.write_header(3).unwrap();
        assert_eq!(writer.width(), Some(3));
        assert_eq!(writer.write_header(2).unwrap_err().kind(), ErrorKind::Data);
        assert_eq!(writer.write_record(1, &[1.0]).unwrap_err().kind(), ErrorKind::Data);

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, b"XiML\x03\0\0\0");
        let reader = BinaryModelReader::new(&bytes[..], RecordLayout::Keyed).unwrap();
        assert_eq!(reader.width(), 3);
        assert_eq!(reader.count(), 0);
    }

    #[test]
    fn test_empty_model() {
        let bytes = encode(&[], RecordLayout::Keyed).unwrap();
        assert_eq!(bytes, b"XiML\0\0\0\0");
        assert!(decode(&bytes, RecordLayout::Keyed).unwrap().is_empty());
        assert!(decode(&bytes, RecordLayout::Indexed).unwrap().is_empty());
    }

    #[test]
    fn test_decode_partial_keeps_alignment() {
        let records = sample_records();
        let bytes = encode(&records, RecordLayout::Keyed).unwrap();
        let wanted: HashSet<u32> = [3, 99].into_iter().collect();

        let decoded = decode_partial(&bytes, RecordLayout::Keyed, &wanted).unwrap();
        assert_eq!(decoded, vec![records[2].clone()]);
    }

    #[test]
    fn test_model_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/lsi.bin");
        let rows: Vec<(u32, Vec<f32>)> = vec![(2, vec![0.5, 0.5]), (1, vec![-1.0, 2.0])];

        let written = write_model(
            &path,
            RecordLayout::Keyed,
            rows.iter().map(|(id, w)| (*id, w.as_slice())),
        )
        .unwrap();
        assert_eq!(written, 2);

        let model = read_model(&path, RecordLayout::Keyed).unwrap();
        assert_eq!(model.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(model[&2], vec![0.5, 0.5]);

        let ids: HashSet<u32> = [1].into_iter().collect();
        let partial = read_partial_model(&path, RecordLayout::Keyed, &ids).unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[&1], vec![-1.0, 2.0]);
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_model(&dir.path().join("nope.bin"), RecordLayout::Keyed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
