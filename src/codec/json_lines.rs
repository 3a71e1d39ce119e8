//! Conversion between the toolkit's JSON-lines projection dumps and the
//! binary format.
//!
//! Each input line holds a single-entry object mapping a row id to its
//! weights:
//! ```jsonl
//! {"0": [0.12, -0.4, 0.03]}
//! {"1": [0.98, 0.11, -0.2]}
//! ```
//!
//! or a bare weight array, whose id is its 0-based position among the
//! non-blank lines:
//! ```jsonl
//! [0.12, -0.4, 0.03]
//! [0.98, 0.11, -0.2]
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use serde_json::{Map, Value};

use crate::codec::binary::{BinaryModelWriter, RecordLayout, read_model};
use crate::error::{Result, XimlError};
use crate::util::{check_file_readable, create_parent_dirs};

/// Convert a JSON-lines projection dump into a keyed binary model.
///
/// Returns the number of records written.
pub fn convert_json_lines(input: &Path, output: &Path) -> Result<usize> {
    convert_filtered(input, output, |_| true)
}

/// Like [`convert_json_lines`] but only keeps rows whose id is in `ids`.
///
/// The width header is taken from the first row, so an empty selection still
/// produces a model of the dump's width.
pub fn partial_convert_json_lines(input: &Path, output: &Path, ids: &HashSet<u32>) -> Result<usize> {
    convert_filtered(input, output, |id| ids.contains(&id))
}

fn convert_filtered<F>(input: &Path, output: &Path, keep: F) -> Result<usize>
where
    F: Fn(u32) -> bool,
{
    check_file_readable(input)?;
    create_parent_dirs(output)?;

    let reader = BufReader::new(File::open(input)?);
    let mut writer = BinaryModelWriter::new(BufWriter::new(File::create(output)?), RecordLayout::Keyed)?;

    let mut row_index: u32 = 0;
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (id, weights) = parse_row(line, row_index).map_err(|e| {
            XimlError::caught(
                format!("Bad format of JSON file '{}' on line {}", input.display(), line_num + 1),
                e,
            )
        })?;
        row_index = row_index.wrapping_add(1);

        if writer.width().is_none() {
            writer.write_header(weights.len())?;
        }
        if keep(id) {
            writer.write_record(id, &weights)?;
        }
    }

    let written = writer.len();
    writer.finish()?;
    info!(
        "Converted {written} rows from '{}' into '{}'",
        input.display(),
        output.display()
    );
    Ok(written)
}

fn parse_row(line: &str, index: u32) -> std::result::Result<(u32, Vec<f32>), String> {
    let (id, value) = match serde_json::from_str::<Value>(line).map_err(|e| e.to_string())? {
        array @ Value::Array(_) => (index, array),
        Value::Object(object) => {
            let mut entries = object.into_iter();
            let (key, value) = entries.next().ok_or("empty object")?;
            if entries.next().is_some() {
                return Err("expected exactly one id per line".to_string());
            }
            let id = key
                .parse::<u32>()
                .map_err(|e| format!("invalid row id '{key}': {e}"))?;
            (id, value)
        }
        _ => return Err("expected an object or an array".to_string()),
    };

    let weights = value
        .as_array()
        .ok_or_else(|| format!("row '{id}' is not an array"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| format!("row '{id}' contains a non-numeric value"))
        })
        .collect::<std::result::Result<Vec<f32>, String>>()?;
    Ok((id, weights))
}

/// Dump a keyed binary model back to JSON lines, in id order.
pub fn revert_to_json_lines(input: &Path, output: &Path) -> Result<usize> {
    let model = read_model(input, RecordLayout::Keyed)?;
    create_parent_dirs(output)?;

    let mut writer = BufWriter::new(File::create(output)?);
    for (id, weights) in &model {
        let mut object = Map::new();
        object.insert(id.to_string(), serde_json::to_value(weights)?);
        serde_json::to_writer(&mut writer, &object)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(model.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::binary::BinaryModelReader;
    use crate::error::ErrorKind;
    use std::fs;

    #[test]
    fn test_convert_and_revert() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lsi.jsonl");
        let binary = dir.path().join("lsi.bin");
        let reverted = dir.path().join("lsi_reverted.jsonl");
        fs::write(&input, "{\"1\": [0.5, -0.25]}\n\n{\"0\": [1.0, 2.0]}\n").unwrap();

        assert_eq!(convert_json_lines(&input, &binary).unwrap(), 2);
        let model = read_model(&binary, RecordLayout::Keyed).unwrap();
        assert_eq!(model[&1], vec![0.5, -0.25]);
        assert_eq!(model[&0], vec![1.0, 2.0]);

        assert_eq!(revert_to_json_lines(&binary, &reverted).unwrap(), 2);
        let text = fs::read_to_string(&reverted).unwrap();
        assert_eq!(text, "{\"0\":[1.0,2.0]}\n{\"1\":[0.5,-0.25]}\n");
    }

    #[test]
    fn test_partial_convert() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lsi.jsonl");
        let binary = dir.path().join("lsi.bin");
        fs::write(&input, "{\"0\": [1.0]}\n{\"1\": [2.0]}\n{\"2\": [3.0]}\n").unwrap();

        let ids: HashSet<u32> = [0, 2].into_iter().collect();
        assert_eq!(partial_convert_json_lines(&input, &binary, &ids).unwrap(), 2);
        let model = read_model(&binary, RecordLayout::Keyed).unwrap();
        assert_eq!(model.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_convert_bare_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lsi.jsonl");
        let binary = dir.path().join("lsi.bin");
        fs::write(&input, "[1.0, 2.0]\n\n[3.0, 4.0]\n").unwrap();

        assert_eq!(convert_json_lines(&input, &binary).unwrap(), 2);
        let model = read_model(&binary, RecordLayout::Keyed).unwrap();
        assert_eq!(model.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(model[&0], vec![1.0, 2.0]);
        assert_eq!(model[&1], vec![3.0, 4.0]);

        let ids: HashSet<u32> = [1].into_iter().collect();
        assert_eq!(partial_convert_json_lines(&input, &binary, &ids).unwrap(), 1);
        let model = read_model(&binary, RecordLayout::Keyed).unwrap();
        assert_eq!(model.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_partial_convert_without_matches_keeps_width() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lsi.jsonl");
        let binary = dir.path().join("lsi.bin");
        fs::write(&input, "{\"0\": [1.0, 2.0]}\n{\"1\": [3.0, 4.0]}\n").unwrap();

        let ids: HashSet<u32> = [42].into_iter().collect();
        assert_eq!(partial_convert_json_lines(&input, &binary, &ids).unwrap(), 0);
        assert_eq!(fs::read(&binary).unwrap(), b"XiML\x02\0\0\0");

        let reader = BinaryModelReader::new(File::open(&binary).unwrap(), RecordLayout::Keyed).unwrap();
        assert_eq!(reader.width(), 2);
        assert!(read_model(&binary, RecordLayout::Keyed).unwrap().is_empty());
    }

    #[test]
    fn test_bad_line_is_caught() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lsi.jsonl");
        fs::write(&input, "{\"0\": [1.0]}\n{\"x\": [2.0]}\n").unwrap();

        let err = convert_json_lines(&input, &dir.path().join("lsi.bin")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Caught);
        assert!(err.to_string().contains("line 2"));

        fs::write(&input, "[1.0]\n\"text\"\n").unwrap();
        let err = convert_json_lines(&input, &dir.path().join("lsi.bin")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Caught);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_missing_input_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_json_lines(&dir.path().join("none.jsonl"), &dir.path().join("o.bin"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
