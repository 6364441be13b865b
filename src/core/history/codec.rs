//! Two-field CSV row codec for history segments.
//!
//! Fields are quoted when they contain the delimiter, quotes or line breaks,
//! so any text round-trips. Reading is lenient: rows that are not exactly two
//! valid UTF-8 fields come back as `None` and the caller drops them.

use std::io::{Read, Write};

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};

use crate::shared::error::AppResult;
use crate::shared::types::TranslationRecord;

pub fn parse_row(row: &StringRecord) -> Option<TranslationRecord> {
    if row.len() != 2 {
        return None;
    }
    Some(TranslationRecord::new(row.get(0)?, row.get(1)?))
}

/// Decode every row of a segment, one entry per physical row.
pub fn read_rows<R: Read>(input: R) -> Vec<Option<TranslationRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    reader
        .records()
        .map(|row| match row {
            Ok(row) => parse_row(&row),
            Err(e) => {
                log::debug!("[HistoryStore] Unreadable row skipped: {}", e);
                None
            }
        })
        .collect()
}

/// Decode only the well-formed records of a segment.
pub fn read_records<R: Read>(input: R) -> Vec<TranslationRecord> {
    read_rows(input).into_iter().flatten().collect()
}

/// True when `bytes` is empty or ends with a line break outside any quoted
/// field, i.e. the last row was written completely. Escaped quotes are
/// doubled, so quote parity tells whether a field is still open.
pub fn ends_on_row_boundary(bytes: &[u8]) -> bool {
    let Some(&last) = bytes.last() else {
        return true;
    };
    let quotes = bytes.iter().filter(|&&b| b == b'"').count();
    last == b'\n' && quotes % 2 == 0
}

pub fn write_records<W: Write>(output: W, records: &[TranslationRecord]) -> AppResult<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(output);

    for record in records {
        writer.write_record([record.original.as_str(), record.translated.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_separators_survive() {
        let records = vec![
            TranslationRecord::new("one, two", "ஒன்று, இரண்டு"),
            TranslationRecord::new("line\nbreak", "\"quoted\""),
            TranslationRecord::new("crlf\r\nend", ""),
        ];
        let mut buf = Vec::new();
        write_records(&mut buf, &records).unwrap();

        assert_eq!(read_records(buf.as_slice()), records);
    }

    #[test]
    fn test_row_boundary_detection() {
        assert!(ends_on_row_boundary(b""));
        assert!(ends_on_row_boundary(b"a,b\n"));
        assert!(ends_on_row_boundary(b"a,b\r\n"));
        assert!(ends_on_row_boundary("\"x, \"\"y\"\"\",z\n".as_bytes()));

        assert!(!ends_on_row_boundary(b"a,b"));
        assert!(!ends_on_row_boundary("kept,x\n\"Hello, wor".as_bytes()));
        // Line break inside a quoted field that never closed.
        assert!(!ends_on_row_boundary(b"kept,x\n\"two\nlines"));
        assert!(!ends_on_row_boundary(b"kept,x\n\"two\n"));
    }

    #[test]
    fn test_wrong_field_count_is_skipped() {
        let raw = "a,b\nonly-one\nx,y,z\nc,d\n";
        let rows = read_rows(raw.as_bytes());

        assert_eq!(rows.len(), 4);
        assert!(rows[1].is_none());
        assert!(rows[2].is_none());
        assert_eq!(
            read_records(raw.as_bytes()),
            vec![TranslationRecord::new("a", "b"), TranslationRecord::new("c", "d")]
        );
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let mut raw = b"good,row\n".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe, b',', b'x', b'\n']);
        raw.extend_from_slice(b"also,good\n");

        let records = read_records(raw.as_slice());
        assert_eq!(
            records,
            vec![
                TranslationRecord::new("good", "row"),
                TranslationRecord::new("also", "good")
            ]
        );
    }
}
