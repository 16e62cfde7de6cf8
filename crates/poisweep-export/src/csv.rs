//! RFC 4180 CSV writer and parser for result sets.
//!
//! Fields containing the delimiter, a quote, or a line break are quoted and
//! embedded quotes doubled. `categories` travels as a single
//! [`CATEGORY_DELIMITER`]-joined cell and is re-split on parse.

use chrono::{DateTime, Utc};

use poisweep_core::PoiRecord;

use crate::{ExportError, CATEGORY_DELIMITER, COLUMNS};

/// Serializes records to CSV bytes. An empty record set yields a header-only
/// file.
#[must_use]
pub fn write_csv(records: &[PoiRecord]) -> Vec<u8> {
    let mut out = String::new();
    write_row(&mut out, COLUMNS.iter().map(|c| (*c).to_string()));

    for r in records {
        let fields = [
            r.name.clone(),
            r.address.clone().unwrap_or_default(),
            r.latitude.to_string(),
            r.longitude.to_string(),
            r.rating.map(|v| v.to_string()).unwrap_or_default(),
            r.review_count.to_string(),
            r.categories.join(&CATEGORY_DELIMITER.to_string()),
            r.phone.clone().unwrap_or_default(),
            r.website.clone().unwrap_or_default(),
            r.external_link.clone().unwrap_or_default(),
            r.distance_km.to_string(),
            r.source_anchor_id.clone(),
            r.search_query.clone(),
            r.retrieved_at.to_rfc3339(),
        ];
        write_row(&mut out, fields.into_iter());
    }

    out.into_bytes()
}

fn write_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        push_escaped(out, &field);
    }
    out.push_str("\r\n");
}

fn push_escaped(out: &mut String, field: &str) {
    let needs_quoting = field.contains([',', '"', '\r', '\n']);
    if needs_quoting {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Parses CSV bytes previously produced by [`write_csv`] back into records.
///
/// # Errors
///
/// Returns [`ExportError::CsvParse`] on a malformed header, a row with the
/// wrong column count, or an unparseable numeric/timestamp cell.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<PoiRecord>, ExportError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ExportError::CsvParse {
        line: 0,
        reason: format!("not UTF-8: {e}"),
    })?;

    let rows = split_rows(text)?;
    let mut iter = rows.into_iter().enumerate();

    let (_, header) = iter.next().ok_or(ExportError::CsvParse {
        line: 1,
        reason: "missing header row".to_string(),
    })?;
    if header != COLUMNS {
        return Err(ExportError::CsvParse {
            line: 1,
            reason: format!("unexpected header: {header:?}"),
        });
    }

    let mut records = Vec::new();
    for (i, row) in iter {
        let line = i + 1;
        if row.len() != COLUMNS.len() {
            return Err(ExportError::CsvParse {
                line,
                reason: format!("expected {} columns, got {}", COLUMNS.len(), row.len()),
            });
        }
        records.push(row_to_record(&row, line)?);
    }
    Ok(records)
}

fn row_to_record(row: &[String], line: usize) -> Result<PoiRecord, ExportError> {
    let parse_f64 = |cell: &str, col: &str| -> Result<f64, ExportError> {
        cell.parse::<f64>().map_err(|e| ExportError::CsvParse {
            line,
            reason: format!("bad {col} '{cell}': {e}"),
        })
    };
    let opt = |cell: &str| -> Option<String> {
        if cell.is_empty() {
            None
        } else {
            Some(cell.to_string())
        }
    };

    let rating = if row[4].is_empty() {
        None
    } else {
        Some(parse_f64(&row[4], "rating")?)
    };
    let review_count = row[5].parse::<u64>().map_err(|e| ExportError::CsvParse {
        line,
        reason: format!("bad review_count '{}': {e}", row[5]),
    })?;
    let categories = if row[6].is_empty() {
        Vec::new()
    } else {
        row[6]
            .split(CATEGORY_DELIMITER)
            .map(ToString::to_string)
            .collect()
    };
    let retrieved_at = DateTime::parse_from_rfc3339(&row[13])
        .map_err(|e| ExportError::CsvParse {
            line,
            reason: format!("bad retrieved_at '{}': {e}", row[13]),
        })?
        .with_timezone(&Utc);

    Ok(PoiRecord {
        name: row[0].clone(),
        address: opt(&row[1]),
        latitude: parse_f64(&row[2], "latitude")?,
        longitude: parse_f64(&row[3], "longitude")?,
        rating,
        review_count,
        categories,
        phone: opt(&row[7]),
        website: opt(&row[8]),
        external_link: opt(&row[9]),
        distance_km: parse_f64(&row[10], "distance_km")?,
        source_anchor_id: row[11].clone(),
        search_query: row[12].clone(),
        retrieved_at,
    })
}

/// Splits CSV text into rows of fields, honouring quoted fields that may
/// contain delimiters, doubled quotes, and line breaks.
fn split_rows(text: &str) -> Result<Vec<Vec<String>>, ExportError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    row.push(std::mem::take(&mut field));
                }
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    line += 1;
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                '\n' => {
                    line += 1;
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(ExportError::CsvParse {
            line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}
