//! Minimal OOXML workbook writer.
//!
//! Emits the smallest spreadsheet package a conforming reader accepts: the
//! content-types part, the package relationships, one workbook with one
//! sheet, and the sheet itself with inline strings. Every row carries all
//! columns so readers that ignore cell references keep the alignment.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use poisweep_core::PoiRecord;

use crate::{ExportError, CATEGORY_DELIMITER, COLUMNS};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="results" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Serializes records to XLSX workbook bytes.
///
/// # Errors
///
/// Returns [`ExportError::Zip`] or [`ExportError::Io`] if the archive cannot
/// be written.
pub fn write_xlsx(records: &[PoiRecord]) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", opts)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;
    zip.start_file("_rels/.rels", opts)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;
    zip.start_file("xl/workbook.xml", opts)?;
    zip.write_all(WORKBOOK.as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", opts)?;
    zip.write_all(WORKBOOK_RELS.as_bytes())?;
    zip.start_file("xl/worksheets/sheet1.xml", opts)?;
    zip.write_all(worksheet_xml(records).as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn worksheet_xml(records: &[PoiRecord]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    xml.push_str("<row>");
    for column in COLUMNS {
        push_string_cell(&mut xml, column);
    }
    xml.push_str("</row>");

    for r in records {
        xml.push_str("<row>");
        push_string_cell(&mut xml, &r.name);
        push_string_cell(&mut xml, r.address.as_deref().unwrap_or(""));
        push_number_cell(&mut xml, r.latitude);
        push_number_cell(&mut xml, r.longitude);
        match r.rating {
            Some(rating) => push_number_cell(&mut xml, rating),
            None => push_string_cell(&mut xml, ""),
        }
        #[allow(clippy::cast_precision_loss)]
        push_number_cell(&mut xml, r.review_count as f64);
        push_string_cell(
            &mut xml,
            &r.categories.join(&CATEGORY_DELIMITER.to_string()),
        );
        push_string_cell(&mut xml, r.phone.as_deref().unwrap_or(""));
        push_string_cell(&mut xml, r.website.as_deref().unwrap_or(""));
        push_string_cell(&mut xml, r.external_link.as_deref().unwrap_or(""));
        push_number_cell(&mut xml, r.distance_km);
        push_string_cell(&mut xml, &r.source_anchor_id);
        push_string_cell(&mut xml, &r.search_query);
        push_string_cell(&mut xml, &r.retrieved_at.to_rfc3339());
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_string_cell(xml: &mut String, value: &str) {
    xml.push_str("<c t=\"inlineStr\"><is><t>");
    push_xml_escaped(xml, value);
    xml.push_str("</t></is></c>");
}

fn push_number_cell(xml: &mut String, value: f64) {
    xml.push_str("<c><v>");
    xml.push_str(&value.to_string());
    xml.push_str("</v></c>");
}

fn push_xml_escaped(xml: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => xml.push_str("&amp;"),
            '<' => xml.push_str("&lt;"),
            '>' => xml.push_str("&gt;"),
            '"' => xml.push_str("&quot;"),
            '\'' => xml.push_str("&apos;"),
            _ => xml.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::tests::sample_records;

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn output_is_a_zip_archive_with_expected_parts() {
        let bytes = write_xlsx(&sample_records()).unwrap();
        assert_eq!(&bytes[..2], b"PK", "xlsx must start with the ZIP magic");

        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/worksheets/sheet1.xml",
        ] {
            assert!(names.contains(&part), "missing part {part}");
        }
    }

    #[test]
    fn worksheet_contains_header_and_escaped_values() {
        let bytes = write_xlsx(&sample_records()).unwrap();
        let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<t>name</t>"));
        assert!(sheet.contains("<t>distance_km</t>"));
        // The sample name contains a quote; XML escaping must kick in.
        assert!(sheet.contains("Cafe &quot;Blue&quot;, Bellandur"));
        assert!(sheet.contains("<v>12.9188658</v>"));
    }

    #[test]
    fn empty_record_set_still_produces_a_valid_workbook() {
        let bytes = write_xlsx(&[]).unwrap();
        let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");
        // Header row only.
        assert_eq!(sheet.matches("<row>").count(), 1);
    }

    #[test]
    fn every_row_carries_all_columns() {
        let bytes = write_xlsx(&sample_records()).unwrap();
        let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");
        let cells = sheet.matches("<c").count();
        // Header + 2 records, 14 cells each.
        assert_eq!(cells, 3 * COLUMNS.len());
    }
}
