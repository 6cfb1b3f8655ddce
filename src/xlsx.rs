//! Minimal OOXML spreadsheet support: read the first worksheet of an
//! `.xlsx` into a [`RawTable`], and write report sections as a multi-sheet
//! workbook.
//!
//! Reading walks `xl/workbook.xml` and its relationships to find the first
//! sheet, resolves shared strings, and honors sparse `r="B7"` cell
//! references. Writing emits inline strings only, so no shared string table
//! is produced.

use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::tabular::{Cell, RawTable};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Worksheets with more rows than this are rejected.
const MAX_ROWS: usize = 200_000;
/// Excel's limit on sheet name length.
const MAX_SHEET_NAME: usize = 31;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("not a valid xlsx archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("malformed xml: {0}")]
    Xml(String),
    #[error("{0}")]
    Format(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn xml_err(e: impl std::fmt::Display) -> XlsxError {
    XlsxError::Xml(e.to_string())
}

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

// ─── Reading ────────────────────────────────────────────────────────

/// Parse the first worksheet. The first non-empty row is the header row.
pub fn read_first_sheet(bytes: &[u8]) -> Result<RawTable, XlsxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_path = first_worksheet_path(&mut archive)?;
    let sheet_xml = read_zip_entry_bounded(&mut archive, &sheet_path, MAX_XML_ENTRY_BYTES)?;
    let rows = parse_sheet_rows(&sheet_xml, &shared_strings, MAX_ROWS)?;
    Ok(rows_to_table(rows))
}

fn has_entry(archive: &Archive<'_>, name: &str) -> bool {
    archive.file_names().any(|n| n == name)
}

fn read_zip_entry_bounded(
    archive: &mut Archive<'_>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, XlsxError> {
    let entry = archive.by_name(name)?;
    let mut out = Vec::new();
    entry.take(max_bytes).read_to_end(&mut out)?;
    if out.len() as u64 >= max_bytes {
        return Err(XlsxError::Format(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn read_shared_strings(archive: &mut Archive<'_>) -> Result<Vec<String>, XlsxError> {
    if !has_entry(archive, "xl/sharedStrings.xml") {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;

    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    // Phonetic runs carry <t> elements that are not part of the value.
    let mut in_phonetic = false;
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(te) if in_t => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&te.unescape().map_err(xml_err)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Resolve the first `<sheet>` of the workbook through its relationship id,
/// falling back to the lowest-numbered `xl/worksheets/sheetN.xml`.
fn first_worksheet_path(archive: &mut Archive<'_>) -> Result<String, XlsxError> {
    if let Some(path) = worksheet_path_from_workbook(archive)? {
        if has_entry(archive, &path) {
            return Ok(path);
        }
    }

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
        .into_iter()
        .next()
        .ok_or_else(|| XlsxError::Format("workbook contains no worksheets".to_string()))
}

fn worksheet_path_from_workbook(archive: &mut Archive<'_>) -> Result<Option<String>, XlsxError> {
    const RELS: &str = "xl/_rels/workbook.xml.rels";
    if !has_entry(archive, "xl/workbook.xml") || !has_entry(archive, RELS) {
        return Ok(None);
    }

    let workbook = read_zip_entry_bounded(archive, "xl/workbook.xml", MAX_XML_ENTRY_BYTES)?;
    let mut rel_id = None;
    let mut reader = quick_xml::Reader::from_reader(workbook.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                rel_id = attr(&e, b"id");
                break;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    let Some(rel_id) = rel_id else {
        return Ok(None);
    };

    let rels = read_zip_entry_bounded(archive, RELS, MAX_XML_ENTRY_BYTES)?;
    let mut reader = quick_xml::Reader::from_reader(rels.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship"
                    && attr(&e, b"Id").as_deref() == Some(rel_id.as_str()) =>
            {
                return Ok(attr(&e, b"Target").map(|target| {
                    match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    }
                }));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(None)
}

/// Column index (0-based) from a cell reference such as `AB12`.
fn column_index(cell_ref: &str) -> Option<usize> {
    let letters: String = cell_ref
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let n = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b.to_ascii_uppercase() - b'A' + 1) as usize);
    Some(n - 1)
}

/// Column letters (0 → `A`, 26 → `AA`).
fn column_name(mut index: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

struct PendingCell {
    col: usize,
    kind: String,
    text: String,
}

type SheetRow = (usize, Vec<(usize, Cell)>);

fn parse_sheet_rows(
    xml: &[u8],
    shared_strings: &[String],
    max_rows: usize,
) -> Result<Vec<SheetRow>, XlsxError> {
    let mut rows: Vec<SheetRow> = Vec::new();
    let mut current: Option<SheetRow> = None;
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut next_row = 1usize;
    let mut next_col = 0usize;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    let idx = attr(&e, b"r")
                        .and_then(|r| r.parse().ok())
                        .unwrap_or(next_row);
                    next_row = idx + 1;
                    next_col = 0;
                    current = Some((idx, Vec::new()));
                }
                b"c" => {
                    let col = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_col);
                    next_col = col + 1;
                    pending = Some(PendingCell {
                        col,
                        kind: attr(&e, b"t").unwrap_or_default(),
                        text: String::new(),
                    });
                }
                b"v" | b"t" if pending.is_some() => in_value = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    next_row = attr(&e, b"r")
                        .and_then(|r| r.parse::<usize>().ok())
                        .unwrap_or(next_row)
                        + 1;
                }
                b"c" => {
                    next_col = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_col)
                        + 1;
                }
                _ => {}
            },
            Event::Text(te) if in_value => {
                if let Some(cell) = pending.as_mut() {
                    cell.text.push_str(&te.unescape().map_err(xml_err)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let (Some(cell), Some((_, cells))) = (pending.take(), current.as_mut()) {
                        let value = convert_cell(&cell, shared_strings);
                        if !value.is_empty() {
                            cells.push((cell.col, value));
                        }
                    }
                }
                b"row" => {
                    if let Some(row) = current.take() {
                        if rows.len() >= max_rows {
                            return Err(XlsxError::Format(format!(
                                "worksheet has more than {} rows",
                                max_rows
                            )));
                        }
                        rows.push(row);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn convert_cell(cell: &PendingCell, shared_strings: &[String]) -> Cell {
    let raw = cell.text.trim();
    match cell.kind.as_str() {
        "s" => raw
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i))
            .map(|s| Cell::text(s.as_str()))
            .unwrap_or(Cell::Empty),
        "inlineStr" | "str" | "d" => Cell::text(cell.text.as_str()),
        "b" => Cell::text(if raw == "1" { "TRUE" } else { "FALSE" }),
        "e" => Cell::Empty,
        _ => match raw.parse::<f64>() {
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::text(raw),
        },
    }
}

fn rows_to_table(mut rows: Vec<SheetRow>) -> RawTable {
    rows.sort_by_key(|(idx, _)| *idx);
    let mut iter = rows.into_iter().skip_while(|(_, cells)| cells.is_empty());

    let Some((_, header_cells)) = iter.next() else {
        return RawTable::default();
    };
    let width = header_cells.iter().map(|(c, _)| c + 1).max().unwrap_or(0);
    let mut headers = vec![String::new(); width];
    for (col, cell) in header_cells {
        headers[col] = cell.as_display();
    }

    let data = iter
        .map(|(_, cells)| {
            let mut row = vec![Cell::Empty; width];
            for (col, cell) in cells {
                if col < width {
                    row[col] = cell;
                }
            }
            row
        })
        .collect();

    RawTable::new(headers, data)
}

// ─── Writing ────────────────────────────────────────────────────────

/// One worksheet to write.
pub struct Sheet<'a> {
    pub name: &'a str,
    pub headers: &'a [String],
    pub rows: &'a [Vec<Cell>],
}

/// Write `sheets` to `path`, creating parent directories.
pub fn write_workbook_file(path: &Path, sheets: &[Sheet<'_>]) -> Result<(), XlsxError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_workbook(file, sheets)?;
    Ok(())
}

pub fn write_workbook<W: Write + Seek>(out: W, sheets: &[Sheet<'_>]) -> Result<W, XlsxError> {
    if sheets.is_empty() {
        return Err(XlsxError::Format(
            "a workbook needs at least one sheet".to_string(),
        ));
    }
    let names = unique_sheet_names(sheets.iter().map(|s| s.name));

    let mut zip = zip::ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(content_types_xml(sheets.len()).as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(root_rels_xml().as_bytes())?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml(&names).as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(workbook_rels_xml(sheets.len()).as_bytes())?;

    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(STYLES_XML.as_bytes())?;

    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(worksheet_xml(sheet).as_bytes())?;
    }

    Ok(zip.finish()?)
}

/// Excel forbids `[]:*?/\` in sheet names and caps them at 31 characters.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME).collect();
    if truncated.is_empty() {
        "Sheet".to_string()
    } else {
        truncated
    }
}

fn unique_sheet_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let base = sanitize_sheet_name(name);
        let mut candidate = base.clone();
        let mut n = 2;
        while out.iter().any(|o| o.eq_ignore_ascii_case(&candidate)) {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }
        out.push(candidate);
    }
    out
}

fn escape(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    quick_xml::escape::escape(cleaned.as_str()).into_owned()
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        NS_PKG_REL, NS_REL
    )
}

fn workbook_xml(names: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
        NS_MAIN, NS_REL
    );
    for (i, name) in names.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
        NS_PKG_REL
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i, NS_REL, i
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
        sheet_count + 1,
        NS_REL
    ));
    xml.push_str("</Relationships>");
    xml
}

/// Style ids: 1 = bold header, 2 = `#,##0`, 3 = `#,##0.00`.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="4"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/><xf numFmtId="3" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="4" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

fn worksheet_xml(sheet: &Sheet<'_>) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}"><sheetViews><sheetView workbookViewId="0"><pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/></sheetView></sheetViews><sheetData>"#,
        NS_MAIN
    );

    xml.push_str(r#"<row r="1">"#);
    for (col, header) in sheet.headers.iter().enumerate() {
        push_text_cell(&mut xml, col, 1, header, Some(1));
    }
    xml.push_str("</row>");

    for (i, row) in sheet.rows.iter().enumerate() {
        let r = i + 2;
        xml.push_str(&format!(r#"<row r="{}">"#, r));
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => push_text_cell(&mut xml, col, r, s, None),
                Cell::Number(n) => {
                    let style = if n.fract() == 0.0 { 2 } else { 3 };
                    xml.push_str(&format!(
                        r#"<c r="{}{}" s="{}"><v>{}</v></c>"#,
                        column_name(col),
                        r,
                        style,
                        n
                    ));
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_text_cell(xml: &mut String, col: usize, row: usize, text: &str, style: Option<u8>) {
    let style_attr = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
    xml.push_str(&format!(
        r#"<c r="{}{}" t="inlineStr"{}><is><t xml:space="preserve">{}</t></is></c>"#,
        column_name(col),
        row,
        style_attr,
        escape(text)
    ));
}

/// Sheet names of a workbook, in workbook order.
pub fn sheet_names(bytes: &[u8]) -> Result<Vec<String>, XlsxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let workbook = read_zip_entry_bounded(&mut archive, "xl/workbook.xml", MAX_XML_ENTRY_BYTES)?;
    let mut names = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(workbook.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"name")
                    .map(|a| a.unescape_value().map(|v| v.into_owned()))
                    .transpose()
                    .map_err(xml_err)?;
                if let Some(name) = name {
                    names.push(name);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_xlsx(files: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, body) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn column_letters_round_trip() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("AB12"), Some(27));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn reads_shared_strings_and_sparse_cells() {
        let bytes = build_xlsx(&[
            (
                "xl/sharedStrings.xml",
                r#"<sst><si><t>사번</t></si><si><t>성명</t></si><si><r><t>기본</t></r><r><t>급</t></r></si><si><t>Kim</t></si></sst>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData>
                    <row r="2"><c r="A2" t="s"><v>0</v></c><c r="B2" t="s"><v>1</v></c><c r="C2" t="s"><v>2</v></c></row>
                    <row r="3"><c r="A3"><v>1001</v></c><c r="B3" t="s"><v>3</v></c><c r="C3"><v>3000000</v></c></row>
                    <row r="4"><c r="A4" t="inlineStr"><is><t>E002</t></is></c><c r="C4"><v>2500000.5</v></c></row>
                </sheetData></worksheet>"#,
            ),
        ]);

        let table = read_first_sheet(&bytes).unwrap();
        assert_eq!(table.headers, vec!["사번", "성명", "기본급"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Number(1001.0));
        assert_eq!(table.rows[0][1], Cell::Text("Kim".to_string()));
        assert_eq!(table.rows[1][0], Cell::Text("E002".to_string()));
        assert_eq!(table.rows[1][1], Cell::Empty);
        assert_eq!(table.rows[1][2], Cell::Number(2500000.5));
    }

    #[test]
    fn oversized_sheet_is_rejected_not_truncated() {
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c></row>
            <row r="2"><c r="A2"><v>1</v></c></row>
            <row r="3"><c r="A3"><v>2</v></c></row>
        </sheetData></worksheet>"#;

        assert_eq!(parse_sheet_rows(xml.as_bytes(), &[], 3).unwrap().len(), 3);
        let err = parse_sheet_rows(xml.as_bytes(), &[], 2).unwrap_err();
        assert!(matches!(err, XlsxError::Format(_)));
        assert!(err.to_string().contains("more than 2 rows"));
    }

    #[test]
    fn follows_workbook_relationship_to_first_sheet() {
        let bytes = build_xlsx(&[
            (
                "xl/workbook.xml",
                r#"<workbook xmlns:r="r"><sheets><sheet name="Data" sheetId="1" r:id="rId7"/><sheet name="Other" sheetId="2" r:id="rId1"/></sheets></workbook>"#,
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<Relationships><Relationship Id="rId1" Target="worksheets/sheet1.xml"/><Relationship Id="rId7" Target="/xl/worksheets/sheet2.xml"/></Relationships>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>wrong</t></is></c></row></sheetData></worksheet>"#,
            ),
            (
                "xl/worksheets/sheet2.xml",
                r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>right</t></is></c></row></sheetData></worksheet>"#,
            ),
        ]);

        let table = read_first_sheet(&bytes).unwrap();
        assert_eq!(table.headers, vec!["right"]);
    }

    #[test]
    fn written_workbook_reads_back() {
        let headers = vec!["department".to_string(), "total".to_string()];
        let rows = vec![
            vec![Cell::text("R&D <core>"), Cell::Number(1_500_000.0)],
            vec![Cell::text("Sales"), Cell::Number(12.5)],
        ];
        let other_headers = vec!["metric".to_string()];
        let other_rows = vec![vec![Cell::text("count")]];
        let sheets = [
            Sheet {
                name: "Department Summary",
                headers: &headers,
                rows: &rows,
            },
            Sheet {
                name: "Summary: stats",
                headers: &other_headers,
                rows: &other_rows,
            },
        ];

        let bytes = write_workbook(Cursor::new(Vec::new()), &sheets)
            .unwrap()
            .into_inner();

        assert_eq!(
            sheet_names(&bytes).unwrap(),
            vec!["Department Summary", "Summary_ stats"]
        );
        let table = read_first_sheet(&bytes).unwrap();
        assert_eq!(table.headers, headers);
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn sheet_names_are_truncated_and_deduplicated() {
        let long = "A very long section name that overflows";
        let names = unique_sheet_names([long, long, "x/y"].into_iter());
        assert_eq!(names[0].chars().count(), 31);
        assert!(names[1].ends_with(" (2)"));
        assert_eq!(names[1].chars().count(), 31);
        assert_eq!(names[2], "x_y");
    }

    #[test]
    fn empty_workbook_is_rejected() {
        assert!(write_workbook(Cursor::new(Vec::new()), &[]).is_err());
    }

    #[test]
    fn garbage_bytes_are_a_zip_error() {
        assert!(matches!(
            read_first_sheet(b"not a zip"),
            Err(XlsxError::Zip(_))
        ));
    }
}
