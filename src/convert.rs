//! Format-conversion collaborators.
//!
//! The converters are external collaborators from the pipeline's point of
//! view: the orchestrator only depends on the two traits here. The bundled
//! implementations are the plain-text stand-ins used by the CLI —
//! [`MarkdownConverter`] treats uploads as UTF-8 text and
//! [`TableRenderer`] turns the generated Markdown table into a single-sheet
//! spreadsheet and CSV bytes.

use std::io::Write;

use zip::write::SimpleFileOptions;

use crate::error::PipelineError;

/// One uploaded source document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// File stem used for artifact naming.
    #[must_use]
    pub fn stem(&self) -> &str {
        let name = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_name);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }
}

/// Intra-stage progress callback: (message, percent).
pub type ConvertProgress<'a> = &'a (dyn Fn(&str, u8) + Send + Sync);

/// Turns uploaded documents into one combined raw text for structuring.
pub trait DocumentConverter: Send + Sync {
    /// Combine all uploads into a single text, reporting fine-grained
    /// progress through the callback (percent values are within the
    /// orchestrator's conversion window).
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Convert` if any document cannot be decoded.
    fn combine_to_text(
        &self,
        files: &[SourceDocument],
        on_progress: ConvertProgress<'_>,
    ) -> Result<String, PipelineError>;
}

/// Renders the generated specification text into delivery formats.
pub trait SpecRenderer: Send + Sync {
    /// Produce (spreadsheet bytes, tabular-text bytes) from the generated
    /// Markdown specification.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Convert` if rendering fails.
    fn render(&self, spec_text: &str) -> Result<(Vec<u8>, Vec<u8>), PipelineError>;
}

/// Plain-text converter: decodes each upload as UTF-8 and concatenates with
/// per-file headings.
#[derive(Debug, Default)]
pub struct MarkdownConverter;

impl DocumentConverter for MarkdownConverter {
    fn combine_to_text(
        &self,
        files: &[SourceDocument],
        on_progress: ConvertProgress<'_>,
    ) -> Result<String, PipelineError> {
        let total = files.len().max(1);
        let mut combined = String::new();
        for (index, file) in files.iter().enumerate() {
            let text = std::str::from_utf8(&file.bytes).map_err(|_| {
                PipelineError::Convert(format!("'{}' is not valid UTF-8 text", file.file_name))
            })?;
            if !combined.is_empty() {
                combined.push_str("\n\n");
            }
            combined.push_str(&format!("# Document: {}\n\n", file.file_name));
            combined.push_str(text.trim_end());
            combined.push('\n');

            let percent = (((index + 1) * 30) / total) as u8;
            on_progress(
                &format!("Converted {} ({}/{})", file.file_name, index + 1, total),
                percent,
            );
        }
        Ok(combined)
    }
}

/// Markdown-table renderer producing a minimal single-sheet XLSX and CSV.
#[derive(Debug, Default)]
pub struct TableRenderer;

impl SpecRenderer for TableRenderer {
    fn render(&self, spec_text: &str) -> Result<(Vec<u8>, Vec<u8>), PipelineError> {
        let rows = parse_markdown_table(spec_text);
        let csv = rows_to_csv(&rows);
        let sheet = rows_to_xlsx(&rows)?;
        Ok((sheet, csv.into_bytes()))
    }
}

/// Extract table rows from Markdown. Lines that are not table rows are kept
/// as single-cell rows so no generated content is dropped.
fn parse_markdown_table(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(cells) = parse_table_row(trimmed) {
            // Skip alignment separator rows like | --- | :--: |
            if cells
                .iter()
                .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
            {
                continue;
            }
            rows.push(cells);
        } else {
            rows.push(vec![trimmed.to_string()]);
        }
    }
    rows
}

fn parse_table_row(line: &str) -> Option<Vec<String>> {
    let inner = line.strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Some(inner.split('|').map(|c| c.trim().to_string()).collect())
}

fn rows_to_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row.iter().map(|c| csv_escape(c)).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

fn csv_escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Write a minimal OOXML spreadsheet with one sheet of inline strings.
fn rows_to_xlsx(rows: &[Vec<String>]) -> Result<Vec<u8>, PipelineError> {
    let cursor = std::io::Cursor::new(Vec::new());
    let mut archive = zip::ZipWriter::new(cursor);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let parts: [(&str, String); 4] = [
        (
            "[Content_Types].xml",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
                r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                r#"</Types>"#
            )
            .to_string(),
        ),
        (
            "_rels/.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
                r#"</Relationships>"#
            )
            .to_string(),
        ),
        (
            "xl/workbook.xml",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<sheets><sheet name="TestSpec" sheetId="1" r:id="rId1"/></sheets>"#,
                r#"</workbook>"#
            )
            .to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
                r#"</Relationships>"#
            )
            .to_string(),
        ),
    ];

    let write = |archive: &mut zip::ZipWriter<std::io::Cursor<Vec<u8>>>,
                 name: &str,
                 content: &[u8]|
     -> Result<(), PipelineError> {
        archive
            .start_file(name, options)
            .map_err(|e| PipelineError::Convert(format!("xlsx part '{name}': {e}")))?;
        archive
            .write_all(content)
            .map_err(|e| PipelineError::Convert(format!("xlsx part '{name}': {e}")))?;
        Ok(())
    };

    for (name, content) in &parts {
        write(&mut archive, name, content.as_bytes())?;
    }
    write(
        &mut archive,
        "xl/worksheets/sheet1.xml",
        sheet_xml(rows).as_bytes(),
    )?;

    let cursor = archive
        .finish()
        .map_err(|e| PipelineError::Convert(format!("xlsx finalize: {e}")))?;
    Ok(cursor.into_inner())
}

fn sheet_xml(rows: &[Vec<String>]) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        "<sheetData>"
    ));
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            xml.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                column_name(c),
                r + 1,
                xml_escape(cell)
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_name(index: usize) -> String {
    let mut n = index;
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    name
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
