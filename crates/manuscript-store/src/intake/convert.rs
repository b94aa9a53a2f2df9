//! DOCX → PDF derivation for submissions
//!
//! The conversion is text-only: paragraph runs and table cells are extracted
//! and laid out as word-wrapped Helvetica on A4 pages. Formatting, images and
//! non-Latin-1 glyphs are lost.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 11;
const LINE_HEIGHT: i64 = 14;
const CHARS_PER_LINE: usize = 90;

/// Extract plain text from a DOCX file, one paragraph per line
pub fn docx_text(data: &[u8]) -> Result<String> {
    let doc = docx_rs::read_docx(data)
        .map_err(|e| Error::file_type("document.docx", format!("unreadable DOCX: {}", e)))?;

    let mut content = String::new();
    for child in doc.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(p) => {
                push_paragraph(&mut content, &p);
            }
            docx_rs::DocumentChild::Table(table) => {
                push_table(&mut content, &table);
            }
            _ => {}
        }
    }

    Ok(content)
}

fn push_paragraph(out: &mut String, p: &docx_rs::Paragraph) {
    for child in &p.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for child in &run.children {
                match child {
                    docx_rs::RunChild::Text(t) => out.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => out.push('\t'),
                    _ => {}
                }
            }
        }
    }
    out.push('\n');
}

// Rows become lines, cells are separated by " | "
fn push_table(out: &mut String, table: &docx_rs::Table) {
    for row in &table.rows {
        let docx_rs::TableChild::TableRow(row) = row;
        let mut cells = Vec::new();
        for cell in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = cell;
            let mut text = String::new();
            for content in &cell.children {
                if let docx_rs::TableCellContent::Paragraph(p) = content {
                    push_paragraph(&mut text, p);
                }
            }
            cells.push(text.trim().replace('\n', " "));
        }
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }
}

/// Word-wrap text into lines of at most `width` characters
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                lines.push(head);
            }
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

/// Render lines of text as a PDF
pub fn render_pdf(text: &str) -> Result<Vec<u8>> {
    let lines = wrap_lines(text, CHARS_PER_LINE);
    let per_page = ((PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT) as usize;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![lines.as_slice()]
    } else {
        lines.chunks(per_page).collect()
    };
    for chunk in chunks {
        let page_id = add_page(&mut doc, pages_id, chunk)?;
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Error::Internal(format!("Failed to write PDF: {}", e)))?;
    Ok(out)
}

fn add_page(doc: &mut Document, pages_id: ObjectId, lines: &[String]) -> Result<ObjectId> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LINE_HEIGHT.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(latin1(line))]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations }
        .encode()
        .map_err(|e| Error::Internal(format!("Failed to encode PDF page: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

// The standard Helvetica font only covers Latin-1
fn latin1(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| match c {
            '\t' => b' ',
            c if (c as u32) < 0x20 => b' ',
            c if (c as u32) <= 0xFF => c as u32 as u8,
            '\u{2018}' | '\u{2019}' => b'\'',
            '\u{201C}' | '\u{201D}' => b'"',
            '\u{2013}' | '\u{2014}' => b'-',
            _ => b'?',
        })
        .collect()
}

/// Derive a PDF from DOCX bytes
pub fn docx_to_pdf(data: &[u8]) -> Result<Vec<u8>> {
    let text = docx_text(data)?;
    render_pdf(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_docx() -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        docx_rs::Docx::new()
            .add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Hello manuscript")),
            )
            .add_table(docx_rs::Table::new(vec![docx_rs::TableRow::new(vec![
                docx_rs::TableCell::new().add_paragraph(
                    docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("cell a")),
                ),
                docx_rs::TableCell::new().add_paragraph(
                    docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("cell b")),
                ),
            ])]))
            .build()
            .pack(&mut buf)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_docx_text_includes_tables() {
        let text = docx_text(&sample_docx()).unwrap();
        assert!(text.contains("Hello manuscript"));
        assert!(text.contains("cell a | cell b"));
    }

    #[test]
    fn test_unreadable_docx_is_file_type_error() {
        let err = docx_text(b"PK\x03\x04 not really a zip").unwrap_err();
        assert_eq!(err.kind(), "FileTypeError");
    }

    #[test]
    fn test_rendered_pdf_loads() {
        let pdf = docx_to_pdf(&sample_docx()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_long_text_paginates() {
        let text = "line\n".repeat(200);
        let doc = Document::load_mem(&render_pdf(&text).unwrap()).unwrap();
        assert!(doc.get_pages().len() >= 3);
    }

    #[test]
    fn test_wrap_lines() {
        let lines = wrap_lines("aaa bbb ccc\n\nddddddddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc", "", "ddddddd", "dd"]);
    }
}
