use chrono::Utc;
use printpdf::*;
use std::io::BufWriter;
use thiserror::Error;
use tracing::debug;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 5.0;
const BODY_SIZE: f32 = 10.0;
const SUBJECT_SIZE: f32 = 13.0;
// Helvetica 10pt across 180mm
const BODY_COLUMNS: usize = 95;
const SUBJECT_COLUMNS: usize = 72;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF export failed: {0}")]
    Pdf(String),
}

pub fn full_email(subject: &str, body: &str) -> String {
    format!("Subject: {}\n\n{}", subject, body)
}

/// `email_<issue>_<millis>.<ext>`
pub fn export_filename(issue_type: &str, extension: &str) -> String {
    format!("email_{}_{}.{}", issue_type, Utc::now().timestamp_millis(), extension)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Blank lines become paragraphs, single newlines become `<br>`.
pub fn to_html(body: &str) -> String {
    let escaped = escape_html(&body.replace("\r\n", "\n"));
    format!("<p>{}</p>", escaped.replace("\n\n", "</p><p>").replace('\n', "<br>"))
}

/// Standalone page for the HTML download.
pub fn html_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"UTF-8\">\n  <title>Email Draft</title>\n  <style>\n    \
body {{ font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }}\n    \
p {{ margin-bottom: 1em; }}\n  </style>\n</head>\n<body>\n{}\n</body>\n</html>",
        to_html(body)
    )
}

pub fn mailto_link(to: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        to.trim(),
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

/// Greedy word wrap. Blank lines are kept; words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut len = 0;
        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > width {
                if len > 0 {
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                }
                lines.push(chars.drain(..width).collect());
            }
            let word_len = chars.len();
            if word_len == 0 {
                continue;
            }
            if len > 0 && len + 1 + word_len > width {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.extend(chars);
            len += word_len;
        }
        lines.push(line);
    }
    lines
}

fn pdf_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(e.to_string())
}

/// Text-only A4 PDF: bold subject, wrapped body, new pages as needed.
pub fn email_pdf(subject: &str, body: &str) -> Result<Vec<u8>, ExportError> {
    let subject = subject.trim();
    let title = if subject.is_empty() { "Email Draft".to_string() } else { subject.chars().take(60).collect() };
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;

    let top = PAGE_H - MARGIN - LINE_HEIGHT;
    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = top;
    let mut pages = 1;

    if !subject.is_empty() {
        for line in wrap_text(&format!("Subject: {}", subject), SUBJECT_COLUMNS) {
            current.use_text(line, SUBJECT_SIZE, Mm(MARGIN), Mm(y), &bold);
            y -= LINE_HEIGHT + 2.0;
        }
        y -= LINE_HEIGHT;
    }

    for line in wrap_text(body, BODY_COLUMNS) {
        if y < MARGIN {
            pages += 1;
            let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), format!("Page {}", pages));
            current = doc.get_page(page).get_layer(layer);
            y = top;
        }
        if !line.is_empty() {
            current.use_text(line, BODY_SIZE, Mm(MARGIN), Mm(y), &font);
        }
        y -= LINE_HEIGHT;
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer).map_err(pdf_err)?;
    }
    debug!("Rendered email PDF: {} page(s), {} bytes", pages, buf.len());
    Ok(buf)
}
