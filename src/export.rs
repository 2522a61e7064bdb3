//! PDF export of a single chat message.

use chrono::{DateTime, Local};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const TITLE_SIZE_PT: f32 = 16.0;
const BODY_SIZE_PT: f32 = 11.0;
const TITLE_LINE_MM: f32 = 8.0;
const BODY_LINE_MM: f32 = 5.5;
const TITLE_GAP_MM: f32 = 4.0;
/// Roughly 180 mm of 11 pt Helvetica.
pub const WRAP_COLUMNS: usize = 90;
const TITLE_COLUMNS: usize = 60;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not build PDF: {0}")]
    Pdf(#[from] printpdf::Error),
    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("summary-{}.pdf", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// First free name in `dir`: the plain timestamp, then `-1`, `-2`, ...
pub fn unused_export_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = format!("summary-{}", now.format("%Y-%m-%dT%H-%M-%S"));
    let mut path = dir.join(export_file_name(now));
    let mut suffix = 1;
    while path.exists() {
        path = dir.join(format!("{stem}-{suffix}.pdf"));
        suffix += 1;
    }
    path
}

/// Greedy word wrap. Blank lines survive and words longer than a line are split.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in raw_line.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(columns) {
                let piece: String = chunk.iter().collect();
                let piece_len = chunk.len();
                let needed = if current_len == 0 {
                    piece_len
                } else {
                    current_len + 1 + piece_len
                };

                if needed > columns && current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(&piece);
                current_len += piece_len;
            }
        }

        lines.push(current);
    }

    lines
}

fn body_lines_per_page(first_page: bool, title_lines: usize) -> usize {
    let mut usable = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
    if first_page {
        usable -= title_lines as f32 * TITLE_LINE_MM + TITLE_GAP_MM;
    }
    ((usable / BODY_LINE_MM).floor() as usize).max(1)
}

/// Splits body lines into pages, leaving room for the title on the first one.
pub fn paginate(lines: &[String], title_lines: usize) -> Vec<Vec<String>> {
    let mut pages = Vec::new();
    let mut rest = lines;
    let mut first = true;

    loop {
        let capacity = body_lines_per_page(first, title_lines);
        let take = capacity.min(rest.len());
        pages.push(rest[..take].to_vec());
        rest = &rest[take..];
        first = false;
        if rest.is_empty() {
            break;
        }
    }

    pages
}

pub fn render_pdf(title: &str, body: &str) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let title_font = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let body_font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    let title_lines = wrap_text(title, TITLE_COLUMNS);
    let body_lines = wrap_text(body, WRAP_COLUMNS);
    let top = PAGE_HEIGHT_MM - MARGIN_MM;

    for (index, page_lines) in paginate(&body_lines, title_lines.len())
        .into_iter()
        .enumerate()
    {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Page {}", index + 1),
            );
            doc.get_page(page).get_layer(layer)
        };

        let mut y = top;
        if index == 0 {
            for line in &title_lines {
                layer.use_text(line.as_str(), TITLE_SIZE_PT, Mm(MARGIN_MM), Mm(y), &title_font);
                y -= TITLE_LINE_MM;
            }
            y -= TITLE_GAP_MM;
        }
        for line in &page_lines {
            layer.use_text(line.as_str(), BODY_SIZE_PT, Mm(MARGIN_MM), Mm(y), &body_font);
            y -= BODY_LINE_MM;
        }
    }

    Ok(doc.save_to_bytes()?)
}

pub fn export_pdf(
    dir: &Path,
    title: &str,
    body: &str,
    now: DateTime<Local>,
) -> Result<PathBuf, ExportError> {
    let bytes = render_pdf(title, body)?;
    fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = unused_export_path(dir, now);
    fs::write(&path, bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
