//! Shopping list PDF rendering.
//!
//! `layout_pages` places every string in PDF points on an A4 page;
//! `render_pdf` draws that layout with an embedded DejaVu Sans so Cyrillic
//! and other non-Latin ingredient names keep their glyphs.

use chrono::NaiveDate;
use printpdf::{
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Pt,
};
use thiserror::Error;
use ttf_parser::{Face, FaceParsingError};

use crate::models::{ServiceError, ShoppingList};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const PDF_FILE_NAME: &str = "shopping_list.pdf";

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;

const TITLE: &str = "Shopping list";
const DOCUMENT_TITLE: &str = "Shopping list for recipes";
const TITLE_SIZE: f32 = 24.0;
const TITLE_CENTER_X: f32 = 300.0;
const TITLE_Y: f32 = 770.0;

const SUBTITLE_SIZE: f32 = 16.0;
const SUBTITLE_CENTER_X: f32 = 290.0;
const SUBTITLE_Y: f32 = 720.0;

const RULE_START_X: f32 = 30.0;
const RULE_END_X: f32 = 565.0;
const RULE_Y: f32 = 710.0;

const BODY_SIZE: f32 = 14.0;
const BODY_X: f32 = 50.0;
const FIRST_LINE_Y: f32 = 670.0;
const CONTINUATION_LINE_Y: f32 = 792.0;
const LINE_HEIGHT: f32 = 25.0;
const BOTTOM_MARGIN: f32 = 50.0;

const DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("Font could not be parsed: {0}")]
    Font(#[from] FaceParsingError),
}

impl From<RenderError> for ServiceError {
    fn from(err: RenderError) -> Self {
        ServiceError::Rendering {
            message: err.to_string(),
        }
    }
}

/// A string placed at a baseline position, in points from the bottom-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub size: f32,
    pub x: f32,
    pub y: f32,
}

/// Horizontal line, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub from_x: f32,
    pub to_x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub texts: Vec<PlacedText>,
    pub rules: Vec<Rule>,
}

fn text_width(face: &Face<'_>, text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .filter_map(|c| face.glyph_index(c))
        .filter_map(|glyph| face.glyph_hor_advance(glyph))
        .map(u32::from)
        .sum();
    units as f32 * size / f32::from(face.units_per_em())
}

fn centered(face: &Face<'_>, text: &str, size: f32, center_x: f32, y: f32) -> PlacedText {
    PlacedText {
        text: text.to_string(),
        size,
        x: center_x - text_width(face, text, size) / 2.0,
        y,
    }
}

/// Lay the list out over as many pages as needed; the first page carries the header
pub fn layout_pages(
    list: &ShoppingList,
    date: NaiveDate,
) -> Result<Vec<PageLayout>, RenderError> {
    let face = Face::parse(DEJAVU_SANS, 0)?;
    let header = PageLayout {
        texts: vec![
            centered(&face, TITLE, TITLE_SIZE, TITLE_CENTER_X, TITLE_Y),
            centered(
                &face,
                &date.format("%Y-%m-%d").to_string(),
                SUBTITLE_SIZE,
                SUBTITLE_CENTER_X,
                SUBTITLE_Y,
            ),
        ],
        rules: vec![Rule {
            from_x: RULE_START_X,
            to_x: RULE_END_X,
            y: RULE_Y,
        }],
    };

    let mut pages = vec![header];
    let mut y = FIRST_LINE_Y;

    for line in list.display_lines() {
        if y < BOTTOM_MARGIN {
            pages.push(PageLayout::default());
            y = CONTINUATION_LINE_Y;
        }

        if let Some(page) = pages.last_mut() {
            page.texts.push(PlacedText {
                text: line,
                size: BODY_SIZE,
                x: BODY_X,
                y,
            });
        }
        y -= LINE_HEIGHT;
    }

    Ok(pages)
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn draw_page(layer: &PdfLayerReference, page: &PageLayout, font: &IndirectFontRef) {
    for text in &page.texts {
        layer.use_text(text.text.clone(), text.size, mm(text.x), mm(text.y), font);
    }

    for rule in &page.rules {
        layer.add_line(Line {
            points: vec![
                (Point::new(mm(rule.from_x), mm(rule.y)), false),
                (Point::new(mm(rule.to_x), mm(rule.y)), false),
            ],
            is_closed: false,
        });
    }
}

fn new_document() -> (PdfDocumentReference, PdfLayerReference) {
    let (document, page, layer) = PdfDocument::new(
        DOCUMENT_TITLE,
        mm(PAGE_WIDTH),
        mm(PAGE_HEIGHT),
        "Page 1",
    );
    let layer = document.get_page(page).get_layer(layer);
    (document, layer)
}

/// Render the list to PDF bytes
pub fn render_pdf(list: &ShoppingList, date: NaiveDate) -> Result<Vec<u8>, RenderError> {
    let pages = layout_pages(list, date)?;
    let (document, first_layer) = new_document();
    let font = document.add_external_font(DEJAVU_SANS)?;

    let mut pages = pages.iter();
    if let Some(header_page) = pages.next() {
        draw_page(&first_layer, header_page, &font);
    }
    for (index, page) in pages.enumerate() {
        let (page_index, layer_index) = document.add_page(
            mm(PAGE_WIDTH),
            mm(PAGE_HEIGHT),
            format!("Page {}", index + 2),
        );
        draw_page(
            &document.get_page(page_index).get_layer(layer_index),
            page,
            &font,
        );
    }

    Ok(document.save_to_bytes()?)
}
