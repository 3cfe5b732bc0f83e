//! Writes an assembled [`Document`] as an A4 PDF using the builtin
//! Helvetica faces.

use anyhow::{anyhow, Result};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Rect, Rgb as PdfRgb,
};
use unicode_normalization::UnicodeNormalization;

use super::charts::ChartSet;
use super::layout::{
    row_style, Align, Document, Element, Rgb, MARGIN, PAGE_HEIGHT, PAGE_WIDTH, ROW_HEIGHT,
    TABLE_COLUMNS,
};

const IMAGE_DPI: f32 = 300.0;
const MM_PER_PT: f32 = 0.3528;
const CELL_PADDING: f32 = 2.0;
const TABLE_FONT_SIZE: f32 = 8.0;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// The builtin fonts only cover Latin-1 reliably: strip accents and
/// replace anything else outside ASCII.
pub fn pdf_safe(text: &str) -> String {
    text.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

fn color(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb(PdfRgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

/// Rough Helvetica advance; good enough for centering short labels.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * MM_PER_PT
}

/// Layout coordinates grow downwards, PDF coordinates grow upwards.
fn flip(y: f32) -> Mm {
    Mm(PAGE_HEIGHT - y)
}

pub fn render(doc: &Document, charts: &ChartSet) -> Result<Vec<u8>> {
    let (pdf, first_page, first_layer) =
        PdfDocument::new(&doc.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load font: {:?}", e))?,
        bold: pdf
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("Failed to load font: {:?}", e))?,
    };

    for (i, page) in doc.pages.iter().enumerate() {
        let layer = if i == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            pdf.get_page(p).get_layer(l)
        };
        for element in &page.elements {
            draw(&layer, &fonts, charts, element)?;
        }
    }

    pdf.save_to_bytes()
        .map_err(|e| anyhow!("Failed to write PDF: {:?}", e))
}

fn draw(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    charts: &ChartSet,
    element: &Element,
) -> Result<()> {
    match element {
        Element::Text {
            x,
            y,
            size,
            bold,
            align,
            color: c,
            text,
        } => {
            let font = if *bold { &fonts.bold } else { &fonts.regular };
            draw_text(layer, font, *x, *y, *size, *align, *c, text);
        }
        Element::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
        } => draw_rect(layer, *x, *y, *w, *h, *fill, *stroke),
        Element::Image { x, y, w, h, chart } => {
            // A chart that failed to rasterize was already replaced by a
            // placeholder during layout; nothing to embed here.
            let Some(bitmap) = charts.get(*chart) else {
                tracing::warn!(chart = chart.file_stem(), "no bitmap for chart, skipping");
                return Ok(());
            };
            let raw = printpdf::image_crate::RgbImage::from_raw(
                bitmap.width,
                bitmap.height,
                bitmap.pixels.clone(),
            )
            .ok_or_else(|| anyhow!("Chart bitmap has the wrong size"))?;
            let image =
                Image::from_dynamic_image(&printpdf::image_crate::DynamicImage::ImageRgb8(raw));
            let native_w = bitmap.width as f32 / IMAGE_DPI * 25.4;
            let native_h = bitmap.height as f32 / IMAGE_DPI * 25.4;
            image.add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(flip(y + h)),
                    scale_x: Some(w / native_w),
                    scale_y: Some(h / native_h),
                    dpi: Some(IMAGE_DPI),
                    ..Default::default()
                },
            );
        }
        Element::TableRow {
            y,
            header,
            shaded,
            cells,
        } => {
            let (fill, text_color) = row_style(*header, *shaded);
            if let Some(fill) = fill {
                draw_rect(layer, MARGIN, *y, PAGE_WIDTH - 2.0 * MARGIN, ROW_HEIGHT, Some(fill), None);
            }
            let font = if *header { &fonts.bold } else { &fonts.regular };
            let mut x = MARGIN;
            for ((_, width), cell) in TABLE_COLUMNS.iter().zip(cells) {
                draw_text(
                    layer,
                    font,
                    x + CELL_PADDING,
                    y + ROW_HEIGHT - 2.2,
                    TABLE_FONT_SIZE,
                    Align::Left,
                    text_color,
                    cell,
                );
                x += width;
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    x: f32,
    y: f32,
    size: f32,
    align: Align,
    c: Rgb,
    text: &str,
) {
    let text = pdf_safe(text);
    let left = match align {
        Align::Left => x,
        Align::Center => x - text_width(&text, size) / 2.0,
    };
    layer.set_fill_color(color(c));
    layer.use_text(text, size, Mm(left), flip(y), font);
}

fn draw_rect(
    layer: &PdfLayerReference,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    fill: Option<Rgb>,
    stroke: Option<Rgb>,
) {
    let mode = match (fill, stroke) {
        (Some(_), Some(_)) => PaintMode::FillStroke,
        (Some(_), None) => PaintMode::Fill,
        (None, Some(_)) => PaintMode::Stroke,
        (None, None) => return,
    };
    if let Some(fill) = fill {
        layer.set_fill_color(color(fill));
    }
    if let Some(stroke) = stroke {
        layer.set_outline_color(color(stroke));
        layer.set_outline_thickness(0.5);
    }
    layer.add_rect(Rect::new(Mm(x), flip(y + h), Mm(x + w), flip(y)).with_mode(mode));
}
