// src/report/pdf.rs
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use image::DynamicImage;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rect, Rgb,
};
use printpdf::path::PaintMode;
use tracing::warn;

use super::{Cover, Page, Report};
use crate::error::{Error, Result};

/// US Letter, in points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;

const HEADING_SIZE: f32 = 16.0;
const CAPTION_SIZE: f32 = 10.0;
const CAPTION_LEADING: f32 = 12.0;

/// Positions below are in PDF points, origin bottom-left.
fn pt(v: f32) -> Mm {
    Mm(v * 25.4 / 72.0)
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

pub fn write_pdf(report: &Report, path: &Path) -> Result<()> {
    let first = report
        .pages
        .first()
        .ok_or_else(|| Error::render("report has no pages"))?;

    let (doc, page, layer) = PdfDocument::new(&first.heading, pt(PAGE_WIDTH), pt(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    let mut current = doc.get_page(page).get_layer(layer);
    for (i, page) in report.pages.iter().enumerate() {
        if i > 0 {
            let (p, l) = doc.add_page(pt(PAGE_WIDTH), pt(PAGE_HEIGHT), "Layer 1");
            current = doc.get_page(p).get_layer(l);
        }
        draw_page(&current, page, &regular)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let saved = doc
        .save(&mut writer)
        .map_err(Error::from)
        .and_then(|()| writer.flush().map_err(Error::from));
    if saved.is_err() {
        drop(writer);
        // A half-written document is not a report.
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %err, "could not remove partial report");
        }
    }
    saved
}

fn draw_page(layer: &PdfLayerReference, page: &Page, font: &IndirectFontRef) -> Result<()> {
    // The image goes first so the cover banner is painted over it.
    if let Some(image) = &page.image {
        draw_centered_image(layer, image, page.image_scale)?;
    }

    match &page.cover {
        Some(cover) => draw_cover(layer, cover, font),
        None => {
            layer.use_text(page.heading.as_str(), HEADING_SIZE, pt(40.0), pt(770.0), font);
            draw_caption(layer, &page.caption, font);
        }
    }
    Ok(())
}

fn draw_caption(layer: &PdfLayerReference, lines: &[String], font: &IndirectFontRef) {
    if lines.is_empty() {
        return;
    }
    layer.begin_text_section();
    layer.set_font(font, CAPTION_SIZE);
    layer.set_line_height(CAPTION_LEADING);
    layer.set_text_cursor(pt(40.0), pt(750.0));
    for line in lines {
        layer.write_text(line.as_str(), font);
        layer.add_line_break();
    }
    layer.end_text_section();
}

fn load_rgb(path: &Path) -> Result<DynamicImage> {
    Ok(DynamicImage::ImageRgb8(image::open(path)?.to_rgb8()))
}

/// Embed `path` scaled isotropically by `scale` (1 px = 1 pt before scaling), centred on the page.
fn draw_centered_image(layer: &PdfLayerReference, path: &Path, scale: f32) -> Result<()> {
    let img = load_rgb(path)?;
    let w = img.width() as f32 * scale;
    let h = img.height() as f32 * scale;
    let x = ((PAGE_WIDTH - w) / 2.0).floor();
    let y = ((PAGE_HEIGHT - h) / 2.0).floor();

    Image::from_dynamic_image(&img).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(pt(x)),
            translate_y: Some(pt(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(72.0),
            ..Default::default()
        },
    );
    Ok(())
}

fn line(layer: &PdfLayerReference, (x0, y0): (f32, f32), (x1, y1): (f32, f32)) {
    layer.add_line(Line {
        points: vec![
            (Point::new(pt(x0), pt(y0)), false),
            (Point::new(pt(x1), pt(y1)), false),
        ],
        is_closed: false,
    });
}

fn draw_cover(layer: &PdfLayerReference, cover: &Cover, font: &IndirectFontRef) {
    // white banner across the top
    layer.set_fill_color(white());
    layer.set_outline_color(white());
    layer.add_rect(Rect::new(pt(-1.0), pt(720.0), pt(699.0), pt(870.0)).with_mode(PaintMode::FillStroke));

    layer.set_fill_color(black());
    layer.set_outline_color(black());
    layer.set_outline_thickness(1.0);
    line(layer, (0.0, 720.0), (600.0, 720.0));
    line(layer, (140.0, 790.0), (600.0, 790.0));
    line(layer, (140.0, 720.0), (140.0, 850.0));

    layer.use_text(cover.title.as_str(), 20.0, pt(150.0), pt(810.0), font);
    layer.use_text(format!("Image Name:    {}", cover.image_name), 12.0, pt(145.0), pt(775.0), font);
    layer.use_text(format!("Image Date Set: {}", cover.acquisition_date), 12.0, pt(145.0), pt(760.0), font);
    layer.use_text(format!("Lat | Lon:  {}", cover.coordinates), 12.0, pt(145.0), pt(745.0), font);
    layer.use_text(format!("Zone: {}", cover.zone), 10.0, pt(145.0), pt(730.0), font);

    if let Some(logo) = &cover.logo {
        if let Err(err) = draw_logo(layer, logo) {
            warn!(logo = %logo.display(), error = %err, "skipping logo");
        }
    }
}

/// Logo box: 100 x 90 pt at (20, 735).
fn draw_logo(layer: &PdfLayerReference, path: &Path) -> Result<()> {
    let img = load_rgb(path)?;
    let sx = 100.0 / img.width().max(1) as f32;
    let sy = 90.0 / img.height().max(1) as f32;
    Image::from_dynamic_image(&img).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(pt(20.0)),
            translate_y: Some(pt(735.0)),
            scale_x: Some(sx),
            scale_y: Some(sy),
            dpi: Some(72.0),
            ..Default::default()
        },
    );
    Ok(())
}
