// src/render/raster.rs
use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use ndarray::ArrayView2;
use rusttype::Font;
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::processing::indices::{IndexResult, RgbComposite};
use crate::render::colormap::{Colormap, Rgb as Color};
use crate::render::text::TextPainter;
use crate::utils::scaling::finite_range;

/// Plot size the base text and spacing below are drawn for.
const BASE_FIGURE: f32 = 700.0;

const BACKGROUND: Color = [255, 255, 255];
const FOREGROUND: Color = [0, 0, 0];
/// Non-finite pixels are left transparent in spirit: they take the background.
const BAD_COLOR: Color = BACKGROUND;

/// One legend row: category label and its swatch colour.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub value: i32,
    pub label: String,
    pub color: Color,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FigureOptions<'a> {
    pub title: Option<&'a str>,
    pub show_axes: bool,
    pub colorbar: Option<(Colormap, f32, f32)>,
    pub legend: Option<&'a [LegendEntry]>,
}

/// Text sizes and spacing, grown with the figure so labels keep their
/// proportion at large plot sizes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub margin: u32,
    pub title_size: f32,
    pub label_size: f32,
    pub title_band: u32,
    pub axis_band: u32,
    pub gap: u32,
    pub colorbar_labels: u32,
    pub legend_row: u32,
    pub legend_swatch: u32,
    pub tick: f32,
}

impl Layout {
    pub fn for_figure(figure_size: u32) -> Self {
        let k = (figure_size as f32 / BASE_FIGURE).max(1.0);
        let px = |v: f32| (v * k).round() as u32;
        Self {
            margin: px(16.0),
            title_size: 22.0 * k,
            label_size: 13.0 * k,
            title_band: px(40.0),
            axis_band: px(34.0),
            gap: px(12.0),
            colorbar_labels: px(72.0),
            legend_row: px(22.0),
            legend_swatch: px(14.0),
            tick: 5.0 * k,
        }
    }
}

/// Pixel placement of the plot area inside the canvas.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Turns index arrays into figure images on disk.
pub struct RasterRenderer {
    config: RenderConfig,
    font: Option<Font<'static>>,
}

impl RasterRenderer {
    pub fn new(config: RenderConfig, font: Option<Font<'static>>) -> Self {
        Self { config, font }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn render_index(&self, result: &IndexResult, dest: &Path) -> Result<()> {
        self.render(
            result.data.view(),
            Some(result.display.title),
            result.display.colormap,
            result.display.show_axes,
            dest,
        )
    }

    /// Scalar map with colormap and colour bar.
    pub fn render(
        &self,
        data: ArrayView2<f32>,
        title: Option<&str>,
        colormap: Colormap,
        show_axes: bool,
        dest: &Path,
    ) -> Result<()> {
        ensure_parent(dest)?;
        let (lo, hi) = display_range(&data)?;
        let options = FigureOptions {
            title,
            show_axes,
            colorbar: self.config.colorbar.then_some((colormap, lo, hi)),
            legend: None,
        };
        let figure = self.scalar_figure(&data, colormap, (lo, hi), &options);
        figure.save(dest)?;
        debug!(path = %dest.display(), min = lo, max = hi, "rendered raster");
        Ok(())
    }

    /// True colour composite: no colormap, no colour bar, no axes.
    pub fn render_rgb(&self, rgb: &RgbComposite, dest: &Path) -> Result<()> {
        ensure_parent(dest)?;
        let (rows, cols) = rgb.spatial_shape();
        if rows == 0 || cols == 0 {
            return Err(Error::render("true colour composite is empty"));
        }
        let options = FigureOptions {
            title: None,
            show_axes: false,
            colorbar: None,
            legend: None,
        };
        let figure = self.figure(rows, cols, &options, |r, c| {
            [rgb.data[[r, c, 0]], rgb.data[[r, c, 1]], rgb.data[[r, c, 2]]]
        });
        figure.save(dest)?;
        debug!(path = %dest.display(), "rendered true colour composite");
        Ok(())
    }

    pub(crate) fn scalar_figure(
        &self,
        data: &ArrayView2<f32>,
        colormap: Colormap,
        (lo, hi): (f32, f32),
        options: &FigureOptions<'_>,
    ) -> RgbImage {
        let span = hi - lo;
        let (rows, cols) = data.dim();
        self.figure(rows, cols, options, |r, c| {
            let v = data[[r, c]];
            if !v.is_finite() {
                return BAD_COLOR;
            }
            let t = if span > 0.0 { (v - lo) / span } else { 0.0 };
            colormap.map(t)
        })
    }

    /// Lay out a figure around a `rows` x `cols` plot coloured by `color_at`.
    pub(crate) fn figure<F>(&self, rows: usize, cols: usize, options: &FigureOptions<'_>, color_at: F) -> RgbImage
    where
        F: Fn(usize, usize) -> Color,
    {
        let painter = TextPainter::new(self.font.as_ref());
        let layout = Layout::for_figure(self.config.figure_size);

        let longest = rows.max(cols).max(1) as f32;
        let scale = self.config.figure_size as f32 / longest;
        let plot_w = ((cols as f32 * scale).round() as u32).max(1);
        let plot_h = ((rows as f32 * scale).round() as u32).max(1);

        let title_band = if options.title.is_some() { layout.title_band } else { 0 };
        let axis_band = if options.show_axes { layout.axis_band } else { 0 };
        let bar_w = ((plot_w as f32 * 0.046).round() as u32).max(10);
        let colorbar_extent = if options.colorbar.is_some() {
            layout.gap + bar_w + layout.colorbar_labels
        } else {
            0
        };
        let (legend_w, legend_h) = options
            .legend
            .map(|entries| legend_size(&painter, &layout, entries))
            .unwrap_or((0, 0));

        let frame = Frame {
            x: layout.margin + axis_band,
            y: layout.margin + title_band,
            width: plot_w,
            height: plot_h,
        };
        let width = frame.x + plot_w + colorbar_extent + legend_w + layout.margin;
        let height = frame.y + plot_h.max(legend_h) + axis_band + layout.margin;

        let mut canvas = RgbImage::from_pixel(width, height, Rgb(BACKGROUND));

        for y in 0..plot_h {
            let r = ((y as usize * rows) / plot_h as usize).min(rows.saturating_sub(1));
            for x in 0..plot_w {
                let c = ((x as usize * cols) / plot_w as usize).min(cols.saturating_sub(1));
                canvas.put_pixel(frame.x + x, frame.y + y, Rgb(color_at(r, c)));
            }
        }

        if let Some(title) = options.title {
            let center = (frame.x + plot_w / 2) as i32;
            painter.draw_centered(
                &mut canvas,
                title,
                center,
                layout.margin as i32,
                layout.title_size,
                FOREGROUND,
            );
        }
        if options.show_axes {
            draw_axes(&mut canvas, &painter, &layout, frame, rows, cols);
        }
        if let Some((colormap, lo, hi)) = options.colorbar {
            let bar = Frame {
                x: frame.x + plot_w + layout.gap,
                y: frame.y,
                width: bar_w,
                height: plot_h,
            };
            draw_colorbar(&mut canvas, &painter, &layout, bar, colormap, lo, hi);
        }
        if let Some(entries) = options.legend {
            draw_legend(&mut canvas, &painter, &layout, frame.x + plot_w + layout.gap, frame.y, entries);
        }

        canvas
    }
}

/// Finite min/max of the data; an array with no finite value cannot be displayed.
pub(crate) fn display_range(data: &ArrayView2<f32>) -> Result<(f32, f32)> {
    finite_range(data).ok_or_else(|| Error::render("array has no finite values to set a display range"))
}

pub(crate) fn ensure_parent(dest: &Path) -> Result<()> {
    match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => Err(Error::render(format!(
            "destination directory {} does not exist",
            dir.display()
        ))),
        _ => Ok(()),
    }
}

fn format_tick(v: f32) -> String {
    if v != 0.0 && (v.abs() >= 10_000.0 || v.abs() < 0.01) {
        format!("{v:.2e}")
    } else {
        format!("{v:.2}")
    }
}

fn draw_colorbar(
    canvas: &mut RgbImage,
    painter: &TextPainter<'_>,
    layout: &Layout,
    bar: Frame,
    colormap: Colormap,
    lo: f32,
    hi: f32,
) {
    let denom = bar.height.saturating_sub(1).max(1) as f32;
    for y in 0..bar.height {
        let color = colormap.map(1.0 - y as f32 / denom);
        for x in 0..bar.width {
            canvas.put_pixel(bar.x + x, bar.y + y, Rgb(color));
        }
    }
    draw_hollow_rect_mut(
        canvas,
        Rect::at(bar.x as i32, bar.y as i32).of_size(bar.width, bar.height),
        Rgb(FOREGROUND),
    );

    let label_x = (bar.x + bar.width) as i32 + (layout.tick * 1.2) as i32;
    let ticks = [(hi, 0.0f32), ((lo + hi) / 2.0, 0.5), (lo, 1.0)];
    for (value, frac) in ticks {
        let y = bar.y as f32 + frac * denom;
        draw_line_segment_mut(
            canvas,
            ((bar.x + bar.width) as f32, y),
            ((bar.x + bar.width) as f32 + layout.tick, y),
            Rgb(FOREGROUND),
        );
        let text_y = (y - layout.label_size / 2.0) as i32;
        painter.draw(canvas, &format_tick(value), label_x, text_y, layout.label_size, FOREGROUND);
    }
}

/// Step of roughly `span / 5`, rounded to 1, 2 or 5 times a power of ten.
fn tick_step(span: usize) -> usize {
    let raw = (span as f64 / 5.0).max(1.0);
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(raw);
    step as usize
}

fn draw_axes(canvas: &mut RgbImage, painter: &TextPainter<'_>, layout: &Layout, frame: Frame, rows: usize, cols: usize) {
    draw_hollow_rect_mut(
        canvas,
        Rect::at(frame.x as i32, frame.y as i32).of_size(frame.width, frame.height),
        Rgb(FOREGROUND),
    );

    let bottom = (frame.y + frame.height) as f32;
    let step = tick_step(cols);
    for c in (0..cols).step_by(step) {
        let x = frame.x as f32 + (c as f32 + 0.5) * frame.width as f32 / cols as f32;
        draw_line_segment_mut(canvas, (x, bottom), (x, bottom + layout.tick), Rgb(FOREGROUND));
        painter.draw_centered(
            canvas,
            &c.to_string(),
            x as i32,
            (bottom + layout.tick * 1.6) as i32,
            layout.label_size,
            FOREGROUND,
        );
    }

    let left = frame.x as f32;
    let step = tick_step(rows);
    for r in (0..rows).step_by(step) {
        let y = frame.y as f32 + (r as f32 + 0.5) * frame.height as f32 / rows as f32;
        draw_line_segment_mut(canvas, (left - layout.tick, y), (left, y), Rgb(FOREGROUND));
        let label = r.to_string();
        let (w, _) = painter.measure(&label, layout.label_size);
        painter.draw(
            canvas,
            &label,
            left as i32 - (layout.tick * 1.6) as i32 - w as i32,
            (y - layout.label_size / 2.0) as i32,
            layout.label_size,
            FOREGROUND,
        );
    }
}

fn legend_size(painter: &TextPainter<'_>, layout: &Layout, entries: &[LegendEntry]) -> (u32, u32) {
    let label_w = entries
        .iter()
        .map(|e| painter.measure(&e.label, layout.label_size).0)
        .max()
        .unwrap_or(0);
    (
        layout.gap * 2 + layout.legend_swatch + layout.legend_swatch / 2 + label_w,
        entries.len() as u32 * layout.legend_row + layout.legend_swatch / 2,
    )
}

fn draw_legend(
    canvas: &mut RgbImage,
    painter: &TextPainter<'_>,
    layout: &Layout,
    x: u32,
    y: u32,
    entries: &[LegendEntry],
) {
    for (i, entry) in entries.iter().enumerate() {
        let row_y = y + layout.legend_swatch / 4 + i as u32 * layout.legend_row;
        let swatch = Rect::at(x as i32, row_y as i32).of_size(layout.legend_swatch, layout.legend_swatch);
        draw_filled_rect_mut(canvas, swatch, Rgb(entry.color));
        draw_hollow_rect_mut(canvas, swatch, Rgb(FOREGROUND));
        painter.draw(
            canvas,
            &entry.label,
            (x + layout.legend_swatch + layout.legend_swatch / 2) as i32,
            row_y as i32,
            layout.label_size,
            FOREGROUND,
        );
    }
}
