//! Chart rasterization for the report.
//!
//! Charts are drawn without text so they do not depend on system fonts;
//! legends and axis labels are laid out by the report itself using the
//! slice/bar ordering and colors exposed here.

use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;
use std::f64::consts::PI;
use std::io::Cursor;

use crate::aggregate::{resolved_by_technician, tally_by_company, Aggregates};
use crate::models::{Ticket, TicketStatus};

pub const PIE_SIZE: (u32, u32) = (800, 600);
pub const BAR_SIZE: (u32, u32) = (1200, 466);
/// Horizontal padding of the bar plot area, in pixels on each side.
pub const BAR_MARGIN_PX: u32 = 40;
/// Slices beyond this are folded into "Other".
pub const MAX_PIE_SLICES: usize = 7;

const PALETTE: [(u8, u8, u8); 8] = [
    (54, 162, 235),
    (255, 99, 132),
    (255, 205, 86),
    (75, 192, 192),
    (153, 102, 255),
    (255, 159, 64),
    (201, 203, 207),
    (46, 204, 113),
];

const BAR_COLOR: (u8, u8, u8) = (46, 134, 193);
const GRID_COLOR: (u8, u8, u8) = (225, 225, 225);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    CompanyPie,
    StatusDoughnut,
    TechnicianBar,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::CompanyPie,
        ChartKind::StatusDoughnut,
        ChartKind::TechnicianBar,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::CompanyPie => "Tickets by company",
            ChartKind::StatusDoughnut => "Tickets by status",
            ChartKind::TechnicianBar => "Resolved by technician",
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            ChartKind::CompanyPie => "company-pie",
            ChartKind::StatusDoughnut => "status-doughnut",
            ChartKind::TechnicianBar => "technician-bar",
        }
    }
}

/// An RGB8 bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ChartImage {
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let img = image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", self.width, self.height))?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageOutputFormat::Png)
            .context("Failed to encode chart as PNG")?;
        Ok(out.into_inner())
    }
}

/// The three report charts. A chart that failed to render is `None`.
#[derive(Debug, Clone, Default)]
pub struct ChartSet {
    pub company_pie: Option<ChartImage>,
    pub status_doughnut: Option<ChartImage>,
    pub technician_bar: Option<ChartImage>,
}

impl ChartSet {
    pub fn get(&self, kind: ChartKind) -> Option<&ChartImage> {
        match kind {
            ChartKind::CompanyPie => self.company_pie.as_ref(),
            ChartKind::StatusDoughnut => self.status_doughnut.as_ref(),
            ChartKind::TechnicianBar => self.technician_bar.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: usize,
    pub color: (u8, u8, u8),
}

pub fn slice_color(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

pub fn status_color(status: TicketStatus) -> (u8, u8, u8) {
    match status {
        TicketStatus::Open => (231, 76, 60),
        TicketStatus::Waiting => (243, 156, 18),
        TicketStatus::Closed => (127, 140, 141),
        TicketStatus::Resolved => (39, 174, 96),
    }
}

pub fn bar_color() -> (u8, u8, u8) {
    BAR_COLOR
}

/// Company distribution, largest first, folded to `MAX_PIE_SLICES` + "Other".
pub fn company_slices(tickets: &[Ticket]) -> Vec<Slice> {
    let mut counts: Vec<(String, usize)> = tally_by_company(tickets).into_iter().collect();
    // Stable sort keeps alphabetical order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut slices: Vec<Slice> = counts
        .iter()
        .take(MAX_PIE_SLICES)
        .enumerate()
        .map(|(i, (label, value))| Slice {
            label: label.clone(),
            value: *value,
            color: slice_color(i),
        })
        .collect();

    let rest: usize = counts.iter().skip(MAX_PIE_SLICES).map(|(_, v)| v).sum();
    if rest > 0 {
        slices.push(Slice {
            label: "Other".to_string(),
            value: rest,
            color: slice_color(MAX_PIE_SLICES),
        });
    }
    slices
}

/// One slice per status, in enumeration order, zero counts included.
pub fn status_slices(tickets: &[Ticket]) -> Vec<Slice> {
    let agg = Aggregates::compute(tickets);
    TicketStatus::ALL
        .iter()
        .map(|s| Slice {
            label: s.label().to_string(),
            value: agg.count(*s),
            color: status_color(*s),
        })
        .collect()
}

/// Closed-or-resolved count per technician, alphabetical.
pub fn technician_bars(tickets: &[Ticket]) -> Vec<(String, usize)> {
    resolved_by_technician(tickets).into_iter().collect()
}

/// Horizontal center of bar `index` out of `count`, as a fraction of image width.
pub fn bar_center_fraction(index: usize, count: usize) -> f32 {
    let (width, _) = BAR_SIZE;
    let margin = BAR_MARGIN_PX as f32 / width as f32;
    let slot = (1.0 - 2.0 * margin) / count.max(1) as f32;
    margin + slot * (index as f32 + 0.5)
}

pub fn render_all(tickets: &[Ticket]) -> ChartSet {
    ChartSet {
        company_pie: keep_or_log(
            ChartKind::CompanyPie,
            render_pie(&company_slices(tickets), 0.0),
        ),
        status_doughnut: keep_or_log(
            ChartKind::StatusDoughnut,
            render_pie(&status_slices(tickets), 0.5),
        ),
        technician_bar: keep_or_log(
            ChartKind::TechnicianBar,
            render_bars(&technician_bars(tickets)),
        ),
    }
}

fn keep_or_log(kind: ChartKind, result: Result<ChartImage>) -> Option<ChartImage> {
    match result {
        Ok(img) => Some(img),
        Err(e) => {
            tracing::warn!(chart = kind.file_stem(), "chart unavailable: {:#}", e);
            None
        }
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

fn draw_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("drawing failed: {}", e)
}

/// Pie when `hole` is 0, doughnut otherwise (`hole` is the inner radius ratio).
pub fn render_pie(slices: &[Slice], hole: f64) -> Result<ChartImage> {
    let (width, height) = PIE_SIZE;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let center = (width as f64 / 2.0, height as f64 / 2.0);
        let outer = (width.min(height) as f64 / 2.0) - 20.0;
        let inner = outer * hole.clamp(0.0, 0.95);
        let total: usize = slices.iter().map(|s| s.value).sum();

        if total == 0 {
            let ring = ring_segment(center, outer, inner, 0.0, 2.0 * PI);
            root.draw(&Polygon::new(ring, rgb(GRID_COLOR).filled()))
                .map_err(draw_err)?;
        } else {
            // Start at twelve o'clock, clockwise.
            let mut start = -PI / 2.0;
            for slice in slices.iter().filter(|s| s.value > 0) {
                let sweep = 2.0 * PI * slice.value as f64 / total as f64;
                let points = ring_segment(center, outer, inner, start, start + sweep);
                root.draw(&Polygon::new(points, rgb(slice.color).filled()))
                    .map_err(draw_err)?;
                start += sweep;
            }
        }

        root.present().map_err(draw_err)?;
    }
    Ok(ChartImage {
        width,
        height,
        pixels,
    })
}

fn ring_segment(
    center: (f64, f64),
    outer: f64,
    inner: f64,
    from: f64,
    to: f64,
) -> Vec<(i32, i32)> {
    let steps = (((to - from).abs() / (PI / 90.0)).ceil() as usize).max(2);
    let arc = |radius: f64, i: usize| {
        let angle = from + (to - from) * i as f64 / steps as f64;
        (
            (center.0 + radius * angle.cos()).round() as i32,
            (center.1 + radius * angle.sin()).round() as i32,
        )
    };

    let mut points: Vec<(i32, i32)> = (0..=steps).map(|i| arc(outer, i)).collect();
    if inner > 0.0 {
        points.extend((0..=steps).rev().map(|i| arc(inner, i)));
    } else {
        points.push((center.0.round() as i32, center.1.round() as i32));
    }
    points
}

pub fn render_bars(bars: &[(String, usize)]) -> Result<ChartImage> {
    let (width, height) = BAR_SIZE;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let left = BAR_MARGIN_PX as i32;
        let right = (width - BAR_MARGIN_PX) as i32;
        let top = 20i32;
        let baseline = height as i32 - 10;
        let max = bars.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1);
        let unit = (baseline - top) as f64 / max as f64;

        // One gridline per unit while that stays legible.
        if max <= 20 {
            for step in 1..=max {
                let y = baseline - (step as f64 * unit).round() as i32;
                root.draw(&Rectangle::new([(left, y), (right, y + 1)], rgb(GRID_COLOR).filled()))
                    .map_err(draw_err)?;
            }
        }

        for (i, (_, value)) in bars.iter().enumerate() {
            let center = (bar_center_fraction(i, bars.len()) * width as f32) as i32;
            let slot = (right - left) / bars.len().max(1) as i32;
            let half = ((slot as f64 * 0.3) as i32).max(2);
            let bar_top = baseline - (*value as f64 * unit).round() as i32;
            root.draw(&Rectangle::new(
                [(center - half, bar_top), (center + half, baseline)],
                rgb(BAR_COLOR).filled(),
            ))
            .map_err(draw_err)?;
        }

        root.draw(&Rectangle::new([(left, baseline), (right, baseline + 2)], BLACK.filled()))
            .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    Ok(ChartImage {
        width,
        height,
        pixels,
    })
}
