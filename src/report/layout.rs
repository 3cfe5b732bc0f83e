//! Report assembly: turns a filtered ticket set into a paginated document
//! description. Pure and deterministic; nothing here touches the PDF writer.
//!
//! Coordinates are millimetres from the top-left corner of the page. Text
//! `y` is the baseline.

use chrono::NaiveDateTime;

use super::charts::{
    bar_center_fraction, bar_color, company_slices, status_slices, technician_bars, ChartKind,
    ChartSet, Slice, BAR_SIZE, PIE_SIZE,
};
use crate::aggregate::Aggregates;
use crate::filter::FilterCriteria;
use crate::models::{Ticket, TicketStatus};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// A cursor below this line starts a new page.
pub const PAGE_BREAK_Y: f32 = 260.0;

pub const MAX_TABLE_ROWS: usize = 25;
pub const TECHNICIAN_MAX_CHARS: usize = 18;
pub const FAULT_MAX_CHARS: usize = 28;
pub const COMPANY_MAX_CHARS: usize = 26;
pub const ROW_HEIGHT: f32 = 7.0;

pub const TABLE_COLUMNS: [(&str, f32); 5] = [
    ("Technician", 42.0),
    ("Date", 24.0),
    ("Company", 44.0),
    ("Fault", 50.0),
    ("Status", 20.0),
];

const CARD_GAP: f32 = 4.0;
const CARD_HEIGHT: f32 = 22.0;
const CHART_GAP: f32 = 6.0;
const LEGEND_ROW: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb(r, g, b)
    }
}

pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const GREY: Rgb = Rgb(110, 110, 110);
const HEADER_FILL: Rgb = Rgb(44, 62, 80);
const WHITE: Rgb = Rgb(255, 255, 255);
const SHADE_FILL: Rgb = Rgb(242, 244, 246);
const CARD_BORDER: Rgb = Rgb(189, 195, 199);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    /// `x` is the horizontal center of the text.
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        align: Align,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        chart: ChartKind,
    },
    /// One line of the detail table; `y` is the top edge of the row.
    TableRow {
        y: f32,
        header: bool,
        shaded: bool,
        cells: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// Body rows of the detail table across all pages.
    pub fn table_rows(&self) -> Vec<&[String]> {
        self.elements()
            .filter_map(|e| match e {
                Element::TableRow {
                    header: false,
                    cells,
                    ..
                } => Some(cells.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<ChartKind> {
        self.elements()
            .filter_map(|e| match e {
                Element::Image { chart, .. } => Some(*chart),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.elements()
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.pages.iter().flat_map(|p| p.elements.iter())
    }
}

/// Cut to at most `max` characters. Never splits a character.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Cursor {
            pages: vec![Page::default()],
            y: MARGIN,
        }
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN;
    }

    /// Break when the cursor is past the threshold, or when a block of
    /// `needed` height would run into the bottom margin.
    fn break_if_needed(&mut self, needed: f32) {
        let past_threshold = self.y > PAGE_BREAK_Y;
        let overflows = self.y + needed > PAGE_HEIGHT - MARGIN && self.y > MARGIN;
        if past_threshold || overflows {
            self.new_page();
        }
    }

    fn text(&mut self, x: f32, size: f32, bold: bool, align: Align, text: impl Into<String>) {
        self.text_colored(x, size, bold, align, BLACK, text);
    }

    fn text_colored(
        &mut self,
        x: f32,
        size: f32,
        bold: bool,
        align: Align,
        color: Rgb,
        text: impl Into<String>,
    ) {
        self.push(Element::Text {
            x,
            y: self.y,
            size,
            bold,
            align,
            color,
            text: text.into(),
        });
    }
}

pub fn assemble(
    tickets: &[Ticket],
    criteria: &FilterCriteria,
    charts: &ChartSet,
    generated_at: NaiveDateTime,
) -> Document {
    let mut cur = Cursor::new();

    title_block(&mut cur, generated_at);
    filters_block(&mut cur, criteria);
    metrics_block(&mut cur, &Aggregates::compute(tickets));
    chart_pair_block(&mut cur, tickets, charts);
    bar_chart_block(&mut cur, tickets, charts);
    table_block(&mut cur, tickets);
    page_numbers(&mut cur.pages);

    Document {
        title: "Incident report".to_string(),
        pages: cur.pages,
    }
}

fn title_block(cur: &mut Cursor, generated_at: NaiveDateTime) {
    let center = PAGE_WIDTH / 2.0;
    cur.y += 5.0;
    cur.text(center, 18.0, true, Align::Center, "Incident Report");
    cur.y += 7.0;
    cur.text_colored(
        center,
        10.0,
        false,
        Align::Center,
        GREY,
        format!("Generated {}", generated_at.format("%d/%m/%Y %H:%M")),
    );
    cur.y += 10.0;
}

fn filters_block(cur: &mut Cursor, criteria: &FilterCriteria) {
    cur.text(MARGIN, 12.0, true, Align::Left, "Filters applied");
    cur.y += 6.0;

    let active = criteria.active_filters();
    if active.is_empty() {
        cur.text(MARGIN + 4.0, 10.0, false, Align::Left, "None");
        cur.y += 6.0;
    } else {
        for (label, value) in active {
            cur.text(
                MARGIN + 4.0,
                10.0,
                false,
                Align::Left,
                format!("- {}: {}", label, value),
            );
            cur.y += 6.0;
        }
    }
    cur.y += 4.0;
}

fn metrics_block(cur: &mut Cursor, agg: &Aggregates) {
    let card_w = (CONTENT_WIDTH - 3.0 * CARD_GAP) / 4.0;
    let cards = [
        ("Total", agg.total),
        ("Open", agg.count(TicketStatus::Open)),
        ("Waiting", agg.count(TicketStatus::Waiting)),
        ("Resolved / Closed", agg.closed_or_resolved),
    ];

    let top = cur.y;
    for (i, (label, value)) in cards.iter().enumerate() {
        let x = MARGIN + i as f32 * (card_w + CARD_GAP);
        let center = x + card_w / 2.0;
        cur.push(Element::Rect {
            x,
            y: top,
            w: card_w,
            h: CARD_HEIGHT,
            fill: None,
            stroke: Some(CARD_BORDER),
        });
        cur.y = top + 11.0;
        cur.text(center, 16.0, true, Align::Center, value.to_string());
        cur.y = top + 18.0;
        cur.text_colored(center, 9.0, false, Align::Center, GREY, *label);
    }
    cur.y = top + CARD_HEIGHT + 8.0;
}

fn image_height(width: f32, (px_w, px_h): (u32, u32)) -> f32 {
    width * px_h as f32 / px_w as f32
}

fn chart_or_placeholder(
    cur: &mut Cursor,
    charts: &ChartSet,
    kind: ChartKind,
    x: f32,
    w: f32,
    h: f32,
) {
    if charts.get(kind).is_some() {
        cur.push(Element::Image {
            x,
            y: cur.y,
            w,
            h,
            chart: kind,
        });
    } else {
        cur.push(Element::Rect {
            x,
            y: cur.y,
            w,
            h,
            fill: None,
            stroke: Some(CARD_BORDER),
        });
        let saved = cur.y;
        cur.y += h / 2.0;
        cur.text_colored(
            x + w / 2.0,
            9.0,
            false,
            Align::Center,
            GREY,
            "Chart unavailable",
        );
        cur.y = saved;
    }
}

fn legend(cur: &mut Cursor, x: f32, slices: &[Slice]) {
    let start = cur.y;
    for slice in slices {
        cur.push(Element::Rect {
            x,
            y: cur.y - 2.5,
            w: 3.0,
            h: 3.0,
            fill: Some(slice.color.into()),
            stroke: None,
        });
        cur.text(
            x + 5.0,
            8.0,
            false,
            Align::Left,
            format!("{} ({})", truncate(&slice.label, 34), slice.value),
        );
        cur.y += LEGEND_ROW;
    }
    cur.y = start;
}

fn chart_pair_block(cur: &mut Cursor, tickets: &[Ticket], charts: &ChartSet) {
    let w = (CONTENT_WIDTH - CHART_GAP) / 2.0;
    let h = image_height(w, PIE_SIZE);
    let companies = company_slices(tickets);
    let statuses = status_slices(tickets);
    let legend_h = companies.len().max(statuses.len()) as f32 * LEGEND_ROW;

    cur.break_if_needed(6.0 + h + 4.0 + legend_h);

    let left = MARGIN;
    let right = MARGIN + w + CHART_GAP;
    cur.text(left, 11.0, true, Align::Left, ChartKind::CompanyPie.title());
    cur.text(right, 11.0, true, Align::Left, ChartKind::StatusDoughnut.title());
    cur.y += 3.0;

    chart_or_placeholder(cur, charts, ChartKind::CompanyPie, left, w, h);
    chart_or_placeholder(cur, charts, ChartKind::StatusDoughnut, right, w, h);
    cur.y += h + 5.0;

    legend(cur, left, &companies);
    legend(cur, right, &statuses);
    cur.y += legend_h + 6.0;
}

fn bar_chart_block(cur: &mut Cursor, tickets: &[Ticket], charts: &ChartSet) {
    let w = CONTENT_WIDTH;
    let h = image_height(w, BAR_SIZE);
    let bars = technician_bars(tickets);

    cur.break_if_needed(6.0 + h + 12.0);

    cur.text(MARGIN, 11.0, true, Align::Left, ChartKind::TechnicianBar.title());
    cur.y += 3.0;
    chart_or_placeholder(cur, charts, ChartKind::TechnicianBar, MARGIN, w, h);
    cur.y += h + 4.0;

    if bars.is_empty() {
        cur.text_colored(
            MARGIN,
            8.0,
            false,
            Align::Left,
            GREY,
            "No resolved or closed tickets",
        );
        cur.y += 4.0;
    } else {
        // Approximate Helvetica advance at 7pt is ~1.3 mm per character.
        let slot = w / bars.len() as f32;
        let max_chars = ((slot / 1.3) as usize).max(3);
        for (i, (name, count)) in bars.iter().enumerate() {
            let x = MARGIN + bar_center_fraction(i, bars.len()) * w;
            cur.text(x, 7.0, false, Align::Center, truncate(name, max_chars));
            cur.y += 4.0;
            cur.text_colored(x, 7.0, true, Align::Center, bar_color().into(), count.to_string());
            cur.y -= 4.0;
        }
        cur.y += 4.0;
    }
    cur.y += 8.0;
}

fn table_header(cur: &mut Cursor) {
    cur.push(Element::TableRow {
        y: cur.y,
        header: true,
        shaded: false,
        cells: TABLE_COLUMNS.iter().map(|(name, _)| name.to_string()).collect(),
    });
    cur.y += ROW_HEIGHT;
}

fn table_block(cur: &mut Cursor, tickets: &[Ticket]) {
    cur.break_if_needed(8.0 + 2.0 * ROW_HEIGHT);

    cur.text(MARGIN, 12.0, true, Align::Left, "Ticket detail");
    cur.y += 3.0;
    if tickets.len() > MAX_TABLE_ROWS {
        cur.y += 3.0;
        cur.text_colored(
            MARGIN,
            8.0,
            false,
            Align::Left,
            GREY,
            format!("Showing the first {} of {} tickets", MAX_TABLE_ROWS, tickets.len()),
        );
    }
    cur.y += 2.0;

    if tickets.is_empty() {
        cur.y += 4.0;
        cur.text(MARGIN, 10.0, false, Align::Left, "No tickets match the selected filters.");
        cur.y += 6.0;
        return;
    }

    table_header(cur);
    for (i, ticket) in tickets.iter().take(MAX_TABLE_ROWS).enumerate() {
        if cur.y > PAGE_BREAK_Y {
            cur.new_page();
            table_header(cur);
        }
        cur.push(Element::TableRow {
            y: cur.y,
            header: false,
            shaded: i % 2 == 1,
            cells: vec![
                truncate(&ticket.technician, TECHNICIAN_MAX_CHARS),
                ticket.date.format("%d/%m/%Y").to_string(),
                truncate(&ticket.company, COMPANY_MAX_CHARS),
                truncate(&ticket.fault_type, FAULT_MAX_CHARS),
                ticket.status_label().to_string(),
            ],
        });
        cur.y += ROW_HEIGHT;
    }
}

fn page_numbers(pages: &mut [Page]) {
    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        page.elements.push(Element::Text {
            x: PAGE_WIDTH / 2.0,
            y: PAGE_HEIGHT - 8.0,
            size: 8.0,
            bold: false,
            align: Align::Center,
            color: GREY,
            text: format!("Page {} of {}", i + 1, total),
        });
    }
}

/// Background fill and text color of a table row.
pub fn row_style(header: bool, shaded: bool) -> (Option<Rgb>, Rgb) {
    if header {
        (Some(HEADER_FILL), WHITE)
    } else if shaded {
        (Some(SHADE_FILL), BLACK)
    } else {
        (None, BLACK)
    }
}
