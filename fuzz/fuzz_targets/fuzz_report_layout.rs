#![no_main]

//! Fuzz target for report assembly.
//!
//! Ticket text and filter values go straight into truncation, legends and
//! table cells. The goal is to catch panics from byte slicing on multi-byte
//! characters and from layout arithmetic on odd ticket counts.

use arbitrary::Arbitrary;
use chrono::{NaiveDate, NaiveDateTime};
use libfuzzer_sys::fuzz_target;

use deskboard::filter::{filter, FilterCriteria};
use deskboard::models::{Ticket, TicketStatus};
use deskboard::report::charts::ChartSet;
use deskboard::report::layout::{assemble, MAX_TABLE_ROWS};

#[derive(Arbitrary, Debug)]
struct FuzzTicket {
    technician: String,
    company: String,
    fault_type: String,
    status: u8,
    day: u16,
}

#[derive(Arbitrary, Debug)]
struct LayoutInput {
    tickets: Vec<FuzzTicket>,
    company: Option<String>,
    technician: Option<String>,
    fault: Option<String>,
}

fn base_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fuzz_target!(|input: LayoutInput| {
    let tickets: Vec<Ticket> = input
        .tickets
        .into_iter()
        .take(200)
        .enumerate()
        .map(|(i, t)| Ticket {
            id: i as i64 + 1,
            code: String::new(),
            technician: t.technician,
            date: base_date() + chrono::Duration::days(i64::from(t.day % 366)),
            company: t.company,
            duration_hours: 0.0,
            fault_type: t.fault_type,
            status: TicketStatus::ALL[t.status as usize % 4],
        })
        .collect();

    let criteria = FilterCriteria {
        company: input.company,
        technician: input.technician,
        fault_type: input.fault,
        ..Default::default()
    };

    let selected = filter(&tickets, &criteria);
    let doc = assemble(&selected, &criteria, &ChartSet::default(), base_date());

    assert!(doc.table_rows().len() <= MAX_TABLE_ROWS);
    assert!(!doc.pages.is_empty());
});
