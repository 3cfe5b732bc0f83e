use chrono::{Days, NaiveDate, NaiveDateTime};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Ticket, TicketStatus};

/// Lowercase and strip diacritics so "Gómez" compares equal to "gomez".
pub fn normalize(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// User-selected constraints. Every field is optional; `None` never excludes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub company: Option<String>,
    pub technician: Option<String>,
    pub fault_type: Option<String>,
    pub status: Option<TicketStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterCriteria {
    /// Build criteria from raw form values. Blank or unparsable values are
    /// treated as unset.
    pub fn from_args(
        company: Option<&str>,
        technician: Option<&str>,
        fault_type: Option<&str>,
        status: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Self {
        FilterCriteria {
            company: non_blank(company),
            technician: non_blank(technician),
            fault_type: non_blank(fault_type),
            status: non_blank(status).and_then(|s| match s.parse() {
                Ok(status) => Some(status),
                Err(e) => {
                    tracing::warn!("ignoring status filter: {}", e);
                    None
                }
            }),
            start_date: parse_date_arg("start", start_date),
            end_date: parse_date_arg("end", end_date),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active_filters().is_empty()
    }

    /// (label, value) for each constraint that is actually set.
    pub fn active_filters(&self) -> Vec<(&'static str, String)> {
        let mut active = Vec::new();
        if let Some(company) = self.company.as_deref().filter(|s| !s.trim().is_empty()) {
            active.push(("Company", company.to_string()));
        }
        if let Some(tech) = self.technician.as_deref().filter(|s| !s.trim().is_empty()) {
            active.push(("Technician", tech.to_string()));
        }
        if let Some(fault) = self.fault_type.as_deref().filter(|s| !s.trim().is_empty()) {
            active.push(("Fault", fault.to_string()));
        }
        if let Some(status) = self.status {
            active.push(("Status", status.label().to_string()));
        }
        if let Some(start) = self.start_date {
            active.push(("From", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            active.push(("To", end.format("%Y-%m-%d").to_string()));
        }
        active
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        contains_ci(&ticket.company, self.company.as_deref())
            && contains_accent_insensitive(&ticket.technician, self.technician.as_deref())
            && contains_ci(&ticket.fault_type, self.fault_type.as_deref())
            && self.status.map_or(true, |s| ticket.status == s)
            && self.within_dates(ticket.date)
    }

    fn within_dates(&self, date: NaiveDateTime) -> bool {
        if let Some(start) = self.start_date {
            if date < start_of_day(start) {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            // Inclusive through the last instant of the end day.
            if let Some(next_day) = end.checked_add_days(Days::new(1)) {
                if date >= start_of_day(next_day) {
                    return false;
                }
            }
        }
        true
    }
}

/// Stable filter: the result keeps the input's relative order.
pub fn filter(tickets: &[Ticket], criteria: &FilterCriteria) -> Vec<Ticket> {
    tickets
        .iter()
        .filter(|t| criteria.matches(t))
        .cloned()
        .collect()
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

fn contains_accent_insensitive(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(n) => normalize(haystack).contains(&normalize(n)),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_date_arg(which: &str, value: Option<&str>) -> Option<NaiveDate> {
    let value = non_blank(value)?;
    match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!("ignoring {} date '{}': {}", which, value, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ticket(id: i64, technician: &str, company: &str, date: &str, status: TicketStatus) -> Ticket {
        Ticket {
            id,
            code: format!("T-{:04}", id),
            technician: technician.to_string(),
            date: crate::models::parse_ticket_date(date).unwrap(),
            company: company.to_string(),
            duration_hours: 1.0,
            fault_type: "Impresora atascada".to_string(),
            status,
        }
    }

    fn sample() -> Vec<Ticket> {
        vec![
            ticket(1, "Ana Gómez", "companyA", "2024-01-05", TicketStatus::Open),
            ticket(2, "Luis Pérez", "companyB", "2024-01-10", TicketStatus::Resolved),
            ticket(3, "Ana Gómez", "companyA", "2024-01-15", TicketStatus::Closed),
        ]
    }

    fn ids(tickets: &[Ticket]) -> Vec<i64> {
        tickets.iter().map(|t| t.id).collect()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize("Gómez"), "gomez");
        assert_eq!(normalize("NÚÑEZ"), "nunez");
        assert_eq!(normalize("plain"), "plain");
    }

    #[test]
    fn test_empty_criteria_returns_everything() {
        let tickets = sample();
        let result = filter(&tickets, &FilterCriteria::default());
        assert_eq!(result, tickets);
    }

    #[test]
    fn test_company_filter_keeps_order() {
        let criteria = FilterCriteria {
            company: Some("companyA".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![1, 3]);
    }

    #[test]
    fn test_company_filter_is_case_insensitive_substring() {
        let criteria = FilterCriteria {
            company: Some("PANYb".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![2]);
    }

    #[test]
    fn test_technician_filter_ignores_accents() {
        let criteria = FilterCriteria {
            technician: Some("Perez".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![2]);

        let criteria = FilterCriteria {
            technician: Some("GOMEZ".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![1, 3]);
    }

    #[test]
    fn test_accented_filter_matches_plain_name() {
        let tickets = vec![ticket(1, "Jose Ramirez", "X", "2024-01-01", TicketStatus::Open)];
        let criteria = FilterCriteria {
            technician: Some("José Ramírez".to_string()),
            ..Default::default()
        };
        assert_eq!(filter(&tickets, &criteria).len(), 1);
    }

    #[test]
    fn test_fault_type_substring() {
        let mut tickets = sample();
        tickets[1].fault_type = "Red sin conexión".to_string();
        let criteria = FilterCriteria {
            fault_type: Some("red".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&tickets, &criteria)), vec![2]);
    }

    #[test]
    fn test_status_is_exact() {
        let criteria = FilterCriteria {
            status: Some(TicketStatus::Closed),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![3]);
    }

    #[test]
    fn test_date_range_inclusive_both_ends() {
        let criteria = FilterCriteria {
            start_date: Some(date("2024-01-06")),
            end_date: Some(date("2024-01-10")),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&sample(), &criteria)), vec![2]);
    }

    #[test]
    fn test_end_date_covers_whole_day() {
        let tickets = vec![
            ticket(1, "A", "X", "2024-01-10T23:59:59", TicketStatus::Open),
            ticket(2, "A", "X", "2024-01-11T00:00:00", TicketStatus::Open),
        ];
        let criteria = FilterCriteria {
            end_date: Some(date("2024-01-10")),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&tickets, &criteria)), vec![1]);
    }

    #[test]
    fn test_offset_date_on_end_day_is_kept() {
        let json = r#"{"id":1,"technician":"A","date":"2024-01-10T20:00:00-06:00",
            "company":"X","status":"open"}"#;
        let tickets: Vec<Ticket> = vec![serde_json::from_str(json).unwrap()];
        let criteria = FilterCriteria {
            start_date: Some(date("2024-01-10")),
            end_date: Some(date("2024-01-10")),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&tickets, &criteria)), vec![1]);
    }

    #[test]
    fn test_start_date_is_start_of_day() {
        let tickets = vec![
            ticket(1, "A", "X", "2024-01-05T00:00:00", TicketStatus::Open),
            ticket(2, "A", "X", "2024-01-04T23:59:59", TicketStatus::Open),
        ];
        let criteria = FilterCriteria {
            start_date: Some(date("2024-01-05")),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&tickets, &criteria)), vec![1]);
    }

    #[test]
    fn test_from_args_treats_blank_and_invalid_as_unset() {
        let criteria = FilterCriteria::from_args(
            Some("  "),
            Some("perez"),
            None,
            Some("bogus"),
            Some("01/05/2024"),
            Some("2024-01-10"),
        );
        assert_eq!(criteria.company, None);
        assert_eq!(criteria.technician.as_deref(), Some("perez"));
        assert_eq!(criteria.status, None);
        assert_eq!(criteria.start_date, None);
        assert_eq!(criteria.end_date, Some(date("2024-01-10")));
    }

    #[test]
    fn test_active_filters_lists_only_set_fields() {
        assert!(FilterCriteria::default().is_empty());

        let criteria = FilterCriteria {
            company: Some("Acme".to_string()),
            status: Some(TicketStatus::Waiting),
            ..Default::default()
        };
        let active = criteria.active_filters();
        assert_eq!(
            active,
            vec![("Company", "Acme".to_string()), ("Status", "Waiting".to_string())]
        );
    }

    fn arb_status() -> impl Strategy<Value = TicketStatus> {
        prop_oneof![
            Just(TicketStatus::Open),
            Just(TicketStatus::Waiting),
            Just(TicketStatus::Closed),
            Just(TicketStatus::Resolved),
        ]
    }

    fn arb_tickets() -> impl Strategy<Value = Vec<Ticket>> {
        proptest::collection::vec(
            ("[a-c]{1,3}", "[a-cé]{1,4}", 1u32..28, arb_status()),
            0..30,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (company, tech, day, status))| {
                    ticket(
                        i as i64 + 1,
                        &tech,
                        &company,
                        &format!("2024-02-{:02}", day),
                        status,
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_filter_is_ordered_subset(
            tickets in arb_tickets(),
            company in "[a-c]{0,2}",
            status in proptest::option::of(arb_status()),
        ) {
            let criteria = FilterCriteria {
                company: Some(company),
                status,
                ..Default::default()
            };
            let result = ids(&filter(&tickets, &criteria));
            let all = ids(&tickets);
            // Subsequence check: every result id appears in order in the input.
            let mut it = all.iter();
            for id in &result {
                prop_assert!(it.any(|x| x == id));
            }
        }

        #[test]
        fn prop_filter_is_conjunctive(
            tickets in arb_tickets(),
            company in "[a-c]{1,2}",
            status in arb_status(),
        ) {
            let by_company = FilterCriteria { company: Some(company.clone()), ..Default::default() };
            let by_status = FilterCriteria { status: Some(status), ..Default::default() };
            let both = FilterCriteria { company: Some(company), status: Some(status), ..Default::default() };

            let company_ids = ids(&filter(&tickets, &by_company));
            let status_ids = ids(&filter(&tickets, &by_status));
            let expected: Vec<i64> = company_ids.into_iter().filter(|id| status_ids.contains(id)).collect();
            prop_assert_eq!(ids(&filter(&tickets, &both)), expected);
        }

        #[test]
        fn prop_empty_criteria_is_identity(tickets in arb_tickets()) {
            prop_assert_eq!(filter(&tickets, &FilterCriteria::default()), tickets);
        }
    }
}
