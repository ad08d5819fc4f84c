//! Appointment list filters for the farrier dashboard.

use time::{util::days_in_year_month, Date, Month};
use tracing::info;

use crate::error::Result;
use crate::store::{Document, DocumentStore, FieldFilter, APPOINTMENTS, FARRIERS};
use crate::util::dates::add_days;

/// Named dashboard filters. Unknown names list every appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFilter {
    AllPending,
    AllConfirmed,
    ConfirmedThisWeek,
    ConfirmedNextWeek,
    ConfirmedThisMonth,
    ConfirmedNextMonth,
    All,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

impl ScheduleFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("all-pending") => ScheduleFilter::AllPending,
            Some("all-confirmed") => ScheduleFilter::AllConfirmed,
            Some("confirmed-this-week") => ScheduleFilter::ConfirmedThisWeek,
            Some("confirmed-next-week") => ScheduleFilter::ConfirmedNextWeek,
            Some("confirmed-this-month") => ScheduleFilter::ConfirmedThisMonth,
            Some("confirmed-next-month") => ScheduleFilter::ConfirmedNextMonth,
            _ => ScheduleFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleFilter::AllPending => "all-pending",
            ScheduleFilter::AllConfirmed => "all-confirmed",
            ScheduleFilter::ConfirmedThisWeek => "confirmed-this-week",
            ScheduleFilter::ConfirmedNextWeek => "confirmed-next-week",
            ScheduleFilter::ConfirmedThisMonth => "confirmed-this-month",
            ScheduleFilter::ConfirmedNextMonth => "confirmed-next-month",
            ScheduleFilter::All => "all",
        }
    }

    fn accepts_status(&self, status: Option<&str>) -> bool {
        let status = status.map(str::to_ascii_lowercase);
        match self {
            ScheduleFilter::All => true,
            ScheduleFilter::AllPending => status.as_deref() == Some("pending"),
            _ => matches!(status.as_deref(), Some("confirmed" | "confirmed_by_customer")),
        }
    }

    /// The date window for ranged filters, relative to `today`.
    pub fn range(&self, today: Date) -> Option<DateRange> {
        match self {
            ScheduleFilter::ConfirmedThisWeek => Some(week_range(today, 0)),
            ScheduleFilter::ConfirmedNextWeek => Some(week_range(today, 1)),
            ScheduleFilter::ConfirmedThisMonth => month_range(today.year(), today.month()),
            ScheduleFilter::ConfirmedNextMonth => {
                let (year, month) = match today.month() {
                    Month::December => (today.year() + 1, Month::January),
                    m => (today.year(), m.next()),
                };
                month_range(year, month)
            }
            _ => None,
        }
    }

    fn is_ranged(&self) -> bool {
        matches!(
            self,
            ScheduleFilter::ConfirmedThisWeek
                | ScheduleFilter::ConfirmedNextWeek
                | ScheduleFilter::ConfirmedThisMonth
                | ScheduleFilter::ConfirmedNextMonth
        )
    }
}

/// Sunday through Saturday of the week containing `today`, shifted by `offset` weeks.
pub fn week_range(today: Date, offset: i64) -> DateRange {
    let back = i64::from(today.weekday().number_days_from_sunday());
    let start = add_days(today, offset * 7 - back);
    DateRange {
        start,
        end: add_days(start, 6),
    }
}

pub fn month_range(year: i32, month: Month) -> Option<DateRange> {
    let start = Date::from_calendar_date(year, month, 1).ok()?;
    let end = Date::from_calendar_date(year, month, days_in_year_month(year, month)).ok()?;
    Some(DateRange { start, end })
}

fn appointment_date(doc: &Document) -> Option<Date> {
    doc.get_date("requestedDate")
}

/// Apply `filter` to a farrier's appointments, ordered by requested date.
pub fn apply_filter(appointments: Vec<Document>, filter: ScheduleFilter, today: Date) -> Vec<Document> {
    let range = filter.range(today);

    let mut kept: Vec<Document> = appointments
        .into_iter()
        .filter(|doc| filter.accepts_status(doc.get_str("status")))
        .filter(|doc| {
            if !filter.is_ranged() {
                return true;
            }
            match (range, appointment_date(doc)) {
                (Some(range), Some(date)) => range.contains(date),
                _ => false,
            }
        })
        .collect();

    kept.sort_by(|a, b| {
        appointment_date(a)
            .cmp(&appointment_date(b))
            .then_with(|| a.name.cmp(&b.name))
    });
    kept
}

/// Whether the account `uid` may read `farrier_id`'s schedule.
///
/// A farrier profile keyed by the uid itself is always owned; otherwise the
/// profile must carry `ownerUid == uid`.
pub async fn farrier_owned_by(store: &dyn DocumentStore, farrier_id: &str, uid: &str) -> Result<bool> {
    if farrier_id == uid {
        return Ok(true);
    }

    let filters = [FieldFilter::eq("ownerUid", uid)];
    let owned = store.query(FARRIERS, &filters).await?;

    Ok(owned.iter().any(|farrier| farrier.id() == farrier_id))
}

/// Load and filter one farrier's appointments.
pub async fn list_appointments(
    store: &dyn DocumentStore,
    farrier_id: &str,
    filter: ScheduleFilter,
    today: Date,
) -> Result<Vec<Document>> {
    let filters = [FieldFilter::eq("farrierId", farrier_id)];
    let appointments = store.query(APPOINTMENTS, &filters).await?;
    let total = appointments.len();

    let kept = apply_filter(appointments, filter, today);

    info!(
        filter = filter.as_str(),
        total = total,
        matched = kept.len(),
        "appointments_filtered"
    );

    Ok(kept)
}
