//! Inbound SMS reply processing.
//!
//! A reply is classified by keyword and applied to the document store:
//! STOP/START toggle `smsOptOut` on every customer matching the sender,
//! CONFIRM moves the sender's upcoming appointments to
//! `confirmed_by_customer`. Writes are plain patches, not conditional
//! updates, so two racing replies may both observe an eligible status.

use std::collections::HashSet;

use time::Date;
use tracing::{debug, info};

use super::keyword::Keyword;
use super::phone;
use crate::error::Result;
use crate::store::{Document, DocumentStore, FieldFilter, Fields, Value, APPOINTMENTS, CUSTOMERS};

/// Appointment statuses a customer may still confirm.
pub const ELIGIBLE_STATUSES: [&str; 3] = ["scheduled", "pending", "confirmed"];

/// Status written when a customer confirms by SMS.
pub const CONFIRMED_BY_CUSTOMER: &str = "confirmed_by_customer";

pub const UNSUBSCRIBED_TEXT: &str = "You have been unsubscribed. Reply START to resubscribe.";
pub const RESUBSCRIBED_TEXT: &str =
    "You have been resubscribed and will receive appointment and invoice notifications.";
pub const CONFIRMED_TEXT: &str = "Thank you! Your appointment has been confirmed.";
pub const NOT_FOUND_TEXT: &str =
    "We could not find an upcoming appointment to confirm. Please contact your farrier directly.";
pub const HELP_TEXT: &str =
    "FarriTech: For help contact support@farritech.app. Reply STOP to unsubscribe. Msg & Data rates may apply.";

/// Outcome of processing one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Unsubscribed { customers: usize },
    Resubscribed { customers: usize },
    Confirmed { appointments: usize },
    NoAppointment,
    Help,
    /// Unrecognized input: acknowledge without a message.
    Acknowledge,
}

impl Reply {
    /// Text to send back, or `None` for the bare acknowledgement.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Reply::Unsubscribed { .. } => Some(UNSUBSCRIBED_TEXT),
            Reply::Resubscribed { .. } => Some(RESUBSCRIBED_TEXT),
            Reply::Confirmed { .. } => Some(CONFIRMED_TEXT),
            Reply::NoAppointment => Some(NOT_FOUND_TEXT),
            Reply::Help => Some(HELP_TEXT),
            Reply::Acknowledge => None,
        }
    }
}

/// Apply a reply from `from` with text `body`.
///
/// `today` decides which appointments are still upcoming.
pub async fn process_reply(
    store: &dyn DocumentStore,
    from: &str,
    body: &str,
    today: Date,
) -> Result<Reply> {
    let keyword = Keyword::classify(body);
    let phones = phone::candidates(from);

    info!(
        keyword = keyword.as_str(),
        phone_digits = phone::digits_only(from).len(),
        candidate_count = phones.len(),
        "sms_reply_classified"
    );

    let reply = match keyword {
        Keyword::Stop => Reply::Unsubscribed {
            customers: set_opt_out(store, &phones, true).await?,
        },
        Keyword::Start => Reply::Resubscribed {
            customers: set_opt_out(store, &phones, false).await?,
        },
        Keyword::Confirm => match confirm_appointments(store, &phones, today).await? {
            0 => Reply::NoAppointment,
            n => Reply::Confirmed { appointments: n },
        },
        Keyword::Help => Reply::Help,
        Keyword::Unknown => Reply::Acknowledge,
    };

    Ok(reply)
}

/// Set `smsOptOut` on every customer stored under any candidate phone form.
/// No match is not an error.
async fn set_opt_out(store: &dyn DocumentStore, phones: &[String], opt_out: bool) -> Result<usize> {
    let fields = Fields::from([("smsOptOut".to_string(), Value::Boolean(opt_out))]);
    let mut updated = 0;

    for phone in phones {
        let filters = [FieldFilter::eq("phone", phone.as_str())];
        for customer in store.query(CUSTOMERS, &filters).await? {
            store.patch(&customer.name, &fields).await?;
            updated += 1;
        }
    }

    info!(opt_out = opt_out, customers_updated = updated, "sms_opt_out_applied");

    Ok(updated)
}

async fn confirm_appointments(
    store: &dyn DocumentStore,
    phones: &[String],
    today: Date,
) -> Result<usize> {
    let fields = Fields::from([("status".to_string(), Value::from(CONFIRMED_BY_CUSTOMER))]);
    let mut seen = HashSet::new();
    let mut confirmed = 0;

    for phone in phones {
        let filters = [FieldFilter::eq("phone", phone.as_str())];
        for customer in store.query(CUSTOMERS, &filters).await? {
            for appointment in customer_appointments(store, &customer).await? {
                if !seen.insert(appointment.name.clone()) || !is_confirmable(&appointment, today) {
                    continue;
                }
                store.patch(&appointment.name, &fields).await?;
                confirmed += 1;
            }
        }
    }

    info!(appointments_confirmed = confirmed, "sms_confirm_applied");

    Ok(confirmed)
}

/// Appointments belonging to `customer`.
///
/// Appointments carrying `customerId` are joined on it; older ones only have
/// the denormalized `customerName`. A name match that names a different
/// `customerId` belongs to a namesake and is left alone.
async fn customer_appointments(store: &dyn DocumentStore, customer: &Document) -> Result<Vec<Document>> {
    let (Some(name), Some(farrier_id)) = (customer.get_str("name"), customer.get_str("farrierId"))
    else {
        debug!(customer = customer.id(), "sms_confirm_customer_incomplete");
        return Ok(Vec::new());
    };

    let by_id = [
        FieldFilter::eq("farrierId", farrier_id),
        FieldFilter::eq("customerId", customer.id()),
    ];
    let by_name = [
        FieldFilter::eq("farrierId", farrier_id),
        FieldFilter::eq("customerName", name),
    ];

    let mut appointments = store.query(APPOINTMENTS, &by_id).await?;

    for appointment in store.query(APPOINTMENTS, &by_name).await? {
        match appointment.get_str("customerId") {
            Some(owner) if owner != customer.id() => {
                debug!(
                    appointment = appointment.id(),
                    customer = customer.id(),
                    "sms_confirm_namesake_skipped"
                );
            }
            _ if appointments.iter().any(|a| a.name == appointment.name) => {}
            _ => appointments.push(appointment),
        }
    }

    Ok(appointments)
}

/// Eligible status, and either no date or a date of today or later.
/// A date that cannot be parsed is treated as not upcoming.
fn is_confirmable(appointment: &Document, today: Date) -> bool {
    let eligible = appointment
        .get_str("status")
        .is_some_and(|s| ELIGIBLE_STATUSES.contains(&s));

    if !eligible {
        return false;
    }

    if appointment.is_blank("requestedDate") {
        return true;
    }
    appointment
        .get_date("requestedDate")
        .is_some_and(|date| date >= today)
}
