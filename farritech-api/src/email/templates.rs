//! Email templates.
//!
//! Every value taken from a request is HTML-escaped before interpolation.

use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

use crate::util::html::escape;

const DEFAULT_BUSINESS_NAME: &str = "Your Farrier Service";
const DASHBOARD_URL: &str = "https://farrier-pro.vercel.app";
const APP_DASHBOARD_URL: &str = "https://app.farritech.com/dashboard";

const BODY_STYLE: &str = "font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,'Helvetica Neue',Arial,sans-serif;line-height:1.6;color:#333;max-width:600px;margin:0 auto;padding:20px;";
const BUTTON_STYLE: &str = "background:linear-gradient(135deg,#2563eb 0%,#06b6d4 100%);color:#fff;padding:14px 32px;text-decoration:none;border-radius:6px;font-weight:600;display:inline-block;font-size:16px;";
const LABEL_STYLE: &str = "padding:4px 0;width:140px;color:#6b7280;vertical-align:top;";

/// Subject line and HTML body.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub subject: String,
    pub html: String,
}

/// Appointment details shared by booking, update and cancellation emails.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentEmail {
    #[serde(default, deserialize_with = "lenient_text")]
    pub farrier_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub farrier_business_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub farrier_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub booking_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub farm_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub customer_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub services: Json,
    #[serde(default, deserialize_with = "lenient_text")]
    pub number_of_horses: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub requested_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub requested_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeEmail {
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub business_name: Option<String>,
}

/// Strings and numbers become text; empty strings, null and anything else become `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Json::deserialize(deserializer)? {
        Json::String(s) if !s.trim().is_empty() => Some(s),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl AppointmentEmail {
    fn business_name(&self) -> &str {
        self.farrier_business_name
            .as_deref()
            .unwrap_or(DEFAULT_BUSINESS_NAME)
    }

    fn requested_date(&self) -> &str {
        self.requested_date.as_deref().unwrap_or_default()
    }

    fn display_time(&self) -> String {
        self.requested_time.as_deref().map(format_time).unwrap_or_default()
    }

    fn first_name(&self) -> &str {
        self.customer_name
            .as_deref()
            .and_then(|n| n.split(' ').next())
            .filter(|n| !n.is_empty())
            .unwrap_or("there")
    }
}

/// `"14:05"` becomes `"2:05 PM"`. Unparseable input is returned unchanged.
pub fn format_time(raw: &str) -> String {
    let mut parts = raw.trim().splitn(2, ':');
    let hour: u32 = match parts.next().and_then(|h| h.trim().parse().ok()) {
        Some(h) => h,
        None => return raw.to_string(),
    };
    let minute: u32 = match parts.next() {
        Some(m) => match m.trim().get(..2).unwrap_or(m.trim()).parse() {
            Ok(m) => m,
            Err(_) => return raw.to_string(),
        },
        None => 0,
    };

    let period = if hour >= 12 { "PM" } else { "AM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };

    format!("{hour12}:{minute:02} {period}")
}

/// Arrays are joined with `, `; a plain string is used as is.
pub fn services_list(services: &Json) -> String {
    match services {
        Json::Array(items) => items
            .iter()
            .map(|item| match item {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Json::String(s) if !s.is_empty() => s.clone(),
        _ => "Not specified".to_string(),
    }
}

pub fn full_address(parts: &[Option<&str>]) -> String {
    let joined = parts
        .iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    if joined.is_empty() {
        "Not provided".to_string()
    } else {
        joined
    }
}

// =============================================================================
// Layout helpers
// =============================================================================

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\"></head>\n<body style=\"{BODY_STYLE}\">\n{body}\n</body>\n</html>"
    )
}

fn header(title: &str, subtitle: &str, gradient: &str, subtitle_color: &str) -> String {
    format!(
        "<div style=\"text-align:center;padding:30px;background:linear-gradient(135deg,{gradient});border-radius:8px 8px 0 0;\">\
<h1 style=\"color:#fff;margin:0;font-size:28px;font-weight:700;\">{title}</h1>\
<p style=\"color:{subtitle_color};margin:6px 0 0;font-size:14px;\">{subtitle}</p></div>"
    )
}

fn footer(text: &str) -> String {
    format!(
        "<div style=\"background:#f9fafb;padding:20px 30px;border:1px solid #e5e7eb;border-top:none;border-radius:0 0 8px 8px;text-align:center;\">\
<p style=\"color:#9ca3af;font-size:12px;margin:0;\">{text}</p></div>"
    )
}

/// A label/value table row. `value` must already be escaped.
fn row(label: &str, value: &str) -> String {
    format!("<tr><td style=\"{LABEL_STYLE}\">{label}</td><td>{value}</td></tr>")
}

fn optional_row(label: &str, value: Option<&str>) -> String {
    value
        .map(|v| row(label, &escape(v)))
        .unwrap_or_default()
}

fn panel(title: &str, rows: &str, background: &str, border: &str) -> String {
    format!(
        "<div style=\"background:{background};border-left:4px solid {border};padding:20px;margin:20px 0;border-radius:4px;\">\
<h3 style=\"color:#1a365d;margin-top:0;font-size:16px;\">{title}</h3>\
<table style=\"width:100%;border-collapse:collapse;font-size:14px;color:#374151;\">{rows}</table></div>"
    )
}

fn content(inner: &str) -> String {
    format!(
        "<div style=\"background:#fff;padding:35px 30px;border:1px solid #e5e7eb;border-top:none;\">{inner}</div>"
    )
}

fn contact_block(title: &str, notice: &AppointmentEmail, extra: &str) -> String {
    let phone = notice
        .farrier_phone
        .as_deref()
        .map(|p| format!("<p style=\"margin:4px 0;color:#4b5563;font-size:14px;\">📱 {}</p>", escape(p)))
        .unwrap_or_default();
    let email = notice
        .farrier_email
        .as_deref()
        .map(|e| {
            let e = escape(e);
            format!(
                "<p style=\"margin:4px 0;font-size:14px;\"><a href=\"mailto:{e}\" style=\"color:#2563eb;text-decoration:none;\">✉️ {e}</a></p>"
            )
        })
        .unwrap_or_default();

    format!(
        "<div style=\"background:#f9fafb;border-left:4px solid #6b7280;padding:18px 20px;margin:20px 0;border-radius:4px;\">\
<h3 style=\"color:#1a365d;margin-top:0;font-size:15px;\">{title}</h3>{phone}{email}{extra}</div>"
    )
}

// =============================================================================
// Templates
// =============================================================================

/// Original signup welcome.
pub fn legacy_welcome(business_name: &str) -> Rendered {
    let business = escape(business_name);

    Rendered {
        subject: format!("Welcome to Farrier Pro, {business_name}!"),
        html: format!(
            "<h1>Welcome to Farrier Pro 🐴</h1>\n\
<p>Your account has been successfully created.</p>\n\
<p><strong>Business:</strong> {business}</p>\n\
<p>You can now log in and start managing appointments, invoices, and customers.</p>\n\
<a href=\"{DASHBOARD_URL}\" style=\"background:#2f5d1f;color:white;padding:10px 16px;border-radius:6px;text-decoration:none;\">Login to Dashboard</a>\n\
<p style=\"margin-top:20px;font-size:12px;color:#666;\">If you didn't create this account, contact support immediately.</p>"
        ),
    }
}

pub fn welcome(request: &WelcomeEmail) -> Rendered {
    let first_name = escape(request.first_name.as_deref().unwrap_or("there"));
    let business = escape(
        request
            .business_name
            .as_deref()
            .unwrap_or("your farrier business"),
    );

    let steps = [
        ("Complete your profile:", "Add your business details and service areas"),
        ("Add your first client:", "Import existing clients or create new ones"),
        ("Set your schedule:", "Configure your availability and start booking appointments"),
        ("Create your first invoice:", "Get paid faster with professional invoicing"),
    ]
    .iter()
    .map(|(title, text)| format!("<li style=\"margin-bottom:10px;\"><strong>{title}</strong> {text}</li>"))
    .collect::<String>();

    let body = format!(
        "{header}{content}{footer}",
        header = header(
            "FarriTech",
            "Managing your farrier business makes sense",
            "#1a365d 0%,#2563eb 100%",
            "#06b6d4"
        ),
        content = content(&format!(
            "<h2 style=\"color:#1a365d;margin-top:0;\">Welcome aboard, {first_name}! 👋</h2>\
<p style=\"font-size:16px;color:#4b5563;\">Thanks for joining FarriTech! We're excited to help you streamline {business} and take control of your operations.</p>\
<div style=\"background:#f0f9ff;border-left:4px solid #2563eb;padding:20px;margin:25px 0;border-radius:4px;\">\
<h3 style=\"color:#1a365d;margin-top:0;font-size:18px;\">🚀 Quick Start Guide</h3>\
<ul style=\"color:#4b5563;margin:15px 0;padding-left:20px;\">{steps}</ul></div>\
<div style=\"text-align:center;margin:35px 0;\"><a href=\"{APP_DASHBOARD_URL}\" style=\"{BUTTON_STYLE}\">Go to Dashboard →</a></div>\
<div style=\"border-top:1px solid #e5e7eb;padding-top:25px;margin-top:35px;\">\
<h3 style=\"color:#1a365d;font-size:18px;\">Need Help?</h3>\
<p style=\"color:#4b5563;\">Contact support at <a href=\"mailto:support@farritech.com\" style=\"color:#2563eb;text-decoration:none;\">support@farritech.com</a></p></div>"
        )),
        footer = footer("FarriTech - Professional Business Management for Farriers"),
    );

    Rendered {
        subject: "Welcome to FarriTech! 🐴".to_string(),
        html: document(&body),
    }
}

/// Notification to the farrier about a new booking request.
pub fn farrier_booking(booking: &AppointmentEmail) -> Rendered {
    let biz = escape(booking.business_name());
    let date = escape(booking.requested_date());
    let address = full_address(&[
        booking.address.as_deref(),
        booking.city.as_deref(),
        booking.state.as_deref(),
        booking.zip.as_deref(),
    ]);
    let dash = |v: Option<&str>| escape(v.unwrap_or("—"));

    let customer_rows = [
        row("Name", &format!("<strong>{}</strong>", dash(booking.customer_name.as_deref()))),
        optional_row("Farm / Business", booking.farm_name.as_deref()),
        row("Phone", &dash(booking.customer_phone.as_deref())),
        row("Email", &dash(booking.customer_email.as_deref())),
        row("Address", &escape(&address)),
    ]
    .concat();

    let appointment_rows = [
        row("Requested Date", &format!("<strong>{date}</strong>")),
        row("Requested Time", &format!("<strong>{}</strong>", escape(&booking.display_time()))),
        row("Services", &escape(&services_list(&booking.services))),
        row("Horses", &dash(booking.number_of_horses.as_deref())),
        optional_row("Notes", booking.comments.as_deref()),
    ]
    .concat();

    let body = format!(
        "{header}{content}{footer}",
        header = header("🐴 FarriTech", "New Appointment Request", "#1a365d 0%,#2563eb 100%", "#06b6d4"),
        content = content(&format!(
            "<h2 style=\"color:#1a365d;margin-top:0;\">📋 New Booking Request</h2>\
<p style=\"color:#4b5563;font-size:15px;\">You have a new appointment request on <strong>{biz}</strong>. Log in to confirm or manage it.</p>\
{customer}{appointment}\
<div style=\"text-align:center;margin:30px 0;\"><a href=\"{DASHBOARD_URL}\" style=\"{BUTTON_STYLE}\">View &amp; Confirm Appointment →</a></div>",
            customer = panel("👤 Customer Details", &customer_rows, "#f0f9ff", "#2563eb"),
            appointment = panel("📅 Appointment Details", &appointment_rows, "#f0fdf4", "#10b981"),
        )),
        footer = footer("© 2026 FarriTech · farrier-pro.vercel.app"),
    );

    Rendered {
        subject: format!(
            "🐴 New Booking Request from {} — {}",
            booking.customer_name.as_deref().unwrap_or("a customer"),
            booking.requested_date()
        ),
        html: document(&body),
    }
}

/// Confirmation to the customer that their request was received.
pub fn customer_booking(booking: &AppointmentEmail) -> Rendered {
    let biz = escape(booking.business_name());

    let rows = [
        row("Date", &format!("<strong>{}</strong>", escape(booking.requested_date()))),
        row("Time", &format!("<strong>{}</strong>", escape(&booking.display_time()))),
        row("Services", &escape(&services_list(&booking.services))),
        row("Horses", &escape(booking.number_of_horses.as_deref().unwrap_or("—"))),
        optional_row("Notes", booking.comments.as_deref()),
    ]
    .concat();

    let body = format!(
        "{header}{content}{footer}",
        header = header(&format!("🐴 {biz}"), "Booking Confirmation", "#1a365d 0%,#2563eb 100%", "#06b6d4"),
        content = content(&format!(
            "<h2 style=\"color:#1a365d;margin-top:0;\">Thanks, {first}! 👋</h2>\
<p style=\"color:#4b5563;font-size:15px;\">Your appointment request with <strong>{biz}</strong> has been received. We'll be in touch to confirm your booking.</p>\
{panel}\
<div style=\"background:#fffbeb;border-left:4px solid #f59e0b;padding:16px 20px;margin:20px 0;border-radius:4px;\">\
<p style=\"margin:0;color:#92400e;font-size:14px;\">⏳ <strong>Status: Pending Confirmation</strong>. Your farrier will review and confirm your appointment shortly.</p></div>\
<p style=\"color:#4b5563;font-size:14px;\">Questions? Reply to this email or contact us directly.</p>",
            first = escape(booking.first_name()),
            panel = panel("📅 Your Requested Appointment", &rows, "#f0f9ff", "#2563eb"),
        )),
        footer = footer("© 2026 FarriTech · Powered by FarriTech Advanced Farrier Solutions"),
    );

    Rendered {
        subject: format!("✅ Booking Request Received — {}", booking.business_name()),
        html: document(&body),
    }
}

/// Notice to the customer that the farrier changed their appointment.
pub fn appointment_update(notice: &AppointmentEmail) -> Rendered {
    let biz = escape(notice.business_name());
    let location = full_address(&[
        notice.address.as_deref(),
        notice.city.as_deref(),
        notice.state.as_deref(),
        notice.zip.as_deref(),
    ]);

    let rows = [
        row(
            "Date",
            &format!("<strong>{}</strong>", escape(notice.requested_date.as_deref().unwrap_or("—"))),
        ),
        row("Time", &format!("<strong>{}</strong>", escape(&notice.display_time()))),
        row("Services", &escape(&services_list(&notice.services))),
        optional_row("Horses", notice.number_of_horses.as_deref()),
        row("Location", &escape(&location)),
        optional_row("Farm / Business", notice.farm_name.as_deref()),
        optional_row("Notes", notice.comments.as_deref()),
    ]
    .concat();

    let reschedule = notice
        .booking_url
        .as_deref()
        .map(|url| {
            format!(
                "<div style=\"margin-top:14px;\"><a href=\"{}\" style=\"{BUTTON_STYLE}\">📅 Book / Reschedule Online</a></div>",
                escape(url)
            )
        })
        .unwrap_or_default();

    let body = format!(
        "{header}{content}{footer}",
        header = header(&format!("🐴 {biz}"), "📝 Appointment Update", "#1a365d 0%,#2563eb 100%", "#06b6d4"),
        content = content(&format!(
            "<h2 style=\"color:#1a365d;margin-top:0;\">Hi {first},</h2>\
<p style=\"color:#4b5563;font-size:15px;\">Your appointment with <strong>{biz}</strong> has been updated. Please review the new details below.</p>\
{panel}\
<p style=\"color:#4b5563;font-size:14px;\">If these changes don't look right or you need to make adjustments, please get in touch.</p>\
{contact}",
            first = escape(notice.first_name()),
            panel = panel("📅 Updated Appointment Details", &rows, "#f0f9ff", "#2563eb"),
            contact = contact_block("📞 Questions or need to reschedule?", notice, &reschedule),
        )),
        footer = footer("© 2026 FarriTech · Powered by FarriTech"),
    );

    Rendered {
        subject: format!(
            "📝 Appointment Update — {} on {}",
            notice.business_name(),
            notice.requested_date()
        ),
        html: document(&body),
    }
}

/// Notice to the customer that the farrier cancelled their appointment.
pub fn appointment_cancellation(notice: &AppointmentEmail) -> Rendered {
    let biz = escape(notice.business_name());

    let rows = [
        row(
            "Date",
            &format!("<strong>{}</strong>", escape(notice.requested_date.as_deref().unwrap_or("—"))),
        ),
        row("Time", &format!("<strong>{}</strong>", escape(&notice.display_time()))),
        row("Services", &escape(&services_list(&notice.services))),
        optional_row("Farm / Business", notice.farm_name.as_deref()),
    ]
    .concat();

    let reply_hint = "<p style=\"margin:8px 0 0;color:#6b7280;font-size:13px;\">Or simply reply to this email.</p>";

    let body = format!(
        "{header}{content}{footer}",
        header = header(
            &format!("🐴 {biz}"),
            "Appointment Cancellation Notice",
            "#7f1d1d 0%,#ef4444 100%",
            "#fecaca"
        ),
        content = content(&format!(
            "<h2 style=\"color:#1a365d;margin-top:0;\">Hi {first},</h2>\
<p style=\"color:#4b5563;font-size:15px;\">We're sorry to let you know that your appointment with <strong>{biz}</strong> has been <strong>cancelled</strong>.</p>\
{panel}\
<p style=\"color:#4b5563;font-size:15px;\">We apologize for any inconvenience. Please contact us to reschedule at your earliest convenience.</p>\
{contact}",
            first = escape(notice.first_name()),
            panel = panel("✕ Cancelled Appointment", &rows, "#fef2f2", "#ef4444"),
            contact = contact_block("📞 Contact us to reschedule", notice, reply_hint),
        )),
        footer = footer("© 2026 FarriTech · Powered by FarriTech"),
    );

    Rendered {
        subject: format!(
            "Appointment Cancellation — {} on {}",
            notice.business_name(),
            notice.requested_date()
        ),
        html: document(&body),
    }
}
