use std::borrow::Cow;

use chrono::NaiveDate;

use crate::models::activity::{ActivityEntry, NewActivity};
use crate::store::Store;

/// Action names written to the activity log.
pub mod actions {
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const REGISTER: &str = "register";
    pub const MODERATE: &str = "moderate";
    pub const BULK_MODERATE: &str = "bulk_moderate";
    pub const GRANT_ADMIN: &str = "grant_admin";
    pub const REVOKE_ADMIN: &str = "revoke_admin";
}

pub const CSV_HEADER: [&str; 8] = [
    "ID",
    "User",
    "Action",
    "Entity Type",
    "Entity ID",
    "Details",
    "IP Address",
    "Date",
];

/// Append an entry. A failed write is logged and never surfaces to the caller.
pub fn record(store: &dyn Store, entry: NewActivity<'_>) {
    if let Err(e) = store.activity_insert(&entry) {
        log::warn!(
            "activity log write failed (action={}, entity={:?}/{:?}): {}",
            entry.action,
            entry.entity_type,
            entry.entity_id,
            e
        );
    }
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("activity_logs_{}.csv", date.format("%Y-%m-%d"))
}

/// Render entries as CSV with a header row. Lines end in CRLF.
pub fn to_csv(entries: &[ActivityEntry]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|h| Cow::Borrowed(*h)));
    for e in entries {
        push_row(
            &mut out,
            [
                Cow::Owned(e.id.to_string()),
                Cow::Borrowed(e.username.as_deref().unwrap_or("Unknown")),
                Cow::Borrowed(e.action.as_str()),
                Cow::Borrowed(e.entity_type.as_deref().unwrap_or("")),
                Cow::Owned(e.entity_id.map(|id| id.to_string()).unwrap_or_default()),
                Cow::Borrowed(e.details.as_deref().unwrap_or("")),
                Cow::Borrowed(e.ip_address.as_deref().unwrap_or("")),
                Cow::Owned(e.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            ],
        );
    }
    out
}

fn push_row<'a, I>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = Cow<'a, str>>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(&field));
    }
    out.push_str("\r\n");
}

/// Quote a field when it holds a delimiter, quote or line break.
fn csv_field(s: &str) -> Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn entry(username: Option<&str>, details: Option<&str>) -> ActivityEntry {
        ActivityEntry {
            id: 9,
            user_id: None,
            username: username.map(str::to_string),
            action: "delete".into(),
            entity_type: Some("post".into()),
            entity_id: Some(4),
            details: details.map(str::to_string),
            ip_address: Some("10.0.0.1".into()),
            created_at: NaiveDateTime::parse_from_str("2024-05-01 12:30:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    #[test]
    fn header_row_comes_first() {
        let csv = to_csv(&[]);
        assert_eq!(
            csv,
            "ID,User,Action,Entity Type,Entity ID,Details,IP Address,Date\r\n"
        );
    }

    #[test]
    fn missing_user_is_unknown() {
        let csv = to_csv(&[entry(None, Some("Removed post"))]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "9,Unknown,delete,post,4,Removed post,10.0.0.1,2024-05-01 12:30:00");
    }

    #[test]
    fn fields_with_specials_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn filename_uses_iso_date() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
        assert_eq!(export_filename(d), "activity_logs_2024-02-09.csv");
    }
}
