// crates/shared/src/toolbelts/bookings.rs
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::register_toolbelt;

static DATE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid date regex"));

static BOOKINGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("15/03/2025", "2 bookings: Table for 4 at 19:00, Table for 2 at 20:30"),
        ("16/03/2025", "1 booking: Table for 6 at 20:00"),
    ])
});

/// Restaurant bookings.
///
/// The parameter description is intentionally vague: only `DD/MM/YYYY` is
/// accepted, so models that guess another format get an error back and have
/// to retry.
#[derive(Default)]
pub struct Bookings;

register_toolbelt! {
    Bookings {
        description: "Restaurant bookings",
        tools: {
            "get_bookings" => get_bookings {
                description: "Get restaurant bookings for a date.",
                params: [
                    "date": "string" => "A date"
                ]
            }
        }
    }
}

impl Bookings {
    fn get_bookings(&self, args: &Map<String, Value>) -> Result<String> {
        let date = args.get("date").and_then(Value::as_str).unwrap_or("");
        if !DATE_FORMAT.is_match(date) {
            return Ok(format!(
                "ERROR: invalid date format '{}'. Expected DD/MM/YYYY.",
                date
            ));
        }

        Ok(BOOKINGS
            .get(date)
            .map(|b| b.to_string())
            .unwrap_or_else(|| format!("No bookings found for {}", date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRegistry;

    #[test]
    fn only_day_month_year_is_accepted() {
        let registry = ToolRegistry::builder().toolbelt(Bookings).build().unwrap();

        let iso = registry.invoke("get_bookings", r#"{"date":"2025-03-15"}"#);
        assert_eq!(
            iso.text(),
            "ERROR: invalid date format '2025-03-15'. Expected DD/MM/YYYY."
        );

        let ok = registry.invoke("get_bookings", r#"{"date":"15/03/2025"}"#);
        assert_eq!(ok.text(), "2 bookings: Table for 4 at 19:00, Table for 2 at 20:30");

        let none = registry.invoke("get_bookings", r#"{"date":"01/01/2026"}"#);
        assert_eq!(none.text(), "No bookings found for 01/01/2026");
    }
}
