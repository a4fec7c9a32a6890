//! Admin roster view: search filtering, column visibility and export rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::registration::Registration;

/// Sheet name used for roster exports.
pub const EXPORT_SHEET_NAME: &str = "Registrations";

/// Header row of the roster export, in column order.
pub const EXPORT_HEADERS: [&str; 8] = [
    "ID",
    "Name",
    "Email",
    "Whatsapp",
    "Faculty",
    "Year",
    "Registered At",
    "Arrived",
];

/// Columns an operator can show or hide on the roster table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterColumn {
    Name,
    Email,
    Whatsapp,
    Faculty,
    Year,
    RegisteredAt,
    Arrived,
}

impl RosterColumn {
    pub const ALL: [RosterColumn; 7] = [
        RosterColumn::Name,
        RosterColumn::Email,
        RosterColumn::Whatsapp,
        RosterColumn::Faculty,
        RosterColumn::Year,
        RosterColumn::RegisteredAt,
        RosterColumn::Arrived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RosterColumn::Name => "name",
            RosterColumn::Email => "email",
            RosterColumn::Whatsapp => "whatsapp",
            RosterColumn::Faculty => "faculty",
            RosterColumn::Year => "year",
            RosterColumn::RegisteredAt => "registered_at",
            RosterColumn::Arrived => "arrived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Columns shown when the operator has not chosen any.
    pub fn default_visible() -> Vec<RosterColumn> {
        Self::ALL
            .into_iter()
            .filter(|c| *c != RosterColumn::RegisteredAt)
            .collect()
    }

    fn value(&self, registration: &Registration) -> Value {
        match self {
            RosterColumn::Name => Value::from(registration.name.clone()),
            RosterColumn::Email => Value::from(registration.email.clone()),
            RosterColumn::Whatsapp => Value::from(registration.whatsapp.clone()),
            RosterColumn::Faculty => Value::from(registration.faculty.clone()),
            RosterColumn::Year => Value::from(registration.year.clone()),
            RosterColumn::RegisteredAt => Value::from(format_timestamp(&registration.created_at)),
            RosterColumn::Arrived => Value::from(registration.is_arrived),
        }
    }
}

/// Query parameters for the roster endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterQuery {
    /// Case-insensitive email substring.
    #[serde(default)]
    pub search: Option<String>,
    /// Comma-separated column names.
    #[serde(default)]
    pub columns: Option<String>,
}

impl RosterQuery {
    /// Visible columns; unknown names are ignored and an empty selection
    /// falls back to the defaults.
    pub fn visible_columns(&self) -> Vec<RosterColumn> {
        let Some(raw) = self.columns.as_deref() else {
            return RosterColumn::default_visible();
        };

        let mut columns = Vec::new();
        for column in raw.split(',').filter_map(|c| RosterColumn::from_str(c.trim())) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }

        if columns.is_empty() {
            RosterColumn::default_visible()
        } else {
            columns
        }
    }

    pub fn search_term(&self) -> &str {
        self.search.as_deref().unwrap_or("").trim()
    }
}

/// Keeps registrations whose email contains `term`, ignoring case.
///
/// An empty term keeps everything.
pub fn filter_by_email<'a>(roster: &'a [Registration], term: &str) -> Vec<&'a Registration> {
    let needle = term.to_lowercase();
    roster
        .iter()
        .filter(|r| needle.is_empty() || r.email.to_lowercase().contains(&needle))
        .collect()
}

/// Projects a registration onto the visible columns. `id` is always present.
pub fn project_row(registration: &Registration, columns: &[RosterColumn]) -> Value {
    let mut row = Map::new();
    row.insert("id".to_string(), Value::from(registration.id.to_string()));
    for column in columns {
        row.insert(column.as_str().to_string(), column.value(registration));
    }
    Value::Object(row)
}

/// Roster listing returned to the admin view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RosterView {
    pub total: usize,
    pub shown: usize,
    pub columns: Vec<RosterColumn>,
    pub data: Vec<Value>,
}

impl RosterView {
    pub fn build(roster: &[Registration], query: &RosterQuery) -> Self {
        let columns = query.visible_columns();
        let data: Vec<Value> = filter_by_email(roster, query.search_term())
            .into_iter()
            .map(|r| project_row(r, &columns))
            .collect();

        Self {
            total: roster.len(),
            shown: data.len(),
            columns,
            data,
        }
    }
}

/// One spreadsheet row of the roster export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub faculty: String,
    pub year: String,
    pub registered_at: String,
    pub arrived: &'static str,
}

impl ExportRow {
    pub fn cells(&self) -> [&str; 8] {
        [
            self.id.as_str(),
            self.name.as_str(),
            self.email.as_str(),
            self.whatsapp.as_str(),
            self.faculty.as_str(),
            self.year.as_str(),
            self.registered_at.as_str(),
            self.arrived,
        ]
    }
}

impl From<&Registration> for ExportRow {
    fn from(r: &Registration) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.name.clone(),
            email: r.email.clone(),
            whatsapp: r.whatsapp.clone(),
            faculty: r.faculty.clone(),
            year: r.year.clone(),
            registered_at: format_timestamp(&r.created_at),
            arrived: if r.is_arrived { "Yes" } else { "No" },
        }
    }
}

/// Timestamp format used in the roster table and export.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Export file name for the given day, e.g. `registrations_2025-03-14.xlsx`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("registrations_{}.xlsx", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn reg(email: &str, arrived: bool) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Alice".to_string(),
            whatsapp: "+1234567890".to_string(),
            faculty: "Eng".to_string(),
            year: "2".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
            is_arrived: arrived,
            is_email_sent: false,
            email_sent_at: None,
        }
    }

    #[test]
    fn test_filter_by_email_is_case_insensitive() {
        let roster = vec![reg("Alice@Uni.edu", false), reg("bob@x.com", false)];
        let found = filter_by_email(&roster, "alice");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "Alice@Uni.edu");
        assert_eq!(filter_by_email(&roster, "UNI.EDU").len(), 1);
    }

    #[test]
    fn test_filter_by_email_empty_term_keeps_all() {
        let roster = vec![reg("a@x.com", false), reg("b@x.com", true)];
        assert_eq!(filter_by_email(&roster, "").len(), 2);
    }

    #[test]
    fn test_default_columns_hide_registered_at() {
        let columns = RosterColumn::default_visible();
        assert_eq!(columns.len(), 6);
        assert!(!columns.contains(&RosterColumn::RegisteredAt));
    }

    #[test]
    fn test_visible_columns_parsing() {
        let query = RosterQuery {
            search: None,
            columns: Some("email, arrived,email,bogus".to_string()),
        };
        assert_eq!(
            query.visible_columns(),
            vec![RosterColumn::Email, RosterColumn::Arrived]
        );

        let only_unknown = RosterQuery {
            search: None,
            columns: Some("bogus".to_string()),
        };
        assert_eq!(only_unknown.visible_columns(), RosterColumn::default_visible());
    }

    #[test]
    fn test_project_row_only_includes_visible_columns() {
        let r = reg("a@x.com", true);
        let row = project_row(&r, &[RosterColumn::Email, RosterColumn::Arrived]);
        let obj = row.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["email"], "a@x.com");
        assert_eq!(obj["arrived"], true);
        assert_eq!(obj["id"], r.id.to_string());
    }

    #[test]
    fn test_roster_view_counts() {
        let roster = vec![reg("a@x.com", false), reg("b@y.com", false), reg("c@x.com", true)];
        let query = RosterQuery {
            search: Some("x.com".to_string()),
            columns: None,
        };
        let view = RosterView::build(&roster, &query);
        assert_eq!(view.total, 3);
        assert_eq!(view.shown, 2);
        assert_eq!(view.data.len(), 2);
    }

    #[test]
    fn test_export_row() {
        let row = ExportRow::from(&reg("a@x.com", true));
        assert_eq!(row.arrived, "Yes");
        assert_eq!(row.registered_at, "2025-03-14 09:30:00 UTC");
        assert_eq!(row.cells().len(), EXPORT_HEADERS.len());
        assert_eq!(ExportRow::from(&reg("b@x.com", false)).arrived, "No");
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(export_file_name(date), "registrations_2025-03-14.xlsx");
    }
}
