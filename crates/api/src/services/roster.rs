//! Admin roster helpers: spreadsheet export and arrival toggle guard.

use domain::models::roster::{ExportRow, EXPORT_HEADERS, EXPORT_SHEET_NAME};
use domain::models::Registration;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Content type of the roster export.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Writes the roster into a single-sheet workbook.
///
/// The first row holds the headers; each registration follows in roster
/// order.
pub fn export_xlsx(roster: &[Registration]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(EXPORT_SHEET_NAME)?;

        for (col, header) in EXPORT_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (i, registration) in roster.iter().enumerate() {
            let row = ExportRow::from(registration);
            for (col, cell) in row.cells().iter().enumerate() {
                sheet.write_string(i as u32 + 1, col as u16, *cell)?;
            }
        }
    }

    workbook.save_to_buffer()
}

/// Tracks rows with an arrival update in flight.
///
/// A second toggle for the same row is refused until the first finishes.
#[derive(Debug, Clone, Default)]
pub struct ArrivalGuard {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl ArrivalGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `id`; `None` when an update for it is already running.
    pub fn try_acquire(&self, id: Uuid) -> Option<ArrivalPermit> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(id) {
            return None;
        }
        Some(ArrivalPermit {
            id,
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn is_pending(&self, id: Uuid) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

/// Releases the row when dropped.
#[derive(Debug)]
pub struct ArrivalPermit {
    id: Uuid,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for ArrivalPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
