//! Report exports
//!
//! Writes occupancy and revenue reports as CSV files into the export
//! directory. Rendering to PDF or print is outside this system.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use matinee_core::Result;
use tracing::{info, instrument};

use crate::state::AppState;
use crate::viewmodel::reports;

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn cents(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

/// Write the occupancy report for a date range; returns the file path
#[instrument(skip(state, dir))]
pub fn export_occupancy(
    state: &AppState,
    dir: &Path,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("occupancy-{}-{}.csv", from, to));

    let mut out = String::from("date,time,capacity,booked,available,occupancy_percent\n");
    for row in reports::occupancy(state, from, to) {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            row.date,
            row.time.format("%H:%M"),
            row.capacity,
            row.booked_count,
            row.available,
            row.occupancy_percent
        ));
    }

    fs::write(&path, out)?;
    info!(path = %path.display(), "Occupancy report exported");
    Ok(path)
}

/// Write the revenue report for a date range; returns the file path
#[instrument(skip(state, dir))]
pub fn export_revenue(
    state: &AppState,
    dir: &Path,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("revenue-{}-{}.csv", from, to));

    let report = reports::revenue(state, from, to);
    let mut out = String::from("date,bookings,guests,gross,discounts\n");
    for row in &report.rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            row.date,
            row.bookings,
            row.guests,
            cents(row.gross_cents),
            cents(row.discount_cents)
        ));
    }
    out.push_str(&format!(
        "{},{},{},{},{}\n",
        csv_escape("total"),
        report.total_bookings,
        report.total_guests,
        cents(report.total_gross_cents),
        cents(report.total_discount_cents)
    ));

    fs::write(&path, out)?;
    info!(path = %path.display(), "Revenue report exported");
    Ok(path)
}
