//! Reporting view model
//!
//! Aggregates occupancy and revenue over date ranges for the report
//! screens and the CSV exporter.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use matinee_core::BookingStatus;
use uuid::Uuid;

use crate::state::AppState;

/// One slot's occupancy in a date range
#[derive(Debug, Clone)]
pub struct OccupancyRow {
    pub show_slot_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub capacity: u32,
    pub booked_count: u32,
    pub available: u32,
    /// Whole percent, 0-100 (can exceed 100 for approved overbookings)
    pub occupancy_percent: u32,
}

/// Daily revenue aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueRow {
    pub date: NaiveDate,
    pub bookings: u32,
    pub guests: u32,
    pub gross_cents: i64,
    pub discount_cents: i64,
}

#[derive(Debug, Clone, Default)]
pub struct RevenueReport {
    pub rows: Vec<RevenueRow>,
    pub total_bookings: u32,
    pub total_guests: u32,
    pub total_gross_cents: i64,
    pub total_discount_cents: i64,
}

/// Seat occupancy per slot in an inclusive date range
pub fn occupancy(state: &AppState, from: NaiveDate, to: NaiveDate) -> Vec<OccupancyRow> {
    let db = state.db.lock().unwrap();
    let slots = db.shows().list_between(from, to).unwrap_or_default();
    drop(db);

    slots
        .into_iter()
        .map(|slot| OccupancyRow {
            show_slot_id: slot.id,
            date: slot.date,
            time: slot.time,
            capacity: slot.capacity,
            booked_count: slot.booked_count,
            available: slot.available(),
            occupancy_percent: if slot.capacity == 0 {
                0
            } else {
                slot.booked_count * 100 / slot.capacity
            },
        })
        .collect()
}

/// Revenue from confirmed bookings created in an inclusive date range,
/// grouped per day. Cancelled, rejected and still-pending bookings do
/// not count.
pub fn revenue(state: &AppState, from: NaiveDate, to: NaiveDate) -> RevenueReport {
    let start = Utc.from_utc_datetime(&from.and_hms_opt(0, 0, 0).unwrap());
    let end = Utc.from_utc_datetime(&(to + chrono::Duration::days(1)).and_hms_opt(0, 0, 0).unwrap());

    let db = state.db.lock().unwrap();
    let bookings = db.bookings().list_created_between(start, end).unwrap_or_default();
    drop(db);

    let mut report = RevenueReport::default();
    for booking in bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed)
    {
        let day = booking.created_at.date_naive();
        let row = match report.rows.iter_mut().find(|r| r.date == day) {
            Some(row) => row,
            None => {
                report.rows.push(RevenueRow {
                    date: day,
                    bookings: 0,
                    guests: 0,
                    gross_cents: 0,
                    discount_cents: 0,
                });
                report.rows.last_mut().unwrap()
            }
        };
        row.bookings += 1;
        row.guests += booking.guests;
        row.gross_cents += booking.total_price_cents;
        row.discount_cents += booking.discount_cents;

        report.total_bookings += 1;
        report.total_guests += booking.guests;
        report.total_gross_cents += booking.total_price_cents;
        report.total_discount_cents += booking.discount_cents;
    }
    report.rows.sort_by_key(|r| r.date);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use matinee_core::{PackageOption, ShowSlot, SubmitOutcome, SubmitRequest};

    fn seeded_state() -> (AppState, ShowSlot, PackageOption) {
        let state = AppState::in_memory().unwrap();
        let (slot, package) = {
            let db = state.db.lock().unwrap();
            let mut slot = ShowSlot::new(
                NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
                NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
                10,
            );
            slot.booked_count = 0;
            db.shows().create(&slot).unwrap();
            let package = PackageOption::new("Dinner & Show".into()).with_flat_price(8900);
            db.packages().create(&package).unwrap();
            (slot, package)
        };
        (state, slot, package)
    }

    fn submit(state: &AppState, slot: &ShowSlot, package: &PackageOption, guests: u32) {
        let mut db = state.db.lock().unwrap();
        let req = SubmitRequest {
            show_slot_id: slot.id,
            package_id: package.id,
            guests,
            customer_name: "Ada Guest".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: None,
            billing_address: None,
            add_on_ids: Vec::new(),
            merchandise: Vec::new(),
            promo_code: None,
            idempotency_key: None,
        };
        match matinee_core::submit_reservation(&mut db, &req).unwrap() {
            SubmitOutcome::Created(_) => {}
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_occupancy_percentages() {
        let (state, slot, package) = seeded_state();
        submit(&state, &slot, &package, 4);

        let rows = occupancy(&state, slot.date, slot.date);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].booked_count, 4);
        assert_eq!(rows[0].available, 6);
        assert_eq!(rows[0].occupancy_percent, 40);
    }

    #[test]
    fn test_revenue_counts_only_confirmed() {
        let (state, slot, package) = seeded_state();
        submit(&state, &slot, &package, 4);
        // Fills the slot past capacity -> pending, excluded from revenue
        submit(&state, &slot, &package, 8);

        let today = Utc::now().date_naive();
        let report = revenue(&state, today, today);
        assert_eq!(report.total_bookings, 1);
        assert_eq!(report.total_guests, 4);
        assert_eq!(report.total_gross_cents, 4 * 8900);
        assert_eq!(report.rows.len(), 1);
    }

    #[test]
    fn test_empty_range_is_empty_report() {
        let (state, _slot, _package) = seeded_state();
        let day = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let report = revenue(&state, day, day);
        assert_eq!(report.total_bookings, 0);
        assert!(report.rows.is_empty());
    }
}
