//! SQLite storage layer for Matinee

mod audit;
mod bookings;
mod customers;
mod invoices;
mod merchandise;
mod migrations;
mod outbox;
mod packages;
mod parse;
mod promo_codes;
mod settings;
mod shows;
mod staff;
mod traits;
mod waitlist;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Booking, BookingStatus, Invoice, InvoiceStatus, PromoCode, ShowSlot, WaitingListEntry,
    WaitlistStatus,
};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::instrument;

pub use audit::AuditStore;
pub use bookings::BookingStore;
pub use customers::CustomerStore;
pub use invoices::InvoiceStore;
pub use merchandise::MerchandiseStore;
pub use outbox::OutboxStore;
pub use packages::PackageStore;
pub use promo_codes::PromoCodeStore;
pub use settings::SettingsStore;
pub use shows::ShowStore;
pub use staff::StaffStore;
pub use traits::{
    BookingRepository, InvoiceRepository, PromoCodeRepository, ShowRepository, WaitlistRepository,
};
pub use waitlist::WaitlistStore;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Begin a transaction. Stores work over it directly because
    /// `Transaction` derefs to `Connection`; multi-document operations
    /// (booking + slot counter + audit) must go through here so they
    /// commit or roll back together.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Get show slot store
    pub fn shows(&self) -> ShowStore<'_> {
        ShowStore::new(&self.conn)
    }

    /// Get package store
    pub fn packages(&self) -> PackageStore<'_> {
        PackageStore::new(&self.conn)
    }

    /// Get booking store
    pub fn bookings(&self) -> BookingStore<'_> {
        BookingStore::new(&self.conn)
    }

    /// Get customer store
    pub fn customers(&self) -> CustomerStore<'_> {
        CustomerStore::new(&self.conn)
    }

    /// Get waiting list store
    pub fn waitlist(&self) -> WaitlistStore<'_> {
        WaitlistStore::new(&self.conn)
    }

    /// Get promo code store
    pub fn promo_codes(&self) -> PromoCodeStore<'_> {
        PromoCodeStore::new(&self.conn)
    }

    /// Get merchandise store
    pub fn merchandise(&self) -> MerchandiseStore<'_> {
        MerchandiseStore::new(&self.conn)
    }

    /// Get invoice store
    pub fn invoices(&self) -> InvoiceStore<'_> {
        InvoiceStore::new(&self.conn)
    }

    /// Get staff store
    pub fn staff(&self) -> StaffStore<'_> {
        StaffStore::new(&self.conn)
    }

    /// Get settings store
    pub fn settings(&self) -> SettingsStore<'_> {
        SettingsStore::new(&self.conn)
    }

    /// Get audit log store
    pub fn audit(&self) -> AuditStore<'_> {
        AuditStore::new(&self.conn)
    }

    /// Get notification outbox store
    pub fn outbox(&self) -> OutboxStore<'_> {
        OutboxStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl ShowRepository for Database {
    fn create_show(&self, slot: &ShowSlot) -> Result<()> {
        self.shows().create(slot)
    }

    fn find_show_by_id(&self, id: Uuid) -> Result<Option<ShowSlot>> {
        self.shows().find_by_id(id)
    }

    fn update_show(&self, slot: &ShowSlot) -> Result<()> {
        self.shows().update(slot)
    }

    fn delete_show(&self, slot_id: Uuid) -> Result<()> {
        self.shows().delete(slot_id)
    }

    fn list_shows_from(&self, from: NaiveDate) -> Result<Vec<ShowSlot>> {
        self.shows().list_from(from)
    }
}

impl BookingRepository for Database {
    fn create_booking(&self, booking: &Booking) -> Result<()> {
        self.bookings().create(booking)
    }

    fn find_booking_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        self.bookings().find_by_id(id)
    }

    fn find_booking_by_code(&self, reservation_code: &str) -> Result<Option<Booking>> {
        self.bookings().find_by_code(reservation_code)
    }

    fn update_booking(&self, booking: &Booking) -> Result<()> {
        self.bookings().update(booking)
    }

    fn list_bookings_for_slot(&self, show_slot_id: Uuid) -> Result<Vec<Booking>> {
        self.bookings().list_for_slot(show_slot_id)
    }

    fn list_bookings_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>> {
        self.bookings().list_by_status(status)
    }
}

impl WaitlistRepository for Database {
    fn create_waitlist_entry(&self, entry: &WaitingListEntry) -> Result<()> {
        self.waitlist().create(entry)
    }

    fn find_waitlist_entry(&self, id: Uuid) -> Result<Option<WaitingListEntry>> {
        self.waitlist().find_by_id(id)
    }

    fn set_waitlist_status(&self, id: Uuid, status: WaitlistStatus) -> Result<()> {
        self.waitlist().set_status(id, status)
    }

    fn list_open_waitlist_for_slot(&self, show_slot_id: Uuid) -> Result<Vec<WaitingListEntry>> {
        self.waitlist().list_open_for_slot(show_slot_id)
    }
}

impl PromoCodeRepository for Database {
    fn create_promo_code(&self, promo: &PromoCode) -> Result<()> {
        self.promo_codes().create(promo)
    }

    fn find_promo_by_code(&self, code: &str) -> Result<Option<PromoCode>> {
        self.promo_codes().find_by_code(code)
    }

    fn update_promo_code(&self, promo: &PromoCode) -> Result<()> {
        self.promo_codes().update(promo)
    }

    fn increment_promo_usage(&self, id: Uuid) -> Result<()> {
        self.promo_codes().increment_times_used(id)
    }
}

impl InvoiceRepository for Database {
    fn create_invoice(&self, invoice: &Invoice) -> Result<()> {
        self.invoices().create(invoice)
    }

    fn find_invoice_by_id(&self, id: Uuid) -> Result<Option<Invoice>> {
        self.invoices().find_by_id(id)
    }

    fn find_invoices_for_booking(&self, booking_id: Uuid) -> Result<Vec<Invoice>> {
        self.invoices().find_by_booking(booking_id)
    }

    fn set_invoice_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
        sent_at: Option<DateTime<Utc>>,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.invoices().set_status(id, status, sent_at, paid_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PackageOption, PromoKind};
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::tempdir;

    fn sample_slot() -> ShowSlot {
        ShowSlot::new(
            NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            40,
        )
    }

    #[test]
    fn test_open_in_memory_runs_migrations() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.schema_version() >= 3);
    }

    #[test]
    fn test_on_disk_database_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matinee.db");

        let slot = sample_slot();
        {
            let db = Database::open(&path).unwrap();
            db.shows().create(&slot).unwrap();
            db.shows().add_booked(slot.id, 5).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let loaded = db.shows().find_by_id(slot.id).unwrap().unwrap();
        assert_eq!(loaded.booked_count, 5);
        assert!(db.schema_version() >= 3);
    }

    #[test]
    fn test_show_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let slot = sample_slot().with_price_tier("premiere".into());
        db.shows().create(&slot).unwrap();

        let loaded = db.shows().find_by_id(slot.id).unwrap().unwrap();
        assert_eq!(loaded.date, slot.date);
        assert_eq!(loaded.time, slot.time);
        assert_eq!(loaded.capacity, 40);
        assert_eq!(loaded.price_tier.as_deref(), Some("premiere"));
    }

    #[test]
    fn test_booked_counter_floors_at_zero() {
        let db = Database::open_in_memory().unwrap();
        let slot = sample_slot();
        db.shows().create(&slot).unwrap();

        db.shows().add_booked(slot.id, 3).unwrap();
        db.shows().release_booked(slot.id, 5).unwrap();

        let loaded = db.shows().find_by_id(slot.id).unwrap().unwrap();
        assert_eq!(loaded.booked_count, 0);
    }

    #[test]
    fn test_booking_roundtrip_preserves_json_fields() {
        let db = Database::open_in_memory().unwrap();
        let slot = sample_slot();
        db.shows().create(&slot).unwrap();

        let mut booking = Booking::new(
            slot.id,
            Uuid::new_v4(),
            "Dinner & Show".into(),
            2,
            "Ada Guest".into(),
            "ada@example.com".into(),
        );
        booking.merchandise.push(crate::models::MerchandiseLine {
            merchandise_id: Uuid::new_v4(),
            name: "Poster".into(),
            unit_price_cents: 1200,
            quantity: 2,
        });
        booking.idempotency_key = Some("form-abc".into());
        db.bookings().create(&booking).unwrap();

        let loaded = db.bookings().find_by_id(booking.id).unwrap().unwrap();
        assert_eq!(loaded.merchandise.len(), 1);
        assert_eq!(loaded.merchandise[0].quantity, 2);
        assert_eq!(loaded.idempotency_key.as_deref(), Some("form-abc"));

        let by_key = db.bookings().find_by_idempotency_key("form-abc").unwrap();
        assert!(by_key.is_some());
    }

    #[test]
    fn test_duplicate_idempotency_key_is_rejected_by_index() {
        let db = Database::open_in_memory().unwrap();
        let slot = sample_slot();
        db.shows().create(&slot).unwrap();

        let mut first = Booking::new(
            slot.id,
            Uuid::new_v4(),
            "Dinner & Show".into(),
            2,
            "Ada Guest".into(),
            "ada@example.com".into(),
        );
        first.idempotency_key = Some("form-dup".into());
        db.bookings().create(&first).unwrap();

        let mut second = Booking::new(
            slot.id,
            Uuid::new_v4(),
            "Dinner & Show".into(),
            2,
            "Ada Guest".into(),
            "ada@example.com".into(),
        );
        second.idempotency_key = Some("form-dup".into());
        assert!(db.bookings().create(&second).is_err());
    }

    #[test]
    fn test_customer_upsert_by_email() {
        let db = Database::open_in_memory().unwrap();
        let first = crate::models::Customer::new("Ada Guest".into(), "ada@example.com".into());
        db.customers().upsert_by_email(&first).unwrap();

        let renamed =
            crate::models::Customer::new("Ada B. Guest".into(), "ada@example.com".into())
                .with_phone("555-0100".into());
        let stored = db.customers().upsert_by_email(&renamed).unwrap();

        assert_eq!(stored.id, first.id);
        assert_eq!(stored.name, "Ada B. Guest");
        assert_eq!(db.customers().list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_promo_usage_increment() {
        let db = Database::open_in_memory().unwrap();
        let promo = PromoCode::new("GALA".into(), PromoKind::Percentage, 10);
        db.promo_codes().create(&promo).unwrap();

        db.promo_codes().increment_times_used(promo.id).unwrap();
        db.promo_codes().increment_times_used(promo.id).unwrap();

        let loaded = db.promo_codes().find_by_code("gala").unwrap().unwrap();
        assert_eq!(loaded.times_used, 2);
    }

    #[test]
    fn test_settings_default_then_counter() {
        let db = Database::open_in_memory().unwrap();
        let settings = db.settings().load().unwrap();
        assert_eq!(settings.invoice_next_number, 1);

        assert_eq!(db.settings().next_invoice_number().unwrap(), 1);
        assert_eq!(db.settings().next_invoice_number().unwrap(), 2);
        assert_eq!(db.settings().load().unwrap().invoice_next_number, 3);
    }

    #[test]
    fn test_package_roundtrip_with_levels() {
        let db = Database::open_in_memory().unwrap();
        let pkg = PackageOption::new("Dinner & Show".into())
            .with_price_level("default", 8900)
            .with_price_level("premiere", 12900)
            .with_add_on("Champagne reception", 1500);
        db.packages().create(&pkg).unwrap();

        let loaded = db.packages().find_by_id(pkg.id).unwrap().unwrap();
        assert_eq!(loaded.price_per_guest(Some("premiere")), Some(12900));
        assert_eq!(loaded.add_ons.len(), 1);
    }
}
