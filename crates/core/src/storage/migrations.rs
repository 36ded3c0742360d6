//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Show slots
            CREATE TABLE IF NOT EXISTS shows (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                capacity INTEGER NOT NULL,
                booked_count INTEGER NOT NULL DEFAULT 0,
                is_manually_closed INTEGER NOT NULL DEFAULT 0,
                available_package_ids TEXT NOT NULL DEFAULT '[]',
                price_tier TEXT,
                created_at TEXT NOT NULL
            );

            -- Packages
            CREATE TABLE IF NOT EXISTS packages (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                price_cents INTEGER,
                price_levels TEXT NOT NULL DEFAULT '{}',
                add_ons TEXT NOT NULL DEFAULT '[]',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            -- Bookings
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                reservation_code TEXT NOT NULL UNIQUE,
                show_slot_id TEXT NOT NULL,
                package_id TEXT NOT NULL,
                package_name TEXT NOT NULL,
                guests INTEGER NOT NULL,
                customer_name TEXT NOT NULL,
                customer_email TEXT NOT NULL,
                customer_phone TEXT,
                billing_address TEXT,
                status TEXT NOT NULL,
                is_overbooking INTEGER NOT NULL DEFAULT 0,
                holds_capacity INTEGER NOT NULL DEFAULT 0,
                total_price_cents INTEGER NOT NULL DEFAULT 0,
                applied_promo_code TEXT,
                discount_cents INTEGER NOT NULL DEFAULT 0,
                add_on_ids TEXT NOT NULL DEFAULT '[]',
                merchandise TEXT NOT NULL DEFAULT '[]',
                reschedule_history TEXT NOT NULL DEFAULT '[]',
                cancellation_reason TEXT,
                cancelled_by TEXT,
                cancelled_at TEXT,
                admin_notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                FOREIGN KEY (show_slot_id) REFERENCES shows(id)
            );
            CREATE INDEX IF NOT EXISTS idx_bookings_slot ON bookings(show_slot_id);
            CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status);

            -- Customers
            CREATE TABLE IF NOT EXISTS customers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT,
                notes TEXT,
                created_at TEXT NOT NULL
            );

            -- Waiting list
            CREATE TABLE IF NOT EXISTS waiting_list (
                id TEXT PRIMARY KEY,
                show_slot_id TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                guests INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                notes TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (show_slot_id) REFERENCES shows(id)
            );
            CREATE INDEX IF NOT EXISTS idx_waiting_list_slot ON waiting_list(show_slot_id);

            -- Promo codes
            CREATE TABLE IF NOT EXISTS promo_codes (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                kind TEXT NOT NULL,
                value INTEGER NOT NULL,
                usage_limit INTEGER,
                times_used INTEGER NOT NULL DEFAULT 0,
                min_booking_cents INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            -- Merchandise catalog
            CREATE TABLE IF NOT EXISTS merchandise (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                unit_price_cents INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            -- Invoices
            CREATE TABLE IF NOT EXISTS invoices (
                id TEXT PRIMARY KEY,
                invoice_number TEXT NOT NULL UNIQUE,
                booking_id TEXT NOT NULL,
                customer_name TEXT NOT NULL,
                billing_address TEXT,
                lines TEXT NOT NULL DEFAULT '[]',
                net_cents INTEGER NOT NULL,
                vat_cents INTEGER NOT NULL,
                gross_cents INTEGER NOT NULL,
                vat_rate_bps INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                credit_of TEXT,
                issued_at TEXT NOT NULL,
                due_at TEXT NOT NULL,
                sent_at TEXT,
                paid_at TEXT,
                FOREIGN KEY (booking_id) REFERENCES bookings(id)
            );

            -- Staff accounts
            CREATE TABLE IF NOT EXISTS staff (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                last_login TEXT
            );

            -- Shift rota
            CREATE TABLE IF NOT EXISTS scheduled_shifts (
                id TEXT PRIMARY KEY,
                staff_id TEXT NOT NULL,
                date TEXT NOT NULL,
                starts TEXT NOT NULL,
                ends TEXT NOT NULL,
                duty TEXT NOT NULL,
                notes TEXT,
                FOREIGN KEY (staff_id) REFERENCES staff(id) ON DELETE CASCADE
            );

            -- Settings singleton
            CREATE TABLE IF NOT EXISTS app_settings (
                key TEXT PRIMARY KEY,
                company_name TEXT NOT NULL DEFAULT '',
                company_address TEXT NOT NULL DEFAULT '',
                company_email TEXT NOT NULL DEFAULT '',
                vat_rate_bps INTEGER NOT NULL DEFAULT 1900,
                invoice_prefix TEXT NOT NULL DEFAULT 'INV',
                invoice_next_number INTEGER NOT NULL DEFAULT 1,
                invoice_due_days INTEGER NOT NULL DEFAULT 14,
                default_show_slot_id TEXT,
                default_package_id TEXT,
                updated_at TEXT NOT NULL
            );

            -- Audit trail
            CREATE TABLE IF NOT EXISTS audit_log (
                id TEXT PRIMARY KEY,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                subject_id TEXT,
                detail TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Notification outbox",
        sql: r#"
            CREATE TABLE IF NOT EXISTS notification_outbox (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                booking_id TEXT NOT NULL,
                recipient TEXT NOT NULL,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                attempts INTEGER NOT NULL DEFAULT 0,
                next_attempt_at TEXT NOT NULL,
                last_error TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_outbox_status ON notification_outbox(status);
        "#,
    },
    Migration {
        version: 3,
        description: "Booking idempotency keys",
        sql: r#"
            ALTER TABLE bookings ADD COLUMN idempotency_key TEXT;
            CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_idempotency
                ON bookings(idempotency_key)
                WHERE idempotency_key IS NOT NULL;
        "#,
    },
];

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;

    let current: u32 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(version = migration.version, description = migration.description, "Applying migration");
        conn.execute_batch(migration.sql)?;
        conn.execute(
            "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                migration.version,
                migration.description,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
    }

    Ok(())
}
