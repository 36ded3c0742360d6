//! Application state management

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use matinee_core::{Actor, Database, Error, Result, ShowSlot, StaffMember};
use uuid::Uuid;

use crate::config::AppConfig;

/// Severity of a toast notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// Ephemeral toast shown by the UI shell (not persisted)
#[derive(Debug, Clone)]
pub struct Toast {
    pub id: Uuid,
    pub level: ToastLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Main application state
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: AppConfig,
    current_staff: Mutex<Option<StaffMember>>,
    /// Ephemeral toast queue; every failure path ends here
    toasts: Mutex<Vec<Toast>>,
    /// Cached upcoming slots, optimistically patched by desk operations
    /// and reconciled by scoped reloads
    slots: Mutex<Vec<ShowSlot>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let db_path = match &config.database_path {
            Some(path) => path.clone(),
            None => Self::data_path()?.join("matinee.db"),
        };

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path)?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config,
            current_staff: Mutex::new(None),
            toasts: Mutex::new(Vec::new()),
            slots: Mutex::new(Vec::new()),
        })
    }

    /// In-memory state for tests
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: Arc::new(Mutex::new(Database::open_in_memory()?)),
            config: AppConfig::default(),
            current_staff: Mutex::new(None),
            toasts: Mutex::new(Vec::new()),
            slots: Mutex::new(Vec::new()),
        })
    }

    fn data_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "matinee", "matinee").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })?;

        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn set_current_staff(&self, staff: Option<StaffMember>) {
        *self.current_staff.lock().unwrap() = staff;
    }

    pub fn current_staff(&self) -> Option<StaffMember> {
        self.current_staff.lock().unwrap().clone()
    }

    /// The acting staff member as a desk actor, if signed in
    pub fn actor(&self) -> Option<Actor> {
        self.current_staff().map(|s| Actor::Staff {
            id: s.id,
            role: s.role,
        })
    }

    /// Queue a toast for the UI shell
    pub fn push_toast(&self, level: ToastLevel, message: impl Into<String>) {
        self.toasts.lock().unwrap().push(Toast {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    /// Take all queued toasts
    pub fn drain_toasts(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock().unwrap())
    }

    /// Snapshot of the cached slot list
    pub fn cached_slots(&self) -> Vec<ShowSlot> {
        self.slots.lock().unwrap().clone()
    }

    /// Optimistically patch one slot in the cache
    pub fn patch_slot(&self, slot: ShowSlot) {
        let mut slots = self.slots.lock().unwrap();
        match slots.iter_mut().find(|s| s.id == slot.id) {
            Some(existing) => *existing = slot,
            None => slots.push(slot),
        }
        slots.sort_by_key(|s| (s.date, s.time));
    }

    /// Re-read a single slot after a capacity-affecting operation
    pub fn refresh_slot(&self, slot_id: Uuid) {
        let db = self.db.lock().unwrap();
        if let Ok(Some(slot)) = db.shows().find_by_id(slot_id) {
            drop(db);
            self.patch_slot(slot);
        }
    }

    /// Replace the cache with upcoming slots (scoped query, not a full
    /// collection read)
    pub fn reload_slots(&self) -> Result<Vec<ShowSlot>> {
        let db = self.db.lock().unwrap();
        let slots = db.shows().list_from(Utc::now().date_naive())?;
        drop(db);
        *self.slots.lock().unwrap() = slots.clone();
        Ok(slots)
    }
}
