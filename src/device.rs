//! On-device persistence for the three pieces of local state: cart
//! contents, saved customer info, and the admin session flag.
//!
//! Backed by a SQLite `local_settings` key-value table under the configured
//! data directory (WAL mode, upsert writes). Reads are resilient: a missing
//! or corrupt value falls back to empty/default with a warning instead of
//! failing startup. Only writes surface errors.

use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use crate::error::DeviceStorageError;
use crate::model::{CartItem, SavedUserInfo};

const CATEGORY: &str = "storefront";
const KEY_CART: &str = "cart";
const KEY_USER_INFO: &str = "saved_user_info";
const KEY_ADMIN_SESSION: &str = "admin_session";

pub struct DeviceStorage {
    conn: Mutex<Connection>,
}

impl DeviceStorage {
    /// Open (or create) `storefront.db` under the data directory. On open
    /// failure the file is deleted and opening is retried once, trading a
    /// corrupt local cache for a working one.
    pub fn open(data_dir: &Path) -> Result<Self, DeviceStorageError> {
        fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("storefront.db");

        let conn = match open_and_configure(&db_path) {
            Ok(conn) => conn,
            Err(first_err) => {
                warn!(
                    path = %db_path.display(),
                    error = %first_err,
                    "device storage open failed, deleting and retrying once"
                );
                let _ = fs::remove_file(&db_path);
                let _ = fs::remove_file(db_path.with_extension("db-wal"));
                let _ = fs::remove_file(db_path.with_extension("db-shm"));
                open_and_configure(&db_path)?
            }
        };
        ensure_schema(&conn)?;
        info!(path = %db_path.display(), "device storage ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory storage with the same schema, for tests and ephemeral use.
    pub fn open_in_memory() -> Result<Self, DeviceStorageError> {
        let conn = Connection::open_in_memory()?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Raw key-value access -----------------------------------------------

    fn get_value(&self, key: &str) -> Option<String> {
        self.lock()
            .query_row(
                "SELECT setting_value FROM local_settings
                 WHERE setting_category = ?1 AND setting_key = ?2",
                params![CATEGORY, key],
                |row| row.get(0),
            )
            .ok()
    }

    fn set_value(&self, key: &str, value: &str) -> Result<(), DeviceStorageError> {
        self.lock().execute(
            "INSERT INTO local_settings (setting_category, setting_key, setting_value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(setting_category, setting_key) DO UPDATE SET
                setting_value = excluded.setting_value,
                updated_at = excluded.updated_at",
            params![CATEGORY, key, value],
        )?;
        Ok(())
    }

    // -- Typed accessors -----------------------------------------------------

    /// The persisted cart, or empty when absent or undecodable.
    pub fn load_cart(&self) -> Vec<CartItem> {
        let Some(raw) = self.get_value(KEY_CART) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(cart) => cart,
            Err(error) => {
                warn!(error = %error, "stored cart did not decode, starting empty");
                Vec::new()
            }
        }
    }

    pub fn save_cart(&self, cart: &[CartItem]) -> Result<(), DeviceStorageError> {
        let raw = serde_json::to_string(cart)?;
        self.set_value(KEY_CART, &raw)
    }

    pub fn load_user_info(&self) -> Option<SavedUserInfo> {
        let raw = self.get_value(KEY_USER_INFO)?;
        match serde_json::from_str(&raw) {
            Ok(info) => Some(info),
            Err(error) => {
                warn!(error = %error, "stored user info did not decode, ignoring");
                None
            }
        }
    }

    pub fn save_user_info(&self, info: &SavedUserInfo) -> Result<(), DeviceStorageError> {
        let raw = serde_json::to_string(info)?;
        self.set_value(KEY_USER_INFO, &raw)
    }

    /// Whether an admin session flag was persisted. Stored boolean-as-string;
    /// anything but `"true"` reads as inactive.
    pub fn load_admin_session(&self) -> bool {
        self.get_value(KEY_ADMIN_SESSION).as_deref() == Some("true")
    }

    pub fn save_admin_session(&self, active: bool) -> Result<(), DeviceStorageError> {
        self.set_value(KEY_ADMIN_SESSION, if active { "true" } else { "false" })
    }
}

fn open_and_configure(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(conn)
}

fn ensure_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS local_settings (
            setting_category TEXT NOT NULL,
            setting_key TEXT NOT NULL,
            setting_value TEXT NOT NULL,
            updated_at TEXT DEFAULT (datetime('now')),
            PRIMARY KEY (setting_category, setting_key)
        );",
    )
}

// ===========================================================================
// Tests
// ===========================================================================
