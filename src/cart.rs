//! Client-held cart state: merge semantics, derived totals, durable
//! persistence.
//!
//! This component is independent of the HTTP layer. It models the cart as a
//! plain state container with explicit mutation methods and an explicit
//! change-notification mechanism; any UI can subscribe without the container
//! knowing about rendering.
//!
//! # Persistence
//!
//! Every mutation writes the full line list through to the backing store
//! synchronously before returning, so state survives the client going away
//! mid-session. On construction the cart rehydrates from the store; a payload
//! that fails to parse is discarded and the store cleared rather than
//! crashing.
//!
//! # Identity
//!
//! Lines are keyed by `(product_id, size)`. Adding an existing key merges
//! quantities; two sizes of the same product stay distinct lines.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::session::SessionUser;

/// Fixed storage key for the serialized cart.
pub const CART_STORAGE_KEY: &str = "cart";

/// Fixed storage key for the serialized current-user mirror.
pub const USER_STORAGE_KEY: &str = "current-user";

/// One (product, size) entry with a quantity and denormalized snapshots of
/// the title, price and image at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub product_title: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub image_url: String,
}

impl CartLine {
    /// Price contribution of this line.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Errors from a cart storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored payload did not parse: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable storage for the serialized line list.
///
/// `load` distinguishes "nothing stored" (`Ok(None)`) from a payload that
/// exists but does not parse (`Err(Corrupt)`), so the caller can decide to
/// discard corrupt state.
pub trait CartStore {
    fn load(&self) -> Result<Option<Vec<CartLine>>, StorageError>;
    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// JSON-file backed store, one file per storage key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }
}

impl CartStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<CartLine>>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError> {
        let payload = serde_json::to_string(lines)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store holding the raw payload; used in tests, where it also
/// allows injecting corrupt data.
#[derive(Debug, Default)]
pub struct MemoryStore {
    payload: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-seeded raw payload (possibly invalid JSON).
    pub fn with_payload(raw: &str) -> Self {
        Self {
            payload: Mutex::new(Some(raw.to_string())),
        }
    }

    /// Raw payload currently stored, if any.
    pub fn raw(&self) -> Option<String> {
        match self.payload.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CartStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<CartLine>>, StorageError> {
        let guard = match self.payload.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_deref() {
            None => Ok(None),
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
        }
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError> {
        let payload = serde_json::to_string(lines)?;
        match self.payload.lock() {
            Ok(mut guard) => *guard = Some(payload),
            Err(poisoned) => *poisoned.into_inner() = Some(payload),
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match self.payload.lock() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        Ok(())
    }
}

/// What changed in the cart; delivered to subscribers after persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    LineAdded,
    LineUpdated,
    LineRemoved,
    Cleared,
}

type ChangeListener = Box<dyn Fn(CartChange) + Send>;

/// The cart state container.
pub struct Cart<S: CartStore> {
    lines: Vec<CartLine>,
    store: S,
    listeners: Vec<ChangeListener>,
}

impl<S: CartStore> Cart<S> {
    /// Rehydrate from the store. Corrupt payloads are discarded and the
    /// store cleared; I/O trouble degrades to an empty cart.
    pub fn with_store(store: S) -> Self {
        let lines = match store.load() {
            Ok(Some(lines)) => lines,
            Ok(None) => Vec::new(),
            Err(StorageError::Corrupt(e)) => {
                warn!(error = %e, "Discarding corrupt cart payload");
                if let Err(e) = store.clear() {
                    warn!(error = %e, "Failed to clear corrupt cart storage");
                }
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Cart storage unavailable, starting empty");
                Vec::new()
            }
        };

        Self {
            lines,
            store,
            listeners: Vec::new(),
        }
    }

    /// Register a change listener. Fired after every persisted mutation.
    pub fn subscribe(&mut self, listener: impl Fn(CartChange) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line; an existing (product_id, size) line absorbs the incoming
    /// quantity instead of duplicating.
    pub fn add_line(&mut self, line: CartLine) {
        let change = match self
            .lines
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id && existing.size == line.size)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                CartChange::LineUpdated
            }
            None => {
                self.lines.push(line);
                CartChange::LineAdded
            }
        };

        self.persist();
        self.notify(change);
    }

    /// Remove the matching line. A miss is a no-op, not an error.
    pub fn remove_line(&mut self, product_id: &str, size: &str) {
        let before = self.lines.len();
        self.lines
            .retain(|line| !(line.product_id == product_id && line.size == size));

        if self.lines.len() != before {
            self.persist();
            self.notify(CartChange::LineRemoved);
        }
    }

    /// Overwrite a line's quantity; zero removes the line entirely, so a
    /// quantity below 1 is never stored.
    pub fn set_quantity(&mut self, product_id: &str, size: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_line(product_id, size);
            return;
        }

        let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id && line.size == size)
        else {
            return;
        };

        line.quantity = quantity;
        self.persist();
        self.notify(CartChange::LineUpdated);
    }

    /// Empty the cart in one operation.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
        self.notify(CartChange::Cleared);
    }

    /// Sum of `unit_price x quantity` over all lines, recomputed on demand.
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines, recomputed on demand.
    pub fn total_item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    fn persist(&self) {
        // Write-through is best-effort; a failed write must not lose the
        // in-memory state the user is looking at.
        if let Err(e) = self.store.save(&self.lines) {
            warn!(error = %e, "Failed to persist cart");
        }
    }

    fn notify(&self, change: CartChange) {
        for listener in &self.listeners {
            listener(change);
        }
    }
}

// =============================================================================
// Current-user mirror
// =============================================================================

/// Load the persisted current-user mirror. Corrupt payloads are discarded
/// and removed, same contract as the cart itself.
pub fn load_stored_user(dir: impl AsRef<Path>) -> Option<SessionUser> {
    let path = user_path(dir.as_ref());
    let raw = fs::read_to_string(&path).ok()?;

    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "Discarding corrupt stored user");
            if let Err(e) = fs::remove_file(&path) {
                warn!(error = %e, "Failed to remove corrupt stored user");
            }
            None
        }
    }
}

/// Persist the current-user mirror.
pub fn save_stored_user(dir: impl AsRef<Path>, user: &SessionUser) -> Result<(), StorageError> {
    let payload = serde_json::to_string(user)?;
    fs::write(user_path(dir.as_ref()), payload)?;
    Ok(())
}

/// Remove the current-user mirror (logout).
pub fn clear_stored_user(dir: impl AsRef<Path>) -> Result<(), StorageError> {
    match fs::remove_file(user_path(dir.as_ref())) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn user_path(dir: &Path) -> PathBuf {
    dir.join(format!("{USER_STORAGE_KEY}.json"))
}
