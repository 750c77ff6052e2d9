use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::cart::Cart;
use crate::domain::ports::CartArchive;

/// Cart snapshots as one JSON file per session under a spool directory.
/// Carts are small and written on every mutation, so plain whole-file writes
/// are enough.
pub struct JsonCartArchive {
    dir: PathBuf,
}

impl JsonCartArchive {
    /// Opens the archive, creating the spool directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, session: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(session)))
    }
}

/// Session ids arrive in a client header and become file names, so anything
/// outside a conservative character set is replaced.
fn file_stem(session: &str) -> String {
    let cleaned: String = session
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "session".to_string()
    } else {
        cleaned
    }
}

impl CartArchive for JsonCartArchive {
    fn load(&self, session: &str) -> io::Result<Option<Cart>> {
        let bytes = match fs::read(self.path_for(session)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let cart = serde_json::from_slice(&bytes)?;
        Ok(Some(cart))
    }

    fn save(&self, session: &str, cart: &Cart) -> io::Result<()> {
        let bytes = serde_json::to_vec(cart)?;
        fs::write(self.path_for(session), bytes)
    }

    fn remove(&self, session: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(session)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Same contract, backed by a map. Used by tests that do not care about
/// files.
#[derive(Default)]
pub struct MemoryCartArchive {
    carts: Mutex<HashMap<String, Cart>>,
}

impl MemoryCartArchive {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Cart>> {
        self.carts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartArchive for MemoryCartArchive {
    fn load(&self, session: &str) -> io::Result<Option<Cart>> {
        Ok(self.lock().get(session).cloned())
    }

    fn save(&self, session: &str, cart: &Cart) -> io::Result<()> {
        self.lock().insert(session.to_string(), cart.clone());
        Ok(())
    }

    fn remove(&self, session: &str) -> io::Result<()> {
        self.lock().remove(session);
        Ok(())
    }
}
