use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bigdecimal::BigDecimal;

use crate::domain::cart::{Cart, CartProduct};
use crate::domain::ports::CartArchive;

/// Authoritative per-session cart state.
///
/// Carts live in memory behind one registry lock; every mutation is mirrored
/// to the archive so a restart does not lose them. Cart operations never fail:
/// an archive write failure is logged and the in-memory state stands.
pub struct CartStore {
    archive: Arc<dyn CartArchive>,
    carts: Mutex<HashMap<String, Cart>>,
}

impl CartStore {
    pub fn new(archive: Arc<dyn CartArchive>) -> Self {
        Self {
            archive,
            carts: Mutex::new(HashMap::new()),
        }
    }

    /// Merges `quantity` of the product into the session's cart.
    pub fn add_item(&self, session: &str, product: &CartProduct, quantity: i32) {
        self.mutate(session, |cart| cart.add(product, quantity));
    }

    /// Sets a line's quantity; zero or below removes the line.
    pub fn update_quantity(&self, session: &str, product_id: &str, quantity: i32) {
        self.mutate(session, |cart| cart.set_quantity(product_id, quantity));
    }

    pub fn remove_item(&self, session: &str, product_id: &str) {
        self.mutate(session, |cart| cart.remove(product_id));
    }

    pub fn clear(&self, session: &str) {
        self.mutate(session, |cart| cart.clear());
    }

    /// The session's current lines, in insertion order.
    pub fn snapshot(&self, session: &str) -> Cart {
        let mut carts = self.lock();
        self.entry(&mut carts, session).clone()
    }

    pub fn total(&self, session: &str) -> BigDecimal {
        self.snapshot(session).total()
    }

    fn mutate(&self, session: &str, op: impl FnOnce(&mut Cart)) {
        let mut carts = self.lock();
        let cart = self.entry(&mut carts, session);
        op(cart);
        if let Err(e) = self.archive.save(session, cart) {
            log::warn!("Failed to archive cart for session {}: {}", session, e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Cart>> {
        self.carts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// First touch of a session pulls any archived cart from a previous run.
    fn entry<'a>(
        &self,
        carts: &'a mut HashMap<String, Cart>,
        session: &str,
    ) -> &'a mut Cart {
        carts
            .entry(session.to_string())
            .or_insert_with(|| match self.archive.load(session) {
                Ok(Some(cart)) => cart,
                Ok(None) => Cart::default(),
                Err(e) => {
                    log::warn!("Failed to load archived cart for session {}: {}", session, e);
                    Cart::default()
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartProduct;
    use crate::infrastructure::cart_archive::MemoryCartArchive;

    fn product(id: &str, price: i32) -> CartProduct {
        CartProduct {
            product_id: id.to_string(),
            name: format!("Specimen {}", id),
            unit_price: BigDecimal::from(price),
            image: String::new(),
            origin: String::new(),
        }
    }

    #[test]
    fn mutations_are_mirrored_to_the_archive() {
        let archive = Arc::new(MemoryCartArchive::default());
        let store = CartStore::new(archive.clone());

        store.add_item("s1", &product("a", 100), 2);

        let archived = archive.load("s1").unwrap().unwrap();
        assert_eq!(archived.item_count(), 2);
    }

    #[test]
    fn a_new_store_picks_up_archived_carts() {
        let archive = Arc::new(MemoryCartArchive::default());
        {
            let store = CartStore::new(archive.clone());
            store.add_item("s1", &product("a", 100), 1);
            store.add_item("s1", &product("b", 50), 3);
        }

        // Simulates a restart: fresh registry, same archive.
        let store = CartStore::new(archive);
        let cart = store.snapshot("s1");

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.total(), BigDecimal::from(250));
    }

    #[test]
    fn clear_persists_the_empty_cart() {
        let archive = Arc::new(MemoryCartArchive::default());
        let store = CartStore::new(archive.clone());

        store.add_item("s1", &product("a", 100), 1);
        store.clear("s1");

        let archived = archive.load("s1").unwrap().unwrap();
        assert!(archived.is_empty());
    }

    #[test]
    fn sessions_are_isolated() {
        let store = CartStore::new(Arc::new(MemoryCartArchive::default()));

        store.add_item("s1", &product("a", 100), 1);
        store.add_item("s2", &product("b", 50), 2);

        assert_eq!(store.snapshot("s1").lines.len(), 1);
        assert_eq!(store.snapshot("s2").lines.len(), 1);
        assert_eq!(store.total("s2"), BigDecimal::from(100));
    }
}
