//! Cart manager.
//!
//! Owns the in-memory [`Cart`], keeps its shadow copy under
//! [`keys::CART`](crate::store::keys::CART) up to date, and publishes a
//! notification for every user-visible outcome.
//!
//! Stock-limit and invalid-quantity rejections are reported through
//! notifications only. Persistence failures are logged and otherwise
//! ignored: the in-memory cart stays authoritative.

mod model;

pub use model::{Cart, CartChange, CartLineItem, CartTotals};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use storefront_core::{Product, ProductId};

use crate::notify::{Notification, Notifier};
use crate::store::{SharedStore, keys};

/// Operation a change came from; picks the notification wording.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Update,
    Remove,
    Clear,
    Settle,
}

/// Shopping cart state manager.
pub struct CartManager {
    cart: Mutex<Cart>,
    store: SharedStore,
    notifier: Notifier,
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("cart", &*self.cart.lock())
            .finish_non_exhaustive()
    }
}

impl CartManager {
    /// Create a manager, hydrating the cart from the store.
    ///
    /// A missing, unreadable or malformed persisted cart yields an empty
    /// cart; the problem is logged.
    #[must_use]
    pub fn new(store: SharedStore, notifier: Notifier) -> Self {
        let cart = load(&store);
        Self {
            cart: Mutex::new(cart),
            store,
            notifier,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of `product`.
    ///
    /// Rejected (cart unchanged) when the resulting quantity would exceed
    /// `product.stock` or when `quantity` is zero.
    pub fn add_item(&self, product: &Product, quantity: u32) -> CartChange {
        let change = self.apply(|cart| cart.add(product, quantity));
        debug!(product_id = %product.id, quantity, ?change, "add_item");
        self.announce(Operation::Add, &change);
        change
    }

    /// Drop the line for `product_id`. Unknown products are a silent no-op.
    pub fn remove_item(&self, product_id: ProductId) -> CartChange {
        let change = self.apply(|cart| cart.remove(product_id));
        debug!(%product_id, ?change, "remove_item");
        self.announce(Operation::Remove, &change);
        change
    }

    /// Set the quantity of an existing line. Zero behaves as
    /// [`remove_item`](Self::remove_item).
    pub fn update_quantity(&self, product_id: ProductId, quantity: u32) -> CartChange {
        let change = self.apply(|cart| cart.set_quantity(product_id, quantity));
        debug!(%product_id, quantity, ?change, "update_quantity");
        self.announce(Operation::Update, &change);
        change
    }

    /// Empty the cart.
    pub fn clear(&self) {
        let change = self.apply(Cart::clear);
        info!("Cart cleared");
        self.announce(Operation::Clear, &change);
    }

    /// Take the lines of a placed order out of the cart, keeping anything
    /// added since `ordered` was captured.
    pub fn settle(&self, ordered: &Cart) -> CartChange {
        let change = self.apply(|cart| cart.settle(ordered));
        info!(?change, "Cart settled after checkout");
        self.announce(Operation::Settle, &change);
        change
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Snapshot of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.cart.lock().clone()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.cart.lock().items().to_vec()
    }

    /// Totals recomputed from the current lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.cart.lock().totals()
    }

    /// Whether the cart has a line for `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.cart.lock().line(product_id).is_some()
    }

    /// Units of `product_id` in the cart; zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.cart.lock().line(product_id).map_or(0, |l| l.quantity)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.lock().is_empty()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run a transition and persist the result if it mutated the cart.
    ///
    /// The lock is held across the store write so the shadow copy is written
    /// in mutation order.
    fn apply(&self, transition: impl FnOnce(&mut Cart) -> CartChange) -> CartChange {
        let mut cart = self.cart.lock();
        let change = transition(&mut cart);
        if change.is_mutation() {
            self.persist(&cart);
        }
        change
    }

    fn persist(&self, cart: &Cart) {
        let json = match serde_json::to_string(cart) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };
        if let Err(e) = self.store.set(keys::CART, &json) {
            warn!(error = %e, key = keys::CART, "Failed to persist cart");
        }
    }

    fn announce(&self, operation: Operation, change: &CartChange) {
        let notification = match (operation, change) {
            (_, CartChange::Added(product)) => Notification::item_added(product),
            // Updating a quantity in place is silent; merging on add is not.
            (Operation::Add, CartChange::Updated(product)) => Notification::item_updated(product),
            (_, CartChange::Removed(product)) => Notification::item_removed(product),
            (_, CartChange::Cleared) => Notification::cart_cleared(),
            (Operation::Add, CartChange::StockLimit(product)) => {
                Notification::stock_limit_on_add(product)
            }
            (_, CartChange::StockLimit(product)) => Notification::stock_limit_on_update(product),
            (_, CartChange::InvalidQuantity(product)) => Notification::invalid_quantity(product),
            (_, CartChange::Updated(_) | CartChange::Settled | CartChange::Unchanged) => return,
        };
        self.notifier.publish(notification);
    }
}

/// Read the persisted cart, falling back to empty.
fn load(store: &SharedStore) -> Cart {
    let raw = match store.get(keys::CART) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(error = %e, key = keys::CART, "Failed to read persisted cart");
            return Cart::new();
        }
    };

    match serde_json::from_str::<Vec<CartLineItem>>(&raw) {
        Ok(lines) => {
            let (cart, dropped) = Cart::from_persisted(lines);
            if dropped > 0 {
                warn!(dropped, "Dropped invalid persisted cart lines");
            }
            debug!(lines = cart.items().len(), "Cart hydrated");
            cart
        }
        Err(e) => {
            warn!(error = %e, "Persisted cart is malformed, starting empty");
            Cart::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast::Receiver;

    use super::*;
    use crate::notify::{Notification, NotificationKind};
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::testing::{FailingStore, product};

    fn manager_with(store: Arc<MemoryStore>) -> (CartManager, Receiver<Notification>) {
        let notifier = Notifier::default();
        let rx = notifier.subscribe();
        (CartManager::new(store, notifier), rx)
    }

    fn drain(rx: &mut Receiver<Notification>) -> Vec<Notification> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    fn persisted(store: &MemoryStore) -> Vec<CartLineItem> {
        serde_json::from_str(&store.get(keys::CART).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_add_until_stock_limit() {
        let store = Arc::new(MemoryStore::new());
        let (cart, mut rx) = manager_with(store.clone());
        let a = product(1, "Product A", "10", 2);

        cart.add_item(&a, 1);
        assert_eq!(cart.totals().total_items, 1);
        assert_eq!(cart.totals().total_price, "10".parse().unwrap());

        cart.add_item(&a, 1);
        assert_eq!(cart.totals().total_items, 2);
        assert_eq!(cart.totals().total_price, "20".parse().unwrap());

        assert_eq!(cart.add_item(&a, 1), CartChange::StockLimit(a.clone()));
        assert_eq!(cart.totals().total_items, 2);
        assert_eq!(cart.totals().total_price, "20".parse().unwrap());

        let kinds: Vec<_> = drain(&mut rx).into_iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::ItemAdded { product_id: a.id },
                NotificationKind::ItemUpdated { product_id: a.id },
                NotificationKind::StockLimit {
                    product_id: a.id,
                    available: 2
                },
            ]
        );
        assert_eq!(persisted(&store)[0].quantity, 2);
    }

    #[test]
    fn test_update_to_zero_removes() {
        let store = Arc::new(MemoryStore::new());
        let (cart, mut rx) = manager_with(store.clone());
        let a = product(1, "Product A", "10", 2);
        cart.add_item(&a, 1);
        drain(&mut rx);

        cart.update_quantity(a.id, 0);

        assert!(cart.is_empty());
        assert_eq!(cart.totals(), CartTotals::default());
        assert!(persisted(&store).is_empty());
        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Removed from cart");
    }

    #[test]
    fn test_update_over_stock_notifies_cannot_update() {
        let (cart, mut rx) = manager_with(Arc::new(MemoryStore::new()));
        let a = product(1, "Product A", "10", 2);
        cart.add_item(&a, 1);
        drain(&mut rx);

        cart.update_quantity(a.id, 5);

        assert_eq!(cart.quantity_of(a.id), 1);
        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Cannot update");
        assert_eq!(notes[0].message, "Sorry, only 2 Product A available in stock.");
    }

    #[test]
    fn test_update_in_range_is_silent_and_persisted() {
        let store = Arc::new(MemoryStore::new());
        let (cart, mut rx) = manager_with(store.clone());
        let a = product(1, "Product A", "10", 5);
        cart.add_item(&a, 1);
        drain(&mut rx);

        cart.update_quantity(a.id, 4);

        assert_eq!(cart.quantity_of(a.id), 4);
        assert_eq!(persisted(&store)[0].quantity, 4);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let (cart, mut rx) = manager_with(Arc::new(MemoryStore::new()));

        assert_eq!(cart.remove_item(ProductId::new(42)), CartChange::Unchanged);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_clear_persists_empty_collection() {
        let store = Arc::new(MemoryStore::new());
        let (cart, mut rx) = manager_with(store.clone());
        for id in 1..=3 {
            cart.add_item(&product(id, "P", "1", 5), 1);
        }
        drain(&mut rx);

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some("[]"));
        let notes = drain(&mut rx);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::CartCleared);
    }

    #[test]
    fn test_reload_reproduces_cart() {
        let store = Arc::new(MemoryStore::new());
        let (cart, _rx) = manager_with(store.clone());
        cart.add_item(&product(2, "B", "3.25", 9), 4);
        cart.add_item(&product(1, "A", "10", 2), 2);

        let (reloaded, _rx) = manager_with(store);
        assert_eq!(reloaded.snapshot(), cart.snapshot());
        assert_eq!(reloaded.totals(), cart.totals());
    }

    #[test]
    fn test_malformed_persisted_cart_starts_empty() {
        let store = Arc::new(MemoryStore::with_entries([(keys::CART, "{not json")]));
        let (cart, _rx) = manager_with(store);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_store_failure_keeps_memory_authoritative() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();
        let cart = CartManager::new(Arc::new(FailingStore), notifier);
        let a = product(1, "A", "10", 3);

        cart.add_item(&a, 2);

        assert_eq!(cart.quantity_of(a.id), 2);
        assert!(cart.contains(a.id));
        assert_eq!(drain(&mut rx).len(), 1);
    }
}
