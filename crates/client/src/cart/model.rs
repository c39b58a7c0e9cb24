//! Cart value and its pure state transitions.
//!
//! Every mutation is a function on [`Cart`] that returns a [`CartChange`]
//! describing what happened. Nothing here persists or notifies; the manager
//! does both after inspecting the outcome.

use serde::{Deserialize, Serialize};

use storefront_core::{Price, Product, ProductId};

/// One product snapshot and how many units of it are in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product as it was when the line was created.
    pub product: Product,
    /// Units in the cart, `1..=product.stock`.
    pub quantity: u32,
}

impl CartLineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Derived cart figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartTotals {
    /// Sum of line quantities.
    pub total_items: u64,
    /// Sum of line subtotals.
    pub total_price: Price,
}

/// Outcome of a cart transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Added(Product),
    /// An existing line's quantity changed.
    Updated(Product),
    /// A line was dropped.
    Removed(Product),
    /// Every line was dropped.
    Cleared,
    /// Ordered units were taken out; lines added meanwhile remain.
    Settled,
    /// Nothing to do (unknown product, or already empty).
    Unchanged,
    /// Refused: the requested quantity exceeds the product's stock.
    StockLimit(Product),
    /// Refused: a quantity of zero was requested.
    InvalidQuantity(Product),
}

impl CartChange {
    /// Whether the cart was modified and must be persisted.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Added(_) | Self::Updated(_) | Self::Removed(_) | Self::Cleared | Self::Settled
        )
    }
}

/// Ordered collection of line items, at most one per product.
///
/// Serializes as a bare JSON array of `{ "product", "quantity" }` objects in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from persisted lines, dropping lines that break the
    /// line-item invariants. Returns the cart and the number of lines dropped.
    ///
    /// A line is dropped if its quantity is zero or its product already has a
    /// line. Lines whose quantity exceeds the snapshot's stock are kept but
    /// capped at that stock; a zero-stock snapshot drops the line.
    #[must_use]
    pub fn from_persisted(lines: Vec<CartLineItem>) -> (Self, usize) {
        let total = lines.len();
        let mut cart = Self::new();

        for mut line in lines {
            if line.quantity == 0 || cart.position(line.product.id).is_some() {
                continue;
            }
            line.quantity = line.quantity.min(line.product.stock);
            if line.quantity == 0 {
                continue;
            }
            cart.items.push(line);
        }

        let dropped = total - cart.items.len();
        (cart, dropped)
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|i| i.product.id == product_id)
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items.iter().position(|i| i.product.id == product_id)
    }

    /// Recompute totals from the current lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            total_items: self.items.iter().map(|i| u64::from(i.quantity)).sum(),
            total_price: self.items.iter().map(CartLineItem::subtotal).sum(),
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Add `quantity` units of `product`, merging into an existing line.
    ///
    /// The stock check uses the stock of the `product` passed in, which is
    /// also stored as the line's snapshot on success.
    pub fn add(&mut self, product: &Product, quantity: u32) -> CartChange {
        if quantity == 0 {
            return CartChange::InvalidQuantity(product.clone());
        }

        match self.items.iter_mut().find(|i| i.product.id == product.id) {
            Some(line) => {
                let requested = line.quantity.saturating_add(quantity);
                if requested > product.stock {
                    return CartChange::StockLimit(product.clone());
                }
                line.product = product.clone();
                line.quantity = requested;
                CartChange::Updated(product.clone())
            }
            None => {
                if quantity > product.stock {
                    return CartChange::StockLimit(product.clone());
                }
                self.items.push(CartLineItem {
                    product: product.clone(),
                    quantity,
                });
                CartChange::Added(product.clone())
            }
        }
    }

    /// Drop the line for `product_id`.
    pub fn remove(&mut self, product_id: ProductId) -> CartChange {
        self.position(product_id)
            .map_or(CartChange::Unchanged, |index| {
                CartChange::Removed(self.items.remove(index).product)
            })
    }

    /// Set the quantity of an existing line. Zero removes the line.
    ///
    /// The stock check uses the line's stored snapshot.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> CartChange {
        if quantity == 0 {
            return self.remove(product_id);
        }

        let Some(line) = self.items.iter_mut().find(|i| i.product.id == product_id) else {
            return CartChange::Unchanged;
        };

        if quantity > line.product.stock {
            return CartChange::StockLimit(line.product.clone());
        }
        if line.quantity == quantity {
            return CartChange::Unchanged;
        }

        line.quantity = quantity;
        CartChange::Updated(line.product.clone())
    }

    /// Drop every line.
    pub fn clear(&mut self) -> CartChange {
        self.items.clear();
        CartChange::Cleared
    }

    /// Take the lines of a placed order out of the cart.
    ///
    /// Each ordered line's quantity is subtracted from the live line for the
    /// same product; a line that reaches zero is dropped. Lines and units
    /// added after `ordered` was captured are kept. Reports `Cleared` when
    /// nothing remains.
    pub fn settle(&mut self, ordered: &Self) -> CartChange {
        let mut touched = false;

        for paid in &ordered.items {
            if let Some(line) = self.items.iter_mut().find(|i| i.product.id == paid.product.id) {
                line.quantity = line.quantity.saturating_sub(paid.quantity);
                touched = true;
            }
        }
        self.items.retain(|i| i.quantity > 0);

        if !touched {
            CartChange::Unchanged
        } else if self.items.is_empty() {
            CartChange::Cleared
        } else {
            CartChange::Settled
        }
    }
}
