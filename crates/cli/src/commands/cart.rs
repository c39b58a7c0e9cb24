//! Cart commands.
//!
//! The cart is persisted in the state directory, so edits made by one
//! invocation are visible to the next.

use storefront_client::{AppError, Storefront, StorefrontApi};
use storefront_core::ProductId;

/// Print line items and totals.
pub fn show(storefront: &Storefront) {
    let cart = storefront.cart();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in cart.items() {
        println!(
            "{:>6}  {:<32} {:>4} x {:>10} = {:>10}",
            line.product.id,
            line.product.name,
            line.quantity,
            line.product.price.to_string(),
            line.subtotal().to_string()
        );
    }
    let totals = cart.totals();
    println!("{} item(s), total {}", totals.total_items, totals.total_price);
}

/// Fetch the current product record and add it to the cart.
///
/// # Errors
///
/// Returns `AppError::Api` if the product cannot be fetched. Stock-limit
/// rejections are reported as notifications, not errors.
pub async fn add(storefront: &Storefront, id: ProductId, quantity: u32) -> Result<(), AppError> {
    let product = storefront.api().get_product(id).await?;
    storefront.cart().add_item(&product, quantity);
    Ok(())
}

pub fn remove(storefront: &Storefront, id: ProductId) {
    if !storefront.cart().contains(id) {
        tracing::info!(product_id = %id, "Product is not in the cart");
    }
    storefront.cart().remove_item(id);
}

pub fn update(storefront: &Storefront, id: ProductId, quantity: u32) {
    if !storefront.cart().contains(id) {
        tracing::info!(product_id = %id, "Product is not in the cart");
        return;
    }
    storefront.cart().update_quantity(id, quantity);
    println!("{id}: {} in cart", storefront.cart().quantity_of(id));
}
