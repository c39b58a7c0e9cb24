//! Checkout and order history commands.

use storefront_client::{AppError, Storefront, StorefrontApi};
use storefront_core::{Order, OrderId, PaymentMethod};

use super::{expire_if_unauthorized, require_token};

/// Place and pay for an order for the whole cart.
///
/// # Errors
///
/// Returns `AppError::Checkout` if not signed in, the cart is empty, or the
/// backend refuses the order or the payment.
pub async fn checkout(storefront: &Storefront, method: PaymentMethod) -> Result<(), AppError> {
    storefront.session().bootstrap().await?;

    let receipt = storefront
        .checkout()
        .place_order(method)
        .await
        .map_err(|e| expire_if_unauthorized(storefront, e.into()))?;

    println!(
        "Order #{} placed, {} charged via {method}",
        receipt.order.id, receipt.amount
    );
    if let Some(status) = &receipt.payment.status {
        println!("  payment: {status}");
    }
    Ok(())
}

/// List the signed-in customer's orders.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` without a session, or
/// `AppError::Api` if the backend call fails.
pub async fn list(storefront: &Storefront) -> Result<(), AppError> {
    let token = require_token(storefront).await?;
    let orders = storefront
        .api()
        .list_orders(&token)
        .await
        .map_err(|e| expire_if_unauthorized(storefront, e.into()))?;

    if orders.is_empty() {
        println!("No orders yet.");
    }
    for order in &orders {
        println!(
            "#{:<6} {:<12} {:<12} {:>10}  {} unit(s)",
            order.id,
            order.order_date,
            order.status.to_string(),
            order.total_amount.to_string(),
            order.total_units()
        );
    }
    Ok(())
}

/// Show one order with its line items.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` without a session, or
/// `AppError::Api` if the order does not exist or the call fails.
pub async fn show(storefront: &Storefront, id: OrderId) -> Result<(), AppError> {
    let token = require_token(storefront).await?;
    let order = storefront
        .api()
        .get_order(&token, id)
        .await
        .map_err(|e| expire_if_unauthorized(storefront, e.into()))?;

    print_order(&order);
    Ok(())
}

/// Show the payment recorded for an order.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` without a session, or
/// `AppError::Api` if no payment exists or the call fails.
pub async fn payment(storefront: &Storefront, id: OrderId) -> Result<(), AppError> {
    let token = require_token(storefront).await?;
    let payment = storefront
        .api()
        .get_payment(&token, id)
        .await
        .map_err(|e| expire_if_unauthorized(storefront, e.into()))?;

    println!("Order #{id}");
    if let Some(payment_id) = payment.payment_id {
        println!("  payment id: {payment_id}");
    }
    println!("  status: {}", payment.status.as_deref().unwrap_or("unknown"));
    if let Some(message) = &payment.message {
        println!("  {message}");
    }
    Ok(())
}

fn print_order(order: &Order) {
    println!("Order #{} ({})", order.id, order.status);
    if !order.order_date.is_empty() {
        println!("  placed: {}", order.order_date);
    }
    for item in &order.order_items {
        let name = item
            .product
            .as_ref()
            .map_or_else(|| format!("product {}", item.product_id), |p| p.name.clone());
        let price = item.price.map(|p| p.to_string()).unwrap_or_default();
        println!("  {:>4} x {:<32} {:>10}", item.quantity, name, price);
    }
    println!("  total: {}", order.total_amount);
}
