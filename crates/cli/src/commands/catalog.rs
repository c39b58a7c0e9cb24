//! Catalog browsing commands.

use storefront_client::{AppError, Storefront, StorefrontApi};
use storefront_core::{CategoryId, ProductId};

/// List all categories.
///
/// # Errors
///
/// Returns `AppError::Api` if the backend call fails.
pub async fn categories(storefront: &Storefront) -> Result<(), AppError> {
    let categories = storefront.api().list_categories().await?;
    tracing::debug!(count = categories.len(), "Fetched categories");

    for category in &categories {
        println!("{:>6}  {}", category.id, category.name);
    }
    Ok(())
}

/// List products, optionally restricted to one category.
///
/// # Errors
///
/// Returns `AppError::Api` if the backend call fails.
pub async fn products(storefront: &Storefront, category: Option<CategoryId>) -> Result<(), AppError> {
    let products = storefront.api().list_products(category).await?;
    tracing::debug!(count = products.len(), ?category, "Fetched products");

    for product in &products {
        println!(
            "{:>6}  {:<32} {:>10}  stock {}",
            product.id, product.name, product.price.to_string(), product.stock
        );
    }
    Ok(())
}

/// Show one product in detail.
///
/// # Errors
///
/// Returns `AppError::Api` if the product does not exist or the call fails.
pub async fn product(storefront: &Storefront, id: ProductId) -> Result<(), AppError> {
    let product = storefront.api().get_product(id).await?;

    println!("{} (#{})", product.name, product.id);
    println!("  price: {}", product.price);
    println!("  stock: {}", product.stock);
    if let Some(category) = &product.category {
        println!("  category: {category}");
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    Ok(())
}
