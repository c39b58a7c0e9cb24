//! Storefront context shared across the application.

use std::sync::Arc;

use crate::api::{HttpApiClient, StorefrontApi};
use crate::cart::CartManager;
use crate::checkout::CheckoutService;
use crate::config::ClientConfig;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::session::SessionManager;
use crate::store::{FileStore, SharedStore};

/// Everything a storefront UI needs, built once per application lifetime.
///
/// This struct is cheaply cloneable via `Arc`; clones share the store, the
/// API client, the notifier and both managers.
pub struct Storefront<A = HttpApiClient> {
    inner: Arc<StorefrontInner<A>>,
}

struct StorefrontInner<A> {
    api: Arc<A>,
    notifier: Notifier,
    cart: Arc<CartManager>,
    session: Arc<SessionManager<A>>,
    checkout: CheckoutService<A>,
}

impl<A> Clone for Storefront<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> std::fmt::Debug for Storefront<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("cart", &self.inner.cart)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl<A: StorefrontApi> Storefront<A> {
    /// Wire the managers to `store` and `api`.
    ///
    /// The cart is hydrated immediately. The session stays in the loading
    /// state until [`SessionManager::bootstrap`] runs.
    #[must_use]
    pub fn new(store: SharedStore, api: A, notifier: Notifier) -> Self {
        let api = Arc::new(api);
        let cart = Arc::new(CartManager::new(store.clone(), notifier.clone()));
        let session = Arc::new(SessionManager::new(
            api.clone(),
            store,
            notifier.clone(),
        ));
        let checkout = CheckoutService::new(
            api.clone(),
            session.clone(),
            cart.clone(),
            notifier.clone(),
        );

        Self {
            inner: Arc::new(StorefrontInner {
                api,
                notifier,
                cart,
                session,
                checkout,
            }),
        }
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// Get a reference to the notification publisher.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.inner.cart
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager<A> {
        &self.inner.session
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService<A> {
        &self.inner.checkout
    }
}

impl Storefront<HttpApiClient> {
    /// Build a context backed by the HTTP client and a file store in
    /// `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the state directory cannot be created, or
    /// `AppError::Api` if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        let store: SharedStore = Arc::new(FileStore::open(config.state_dir.clone())?);
        let api = HttpApiClient::new(&config.api)?;
        let notifier = Notifier::new(config.notification_capacity);

        Ok(Self::new(store, api, notifier))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::notify::NotificationKind;
    use crate::store::{KeyValueStore, MemoryStore, keys};
    use crate::testing::{FakeApi, product};

    #[tokio::test]
    async fn test_clones_share_managers() {
        let store = Arc::new(MemoryStore::new());
        let storefront = Storefront::new(
            store.clone(),
            FakeApi::with_account("ada@example.com", "hunter22", "Ada"),
            Notifier::default(),
        );
        let mut rx = storefront.notifier().subscribe();
        let other = storefront.clone();

        other.cart().add_item(&product(1, "Tee", "10", 3), 1);
        other
            .session()
            .login("ada@example.com", SecretString::from("hunter22".to_string()))
            .await
            .unwrap();

        assert_eq!(storefront.cart().totals().total_items, 1);
        assert!(storefront.session().is_authenticated());
        assert!(store.get(keys::CART).unwrap().is_some());
        assert!(store.get(keys::TOKEN).unwrap().is_some());
        assert_eq!(
            rx.try_recv().unwrap().kind,
            NotificationKind::ItemAdded {
                product_id: storefront_core::ProductId::new(1)
            }
        );
        assert_eq!(rx.try_recv().unwrap().kind, NotificationKind::LoginSucceeded);
    }

    #[test]
    fn test_from_config_creates_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig {
            api: crate::api::ApiConfig::new("http://127.0.0.1:5000/api".parse().unwrap()),
            state_dir: dir.path().join("state"),
            notification_capacity: 4,
        };
        config.api.catalog_cache_ttl = std::time::Duration::ZERO;

        let storefront = Storefront::from_config(&config).unwrap();

        assert!(config.state_dir.is_dir());
        assert!(storefront.cart().is_empty());
        assert!(!storefront.session().is_loading());
    }
}
