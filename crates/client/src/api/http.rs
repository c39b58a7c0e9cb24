//! HTTP implementation of [`StorefrontApi`].
//!
//! Uses `reqwest` for HTTP and `serde_json` for typed response parsing.
//! Caches categories and products using `moka` (5-minute TTL by default).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use storefront_core::{Category, CategoryId, Email, Order, OrderId, Product, ProductId};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    Acknowledgement, AuthResponse, AuthResponseBody, CheckoutRequest, ContactMessage,
    Credentials, PaymentConfirmation, PaymentRequest, Profile, Registration,
};
use super::{ApiError, StorefrontApi};

/// Maximum number of cached catalog responses.
const CACHE_CAPACITY: u64 = 1000;

/// Maximum number of body characters echoed into logs.
const LOG_BODY_LIMIT: usize = 500;

/// Connection settings for [`HttpApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `http://127.0.0.1:5000/api`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Catalog cache TTL. Zero disables caching.
    pub catalog_cache_ttl: Duration,
}

impl ApiConfig {
    /// Settings for `base_url` with default timeout and cache TTL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(15),
            catalog_cache_ttl: Duration::from_secs(300),
        }
    }
}

// =============================================================================
// HttpApiClient
// =============================================================================

/// Client for the storefront backend's JSON API.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct HttpApiClient {
    inner: Arc<HttpApiClientInner>,
}

struct HttpApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.inner.base_url)
            .field("cached", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}

/// Wire body for `POST /auth/login`.
#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Wire body for `POST /auth/register`.
#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    phone: &'a str,
    address: &'a str,
}

/// Error payload. Application errors use `message`, JWT failures use `msg`.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(HttpApiClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Drop every cached catalog response.
    ///
    /// Called after a successful checkout, since stock levels have changed.
    pub fn invalidate_catalog(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
        }
    }

    /// Build the URL for an API path.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.inner.base_url,
            path.trim_start_matches('/')
        ))?)
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.client.get(self.endpoint(path)?))
    }

    fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.client.post(self.endpoint(path)?).json(body))
    }

    /// Send a request and parse a successful JSON body as `T`.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            tracing::warn!(status = %status, error = %err, "Storefront API returned non-success status");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn cache_get(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.as_ref()?.get(key).await;
        if value.is_some() {
            debug!(?key, "Catalog cache hit");
        }
        value
    }

    async fn cache_put(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }
}

/// Map a non-success response to an [`ApiError`], preferring the body's
/// message over a generic one.
fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.msg).or(b.error))
        .unwrap_or_else(|| format!("API error: {}", status.as_u16()));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn bearer(request: RequestBuilder, token: &SecretString) -> RequestBuilder {
    request.bearer_auth(token.expose_secret())
}

impl StorefrontApi for HttpApiClient {
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let body = RegisterBody {
            name: &registration.name,
            email: registration.email.as_str(),
            password: registration.password.expose_secret(),
            phone: &registration.phone,
            address: &registration.address,
        };
        let response: AuthResponseBody = self.execute(self.post("auth/register", &body)?).await?;
        AuthResponse::try_from(response)
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let body = LoginBody {
            email: credentials.email.as_str(),
            password: credentials.password.expose_secret(),
        };
        let response: AuthResponseBody = self.execute(self.post("auth/login", &body)?).await?;
        AuthResponse::try_from(response)
    }

    #[instrument(skip(self, token))]
    async fn fetch_profile(&self, token: &SecretString) -> Result<Profile, ApiError> {
        self.execute(bearer(self.get("auth/profile")?, token)).await
    }

    #[instrument(skip(self, token, request), fields(lines = request.items.len()))]
    async fn checkout(
        &self,
        token: &SecretString,
        request: &CheckoutRequest,
    ) -> Result<Order, ApiError> {
        let order: Order = self
            .execute(bearer(self.post("checkout", request)?, token))
            .await?;
        self.invalidate_catalog();
        Ok(order)
    }

    #[instrument(skip(self, token, request), fields(order_id = %request.order_id))]
    async fn process_payment(
        &self,
        token: &SecretString,
        request: &PaymentRequest,
    ) -> Result<PaymentConfirmation, ApiError> {
        self.execute(bearer(self.post("payment", request)?, token))
            .await
    }

    #[instrument(skip(self, token))]
    async fn get_payment(
        &self,
        token: &SecretString,
        order_id: OrderId,
    ) -> Result<PaymentConfirmation, ApiError> {
        self.execute(bearer(self.get(&format!("payment/{order_id}"))?, token))
            .await
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = CacheKey::Categories;
        if let Some(CacheValue::Categories(categories)) = self.cache_get(&cache_key).await {
            return Ok(categories);
        }

        let categories: Vec<Category> = self.execute(self.get("categories")?).await?;
        self.cache_put(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn list_products(&self, category: Option<CategoryId>) -> Result<Vec<Product>, ApiError> {
        let cache_key = CacheKey::Products { category };
        if let Some(CacheValue::Products(products)) = self.cache_get(&cache_key).await {
            return Ok(products);
        }

        let mut url = self.endpoint("products")?;
        if let Some(id) = category {
            url.query_pairs_mut()
                .append_pair("category_id", &id.to_string());
        }
        let products: Vec<Product> = self.execute(self.inner.client.get(url)).await?;
        self.cache_put(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache_get(&cache_key).await {
            return Ok(*product);
        }

        let product: Product = self.execute(self.get(&format!("products/{id}"))?).await?;
        self.cache_put(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self, token))]
    async fn list_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        self.execute(bearer(self.get("orders")?, token)).await
    }

    #[instrument(skip(self, token))]
    async fn get_order(&self, token: &SecretString, id: OrderId) -> Result<Order, ApiError> {
        self.execute(bearer(self.get(&format!("orders/{id}"))?, token))
            .await
    }

    #[instrument(skip(self, message), fields(email = %message.email))]
    async fn contact(&self, message: &ContactMessage) -> Result<Acknowledgement, ApiError> {
        self.execute(self.post("contact", message)?).await
    }

    /// The backend reads the body as a bare JSON string.
    #[instrument(skip(self, token))]
    async fn subscribe_newsletter(
        &self,
        token: Option<&SecretString>,
        email: &Email,
    ) -> Result<Acknowledgement, ApiError> {
        let request = self.post("auth/subscribe", email)?;
        let request = match token {
            Some(token) => bearer(request, token),
            None => request,
        };
        self.execute(request).await
    }
}
