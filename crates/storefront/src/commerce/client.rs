//! REST client for the commerce backend.
//!
//! Uses `reqwest` 0.13 for HTTP. Caches catalog responses using `moka`
//! (5-minute TTL). Cart responses are never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use frontieres_core::{Cart, CartId, LineItemId, Quantity};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::auth::{SessionCredential, TokenRequest, TokenResponse};
use super::cache::{CacheKey, CacheValue};
use super::types::{
    CartEnvelope, Collection, CollectionsEnvelope, Product, ProductsEnvelope,
    RedirectSessionEnvelope, WireCollection, WireProduct,
};
use super::{
    Authorized, CheckoutCallbacks, CommerceBackend, CommerceError, LineItemInput, ProductQuery,
};
use crate::config::CommerceConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const CATALOG_TTL: Duration = Duration::from_secs(300);
const COLLECTIONS_LIMIT: u32 = 100;

/// Client for the commerce backend REST API.
///
/// Provides cart operations (via [`CommerceBackend`]) and cached catalog
/// queries.
#[derive(Clone)]
pub struct HttpCommerceClient {
    inner: Arc<HttpCommerceClientInner>,
}

struct HttpCommerceClientInner {
    client: reqwest::Client,
    api_url: String,
    client_id: Option<String>,
    stores_app_id: String,
    cache: Cache<CacheKey, CacheValue>,
    /// Visitor credential used for catalog queries, shared by all shoppers.
    catalog_credential: Mutex<Option<SessionCredential>>,
}

impl HttpCommerceClient {
    /// Create a new commerce client.
    #[must_use]
    pub fn new(config: &CommerceConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CATALOG_TTL)
            .build();

        Self {
            inner: Arc::new(HttpCommerceClientInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_owned(),
                client_id: config.client_id.clone(),
                stores_app_id: config.stores_app_id.clone(),
                cache,
                catalog_credential: Mutex::new(None),
            }),
        }
    }

    /// Whether a client id is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.client_id.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_url)
    }

    /// Send a request and decode the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommerceError> {
        let response = request.timeout(REQUEST_TIMEOUT).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(
                response_text.chars().take(200).collect(),
            ));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(CommerceError::Status {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }

    /// POST a JSON body with a visitor access token.
    async fn post_authorized<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &SessionCredential,
        body: &serde_json::Value,
    ) -> Result<T, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(path))
            .header("Authorization", &credential.access_token)
            .json(body);
        self.send(request).await
    }

    // =========================================================================
    // Visitor Tokens
    // =========================================================================

    async fn request_token(
        &self,
        body: &TokenRequest<'_>,
    ) -> Result<SessionCredential, CommerceError> {
        let issued_at = Utc::now();
        let request = self.inner.client.post(self.url("/oauth2/token")).json(body);
        let token: TokenResponse = self.send(request).await?;
        Ok(token.into_credential(issued_at))
    }

    /// Return a usable credential: the given one if still valid, else a
    /// refreshed one, else a new anonymous one.
    #[instrument(skip(self, credential), fields(has_credential = credential.is_some()))]
    async fn authorize(
        &self,
        credential: Option<SessionCredential>,
    ) -> Result<SessionCredential, CommerceError> {
        let client_id = self
            .inner
            .client_id
            .as_deref()
            .ok_or(CommerceError::NotConfigured)?;

        match credential {
            Some(credential) if !credential.is_expired(Utc::now()) => Ok(credential),
            Some(expired) => {
                let refresh = TokenRequest::Refresh {
                    client_id,
                    refresh_token: &expired.refresh_token,
                };
                match self.request_token(&refresh).await {
                    Ok(refreshed) => {
                        debug!("Visitor token refreshed");
                        Ok(refreshed)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Visitor token refresh failed, starting new session");
                        self.request_token(&TokenRequest::Anonymous { client_id })
                            .await
                    }
                }
            }
            None => {
                debug!("Issuing anonymous visitor token");
                self.request_token(&TokenRequest::Anonymous { client_id })
                    .await
            }
        }
    }

    async fn cart_call(
        &self,
        credential: Option<SessionCredential>,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Authorized<Cart>, CommerceError> {
        let credential = self.authorize(credential).await?;
        let envelope: CartEnvelope = self.post_authorized(path, &credential, &body).await?;
        Ok(Authorized {
            data: envelope.cart.into_cart()?,
            credential,
        })
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Access token for catalog queries, issued once and reused.
    async fn catalog_credential(&self) -> Result<SessionCredential, CommerceError> {
        let mut cached = self.inner.catalog_credential.lock().await;
        let credential = self.authorize(cached.take()).await?;
        *cached = Some(credential.clone());
        Ok(credential)
    }

    async fn catalog_query<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, CommerceError> {
        let credential = self.catalog_credential().await?;
        let result = self.post_authorized(path, &credential, &body).await;

        if let Err(CommerceError::Status { status: 401, .. }) = &result {
            // Revoked before expiry; issue a new one next time
            *self.inner.catalog_credential.lock().await = None;
        }
        result
    }

    /// Newest products first, optionally restricted to one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not configured or the API request
    /// fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, CommerceError> {
        let cache_key = CacheKey::Products(query.clone());

        // Check cache
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut wire_query = json!({
            "sort": json!([{"lastUpdated": "desc"}]).to_string(),
            "paging": {"limit": query.limit},
        });
        if let Some(collection) = &query.collection {
            wire_query["filter"] =
                json!({"collectionIds": {"$hasSome": [collection.as_str()]}}).to_string().into();
        }

        let envelope: ProductsEnvelope = self
            .catalog_query("/stores/v1/products/query", json!({"query": wire_query}))
            .await?;

        let products: Vec<Product> = envelope
            .products
            .into_iter()
            .filter_map(WireProduct::into_product)
            .collect();

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] if no product has this slug, or an
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, CommerceError> {
        let cache_key = CacheKey::ProductBySlug(slug.to_owned());

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let wire_query = json!({
            "filter": json!({"slug": slug}).to_string(),
            "paging": {"limit": 1},
        });
        let envelope: ProductsEnvelope = self
            .catalog_query("/stores/v1/products/query", json!({"query": wire_query}))
            .await?;

        let product = envelope
            .products
            .into_iter()
            .find_map(WireProduct::into_product)
            .ok_or_else(|| CommerceError::NotFound(format!("Product not found: {slug}")))?;

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Every collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not configured or the API request
    /// fails.
    #[instrument(skip(self))]
    pub async fn collections(&self) -> Result<Vec<Collection>, CommerceError> {
        // Check cache
        if let Some(CacheValue::Collections(collections)) =
            self.inner.cache.get(&CacheKey::Collections).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let envelope: CollectionsEnvelope = self
            .catalog_query(
                "/stores/v1/collections/query",
                json!({"query": {"paging": {"limit": COLLECTIONS_LIMIT}}}),
            )
            .await?;

        let collections: Vec<Collection> = envelope
            .collections
            .into_iter()
            .filter_map(WireCollection::into_collection)
            .collect();

        self.inner
            .cache
            .insert(
                CacheKey::Collections,
                CacheValue::Collections(collections.clone()),
            )
            .await;

        Ok(collections)
    }
}

#[async_trait]
impl CommerceBackend for HttpCommerceClient {
    #[instrument(skip(self, credential))]
    async fn current_cart(
        &self,
        credential: Option<SessionCredential>,
    ) -> Result<Authorized<Option<Cart>>, CommerceError> {
        let credential = self.authorize(credential).await?;
        let request = self
            .inner
            .client
            .get(self.url("/ecom/v1/carts/current"))
            .header("Authorization", &credential.access_token);

        let cart = match self.send::<CartEnvelope>(request).await {
            Ok(envelope) => Some(envelope.cart.into_cart()?),
            Err(CommerceError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(Authorized {
            data: cart,
            credential,
        })
    }

    #[instrument(skip(self, credential, items), fields(lines = items.len()))]
    async fn add_to_current_cart(
        &self,
        credential: Option<SessionCredential>,
        items: Vec<LineItemInput>,
    ) -> Result<Authorized<Cart>, CommerceError> {
        let line_items: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                let mut reference = json!({
                    "appId": self.inner.stores_app_id,
                    "catalogItemId": item.product.product_id.as_str(),
                });
                if !item.product.options.is_empty() {
                    reference["options"] = json!({"options": item.product.options});
                }
                json!({"catalogReference": reference, "quantity": item.quantity.get()})
            })
            .collect();

        self.cart_call(
            credential,
            "/ecom/v1/carts/current/add-to-cart",
            json!({"lineItems": line_items}),
        )
        .await
    }

    #[instrument(skip(self, credential))]
    async fn remove_line_items(
        &self,
        credential: Option<SessionCredential>,
        line_ids: Vec<LineItemId>,
    ) -> Result<Authorized<Cart>, CommerceError> {
        self.cart_call(
            credential,
            "/ecom/v1/carts/current/remove-line-items",
            json!({"lineItemIds": line_ids}),
        )
        .await
    }

    #[instrument(skip(self, credential))]
    async fn update_line_item_quantity(
        &self,
        credential: Option<SessionCredential>,
        line_id: LineItemId,
        quantity: Quantity,
    ) -> Result<Authorized<Cart>, CommerceError> {
        self.cart_call(
            credential,
            "/ecom/v1/carts/current/update-line-items-quantity",
            json!({"lineItems": [{"id": line_id, "quantity": quantity.get()}]}),
        )
        .await
    }

    #[instrument(skip(self, credential, cart_id, callbacks), fields(cart_id = %cart_id))]
    async fn create_checkout_redirect(
        &self,
        credential: Option<SessionCredential>,
        cart_id: &CartId,
        callbacks: &CheckoutCallbacks,
    ) -> Result<Authorized<String>, CommerceError> {
        let credential = self.authorize(credential).await?;
        let body = json!({
            "ecomCheckout": {"checkoutId": cart_id},
            "callbacks": {
                "postFlowUrl": callbacks.post_flow_url,
                "thankYouPageUrl": callbacks.thank_you_page_url,
            },
        });

        let envelope: RedirectSessionEnvelope = self
            .post_authorized("/redirect-session/v1/redirect-session", &credential, &body)
            .await?;

        let full_url = envelope
            .redirect_session
            .and_then(|session| session.full_url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                CommerceError::InvalidResponse("redirect session without URL".to_owned())
            })?;

        Ok(Authorized {
            data: full_url,
            credential,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use frontieres_core::CatalogReference;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> HttpCommerceClient {
        HttpCommerceClient::new(&CommerceConfig {
            api_url: server.uri(),
            client_id: Some("client-123".to_owned()),
            ..CommerceConfig::default()
        })
    }

    fn token_body(access: &str) -> serde_json::Value {
        json!({
            "access_token": access,
            "refresh_token": format!("{access}-refresh"),
            "expires_in": 14400,
            "token_type": "Bearer"
        })
    }

    fn cart_body(quantity: u32) -> serde_json::Value {
        json!({"cart": {
            "id": "cart-1",
            "currency": "EUR",
            "lineItems": [{
                "id": "line-1",
                "quantity": quantity,
                "catalogReference": {"catalogItemId": "prod-1"},
                "productName": {"original": "Mangue"},
                "price": {"amount": "3.50"}
            }]
        }})
    }

    async fn mount_anonymous_grant(server: &MockServer, access: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_partial_json(json!({"grantType": "anonymous"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access)))
            .mount(server)
            .await;
    }

    fn valid_credential(access: &str) -> SessionCredential {
        SessionCredential {
            access_token: access.to_owned(),
            refresh_token: format!("{access}-refresh"),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_not_configured() {
        let client = HttpCommerceClient::new(&CommerceConfig::default());
        assert!(!client.is_configured());
        assert!(matches!(
            client.current_cart(None).await,
            Err(CommerceError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_current_cart_issues_anonymous_token() {
        let server = MockServer::start().await;
        mount_anonymous_grant(&server, "visitor-1").await;
        Mock::given(method("GET"))
            .and(path("/ecom/v1/carts/current"))
            .and(header("authorization", "visitor-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(2)))
            .mount(&server)
            .await;

        let result = client(&server).current_cart(None).await.unwrap();
        assert_eq!(result.credential.access_token, "visitor-1");
        let cart = result.data.unwrap();
        assert_eq!(cart.item_count(), 2);
    }

    #[tokio::test]
    async fn test_current_cart_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ecom/v1/carts/current"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no cart"})))
            .mount(&server)
            .await;

        let result = client(&server)
            .current_cart(Some(valid_credential("visitor-1")))
            .await
            .unwrap();
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn test_expired_credential_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_partial_json(json!({
                "grantType": "refresh_token",
                "refresh_token": "old-refresh"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("rotated")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ecom/v1/carts/current"))
            .and(header("authorization", "rotated"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(1)))
            .mount(&server)
            .await;

        let expired = SessionCredential {
            access_token: "old".to_owned(),
            refresh_token: "old-refresh".to_owned(),
            expires_at: Utc::now() - ChronoDuration::minutes(5),
        };
        let result = client(&server).current_cart(Some(expired)).await.unwrap();
        assert_eq!(result.credential.access_token, "rotated");
    }

    #[tokio::test]
    async fn test_failed_refresh_starts_new_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_partial_json(json!({"grantType": "refresh_token"})))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;
        mount_anonymous_grant(&server, "fresh").await;
        Mock::given(method("GET"))
            .and(path("/ecom/v1/carts/current"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let expired = SessionCredential {
            access_token: "old".to_owned(),
            refresh_token: "old-refresh".to_owned(),
            expires_at: Utc::now() - ChronoDuration::minutes(5),
        };
        let result = client(&server).current_cart(Some(expired)).await.unwrap();
        assert_eq!(result.credential.access_token, "fresh");
    }

    #[tokio::test]
    async fn test_add_to_current_cart_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ecom/v1/carts/current/add-to-cart"))
            .and(body_json(json!({"lineItems": [{
                "catalogReference": {
                    "appId": "215238eb-22a5-4c36-9e7b-e7c08025e04e",
                    "catalogItemId": "prod-1",
                    "options": {"options": {"Taille": "1 kg"}}
                },
                "quantity": 2
            }]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(2)))
            .expect(1)
            .mount(&server)
            .await;

        let items = vec![LineItemInput {
            product: CatalogReference::new("prod-1").with_option("Taille", "1 kg"),
            quantity: Quantity::clamped(2),
        }];
        let result = client(&server)
            .add_to_current_cart(Some(valid_credential("visitor-1")), items)
            .await
            .unwrap();
        assert_eq!(result.data.line_items.len(), 1);
    }

    #[tokio::test]
    async fn test_update_quantity_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ecom/v1/carts/current/update-line-items-quantity"))
            .and(body_json(json!({"lineItems": [{"id": "line-1", "quantity": 3}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(3)))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .update_line_item_quantity(
                Some(valid_credential("visitor-1")),
                LineItemId::new("line-1"),
                Quantity::clamped(3),
            )
            .await
            .unwrap();
        assert_eq!(result.data.item_count(), 3);
    }

    #[tokio::test]
    async fn test_backend_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ecom/v1/carts/current/remove-line-items"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server)
            .remove_line_items(
                Some(valid_credential("visitor-1")),
                vec![LineItemId::new("line-1")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_checkout_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/redirect-session/v1/redirect-session"))
            .and(body_json(json!({
                "ecomCheckout": {"checkoutId": "cart-1"},
                "callbacks": {
                    "postFlowUrl": "https://shop.example.fr/success",
                    "thankYouPageUrl": "https://shop.example.fr/success"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "redirectSession": {"id": "rs-1", "fullUrl": "https://checkout.example.com/rs-1"}
            })))
            .mount(&server)
            .await;

        let result = client(&server)
            .create_checkout_redirect(
                Some(valid_credential("visitor-1")),
                &CartId::new("cart-1"),
                &CheckoutCallbacks::success_page("https://shop.example.fr"),
            )
            .await
            .unwrap();
        assert_eq!(result.data, "https://checkout.example.com/rs-1");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let err = client(&server)
            .current_cart(Some(valid_credential("visitor-1")))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::RateLimited(7)));
    }

    #[tokio::test]
    async fn test_products_are_cached() {
        let server = MockServer::start().await;
        mount_anonymous_grant(&server, "catalog").await;
        Mock::given(method("POST"))
            .and(path("/stores/v1/products/query"))
            .and(header("authorization", "catalog"))
            .and(body_partial_json(json!({"query": {
                "paging": {"limit": 20},
                "sort": "[{\"lastUpdated\":\"desc\"}]"
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [{"id": "prod-1", "name": "Mangue", "slug": "mangue"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let first = client.products(&ProductQuery::default()).await.unwrap();
        let second = client.products(&ProductQuery::default()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].slug, "mangue");
    }

    #[tokio::test]
    async fn test_products_filtered_by_collection() {
        let server = MockServer::start().await;
        mount_anonymous_grant(&server, "catalog").await;
        Mock::given(method("POST"))
            .and(path("/stores/v1/products/query"))
            .and(body_partial_json(json!({"query": {
                "filter": "{\"collectionIds\":{\"$hasSome\":[\"col-1\"]}}"
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
            .expect(1)
            .mount(&server)
            .await;

        let query = ProductQuery::new(Some("col-1".into()), None);
        assert!(client(&server).products(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_by_slug_not_found() {
        let server = MockServer::start().await;
        mount_anonymous_grant(&server, "catalog").await;
        Mock::given(method("POST"))
            .and(path("/stores/v1/products/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
            .mount(&server)
            .await;

        let err = client(&server).product_by_slug("absent").await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_catalog_token_reused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("catalog")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/stores/v1/collections/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "collections": [{"id": "col-1", "name": "Fruits"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/stores/v1/products/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.collections().await.unwrap().len(), 1);
        client.products(&ProductQuery::default()).await.unwrap();
    }
}
