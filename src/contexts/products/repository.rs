//! Product storage.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// Storage port for products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: Product);
    /// Replace the stored product with the same id. Returns false if absent.
    async fn update(&self, product: Product) -> bool;
    async fn find_by_id(&self, id: &str) -> Option<Product>;
    async fn find_by_sku(&self, sku: &str) -> Option<Product>;
    async fn list(&self) -> Vec<Product>;
}

#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, product: Product) {
        self.products.write().await.push(product);
    }

    async fn update(&self, product: Product) -> bool {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|stored| stored.id == product.id) {
            Some(stored) => {
                *stored = product;
                true
            }
            None => false,
        }
    }

    async fn find_by_id(&self, id: &str) -> Option<Product> {
        self.products.read().await.iter().find(|product| product.id == id).cloned()
    }

    async fn find_by_sku(&self, sku: &str) -> Option<Product> {
        self.products.read().await.iter().find(|product| product.sku == sku).cloned()
    }

    async fn list(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }
}
