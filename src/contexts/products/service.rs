//! Product use cases.
//!
//! Owners are checked against the user repository exported by the user
//! management module.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::contexts::products::repository::{Money, Product, ProductRepository};
use crate::contexts::users::UserRepository;
use crate::http::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("product {0} not found")]
    NotFound(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("sku {0} is already in use")]
    SkuTaken(String),

    #[error("owner {0} does not exist")]
    UnknownOwner(String),
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ProductError::MissingField(_) => ApiError::BadRequest(err.to_string()),
            ProductError::Invalid(_) | ProductError::UnknownOwner(_) => ApiError::Validation(err.to_string()),
            ProductError::SkuTaken(_) => ApiError::Conflict(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrice {
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
}

pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { products, users }
    }

    pub async fn list(&self) -> Vec<Product> {
        self.products.list().await
    }

    pub async fn get(&self, id: &str) -> Result<Product, ProductError> {
        self.products
            .find_by_id(id)
            .await
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    pub async fn create(&self, input: CreateProduct) -> Result<Product, ProductError> {
        let name = required(input.name, "name")?;
        let sku = required(input.sku, "sku")?.to_uppercase();
        let price = money(input.price_cents, input.currency)?;
        let description = input
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if self.products.find_by_sku(&sku).await.is_some() {
            return Err(ProductError::SkuTaken(sku));
        }
        if let Some(owner) = &input.owner_id {
            if self.users.find_by_id(owner).await.is_none() {
                return Err(ProductError::UnknownOwner(owner.clone()));
            }
        }

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name,
            sku,
            description,
            price,
            owner_id: input.owner_id,
        };
        self.products.insert(product.clone()).await;
        tracing::debug!(product_id = %product.id, "Product created");
        Ok(product)
    }

    pub async fn update_price(&self, id: &str, input: UpdatePrice) -> Result<Product, ProductError> {
        let price = money(input.price_cents, input.currency)?;
        let mut product = self.get(id).await?;
        product.price = price;

        if !self.products.update(product.clone()).await {
            return Err(ProductError::NotFound(id.to_string()));
        }
        Ok(product)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ProductError> {
    match value.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ProductError::MissingField(field)),
    }
}

fn money(amount_cents: Option<i64>, currency: Option<String>) -> Result<Money, ProductError> {
    let amount_cents = amount_cents.ok_or(ProductError::MissingField("priceCents"))?;
    if amount_cents < 0 {
        return Err(ProductError::Invalid("priceCents must not be negative".to_string()));
    }

    let currency = required(currency, "currency")?.to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ProductError::Invalid(format!("currency {currency} is not an ISO 4217 code")));
    }

    Ok(Money {
        amount_cents,
        currency,
    })
}
