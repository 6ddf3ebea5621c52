//! HTTP handlers for `/products`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::Json;

use crate::contexts::products::repository::Product;
use crate::contexts::products::service::{CreateProduct, ProductService, UpdatePrice};
use crate::http::response::{success, ApiError, SuccessResponse};
use crate::http::Controller;

type ProductResponse = Json<SuccessResponse<Product>>;

pub fn controller(service: Arc<ProductService>) -> Controller {
    Controller::new("/products")
        .route_with_state(Method::GET, "/", list_products, Arc::clone(&service))
        .route_with_state(Method::GET, "/{id}", get_product, Arc::clone(&service))
        .route_with_state(Method::POST, "/", create_product, Arc::clone(&service))
        .route_with_state(Method::PUT, "/{id}/price", update_price, service)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

async fn list_products(State(service): State<Arc<ProductService>>) -> Json<SuccessResponse<Vec<Product>>> {
    success("PRODUCTS_FETCHED", "products retrieved", service.list().await)
}

async fn get_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<String>,
) -> Result<ProductResponse, ApiError> {
    let product = service.get(&id).await?;
    Ok(success("PRODUCT_FETCHED", "product retrieved", product))
}

async fn create_product(
    State(service): State<Arc<ProductService>>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> Result<(StatusCode, ProductResponse), ApiError> {
    let product = service.create(body(payload)?).await?;
    Ok((StatusCode::CREATED, success("PRODUCT_CREATED", "product created", product)))
}

async fn update_price(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePrice>, JsonRejection>,
) -> Result<ProductResponse, ApiError> {
    let product = service.update_price(&id, body(payload)?).await?;
    Ok(success("PRODUCT_PRICE_UPDATED", "product price updated", product))
}
