//! HTTP handlers for `/users`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::Json;

use crate::contexts::users::repository::User;
use crate::contexts::users::service::{CreateUser, UpdateProfile, UpdateStatus, UserService};
use crate::http::response::{success, ApiError, SuccessResponse};
use crate::http::Controller;

pub fn controller(service: Arc<UserService>) -> Controller {
    Controller::new("/users")
        .route_with_state(Method::POST, "/", create_user, Arc::clone(&service))
        .route_with_state(Method::GET, "/", list_users, Arc::clone(&service))
        .route_with_state(Method::GET, "/{id}", get_user, Arc::clone(&service))
        .route_with_state(Method::PUT, "/{id}/profile", update_profile, Arc::clone(&service))
        .route_with_state(Method::PUT, "/{id}/status", update_status, service)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

async fn list_users(State(service): State<Arc<UserService>>) -> Json<SuccessResponse<Vec<User>>> {
    success("USERS_RETRIEVED", "Users retrieved successfully", service.list().await)
}

async fn get_user(
    State(service): State<Arc<UserService>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse<User>>, ApiError> {
    let user = service.get(&id).await?;
    Ok(success("USER_RETRIEVED", "User retrieved successfully", user))
}

async fn create_user(
    State(service): State<Arc<UserService>>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<SuccessResponse<User>>), ApiError> {
    let user = service.create(body(payload)?).await?;
    Ok((
        StatusCode::CREATED,
        success("USER_CREATED", "User created successfully", user),
    ))
}

async fn update_profile(
    State(service): State<Arc<UserService>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProfile>, JsonRejection>,
) -> Result<Json<SuccessResponse<User>>, ApiError> {
    let user = service.update_profile(&id, body(payload)?).await?;
    Ok(success("USER_PROFILE_UPDATED", "User profile updated successfully", user))
}

async fn update_status(
    State(service): State<Arc<UserService>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatus>, JsonRejection>,
) -> Result<Json<SuccessResponse<User>>, ApiError> {
    let user = service.update_status(&id, body(payload)?).await?;
    Ok(success("USER_STATUS_UPDATED", "User status updated successfully", user))
}
