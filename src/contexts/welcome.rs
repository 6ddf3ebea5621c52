//! Greeting module with no services of its own.

use async_trait::async_trait;
use axum::extract::Path;
use axum::http::Method;
use axum::Json;

use crate::di::{BoxError, Module, Registry};
use crate::http::response::{acknowledge, SuccessResponse};
use crate::http::Controller;

pub struct WelcomeModule;

#[async_trait]
impl Module for WelcomeModule {
    fn name(&self) -> &str {
        "Welcome"
    }

    async fn configure(&self, _registry: &Registry) -> Result<(), BoxError> {
        Ok(())
    }

    async fn controllers(&self, _registry: &Registry) -> Result<Vec<Controller>, BoxError> {
        Ok(vec![Controller::new("/").route(Method::GET, "/hello/{name}", hello)])
    }
}

async fn hello(Path(name): Path<String>) -> Json<SuccessResponse<()>> {
    acknowledge("WELCOME_000", format!("hello {name}"))
}
