//! Product management module.
//!
//! Imports user management and resolves its exported user repository
//! through the root scope.

mod handlers;
pub mod repository;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;

use crate::contexts::users::UserManagementModule;
use crate::di::{BoxError, Module, Registry, ServiceId, ServiceKey};
use crate::http::Controller;

pub use repository::{InMemoryProductRepository, Money, Product, ProductRepository};
pub use service::{CreateProduct, ProductError, ProductService, UpdatePrice};

#[derive(Debug, Clone, Copy)]
pub struct ProductTokens {
    pub repository: ServiceId<Arc<dyn ProductRepository>>,
    pub service: ServiceId<Arc<ProductService>>,
}

pub struct ProductManagementModule {
    users: Arc<UserManagementModule>,
    tokens: ProductTokens,
}

impl ProductManagementModule {
    pub fn new(users: Arc<UserManagementModule>) -> Self {
        Self {
            users,
            tokens: ProductTokens {
                repository: ServiceId::new("ProductRepository"),
                service: ServiceId::new("ProductService"),
            },
        }
    }

    pub fn tokens(&self) -> ProductTokens {
        self.tokens
    }
}

#[async_trait]
impl Module for ProductManagementModule {
    fn name(&self) -> &str {
        "ProductManagement"
    }

    async fn configure(&self, registry: &Registry) -> Result<(), BoxError> {
        let tokens = self.tokens;
        let user_repository = self.users.tokens().repository;

        registry.bind_factory(&tokens.repository, |_: Registry| async {
            Ok::<_, BoxError>(Arc::new(InMemoryProductRepository::new()) as Arc<dyn ProductRepository>)
        })?;

        registry.bind_factory(&tokens.service, move |scope: Registry| async move {
            let products = scope.resolve(&tokens.repository).await?;
            let users = scope.resolve(&user_repository).await?;
            Ok::<_, BoxError>(Arc::new(ProductService::new(products, users)))
        })?;

        Ok(())
    }

    fn exports(&self) -> Vec<ServiceKey> {
        vec![self.tokens.repository.key(), self.tokens.service.key()]
    }

    fn imports(&self) -> Vec<Arc<dyn Module>> {
        vec![Arc::clone(&self.users) as Arc<dyn Module>]
    }

    async fn controllers(&self, registry: &Registry) -> Result<Vec<Controller>, BoxError> {
        let service = registry.resolve(&self.tokens.service).await?;
        Ok(vec![handlers::controller(service)])
    }
}
