//! User management module.
//!
//! Binds the user repository and service in its own scope and exports
//! both, so importing modules can look users up through the root.

mod handlers;
pub mod repository;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;

use crate::di::{BoxError, Module, Registry, ServiceId, ServiceKey};
use crate::http::Controller;

pub use repository::{InMemoryUserRepository, User, UserRepository, UserStatus};
pub use service::{CreateUser, UpdateProfile, UpdateStatus, UserError, UserService};

/// Ids under which this module binds its services.
#[derive(Debug, Clone, Copy)]
pub struct UserTokens {
    pub repository: ServiceId<Arc<dyn UserRepository>>,
    pub service: ServiceId<Arc<UserService>>,
}

pub struct UserManagementModule {
    tokens: UserTokens,
}

impl UserManagementModule {
    pub fn new() -> Self {
        Self {
            tokens: UserTokens {
                repository: ServiceId::new("UserRepository"),
                service: ServiceId::new("UserService"),
            },
        }
    }

    pub fn tokens(&self) -> UserTokens {
        self.tokens
    }
}

impl Default for UserManagementModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for UserManagementModule {
    fn name(&self) -> &str {
        "UserManagement"
    }

    async fn configure(&self, registry: &Registry) -> Result<(), BoxError> {
        let tokens = self.tokens;

        registry.bind_factory(&tokens.repository, |_: Registry| async {
            Ok::<_, BoxError>(Arc::new(InMemoryUserRepository::new()) as Arc<dyn UserRepository>)
        })?;

        registry.bind_factory(&tokens.service, move |scope: Registry| async move {
            let repository = scope.resolve(&tokens.repository).await?;
            Ok::<_, BoxError>(Arc::new(UserService::new(repository)))
        })?;

        Ok(())
    }

    fn exports(&self) -> Vec<ServiceKey> {
        vec![self.tokens.repository.key(), self.tokens.service.key()]
    }

    async fn controllers(&self, registry: &Registry) -> Result<Vec<Controller>, BoxError> {
        let service = registry.resolve(&self.tokens.service).await?;
        Ok(vec![handlers::controller(service)])
    }
}
