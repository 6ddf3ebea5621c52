//! User use cases.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::contexts::users::repository::{User, UserRepository, UserStatus};
use crate::http::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("email {0} is not valid")]
    InvalidEmail(String),

    #[error("email {0} is already registered")]
    EmailTaken(String),

    #[error("status must be either \"active\" or \"suspended\", got \"{0}\"")]
    InvalidStatus(String),

    #[error("user is already {}", .0.as_str())]
    StatusUnchanged(UserStatus),
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => ApiError::NotFound(err.to_string()),
            UserError::MissingField(_) => ApiError::BadRequest(err.to_string()),
            UserError::InvalidEmail(_) | UserError::InvalidStatus(_) | UserError::StatusUnchanged(_) => {
                ApiError::Validation(err.to_string())
            }
            UserError::EmailTaken(_) => ApiError::Conflict(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Partial profile change; absent or blank fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatus {
    pub status: Option<String>,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> Vec<User> {
        self.repository.list().await
    }

    pub async fn get(&self, id: &str) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    pub async fn create(&self, input: CreateUser) -> Result<User, UserError> {
        let full_name = required(input.full_name, "fullName")?;
        let email = normalize_email(required(input.email, "email")?)?;
        if self.repository.find_by_email(&email).await.is_some() {
            return Err(UserError::EmailTaken(email));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            full_name,
            email,
            status: UserStatus::Active,
        };
        self.repository.insert(user.clone()).await;
        tracing::debug!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn update_profile(&self, id: &str, input: UpdateProfile) -> Result<User, UserError> {
        let mut user = self.get(id).await?;

        if let Some(email) = optional(input.email) {
            let email = normalize_email(email)?;
            if email != user.email {
                if self.repository.find_by_email(&email).await.is_some() {
                    return Err(UserError::EmailTaken(email));
                }
                user.email = email;
            }
        }
        if let Some(full_name) = optional(input.full_name) {
            user.full_name = full_name;
        }

        self.save(user).await
    }

    pub async fn update_status(&self, id: &str, input: UpdateStatus) -> Result<User, UserError> {
        let requested = required(input.status, "status")?;
        let mut user = self.get(id).await?;

        let status = match requested.as_str() {
            "active" => UserStatus::Active,
            "suspended" => UserStatus::Suspended,
            _ => return Err(UserError::InvalidStatus(requested)),
        };
        if user.status == status {
            return Err(UserError::StatusUnchanged(status));
        }
        user.status = status;

        self.save(user).await
    }

    async fn save(&self, user: User) -> Result<User, UserError> {
        if !self.repository.update(user.clone()).await {
            return Err(UserError::NotFound(user.id));
        }
        tracing::debug!(user_id = %user.id, status = user.status.as_str(), "User updated");
        Ok(user)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, UserError> {
    optional(value).ok_or(UserError::MissingField(field))
}

fn optional(value: Option<String>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Some(trimmed.to_string()),
        _ => None,
    }
}

fn normalize_email(email: String) -> Result<String, UserError> {
    let email = email.to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(email)
    } else {
        Err(UserError::InvalidEmail(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contexts::users::repository::InMemoryUserRepository;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryUserRepository::new()))
    }

    fn input(name: &str, email: &str) -> CreateUser {
        CreateUser {
            full_name: Some(name.to_string()),
            email: Some(email.to_string()),
        }
    }

    #[tokio::test]
    async fn creates_and_fetches_user() {
        let service = service();
        let user = service.create(input("  Ada Lovelace ", "Ada@Example.com")).await.unwrap();

        assert_eq!(user.full_name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(service.get(&user.id).await.unwrap(), user);
        assert_eq!(service.list().await, vec![user]);
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        let service = service();
        assert_eq!(
            service.create(CreateUser::default()).await,
            Err(UserError::MissingField("fullName"))
        );
        assert_eq!(
            service.create(input("Ada", "nope")).await,
            Err(UserError::InvalidEmail("nope".into()))
        );
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let service = service();
        service.create(input("Ada", "ada@example.com")).await.unwrap();

        let err = service.create(input("Other", "ADA@example.com")).await.unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn profile_update_keeps_blank_fields_and_guards_email() {
        let service = service();
        let ada = service.create(input("Ada", "ada@example.com")).await.unwrap();
        service.create(input("Grace", "grace@example.com")).await.unwrap();

        let updated = service
            .update_profile(
                &ada.id,
                UpdateProfile {
                    full_name: Some("  ".into()),
                    email: Some("Ada.L@Example.com".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Ada");
        assert_eq!(updated.email, "ada.l@example.com");
        assert_eq!(service.get(&ada.id).await.unwrap(), updated);

        let taken = UpdateProfile {
            email: Some("grace@example.com".into()),
            ..Default::default()
        };
        assert_eq!(
            service.update_profile(&ada.id, taken).await,
            Err(UserError::EmailTaken("grace@example.com".into()))
        );

        // Re-submitting the current address is not a conflict.
        let same = UpdateProfile {
            email: Some("ada.l@example.com".into()),
            ..Default::default()
        };
        assert!(service.update_profile(&ada.id, same).await.is_ok());
    }

    #[tokio::test]
    async fn status_moves_between_active_and_suspended() {
        let service = service();
        let user = service.create(input("Ada", "ada@example.com")).await.unwrap();
        let status = |value: &str| UpdateStatus {
            status: Some(value.to_string()),
        };

        let suspended = service.update_status(&user.id, status("suspended")).await.unwrap();
        assert_eq!(suspended.status, UserStatus::Suspended);
        assert_eq!(
            service.update_status(&user.id, status("suspended")).await,
            Err(UserError::StatusUnchanged(UserStatus::Suspended))
        );
        assert_eq!(
            service.update_status(&user.id, status("deleted")).await,
            Err(UserError::InvalidStatus("deleted".into()))
        );
        assert_eq!(
            service.update_status(&user.id, UpdateStatus::default()).await,
            Err(UserError::MissingField("status"))
        );

        let active = service.update_status(&user.id, status("active")).await.unwrap();
        assert_eq!(active.status, UserStatus::Active);
        assert!(matches!(
            service.update_status("missing", status("active")).await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let err = service().get("missing").await.unwrap_err();
        assert_eq!(ApiError::from(err).code(), "not_found");
    }
}
