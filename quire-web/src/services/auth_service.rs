// Quire - A component-based CMS built with Rust
// Copyright (C) 2025 Quire Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::AppError;
use quire_core::models::permission::Role;
use quire_core::models::user::User;
use quire_core::validation::{Field, Rule, Validate};
use quire_core::{Claims, IdentityStore, PasswordHasher, TokenManager};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Returned for unknown emails and wrong passwords alike
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("email", &self.email, &[Rule::Required, Rule::Email]),
            Field::new("password", &self.password, &[Rule::Required, Rule::Min(6)]),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl Validate for RegisterRequest {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("email", &self.email, &[Rule::Required, Rule::Email]),
            Field::new(
                "password",
                &self.password,
                &[Rule::Required, Rule::Min(6), Rule::Max(128)],
            ),
            Field::new("name", &self.name, &[Rule::Required, Rule::Min(2), Rule::Max(100)]),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn IdentityStore>,
    tokens: Arc<TokenManager>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn IdentityStore>,
        tokens: Arc<TokenManager>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AppError> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

        if !user.is_active {
            return Err(AppError::forbidden("User account is inactive"));
        }

        let valid = self
            .hasher
            .verify(&request.password, &user.password_hash)
            .map_err(|e| {
                AppError::internal("Failed to verify password").with_details(e.to_string())
            })?;
        if !valid {
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let user_id = user
            .id
            .ok_or_else(|| AppError::internal("Stored user is missing its id"))?;

        let token = self
            .tokens
            .issue(user_id, &user.email, user.role.as_str())
            .map_err(|e| AppError::internal("Failed to generate token").with_details(e.to_string()))?;

        let users = self.users.clone();
        tokio::spawn(async move {
            if let Err(e) = users.update_last_login(user_id).await {
                tracing::warn!(user_id, error = ?e, "Failed to record last login");
            }
        });

        tracing::info!(user_id, email = %user.email, "User logged in");

        Ok(LoginResponse { token, user })
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        if self
            .users
            .find_by_email(&request.email)
            .await
            .map_err(AppError::from)?
            .is_some()
        {
            return Err(AppError::conflict("User with this email already exists"));
        }

        let password_hash = self.hasher.hash(&request.password).map_err(|e| {
            AppError::internal("Failed to hash password").with_details(e.to_string())
        })?;

        let role = request
            .role
            .as_deref()
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or_else(Role::lowest);

        let mut user = User::new(
            request.email.clone(),
            request.name.clone(),
            password_hash,
            role,
        );
        let id = self.users.create(&user).await.map_err(|e| {
            AppError::internal("Failed to create user").with_details(format!("{:?}", e))
        })?;
        user.id = Some(id);

        tracing::info!(user_id = id, email = %user.email, role = %user.role, "User registered");

        Ok(user)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens
            .validate(token)
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_helpers::{fast_hasher, test_pool};
    use quire_db::UserRepository;

    async fn service() -> (AuthService, UserRepository) {
        let pool = test_pool().await;
        let users = UserRepository::new(pool);
        let tokens = Arc::new(TokenManager::new("test-secret", chrono::Duration::hours(24)));
        (
            AuthService::new(Arc::new(users.clone()), tokens, fast_hasher()),
            users,
        )
    }

    fn register_request(email: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "secretpw".to_string(),
            name: "Alice".to_string(),
            role: role.map(str::to_string),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, _) = service().await;

        let user = service
            .register(&register_request("alice@example.com", None))
            .await
            .unwrap();
        assert!(user.id.is_some());
        assert_eq!(user.role, Role::Viewer);

        let response = service
            .login(&login_request("alice@example.com", "secretpw"))
            .await
            .unwrap();
        assert_eq!(response.user.email, "alice@example.com");

        let claims = service.validate_token(&response.token).unwrap();
        assert_eq!(claims.user_id(), user.id.unwrap());
        assert_eq!(claims.role, "viewer");
    }

    #[tokio::test]
    async fn test_register_role_handling() {
        let (service, _) = service().await;

        let editor = service
            .register(&register_request("ed@example.com", Some("editor")))
            .await
            .unwrap();
        assert_eq!(editor.role, Role::Editor);

        let unknown = service
            .register(&register_request("who@example.com", Some("superuser")))
            .await
            .unwrap();
        assert_eq!(unknown.role, Role::Viewer);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (service, _) = service().await;
        service
            .register(&register_request("alice@example.com", None))
            .await
            .unwrap();

        let err = service
            .register(&register_request("alice@example.com", None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "User with this email already exists");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = service().await;
        service
            .register(&register_request("alice@example.com", None))
            .await
            .unwrap();

        let wrong_password = service
            .login(&login_request("alice@example.com", "wrongpw"))
            .await
            .unwrap_err();
        let unknown_user = service
            .login(&login_request("nobody@example.com", "secretpw"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.code, ErrorCode::Unauthorized);
        assert_eq!(wrong_password.status, unknown_user.status);
        assert_eq!(wrong_password.message, unknown_user.message);
        assert_eq!(wrong_password.message, INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_inactive_user_is_forbidden() {
        let (service, users) = service().await;
        let mut user = User::new(
            "gone@example.com".to_string(),
            "Gone".to_string(),
            fast_hasher().hash("secretpw").unwrap(),
            Role::Editor,
        );
        user.is_active = false;
        users.create(&user).await.unwrap();

        let err = service
            .login(&login_request("gone@example.com", "secretpw"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.message, "User account is inactive");
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_internal() {
        let (service, users) = service().await;
        users
            .create(&User::new(
                "broken@example.com".to_string(),
                "Broken".to_string(),
                "not-a-hash".to_string(),
                Role::Viewer,
            ))
            .await
            .unwrap();

        let err = service
            .login(&login_request("broken@example.com", "secretpw"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "Failed to verify password");
    }

    #[tokio::test]
    async fn test_validate_token_rejects_garbage() {
        let (service, _) = service().await;
        let err = service.validate_token("not.a.token").unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, "Invalid or expired token");
    }

    #[test]
    fn test_request_validation_rules() {
        assert!(login_request("alice@example.com", "secretpw").validate().is_ok());
        assert!(login_request("not-an-email", "secretpw").validate().is_err());
        assert!(login_request("alice@example.com", "short").validate().is_err());

        let mut register = register_request("alice@example.com", None);
        assert!(register.validate().is_ok());
        register.name = "A".to_string();
        let errors = register.validate().unwrap_err();
        assert_eq!(errors.errors()[0].field, "name");
        register.name = "Alice".to_string();
        register.password = "x".repeat(129);
        assert!(register.validate().is_err());
    }
}
