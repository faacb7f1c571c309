use super::{
    models::{User, UserData},
    repository::{RepositoryError, UserRepository},
};
use crate::{errors::ApiError, http::DataResponse};
use axum::http::StatusCode;

pub fn parse_user_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidUserId)
}

fn write_error(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::DuplicateUserName => ApiError::UserNameAlreadyExists,
        RepositoryError::Store(e) => ApiError::UserWriteFailed(e.to_string()),
    }
}

pub struct UserHandlers<U: UserRepository> {
    user_repo: U,
}

impl<U: UserRepository> UserHandlers<U> {
    pub fn new(user_repo: U) -> Self {
        Self { user_repo }
    }

    pub async fn handle_get_all(&self) -> Result<DataResponse<Vec<User>>, ApiError> {
        let users = self.user_repo.get_all().await.map_err(|e| {
            tracing::error!(error = e.to_string(), "Failed to list users");
            ApiError::UserListFailed
        })?;

        Ok(users.into())
    }

    pub async fn handle_create(&self, body: UserData) -> Result<DataResponse<User>, ApiError> {
        let user = self.user_repo.create(body).await.map_err(write_error)?;
        tracing::info!(user_id = user.id, "User created");

        Ok(DataResponse::from(user).with_code(StatusCode::CREATED))
    }

    pub async fn handle_update(&self, id: &str, body: UserData) -> Result<StatusCode, ApiError> {
        let id = parse_user_id(id)?;
        self.user_repo.update(id, body).await.map_err(write_error)?;

        Ok(StatusCode::NO_CONTENT)
    }

    pub async fn handle_delete(&self, id: &str) -> Result<StatusCode, ApiError> {
        let id = parse_user_id(id)?;
        self.user_repo.delete(id).await.map_err(write_error)?;

        Ok(StatusCode::NO_CONTENT)
    }
}
