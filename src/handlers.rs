use crate::{
    errors::ApiError,
    http::{AppData, DataResponse, Json},
    user::{
        handlers::UserHandlers,
        models::{User, UserData},
        repository::UserRepository,
    },
};
use axum::{extract::Path, http::StatusCode, routing, Router};

pub async fn get_users<U>(
    AppData(data): AppData<UserHandlers<U>>,
) -> Result<DataResponse<Vec<User>>, ApiError>
where
    U: UserRepository + 'static,
{
    data.handle_get_all().await
}

pub async fn post_users<U>(
    AppData(data): AppData<UserHandlers<U>>,
    Json(body): Json<UserData>,
) -> Result<DataResponse<User>, ApiError>
where
    U: UserRepository + 'static,
{
    data.handle_create(body).await
}

pub async fn put_users_id<U>(
    AppData(data): AppData<UserHandlers<U>>,
    Path(id): Path<String>,
    Json(body): Json<UserData>,
) -> Result<StatusCode, ApiError>
where
    U: UserRepository + 'static,
{
    data.handle_update(&id, body).await
}

pub async fn delete_users_id<U>(
    AppData(data): AppData<UserHandlers<U>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    U: UserRepository + 'static,
{
    data.handle_delete(&id).await
}

pub fn router<U: UserRepository + 'static>(user_handlers: UserHandlers<U>) -> Router {
    Router::new()
        .route(
            "/users",
            routing::get(get_users::<U>).post(post_users::<U>),
        )
        .route(
            "/users/:id",
            routing::put(put_users_id::<U>).delete(delete_users_id::<U>),
        )
        .layer(AppData::extension(user_handlers))
}
