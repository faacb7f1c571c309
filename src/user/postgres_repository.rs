use super::{
    models::{User, UserData},
    repository::{RepositoryError, StoreError, StoreErrorKind, UserRepository},
};
use crate::database::Database;
use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder, Row};
use tokio_stream::StreamExt;

const USERS_TABLE: &str = r#""users""#;
const ID_COLUMN: &str = r#""user_id""#;
/// Every column, in table order.
const USER_COLUMNS: &str = r#""user_id", "user_name", "first_name", "last_name", "email", "user_status", "department""#;

impl StoreError for sqlx::Error {
    fn kind(&self) -> StoreErrorKind {
        match self.as_database_error() {
            Some(e) if e.is_unique_violation() => StoreErrorKind::DuplicateKey,
            _ => StoreErrorKind::Other,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("user_id")?,
            data: UserData {
                user_name: row.try_get("user_name")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                email: row.try_get("email")?,
                status: row.try_get("user_status")?,
                department: row.try_get("department")?,
            },
        })
    }
}

fn select_all_query() -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(USER_COLUMNS).push(" FROM ").push(USERS_TABLE);
    qb
}

fn insert_query(data: UserData) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(USERS_TABLE).push(
        r#" ("user_name", "first_name", "last_name", "email", "user_status", "department") VALUES ("#,
    );

    let mut values = qb.separated(", ");
    values
        .push_bind(data.user_name)
        .push_bind(data.first_name)
        .push_bind(data.last_name)
        .push_bind(data.email)
        .push_bind(data.status)
        .push_bind(data.department);
    values.push_unseparated(")");

    qb.push(" RETURNING ").push(USER_COLUMNS);
    qb
}

/// `user_name` is left out: it cannot change after creation.
fn update_query(id: i32, data: UserData) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(USERS_TABLE).push(" SET ");

    let mut set = qb.separated(", ");
    set.push(r#""first_name" = "#)
        .push_bind_unseparated(data.first_name);
    set.push(r#""last_name" = "#)
        .push_bind_unseparated(data.last_name);
    set.push(r#""email" = "#).push_bind_unseparated(data.email);
    set.push(r#""user_status" = "#)
        .push_bind_unseparated(data.status);
    set.push(r#""department" = "#)
        .push_bind_unseparated(data.department);

    qb.push(" WHERE ").push(ID_COLUMN).push(" = ").push_bind(id);
    qb
}

fn delete_query(id: i32) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("DELETE FROM ");
    qb.push(USERS_TABLE)
        .push(" WHERE ")
        .push(ID_COLUMN)
        .push(" = ")
        .push_bind(id);
    qb
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_all(&self) -> Result<Vec<User>, RepositoryError> {
        let mut qb = select_all_query();
        let mut rows = qb.build_query_as::<User>().fetch(&self.pool);

        let mut users = Vec::new();
        while let Some(row) = rows.next().await {
            let user = row.map_err(|e| {
                tracing::error!(
                    error = e.to_string(),
                    method = "get_all",
                    "PostgresUserRepository sqlx error"
                );
                RepositoryError::store(e)
            })?;

            users.push(user);
        }

        Ok(users)
    }

    async fn create(&self, data: UserData) -> Result<User, RepositoryError> {
        let mut qb = insert_query(data);

        qb.build_query_as::<User>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = RepositoryError::classify(e);
                if let RepositoryError::Store(e) = &err {
                    tracing::error!(
                        error = e.to_string(),
                        method = "create",
                        "PostgresUserRepository sqlx error"
                    );
                }

                err
            })
    }

    async fn update(&self, id: i32, data: UserData) -> Result<(), RepositoryError> {
        let mut qb = update_query(id, data);

        let res = qb.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!(
                error = e.to_string(),
                method = "update",
                user_id = id,
                "PostgresUserRepository sqlx error"
            );
            RepositoryError::store(e)
        })?;

        if res.rows_affected() == 0 {
            tracing::debug!(user_id = id, "Update matched no user");
        }

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let mut qb = delete_query(id);

        let res = qb.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!(
                error = e.to_string(),
                method = "delete",
                user_id = id,
                "PostgresUserRepository sqlx error"
            );
            RepositoryError::store(e)
        })?;

        if res.rows_affected() == 0 {
            tracing::debug!(user_id = id, "Delete matched no user");
        }

        Ok(())
    }
}
