use super::{
    models::{User, UserData},
    repository::{RepositoryError, StoreError, StoreErrorKind, UserRepository},
};
use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("duplicate key value violates unique constraint on \"{0}\"")]
    UniqueViolation(&'static str),
    #[error("user id sequence exhausted")]
    SequenceExhausted,
}

impl StoreError for MemoryStoreError {
    fn kind(&self) -> StoreErrorKind {
        match self {
            Self::UniqueViolation(_) => StoreErrorKind::DuplicateKey,
            Self::SequenceExhausted => StoreErrorKind::Other,
        }
    }
}

#[derive(Debug, Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<i32, User>,
}

impl Table {
    fn insert(&mut self, data: UserData) -> Result<User, MemoryStoreError> {
        // `NULL` never collides with another `NULL`.
        if let Some(name) = &data.user_name {
            if self
                .rows
                .values()
                .any(|u| u.data.user_name.as_ref() == Some(name))
            {
                return Err(MemoryStoreError::UniqueViolation("user_name"));
            }
        }

        let id = self
            .last_id
            .checked_add(1)
            .ok_or(MemoryStoreError::SequenceExhausted)?;
        self.last_id = id;

        let user = User { id, data };
        self.rows.insert(id, user.clone());

        Ok(user)
    }
}

/// A `users` table held in process memory. Ids come from a sequence starting
/// at 1 and are never reused, scans return rows in insertion order.
#[derive(Default, Clone)]
pub struct InMemoryUserRepository(Arc<Mutex<Table>>);

impl InMemoryUserRepository {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_all(&self) -> Result<Vec<User>, RepositoryError> {
        let lock = self.0.lock().await;
        let users = lock.rows.values().cloned().collect();
        drop(lock);

        Ok(users)
    }

    async fn create(&self, data: UserData) -> Result<User, RepositoryError> {
        let mut lock = self.0.lock().await;
        let res = lock.insert(data);
        drop(lock);

        res.map_err(|e| {
            let err = RepositoryError::classify(e);
            if let RepositoryError::Store(e) = &err {
                tracing::error!(
                    error = e.to_string(),
                    method = "create",
                    "InMemoryUserRepository store error"
                );
            }

            err
        })
    }

    async fn update(&self, id: i32, data: UserData) -> Result<(), RepositoryError> {
        let mut lock = self.0.lock().await;

        if let Some(user) = lock.rows.get_mut(&id) {
            let user_name = user.data.user_name.take();
            user.data = UserData { user_name, ..data };
        } else {
            tracing::debug!(user_id = id, "Update matched no user");
        }

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let mut lock = self.0.lock().await;

        if lock.rows.remove(&id).is_none() {
            tracing::debug!(user_id = id, "Delete matched no user");
        }
        drop(lock);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserData {
        UserData {
            user_name: Some("alice".into()),
            first_name: Some("Alice".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let repo = InMemoryUserRepository::new();

        let user = repo.create(alice()).await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.data, alice());
        assert_eq!(user.data.last_name, None);

        let err = repo
            .create(UserData {
                user_name: Some("alice".into()),
                first_name: Some("Another".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateUserName));

        repo.update(
            user.id,
            UserData {
                user_name: Some("renamed".into()),
                first_name: Some("Alicia".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let users = repo.get_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, user.id);
        assert_eq!(users[0].data.user_name.as_deref(), Some("alice"));
        assert_eq!(users[0].data.first_name.as_deref(), Some("Alicia"));

        repo.delete(user.id).await.unwrap();
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_empty() {
        let repo = InMemoryUserRepository::new();

        assert_eq!(repo.get_all().await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn test_null_user_names_do_not_collide() {
        let repo = InMemoryUserRepository::new();

        let a = repo.create(UserData::default()).await.unwrap();
        let b = repo.create(UserData::default()).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.data.user_name, None);
        assert_eq!(b.data.user_name, None);
    }

    #[tokio::test]
    async fn test_empty_string_is_not_null() {
        let repo = InMemoryUserRepository::new();

        let data = UserData {
            user_name: Some(String::new()),
            email: Some(String::new()),
            ..Default::default()
        };
        repo.create(data.clone()).await.unwrap();

        let users = repo.get_all().await.unwrap();
        assert_eq!(users[0].data, data);

        let err = repo.create(data).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateUserName));
    }

    #[tokio::test]
    async fn test_missing_id_is_silent() {
        let repo = InMemoryUserRepository::new();
        repo.create(alice()).await.unwrap();

        repo.update(42, alice()).await.unwrap();
        repo.delete(42).await.unwrap();

        let users = repo.get_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, 1);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create(UserData::default()).await.unwrap();
        repo.delete(first.id).await.unwrap();
        let second = repo.create(UserData::default()).await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_creates() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(alice()).await })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(RepositoryError::DuplicateUserName) => duplicates += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
    }
}
