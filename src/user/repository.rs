use super::models::{User, UserData};
use crate::BoxedError;
use async_trait::async_trait;

/// Coarse classification of a store failure. Only a uniqueness violation is
/// worth telling apart from every other failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    DuplicateKey,
    Other,
}

/// Implemented by each store's native error type so repositories can
/// reclassify failures without knowing the driver.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
    fn kind(&self) -> StoreErrorKind;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Username already exists")]
    DuplicateUserName,
    #[error("Store failure: {0}")]
    Store(#[source] BoxedError),
}

impl RepositoryError {
    /// Passes a store failure through unchanged.
    #[inline]
    pub fn store<E: StoreError>(err: E) -> Self {
        Self::Store(Box::new(err))
    }

    /// Turns a uniqueness violation into [`RepositoryError::DuplicateUserName`]
    /// and passes every other failure through.
    pub fn classify<E: StoreError>(err: E) -> Self {
        match err.kind() {
            StoreErrorKind::DuplicateKey => Self::DuplicateUserName,
            StoreErrorKind::Other => Self::store(err),
        }
    }
}

#[async_trait]
pub trait UserRepository: Sync + Send {
    async fn get_all(&self) -> Result<Vec<User>, RepositoryError>;
    async fn create(&self, data: UserData) -> Result<User, RepositoryError>;
    /// Replaces every writable field but `user_name`. Updating a missing id
    /// is not an error.
    async fn update(&self, id: i32, data: UserData) -> Result<(), RepositoryError>;
    /// Deleting a missing id is not an error.
    async fn delete(&self, id: i32) -> Result<(), RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("fake store error")]
    struct FakeError(StoreErrorKind);

    impl StoreError for FakeError {
        fn kind(&self) -> StoreErrorKind {
            self.0
        }
    }

    #[test]
    fn test_classify() {
        assert!(matches!(
            RepositoryError::classify(FakeError(StoreErrorKind::DuplicateKey)),
            RepositoryError::DuplicateUserName
        ));

        match RepositoryError::classify(FakeError(StoreErrorKind::Other)) {
            RepositoryError::Store(e) => assert_eq!(e.to_string(), "fake store error"),
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_store_never_reclassifies() {
        assert!(matches!(
            RepositoryError::store(FakeError(StoreErrorKind::DuplicateKey)),
            RepositoryError::Store(_)
        ));
    }
}
