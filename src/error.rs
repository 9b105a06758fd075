// Copyright 2023 Remi Bernotavicius

use diesel::result::DatabaseErrorKind;
use thiserror::Error;

/// Every failure an operation can report back to its caller. All of them are scoped to the single
/// request that produced them.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("you cannot subscribe to yourself")]
    SelfReference,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Turns a unique-constraint failure raised by an insert into `AlreadyExists` with the given
    /// message. Any other database error is passed through.
    pub fn from_insert(error: diesel::result::Error, message: impl Into<String>) -> Self {
        match error {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Self::AlreadyExists(message.into())
            }
            e => Self::Database(e),
        }
    }
}

#[test]
fn unique_violation_becomes_already_exists() {
    struct Info;

    impl diesel::result::DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "UNIQUE constraint failed: favorites.user_id, favorites.recipe_id"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            None
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    let error = diesel::result::Error::DatabaseError(
        DatabaseErrorKind::UniqueViolation,
        Box::new(Info),
    );
    let error = AppError::from_insert(error, "recipe is already in favorites");
    assert!(matches!(error, AppError::AlreadyExists(_)));
    assert_eq!(
        error.to_string(),
        "already exists: recipe is already in favorites"
    );

    let error = AppError::from_insert(diesel::result::Error::NotFound, "unused");
    assert!(matches!(error, AppError::Database(_)));
}
