use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Batch of {len} operations exceeds the limit of {limit}")]
    BatchTooLarge { len: usize, limit: usize },

    #[error("Corrupt index row {id}: {message}")]
    CorruptRow { id: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
