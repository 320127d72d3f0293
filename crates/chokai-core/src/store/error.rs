use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated on {collection}: {key}")]
    UniqueViolation { collection: &'static str, key: String },

    #[error("Record not found in {collection}: {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("Invalid {collection} record: {source}")]
    Serialization {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
