use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("transform error: {message}")]
    Transform { message: String },
    #[error("snapshot error: {message}")]
    Snapshot { message: String },
}

impl SeedError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }
}

pub type SeedResult<T> = Result<T, SeedError>;

impl From<sea_orm::DbErr> for SeedError {
    fn from(value: sea_orm::DbErr) -> Self {
        SeedError::storage(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::SeedError;

    #[test]
    fn helper_constructors_set_variants() {
        let err = SeedError::storage("disk");
        assert!(matches!(err, SeedError::Storage { .. }));
        let err = SeedError::invalid("bad");
        assert!(matches!(err, SeedError::Validation { .. }));
        let err = SeedError::transform("date");
        assert!(matches!(err, SeedError::Transform { .. }));
        let err = SeedError::snapshot("user.json");
        assert!(matches!(err, SeedError::Snapshot { .. }));
    }

    #[test]
    fn db_errors_map_to_storage() {
        let err: SeedError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(matches!(err, SeedError::Storage { ref message } if message.contains("boom")));
    }
}
