//! Domain validation errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("identity must be a non-empty string of at most {max} characters", max = super::values::MAX_IDENTITY_LEN)]
    InvalidIdentity,

    #[error("topic must be a non-empty string of at most {max} characters", max = super::values::MAX_TOPIC_LEN)]
    InvalidTopic,

    #[error("unknown mode '{0}' (expected 'text' or 'video')")]
    InvalidMode(String),

    #[error("room id must be a non-empty string")]
    InvalidRoomId,
}
