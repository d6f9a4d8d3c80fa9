pub mod comments;
pub mod pagination;
pub mod posts;
pub mod users;

use serde::Serialize;

/// `{"message": ...}` body returned by delete operations
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Message { message: message.into() }
    }
}
