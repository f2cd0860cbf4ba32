//! JSON bodies of `GET /api/gif?q=`.

use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifReply {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifError {
    pub error: String,
}

impl GifError {
    pub fn new(error: impl ToString) -> Self {
        Self { error: error.to_string() }
    }
}
