use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A topical category. Looked up by `slug`, which is unique.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
}

impl Group {
    pub fn new(title: String, description: String, slug: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            slug,
        }
    }
}
