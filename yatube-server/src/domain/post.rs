use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;

/// Number of characters of the text shown as the post's title.
pub const TITLE_LENGTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: UserId,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl Post {
    pub fn new(
        author_id: UserId,
        text: String,
        group_id: Option<Uuid>,
        image: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            pub_date: Utc::now(),
            author_id,
            group_id,
            image,
        }
    }

    pub fn title(&self) -> String {
        self.text.chars().take(TITLE_LENGTH).collect()
    }

    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }

    /// `pub_date` is left untouched; the image is only replaced when a new one is given.
    pub fn apply_edit(&mut self, text: String, group_id: Option<Uuid>, image: Option<String>) {
        self.text = text;
        self.group_id = group_id;
        if image.is_some() {
            self.image = image;
        }
    }
}
