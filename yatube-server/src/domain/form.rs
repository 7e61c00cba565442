use serde::{Deserialize, Serialize};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Raw post input as submitted by the author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    /// Group slug.
    #[serde(default)]
    pub group: Option<String>,
    /// Path of an already stored image.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPost {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl PostForm {
    pub fn validate(&self) -> Result<ValidatedPost, Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.text.trim().is_empty() {
            errors.push(FieldError::new("text", REQUIRED));
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidatedPost {
            text: self.text.clone(),
            group: non_blank(&self.group),
            image: non_blank(&self.image),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, Vec<FieldError>> {
        if self.text.trim().is_empty() {
            return Err(vec![FieldError::new("text", REQUIRED)]);
        }
        Ok(self.text.clone())
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
