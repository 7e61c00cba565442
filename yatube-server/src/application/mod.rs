pub mod auth_service;
pub mod authoring_service;
pub mod comment_service;
pub mod listing_service;
pub mod request_context;

#[cfg(test)]
mod fixtures;
