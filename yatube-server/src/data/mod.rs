pub mod comment_repository;
pub mod group_repository;
pub mod memory;
pub mod post_repository;
pub mod user_repository;
