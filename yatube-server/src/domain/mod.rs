pub mod comment;
pub mod error;
pub mod form;
pub mod group;
pub mod pagination;
pub mod post;
pub mod user;
