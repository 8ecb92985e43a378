pub mod article;
pub mod source;
