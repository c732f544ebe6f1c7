pub mod jwt;
pub mod media;
pub mod pagination;
pub mod password;
pub mod validators;
