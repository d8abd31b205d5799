pub mod docs;
pub mod post;
