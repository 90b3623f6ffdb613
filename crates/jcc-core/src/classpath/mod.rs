pub mod index;
pub mod universe;
