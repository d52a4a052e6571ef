pub mod product;
pub mod selection;
pub mod window;
