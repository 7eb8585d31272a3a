pub mod catalog;

pub use catalog::{DirectoryCatalog, HttpCatalog};
