// Pipeline storage: the published catalog and its persisted record shape

pub mod catalog;
pub mod entry;
pub mod in_memory;
pub mod samples;

pub use catalog::Catalog;
pub use entry::CatalogEntry;
pub use in_memory::InMemoryPersistence;
