pub mod loader;
pub mod store;

pub use loader::DataLoader;
pub use store::DatasetStore;
