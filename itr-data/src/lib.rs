mod loader;

pub use loader::{TaxSlabLoader, TaxSlabLoaderError, TaxSlabRecord};
