mod decimal;
mod documents;
mod factory;
mod records;
mod repository;
mod statutory;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
