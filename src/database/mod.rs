pub mod assets;
pub mod catalog;
pub mod ledger;
pub mod manager;
pub mod models;
pub mod query_builder;
pub mod users;

pub use assets::AssetRepo;
pub use catalog::CatalogRepo;
pub use ledger::LedgerRepo;
pub use manager::{Database, DatabaseError};
pub use users::UserRepo;
