pub mod manager;
pub mod postgres;
pub mod relations;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use postgres::{PgClient, PgModel};
pub use store::{
    CountArgs, CreateArgs, DeleteArgs, FindManyArgs, FindUniqueArgs, ModelStore, StoreClient,
    StoreError, UpdateArgs, RECORD_NOT_FOUND,
};
