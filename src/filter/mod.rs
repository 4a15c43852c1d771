pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod mutation;
pub mod projection;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use mutation::Mutation;
pub use projection::Projection;
pub use types::{SortDirection, SqlResult};
