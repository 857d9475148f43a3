pub mod aggregate;
pub mod cypher;
pub mod filter;
pub mod paginate;
pub mod query;

pub use aggregate::*;
pub use cypher::*;
pub use filter::*;
pub use paginate::*;
pub use query::*;
