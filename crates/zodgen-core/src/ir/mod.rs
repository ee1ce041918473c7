pub mod operation;
pub mod schema;
pub mod types;

pub use operation::*;
pub use schema::*;
pub use types::*;
