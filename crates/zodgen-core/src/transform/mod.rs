pub mod ref_resolve;
pub mod schema_resolver;
pub mod spec_to_ir;

pub use ref_resolve::{resolve_document, resolve_node};
pub use spec_to_ir::{build_document, transform};
