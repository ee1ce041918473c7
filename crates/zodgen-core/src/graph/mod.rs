pub mod dependency;
pub mod order;

pub use dependency::{DependencyEdge, DependencyGraph};
pub use order::{DeclarationOrder, OrderedSchema, order_declarations};
