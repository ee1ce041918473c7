pub mod emitters;
pub mod error;
pub mod expression;
pub mod generator;
pub mod symbols;
pub mod ts_type;

pub use error::{AssembleError, GenerateError};
pub use generator::HonoGenerator;
