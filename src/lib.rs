pub mod assemble;
pub mod audit;
pub mod block;
pub mod decimal;
mod error;
pub mod model;
pub mod ods;
pub mod records;
pub mod render;
pub mod template;

pub use assemble::{AssemblyConfig, AssemblyReport, Document, assemble};
pub use error::Error;
