//! Query AST, fluent builder, and SQL rendering.

mod builder;
mod object;
mod render;

pub use builder::QueryBuilder;
pub use object::{QueryObject, SelectClause, SelectKind};
pub use render::{build, build_raw, values};

pub(crate) use render::literal_value;
