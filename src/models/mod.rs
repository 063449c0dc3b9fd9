pub mod column_mapping;

pub use column_mapping::{ColumnBinding, ColumnMapping, ResolvedColumns};
