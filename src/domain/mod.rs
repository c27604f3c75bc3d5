pub mod format_name;
pub mod value_type;

pub use format_name::FormatName;
pub use value_type::{ValueError, ValueType};
