mod header;
mod key;
mod sql_type;
mod table;

pub use header::*;
pub use key::*;
pub use sql_type::*;
pub use table::*;
