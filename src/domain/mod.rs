mod codes;
mod table;

pub use codes::{item_code, Region};
pub use table::{Cell, NamedTable, Table, TableBuilder};
