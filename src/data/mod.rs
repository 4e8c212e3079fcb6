//! Sample tables for tree learning.
//!
//! A [`DataTable`] stores columns of equal length; an [`IndexSet`] selects
//! the rows a splitting criterion or a tree node works on.

mod index_set;
mod table;

pub use index_set::IndexSet;
pub use table::{Column, ColumnData, ColumnSource, DataTable};
