pub mod cell;
pub mod row;
pub mod value;
