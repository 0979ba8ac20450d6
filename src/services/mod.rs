pub mod pipeline;
pub mod spreadsheet;
pub mod staging;
pub mod worker;
