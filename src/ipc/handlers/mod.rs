pub mod core;
pub mod exchange;
pub mod grades;
pub mod reports;
