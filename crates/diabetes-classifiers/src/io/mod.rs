pub mod diabetes_csv;

pub use diabetes_csv::read_dataset;
