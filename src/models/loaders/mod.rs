pub mod csv_loader;

pub use csv_loader::{load_applicants_csv, load_applicants_from_reader};
