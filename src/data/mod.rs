//! Data module - CSV loading, preparation and filtering

pub mod loader;
mod processor;
pub mod record;

pub use loader::{DataLoader, PrepareOptions};
pub use processor::{DataProcessor, TeacherType, TeacherTypeCount, RANKING_SIZE};
pub use record::{write_json, DistrictRecord};
