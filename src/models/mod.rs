pub mod mode;
pub mod settings;
