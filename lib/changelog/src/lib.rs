pub mod builder;
pub mod changelog;
pub mod entries;
pub mod errors;
pub mod settings;
