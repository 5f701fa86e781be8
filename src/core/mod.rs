pub mod backup;
pub mod import_export;
