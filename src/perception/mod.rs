pub mod adb_screen;
pub mod sanitizer;
pub mod traits;
pub mod types;
