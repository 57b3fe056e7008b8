pub mod capture_backend;
pub mod clock;
pub mod device_enumerator;
pub mod free_space;
