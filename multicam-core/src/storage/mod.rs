pub mod manifest;
pub mod session_dir;
