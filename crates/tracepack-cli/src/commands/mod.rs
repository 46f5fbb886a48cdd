pub mod closure;
pub mod version;
