pub(crate) mod assemble;
pub(crate) mod bundle;
pub mod cancel;
pub(crate) mod error;
pub(crate) mod image;
pub(crate) mod kubectl;
pub(crate) mod process;
pub(crate) mod resources;
pub(crate) mod strategy;
pub(crate) mod submit;
pub(crate) mod temp_path;
pub(crate) mod version;

pub mod cli;

pub use error::Error;

pub(crate) type Result<T, E = error::BoxError> = std::result::Result<T, E>;
