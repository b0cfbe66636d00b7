//! Named Python virtual environments rooted under a base directory.
//!
//! A [`VirtualEnv`] is a pure description (name + base dir) until
//! [`VirtualEnv::create`] brings it onto disk. Alongside the environment sits
//! a small JSON cache, and [`VirtualEnv::run`] spawns commands with
//! `VIRTUAL_ENV` and `PATH` pointed at the environment.

pub mod cache;
pub mod creator;
pub mod error;
pub mod log;
pub mod run;
pub mod venv;

pub use cache::{CacheData, CacheValue};
pub use creator::{EnvCreator, PythonVenvCreator};
pub use error::{Result, VenvError};
pub use run::RunOptions;
pub use venv::VirtualEnv;
