//! Environment variable access behind a trait so config tests never touch
//! the process environment.

use std::env::VarError;

pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, VarError>;
}

/// Zero-sized type, delegates to `std::env`.
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }
}

#[cfg(test)]
pub use in_memory::InMemoryEnv;
