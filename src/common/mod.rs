pub mod context;
pub mod env;
pub mod error;
pub mod init;
pub mod state;

#[cfg(test)]
pub mod testing;
