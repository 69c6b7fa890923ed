pub mod acme;
mod context;
mod remote;
mod types;


pub use acme::AcmeCache;
pub use context::*;
pub use remote::*;
pub use types::*;
