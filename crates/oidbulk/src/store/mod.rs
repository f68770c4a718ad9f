mod error;
mod interface;
mod memory;
#[cfg(feature = "mongodb")]
mod mongo;

pub use error::*;
pub use interface::*;
pub use memory::*;
#[cfg(feature = "mongodb")]
pub use mongo::*;
