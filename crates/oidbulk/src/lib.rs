#![doc = include_str!("../README.md")]

mod batch;
mod error;
mod id;
mod record;
mod store;
mod time;

pub use crate::batch::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::record::*;
pub use crate::store::*;
pub use crate::time::*;
