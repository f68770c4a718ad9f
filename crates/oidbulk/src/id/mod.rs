mod encoder;
mod object_id;
mod source;

pub use encoder::*;
pub use object_id::*;
pub use source::*;
