mod orchestrator;
mod plan;
mod progress;
mod status;
#[cfg(test)]
mod tests;

pub use orchestrator::*;
pub use plan::*;
pub use progress::*;
pub use status::*;
