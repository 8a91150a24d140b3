//! Node kinds that take part in parameter-map dataflow.

pub mod map_get;
pub mod map_input;
pub mod map_set;

pub use map_get::MapGetNode;
pub use map_input::MapInputNode;
pub use map_set::MapSetNode;
