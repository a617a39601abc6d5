//! Resource factory: buffers, textures, samplers, shaders and bindings.

mod binding;
mod buffer;
mod sampler;
mod shader;
mod texture;

pub use binding::{BindingSlot, SlotKind};
pub use buffer::MappedRange;
pub use texture::{DEPTH_FORMAT, gen_checkerboard};

pub(crate) use buffer::buffer_range;
