//! Decodes captured syscall invocations into readable argument reports,
//! following pointers into process and kernel memory through a pluggable
//! introspection engine.

pub mod cli;
pub mod colors;
pub mod errors;
pub mod fd_resolver;
pub mod flags;
pub mod introspection;
pub mod kernel_layout;
pub mod memory_map;
pub mod peeker_poker;
pub mod process;
pub mod register_binder;
pub mod sockets;
pub mod syscall_object;
pub mod syscall_skeleton_map;
#[cfg(test)]
mod test_image;
pub mod types;
pub mod utilities;
pub mod writer;
