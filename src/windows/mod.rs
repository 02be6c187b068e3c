//! Windows API layer
//!
//! Safe wrappers around the Windows calls the bridge needs. All unsafe FFI
//! is contained within this module and `process`.

pub mod bindings;
pub mod types;
pub mod utils;

pub use bindings::kernel32;
pub use types::OwnedHandle;
pub use utils::{ErrorCode, wide_to_string};
