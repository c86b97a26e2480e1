//! Built-in method implementations installed on the intrinsics

pub mod object;
pub mod regexp;
