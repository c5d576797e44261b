// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Required for deriving our traits inside this crate.
extern crate self as ringq;

pub mod list;
#[cfg(feature = "alloc")]
pub mod queue;
mod traits;

pub use traits::*;
