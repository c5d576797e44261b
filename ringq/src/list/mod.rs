// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentinel-anchored intrusive circular doubly linked lists.
//!
//! [`RingHead`] is the raw layer: it never owns its elements and therefore
//! leaves the proof of their validity to the caller, which makes most of its
//! functions `unsafe`.
//! [`BoxingRingHead`] boxes every element on insertion and hands ownership
//! back on removal, making the same operation set safe.

mod base;
#[cfg(feature = "alloc")]
mod boxing;

pub use base::*;
#[cfg(feature = "alloc")]
pub use boxing::*;
