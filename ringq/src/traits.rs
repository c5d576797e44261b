// SPDX-License-Identifier: MIT OR Apache-2.0

/// Designates an empty enum as the identity of one intrusive ring.
/// You are supposed to define an empty enum and implement this trait for every
/// ring entry field of every element type in your program.
///
/// This is required, because a single element may be part of multiple rings,
/// and henceforth its element structure then contains multiple [`RingEntry`]
/// fields.
/// To make all list functions insert and remove elements via the correct entry
/// fields, rings need to be uniquely identified, and this is what the empty
/// enum types are for.
///
/// The easiest way to implement this trait is to use `derive`:
///
/// ```ignore
/// #[derive(RingList)]
/// enum MyRing {}
/// ```
///
/// [`RingEntry`]: crate::list::RingEntry
pub trait RingList {}
pub use ringq_macros::RingList;

/// Designates a structure as a ring element with an entry field
/// ([`RingEntry`]) of a particular ring (identified via the enum that
/// implements [`RingList`]).
///
/// You can implement this trait multiple times for a structure if it is part
/// of multiple rings (and therefore contains multiple entry fields).
///
/// The easiest way to implement this trait for all entry fields of a structure
/// is to use `derive` on the structure:
///
/// ```ignore
/// #[derive(RingElement)]
/// #[repr(C)]
/// struct MyElement {
///     entry: RingEntry<Self, MyRing>,
///     value: i32,
/// }
/// ```
///
/// [`RingEntry`]: crate::list::RingEntry
pub trait RingElement<L: RingList> {
    /// Returns the byte offset to the entry field relative to the beginning of
    /// the element structure.
    fn offset() -> usize;
}
pub use ringq_macros::RingElement;

/// Enables [`BoxingRingHead`] for a ring element structure.
///
/// While an element may be part of multiple rings, only one ring may have
/// ownership of the element and handle its memory allocation and deallocation.
/// Therefore, `BoxedRingElement` can only be implemented once per element
/// structure.
///
/// The easiest way to implement this trait is to use the `#[boxed]` attribute
/// for the appropriate entry field and use `derive` on the structure:
///
/// ```ignore
/// #[derive(RingElement)]
/// #[repr(C)]
/// struct MyElement {
///     #[boxed]
///     entry: RingEntry<Self, MyRing>,
///     value: i32,
/// }
/// ```
///
/// [`BoxingRingHead`]: crate::list::BoxingRingHead
pub trait BoxedRingElement {
    type L: RingList;
}
