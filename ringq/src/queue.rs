// SPDX-License-Identifier: MIT OR Apache-2.0

//! A FIFO/LIFO queue of null-terminated byte strings, built on
//! [`BoxingRingHead`].
//!
//! Each queued string lives in its own heap allocation inside a [`StrNode`];
//! every structural operation (reversal, pairwise swapping, sorting,
//! deduplication) works purely on the intrusive links and never copies or
//! reallocates a payload.

use core::ffi::CStr;
use core::pin::Pin;

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::ffi::CString;
use moveit::{new, New};

use crate::list::{BoxingRingHead, RingEntry};
use crate::traits::{RingElement, RingList};

/// Identity of the one ring every [`StrNode`] belongs to.
#[derive(RingList)]
pub enum StrRing {}

/// A queue element: one ring entry plus the exclusively owned,
/// null-terminated string payload.
#[derive(RingElement)]
#[repr(C)]
pub struct StrNode {
    #[boxed]
    entry: RingEntry<Self, StrRing>,
    value: CString,
}

impl StrNode {
    fn new(s: &CStr) -> Self {
        Self {
            entry: RingEntry::new(),
            // Deep copy, terminator included.
            value: s.to_owned(),
        }
    }

    /// The string this node carries.
    pub fn value(&self) -> &CStr {
        &self.value
    }
}

/// A queue of strings anchored by a single sentinel.
///
/// Insertion at either end gives FIFO or LIFO behavior.
/// Removal transfers ownership of the [`StrNode`] to the caller: dropping the
/// returned box releases the element, while its value may also be reinserted.
/// Dropping the queue releases every element still linked to it.
#[repr(transparent)]
pub struct StrQueue(BoxingRingHead<StrNode, StrRing>);

impl StrQueue {
    /// Creates a new empty queue, in place and pinned.
    pub fn new() -> impl New<Output = Self> {
        new::of(Self(BoxingRingHead::null())).with(|this| {
            let this = unsafe { this.get_unchecked_mut() };
            this.0.init_sentinel();
        })
    }

    /// Provides a reference to the last string, or `None` if the queue is empty.
    pub fn back(self: Pin<&Self>) -> Option<&CStr> {
        self.inner().back().map(StrNode::value)
    }

    /// Removes and releases all elements.
    pub fn clear(self: Pin<&mut Self>) {
        self.inner_mut().clear();
    }

    /// Collapses runs of equal strings down to their first occurrence,
    /// releasing the discarded elements.
    ///
    /// The queue must already be sorted in non-decreasing order for this to
    /// leave exactly one representative per distinct value; on unsorted input
    /// only adjacent duplicates are collapsed.
    pub fn dedup(self: Pin<&mut Self>) {
        self.inner_mut()
            .dedup_by(|current, retained| current.value == retained.value);
    }

    /// Removes and releases the middle element, the `⌊n / 2⌋`-th from the
    /// front under 0-based indexing.
    ///
    /// Returns `false` if the queue is empty.
    pub fn delete_middle(self: Pin<&mut Self>) -> bool {
        self.inner_mut().pop_middle().is_some()
    }

    /// Provides a reference to the first string, or `None` if the queue is empty.
    pub fn front(self: Pin<&Self>) -> Option<&CStr> {
        self.inner().front().map(StrNode::value)
    }

    fn inner(self: Pin<&Self>) -> Pin<&BoxingRingHead<StrNode, StrRing>> {
        unsafe { Pin::new_unchecked(&self.get_ref().0) }
    }

    fn inner_mut(self: Pin<&mut Self>) -> Pin<&mut BoxingRingHead<StrNode, StrRing>> {
        unsafe { Pin::new_unchecked(&mut self.get_unchecked_mut().0) }
    }

    /// Copies `s` into a fresh element and links it at the head of the queue.
    pub fn insert_head(self: Pin<&mut Self>, s: &CStr) {
        self.inner_mut().push_front(StrNode::new(s));
    }

    /// Copies `s` into a fresh element and links it at the tail of the queue.
    pub fn insert_tail(self: Pin<&mut Self>, s: &CStr) {
        self.inner_mut().push_back(StrNode::new(s));
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(self: Pin<&Self>) -> bool {
        self.inner().is_empty()
    }

    /// Counts the elements by full ring traversal.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn len(self: Pin<&Self>) -> usize {
        self.inner().len()
    }

    /// Unlinks the first element and returns it, or `None` if the queue is
    /// empty.
    ///
    /// If `sp` is given, up to `sp.len() - 1` payload bytes are copied into it
    /// and terminated with a NUL; a zero-length buffer is left untouched.
    /// The element is removed either way.
    ///
    /// Ownership of the element transfers to the caller: dropping the box
    /// releases it, reinserting its value requeues it.
    pub fn remove_head(self: Pin<&mut Self>, sp: Option<&mut [u8]>) -> Option<Box<StrNode>> {
        let node = self.inner_mut().pop_front()?;
        if let Some(sp) = sp {
            copy_truncated(&node.value, sp);
        }
        Some(node)
    }

    /// Unlinks the last element and returns it, or `None` if the queue is
    /// empty.
    ///
    /// Otherwise behaves like [`StrQueue::remove_head`].
    pub fn remove_tail(self: Pin<&mut Self>, sp: Option<&mut [u8]>) -> Option<Box<StrNode>> {
        let node = self.inner_mut().pop_back()?;
        if let Some(sp) = sp {
            copy_truncated(&node.value, sp);
        }
        Some(node)
    }

    /// Reverses the queue in place; payloads are never touched.
    pub fn reverse(self: Pin<&mut Self>) {
        self.inner_mut().reverse();
    }

    /// Sorts the queue stably in ascending byte order of the payloads, purely
    /// by relinking.
    ///
    /// Queues of length 0 or 1 are left untouched.
    pub fn sort(self: Pin<&mut Self>) {
        self.inner_mut()
            .sort_by(|a: &StrNode, b: &StrNode| Ord::cmp(&a.value, &b.value));
    }

    /// Exchanges the order of every two adjacent elements in place.
    ///
    /// A trailing unpaired element stays where it is.
    pub fn swap_pairs(self: Pin<&mut Self>) {
        self.inner_mut().swap_pairs();
    }
}

/// Copies as much of `value` as fits into `sp`, always leaving room for and
/// writing a NUL terminator. An empty buffer stays untouched.
fn copy_truncated(value: &CStr, sp: &mut [u8]) {
    if sp.is_empty() {
        return;
    }

    let bytes = value.to_bytes();
    let len = bytes.len().min(sp.len() - 1);
    sp[..len].copy_from_slice(&bytes[..len]);
    sp[len] = 0;
}
