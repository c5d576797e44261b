// SPDX-License-Identifier: MIT OR Apache-2.0

use core::cmp::Ordering;
use core::iter::FusedIterator;
use core::marker::PhantomPinned;
use core::pin::Pin;
use core::ptr;

use moveit::{new, New};

use crate::traits::{RingElement, RingList};

/// The sentinel anchoring an intrusive circular doubly linked list.
///
/// An empty ring is a sentinel whose `flink` and `blink` both reference the
/// sentinel itself; the sentinel's own address doubles as the end marker of
/// every traversal.
///
/// This variant requires elements to be allocated beforehand on a stable
/// address and be valid as long as the ring is used.
/// As the Rust compiler cannot guarantee the validity of them, almost all
/// `RingHead` functions are `unsafe`.
/// You almost always want to use [`BoxingRingHead`] over this.
///
/// [`BoxingRingHead`]: crate::list::BoxingRingHead
#[repr(C)]
pub struct RingHead<E: RingElement<L>, L: RingList> {
    pub(crate) flink: *mut RingEntry<E, L>,
    pub(crate) blink: *mut RingEntry<E, L>,
    pub(crate) pin: PhantomPinned,
}

impl<E, L> RingHead<E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    /// Creates a new ring, in place and pinned, with the sentinel referencing
    /// itself.
    pub fn new() -> impl New<Output = Self> {
        new::of(Self::null()).with(|this| {
            let this = unsafe { this.get_unchecked_mut() };
            this.init_sentinel();
        })
    }

    pub(crate) fn null() -> Self {
        Self {
            flink: ptr::null_mut(),
            blink: ptr::null_mut(),
            pin: PhantomPinned,
        }
    }

    /// Establishes the empty-ring state.
    /// Only valid once the sentinel has reached its final address.
    pub(crate) fn init_sentinel(&mut self) {
        self.flink = (self as *mut Self).cast();
        self.blink = self.flink;
    }

    /// Provides a reference to the last element, or `None` if the ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub unsafe fn back(self: Pin<&Self>) -> Option<&E> {
        (!self.is_empty()).then(|| (*self.blink).containing_record())
    }

    /// Removes all elements from the ring.
    ///
    /// This operation computes in *O*(*1*) time, because it only resets the
    /// forward and backward links of the sentinel.
    pub fn clear(mut self: Pin<&mut Self>) {
        let end_marker = self.as_mut().end_marker_mut();
        let self_mut = unsafe { self.get_unchecked_mut() };

        self_mut.flink = end_marker;
        self_mut.blink = end_marker;
    }

    /// Returns a const pointer to the "end marker" (which is the address of our own `RingHead`, but interpreted as a `RingEntry` element address).
    pub(crate) fn end_marker(self: Pin<&Self>) -> *const RingEntry<E, L> {
        (self.get_ref() as *const _ as *mut Self).cast()
    }

    /// Returns a mutable pointer to the "end marker" (which is the address of our own `RingHead`, but interpreted as a `RingEntry` element address).
    pub(crate) fn end_marker_mut(self: Pin<&mut Self>) -> *mut RingEntry<E, L> {
        (unsafe { self.get_unchecked_mut() } as *mut Self).cast()
    }

    /// Returns the [`RingEntry`] for the given element.
    pub(crate) fn entry(element: &mut E) -> *mut RingEntry<E, L> {
        let element_ptr = element as *mut E;

        // This is the canonical implementation of `byte_add`
        let entry = unsafe { element_ptr.cast::<u8>().add(E::offset()).cast::<E>() };

        entry.cast()
    }

    /// Provides a reference to the first element, or `None` if the ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub unsafe fn front(self: Pin<&Self>) -> Option<&E> {
        (!self.is_empty()).then(|| (*self.flink).containing_record())
    }

    /// Returns `true` if the ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn is_empty(self: Pin<&Self>) -> bool {
        self.flink as *const RingEntry<E, L> == (self.get_ref() as *const Self).cast()
    }

    /// Returns an iterator yielding references to each element of the ring.
    pub unsafe fn iter(self: Pin<&Self>) -> Iter<E, L> {
        let head = self.get_ref();
        let flink = head.flink;
        let blink = head.blink;

        Iter { head, flink, blink }
    }

    /// Returns an iterator yielding mutable references to each element of the ring.
    pub unsafe fn iter_mut(self: Pin<&mut Self>) -> IterMut<E, L> {
        let head = self.get_unchecked_mut();
        let flink = head.flink;
        let blink = head.blink;

        IterMut { head, flink, blink }
    }

    /// Counts all elements and returns the length of the ring.
    ///
    /// No element count is cached anywhere; every call retraverses the full
    /// ring in *O*(*n*) time.
    pub unsafe fn len(self: Pin<&Self>) -> usize {
        self.iter().count()
    }

    /// Removes the last element from the ring and returns it, or `None` if the
    /// ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub unsafe fn pop_back(self: Pin<&mut Self>) -> Option<&mut E> {
        (!self.as_ref().is_empty()).then(|| {
            let entry = &mut *self.blink;
            entry.remove();
            entry.containing_record_mut()
        })
    }

    /// Removes the first element from the ring and returns it, or `None` if
    /// the ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub unsafe fn pop_front(self: Pin<&mut Self>) -> Option<&mut E> {
        (!self.as_ref().is_empty()).then(|| {
            let entry = &mut *self.flink;
            entry.remove();
            entry.containing_record_mut()
        })
    }

    /// Links an element immediately before the sentinel, making it the last
    /// element of the ring.
    ///
    /// This operation computes in *O*(*1*) time.
    pub unsafe fn push_back(mut self: Pin<&mut Self>, element: &mut E) {
        let entry = Self::entry(element);
        RingEntry::link_before(self.as_mut().end_marker_mut(), entry);
    }

    /// Links an element immediately after the sentinel, making it the first
    /// element of the ring.
    ///
    /// This operation computes in *O*(*1*) time.
    pub unsafe fn push_front(mut self: Pin<&mut Self>, element: &mut E) {
        let entry = Self::entry(element);
        RingEntry::link_after(self.as_mut().end_marker_mut(), entry);
    }

    /// Reverses the traversal order of the ring in place.
    ///
    /// This walks the ring once and swaps `flink` and `blink` at every node,
    /// the sentinel included, so ring closure is preserved.
    /// No element is moved, copied, or reallocated.
    ///
    /// This operation computes in *O*(*n*) time and *O*(*1*) space.
    pub unsafe fn reverse(mut self: Pin<&mut Self>) {
        let end = self.as_mut().end_marker_mut();

        let mut current = end;
        loop {
            let next = (*current).flink;
            (*current).flink = (*current).blink;
            (*current).blink = next;

            current = next;
            if current == end {
                break;
            }
        }
    }

    /// Exchanges the order of every two adjacent elements by relinking, so
    /// `[a, b, c, d, e]` becomes `[b, a, d, c, e]`.
    ///
    /// A trailing unpaired element stays in place.
    /// No element is moved, copied, or reallocated.
    ///
    /// This operation computes in *O*(*n*) time.
    pub unsafe fn swap_pairs(mut self: Pin<&mut Self>) {
        let end = self.as_mut().end_marker_mut();

        let mut node = (*end).flink;
        while node != end && (*node).flink != end {
            let second = (*node).flink;
            (*node).remove();
            RingEntry::link_after(second, node);

            // `node` now trails its former successor; its `flink` is the
            // first entry of the next pair.
            node = (*node).flink;
        }
    }

    /// Sorts the ring in ascending order according to the comparator, stably
    /// and purely by relinking.
    ///
    /// Rings of length 0 or 1 are left untouched.
    /// This is a top-down merge sort over the entries: the ring is detached
    /// into a null-terminated forward chain, split by slow/fast pointers,
    /// merged back together, and finally rethreaded with consistent backward
    /// links.
    ///
    /// This operation computes in *O*(*n* log *n*) time.
    pub unsafe fn sort_by<F>(mut self: Pin<&mut Self>, cmp: &mut F)
    where
        F: FnMut(&E, &E) -> Ordering,
    {
        let end = self.as_mut().end_marker_mut();

        let first = (*end).flink;
        if first == end || (*first).flink == end {
            return;
        }

        // Detach into a singly linked chain terminated by a null `flink`.
        (*(*end).blink).flink = ptr::null_mut();
        let sorted = Self::merge_sort(first, cmp);

        // Rethread the backward links and close the ring again.
        let mut prev = end;
        let mut current = sorted;
        while !current.is_null() {
            (*current).blink = prev;
            (*prev).flink = current;
            prev = current;
            current = (*current).flink;
        }
        (*prev).flink = end;
        (*end).blink = prev;
    }

    /// Sorts a null-terminated forward chain of entries, returning its new
    /// first entry. Backward links are left stale; `sort_by` rebuilds them.
    unsafe fn merge_sort<F>(first: *mut RingEntry<E, L>, cmp: &mut F) -> *mut RingEntry<E, L>
    where
        F: FnMut(&E, &E) -> Ordering,
    {
        if first.is_null() || (*first).flink.is_null() {
            return first;
        }

        // Split in the middle via slow/fast pointers.
        let mut slow = first;
        let mut fast = (*first).flink;
        while !fast.is_null() && !(*fast).flink.is_null() {
            slow = (*slow).flink;
            fast = (*(*fast).flink).flink;
        }
        let second = (*slow).flink;
        (*slow).flink = ptr::null_mut();

        let a = Self::merge_sort(first, cmp);
        let b = Self::merge_sort(second, cmp);
        Self::merge(a, b, cmp)
    }

    /// Merges two sorted null-terminated forward chains.
    /// Ties are taken from the left chain, which keeps the sort stable.
    unsafe fn merge<F>(
        mut a: *mut RingEntry<E, L>,
        mut b: *mut RingEntry<E, L>,
        cmp: &mut F,
    ) -> *mut RingEntry<E, L>
    where
        F: FnMut(&E, &E) -> Ordering,
    {
        let mut first = ptr::null_mut();
        let mut tail: *mut RingEntry<E, L> = ptr::null_mut();

        while !a.is_null() && !b.is_null() {
            let take_a =
                cmp((*a).containing_record(), (*b).containing_record()) != Ordering::Greater;

            let node = if take_a {
                let node = a;
                a = (*a).flink;
                node
            } else {
                let node = b;
                b = (*b).flink;
                node
            };

            if tail.is_null() {
                first = node;
            } else {
                (*tail).flink = node;
            }
            tail = node;
        }

        let rest = if a.is_null() { b } else { a };
        if tail.is_null() {
            first = rest;
        } else {
            (*tail).flink = rest;
        }

        first
    }
}

/// Iterator over the elements of a ring.
///
/// This iterator is returned from the [`RingHead::iter`] and
/// [`BoxingRingHead::iter`] functions.
///
/// [`BoxingRingHead::iter`]: crate::list::BoxingRingHead::iter
pub struct Iter<'a, E: RingElement<L>, L: RingList> {
    head: &'a RingHead<E, L>,
    flink: *const RingEntry<E, L>,
    blink: *const RingEntry<E, L>,
}

impl<'a, E, L> Iter<'a, E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    fn terminate(&mut self) {
        self.flink = (self.head as *const RingHead<E, L>).cast();
        self.blink = self.flink;
    }
}

impl<'a, E, L> Iterator for Iter<'a, E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        if self.flink == (self.head as *const RingHead<_, _>).cast() {
            None
        } else {
            unsafe {
                let element = (*self.flink).containing_record();

                if self.flink == self.blink {
                    // We are crossing the other end of the iterator and must not iterate any further.
                    self.terminate();
                } else {
                    self.flink = (*self.flink).flink;
                }

                Some(element)
            }
        }
    }

    fn last(mut self) -> Option<&'a E> {
        self.next_back()
    }
}

impl<'a, E, L> DoubleEndedIterator for Iter<'a, E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    fn next_back(&mut self) -> Option<&'a E> {
        if self.blink == (self.head as *const RingHead<_, _>).cast() {
            None
        } else {
            unsafe {
                let element = (*self.blink).containing_record();

                if self.blink == self.flink {
                    // We are crossing the other end of the iterator and must not iterate any further.
                    self.terminate();
                } else {
                    self.blink = (*self.blink).blink;
                }

                Some(element)
            }
        }
    }
}

impl<'a, E, L> FusedIterator for Iter<'a, E, L>
where
    E: RingElement<L>,
    L: RingList,
{
}

/// Mutable iterator over the elements of a ring.
///
/// The iterator advances before an element is yielded, so the yielded element
/// may be unlinked from the ring without derailing the traversal.
///
/// This iterator is returned from the [`RingHead::iter_mut`] and
/// [`BoxingRingHead::iter_mut`] functions.
///
/// [`BoxingRingHead::iter_mut`]: crate::list::BoxingRingHead::iter_mut
pub struct IterMut<'a, E: RingElement<L>, L: RingList> {
    head: &'a mut RingHead<E, L>,
    flink: *mut RingEntry<E, L>,
    blink: *mut RingEntry<E, L>,
}

impl<'a, E, L> IterMut<'a, E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    fn terminate(&mut self) {
        self.flink = (self.head as *mut RingHead<E, L>).cast();
        self.blink = self.flink;
    }
}

impl<'a, E, L> Iterator for IterMut<'a, E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    type Item = &'a mut E;

    fn next(&mut self) -> Option<&'a mut E> {
        if self.flink == (self.head as *mut RingHead<_, _>).cast() {
            None
        } else {
            unsafe {
                let element = (*self.flink).containing_record_mut();

                if self.flink == self.blink {
                    // We are crossing the other end of the iterator and must not iterate any further.
                    self.terminate();
                } else {
                    self.flink = (*self.flink).flink;
                }

                Some(element)
            }
        }
    }

    fn last(mut self) -> Option<&'a mut E> {
        self.next_back()
    }
}

impl<'a, E, L> DoubleEndedIterator for IterMut<'a, E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    fn next_back(&mut self) -> Option<&'a mut E> {
        if self.blink == (self.head as *mut RingHead<_, _>).cast() {
            None
        } else {
            unsafe {
                let element = (*self.blink).containing_record_mut();

                if self.blink == self.flink {
                    // We are crossing the other end of the iterator and must not iterate any further.
                    self.terminate();
                } else {
                    self.blink = (*self.blink).blink;
                }

                Some(element)
            }
        }
    }
}

impl<'a, E, L> FusedIterator for IterMut<'a, E, L>
where
    E: RingElement<L>,
    L: RingList,
{
}

/// One position in a ring: the `flink`/`blink` pointer pair embedded in an
/// element structure.
#[derive(Debug)]
#[repr(C)]
pub struct RingEntry<E: RingElement<L>, L: RingList> {
    pub(crate) flink: *mut RingEntry<E, L>,
    pub(crate) blink: *mut RingEntry<E, L>,
    pin: PhantomPinned,
}

impl<E, L> RingEntry<E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    /// Allows the creation of a `RingEntry`, but leaves all fields uninitialized.
    ///
    /// Its fields are only initialized when an entry is linked into a ring.
    pub fn new() -> Self {
        Self {
            flink: ptr::null_mut(),
            blink: ptr::null_mut(),
            pin: PhantomPinned,
        }
    }

    pub(crate) fn containing_record(&self) -> &E {
        unsafe { &*self.element_ptr() }
    }

    pub(crate) fn containing_record_mut(&mut self) -> &mut E {
        unsafe { &mut *self.element_ptr_mut() }
    }

    fn element_ptr(&self) -> *const E {
        let ptr = self as *const Self;

        // This is the canonical implementation of `byte_sub`
        let ptr = unsafe { ptr.cast::<u8>().sub(E::offset()).cast::<Self>() };

        ptr.cast()
    }

    fn element_ptr_mut(&mut self) -> *mut E {
        let ptr = self as *mut Self;

        // This is the canonical implementation of `byte_sub`
        let ptr = unsafe { ptr.cast::<u8>().sub(E::offset()).cast::<Self>() };

        ptr.cast()
    }

    /// Splices `entry` into the ring immediately after `anchor`, updating the
    /// four affected links.
    pub(crate) unsafe fn link_after(anchor: *mut Self, entry: *mut Self) {
        let next = (*anchor).flink;
        (*entry).flink = next;
        (*entry).blink = anchor;
        (*next).blink = entry;
        (*anchor).flink = entry;
    }

    /// Splices `entry` into the ring immediately before `anchor`, updating the
    /// four affected links.
    pub(crate) unsafe fn link_before(anchor: *mut Self, entry: *mut Self) {
        let prev = (*anchor).blink;
        (*entry).flink = anchor;
        (*entry).blink = prev;
        (*prev).flink = entry;
        (*anchor).blink = entry;
    }

    /// Unlinks this entry by relinking its former neighbors to each other.
    /// Neither the entry's element nor any memory is touched.
    pub(crate) unsafe fn remove(&mut self) {
        let old_flink = self.flink;
        let old_blink = self.blink;
        (*old_flink).blink = old_blink;
        (*old_blink).flink = old_flink;
    }
}

impl<E, L> Default for RingEntry<E, L>
where
    E: RingElement<L>,
    L: RingList,
{
    fn default() -> Self {
        Self::new()
    }
}
