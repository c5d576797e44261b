// SPDX-License-Identifier: MIT OR Apache-2.0

use core::cmp::Ordering;
use core::pin::Pin;

use alloc::boxed::Box;
use moveit::{new, New};

use super::base::{Iter, IterMut, RingHead};
use crate::traits::{BoxedRingElement, RingElement, RingList};

/// A variant of [`RingHead`] that boxes every element on insertion.
///
/// This guarantees ownership and therefore all `BoxingRingHead` functions can
/// be used without resorting to `unsafe`.
/// If you can, use this implementation over [`RingHead`].
///
/// While linked, an element is owned by the ring; the removal functions
/// unlink it and hand the box back, transferring ownership to the caller.
///
/// You need to implement the [`BoxedRingElement`] trait to designate a single
/// ring as the boxing one.
/// This also establishes clear ownership when a single element is part of
/// more than one ring.
#[repr(transparent)]
pub struct BoxingRingHead<E: BoxedRingElement<L = L> + RingElement<L>, L: RingList>(
    RingHead<E, L>,
);

impl<E, L> BoxingRingHead<E, L>
where
    E: BoxedRingElement<L = L> + RingElement<L>,
    L: RingList,
{
    /// Creates a new ring that owns all elements.
    pub fn new() -> impl New<Output = Self> {
        new::of(Self(RingHead::null())).with(|this| {
            let this = unsafe { this.get_unchecked_mut() };
            this.0.init_sentinel();
        })
    }

    pub(crate) fn null() -> Self {
        Self(RingHead::null())
    }

    pub(crate) fn init_sentinel(&mut self) {
        self.0.init_sentinel();
    }

    /// Provides a reference to the last element, or `None` if the ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn back(self: Pin<&Self>) -> Option<&E> {
        unsafe { self.inner().back() }
    }

    /// Removes all elements from the ring, deallocating their memory.
    ///
    /// Unlike [`RingHead::clear`], this operation computes in *O*(*n*) time,
    /// because it needs to traverse all elements to deallocate them.
    pub fn clear(self: Pin<&mut Self>) {
        let end_marker = self.as_ref().inner().end_marker();

        // Get the link to the first element before it's being reset.
        let mut current = self.0.flink;

        // Make the ring appear empty before deallocating any element.
        // By doing this here and not at the very end, we guard against the following scenario:
        //
        // 1. We deallocate an element.
        // 2. The `Drop` handler of that element is called and panics.
        // 3. Consequently, the `Drop` handler of `BoxingRingHead` is called and removes all elements.
        // 4. While removing elements, the just dropped element is dropped again.
        //
        // By clearing the ring at the beginning, the `Drop` handler of `BoxingRingHead` won't find any
        // elements, and thereby it won't drop any elements.
        self.inner_mut().clear();

        // Traverse the ring in the old-fashioned way and deallocate each element.
        while current.cast_const() != end_marker {
            unsafe {
                let element = (&mut *current).containing_record_mut();
                current = (*current).flink;
                drop(Box::from_raw(element));
            }
        }
    }

    /// Removes consecutive equal elements, keeping the first element of each
    /// run and deallocating the others.
    ///
    /// `same` is called as `same(current, retained)` with the element under
    /// inspection and the most recently retained one.
    /// Meaningful deduplication therefore requires equal elements to be
    /// adjacent, i.e. a sorted ring; exactly one representative per distinct
    /// value survives then.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn dedup_by<F>(mut self: Pin<&mut Self>, mut same: F)
    where
        F: FnMut(&E, &E) -> bool,
    {
        unsafe {
            let end = self.as_mut().inner_mut().end_marker_mut();

            let mut retained = (*end).flink;
            if retained == end {
                return;
            }

            let mut current = (*retained).flink;
            while current != end {
                // Capture the successor before a potential unlink.
                let next = (*current).flink;

                if same((*current).containing_record(), (*retained).containing_record()) {
                    let element = (&mut *current).containing_record_mut();
                    (*current).remove();
                    drop(Box::from_raw(element));
                } else {
                    retained = current;
                }

                current = next;
            }
        }
    }

    /// Provides a reference to the first element, or `None` if the ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn front(self: Pin<&Self>) -> Option<&E> {
        unsafe { self.inner().front() }
    }

    fn inner(self: Pin<&Self>) -> Pin<&RingHead<E, L>> {
        unsafe { Pin::new_unchecked(&self.get_ref().0) }
    }

    fn inner_mut(self: Pin<&mut Self>) -> Pin<&mut RingHead<E, L>> {
        unsafe { Pin::new_unchecked(&mut self.get_unchecked_mut().0) }
    }

    /// Returns `true` if the ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn is_empty(self: Pin<&Self>) -> bool {
        self.inner().is_empty()
    }

    /// Returns an iterator yielding references to each element of the ring.
    pub fn iter(self: Pin<&Self>) -> Iter<E, L> {
        unsafe { self.inner().iter() }
    }

    /// Returns an iterator yielding mutable references to each element of the ring.
    pub fn iter_mut(self: Pin<&mut Self>) -> IterMut<E, L> {
        unsafe { self.inner_mut().iter_mut() }
    }

    /// Counts all elements and returns the length of the ring.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn len(self: Pin<&Self>) -> usize {
        unsafe { self.inner().len() }
    }

    /// Removes the last element from the ring and returns it, or `None` if the
    /// ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn pop_back(self: Pin<&mut Self>) -> Option<Box<E>> {
        unsafe {
            self.inner_mut()
                .pop_back()
                .map(|element| Box::from_raw(element))
        }
    }

    /// Removes the first element from the ring and returns it, or `None` if
    /// the ring is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn pop_front(self: Pin<&mut Self>) -> Option<Box<E>> {
        unsafe {
            self.inner_mut()
                .pop_front()
                .map(|element| Box::from_raw(element))
        }
    }

    /// Removes the middle element from the ring and returns it, or `None` if
    /// the ring is empty.
    ///
    /// The middle of a ring of length `n` is the `⌊n / 2⌋`-th element under
    /// 0-based indexing from the front: `[a, b, c]` yields `b`, and
    /// `[a, b, c, d]` yields `c`.
    /// It is found by two pointers converging from both ends of the ring, so
    /// no element count is needed up front.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn pop_middle(mut self: Pin<&mut Self>) -> Option<Box<E>> {
        if self.as_ref().is_empty() {
            return None;
        }

        unsafe {
            let end = self.as_mut().inner_mut().end_marker_mut();

            let mut front = (*end).flink;
            let mut back = (*end).blink;
            let target = loop {
                if front == back {
                    // Odd length, the pointers met on the middle element.
                    break front;
                }
                if (*front).flink == back {
                    // Even length, two candidates left; `⌊n / 2⌋` is the
                    // trailing one.
                    break back;
                }

                front = (*front).flink;
                back = (*back).blink;
            };

            let element = (&mut *target).containing_record_mut();
            (*target).remove();
            Some(Box::from_raw(element))
        }
    }

    /// Appends an element to the back of the ring.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn push_back(self: Pin<&mut Self>, element: E) {
        let boxed_element = Box::new(element);
        unsafe { self.inner_mut().push_back(Box::leak(boxed_element)) }
    }

    /// Appends an element to the front of the ring.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn push_front(self: Pin<&mut Self>, element: E) {
        let boxed_element = Box::new(element);
        unsafe { self.inner_mut().push_front(Box::leak(boxed_element)) }
    }

    /// Reverses the traversal order of the ring in place.
    ///
    /// Applying this twice restores the original order.
    ///
    /// This operation computes in *O*(*n*) time and *O*(*1*) space.
    pub fn reverse(self: Pin<&mut Self>) {
        unsafe { self.inner_mut().reverse() }
    }

    /// Sorts the ring stably in ascending order according to the comparator,
    /// purely by relinking.
    ///
    /// This operation computes in *O*(*n* log *n*) time.
    pub fn sort_by<F>(self: Pin<&mut Self>, mut cmp: F)
    where
        F: FnMut(&E, &E) -> Ordering,
    {
        unsafe { self.inner_mut().sort_by(&mut cmp) }
    }

    /// Exchanges the order of every two adjacent elements in place.
    ///
    /// A trailing unpaired element stays in place; rings of length 0 or 1 are
    /// left untouched.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn swap_pairs(self: Pin<&mut Self>) {
        unsafe { self.inner_mut().swap_pairs() }
    }
}

impl<E, L> Drop for BoxingRingHead<E, L>
where
    E: BoxedRingElement<L = L> + RingElement<L>,
    L: RingList,
{
    fn drop(&mut self) {
        let pinned = unsafe { Pin::new_unchecked(self) };

        for element in pinned.iter_mut() {
            // Reconstruct the `Box` we created in push_back/push_front and let it leave the scope
            // to call its Drop handler and deallocate the element gracefully.
            unsafe {
                drop(Box::from_raw(element));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::RingEntry;
    use alloc::vec::Vec;
    use moveit::moveit;

    #[derive(RingList)]
    enum MyRing {}

    #[derive(Default, RingElement)]
    #[repr(C)]
    struct MyElement {
        value: i32,
        #[boxed]
        entry: RingEntry<Self, MyRing>,
    }

    impl MyElement {
        fn new(value: i32) -> Self {
            Self {
                value,
                ..Default::default()
            }
        }
    }

    fn collect_values(list: Pin<&BoxingRingHead<MyElement, MyRing>>) -> Vec<i32> {
        list.iter().map(|element| element.value).collect()
    }

    #[test]
    fn test_push_back() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        assert!(list.as_ref().is_empty());

        for i in 0..6 {
            list.as_mut().push_back(MyElement::new(i * 2));
            assert_eq!(list.as_ref().back().unwrap().value, i * 2);
            verify_all_links(list.as_ref().inner());
        }

        assert_eq!(list.as_ref().len(), 6);
        assert_eq!(collect_values(list.as_ref()), [0, 2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_push_front() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        for i in 0..6 {
            list.as_mut().push_front(MyElement::new(i));
            assert_eq!(list.as_ref().front().unwrap().value, i);
        }

        assert_eq!(collect_values(list.as_ref()), [5, 4, 3, 2, 1, 0]);
        verify_all_links(list.as_ref().inner());
    }

    #[test]
    fn test_back_and_front() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        assert!(list.as_ref().back().is_none());
        assert!(list.as_ref().front().is_none());

        for i in 0..=3 {
            list.as_mut().push_back(MyElement::new(i));
        }

        assert_eq!(list.as_ref().back().unwrap().value, 3);
        assert_eq!(list.as_ref().front().unwrap().value, 0);
    }

    #[test]
    fn test_pop_back() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        assert!(list.as_mut().pop_back().is_none());

        for i in 0..4 {
            list.as_mut().push_back(MyElement::new(i));
        }

        assert_eq!(list.as_mut().pop_back().unwrap().value, 3);
        verify_all_links(list.as_ref().inner());

        // The ring stays usable between removals.
        list.as_mut().push_back(MyElement::new(7));
        assert_eq!(list.as_mut().pop_back().unwrap().value, 7);
        assert_eq!(list.as_mut().pop_back().unwrap().value, 2);

        assert_eq!(collect_values(list.as_ref()), [0, 1]);
        verify_all_links(list.as_ref().inner());
    }

    #[test]
    fn test_pop_front() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        assert!(list.as_mut().pop_front().is_none());

        for i in 0..4 {
            list.as_mut().push_front(MyElement::new(i));
        }

        // push_front and pop_front together behave like a stack.
        for i in (0..4).rev() {
            let element = list.as_mut().pop_front().unwrap();
            assert_eq!(i, element.value);
            verify_all_links(list.as_ref().inner());
        }

        assert!(list.as_ref().is_empty());
    }

    #[test]
    fn test_pop_middle() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        assert!(list.as_mut().pop_middle().is_none());

        for i in 0..6 {
            list.as_mut().push_back(MyElement::new(i));
        }

        // Even length takes ⌊n / 2⌋, odd length the exact middle.
        assert_eq!(list.as_mut().pop_middle().unwrap().value, 3);
        verify_all_links(list.as_ref().inner());
        assert_eq!(list.as_mut().pop_middle().unwrap().value, 2);
        verify_all_links(list.as_ref().inner());
        assert_eq!(list.as_mut().pop_middle().unwrap().value, 4);
        assert_eq!(list.as_mut().pop_middle().unwrap().value, 1);
        assert_eq!(list.as_mut().pop_middle().unwrap().value, 5);
        assert_eq!(list.as_mut().pop_middle().unwrap().value, 0);

        assert!(list.as_ref().is_empty());
        assert!(list.as_mut().pop_middle().is_none());
    }

    #[test]
    fn test_dedup_by() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        for value in [1, 1, 2, 3, 3, 3, 4, 4] {
            list.as_mut().push_back(MyElement::new(value));
        }

        list.as_mut().dedup_by(|a, b| a.value == b.value);

        assert_eq!(collect_values(list.as_ref()), [1, 2, 3, 4]);
        verify_all_links(list.as_ref().inner());

        // A second pass finds nothing left to collapse.
        list.as_mut().dedup_by(|a, b| a.value == b.value);
        assert_eq!(collect_values(list.as_ref()), [1, 2, 3, 4]);
    }

    #[test]
    fn test_reverse() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        // Reversing an empty ring must leave the sentinel intact.
        list.as_mut().reverse();
        assert!(list.as_ref().is_empty());

        for i in 0..7 {
            list.as_mut().push_back(MyElement::new(i));
        }

        list.as_mut().reverse();
        assert_eq!(collect_values(list.as_ref()), [6, 5, 4, 3, 2, 1, 0]);
        verify_all_links(list.as_ref().inner());

        list.as_mut().reverse();
        assert_eq!(collect_values(list.as_ref()), [0, 1, 2, 3, 4, 5, 6]);
        verify_all_links(list.as_ref().inner());
    }

    #[test]
    fn test_swap_pairs() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        for i in 0..5 {
            list.as_mut().push_back(MyElement::new(i));
        }

        list.as_mut().swap_pairs();
        assert_eq!(collect_values(list.as_ref()), [1, 0, 3, 2, 4]);
        verify_all_links(list.as_ref().inner());

        list.as_mut().pop_back();
        list.as_mut().swap_pairs();
        assert_eq!(collect_values(list.as_ref()), [0, 1, 2, 3]);
        verify_all_links(list.as_ref().inner());
    }

    #[test]
    fn test_swap_pairs_short_rings() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        list.as_mut().swap_pairs();
        assert!(list.as_ref().is_empty());

        list.as_mut().push_back(MyElement::new(42));
        list.as_mut().swap_pairs();
        assert_eq!(collect_values(list.as_ref()), [42]);
        verify_all_links(list.as_ref().inner());
    }

    #[test]
    fn test_sort_by() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        list.as_mut().sort_by(|a, b| a.value.cmp(&b.value));
        assert!(list.as_ref().is_empty());

        for value in [5, 1, 4, 1, 5, 9, 2, 6, 5, 3] {
            list.as_mut().push_back(MyElement::new(value));
        }

        list.as_mut().sort_by(|a, b| a.value.cmp(&b.value));

        assert_eq!(collect_values(list.as_ref()), [1, 1, 2, 3, 4, 5, 5, 5, 6, 9]);
        verify_all_links(list.as_ref().inner());
    }

    #[test]
    fn test_sort_by_is_stable() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        for value in [21, 11, 22, 12, 23] {
            list.as_mut().push_back(MyElement::new(value));
        }

        // Sort by the tens digit only; elements comparing equal must keep
        // their original relative order.
        list.as_mut()
            .sort_by(|a, b| (a.value / 10).cmp(&(b.value / 10)));

        assert_eq!(collect_values(list.as_ref()), [11, 12, 21, 22, 23]);
        verify_all_links(list.as_ref().inner());
    }

    #[test]
    fn test_clear() {
        moveit! {
            let mut list = BoxingRingHead::<MyElement, MyRing>::new();
        }

        // Clearing an empty ring is fine.
        list.as_mut().clear();

        for i in 0..10 {
            list.as_mut().push_back(MyElement::new(i));
        }

        list.as_mut().clear();
        assert!(list.as_ref().is_empty());
        assert_eq!(list.as_ref().len(), 0);
        verify_all_links(list.as_ref().inner());
    }

    /// Asserts the circular doubly linked invariant: for every node in the
    /// ring, the sentinel included, `n.flink.blink == n` and
    /// `n.blink.flink == n`.
    fn verify_all_links<E, L>(head: Pin<&RingHead<E, L>>)
    where
        E: RingElement<L>,
        L: RingList,
    {
        let end: *mut RingEntry<E, L> =
            (head.get_ref() as *const _ as *mut RingHead<E, L>).cast();

        // Walk forward, checking that every entry's `blink` leads back to
        // its predecessor.
        let mut forward = Vec::new();
        let mut prev = end;
        let mut current = head.flink;

        while current != end {
            unsafe {
                assert_eq!((*current).blink, prev);
            }

            forward.push(current);
            prev = current;
            current = unsafe { (*current).flink };
        }

        // The ring closes on the sentinel from both sides.
        assert_eq!(head.blink, prev);

        // The backward walk must visit the same entries in reverse order.
        current = head.blink;
        for expected in forward.iter().rev() {
            assert_eq!(current, *expected);
            current = unsafe { (*current).blink };
        }
        assert_eq!(current, end);
    }
}
