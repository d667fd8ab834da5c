use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use super::Node;

/// Borrowing iterator over an [`Rbtree`](super::Rbtree) in ascending order.
///
/// Walks the tree through parent links, so it needs no stack.
pub struct Iter<'a, T> {
    front: Option<NonNull<Node<T>>>,
    back: Option<NonNull<Node<T>>>,
    remaining: usize,
    marker: PhantomData<&'a Node<T>>,
}

// Only hands out shared references into a tree it borrows.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            marker: PhantomData,
        }
    }
}

impl<T> Iter<'_, T> {
    pub(super) const fn new(front: NonNull<Node<T>>, back: NonNull<Node<T>>, len: usize) -> Self {
        Self {
            front: Some(front),
            back: Some(back),
            remaining: len,
            marker: PhantomData,
        }
    }

    pub(super) const fn empty() -> Self {
        Self { front: None, back: None, remaining: 0, marker: PhantomData }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }

        let n = self.front?;
        self.remaining -= 1;
        self.front = Node::successor(n);

        unsafe { Some(&n.as_ref().item) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }

        let n = self.back?;
        self.remaining -= 1;
        self.back = Node::predecessor(n);

        unsafe { Some(&n.as_ref().item) }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Owning iterator over the elements of an [`Rbtree`](super::Rbtree) in ascending order.
#[derive(Debug)]
pub struct IntoIter<T>(std::vec::IntoIter<T>);

impl<T> IntoIter<T> {
    pub(super) fn new(values: Vec<T>) -> Self {
        Self(values.into_iter())
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.0.next_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}
