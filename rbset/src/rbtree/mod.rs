use std::borrow::Borrow;
use std::cmp::{Ordering, max};
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::mem::swap;
use std::ptr::NonNull;

use crate::{DuplicateHandling, Error};

mod iter;

pub use iter::{IntoIter, Iter};

pub(crate) struct Node<T> {
    item: T,
    red: bool,
    parent: Option<NonNull<Node<T>>>,
    left: Option<NonNull<Node<T>>>,
    right: Option<NonNull<Node<T>>>,
}

impl<T> Node<T> {
    fn alloc(item: T, parent: Option<NonNull<Self>>, red: bool) -> NonNull<Self> {
        let node = Self { item, red, parent, left: None, right: None };
        NonNull::from(Box::leak(Box::new(node)))
    }

    // Absent children count as black.
    fn is_red(node: Option<NonNull<Self>>) -> bool {
        node.is_some_and(|n| unsafe { n.as_ref() }.red)
    }

    fn leftmost(mut node: NonNull<Self>) -> NonNull<Self> {
        while let Some(l) = unsafe { node.as_ref() }.left {
            node = l;
        }
        node
    }

    fn rightmost(mut node: NonNull<Self>) -> NonNull<Self> {
        while let Some(r) = unsafe { node.as_ref() }.right {
            node = r;
        }
        node
    }

    fn successor(node: NonNull<Self>) -> Option<NonNull<Self>> {
        let nb = unsafe { node.as_ref() };
        if let Some(right) = nb.right {
            return Some(Self::leftmost(right));
        }

        let mut c = node;
        let mut p = nb.parent;
        while let Some(pn) = p {
            let pb = unsafe { pn.as_ref() };
            if pb.left == Some(c) {
                return Some(pn);
            }
            c = pn;
            p = pb.parent;
        }
        None
    }

    fn predecessor(node: NonNull<Self>) -> Option<NonNull<Self>> {
        let nb = unsafe { node.as_ref() };
        if let Some(left) = nb.left {
            return Some(Self::rightmost(left));
        }

        let mut c = node;
        let mut p = nb.parent;
        while let Some(pn) = p {
            let pb = unsafe { pn.as_ref() };
            if pb.right == Some(c) {
                return Some(pn);
            }
            c = pn;
            p = pb.parent;
        }
        None
    }

    fn values<'a>(&'a self, vals: &mut Vec<&'a T>) {
        if let Some(left) = self.left {
            unsafe {
                left.as_ref().values(vals);
            }
        }
        vals.push(&self.item);
        if let Some(right) = self.right {
            unsafe {
                right.as_ref().values(vals);
            }
        }
    }

    fn height(&self) -> usize {
        let left = self.left.map_or(0, |l| unsafe { l.as_ref() }.height());
        let right = self.right.map_or(0, |r| unsafe { r.as_ref() }.height());
        1 + max(left, right)
    }

    fn color_counts(&self) -> (usize, usize) {
        let (mut black, mut red) = if self.red { (0, 1) } else { (1, 0) };

        for child in [self.left, self.right].into_iter().flatten() {
            let (b, r) = unsafe { child.as_ref() }.color_counts();
            black += b;
            red += r;
        }

        (black, red)
    }

    // Returns the black height of this subtree and the number of nodes in it.
    fn validate(&self) -> Result<(usize, usize), Error> {
        let this = Some(NonNull::from(self));
        let mut heights = [0, 0];
        let mut count = 1;

        for (i, child) in [self.left, self.right].into_iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            let cb = unsafe { child.as_ref() };

            if cb.parent != this {
                return Err(Error::ParentLink);
            }
            if self.red && cb.red {
                return Err(Error::RedChild);
            }

            let (h, c) = cb.validate()?;
            heights[i] = h;
            count += c;
        }

        let [left, right] = heights;
        if left != right {
            return Err(Error::BlackHeight { left, right });
        }

        Ok((if self.red { left } else { left + 1 }, count))
    }

    fn clone_tree(&self, parent: Option<NonNull<Self>>) -> NonNull<Self>
    where
        T: Clone,
    {
        let mut copy = Self::alloc(self.item.clone(), parent, self.red);

        let left = self.left.map(|l| unsafe { l.as_ref() }.clone_tree(Some(copy)));
        let right = self.right.map(|r| unsafe { r.as_ref() }.clone_tree(Some(copy)));

        let cb = unsafe { copy.as_mut() };
        cb.left = left;
        cb.right = right;
        copy
    }

    // UNSAFE -- All existing pointers to node except parent pointers from its children must be
    // destroyed.
    unsafe fn destroy_tree(node: NonNull<Self>) {
        // Children only point back at this node through their parent links, which are never read
        // again.
        let node = unsafe { Box::from_raw(node.as_ptr()) };

        unsafe {
            if let Some(left) = node.left {
                Self::destroy_tree(left);
            }
            if let Some(right) = node.right {
                Self::destroy_tree(right);
            }
        }
    }

    // UNSAFE -- All existing pointers to node except parent pointers from its children must be
    // destroyed.
    unsafe fn into_values(node: NonNull<Self>, vals: &mut Vec<T>) {
        let node = unsafe { Box::from_raw(node.as_ptr()) };
        let Self { item, left, right, .. } = *node;

        unsafe {
            if let Some(left) = left {
                Self::into_values(left, vals);
            }
            vals.push(item);
            if let Some(right) = right {
                Self::into_values(right, vals);
            }
        }
    }
}

/// An ordered set of elements kept in a red-black tree.
///
/// Elements are placed by their [`Ord`] implementation. Insertion, lookup and removal are
/// `O(log n)`; [`values`](Self::values), [`height`](Self::height) and
/// [`color_counts`](Self::color_counts) visit every node.
///
/// It is a logic error for an element to be mutated in a way that changes its ordering relative
/// to any other element while it is in the tree.
pub struct Rbtree<T> {
    root: Option<NonNull<Node<T>>>,
    size: usize,
    duplicates: DuplicateHandling,
    marker: PhantomData<Box<Node<T>>>,
}

// The tree exclusively owns its nodes and only mutates them through &mut self.
unsafe impl<T: Send> Send for Rbtree<T> {}
unsafe impl<T: Sync> Sync for Rbtree<T> {}

impl<T> Default for Rbtree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Rbtree<T> {
    fn drop(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { Node::destroy_tree(root) }
        }
    }
}

impl<T: Clone> Clone for Rbtree<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.map(|r| unsafe { r.as_ref() }.clone_tree(None)),
            size: self.size,
            duplicates: self.duplicates,
            marker: PhantomData,
        }
    }
}

impl<T: Debug> Debug for Rbtree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Rbtree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Rbtree<T> {}

impl<T: Ord> FromIterator<T> for Rbtree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut rb = Self::new();
        rb.extend(iter);
        rb
    }
}

impl<T: Ord> Extend<T> for Rbtree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|item| {
            self.insert(item);
        });
    }
}

impl<'a, T> IntoIterator for &'a Rbtree<T> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for Rbtree<T> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.into_values())
    }
}

impl<T> Rbtree<T> {
    /// Creates an empty tree that rejects duplicate elements.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_duplicates(DuplicateHandling::Reject)
    }

    /// Creates an empty tree with an explicit policy for elements that compare equal to one
    /// already stored.
    #[must_use]
    pub const fn with_duplicates(duplicates: DuplicateHandling) -> Self {
        Self { root: None, size: 0, duplicates, marker: PhantomData }
    }

    /// Returns the policy applied by [`insert`](Self::insert) to equal elements.
    pub const fn duplicates(&self) -> DuplicateHandling {
        self.duplicates
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the tree holds no elements.
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { Node::destroy_tree(root) }
        }
        self.size = 0;
    }

    /// Returns the smallest element, if any.
    pub fn first(&self) -> Option<&T> {
        self.root.map(|r| unsafe { &Node::leftmost(r).as_ref().item })
    }

    /// Returns the largest element, if any.
    pub fn last(&self) -> Option<&T> {
        self.root.map(|r| unsafe { &Node::rightmost(r).as_ref().item })
    }

    /// Returns an iterator over the elements in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        match self.root {
            None => Iter::empty(),
            Some(r) => Iter::new(Node::leftmost(r), Node::rightmost(r), self.size),
        }
    }

    /// Returns references to every element in ascending order. The vector is built fresh on each
    /// call.
    pub fn values(&self) -> Vec<&T> {
        let mut out = Vec::with_capacity(self.size);

        if let Some(root) = &self.root {
            unsafe { root.as_ref().values(&mut out) };
        }

        out
    }

    /// Consumes the tree and returns its elements in ascending order.
    pub fn into_values(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.size);

        // It's safe to take() self.root as self will immediately be dropped, which does not care
        // about size being stale.
        if let Some(root) = self.root.take() {
            unsafe { Node::into_values(root, &mut out) };
        }

        out
    }

    /// Returns the number of nodes on the longest path from the root to a leaf, counting the root.
    /// An empty tree has height 0.
    pub fn height(&self) -> usize {
        self.root.map_or(0, |r| unsafe { r.as_ref() }.height())
    }

    /// Returns the number of black and red nodes, in that order.
    pub fn color_counts(&self) -> (usize, usize) {
        self.root.map_or((0, 0), |r| unsafe { r.as_ref() }.color_counts())
    }

    fn replace_child(
        &mut self,
        parent: Option<NonNull<Node<T>>>,
        old: NonNull<Node<T>>,
        new: Option<NonNull<Node<T>>>,
    ) {
        match parent {
            None => self.root = new,
            Some(mut p) => {
                let pb = unsafe { p.as_mut() };
                if pb.left == Some(old) {
                    pb.left = new;
                } else {
                    pb.right = new;
                }
            }
        }
    }

    fn rotate_right(&mut self, mut parent: NonNull<Node<T>>) {
        // Left child becomes the new parent
        let pb = unsafe { parent.as_mut() };
        let mut l = pb.left.expect("Tried to make None child into parent");
        let lb = unsafe { l.as_mut() };

        pb.left = lb.right.take();
        if let Some(mut p_left) = pb.left {
            unsafe { p_left.as_mut() }.parent = Some(parent);
        }

        lb.right = Some(parent);
        lb.parent = pb.parent.take();
        pb.parent = Some(l);

        self.replace_child(lb.parent, parent, Some(l));
    }

    fn rotate_left(&mut self, mut parent: NonNull<Node<T>>) {
        // Right child becomes the new parent
        let pb = unsafe { parent.as_mut() };
        let mut r = pb.right.expect("Tried to make None child into parent");
        let rb = unsafe { r.as_mut() };

        pb.right = rb.left.take();
        if let Some(mut p_right) = pb.right {
            unsafe { p_right.as_mut() }.parent = Some(parent);
        }

        rb.left = Some(parent);
        rb.parent = pb.parent.take();
        pb.parent = Some(r);

        self.replace_child(rb.parent, parent, Some(r));
    }

    // c - current
    // p - parent
    // g - grandparent
    // u - uncle
    fn fix_after_insert(&mut self, mut c: NonNull<Node<T>>) {
        unsafe {
            while let Some(mut p) = c.as_ref().parent {
                if !p.as_ref().red {
                    break;
                }

                // A red parent is never the root, but stop rather than walk off the top.
                let Some(mut g) = p.as_ref().parent else {
                    break;
                };

                let p_left = g.as_ref().left == Some(p);
                let u = if p_left { g.as_ref().right } else { g.as_ref().left };

                if let Some(mut u) = u {
                    if u.as_ref().red {
                        // Push the redness up to the grandparent and continue from there.
                        p.as_mut().red = false;
                        u.as_mut().red = false;
                        g.as_mut().red = true;
                        c = g;
                        continue;
                    }
                }

                if p_left {
                    if p.as_ref().right == Some(c) {
                        self.rotate_left(p);
                        p = c;
                    }
                    self.rotate_right(g);
                } else {
                    if p.as_ref().left == Some(c) {
                        self.rotate_right(p);
                        p = c;
                    }
                    self.rotate_left(g);
                }

                p.as_mut().red = false;
                g.as_mut().red = true;
                break;
            }

            if let Some(mut root) = self.root {
                root.as_mut().red = false;
            }
        }
    }

    // Called with a black leaf that is still linked into the tree and is about to be unlinked.
    // Every path through it will be one black node short, so rebalance around it first.
    //
    // s - sibling
    fn fix_double_black(&mut self, mut node: NonNull<Node<T>>) {
        unsafe {
            while let Some(mut p) = node.as_ref().parent {
                let left = p.as_ref().left == Some(node);
                let sibling = |p: NonNull<Node<T>>| {
                    let pb = p.as_ref();
                    (if left { pb.right } else { pb.left })
                        .expect("Non-root black node must have sibling")
                };

                let mut s = sibling(p);

                // The sibling is red, make it black and make it into the new parent.
                if s.as_ref().red {
                    s.as_mut().red = false;
                    p.as_mut().red = true;
                    if left {
                        self.rotate_left(p);
                    } else {
                        self.rotate_right(p);
                    }
                    s = sibling(p);
                }

                let (near, far) = {
                    let sb = s.as_ref();
                    if left { (sb.left, sb.right) } else { (sb.right, sb.left) }
                };

                if !Node::is_red(near) && !Node::is_red(far) {
                    // S is black with no red children.
                    // Mark S as red so the subtree rooted at p meets the black-path requirement.
                    s.as_mut().red = true;
                    if p.as_ref().red {
                        // Absorb the missing black into the parent.
                        p.as_mut().red = false;
                        return;
                    }
                    node = p;
                    continue;
                }

                if !Node::is_red(far) {
                    // Only the inside child is red; rotate it onto S.
                    let mut n = near.expect("Red child must exist");
                    n.as_mut().red = false;
                    s.as_mut().red = true;
                    if left {
                        self.rotate_right(s);
                    } else {
                        self.rotate_left(s);
                    }
                    s = n;
                }

                // S has a red child on the outside.
                // Rotate S onto parent and copy parent's colour, make both its children black.
                s.as_mut().red = p.as_ref().red;
                p.as_mut().red = false;
                let far = if left { s.as_ref().right } else { s.as_ref().left };
                if let Some(mut far) = far {
                    far.as_mut().red = false;
                }
                if left {
                    self.rotate_left(p);
                } else {
                    self.rotate_right(p);
                }
                return;
            }
        }
    }
}

impl<T: Ord> Rbtree<T> {
    fn find_node<Q>(&self, item: &Q) -> Option<NonNull<Node<T>>>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut n = self.root?;

        loop {
            let nb = unsafe { n.as_ref() };
            let next = match item.cmp(nb.item.borrow()) {
                Ordering::Equal => return Some(n),
                Ordering::Less => nb.left,
                Ordering::Greater => nb.right,
            };

            n = next?;
        }
    }

    // Returns the element that is no longer in the tree: the new one if it was rejected, the old
    // one if it was replaced, or None if a new node was created.
    fn place(&mut self, item: T, replace: bool) -> Option<T> {
        let Some(mut p) = self.root else {
            self.root = Some(Node::alloc(item, None, false));
            self.size += 1;
            return None;
        };

        let left = loop {
            let pb = unsafe { p.as_mut() };
            let (next, left) = match item.cmp(&pb.item) {
                Ordering::Equal if replace => {
                    let mut item = item;
                    swap(&mut pb.item, &mut item);
                    return Some(item);
                }
                Ordering::Equal => return Some(item),
                Ordering::Less => (pb.left, true),
                Ordering::Greater => (pb.right, false),
            };

            match next {
                None => break left,
                Some(next) => p = next,
            }
        };

        let node = Node::alloc(item, Some(p), true);
        let pb = unsafe { p.as_mut() };
        if left {
            pb.left = Some(node);
        } else {
            pb.right = Some(node);
        }

        self.size += 1;
        self.fix_after_insert(node);
        None
    }

    /// Adds an element to the tree.
    ///
    /// Returns `true` if a new element was added. When an equal element is already present the
    /// tree keeps its shape and `false` is returned; whether the stored element is kept or
    /// swapped for `item` depends on the tree's [`DuplicateHandling`].
    pub fn insert(&mut self, item: T) -> bool {
        let replace = matches!(self.duplicates, DuplicateHandling::Replace);
        self.place(item, replace).is_none()
    }

    /// Adds an element, replacing and returning any stored element that compares equal to it.
    ///
    /// This ignores the tree's [`DuplicateHandling`].
    pub fn replace(&mut self, item: T) -> Option<T> {
        self.place(item, true)
    }

    /// Returns `true` if an element equal to `item` is in the tree.
    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(item).is_some()
    }

    /// Returns the stored element equal to `item`, if any.
    pub fn get<Q>(&self, item: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(item).map(|n| unsafe { &n.as_ref().item })
    }

    /// Removes the element equal to `item`. Returns `true` if one was present.
    pub fn remove<Q>(&mut self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(item).is_some()
    }

    /// Removes and returns the element equal to `item`, if any.
    pub fn take<Q>(&mut self, item: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut n = self.find_node(item)?;

        self.size -= 1;

        let nb = unsafe { n.as_mut() };
        // Ensure the node has only one child by replacing it with its successor
        if let (Some(_), Some(right)) = (nb.left, nb.right) {
            let mut s = Node::leftmost(right);
            swap(&mut nb.item, &mut unsafe { s.as_mut() }.item);
            n = s;
        }

        let nb = unsafe { n.as_ref() };
        let child = nb.left.or(nb.right);

        if !nb.red && child.is_none() {
            self.fix_double_black(n);
        }

        // Rebalancing may have moved n under a different parent.
        let parent = unsafe { n.as_ref() }.parent;
        if let Some(mut c) = child {
            // A black node with a single child always has a red child, which takes its place and
            // its colour.
            let cb = unsafe { c.as_mut() };
            cb.parent = parent;
            cb.red = false;
        }
        self.replace_child(parent, n, child);

        // By now there are no other pointers to n and it can be dropped.
        let n = unsafe { Box::from_raw(n.as_ptr()) };

        Some(n.item)
    }

    /// Checks every structural invariant of the tree, returning the first violation found.
    ///
    /// A correctly used tree always validates. Failures indicate an element whose ordering
    /// changed after insertion or an [`Ord`] implementation that is not a total order. The tree
    /// is never repaired.
    pub fn validate(&self) -> Result<(), Error> {
        let Some(root) = self.root else {
            if self.size != 0 {
                return Err(Error::Size { counted: 0, recorded: self.size });
            }
            return Ok(());
        };

        let rb = unsafe { root.as_ref() };
        if rb.parent.is_some() {
            return Err(Error::ParentLink);
        }
        if rb.red {
            return Err(Error::RedRoot);
        }

        let (_, counted) = rb.validate()?;
        if counted != self.size {
            return Err(Error::Size { counted, recorded: self.size });
        }

        let mut it = self.iter();
        if let Some(mut prev) = it.next() {
            for item in it {
                if prev >= item {
                    return Err(Error::Order);
                }
                prev = item;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
impl<T: fmt::Display> Node<T> {
    fn pprint(&self, prefix: String) -> String {
        let left = if let Some(left) = self.left {
            unsafe { left.as_ref().pprint(prefix.clone() + "  ") }
        } else {
            String::new()
        };

        let right = if let Some(right) = self.right {
            unsafe { right.as_ref().pprint(prefix.clone() + "  ") }
        } else {
            String::new()
        };

        let c = if self.red { "red" } else { "black" };

        format!("{left}{prefix}{}: {c}\n{right}", self.item)
    }

    fn print(&self) -> String {
        let left = if let Some(left) = self.left {
            unsafe { left.as_ref().print() }
        } else {
            String::new()
        };

        let right = if let Some(right) = self.right {
            unsafe { right.as_ref().print() }
        } else {
            String::new()
        };

        let c = if self.red { "r" } else { "b" };

        format!("({} {c} {left} {right})", self.item)
    }
}

#[cfg(test)]
impl<T: fmt::Display> Rbtree<T> {
    #[allow(dead_code)]
    pub(crate) fn pprint(&self) -> String {
        match self.root {
            Some(r) => unsafe { r.as_ref().pprint(String::new()) },
            None => String::new(),
        }
    }

    pub(crate) fn print(&self) -> String {
        match self.root {
            Some(r) => unsafe { r.as_ref().print() },
            None => String::new(),
        }
    }
}
