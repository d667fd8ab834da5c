#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]
#![doc = include_str!("../../README.md")]

mod error;
mod rbtree;
#[cfg(feature = "serde")]
mod serialize;

pub use error::Error;
pub use rbtree::{IntoIter, Iter, Rbtree};

/// How [`Rbtree::insert`] treats an element that compares equal to one already in the tree.
///
/// In both cases no node is added and `insert` returns `false`. Use [`Rbtree::replace`] to swap
/// an element in regardless of the policy and get the old one back.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateHandling {
    /// Keep the stored element and drop the new one.
    #[default]
    Reject,
    /// Drop the stored element and keep the new one in its place.
    ///
    /// Useful when elements carry data that does not take part in their ordering.
    Replace,
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use crate::{DuplicateHandling, Rbtree};

    // Ordered by day, then room. The guest does not take part in the ordering.
    #[derive(Debug, Clone)]
    struct Booking {
        day: u32,
        room: u16,
        guest: &'static str,
    }

    impl Ord for Booking {
        fn cmp(&self, other: &Self) -> Ordering {
            self.day.cmp(&other.day).then_with(|| self.room.cmp(&other.room))
        }
    }

    impl PartialEq for Booking {
        fn eq(&self, other: &Self) -> bool {
            self.cmp(other) == Ordering::Equal
        }
    }

    impl Eq for Booking {}

    impl PartialOrd for Booking {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    const fn booking(day: u32, room: u16, guest: &'static str) -> Booking {
        Booking { day, room, guest }
    }

    fn guests(rb: &Rbtree<Booking>) -> Vec<&'static str> {
        rb.iter().map(|b| b.guest).collect()
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Rbtree<String>>();
        assert_send_sync::<crate::Iter<'static, String>>();
        assert_send_sync::<crate::IntoIter<String>>();
    }

    #[test]
    fn secondary_ordering() {
        let rb: Rbtree<Booking> = [
            booking(3, 101, "ana"),
            booking(1, 202, "bruno"),
            booking(3, 100, "carla"),
            booking(1, 201, "davi"),
        ]
        .into_iter()
        .collect();

        assert_eq!(guests(&rb), ["davi", "bruno", "carla", "ana"]);
        assert_eq!(rb.first().map(|b| b.guest), Some("davi"));
        assert_eq!(rb.last().map(|b| b.guest), Some("ana"));
        rb.validate().unwrap();
    }

    #[test]
    fn reject_keeps_original() {
        let mut rb = Rbtree::new();
        assert_eq!(rb.duplicates(), DuplicateHandling::Reject);

        assert!(rb.insert(booking(1, 101, "ana")));
        assert!(!rb.insert(booking(1, 101, "bruno")));

        assert_eq!(rb.len(), 1);
        assert_eq!(guests(&rb), ["ana"]);
        assert!(rb.contains(&booking(1, 101, "anyone")));
    }

    #[test]
    fn replace_policy_swaps() {
        let mut rb = Rbtree::with_duplicates(DuplicateHandling::Replace);

        assert!(rb.insert(booking(1, 101, "ana")));
        assert!(rb.insert(booking(2, 101, "carla")));
        assert!(!rb.insert(booking(1, 101, "bruno")));

        assert_eq!(rb.len(), 2);
        assert_eq!(guests(&rb), ["bruno", "carla"]);
        rb.validate().unwrap();
    }

    #[test]
    fn explicit_replace() {
        let mut rb = Rbtree::new();

        assert_eq!(rb.replace(booking(1, 101, "ana")), None);
        let old = rb.replace(booking(1, 101, "bruno"));

        assert_eq!(old.map(|b| b.guest), Some("ana"));
        assert_eq!(guests(&rb), ["bruno"]);
        assert_eq!(rb.get(&booking(1, 101, "")).map(|b| b.guest), Some("bruno"));
    }

    #[test]
    fn cancel() {
        let mut rb: Rbtree<Booking> =
            (0..50).map(|d| booking(d, 100 + (d % 3) as u16, "guest")).collect();

        let cancelled = rb.take(&booking(10, 101, "")).unwrap();
        assert_eq!(cancelled.day, 10);
        assert!(!rb.remove(&booking(10, 101, "")));
        assert_eq!(rb.len(), 49);
        rb.validate().unwrap();
    }

    #[test]
    fn debug_and_owned_iteration() {
        let rb: Rbtree<i32> = [3, 1, 2].into_iter().collect();
        assert_eq!(format!("{rb:?}"), "{1, 2, 3}");

        let mut it = rb.clone().into_iter();
        assert_eq!(it.len(), 3);
        assert_eq!(it.next_back(), Some(3));
        assert_eq!(it.collect::<Vec<_>>(), [1, 2]);

        let borrowed: Vec<_> = (&rb).into_iter().copied().collect();
        assert_eq!(borrowed, [1, 2, 3]);
    }

    #[test]
    fn extend() {
        let mut rb: Rbtree<i32> = (0..10).collect();
        rb.extend(5..15);

        assert_eq!(rb.len(), 15);
        assert_eq!(rb.into_values(), (0..15).collect::<Vec<_>>());
    }
}
