//! Optional [`serde`] support. A tree serializes as an ascending sequence of its elements.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::Rbtree;

impl<T: Serialize> Serialize for Rbtree<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

struct RbtreeVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for RbtreeVisitor<T>
where
    T: Deserialize<'de> + Ord,
{
    type Value = Rbtree<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut rb = Rbtree::new();
        while let Some(item) = seq.next_element()? {
            // Equal elements after the first are dropped.
            rb.insert(item);
        }
        Ok(rb)
    }
}

impl<'de, T> Deserialize<'de> for Rbtree<T>
where
    T: Deserialize<'de> + Ord,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(RbtreeVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use crate::Rbtree;

    #[test]
    fn msgpack() {
        let rb: Rbtree<String> = ["pear", "apple", "fig"].into_iter().map(String::from).collect();

        let bytes = rmp_serde::to_vec(&rb).unwrap();
        let plain: Vec<String> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(plain, ["apple", "fig", "pear"]);

        let back: Rbtree<String> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, rb);
        back.validate().unwrap();
    }

    #[test]
    fn duplicate_input() {
        let bytes = rmp_serde::to_vec(&[3, 1, 3, 2, 1]).unwrap();

        let rb: Rbtree<i32> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(rb.values(), [&1, &2, &3]);
        rb.validate().unwrap();
    }
}
