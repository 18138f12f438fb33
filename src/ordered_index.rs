use core::cmp;
use core::mem;
use crate::error::IndexError;

struct NodeRef<K: Ord, T> {
    node: Option<Box<Node<K, T>>>,
}

struct Node<K: Ord, T> {
    key: K,
    val: T,
    height: u32,

    left: NodeRef<K, T>,
    right: NodeRef<K, T>,
}

enum NodeIterVal<'a, K: Ord, T> {
    Value(&'a T),
    Child(&'a Node<K, T>),
}

struct NodeIter<'a, K: Ord, T> {
    val: Option<&'a T>,
    left: Option<&'a Node<K, T>>,
    right: Option<&'a Node<K, T>>,
}

enum KeyOf<K, T> {
    Total(Box<dyn Fn(&T) -> K>),
    Partial(Box<dyn Fn(&T) -> Option<K>>),
}

pub struct OrderedIndexIterator<'a, K: Ord, T> {
    stack: Vec<NodeIter<'a, K, T>>,
}

/// AVL tree holding values ordered by a key extracted from each value.
///
/// Equal keys are accepted and placed to the right of the existing ones, so
/// iteration yields them in insertion order. Lookups and deletions stop at
/// the first equal key met on the way down.
pub struct OrderedIndex<K: Ord, T> {
    root: NodeRef<K, T>,
    key_of: KeyOf<K, T>,
    len: usize,
}

impl<K: Ord, T> Node<K, T> {
    fn new(key: K, val: T) -> Self {
        Node{key, val, height: 1, left: NodeRef::new(), right: NodeRef::new()}
    }

    fn update_height(&mut self) {
        self.height = cmp::max(self.left.height(), self.right.height()) + 1;
    }

    fn balance(&self) -> i64 {
        self.left.height() as i64 - self.right.height() as i64
    }

    fn iter(&self) -> NodeIter<'_, K, T> {
        NodeIter{
            val: Some(&self.val),
            left: self.left.node.as_deref(),
            right: self.right.node.as_deref(),
        }
    }
}

impl<K: Ord, T> NodeRef<K, T> {
    fn new() -> Self {
        NodeRef{node: None}
    }

    fn new_node(key: K, val: T) -> Self {
        NodeRef{node: Some(Box::new(Node::new(key, val)))}
    }

    fn height(&self) -> u32 {
        match &self.node {
            None => 0,
            Some(n) => n.height,
        }
    }

    fn balance(&self) -> i64 {
        match &self.node {
            None => 0,
            Some(n) => n.balance(),
        }
    }

    fn rotate_left(&mut self) {
        let mut z = match self.node.take() {
            None => return,
            Some(z) => z,
        };

        match z.right.node.take() {
            None => {
                self.node = Some(z);
            },
            Some(mut y) => {
                z.right.node = y.left.node.take();
                z.update_height();
                y.left.node = Some(z);
                y.update_height();
                self.node = Some(y);
            },
        }
    }

    fn rotate_right(&mut self) {
        let mut z = match self.node.take() {
            None => return,
            Some(z) => z,
        };

        match z.left.node.take() {
            None => {
                self.node = Some(z);
            },
            Some(mut y) => {
                z.left.node = y.right.node.take();
                z.update_height();
                y.right.node = Some(z);
                y.update_height();
                self.node = Some(y);
            },
        }
    }

    // Both subtrees must already be balanced and differ in height by at most two.
    fn rebalance(&mut self) {
        let n = match self.node.as_deref_mut() {
            None => return,
            Some(n) => n,
        };

        n.update_height();
        let bf = n.balance();
        if bf > 1 {
            if n.left.balance() < 0 {
                n.left.rotate_left();
            }
            self.rotate_right();
        } else if bf < -1 {
            if n.right.balance() > 0 {
                n.right.rotate_right();
            }
            self.rotate_left();
        }
    }

    fn insert(&mut self, key: K, val: T) {
        match &mut self.node {
            None => {
                *self = Self::new_node(key, val);
            },
            Some(n) => {
                if key < n.key {
                    n.left.insert(key, val);
                } else {
                    n.right.insert(key, val);
                }
                self.rebalance();
            }
        }
    }

    fn isolate_first(&mut self) -> Option<(K, T)> {
        let n = self.node.as_deref_mut()?;
        if n.left.node.is_some() {
            let first = n.left.isolate_first();
            self.rebalance();
            first
        } else {
            let mut first = self.node.take()?;
            self.node = first.right.node.take();
            Some((first.key, first.val))
        }
    }

    fn delete<Q: PartialOrd<K>>(&mut self, key: &Q) -> Option<T> {
        let n = self.node.as_deref_mut()?;
        let deleted = if *key < n.key {
            n.left.delete(key)?
        } else if *key > n.key {
            n.right.delete(key)?
        } else if n.left.node.is_some() && n.right.node.is_some() {
            // The successor takes over this node's slot, its own node is the
            // one unlinked.
            let (succ_key, succ_val) = n.right.isolate_first()?;
            n.key = succ_key;
            mem::replace(&mut n.val, succ_val)
        } else {
            let mut deleted = self.node.take()?;
            self.node = match deleted.left.node.take() {
                None => deleted.right.node.take(),
                l => l,
            };
            return Some(deleted.val);
        };

        self.rebalance();
        Some(deleted)
    }
}

impl<'a, K: Ord, T> NodeIter<'a, K, T> {
    fn next(&mut self) -> Option<NodeIterVal<'a, K, T>> {
        match self.left.take() {
            Some(ln) => Some(NodeIterVal::Child(ln)),
            None => {
                match self.val.take() {
                    Some(v) => Some(NodeIterVal::Value(v)),
                    None => {
                        match self.right.take() {
                            Some(rn) => Some(NodeIterVal::Child(rn)),
                            None => None
                        }
                    }
                }
            }
        }
    }
}

impl<K, T> KeyOf<K, T> {
    fn extract(&self, val: &T) -> Option<K> {
        match self {
            Self::Total(key_of) => Some(key_of(val)),
            Self::Partial(key_of) => key_of(val),
        }
    }
}

impl<'a, K: Ord, T> OrderedIndexIterator<'a, K, T> {
    fn new(root: &'a NodeRef<K, T>) -> Self {
        let mut stack = Vec::new();
        if let Some(rn) = &root.node {
            stack.push(rn.iter());
        }

        Self{stack}
    }
}

impl<'a, K: Ord, T> Iterator for OrderedIndexIterator<'a, K, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.last_mut() {
            match top.next() {
                Some(NodeIterVal::Child(cn)) => {
                    self.stack.push(cn.iter());
                },
                Some(NodeIterVal::Value(v)) => {
                    return Some(v);
                },
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

impl<K: Ord, T> OrderedIndex<K, T> {
    /// Creates an empty index ordering values by `key_of(value)`.
    pub fn new<F>(key_of: F) -> Self
    where F: Fn(&T) -> K + 'static
    {
        Self{root: NodeRef::new(), key_of: KeyOf::Total(Box::new(key_of)), len: 0}
    }

    /// Like [`OrderedIndex::new`], for values that may lack a key. Inserting
    /// such a value fails with [`IndexError::InvalidValue`].
    pub fn with_partial_key<F>(key_of: F) -> Self
    where F: Fn(&T) -> Option<K> + 'static
    {
        Self{root: NodeRef::new(), key_of: KeyOf::Partial(Box::new(key_of)), len: 0}
    }

    pub fn insert(&mut self, val: T) -> Result<(), IndexError> {
        let key = self.key_of.extract(&val).ok_or(IndexError::InvalidValue)?;
        self.root.insert(key, val);
        self.len += 1;
        Ok(())
    }

    pub fn find<Q: PartialOrd<K>>(&self, key: &Q) -> Option<&T> {
        let mut cur = &self.root.node;
        while let Some(n) = cur {
            if *key < n.key {
                cur = &n.left.node;
            } else if *key > n.key {
                cur = &n.right.node;
            } else {
                return Some(&n.val);
            }
        }
        None
    }

    pub fn require<Q: PartialOrd<K>>(&self, key: &Q) -> Result<&T, IndexError> {
        self.find(key).ok_or(IndexError::NotFound)
    }

    pub fn contains<Q: PartialOrd<K>>(&self, key: &Q) -> bool {
        self.find(key).is_some()
    }

    /// Removes the first value found under `key` and returns it. Deleting an
    /// absent key is a no-op.
    pub fn delete<Q: PartialOrd<K>>(&mut self, key: &Q) -> Option<T> {
        let deleted = self.root.delete(key);
        if deleted.is_some() {
            self.len -= 1;
        }
        deleted
    }

    pub fn export_ordered(&self) -> Vec<&T> {
        self.iter().collect()
    }

    pub fn iter(&self) -> OrderedIndexIterator<'_, K, T> {
        OrderedIndexIterator::new(&self.root)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.node.is_none()
    }

    pub fn height(&self) -> u32 {
        self.root.height()
    }

    pub fn clear(&mut self) {
        self.root = NodeRef::new();
        self.len = 0;
    }
}

impl<'a, K: Ord, T> IntoIterator for &'a OrderedIndex<K, T> {
    type Item = &'a T;
    type IntoIter = OrderedIndexIterator<'a, K, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
fn test_check_node<K: Ord, T>(n: &NodeRef<K, T>) -> u32 {
    match &n.node {
        None => return 0,
        Some(n) => {
            let lheight = test_check_node(&n.left);
            let rheight = test_check_node(&n.right);
            let height = core::cmp::max(lheight, rheight) + 1;
            assert_eq!(n.height, height);
            assert!(lheight <= rheight + 1 && rheight <= lheight + 1);

            let mut lneigh = &n.left.node;
            while let Some(lneighn) = &lneigh {
                assert!(lneighn.key <= n.key);
                lneigh = &lneighn.right.node;
            }

            let mut rneigh = &n.right.node;
            while let Some(rneighn) = &rneigh {
                assert!(n.key <= rneighn.key);
                rneigh = &rneighn.left.node;
            }

            height
        }
    }
}

#[cfg(test)]
fn test_height_bound(len: usize) -> f64 {
    1.44 * ((len + 2) as f64).log2()
}

#[cfg(test)]
fn test_new_index() -> OrderedIndex<u32, (u32, u32)> {
    OrderedIndex::new(|v: &(u32, u32)| v.0)
}

#[cfg(test)]
fn test_keys(t: &OrderedIndex<u32, (u32, u32)>) -> Vec<u32> {
    t.export_ordered().iter().map(|v| v.0).collect()
}

#[test]
fn test_scenario_delete_root() {
    let mut t = test_new_index();
    for k in [5, 3, 8, 1, 4, 7, 9] {
        t.insert((k, k * 10)).unwrap();
        test_check_node(&t.root);
    }
    assert_eq!(test_keys(&t), vec![1, 3, 4, 5, 7, 8, 9]);

    assert_eq!(t.delete(&5), Some((5, 50)));
    test_check_node(&t.root);
    assert_eq!(test_keys(&t), vec![1, 3, 4, 7, 8, 9]);
    assert_eq!(t.find(&5), None);
    assert_eq!(t.len(), 6);
}

#[test]
fn test_ascending_inserts_rebalance() {
    let mut t = test_new_index();
    for k in 1..=5 {
        t.insert((k, 0)).unwrap();
        test_check_node(&t.root);
    }
    assert!(t.height() <= 3);
    assert_eq!(test_keys(&t), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_find() {
    let mut t = test_new_index();
    assert_eq!(t.find(&1), None);
    assert_eq!(t.require(&1), Err(IndexError::NotFound));

    for k in (0..200).step_by(2) {
        t.insert((k, k + 1)).unwrap();
    }
    for k in (0..200).step_by(2) {
        assert_eq!(t.find(&k), Some(&(k, k + 1)));
        assert_eq!(t.find(&(k + 1)), None);
    }
    assert_eq!(t.require(&42), Ok(&(42, 43)));
    assert!(t.contains(&198));
    assert!(!t.contains(&199));
}

#[test]
fn test_delete_missing_is_noop() {
    let mut t = test_new_index();
    assert_eq!(t.delete(&3), None);
    assert!(t.is_empty());

    for k in [2, 1, 3] {
        t.insert((k, k)).unwrap();
    }
    assert_eq!(t.delete(&2), Some((2, 2)));
    assert_eq!(t.delete(&2), None);
    test_check_node(&t.root);
    assert_eq!(t.len(), 2);
    assert_eq!(test_keys(&t), vec![1, 3]);
}

#[test]
fn test_invalid_value() {
    let mut t: OrderedIndex<u32, Option<u32>> = OrderedIndex::with_partial_key(|v: &Option<u32>| *v);
    t.insert(Some(1)).unwrap();
    assert_eq!(t.insert(None), Err(IndexError::InvalidValue));
    assert_eq!(t.len(), 1);
    assert_eq!(t.height(), 1);
    assert_eq!(t.export_ordered(), vec![&Some(1)]);
}

#[test]
fn test_insert_delete_same() {
    let mut t = test_new_index();

    for i in 0..128 {
        t.insert((0, i)).unwrap();
        test_check_node(&t.root);
        assert_eq!(t.len(), (i + 1) as usize);
        assert!((t.height() as f64) <= test_height_bound(t.len()));
    }
    let seqs: Vec<u32> = t.iter().map(|v| v.1).collect();
    assert_eq!(seqs, (0..128).collect::<Vec<u32>>());

    for i in 0..128 {
        assert!(t.delete(&0).is_some());
        test_check_node(&t.root);
        assert_eq!(t.len(), (127 - i) as usize);
    }
    assert_eq!(t.delete(&0), None);
    assert!(t.is_empty());
    assert_eq!(t.root.node.is_none(), true);
}

#[test]
fn test_insert_delete_strided() {
    let mut t = test_new_index();

    for i in (0..256).step_by(4) {
        for j in [0, 2, 3, 1] {
            t.insert((i + j, i + j)).unwrap();
            test_check_node(&t.root);
            assert_eq!(t.find(&(i + j)), Some(&(i + j, i + j)));

            t.insert((i + 256 + j, i + 256 + j)).unwrap();
            test_check_node(&t.root);
            assert_eq!(t.find(&(i + 256 + j)), Some(&(i + 256 + j, i + 256 + j)));
        }
    }
    assert_eq!(t.len(), 512);
    assert_eq!(test_keys(&t), (0..512).collect::<Vec<u32>>());
    assert!((t.height() as f64) <= test_height_bound(512));

    for i in (0..256).step_by(4) {
        for j in [0, 2, 3, 1] {
            assert_eq!(t.delete(&(i + j)), Some((i + j, i + j)));
            test_check_node(&t.root);
            assert_eq!(t.find(&(i + j)), None);
        }
    }
    assert_eq!(t.len(), 256);
    assert_eq!(test_keys(&t), (256..512).collect::<Vec<u32>>());

    for i in (0..256).step_by(4).rev() {
        for j in [0, 2, 3, 1].iter().rev() {
            assert_eq!(t.delete(&(i + 256 + j)), Some((i + 256 + j, i + 256 + j)));
            test_check_node(&t.root);
        }
    }
    assert!(t.is_empty());
    assert_eq!(t.len(), 0);
    assert_eq!(t.height(), 0);
}

#[test]
fn test_clear() {
    let mut t = test_new_index();
    for k in 0..10 {
        t.insert((k, k)).unwrap();
    }
    t.clear();
    assert!(t.is_empty());
    assert_eq!(t.len(), 0);
    assert_eq!(t.iter().count(), 0);
    t.insert((1, 1)).unwrap();
    assert_eq!((&t).into_iter().count(), 1);
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::{collection::{btree_set, vec}, prelude::*};

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u32),
        Delete(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..64u32).prop_map(Op::Insert),
            (0..64u32).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn ops_match_sorted_model(ops in vec(op(), 0..400)) {
            let mut t = test_new_index();
            let mut model: Vec<u32> = Vec::new();
            let mut seq = 0;

            for op in ops {
                match op {
                    Op::Insert(k) => {
                        t.insert((k, seq)).unwrap();
                        seq += 1;
                        let pos = model.partition_point(|m| *m <= k);
                        model.insert(pos, k);
                    },
                    Op::Delete(k) => {
                        let deleted = t.delete(&k);
                        match model.binary_search(&k) {
                            Ok(pos) => {
                                prop_assert_eq!(deleted.map(|v| v.0), Some(k));
                                model.remove(pos);
                            },
                            Err(_) => prop_assert!(deleted.is_none()),
                        }
                    },
                }
                test_check_node(&t.root);
                prop_assert_eq!(t.len(), model.len());
                prop_assert!((t.height() as f64) <= test_height_bound(t.len()));
            }

            prop_assert_eq!(test_keys(&t), model.clone());
            for k in 0..64u32 {
                prop_assert_eq!(t.find(&k).is_some(), model.binary_search(&k).is_ok());
            }
        }

        #[test]
        fn export_is_permutation_invariant(keys in Just((0..300u32).collect::<Vec<u32>>()).prop_shuffle()) {
            let mut t = test_new_index();
            for k in &keys {
                t.insert((*k, *k)).unwrap();
            }
            test_check_node(&t.root);
            prop_assert_eq!(test_keys(&t), (0..300u32).collect::<Vec<u32>>());
            prop_assert!((t.height() as f64) <= test_height_bound(300));
        }

        #[test]
        fn delete_is_idempotent(keys in btree_set(0..100u32, 1..100), victim in 0..100u32) {
            let mut once = test_new_index();
            let mut twice = test_new_index();
            for k in &keys {
                once.insert((*k, 0)).unwrap();
                twice.insert((*k, 0)).unwrap();
            }

            once.delete(&victim);
            twice.delete(&victim);
            twice.delete(&victim);
            test_check_node(&twice.root);
            prop_assert_eq!(test_keys(&once), test_keys(&twice));
            prop_assert_eq!(once.len(), twice.len());
            let expected = if keys.contains(&victim) { keys.len() - 1 } else { keys.len() };
            prop_assert_eq!(twice.len(), expected);
            prop_assert!(twice.find(&victim).is_none());
        }
    }
}
