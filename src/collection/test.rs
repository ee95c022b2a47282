use itertools::Itertools;
use proptest::prelude::*;

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    name: &'static str,
    index: usize,
}

impl Item {
    fn new(name: &'static str, index: usize) -> Self {
        Item { name, index }
    }
}

impl HasIndex for Item {
    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

fn names(c: &OrderedIndexCollection<usize, Item>) -> Vec<&'static str> {
    c.iter().map(|(_, item)| item.name).collect()
}

fn abc() -> OrderedIndexCollection<usize, Item> {
    let mut c = OrderedIndexCollection::new();
    c.add(10, Item::new("a", 0)).unwrap();
    c.add(11, Item::new("b", 1)).unwrap();
    c.add(12, Item::new("c", 2)).unwrap();
    c
}

#[test]
fn add_appends_and_clamps() {
    let mut c = abc();
    c.add(13, Item::new("d", 42)).unwrap();

    assert_eq!(names(&c), ["a", "b", "c", "d"]);
    assert_eq!(c.position_of(13), Some(3));
    assert!(c.is_contiguous());
}

#[test]
fn add_in_the_middle_shuffles_up() {
    let mut c = abc();
    c.add(13, Item::new("x", 1)).unwrap();

    assert_eq!(names(&c), ["a", "x", "b", "c"]);
    assert_eq!(c.position_of(10), Some(0));
    assert_eq!(c.position_of(13), Some(1));
    assert_eq!(c.position_of(11), Some(2));
    assert_eq!(c.position_of(12), Some(3));
}

#[test]
fn add_at_front() {
    let mut c = abc();
    c.add(13, Item::new("x", 0)).unwrap();

    assert_eq!(names(&c), ["x", "a", "b", "c"]);
    assert!(c.is_contiguous());
}

#[test]
fn delete_shuffles_down() {
    let mut c = abc();
    let removed = c.delete(11).unwrap();

    assert_eq!(removed.name, "b");
    assert_eq!(names(&c), ["a", "c"]);
    assert_eq!(c.position_of(12), Some(1));
    assert!(c.is_contiguous());
}

#[test]
fn delete_missing_key() {
    let mut c = abc();
    assert_eq!(c.delete(99), Err(CollectionError::KeyNotFound(99)));
    assert_eq!(c.len(), 3);
}

#[test]
fn duplicate_key() {
    let mut c = abc();
    assert_eq!(
        c.add(10, Item::new("again", 0)),
        Err(CollectionError::DuplicateKey(10))
    );
    assert_eq!(names(&c), ["a", "b", "c"]);
}

#[test]
fn negative_keys_are_rejected() {
    let mut c = abc();
    assert_eq!(
        c.add_signed(-1, Item::new("neg", 0)),
        Err(CollectionError::InvalidKey(-1))
    );
    assert_eq!(c.delete_signed(-7), Err(CollectionError::InvalidKey(-7)));
    assert_eq!(c.get_signed(-2), Err(CollectionError::InvalidKey(-2)));
    assert_eq!(c.get_signed(11).unwrap().map(|i| i.name), Some("b"));
}

#[test]
fn set_index_moves_and_clamps() {
    let mut c = abc();

    c.set_index(10, 2).unwrap();
    assert_eq!(names(&c), ["b", "c", "a"]);

    c.set_index(10, 100).unwrap();
    assert_eq!(names(&c), ["b", "c", "a"]);

    c.set_index(12, 0).unwrap();
    assert_eq!(names(&c), ["c", "b", "a"]);
    assert!(c.is_contiguous());

    assert_eq!(c.set_index(77, 0), Err(CollectionError::KeyNotFound(77)));
}

#[test]
fn update_in_place_and_with_move() {
    let mut c = abc();

    let old = c.update(11, Item::new("B", 1)).unwrap();
    assert_eq!(old.name, "b");
    assert_eq!(names(&c), ["a", "B", "c"]);

    c.update(10, Item::new("A", 2)).unwrap();
    assert_eq!(names(&c), ["B", "c", "A"]);
    assert!(c.is_contiguous());

    assert_eq!(
        c.update(5, Item::new("z", 0)),
        Err(CollectionError::KeyNotFound(5))
    );
}

#[test]
fn modify_cannot_move() {
    let mut c = abc();
    c.modify(12, |item| {
        item.name = "C";
        item.index = 0;
    })
    .unwrap();

    assert_eq!(names(&c), ["a", "b", "C"]);
    assert!(c.is_contiguous());
}

#[test]
fn key_at_follows_index() {
    let c = abc();
    assert_eq!(c.keys().collect_vec(), [10, 11, 12]);
    assert_eq!(c.key_at(1), Some(11));
    assert_eq!(c.key_at(3), None);
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize, usize),
    Delete(usize),
    SetIndex(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..16usize, 0..20usize).prop_map(|(k, i)| Op::Add(k, i)),
        (0..16usize).prop_map(Op::Delete),
        (0..16usize, 0..20usize).prop_map(|(k, i)| Op::SetIndex(k, i)),
    ]
}

proptest! {
    #[test]
    fn indices_stay_contiguous(ops in prop::collection::vec(op(), 0..64)) {
        let mut c: OrderedIndexCollection<usize, Slot> = OrderedIndexCollection::new();
        for op in ops {
            let _ = match op {
                Op::Add(k, i) => c.add(k, Slot::at(i)),
                Op::Delete(k) => c.delete(k).map(|_| ()),
                Op::SetIndex(k, i) => c.set_index(k, i),
            };
            prop_assert!(c.is_contiguous());
            let indices = c.iter().map(|(_, s)| s.index).sorted().collect_vec();
            prop_assert_eq!(indices, (0..c.len()).collect_vec());
        }
    }

    #[test]
    fn insert_shifts_exactly_the_tail(n in 1..12usize, at in 0..12usize) {
        let at = at % n;
        let mut c: OrderedIndexCollection<usize, Slot> =
            (0..n).map(|k| (k, Slot::at(k))).collect();
        let before = c.iter().map(|(k, s)| (k, s.index)).collect_vec();

        c.add(100, Slot::at(at)).unwrap();

        prop_assert_eq!(c.position_of(100), Some(at));
        for (k, old) in before {
            let expected = if old >= at { old + 1 } else { old };
            prop_assert_eq!(c.position_of(k), Some(expected));
        }
    }

    #[test]
    fn delete_shifts_exactly_the_tail(n in 1..12usize, at in 0..12usize) {
        let at = at % n;
        let mut c: OrderedIndexCollection<usize, Slot> =
            (0..n).map(|k| (k, Slot::at(k))).collect();
        let victim = c.key_at(at).unwrap();
        let before = c.iter().map(|(k, s)| (k, s.index)).collect_vec();

        c.delete(victim).unwrap();

        for (k, old) in before.into_iter().filter(|(k, _)| *k != victim) {
            let expected = if old > at { old - 1 } else { old };
            prop_assert_eq!(c.position_of(k), Some(expected));
        }
    }
}
