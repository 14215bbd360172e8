use std::fmt;
use std::iter::FromIterator;

use crate::cycle::iter::{IntoIter, Iter, IterMut};
use crate::cycle::slots::{Node, Slots};
use crate::error::{Error, Result};

/// Arenas this small are never compacted.
const COMPACT_MIN_SLOTS: usize = 16;

/// Where the checked-out item sits, expressed through its predecessor so that
/// removal is a single unlink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Checkout {
    /// Nothing fetched since the last removal (or since the queue emptied).
    None,
    /// The checked-out item is the head.
    Front,
    /// The checked-out item is the `next` of this slot.
    After(usize),
}

/// A container that hands out its items one at a time in a repeating, fair
/// order and lets the caller drop the item it was just handed.
///
/// Every item present is returned exactly once per cycle. A cycle ends
/// lazily: only when a fetch finds every item already visited are the
/// visited flags cleared and a new pass started from the head. New items are
/// inserted at the head, so an item added mid-cycle is the next one fetched.
///
/// The queue does no locking of its own. All mutating operations take
/// `&mut self`, so sharing it between threads needs an outer lock (for
/// example `Arc<Mutex<CyclicQueue<T>>>`) held across a fetch and the removal
/// that goes with it.
///
/// ```
/// use round_robin::CyclicQueue;
///
/// let mut queue = CyclicQueue::new();
/// queue.add("first");
/// queue.add("second");
/// queue.add("third");
///
/// assert_eq!(queue.fetch(), Some(&mut "third"));
/// assert_eq!(queue.fetch(), Some(&mut "second"));
/// queue.remove_current().unwrap();
/// assert_eq!(queue.fetch(), Some(&mut "first"));
/// assert_eq!(queue.fetch(), Some(&mut "third"));
/// assert_eq!(queue.len(), 2);
/// ```
pub struct CyclicQueue<T> {
    slots: Slots<T>,
    head: Option<usize>,
    len: usize,
    checkout: Checkout,
}

impl<T> CyclicQueue<T> {
    pub fn new() -> Self {
        CyclicQueue::with_capacity(0)
    }

    /// Creates an empty queue with room for `capacity` items before the
    /// backing storage reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        CyclicQueue {
            slots: Slots::with_capacity(capacity),
            head: None,
            len: 0,
            checkout: Checkout::None,
        }
    }

    /// Inserts `value` at the front, unvisited. It becomes the next item
    /// returned by [`fetch`](Self::fetch).
    ///
    /// An active checkout survives the insertion: `remove_current` still
    /// targets the item fetched before the `add`.
    pub fn add(&mut self, value: T) {
        let index = self.slots.insert(Node::new(value, self.head));

        if self.checkout == Checkout::Front {
            self.checkout = Checkout::After(index);
        }

        self.head = Some(index);
        self.len += 1;
    }

    /// Returns the next unvisited item and checks it out for removal, or
    /// `None` when the queue is empty.
    ///
    /// Starts a new cycle first if every item has already been visited.
    pub fn fetch(&mut self) -> Option<&mut T> {
        let head = match self.head {
            Some(head) => head,
            None => {
                self.checkout = Checkout::None;
                return None;
            }
        };

        let found = match self.first_unvisited() {
            Some(found) => Some(found),
            None => {
                debug!("All {} items visited, starting a new cycle", self.len);
                self.reset_visited();
                self.first_unvisited()
            }
        };

        let (prev, index) = match found {
            Some(found) => found,
            None => {
                error!("No unvisited item after a cycle reset; falling back to the head");
                self.checkout = Checkout::None;
                return self.slots.get_mut(head).map(|node| &mut node.value);
            }
        };

        self.checkout = match prev {
            Some(prev) => Checkout::After(prev),
            None => Checkout::Front,
        };
        trace!("Checked out slot {} ({:?})", index, self.checkout);

        let node = self.slots.get_mut(index)?;
        node.visited = true;

        Some(&mut node.value)
    }

    /// Like [`fetch`](Self::fetch), but an empty queue is an error.
    pub fn try_fetch(&mut self) -> Result<&mut T> {
        self.fetch().ok_or(Error::EmptyContainer)
    }

    /// Drops the item returned by the last fetch.
    ///
    /// Fails with [`Error::EmptyContainer`] on an empty queue and with
    /// [`Error::NoCurrentPosition`] when nothing has been fetched since the
    /// previous removal.
    pub fn remove_current(&mut self) -> Result<()> {
        self.take_current().map(drop)
    }

    /// Unlinks the item returned by the last fetch and hands it back.
    ///
    /// Same preconditions as [`remove_current`](Self::remove_current). Either
    /// way the checkout is consumed: a second call without a fetch in between
    /// fails with [`Error::NoCurrentPosition`].
    pub fn take_current(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(Error::EmptyContainer);
        }

        let (prev, index) = self.checked_out().ok_or(Error::NoCurrentPosition)?;
        let node = self.slots.remove(index).ok_or(Error::NoCurrentPosition)?;

        match prev {
            Some(prev) => {
                if let Some(prev) = self.slots.get_mut(prev) {
                    prev.next = node.next;
                }
            }
            None => self.head = node.next,
        }

        self.len -= 1;
        self.checkout = Checkout::None;
        debug!("Removed checked-out slot {}, {} items left", index, self.len);
        self.shrink_if_sparse();

        Ok(node.value)
    }

    /// The item returned by the last fetch, if it is still checked out.
    pub fn peek_current(&self) -> Option<&T> {
        let (_, index) = self.checked_out()?;

        self.slots.get(index).map(|node| &node.value)
    }

    /// Drops every item and forgets the checkout.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.len = 0;
        self.checkout = Checkout::None;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Items from head to tail, i.e. the fetch order of a fresh cycle. Does not
    /// touch visited flags or the checkout.
    pub fn iter(&self) -> Iter<T> {
        Iter::new(&self.slots, self.head, self.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<T> {
        let mut nodes = self.slots.split_mut();
        let mut values = Vec::with_capacity(self.len);
        let mut link = self.head;

        while let Some(index) = link {
            match nodes.get_mut(index).and_then(Option::take) {
                Some(node) => {
                    link = node.next;
                    values.push(&mut node.value);
                }
                None => break,
            }
        }

        IterMut::new(values)
    }

    fn checked_out(&self) -> Option<(Option<usize>, usize)> {
        match self.checkout {
            Checkout::None => None,
            Checkout::Front => self.head.map(|head| (None, head)),
            Checkout::After(prev) => {
                let index = self.slots.get(prev)?.next?;
                Some((Some(prev), index))
            }
        }
    }

    fn first_unvisited(&self) -> Option<(Option<usize>, usize)> {
        let mut prev = None;
        let mut link = self.head;

        while let Some(index) = link {
            let node = self.slots.get(index)?;
            if !node.visited {
                return Some((prev, index));
            }

            prev = Some(index);
            link = node.next;
        }

        None
    }

    fn reset_visited(&mut self) {
        let mut link = self.head;

        while let Some(node) = link.and_then(|index| self.slots.get_mut(index)) {
            node.visited = false;
            link = node.next;
        }
    }

    /// Rebuilds the arena once freed slots outnumber live items, so resets and
    /// `iter_mut` stay proportional to `len`. Only called with no checkout:
    /// compaction renumbers every slot.
    fn shrink_if_sparse(&mut self) {
        let allocated = self.slots.allocated();
        if allocated <= COMPACT_MIN_SLOTS || allocated <= 2 * self.len {
            return;
        }

        debug!("Compacting {} slots down to {} items", allocated, self.len);
        self.head = self.slots.compact(self.head);
    }
}

impl<T> Default for CyclicQueue<T> {
    fn default() -> Self {
        CyclicQueue::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for CyclicQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Extend<T> for CyclicQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl<T> FromIterator<T> for CyclicQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut queue = CyclicQueue::with_capacity(iter.size_hint().0);
        queue.extend(iter);

        queue
    }
}

impl<T> IntoIterator for CyclicQueue<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> IntoIter<T> {
        let mut values = Vec::with_capacity(self.len);
        let mut link = self.head;

        while let Some(node) = link.and_then(|index| self.slots.remove(index)) {
            link = node.next;
            values.push(node.value);
        }

        IntoIter::new(values)
    }
}

impl<'a, T> IntoIterator for &'a CyclicQueue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut CyclicQueue<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> CyclicQueue<&'static str> {
        let mut queue = CyclicQueue::new();
        queue.add("first");
        queue.add("second");
        queue.add("third");
        queue
    }

    #[test]
    fn empty_queue() {
        let mut queue: CyclicQueue<String> = CyclicQueue::new();

        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.fetch().is_none());
        assert_eq!(queue.try_fetch(), Err(Error::EmptyContainer));
        assert_eq!(queue.remove_current(), Err(Error::EmptyContainer));
    }

    #[test]
    fn most_recent_add_comes_first() {
        let mut queue = three();

        assert_eq!(queue.try_fetch().map(|v| *v), Ok("third"));
        assert_eq!(queue.try_fetch().map(|v| *v), Ok("second"));
        assert_eq!(queue.try_fetch().map(|v| *v), Ok("first"));
        assert_eq!(queue.try_fetch().map(|v| *v), Ok("third"));
    }

    #[test]
    fn single_item_repeats() {
        let mut queue = CyclicQueue::new();
        queue.add("only");

        for _ in 0..3 {
            assert_eq!(queue.fetch().copied(), Some("only"));
        }
    }

    #[test]
    fn remove_requires_a_fetch() {
        let mut queue = three();
        assert_eq!(queue.remove_current(), Err(Error::NoCurrentPosition));

        queue.fetch();
        assert_eq!(queue.remove_current(), Ok(()));
        assert_eq!(queue.remove_current(), Err(Error::NoCurrentPosition));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn removing_the_head_checkout() {
        let mut queue = three();

        assert_eq!(queue.fetch().copied(), Some("third"));
        assert_eq!(queue.take_current(), Ok("third"));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec!["second", "first"]);
        assert_eq!(queue.fetch().copied(), Some("second"));
    }

    #[test]
    fn removing_a_middle_checkout() {
        let mut queue = three();

        queue.fetch();
        assert_eq!(queue.fetch().copied(), Some("second"));
        assert_eq!(queue.take_current(), Ok("second"));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec!["third", "first"]);

        assert_eq!(queue.fetch().copied(), Some("first"));
        assert_eq!(queue.fetch().copied(), Some("third"));
    }

    #[test]
    fn removing_the_tail_checkout() {
        let mut queue = three();

        queue.fetch();
        queue.fetch();
        assert_eq!(queue.fetch().copied(), Some("first"));
        assert_eq!(queue.take_current(), Ok("first"));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec!["third", "second"]);
        assert_eq!(queue.fetch().copied(), Some("third"));
    }

    #[test]
    fn removing_the_last_item_resets_the_checkout() {
        let mut queue = CyclicQueue::new();
        queue.add(1);

        queue.fetch();
        queue.remove_current().unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.remove_current(), Err(Error::EmptyContainer));
        assert!(queue.fetch().is_none());

        queue.add(2);
        assert_eq!(queue.remove_current(), Err(Error::NoCurrentPosition));
        assert_eq!(queue.fetch().copied(), Some(2));
    }

    #[test]
    fn add_keeps_the_checkout() {
        let mut queue = three();

        assert_eq!(queue.fetch().copied(), Some("third"));
        queue.add("fourth");
        assert_eq!(queue.peek_current(), Some(&"third"));
        assert_eq!(queue.take_current(), Ok("third"));

        assert_eq!(queue.fetch().copied(), Some("fourth"));
        assert_eq!(queue.fetch().copied(), Some("second"));
        assert_eq!(queue.fetch().copied(), Some("first"));
        assert_eq!(queue.fetch().copied(), Some("fourth"));
    }

    #[test]
    fn add_mid_cycle_is_served_before_the_reset() {
        let mut queue = CyclicQueue::new();
        queue.add("A");
        queue.add("B");

        assert_eq!(queue.fetch().copied(), Some("B"));
        queue.add("C");
        assert_eq!(queue.fetch().copied(), Some("C"));
        assert_eq!(queue.fetch().copied(), Some("A"));
        assert_eq!(queue.fetch().copied(), Some("C"));
    }

    #[test]
    fn peek_follows_the_checkout() {
        let mut queue = three();
        assert_eq!(queue.peek_current(), None);

        queue.fetch();
        queue.fetch();
        assert_eq!(queue.peek_current(), Some(&"second"));

        queue.remove_current().unwrap();
        assert_eq!(queue.peek_current(), None);
    }

    #[test]
    fn fetched_item_can_be_mutated_in_place() {
        let mut queue: CyclicQueue<Vec<i32>> = CyclicQueue::new();
        queue.add(vec![1, 2]);

        queue.fetch().unwrap().push(3);
        assert_eq!(queue.fetch().map(|v| v.len()), Some(3));
    }

    #[test]
    fn clear_drops_everything() {
        let mut queue = three();
        queue.fetch();

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.iter().count(), 0);
        assert_eq!(queue.remove_current(), Err(Error::EmptyContainer));

        queue.add("again");
        assert_eq!(queue.fetch().copied(), Some("again"));
    }

    #[test]
    fn collect_and_iterate_in_fetch_order() {
        let mut queue: CyclicQueue<u32> = (1..=4).collect();
        assert_eq!(queue.len(), 4);
        assert_eq!(format!("{:?}", queue), "[4, 3, 2, 1]");

        for value in &mut queue {
            *value *= 10;
        }

        let borrowed: Vec<u32> = (&queue).into_iter().copied().collect();
        assert_eq!(borrowed, vec![40, 30, 20, 10]);
        assert_eq!(queue.fetch().copied(), Some(40));

        let owned: Vec<u32> = queue.into_iter().collect();
        assert_eq!(owned, vec![40, 30, 20, 10]);
    }

    #[test]
    fn iteration_does_not_disturb_the_cycle() {
        let mut queue = three();
        queue.fetch();

        assert_eq!(queue.iter().len(), 3);
        assert_eq!(queue.iter_mut().len(), 3);
        assert_eq!(queue.peek_current(), Some(&"third"));
        assert_eq!(queue.fetch().copied(), Some("second"));
    }

    #[test]
    fn arena_shrinks_after_a_large_drain() {
        let mut queue: CyclicQueue<u32> = (0..1000).collect();
        assert_eq!(queue.slots.allocated(), 1000);

        while queue.len() > 1 {
            queue.fetch();
            queue.remove_current().unwrap();
        }
        assert!(queue.slots.allocated() <= COMPACT_MIN_SLOTS);

        for _ in 0..3 {
            assert_eq!(queue.fetch().copied(), Some(0));
        }
        assert_eq!(queue.iter_mut().len(), 1);
    }

    #[test]
    fn arena_stays_within_twice_len() {
        let mut queue: CyclicQueue<u32> = (0..500).collect();

        // Every other fetch removes, so the holes are scattered.
        for round in 0..400 {
            queue.fetch();
            if round % 2 == 0 {
                queue.remove_current().unwrap();
                let allocated = queue.slots.allocated();
                assert!(allocated <= COMPACT_MIN_SLOTS.max(2 * queue.len()));
            }
        }
        assert_eq!(queue.len(), 300);
    }

    #[test]
    fn compaction_keeps_order_and_visited_flags() {
        let mut queue: CyclicQueue<u32> = (0..40).collect();
        assert_eq!(queue.fetch().copied(), Some(39));

        // 39 stays visited while 38..=14 are removed behind it.
        for expected in (14..=38).rev() {
            assert_eq!(queue.fetch().copied(), Some(expected));
            queue.remove_current().unwrap();
        }
        assert!(queue.slots.allocated() < 40);
        assert_eq!(queue.fetch().copied(), Some(13));
        assert_eq!(queue.fetch().copied(), Some(12));

        queue.add(100);
        let rest: Vec<u32> = (0..13).map(|_| *queue.fetch().unwrap()).collect();
        let mut expected = vec![100];
        expected.extend((0..=11).rev());
        assert_eq!(rest, expected);

        let order: Vec<u32> = queue.iter().copied().collect();
        let mut expected = vec![100, 39];
        expected.extend((0..=13).rev());
        assert_eq!(order, expected);
        assert_eq!(queue.fetch().copied(), Some(100));
    }

    #[test]
    fn mem_take_moves_everything() {
        let mut source = three();
        source.fetch();

        let mut moved = std::mem::take(&mut source);
        assert!(source.is_empty());
        assert_eq!(source.len(), 0);
        assert_eq!(moved.len(), 3);
        assert_eq!(moved.peek_current(), Some(&"third"));
        assert_eq!(moved.fetch().copied(), Some("second"));
    }
}
