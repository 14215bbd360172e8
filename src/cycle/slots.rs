/// One element of the queue together with its per-cycle bookkeeping.
#[derive(Debug)]
pub struct Node<T> {
    pub value: T,
    pub visited: bool,
    pub next: Option<usize>,
}

impl<T> Node<T> {
    pub fn new(value: T, next: Option<usize>) -> Self {
        Node {
            value: value,
            visited: false,
            next: next,
        }
    }
}

/// Arena backing the linked sequence. Slot indices stay stable for as long
/// as the node lives, so they can be held as link and checkout handles.
#[derive(Debug)]
pub struct Slots<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
}

impl<T> Slots<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Slots {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, node: Node<T>) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Node<T>> {
        let node = self.slots.get_mut(index)?.take()?;
        self.free.push(index);

        Some(node)
    }

    pub fn get(&self, index: usize) -> Option<&Node<T>> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Slots in use or waiting on the free stack.
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    /// Rebuilds the arena densely in link order, dropping the freed slots and
    /// their memory. Node `i` links to `i + 1`; returns the new head.
    ///
    /// Any slot handle held across this call is stale.
    pub fn compact(&mut self, head: Option<usize>) -> Option<usize> {
        let live = self.slots.len() - self.free.len();
        let mut dense = Vec::with_capacity(live);
        let mut link = head;

        while let Some(mut node) = link.and_then(|index| self.remove(index)) {
            link = node.next;
            node.next = match link {
                Some(_) => Some(dense.len() + 1),
                None => None,
            };
            dense.push(Some(node));
        }

        self.slots = dense;
        self.free = Vec::new();

        if self.slots.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// Per-slot mutable handles, so a caller can pull nodes out in link order.
    pub fn split_mut(&mut self) -> Vec<Option<&mut Node<T>>> {
        self.slots.iter_mut().map(Option::as_mut).collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
