//! Singly linked list whose nodes live inside a [`MemoryManager`] pool.
//!
//! Each node occupies one block laid out as:
//!
//! ```text
//!   ┌───────────┬──────────────────────────┬─────────┐
//!   │ value u16 │ next offset u64          │ padding │
//!   │  2 bytes  │ 8 bytes, MAX means none  │         │
//!   └───────────┴──────────────────────────┴─────────┘
//!   └──────────────── NODE_SIZE bytes ───────────────┘
//! ```

use std::fmt;

use crate::{
  block::Addr,
  error::{Error, Result},
  manager::MemoryManager,
};

const VALUE_LEN: usize = 2;
const NEXT_LEN: usize = 8;
const NO_NEXT: u64 = u64::MAX;

/// Bytes requested from the pool for every node.
pub const NODE_SIZE: usize = crate::align!(VALUE_LEN + NEXT_LEN);

/// Handle to a node in a [`LinkedList`].
///
/// It does not own the node and is only meaningful until that node is
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(Addr);

impl NodeRef {
  pub fn addr(self) -> Addr {
    self.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Node {
  value: u16,
  next: Option<NodeRef>,
}

impl Node {
  fn load(
    manager: &MemoryManager,
    node: NodeRef,
  ) -> Result<Self> {
    let bytes = manager.bytes(node.0)?;
    if bytes.len() < VALUE_LEN + NEXT_LEN {
      return Err(Error::InvalidArgument("block too small to hold a list node"));
    }

    let value = u16::from_le_bytes([bytes[0], bytes[1]]);
    let mut next = [0; NEXT_LEN];
    next.copy_from_slice(&bytes[VALUE_LEN..VALUE_LEN + NEXT_LEN]);
    let next = match u64::from_le_bytes(next) {
      NO_NEXT => None,
      offset => Some(NodeRef(Addr::new(offset as usize))),
    };

    Ok(Self { value, next })
  }

  fn store(
    &self,
    manager: &mut MemoryManager,
    node: NodeRef,
  ) -> Result<()> {
    let bytes = manager.bytes_mut(node.0)?;
    let next = self.next.map_or(NO_NEXT, |next| next.0.offset() as u64);

    bytes[..VALUE_LEN].copy_from_slice(&self.value.to_le_bytes());
    bytes[VALUE_LEN..VALUE_LEN + NEXT_LEN].copy_from_slice(&next.to_le_bytes());

    Ok(())
  }
}

/// A list of `u16` values backed by pool blocks.
///
/// The list borrows its manager for as long as it lives; every node is
/// allocated from it and freed back to it.
///
/// ```rust
/// use poolalloc::{LinkedList, MemoryManager};
///
/// let mut manager = MemoryManager::with_capacity(1024).unwrap();
/// let mut list = LinkedList::new(&mut manager);
///
/// list.insert(1).unwrap();
/// let three = list.insert(3).unwrap();
/// list.insert_before(Some(three), 2).unwrap();
///
/// assert_eq!(list.to_string(), "[1, 2, 3]");
/// list.cleanup().unwrap();
/// ```
pub struct LinkedList<'m> {
  head: Option<NodeRef>,
  manager: &'m mut MemoryManager,
}

impl<'m> LinkedList<'m> {
  pub fn new(manager: &'m mut MemoryManager) -> Self {
    Self {
      head: None,
      manager,
    }
  }

  pub fn head(&self) -> Option<NodeRef> {
    self.head
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_none()
  }

  pub fn manager(&self) -> &MemoryManager {
    self.manager
  }

  /// Value stored in `node`.
  pub fn value(
    &self,
    node: NodeRef,
  ) -> Result<u16> {
    Ok(Node::load(self.manager, node)?.value)
  }

  /// Node following `node`, if any.
  pub fn next(
    &self,
    node: NodeRef,
  ) -> Result<Option<NodeRef>> {
    Ok(Node::load(self.manager, node)?.next)
  }

  fn new_node(
    &mut self,
    value: u16,
    next: Option<NodeRef>,
  ) -> Result<NodeRef> {
    let node = match self.manager.alloc(NODE_SIZE) {
      Ok(addr) => NodeRef(addr),
      Err(err) => {
        tracing::warn!(value, %err, "failed to allocate list node");
        return Err(err);
      }
    };

    Node { value, next }.store(self.manager, node)?;
    Ok(node)
  }

  fn set_next(
    &mut self,
    node: NodeRef,
    next: Option<NodeRef>,
  ) -> Result<()> {
    let mut loaded = Node::load(self.manager, node)?;
    loaded.next = next;
    loaded.store(self.manager, node)
  }

  fn tail(&self) -> Result<Option<NodeRef>> {
    let mut current = self.head;

    while let Some(node) = current {
      match self.next(node)? {
        Some(next) => current = Some(next),
        None => return Ok(Some(node)),
      }
    }

    Ok(None)
  }

  /// Appends `value` after the last node.
  pub fn insert(
    &mut self,
    value: u16,
  ) -> Result<NodeRef> {
    let tail = self.tail()?;
    let node = self.new_node(value, None)?;

    match tail {
      Some(tail) => self.set_next(tail, Some(node))?,
      None => self.head = Some(node),
    }

    Ok(node)
  }

  /// Inserts `value` right after `prev`.
  pub fn insert_after(
    &mut self,
    prev: Option<NodeRef>,
    value: u16,
  ) -> Result<NodeRef> {
    let Some(prev) = prev else {
      return Err(Error::InvalidArgument("previous node is none"));
    };

    let next = self.next(prev)?;
    let node = self.new_node(value, next)?;
    self.set_next(prev, Some(node))?;

    Ok(node)
  }

  /// Inserts `value` right before `target`, replacing the head if `target`
  /// is the head.
  pub fn insert_before(
    &mut self,
    target: Option<NodeRef>,
    value: u16,
  ) -> Result<NodeRef> {
    let (Some(head), Some(target)) = (self.head, target) else {
      return Err(Error::InvalidArgument("empty list or target node is none"));
    };

    if head == target {
      let node = self.new_node(value, Some(head))?;
      self.head = Some(node);
      return Ok(node);
    }

    let Some(prev) = self.predecessor(head, target)? else {
      return Err(Error::NodeNotFound(target.addr()));
    };

    let node = self.new_node(value, Some(target))?;
    self.set_next(prev, Some(node))?;

    Ok(node)
  }

  fn predecessor(
    &self,
    head: NodeRef,
    target: NodeRef,
  ) -> Result<Option<NodeRef>> {
    let mut current = head;

    loop {
      match self.next(current)? {
        Some(next) if next == target => return Ok(Some(current)),
        Some(next) => current = next,
        None => return Ok(None),
      }
    }
  }

  /// Removes the first node holding `value`. Returns whether one was found.
  pub fn delete(
    &mut self,
    value: u16,
  ) -> Result<bool> {
    let mut prev: Option<NodeRef> = None;
    let mut current = self.head;

    while let Some(node) = current {
      let loaded = Node::load(self.manager, node)?;

      if loaded.value == value {
        match prev {
          Some(prev) => self.set_next(prev, loaded.next)?,
          None => self.head = loaded.next,
        }
        self.manager.free(node.addr())?;
        return Ok(true);
      }

      prev = Some(node);
      current = loaded.next;
    }

    Ok(false)
  }

  /// First node holding `value`.
  pub fn search(
    &self,
    value: u16,
  ) -> Result<Option<NodeRef>> {
    let mut current = self.head;

    while let Some(node) = current {
      let loaded = Node::load(self.manager, node)?;
      if loaded.value == value {
        return Ok(Some(node));
      }
      current = loaded.next;
    }

    Ok(None)
  }

  pub fn count(&self) -> Result<usize> {
    self.values().try_fold(0, |count, value| value.map(|_| count + 1))
  }

  pub fn values(&self) -> Values<'_> {
    Values {
      manager: self.manager,
      current: self.head,
    }
  }

  /// Renders the whole list, e.g. `[3, 7, 2]`.
  pub fn display(&self) -> Result<String> {
    let values = self.values().collect::<Result<Vec<_>>>()?;
    Ok(render(&values))
  }

  /// Renders the nodes from `start` (or the head) through `end` inclusive.
  ///
  /// Fails without rendering anything if `end` cannot be reached from the
  /// starting node.
  pub fn display_range(
    &self,
    start: Option<NodeRef>,
    end: NodeRef,
  ) -> Result<String> {
    let mut values = Vec::new();
    let mut current = start.or(self.head);

    while let Some(node) = current {
      let loaded = Node::load(self.manager, node)?;
      values.push(loaded.value);

      if node == end {
        return Ok(render(&values));
      }
      current = loaded.next;
    }

    Err(Error::InvalidArgument("end node not reachable from start"))
  }

  /// Frees every node, leaving an empty list on the same manager.
  pub fn clear(&mut self) -> Result<()> {
    while let Some(node) = self.head {
      self.head = self.next(node)?;
      self.manager.free(node.addr())?;
    }

    Ok(())
  }

  /// Frees every node and then tears the manager down.
  pub fn cleanup(mut self) -> Result<()> {
    self.clear()?;
    self.manager.deinit();
    Ok(())
  }
}

impl Drop for LinkedList<'_> {
  fn drop(&mut self) {
    if let Err(err) = self.clear() {
      tracing::warn!(%err, "failed to free list nodes on drop");
    }
  }
}

impl fmt::Display for LinkedList<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let rendered = self.display().map_err(|_| fmt::Error)?;
    f.write_str(&rendered)
  }
}

/// Iterator over the values of a [`LinkedList`], head first.
pub struct Values<'a> {
  manager: &'a MemoryManager,
  current: Option<NodeRef>,
}

impl Iterator for Values<'_> {
  type Item = Result<u16>;

  fn next(&mut self) -> Option<Self::Item> {
    let node = self.current?;

    match Node::load(self.manager, node) {
      Ok(loaded) => {
        self.current = loaded.next;
        Some(Ok(loaded.value))
      }
      Err(err) => {
        self.current = None;
        Some(Err(err))
      }
    }
  }
}

fn render(values: &[u16]) -> String {
  let joined = values
    .iter()
    .map(u16::to_string)
    .collect::<Vec<_>>()
    .join(", ");

  format!("[{joined}]")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn manager() -> MemoryManager {
    MemoryManager::with_capacity(NODE_SIZE * 16).unwrap()
  }

  fn filled<'m>(
    manager: &'m mut MemoryManager,
    values: &[u16],
  ) -> LinkedList<'m> {
    let mut list = LinkedList::new(manager);
    for &value in values {
      list.insert(value).unwrap();
    }
    list
  }

  #[test]
  fn test_insert_appends_in_order() {
    let mut manager = manager();
    let list = filled(&mut manager, &[1, 2, 3]);

    assert_eq!(list.display().unwrap(), "[1, 2, 3]");
    assert_eq!(list.count(), Ok(3));
  }

  #[test]
  fn test_empty_list() {
    let mut manager = manager();
    let list = LinkedList::new(&mut manager);

    assert!(list.is_empty());
    assert_eq!(list.to_string(), "[]");
    assert_eq!(list.count(), Ok(0));
    assert_eq!(list.search(1), Ok(None));
  }

  #[test]
  fn test_nodes_come_from_the_pool() {
    let mut manager = manager();
    let list = filled(&mut manager, &[5, 6]);

    let usage = list.manager().usage().unwrap();
    assert_eq!(usage.used, 2 * NODE_SIZE);

    let head = list.head().unwrap();
    assert_eq!(head.addr(), Addr::new(0));
    assert_eq!(list.next(head).unwrap().unwrap().addr(), Addr::new(NODE_SIZE));
  }

  #[test]
  fn test_insert_after() {
    let mut manager = manager();
    let mut list = filled(&mut manager, &[1, 3]);
    let one = list.search(1).unwrap();

    list.insert_after(one, 2).unwrap();
    let three = list.search(3).unwrap();
    list.insert_after(three, 4).unwrap();

    assert_eq!(list.to_string(), "[1, 2, 3, 4]");
  }

  #[test]
  fn test_insert_after_none() {
    let mut manager = manager();
    let mut list = filled(&mut manager, &[1]);

    assert!(matches!(
      list.insert_after(None, 2),
      Err(Error::InvalidArgument(_))
    ));
    assert_eq!(list.count(), Ok(1));
  }

  #[test]
  fn test_insert_before_head_and_middle() {
    let mut manager = manager();
    let mut list = filled(&mut manager, &[2, 4]);

    let head = list.head();
    let new_head = list.insert_before(head, 1).unwrap();
    let four = list.search(4).unwrap();
    list.insert_before(four, 3).unwrap();

    assert_eq!(list.head(), Some(new_head));
    assert_eq!(list.to_string(), "[1, 2, 3, 4]");
  }

  #[test]
  fn test_insert_before_invalid() {
    let mut manager = manager();
    let mut list = LinkedList::new(&mut manager);

    assert!(matches!(
      list.insert_before(Some(NodeRef(Addr::new(0))), 1),
      Err(Error::InvalidArgument(_))
    ));

    list.insert(1).unwrap();
    assert!(matches!(
      list.insert_before(None, 1),
      Err(Error::InvalidArgument(_))
    ));
  }

  #[test]
  fn test_insert_before_missing_target() {
    let mut manager = manager();
    let mut list = filled(&mut manager, &[1, 2]);
    let before = list.manager().blocks().unwrap().to_vec();
    let stranger = NodeRef(Addr::new(NODE_SIZE * 5));

    assert_eq!(
      list.insert_before(Some(stranger), 9),
      Err(Error::NodeNotFound(stranger.addr()))
    );
    assert_eq!(list.manager().blocks().unwrap(), &before[..]);
    assert_eq!(list.to_string(), "[1, 2]");
  }

  #[test]
  fn test_delete() {
    let mut manager = manager();
    let mut list = filled(&mut manager, &[1, 2, 3, 2]);

    assert_eq!(list.delete(2), Ok(true));
    assert_eq!(list.to_string(), "[1, 3, 2]");

    assert_eq!(list.delete(1), Ok(true));
    assert_eq!(list.to_string(), "[3, 2]");
    assert_eq!(list.head().map(|node| list.value(node)), Some(Ok(3)));

    assert_eq!(list.manager().usage().unwrap().used, 2 * NODE_SIZE);
  }

  #[test]
  fn test_delete_absent_is_noop() {
    let mut manager = manager();
    let mut list = filled(&mut manager, &[1, 2, 3]);

    assert_eq!(list.delete(7), Ok(false));
    assert_eq!(list.to_string(), "[1, 2, 3]");
    assert_eq!(list.count(), Ok(3));
  }

  #[test]
  fn test_insert_reports_exhaustion() {
    let mut manager = MemoryManager::with_capacity(NODE_SIZE * 2).unwrap();
    let mut list = filled(&mut manager, &[1, 2]);

    assert_eq!(
      list.insert(3),
      Err(Error::Exhausted {
        requested: NODE_SIZE
      })
    );
    assert_eq!(list.to_string(), "[1, 2]");
  }

  #[test]
  fn test_search() {
    let mut manager = manager();
    let list = filled(&mut manager, &[4, 8, 8]);

    let found = list.search(8).unwrap().unwrap();

    assert_eq!(found.addr(), Addr::new(NODE_SIZE));
    assert_eq!(list.value(found), Ok(8));
    assert_eq!(list.search(5), Ok(None));
  }

  #[test]
  fn test_display_range() {
    let mut manager = manager();
    let list = filled(&mut manager, &[1, 2, 3, 4, 5]);
    let two = list.search(2).unwrap();
    let four = list.search(4).unwrap().unwrap();

    assert_eq!(list.display_range(two, four).unwrap(), "[2, 3, 4]");
    assert_eq!(list.display_range(None, four).unwrap(), "[1, 2, 3, 4]");
    assert_eq!(list.display_range(Some(four), four).unwrap(), "[4]");
  }

  #[test]
  fn test_display_range_unreachable_end() {
    let mut manager = manager();
    let list = filled(&mut manager, &[1, 2, 3]);
    let one = list.search(1).unwrap().unwrap();
    let three = list.search(3).unwrap();

    assert!(matches!(
      list.display_range(three, one),
      Err(Error::InvalidArgument(_))
    ));
  }

  #[test]
  fn test_clear_returns_every_block() {
    let mut manager = manager();
    let mut list = filled(&mut manager, &[1, 2, 3]);

    list.clear().unwrap();

    assert!(list.is_empty());
    assert_eq!(list.manager().usage().unwrap().used, 0);
    assert_eq!(list.manager().blocks().unwrap().len(), 1);
  }

  #[test]
  fn test_drop_returns_every_block() {
    let mut manager = MemoryManager::with_capacity(NODE_SIZE * 4).unwrap();

    {
      let _list = filled(&mut manager, &[1, 2]);
    }

    assert_eq!(manager.usage().unwrap().used, 0);
    assert_eq!(manager.blocks().unwrap().len(), 1);

    let mut list = filled(&mut manager, &[3, 4, 5]);
    assert_eq!(list.insert(6).map(|node| node.addr()), Ok(Addr::new(NODE_SIZE * 3)));
    assert_eq!(list.to_string(), "[3, 4, 5, 6]");
  }

  #[test]
  fn test_cleanup_deinits_manager() {
    let mut manager = manager();
    let list = filled(&mut manager, &[1, 2, 3]);

    list.cleanup().unwrap();

    assert!(!manager.is_initialized());
  }

  #[test]
  fn test_stale_node_is_untracked() {
    let mut manager = manager();
    let mut list = filled(&mut manager, &[1, 2]);
    let two = list.search(2).unwrap().unwrap();

    list.delete(2).unwrap();

    assert_eq!(list.value(two), Err(Error::UntrackedPointer(two.addr())));
    assert_eq!(
      list.manager().block(two.addr()).map(|block| block.available),
      Ok(true)
    );
  }

  #[test]
  fn test_foreign_block_is_not_a_node() {
    let mut manager = manager();
    let small = manager.alloc(4).unwrap();
    let mut list = LinkedList::new(&mut manager);

    assert!(matches!(
      list.insert_after(Some(NodeRef(small)), 1),
      Err(Error::InvalidArgument(_))
    ));
    assert!(list.is_empty());
  }
}
