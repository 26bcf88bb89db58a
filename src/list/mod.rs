//! プール上にノードを格納する単方向連結リスト.
//!
//! ノードの格納領域は、全て[`PoolAllocator`]の`allocate`/`free`を通して確保・解放され、
//! ノードの読み書きもそのノード自身のブロックに対してのみ行われる.
//!
//! [`PoolAllocator`]: ../pool/struct.PoolAllocator.html
use prometrics::metrics::MetricBuilder;
use slog::Logger;
use trackable::error::ErrorKindExt;

pub use self::node::{Node, NodeRef, NODE_SIZE};

use crate::metrics::NodeListMetrics;
use crate::pool::{PoolAllocator, PoolAllocatorBuilder};
use crate::{Error, ErrorKind, Result};

mod node;

/// 値が`u16`の単方向連結リスト.
///
/// リストは、ノードの格納に使うアロケータを所有している.
///
/// # 終了性
///
/// リストの走査は、アロケータ内の割当済みブロック数を上限として打ち切られるため、
/// 外部から不正なリンクが書き込まれた場合でも無限ループに陥ることはない
/// (その場合には`ErrorKind::InconsistentState`が返される).
#[derive(Debug)]
pub struct NodeList {
    head: Option<NodeRef>,
    allocator: PoolAllocator,
    logger: Logger,
    metrics: NodeListMetrics,
}
impl NodeList {
    /// 新しい`NodeList`インスタンスを生成する.
    ///
    /// ノードの格納には、容量が`PoolAllocatorBuilder::DEFAULT_CAPACITY`バイトの新しいアロケータが使われる.
    pub fn new() -> Result<Self> {
        let allocator = track!(PoolAllocatorBuilder::new().build())?;
        track!(Self::with_allocator(allocator))
    }

    /// 初期化済みの`allocator`を用いる`NodeList`インスタンスを生成する.
    ///
    /// # Errors
    ///
    /// `allocator`が未初期化の場合には、種類が`ErrorKind::Uninitialized`のエラーが返される.
    pub fn with_allocator(allocator: PoolAllocator) -> Result<Self> {
        track!(Self::with_metrics(allocator, &MetricBuilder::new()))
    }

    /// メトリクス用の共通設定を指定して`NodeList`インスタンスを生成する.
    ///
    /// それ以外は`with_allocator`と同様.
    pub fn with_metrics(allocator: PoolAllocator, metrics: &MetricBuilder) -> Result<Self> {
        track_assert!(allocator.is_initialized(), ErrorKind::Uninitialized);
        let logger = allocator.logger().new(o!("component" => "node_list"));
        Ok(NodeList {
            head: None,
            allocator,
            logger,
            metrics: NodeListMetrics::new(metrics),
        })
    }

    /// 先頭ノードを返す.
    pub fn head(&self) -> Option<NodeRef> {
        self.head
    }

    /// リストが空かどうかを判定する.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// `node`の値を返す.
    pub fn value(&self, node: NodeRef) -> Result<u16> {
        track!(self.read_node(node)).map(|n| n.value)
    }

    /// `node`の後続ノードを返す.
    pub fn next(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        track!(self.read_node(node)).map(|n| n.next)
    }

    /// 先頭に`value`を持つノードを挿入する.
    ///
    /// # Errors
    ///
    /// ノード用の領域が確保できない場合には、種類が`ErrorKind::PoolFull`のエラーが返される.
    pub fn insert(&mut self, value: u16) -> Result<NodeRef> {
        let next = self.head;
        let node = track!(self.allocate_node(Node { value, next }))?;
        self.head = Some(node);
        Ok(node)
    }

    /// `prev`の直後に`value`を持つノードを挿入する.
    ///
    /// # Errors
    ///
    /// - `prev`がリスト内のノードではない: `ErrorKind::InvalidInput`
    /// - ノード用の領域が確保できない: `ErrorKind::PoolFull`
    pub fn insert_after(&mut self, prev: NodeRef, value: u16) -> Result<NodeRef> {
        track_assert!(track!(self.contains(prev))?, ErrorKind::InvalidInput; prev);
        let next = track!(self.next(prev))?;
        let node = track!(self.allocate_node(Node { value, next }))?;
        track!(self.link(prev, Some(node)))?;
        Ok(node)
    }

    /// `next`の直前に`value`を持つノードを挿入する.
    ///
    /// `next`がリスト内に存在するかどうかは、ノード用の領域を確保する前に検査される.
    ///
    /// # Errors
    ///
    /// - `next`がリスト内のノードではない: `ErrorKind::InvalidInput`
    /// - ノード用の領域が確保できない: `ErrorKind::PoolFull`
    pub fn insert_before(&mut self, next: NodeRef, value: u16) -> Result<NodeRef> {
        if self.head == Some(next) {
            return track!(self.insert(value));
        }

        let mut prev = None;
        for entry in self.walk(self.head) {
            let (node, record) = track!(entry)?;
            if record.next == Some(next) {
                prev = Some(node);
                break;
            }
        }
        let prev = track_assert_some!(
            prev,
            ErrorKind::InvalidInput,
            "Not a node in the list: {}",
            next
        );

        let node = track!(self.allocate_node(Node {
            value,
            next: Some(next)
        }))?;
        track!(self.link(prev, Some(node)))?;
        Ok(node)
    }

    /// 先頭から走査して、最初に見つかった`value`を持つノードを削除する.
    ///
    /// ノードが削除された場合には`true`が返される.
    pub fn delete(&mut self, value: u16) -> Result<bool> {
        let mut prev = None;
        let mut found = None;
        for entry in self.walk(self.head) {
            let (node, record) = track!(entry)?;
            if record.value == value {
                found = Some((node, record.next));
                break;
            }
            prev = Some(node);
        }

        let (node, next) = match found {
            None => return Ok(false),
            Some(found) => found,
        };
        if let Some(prev) = prev {
            track!(self.link(prev, next))?;
        } else {
            self.head = next;
        }
        self.release_node(node);
        Ok(true)
    }

    /// 先頭から走査して、最初に見つかった`value`を持つノードを返す.
    pub fn search(&self, value: u16) -> Result<Option<NodeRef>> {
        for entry in self.walk(self.head) {
            let (node, record) = track!(entry)?;
            if record.value == value {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// リスト内のノード数を返す.
    pub fn count(&self) -> Result<usize> {
        let mut count = 0;
        for entry in self.walk(self.head) {
            track!(entry)?;
            count += 1;
        }
        Ok(count)
    }

    /// リスト内の値を先頭から順に返す.
    pub fn values(&self) -> Result<Vec<u16>> {
        self.walk(self.head)
            .map(|entry| track!(entry).map(|(_, record)| record.value))
            .collect()
    }

    /// リスト全体を`[20, 10]`のような形式の文字列にする.
    ///
    /// リストが空の場合には`"NULL"`が返される.
    pub fn display(&self) -> Result<String> {
        let values = track!(self.values())?;
        Ok(render(&values))
    }

    /// `start`から`end`まで(両端を含む)のノードを、`display`と同じ形式の文字列にする.
    ///
    /// # Errors
    ///
    /// `start`がリスト内のノードではない場合や、
    /// `start`から後続ノードを辿っても`end`に到達しない場合には、
    /// 種類が`ErrorKind::InvalidInput`のエラーが返される.
    pub fn display_range(&self, start: NodeRef, end: NodeRef) -> Result<String> {
        track_assert!(track!(self.contains(start))?, ErrorKind::InvalidInput; start);

        let mut values = Vec::new();
        for entry in self.walk(Some(start)) {
            let (node, record) = track!(entry)?;
            values.push(record.value);
            if node == end {
                return Ok(render(&values));
            }
        }
        track_panic!(
            ErrorKind::InvalidInput,
            "Range not found: start={}, end={}",
            start,
            end
        );
    }

    /// 全てのノードを解放して、リストを空にする.
    pub fn cleanup(&mut self) -> Result<()> {
        let nodes = self
            .walk(self.head)
            .map(|entry| track!(entry).map(|(node, _)| node))
            .collect::<Result<Vec<_>>>()?;
        for &node in &nodes {
            self.release_node(node);
        }
        self.head = None;
        debug!(self.logger, "Cleaned up"; "released_nodes" => nodes.len());
        Ok(())
    }

    /// ノードの格納に使われているアロケータを返す.
    pub fn allocator(&self) -> &PoolAllocator {
        &self.allocator
    }

    /// ノードの格納に使われているアロケータを、変更可能な形で返す.
    ///
    /// # 注意
    ///
    /// ここからリスト内のノードを解放したり上書きした場合には、
    /// 以後のリスト操作がエラーとなり得る.
    pub fn allocator_mut(&mut self) -> &mut PoolAllocator {
        &mut self.allocator
    }

    /// リストを破棄して、アロケータを取り出す.
    ///
    /// リスト内のノードは解放されずにアロケータ内に残る.
    pub fn into_allocator(self) -> PoolAllocator {
        self.allocator
    }

    /// リスト用のメトリクスを返す.
    pub fn metrics(&self) -> &NodeListMetrics {
        &self.metrics
    }

    fn contains(&self, target: NodeRef) -> Result<bool> {
        for entry in self.walk(self.head) {
            let (node, _) = track!(entry)?;
            if node == target {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn walk(&self, from: Option<NodeRef>) -> Nodes {
        Nodes {
            list: self,
            next: from,
            remaining: self.allocator.block_count(),
        }
    }

    fn read_node(&self, node: NodeRef) -> Result<Node> {
        let bytes = track_assert_some!(
            self.allocator.bytes(node.address()),
            ErrorKind::InvalidInput,
            "Not an allocated node: {}",
            node
        );
        track!(Node::read_from(bytes))
    }

    fn write_node(&mut self, node: NodeRef, record: &Node) -> Result<()> {
        let bytes = track_assert_some!(
            self.allocator.bytes_mut(node.address()),
            ErrorKind::InvalidInput,
            "Not an allocated node: {}",
            node
        );
        track!(record.write_to(bytes))
    }

    fn link(&mut self, node: NodeRef, next: Option<NodeRef>) -> Result<()> {
        let mut record = track!(self.read_node(node))?;
        record.next = next;
        track!(self.write_node(node, &record))
    }

    fn allocate_node(&mut self, record: Node) -> Result<NodeRef> {
        let address = track_assert_some!(
            self.allocator.allocate(NODE_SIZE),
            ErrorKind::PoolFull,
            "No space for a new node: free_bytes={}",
            self.allocator.free_bytes()
        );
        let node = NodeRef::from(address);
        if let Err(e) = self.write_node(node, &record) {
            self.allocator.free(address);
            return Err(track!(e));
        }
        self.metrics.inserted_nodes.increment();
        debug!(self.logger, "Inserted";
               "value" => record.value, "address" => %node);
        Ok(node)
    }

    fn release_node(&mut self, node: NodeRef) {
        self.allocator.free(node.address());
        self.metrics.deleted_nodes.increment();
        debug!(self.logger, "Deleted"; "address" => %node);
    }
}

/// 後続ノードを辿るイテレータ.
///
/// 辿るノード数は、作成時点でのアロケータ内の割当済みブロック数で打ち切られる.
#[derive(Debug)]
struct Nodes<'a> {
    list: &'a NodeList,
    next: Option<NodeRef>,
    remaining: usize,
}
impl<'a> Iterator for Nodes<'a> {
    type Item = Result<(NodeRef, Node)>;
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take()?;
        if self.remaining == 0 {
            let e: Error = ErrorKind::InconsistentState
                .cause(format!("Node list contains a cycle: node={}", node))
                .into();
            return Some(Err(track!(e)));
        }
        self.remaining -= 1;
        match track!(self.list.read_node(node)) {
            Ok(record) => {
                self.next = record.next;
                Some(Ok((node, record)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

fn render(values: &[u16]) -> String {
    if values.is_empty() {
        return "NULL".to_owned();
    }
    let values = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", values)
}

#[cfg(test)]
mod tests {
    use trackable::result::TestResult;

    use super::*;
    use crate::pool::Address;

    fn list_with_capacity(capacity: u32) -> Result<NodeList> {
        let allocator = track!(PoolAllocatorBuilder::new().capacity(capacity).build())?;
        track!(NodeList::with_allocator(allocator))
    }

    #[test]
    fn it_works() -> TestResult {
        let mut list = track!(NodeList::new())?;
        assert_eq!(list.allocator().capacity(), 2048);
        assert!(list.is_empty());

        track!(list.insert(10))?;
        track!(list.insert(20))?;
        assert_eq!(track!(list.values())?, vec![20, 10]);
        assert_eq!(track!(list.count())?, 2);
        assert_eq!(track!(list.search(20))?, list.head());
        assert_eq!(track!(list.display())?, "[20, 10]");

        assert!(track!(list.delete(10))?);
        assert_eq!(track!(list.values())?, vec![20]);
        assert_eq!(list.allocator().block_count(), 1);

        track!(list.cleanup())?;
        assert!(list.is_empty());
        assert_eq!(track!(list.count())?, 0);
        assert_eq!(list.allocator().block_count(), 0);

        // 解放された領域は再利用可能
        let address = list.allocator_mut().allocate(2 * NODE_SIZE);
        assert_eq!(address, Some(Address::from(0)));

        assert_eq!(list.metrics().inserted_nodes(), 2);
        assert_eq!(list.metrics().deleted_nodes(), 2);
        assert_eq!(list.metrics().list_len(), 0);
        Ok(())
    }

    #[test]
    fn insert_after_works() -> TestResult {
        let mut list = track!(NodeList::new())?;
        let ten = track!(list.insert(10))?;
        let twenty = track!(list.insert(20))?;

        let fifteen = track!(list.insert_after(twenty, 15))?;
        assert_eq!(track!(list.values())?, vec![20, 15, 10]);
        assert_eq!(track!(list.next(twenty))?, Some(fifteen));
        assert_eq!(track!(list.next(fifteen))?, Some(ten));

        // 末尾への挿入
        track!(list.insert_after(ten, 5))?;
        assert_eq!(track!(list.values())?, vec![20, 15, 10, 5]);
        Ok(())
    }

    #[test]
    fn insert_before_works() -> TestResult {
        let mut list = track!(NodeList::new())?;
        let ten = track!(list.insert(10))?;
        let twenty = track!(list.insert(20))?;

        track!(list.insert_before(ten, 15))?;
        assert_eq!(track!(list.values())?, vec![20, 15, 10]);

        let head = track!(list.insert_before(twenty, 30))?;
        assert_eq!(list.head(), Some(head));
        assert_eq!(track!(list.values())?, vec![30, 20, 15, 10]);
        assert_eq!(track!(list.search(15))?.map(|n| list.value(n).ok()), Some(Some(15)));
        Ok(())
    }

    #[test]
    fn insert_around_unknown_node_fails() -> TestResult {
        let mut list = track!(NodeList::new())?;
        track!(list.insert(10))?;
        let stranger = NodeRef::from(Address::from(100));
        let blocks = list.allocator().block_count();

        assert_eq!(
            list.insert_after(stranger, 1).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        assert_eq!(
            list.insert_before(stranger, 1).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );

        // リスト外のブロックもノードとしては扱われない
        let foreign = list.allocator_mut().allocate(NODE_SIZE).unwrap();
        assert_eq!(
            list.insert_after(NodeRef::from(foreign), 1)
                .err()
                .map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        assert_eq!(list.allocator().block_count(), blocks + 1);
        assert_eq!(track!(list.values())?, vec![10]);
        Ok(())
    }

    #[test]
    fn delete_works() -> TestResult {
        let mut list = track!(NodeList::new())?;
        for v in &[1, 2, 3, 2] {
            track!(list.insert(*v))?;
        }
        assert_eq!(track!(list.values())?, vec![2, 3, 2, 1]);

        // 先頭から見て最初に一致したものだけが削除される
        assert!(track!(list.delete(2))?);
        assert_eq!(track!(list.values())?, vec![3, 2, 1]);

        assert!(track!(list.delete(2))?);
        assert_eq!(track!(list.values())?, vec![3, 1]);

        assert!(track!(list.delete(1))?);
        assert_eq!(track!(list.values())?, vec![3]);

        assert!(!track!(list.delete(42))?);
        assert!(track!(list.delete(3))?);
        assert!(list.is_empty());
        assert!(!track!(list.delete(3))?);
        assert_eq!(list.allocator().block_count(), 0);
        Ok(())
    }

    #[test]
    fn search_works() -> TestResult {
        let mut list = track!(NodeList::new())?;
        assert_eq!(track!(list.search(1))?, None);

        let first = track!(list.insert(1))?;
        track!(list.insert(2))?;
        assert_eq!(track!(list.search(1))?, Some(first));
        assert_eq!(track!(list.search(3))?, None);
        Ok(())
    }

    #[test]
    fn display_works() -> TestResult {
        let mut list = track!(NodeList::new())?;
        assert_eq!(track!(list.display())?, "NULL");

        let one = track!(list.insert(1))?;
        assert_eq!(track!(list.display())?, "[1]");

        let two = track!(list.insert(2))?;
        let three = track!(list.insert(3))?;
        let four = track!(list.insert(4))?;
        assert_eq!(track!(list.display())?, "[4, 3, 2, 1]");
        assert_eq!(track!(list.display_range(three, two))?, "[3, 2]");
        assert_eq!(track!(list.display_range(four, one))?, "[4, 3, 2, 1]");
        assert_eq!(track!(list.display_range(two, two))?, "[2]");
        Ok(())
    }

    #[test]
    fn display_range_requires_reachable_end() -> TestResult {
        let mut list = track!(NodeList::new())?;
        let one = track!(list.insert(1))?;
        let two = track!(list.insert(2))?;

        assert_eq!(
            list.display_range(one, two).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        let stranger = NodeRef::from(Address::from(600));
        assert_eq!(
            list.display_range(two, stranger).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        assert_eq!(
            list.display_range(stranger, two).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        Ok(())
    }

    #[test]
    fn pool_full() -> TestResult {
        let mut list = track!(list_with_capacity(2 * NODE_SIZE))?;
        track!(list.insert(1))?;
        let two = track!(list.insert(2))?;
        assert_eq!(
            list.insert(3).err().map(|e| *e.kind()),
            Some(ErrorKind::PoolFull)
        );
        assert_eq!(
            list.insert_after(two, 3).err().map(|e| *e.kind()),
            Some(ErrorKind::PoolFull)
        );
        assert_eq!(track!(list.values())?, vec![2, 1]);

        track!(list.delete(1))?;
        track!(list.insert(3))?;
        assert_eq!(track!(list.values())?, vec![3, 2]);
        Ok(())
    }

    #[test]
    fn deleted_node_is_invalid() -> TestResult {
        let mut list = track!(NodeList::new())?;
        let node = track!(list.insert(1))?;
        track!(list.delete(1))?;
        assert_eq!(
            list.value(node).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        Ok(())
    }

    #[test]
    fn uninitialized_allocator_is_rejected() {
        let result = NodeList::with_allocator(PoolAllocator::new());
        assert_eq!(
            result.err().map(|e| *e.kind()),
            Some(ErrorKind::Uninitialized)
        );
    }

    #[test]
    fn cyclic_links_are_detected() -> TestResult {
        let mut list = track!(NodeList::new())?;
        let one = track!(list.insert(1))?;
        let two = track!(list.insert(2))?;

        // ノードの内容を外部から書き換えて循環させる
        let bytes = list.allocator_mut().bytes_mut(one.address()).unwrap();
        bytes[2..6].copy_from_slice(&two.address().as_u32().to_be_bytes());

        assert_eq!(
            list.count().err().map(|e| *e.kind()),
            Some(ErrorKind::InconsistentState)
        );
        assert_eq!(
            list.display_range(two, NodeRef::from(Address::from(100)))
                .err()
                .map(|e| *e.kind()),
            Some(ErrorKind::InconsistentState)
        );
        Ok(())
    }
}
