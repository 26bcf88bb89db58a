//! [Prometheus][prometheus]用のメトリクス.
//!
//! [prometheus]: https://prometheus.io/
use prometrics::metrics::{Counter, Gauge, MetricBuilder};

/// [`PoolAllocator`]のメトリクス.
///
/// [`PoolAllocator`]: ../pool/struct.PoolAllocator.html
#[derive(Debug, Clone)]
pub struct PoolAllocatorMetrics {
    pub(crate) capacity_bytes: Gauge,
    pub(crate) allocated_blocks: Counter,
    pub(crate) allocated_bytes: Counter,
    pub(crate) released_blocks: Counter,
    pub(crate) released_bytes: Counter,
    pub(crate) resized_in_place: Counter,
    pub(crate) moved_blocks: Counter,
    pub(crate) nospace_failures: Counter,
    pub(crate) ignored_frees: Counter,
}
impl PoolAllocatorMetrics {
    /// プールの容量.
    ///
    /// 未初期化の場合には`0`となる.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_capacity_bytes <GAUGE>
    /// ```
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes.value() as u64
    }

    /// ブロックの割当回数.
    ///
    /// `resize`による移動先の割当も含まれる.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_allocated_blocks_total <COUNTER>
    /// ```
    pub fn allocated_blocks(&self) -> u64 {
        self.allocated_blocks.value() as u64
    }

    /// これまでに割り当てたバイト数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_allocated_bytes_total <COUNTER>
    /// ```
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.value() as u64
    }

    /// ブロックの解放回数.
    ///
    /// `deinit`によって破棄されたブロックも含まれる.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_released_blocks_total <COUNTER>
    /// ```
    pub fn released_blocks(&self) -> u64 {
        self.released_blocks.value() as u64
    }

    /// これまでに解放されたバイト数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_released_bytes_total <COUNTER>
    /// ```
    pub fn released_bytes(&self) -> u64 {
        self.released_bytes.value() as u64
    }

    /// データの移動を伴わずに完了した`resize`の回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_resized_in_place_total <COUNTER>
    /// ```
    pub fn resized_in_place(&self) -> u64 {
        self.resized_in_place.value() as u64
    }

    /// `resize`によって別の位置に移動したブロックの数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_moved_blocks_total <COUNTER>
    /// ```
    pub fn moved_blocks(&self) -> u64 {
        self.moved_blocks.value() as u64
    }

    /// 空き領域不足による割当失敗回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_nospace_failures_total <COUNTER>
    /// ```
    pub fn nospace_failures(&self) -> u64 {
        self.nospace_failures.value() as u64
    }

    /// 割当済みではないアドレスに対して発行され、無視された`free`の回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_ignored_frees_total <COUNTER>
    /// ```
    pub fn ignored_frees(&self) -> u64 {
        self.ignored_frees.value() as u64
    }

    /// 現在割当済みのバイト数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_allocated_bytes_total - fixedpool_allocator_released_bytes_total
    /// ```
    pub fn usage_bytes(&self) -> u64 {
        // NOTE: 以下の順番で値を取得しないとアンダーフローする可能性がある
        let dec = self.released_bytes();
        let inc = self.allocated_bytes();
        inc - dec
    }

    /// 現在割当済みのブロック数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_allocator_allocated_blocks_total - fixedpool_allocator_released_blocks_total
    /// ```
    pub fn live_blocks(&self) -> u64 {
        let dec = self.released_blocks();
        let inc = self.allocated_blocks();
        inc - dec
    }

    pub(crate) fn new(builder: &MetricBuilder) -> Self {
        let mut builder = builder.clone();
        builder.namespace("fixedpool").subsystem("allocator");
        PoolAllocatorMetrics {
            capacity_bytes: builder
                .gauge("capacity_bytes")
                .help("Capacity of the pool")
                .finish()
                .expect("Never fails"),
            allocated_blocks: builder
                .counter("allocated_blocks_total")
                .help("Number of allocated blocks")
                .finish()
                .expect("Never fails"),
            allocated_bytes: builder
                .counter("allocated_bytes_total")
                .help("Number of allocated bytes")
                .finish()
                .expect("Never fails"),
            released_blocks: builder
                .counter("released_blocks_total")
                .help("Number of released blocks")
                .finish()
                .expect("Never fails"),
            released_bytes: builder
                .counter("released_bytes_total")
                .help("Number of released bytes")
                .finish()
                .expect("Never fails"),
            resized_in_place: builder
                .counter("resized_in_place_total")
                .help("Number of resize operations completed without moving the block")
                .finish()
                .expect("Never fails"),
            moved_blocks: builder
                .counter("moved_blocks_total")
                .help("Number of blocks moved by resize operations")
                .finish()
                .expect("Never fails"),
            nospace_failures: builder
                .counter("nospace_failures_total")
                .help("Number of allocation failures caused by no available space")
                .finish()
                .expect("Never fails"),
            ignored_frees: builder
                .counter("ignored_frees_total")
                .help("Number of frees issued for addresses which are not allocated")
                .finish()
                .expect("Never fails"),
        }
    }

    pub(crate) fn count_allocation(&self, size: u32) {
        self.allocated_blocks.increment();
        self.allocated_bytes.add_u64(u64::from(size));
    }

    pub(crate) fn count_releasion(&self, size: u32) {
        self.released_blocks.increment();
        self.released_bytes.add_u64(u64::from(size));
    }

    pub(crate) fn count_in_place_resize(&self, old_size: u32, new_size: u32) {
        self.resized_in_place.increment();
        if new_size > old_size {
            self.allocated_bytes.add_u64(u64::from(new_size - old_size));
        } else {
            self.released_bytes.add_u64(u64::from(old_size - new_size));
        }
    }
}

/// [`NodeList`]のメトリクス.
///
/// [`NodeList`]: ../list/struct.NodeList.html
#[derive(Debug, Clone)]
pub struct NodeListMetrics {
    pub(crate) inserted_nodes: Counter,
    pub(crate) deleted_nodes: Counter,
}
impl NodeListMetrics {
    /// リストに挿入されたノードの数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_node_list_inserted_nodes_total <COUNTER>
    /// ```
    pub fn inserted_nodes(&self) -> u64 {
        self.inserted_nodes.value() as u64
    }

    /// リストから削除されたノードの数.
    ///
    /// `cleanup`によって解放されたノードも含まれる.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_node_list_deleted_nodes_total <COUNTER>
    /// ```
    pub fn deleted_nodes(&self) -> u64 {
        self.deleted_nodes.value() as u64
    }

    /// 現在のリストの長さ.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// fixedpool_node_list_inserted_nodes_total - fixedpool_node_list_deleted_nodes_total
    /// ```
    pub fn list_len(&self) -> u64 {
        let dec = self.deleted_nodes();
        let inc = self.inserted_nodes();
        inc - dec
    }

    pub(crate) fn new(builder: &MetricBuilder) -> Self {
        let mut builder = builder.clone();
        builder.namespace("fixedpool").subsystem("node_list");
        NodeListMetrics {
            inserted_nodes: builder
                .counter("inserted_nodes_total")
                .help("Number of nodes inserted into the list")
                .finish()
                .expect("Never fails"),
            deleted_nodes: builder
                .counter("deleted_nodes_total")
                .help("Number of nodes deleted from the list")
                .finish()
                .expect("Never fails"),
        }
    }
}
