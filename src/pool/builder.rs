use prometrics::metrics::MetricBuilder;
use slog::{Discard, Logger};

use crate::metrics::PoolAllocatorMetrics;
use crate::pool::PoolAllocator;
use crate::Result;

/// `PoolAllocator`のビルダ.
#[derive(Debug, Clone)]
pub struct PoolAllocatorBuilder {
    capacity: u32,
    logger: Logger,
    metrics: MetricBuilder,
}
impl PoolAllocatorBuilder {
    /// プール容量のデフォルト値.
    pub const DEFAULT_CAPACITY: u32 = 2048;

    /// デフォルト設定で`PoolAllocatorBuilder`インスタンスを生成する.
    pub fn new() -> Self {
        PoolAllocatorBuilder {
            capacity: Self::DEFAULT_CAPACITY,
            logger: Logger::root(Discard, o!()),
            metrics: MetricBuilder::new(),
        }
    }

    /// プールの容量(バイト数)を設定する.
    ///
    /// `0`が指定された場合には、`build()`呼び出し時にエラーが返される.
    ///
    /// デフォルト値は`PoolAllocatorBuilder::DEFAULT_CAPACITY`.
    pub fn capacity(&mut self, capacity: u32) -> &mut Self {
        self.capacity = capacity;
        self
    }

    /// アロケータ用の logger を登録する
    pub fn logger(&mut self, logger: Logger) -> &mut Self {
        self.logger = logger;
        self
    }

    /// メトリクス用の共通設定を登録する.
    ///
    /// デフォルト値は`MetricBuilder::new()`.
    pub fn metrics(&mut self, metrics: MetricBuilder) -> &mut Self {
        self.metrics = metrics;
        self
    }

    /// 初期化済みの`PoolAllocator`を生成する.
    ///
    /// # Errors
    ///
    /// 容量に`0`が指定されている場合には、種類が`ErrorKind::InvalidInput`のエラーが返される.
    pub fn build(&self) -> Result<PoolAllocator> {
        let mut allocator = self.build_uninitialized();
        track!(allocator.init(self.capacity))?;
        Ok(allocator)
    }

    /// 未初期化の`PoolAllocator`を生成する.
    ///
    /// 利用前に`PoolAllocator::init`を呼び出す必要がある.
    /// このメソッドでは`capacity`の設定値は使われない.
    pub fn build_uninitialized(&self) -> PoolAllocator {
        PoolAllocator::with_context(self.logger.clone(), PoolAllocatorMetrics::new(&self.metrics))
    }
}
impl Default for PoolAllocatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
