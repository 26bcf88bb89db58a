//! 固定長プール上のアロケータ.
//!
//! アロケータは、初期化時に確保した単一の連続したバイト列(プール)を所有し、
//! 利用者からの要求に応じて、その中から必要なサイズの部分領域(ブロック)を割り当てる.
//!
//! 割当済みブロックの情報はレジストリ内に開始位置の昇順で保持されており、
//! 空き領域はブロック同士の隙間として都度導出される.
//! そのため、ブロックを解放すれば、その領域は明示的な結合処理無しに再び割当可能となる.
use slog::Logger;

pub use self::address::Address;
pub use self::block::{Block, Gap};
pub use self::builder::PoolAllocatorBuilder;
pub use self::registry::{Blocks, Gaps};

use self::memory::PoolMemory;
use self::registry::BlockRegistry;
use crate::metrics::PoolAllocatorMetrics;
use crate::{ErrorKind, Result};

mod address;
mod block;
mod builder;
mod memory;
mod registry;

/// 固定長プール用のアロケータ.
///
/// # ライフサイクル
///
/// `init → {allocate, free, resize}* → deinit`
///
/// `deinit`後に再び`init`を呼び出すことも可能.
/// 未初期化状態での`allocate`は常に失敗し、`free`は何も行わない.
///
/// # 割当戦略
///
/// このアロケータは、アドレス順の"FirstFit"戦略を採用している.
///
/// 新規割当要求が発行された際には、プールの先頭から順に空き領域を走査し、
/// 要求サイズを満たす最初の空き領域の先頭に、ブロックが配置される.
/// 配置は常に決定的である.
///
/// # 注意
///
/// 各操作は`&mut self`を要求するので、同一インスタンスへの操作は利用者側で直列化される必要がある.
#[derive(Debug)]
pub struct PoolAllocator {
    pool: Option<PoolMemory>,
    registry: BlockRegistry,
    logger: Logger,
    metrics: PoolAllocatorMetrics,
}
impl PoolAllocator {
    /// 未初期化の`PoolAllocator`インスタンスを生成する.
    ///
    /// `PoolAllocatorBuilder::new().build_uninitialized()`と等価.
    pub fn new() -> Self {
        PoolAllocatorBuilder::new().build_uninitialized()
    }

    pub(crate) fn with_context(logger: Logger, metrics: PoolAllocatorMetrics) -> Self {
        PoolAllocator {
            pool: None,
            registry: BlockRegistry::new(),
            logger,
            metrics,
        }
    }

    /// `capacity`バイトのプールを確保して、アロケータを初期化する.
    ///
    /// 既に初期化済みの場合には、まず`deinit`相当の処理で以前のプールが破棄される.
    ///
    /// # Errors
    ///
    /// `capacity`が`0`の場合には、種類が`ErrorKind::InvalidInput`のエラーが返される.
    pub fn init(&mut self, capacity: u32) -> Result<()> {
        track_assert!(capacity > 0, ErrorKind::InvalidInput; capacity);
        if self.is_initialized() {
            self.deinit();
        }
        self.pool = Some(PoolMemory::new(capacity));
        self.registry.clear();
        self.metrics.capacity_bytes.set(f64::from(capacity));
        info!(self.logger, "Pool initialized"; "capacity" => capacity);
        Ok(())
    }

    /// プールとレジストリを破棄する.
    ///
    /// 解放されていないブロックが残っていても、無条件に全てが破棄される.
    /// 未初期化の場合には何も行わない.
    pub fn deinit(&mut self) {
        if let Some(pool) = self.pool.take() {
            for block in self.registry.blocks() {
                self.metrics.count_releasion(block.len);
            }
            info!(self.logger, "Pool deinitialized";
                  "capacity" => pool.capacity(),
                  "discarded_blocks" => self.registry.len());
        }
        self.registry.clear();
        self.metrics.capacity_bytes.set(0.0);
    }

    /// アロケータが初期化済みかどうかを判定する.
    pub fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    /// プールの容量を返す.
    ///
    /// 未初期化の場合には`0`が返される.
    pub fn capacity(&self) -> u32 {
        self.pool.as_ref().map_or(0, |pool| pool.capacity())
    }

    /// 割当済みブロックの数を返す.
    pub fn block_count(&self) -> usize {
        self.registry.len()
    }

    /// 割当済みブロックの長さの合計を返す.
    pub fn usage_bytes(&self) -> u64 {
        self.registry.usage_bytes()
    }

    /// 割当に利用可能な残りのバイト数を返す.
    ///
    /// 断片化しているため、この値と同じサイズの割当が成功するとは限らない.
    pub fn free_bytes(&self) -> u64 {
        u64::from(self.capacity()) - self.usage_bytes()
    }

    /// `size`バイトのブロックを割り当てて、その開始位置を返す.
    ///
    /// 以下の場合には`None`が返され、アロケータの状態は変化しない:
    ///
    /// - アロケータが未初期化
    /// - `size`が`0`
    /// - `size`バイト以上の空き領域が存在しない
    pub fn allocate(&mut self, size: u32) -> Option<Address> {
        let capacity = match self.pool {
            Some(ref pool) => pool.capacity(),
            None => {
                debug!(self.logger, "Allocation on an uninitialized pool"; "size" => size);
                return None;
            }
        };
        if size == 0 {
            return None;
        }
        if let Some(gap) = self.registry.first_fit(size, capacity) {
            let block = gap.allocate(size);
            self.registry.insert(block);
            self.metrics.count_allocation(size);
            debug!(self.logger, "Allocated";
                   "address" => %block.start, "size" => size);
            Some(block.start)
        } else {
            self.metrics.nospace_failures.increment();
            debug!(self.logger, "No gap large enough";
                   "size" => size, "free_bytes" => self.free_bytes());
            None
        }
    }

    /// `address`から始まるブロックを解放する.
    ///
    /// `address`が割当済みブロックの開始位置ではない場合(二重解放を含む)には何も行わない.
    /// 解放された領域のバイト列はそのまま残される.
    pub fn free(&mut self, address: Address) {
        if let Some(block) = self.registry.remove(address) {
            self.metrics.count_releasion(block.len);
            debug!(self.logger, "Released";
                   "address" => %address, "size" => block.len);
        } else {
            self.metrics.ignored_frees.increment();
            debug!(self.logger, "Ignored free of an unallocated address";
                   "address" => %address);
        }
    }

    /// ブロックのサイズを変更する.
    ///
    /// 成功した場合には、変更後のブロックの開始位置が返される.
    /// ブロックが移動することがあるので、利用者は以前のアドレスを使い続けてはいけない.
    ///
    /// - `address`が`None`の場合は`allocate(size)`と等価(`size`が`0`なら`Ok(None)`)
    /// - `size`が`0`の場合はブロックを解放して`Ok(None)`を返す
    /// - `size`が現在の長さ以下の場合は、同じ位置のまま長さのみを縮める
    /// - `size`が現在の長さを超える場合は、直後の空き領域で足りるならその場で伸長し、
    ///   そうでなければ別の位置に新たなブロックを割り当ててデータをコピーした後に、元のブロックを解放する
    ///
    /// # Errors
    ///
    /// 以下の場合にはエラーが返される.
    /// 失敗時には、元のブロックの位置・長さ・内容は一切変化しない.
    ///
    /// - アロケータが未初期化: `ErrorKind::Uninitialized`
    /// - `address`が割当済みブロックの開始位置ではない: `ErrorKind::InvalidInput`
    /// - 移動先となる空き領域が存在しない: `ErrorKind::PoolFull`
    pub fn resize(&mut self, address: Option<Address>, size: u32) -> Result<Option<Address>> {
        track_assert!(self.is_initialized(), ErrorKind::Uninitialized);
        let address = match address {
            None if size == 0 => return Ok(None),
            None => {
                let address = track_assert_some!(
                    self.allocate(size),
                    ErrorKind::PoolFull,
                    "No gap large enough: size={}",
                    size
                );
                return Ok(Some(address));
            }
            Some(address) => address,
        };
        let block = track_assert_some!(
            self.registry.get(address),
            ErrorKind::InvalidInput,
            "Not an allocated block: address={}",
            address
        );

        if size == 0 {
            self.free(address);
            return Ok(None);
        }

        let capacity = self.capacity();
        let trailing = track_assert_some!(
            self.registry.trailing_gap_len(address, capacity),
            ErrorKind::InconsistentState
        );
        if size <= block.len || size - block.len <= trailing {
            self.registry.set_len(address, size);
            self.metrics.count_in_place_resize(block.len, size);
            debug!(self.logger, "Resized in place";
                   "address" => %address, "old_size" => block.len, "new_size" => size);
            return Ok(Some(address));
        }

        // 移動先を確保できるまでは、元のブロックには一切手を付けない
        let gap = match self.registry.first_fit(size, capacity) {
            Some(gap) => gap,
            None => {
                self.metrics.nospace_failures.increment();
                debug!(self.logger, "No gap large enough to move the block";
                       "address" => %address, "old_size" => block.len, "new_size" => size);
                track_panic!(ErrorKind::PoolFull, "block={:?}, size={}", block, size);
            }
        };
        let pool = track_assert_some!(self.pool.as_mut(), ErrorKind::InconsistentState);
        let moved = gap.allocate(size);
        self.registry.insert(moved);
        pool.copy(&block, moved.start, block.len);
        self.registry.remove(address);

        self.metrics.count_allocation(moved.len);
        self.metrics.count_releasion(block.len);
        self.metrics.moved_blocks.increment();
        debug!(self.logger, "Moved";
               "from" => %address, "to" => %moved.start,
               "old_size" => block.len, "new_size" => size);
        Ok(Some(moved.start))
    }

    /// `address`から始まる割当済みブロックを返す.
    pub fn block(&self, address: Address) -> Option<Block> {
        self.registry.get(address)
    }

    /// 割当済みブロック群を開始位置の昇順で返す.
    pub fn blocks(&self) -> Blocks {
        self.registry.blocks()
    }

    /// 空き領域群を開始位置の昇順で返す.
    ///
    /// 未初期化の場合には空となる.
    pub fn gaps(&self) -> Gaps {
        self.registry.gaps(self.capacity())
    }

    /// `address`から始まる割当済みブロックの内容を返す.
    ///
    /// `address`が割当済みブロックの開始位置ではない場合には`None`が返される.
    pub fn bytes(&self, address: Address) -> Option<&[u8]> {
        let pool = self.pool.as_ref()?;
        let block = self.registry.get(address)?;
        Some(pool.slice(&block))
    }

    /// `address`から始まる割当済みブロックの内容を、書き込み可能な形で返す.
    ///
    /// `address`が割当済みブロックの開始位置ではない場合には`None`が返される.
    pub fn bytes_mut(&mut self, address: Address) -> Option<&mut [u8]> {
        let pool = self.pool.as_mut()?;
        let block = self.registry.get(address)?;
        Some(pool.slice_mut(&block))
    }

    /// アロケータ用のメトリクスを返す.
    pub fn metrics(&self) -> &PoolAllocatorMetrics {
        &self.metrics
    }

    /// アロケータ用の logger を返す.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}
impl Default for PoolAllocator {
    fn default() -> Self {
        Self::new()
    }
}
