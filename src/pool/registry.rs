//! 割当済みブロック群のレジストリ.

use std::slice;

use crate::pool::{Address, Block, Gap};

/// 割当済みブロック群を保持するレジストリ.
///
/// ブロック群は開始位置の昇順に並べた`Vec`として保持されており、
/// 開始位置による検索は二分探索で行われる.
///
/// レジストリ自体はプールの容量を知らないので、
/// 空き領域の計算を行うメソッドには、呼び出し側が容量を渡す必要がある.
///
/// # 不変条件
///
/// - 各ブロックは開始位置の昇順に並んでいる
/// - 隣接するブロック同士の領域は重なっていない
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: Vec<Block>,
}
impl BlockRegistry {
    /// 空の`BlockRegistry`インスタンスを生成する.
    pub fn new() -> Self {
        BlockRegistry { blocks: Vec::new() }
    }

    /// 登録されているブロックの数を返す.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// `start`から始まるブロックを返す.
    pub fn get(&self, start: Address) -> Option<Block> {
        self.position(start).map(|i| self.blocks[i])
    }

    /// 登録済みブロックの長さの合計を返す.
    pub fn usage_bytes(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.len)).sum()
    }

    /// 先頭から順に空き領域を走査し、`size`バイト以上の長さを持つ最初のものを返す(first-fit).
    pub fn first_fit(&self, size: u32, capacity: u32) -> Option<Gap> {
        self.gaps(capacity).find(|gap| gap.len >= size)
    }

    /// `start`から始まるブロックの直後にある空き領域の長さを返す.
    ///
    /// 該当するブロックが存在しない場合には`None`が返される.
    pub fn trailing_gap_len(&self, start: Address, capacity: u32) -> Option<u32> {
        let i = self.position(start)?;
        let limit = self
            .blocks
            .get(i + 1)
            .map_or(Address::from(capacity), |next| next.start);
        Some((limit - self.blocks[i].end()).as_u32())
    }

    /// ブロックを登録する.
    ///
    /// # Panics
    ///
    /// 既存のブロックと領域が重なっている場合には、現在のスレッドがパニックする.
    pub fn insert(&mut self, block: Block) {
        let i = match self.blocks.binary_search_by_key(&block.start, |b| b.start) {
            Ok(_) => panic!("Duplicate block: {:?}", block),
            Err(i) => i,
        };
        if let Some(prev) = i.checked_sub(1).map(|j| &self.blocks[j]) {
            assert!(prev.end() <= block.start, "{:?} overlaps {:?}", prev, block);
        }
        if let Some(next) = self.blocks.get(i) {
            assert!(block.end() <= next.start, "{:?} overlaps {:?}", block, next);
        }
        self.blocks.insert(i, block);
    }

    /// `start`から始まるブロックを削除する.
    ///
    /// 該当するブロックが存在しない場合には何も行わずに`None`を返す.
    pub fn remove(&mut self, start: Address) -> Option<Block> {
        self.position(start).map(|i| self.blocks.remove(i))
    }

    /// `start`から始まるブロックの長さを`len`に更新する.
    ///
    /// 更新前の長さが返される(該当ブロックが存在しない場合は`None`).
    ///
    /// 伸長後の領域が後続のブロックと重ならないことは、呼び出し側が保証する必要がある.
    pub fn set_len(&mut self, start: Address, len: u32) -> Option<u32> {
        let i = self.position(start)?;
        let old = self.blocks[i].len;
        self.blocks[i].len = len;
        debug_assert!(self
            .blocks
            .get(i + 1)
            .map_or(true, |next| self.blocks[i].end() <= next.start));
        Some(old)
    }

    /// 全てのブロックを削除する.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// 登録済みブロック群を開始位置の昇順で走査するためのイテレータを返す.
    pub fn blocks(&self) -> Blocks {
        Blocks(self.blocks.iter())
    }

    /// 容量`capacity`のプール内の空き領域群を、開始位置の昇順で走査するためのイテレータを返す.
    ///
    /// 長さが`0`の空き領域は含まれない.
    pub fn gaps(&self, capacity: u32) -> Gaps {
        Gaps {
            blocks: self.blocks.iter(),
            cursor: Address::from(0),
            capacity: Address::from(capacity),
            finished: false,
        }
    }

    fn position(&self, start: Address) -> Option<usize> {
        self.blocks.binary_search_by_key(&start, |b| b.start).ok()
    }
}

/// 登録済みブロック群を走査するためのイテレータ.
#[derive(Debug)]
pub struct Blocks<'a>(slice::Iter<'a, Block>);
impl<'a> Iterator for Blocks<'a> {
    type Item = Block;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().cloned()
    }
}

/// 空き領域群を走査するためのイテレータ.
#[derive(Debug)]
pub struct Gaps<'a> {
    blocks: slice::Iter<'a, Block>,
    // 直前に見たブロックの終端位置
    cursor: Address,
    capacity: Address,
    finished: bool,
}
impl<'a> Iterator for Gaps<'a> {
    type Item = Gap;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(block) = self.blocks.next() {
            let start = self.cursor;
            self.cursor = block.end();
            if start < block.start {
                return Some(Gap {
                    start,
                    len: (block.start - start).as_u32(),
                });
            }
        }
        if self.finished || self.capacity <= self.cursor {
            return None;
        }
        self.finished = true;
        Some(Gap {
            start: self.cursor,
            len: (self.capacity - self.cursor).as_u32(),
        })
    }
}
