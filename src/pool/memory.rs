use crate::pool::{Address, Block};

/// プールの実体となる固定長のバイト列.
///
/// 初期化時に一度だけ確保され、以後サイズが変わることはない.
/// 個々の割当のためにホストのヒープが使われることはない.
///
/// どの範囲が割当済みなのかは関知しないので、
/// 範囲の妥当性はアロケータ側で保証する必要がある.
#[derive(Debug)]
pub struct PoolMemory {
    bytes: Vec<u8>,
}
impl PoolMemory {
    /// `capacity`バイトのゼロ埋めされたプールを確保する.
    pub fn new(capacity: u32) -> Self {
        PoolMemory {
            bytes: vec![0; capacity as usize],
        }
    }

    /// プールの容量を返す.
    pub fn capacity(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// `block`が占める範囲のバイト列を返す.
    pub fn slice(&self, block: &Block) -> &[u8] {
        &self.bytes[block.start.as_usize()..block.end().as_usize()]
    }

    /// `block`が占める範囲のバイト列を返す.
    pub fn slice_mut(&mut self, block: &Block) -> &mut [u8] {
        &mut self.bytes[block.start.as_usize()..block.end().as_usize()]
    }

    /// `src`の先頭`len`バイトを`dst`以降にコピーする.
    ///
    /// 移動元と移動先の範囲が重なっていても良い.
    pub fn copy(&mut self, src: &Block, dst: Address, len: u32) {
        debug_assert!(len <= src.len);
        let start = src.start.as_usize();
        self.bytes
            .copy_within(start..start + len as usize, dst.as_usize());
    }
}
