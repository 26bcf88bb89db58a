//! Block and Gap

use crate::pool::Address;

/// プール内の割当済み領域を示すための構造体.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block {
    /// 領域の開始位置（バイト単位）
    pub start: Address,

    /// 領域の長さ（バイト単位）
    pub len: u32,
}
impl Block {
    /// 領域の終端位置を返す.  
    /// **注意**: Blockは [start, end) の領域を用いるため、
    /// end部は領域に含まれない。
    pub fn end(&self) -> Address {
        self.start + Address::from(self.len)
    }

    /// `other`と領域が重なっているかどうかを判定する.
    pub fn overlaps(&self, other: &Block) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// プール内の未割当領域.
///
/// レジストリ内のブロック群の隙間として都度導出されるもので、それ自体が保持されることはない.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gap {
    /// 空き領域の開始位置（バイト単位）
    pub start: Address,

    /// 空き領域の長さ（バイト単位）
    pub len: u32,
}
impl Gap {
    /// 空き領域の終端位置を返す.
    pub fn end(&self) -> Address {
        self.start + Address::from(self.len)
    }

    /// 先頭から`size`バイト分を切り出したブロックを返す.
    ///
    /// # Panics
    ///
    /// `size`が`self.len`を超えている場合には、現在のスレッドがパニックする.
    pub fn allocate(&self, size: u32) -> Block {
        assert!(size <= self.len);
        Block {
            start: self.start,
            len: size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: u32, len: u32) -> Block {
        Block {
            start: Address::from(start),
            len,
        }
    }

    #[test]
    fn it_works() {
        let b = block(100, 50);
        assert_eq!(b.end(), Address::from(150));

        assert!(b.overlaps(&block(149, 1)));
        assert!(b.overlaps(&block(90, 11)));
        assert!(!b.overlaps(&block(150, 10)));
        assert!(!b.overlaps(&block(90, 10)));

        let gap = Gap {
            start: Address::from(10),
            len: 20,
        };
        assert_eq!(gap.end(), Address::from(30));
        assert_eq!(gap.allocate(5), block(10, 5));
        assert_eq!(gap.allocate(20), block(10, 20));
    }

    #[test]
    #[should_panic]
    fn underflow() {
        let gap = Gap {
            start: Address::from(100),
            len: 50,
        };
        gap.allocate(51);
    }
}
