use std::fmt;
use std::ops::{Add, Sub};

/// プール内の位置を表す32bit幅のオフセット(バイト単位).
///
/// プールの先頭が`0`となる.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Address(u32);
impl Address {
    /// 取り得るアドレスの最大値.
    pub const MAX: u32 = u32::MAX;

    /// アドレスの値を返す.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// アドレスの値を`usize`として返す.
    ///
    /// プールのバイト列のインデックスとして使う際に便利.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// `self`から`len`バイト進めた位置を返す.
    ///
    /// 結果が32bitに収まらない場合には`None`が返される.
    pub fn checked_add(self, len: u32) -> Option<Self> {
        self.0.checked_add(len).map(Address)
    }
}
impl From<u32> for Address {
    fn from(from: u32) -> Self {
        Address(from)
    }
}
impl Add for Address {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let value = self.0.checked_add(rhs.0).expect("address overflow");
        Address(value)
    }
}
impl Sub for Address {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let value = self.0.checked_sub(rhs.0).expect("address underflow");
        Address(value)
    }
}
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        assert_eq!(Address::from(10) + Address::from(2), Address::from(12));
        assert_eq!(Address::from(10) - Address::from(2), Address::from(8));
        assert_eq!(Address::from(10).checked_add(5), Some(Address::from(15)));
        assert_eq!(Address::from(Address::MAX).checked_add(1), None);
        assert_eq!(Address::from(255).to_string(), "0xff");
    }

    #[test]
    #[should_panic]
    fn overflow() {
        let _ = Address::from(Address::MAX) + Address::from(1);
    }

    #[test]
    #[should_panic]
    fn underflow() {
        let _ = Address::from(0) - Address::from(1);
    }
}
