use byteorder::{BigEndian, ByteOrder};
use std::fmt;

use crate::pool::Address;
use crate::{ErrorKind, Result};

/// プール内に格納される一つのノードのサイズ(バイト単位).
///
/// 値(`u16`)と後続ノードのアドレス(`u32`)から構成される.
pub const NODE_SIZE: u32 = 6;

/// 後続ノードが存在しないことを示すアドレス値.
///
/// プールの容量は`u32`に収まるので、この位置から`NODE_SIZE`分の領域が割り当てられることはない.
const END_MARKER: u32 = 0xFFFF_FFFF;

/// リスト内のノードへの参照.
///
/// 実体は、ノードを格納しているブロックの開始位置.
/// ノードが削除された後も参照自体は残るが、その後の操作では`ErrorKind::InvalidInput`として扱われる.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef(Address);
impl NodeRef {
    /// ノードを格納しているブロックの開始位置を返す.
    pub fn address(self) -> Address {
        self.0
    }
}
impl From<Address> for NodeRef {
    fn from(f: Address) -> Self {
        NodeRef(f)
    }
}
impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// プール内に格納されるノードのレコード.
///
/// # フォーマット
///
/// ```text
/// +-------------+--------------------+
/// | value (u16) | next address (u32) |
/// +-------------+--------------------+
/// ```
///
/// 数値は全てビッグエンディアン.
/// 後続ノードが存在しない場合には、アドレス部に`0xFFFF_FFFF`が格納される.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// ノードの値.
    pub value: u16,

    /// 後続ノード.
    pub next: Option<NodeRef>,
}
impl Node {
    pub(crate) fn read_from(bytes: &[u8]) -> Result<Self> {
        track_assert_eq!(bytes.len(), NODE_SIZE as usize, ErrorKind::InvalidInput);
        let value = BigEndian::read_u16(&bytes[0..2]);
        let next = match BigEndian::read_u32(&bytes[2..6]) {
            END_MARKER => None,
            address => Some(NodeRef(Address::from(address))),
        };
        Ok(Node { value, next })
    }

    pub(crate) fn write_to(&self, bytes: &mut [u8]) -> Result<()> {
        track_assert_eq!(bytes.len(), NODE_SIZE as usize, ErrorKind::InvalidInput);
        BigEndian::write_u16(&mut bytes[0..2], self.value);
        let next = self.next.map_or(END_MARKER, |n| n.address().as_u32());
        BigEndian::write_u32(&mut bytes[2..6], next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use trackable::result::TestResult;

    use super::*;

    #[test]
    fn it_works() -> TestResult {
        let mut buf = [0; NODE_SIZE as usize];

        let node = Node {
            value: 0x1234,
            next: Some(NodeRef::from(Address::from(0x10))),
        };
        track!(node.write_to(&mut buf))?;
        assert_eq!(buf, [0x12, 0x34, 0, 0, 0, 0x10]);
        assert_eq!(track!(Node::read_from(&buf))?, node);

        let node = Node {
            value: 7,
            next: None,
        };
        track!(node.write_to(&mut buf))?;
        assert_eq!(buf, [0, 7, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(track!(Node::read_from(&buf))?, node);
        Ok(())
    }

    #[test]
    fn wrong_size_is_rejected() {
        assert_eq!(
            Node::read_from(&[0; 4]).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        let node = Node {
            value: 1,
            next: None,
        };
        assert_eq!(
            node.write_to(&mut [0; 8]).err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
    }
}
