//! Fixed Pool.
//!
//! `fixedpool`は、固定長のバイト列(プール)一つの上で、手動のメモリ管理を模倣するためのライブラリ.
//!
//! # 特徴
//!
//! - 初期化時に一度だけプールを確保し、個々の割当のためにホストのヒープを使うことはない
//! - `init`/`allocate`/`free`/`resize`/`deinit`という、汎用アロケータに似たインタフェースを提供
//! - 配置はアドレス順の"FirstFit"戦略で決定され、常に再現可能
//! - 割当済みブロック同士が重なることはなく、割当済みサイズの合計がプール容量を超えることもない
//! - 空き容量不足や不正なアドレスの指定は、パニックではなく戻り値で通知される
//!   - `resize`が失敗した場合には、元のブロックは位置・長さ・内容ともに変化しない
//! - シングルスレッド用で、内部でのロック等は行わない
//!
//! # モジュールの依存関係
//!
//! ```text
//! list => pool
//! ```
//!
//! - [pool]モジュール:
//!   - 主に[PoolAllocator]構造体を提供
//!   - プールと割当済みブロックのレジストリを所有し、配置の決定を担当する
//! - [list]モジュール:
//!   - 主に[NodeList]構造体を提供
//!   - ノードの格納領域を[PoolAllocator]から確保する単方向連結リスト
//!
//! # 使用例
//!
//! ```
//! use fixedpool::pool::{Address, PoolAllocatorBuilder};
//!
//! let mut allocator = PoolAllocatorBuilder::new().capacity(1024).build().unwrap();
//! let a = allocator.allocate(1024);
//! assert_eq!(a, Some(Address::from(0)));
//! assert_eq!(allocator.allocate(1), None);
//!
//! allocator.free(Address::from(0));
//! assert_eq!(allocator.allocate(1), Some(Address::from(0)));
//! ```
//!
//! [pool]: ./pool/index.html
//! [PoolAllocator]: ./pool/struct.PoolAllocator.html
//! [list]: ./list/index.html
//! [NodeList]: ./list/struct.NodeList.html
#![warn(missing_docs)]
extern crate byteorder;
extern crate prometrics;
#[macro_use]
extern crate trackable;
#[macro_use]
extern crate slog;

pub use crate::error::{Error, ErrorKind};

pub mod list;
pub mod metrics;
pub mod pool;

mod error;

/// crate固有の`Result`型.
pub type Result<T> = std::result::Result<T, Error>;
