/// crate固有のエラー型.
#[derive(Debug, Clone, TrackableError)]
pub struct Error(trackable::error::TrackableError<ErrorKind>);

/// 発生し得るエラーの種別.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// プールに十分な大きさの空き領域が存在しない.
    ///
    /// # 典型的な対応策
    ///
    /// - 利用者が不要なブロックを解放した上でリトライする
    /// - より小さなサイズで要求し直す
    PoolFull,

    /// アロケータが初期化されていない.
    ///
    /// `init`前、あるいは`deinit`後のアロケータに対して操作が発行された場合に、このエラーが返される.
    ///
    /// # 典型的な対応策
    ///
    /// - アロケータを(再)初期化する
    Uninitialized,

    /// 入力が不正.
    ///
    /// 割当済みではないアドレスが指定された場合等にこのエラーが返される.
    ///
    /// # 典型的な対応策
    ///
    /// - 利用者側のプログラムを修正して入力を正しくする
    InvalidInput,

    /// 内部状態が不整合に陥っている.
    ///
    /// プログラムにバグがあることを示している.
    ///
    /// # 典型的な対応策
    ///
    /// - バグ修正を行ってプログラムを更新する
    InconsistentState,

    /// その他エラー.
    Other,
}
impl trackable::error::ErrorKind for ErrorKind {}
