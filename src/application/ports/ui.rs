use async_trait::async_trait;

/// ユーザーへの通知面
#[async_trait]
pub trait UserNotifier: Send + Sync {
    /// モーダルなアラート。閉じられるまで戻らない
    async fn alert(&self, title: &str, message: &str);

    /// 非ブロッキングな通知（トースト等）
    fn notice(&self, message: &str);
}

/// ソフトウェアキーボード制御（モバイルのみ意味を持つ）
pub trait KeyboardController: Send + Sync {
    fn dismiss(&self);
}

/// キーボードを持たないホスト用
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopKeyboard;

impl KeyboardController for NoopKeyboard {
    fn dismiss(&self) {}
}
