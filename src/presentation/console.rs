use crate::application::ports::UserNotifier;
use async_trait::async_trait;

/// 端末向けの通知。アラートも即座に閉じたものとして扱う
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl UserNotifier for ConsoleNotifier {
    async fn alert(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }

    fn notice(&self, message: &str) {
        eprintln!("{message}");
    }
}
