use crate::shared::AppError;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, warn};

/// クエリの識別子（プロシージャパス + 入力）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    path: String,
    input: Option<String>,
}

impl QueryKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            input: None,
        }
    }

    pub fn with_input(path: impl Into<String>, input: Value) -> Self {
        Self {
            path: path.into(),
            input: Some(input.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.input {
            Some(input) => write!(f, "{}{}", self.path, input),
            None => f.write_str(&self.path),
        }
    }
}

/// キャッシュエントリを埋めるための取得関数
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, AppError>> + Send + Sync>;

/// 購読者から見えるクエリの状態
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub error: Option<AppError>,
    pub is_fetching: bool,
    pub is_invalidated: bool,
    pub updated_at: Option<Instant>,
    /// 完了した取得の回数
    pub revision: u64,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_fetching: false,
            is_invalidated: false,
            updated_at: None,
            revision: 0,
        }
    }
}

impl<T> QueryState<T> {
    /// まだデータがなく取得中
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_fetching
    }

    pub fn is_stale(&self, stale_time: Duration) -> bool {
        if self.is_invalidated {
            return true;
        }
        match self.updated_at {
            Some(at) => at.elapsed() >= stale_time,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Mount,
    Invalidate,
}

#[derive(Default)]
struct FetchControl {
    running: bool,
    rerun: bool,
}

struct QueryEntry<T> {
    key: QueryKey,
    state: watch::Sender<QueryState<T>>,
    control: Mutex<FetchControl>,
    fetcher: Fetcher<T>,
}

impl<T> QueryEntry<T> {
    fn new(key: QueryKey, fetcher: Fetcher<T>) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            key,
            state,
            control: Mutex::new(FetchControl::default()),
            fetcher,
        }
    }
}

/// クエリ結果のキャッシュ
///
/// キーごとに取得は直列化される。取得中に届いた無効化は何件あっても
/// 1 回の追加取得にまとめられ、最後に完了した取得の結果が残る。
pub struct QueryCache<T> {
    entries: RwLock<HashMap<QueryKey, Arc<QueryEntry<T>>>>,
    stale_time: Duration,
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_time,
        }
    }

    /// クエリを購読する。初回または古くなっていれば取得を開始する
    pub async fn query(&self, key: QueryKey, fetcher: Fetcher<T>) -> QueryHandle<T> {
        let (entry, created) = {
            let mut entries = self.entries.write().await;
            match entries.get(&key) {
                Some(entry) => (Arc::clone(entry), false),
                None => {
                    let entry = Arc::new(QueryEntry::new(key.clone(), fetcher));
                    entries.insert(key.clone(), Arc::clone(&entry));
                    (entry, true)
                }
            }
        };

        let receiver = entry.state.subscribe();
        let needs_fetch = created || entry.state.borrow().is_stale(self.stale_time);
        if needs_fetch {
            Self::schedule(&entry, Trigger::Mount).await;
        }

        QueryHandle { key, receiver }
    }

    /// 無効化して再取得を予約する。エントリが無ければ `false`
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let Some(entry) = self.entry(key).await else {
            return false;
        };
        Self::schedule(&entry, Trigger::Invalidate).await;
        true
    }

    /// 無効化し、その無効化を反映した取得が完了するまで待つ
    pub async fn invalidate_and_wait(&self, key: &QueryKey) -> Option<QueryState<T>> {
        let entry = self.entry(key).await?;
        let target = Self::schedule(&entry, Trigger::Invalidate).await;
        let mut receiver = entry.state.subscribe();
        let state = receiver
            .wait_for(|state| state.revision >= target)
            .await
            .map(|state| state.clone())
            .ok();
        state
    }

    /// パスが一致する全エントリを無効化する
    pub async fn invalidate_path(&self, path: &str) -> usize {
        let matching: Vec<Arc<QueryEntry<T>>> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|entry| entry.key.path() == path)
                .cloned()
                .collect()
        };

        for entry in &matching {
            Self::schedule(entry, Trigger::Invalidate).await;
        }
        matching.len()
    }

    pub async fn current_value(&self, key: &QueryKey) -> Option<QueryState<T>> {
        let entry = self.entry(key).await?;
        let state = entry.state.borrow().clone();
        Some(state)
    }

    /// 取得を経ずにキャッシュデータを差し替える
    pub async fn set_query_data(&self, key: &QueryKey, data: T) -> bool {
        let Some(entry) = self.entry(key).await else {
            return false;
        };
        entry.state.send_modify(|state| {
            state.data = Some(data);
            state.error = None;
            state.is_invalidated = false;
            state.updated_at = Some(Instant::now());
        });
        true
    }

    pub async fn remove(&self, key: &QueryKey) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(key).is_some()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn entry(&self, key: &QueryKey) -> Option<Arc<QueryEntry<T>>> {
        let entries = self.entries.read().await;
        entries.get(key).cloned()
    }

    /// 取得を予約し、その予約を満たす revision を返す
    async fn schedule(entry: &Arc<QueryEntry<T>>, trigger: Trigger) -> u64 {
        let mut control = entry.control.lock().await;
        let revision = entry.state.borrow().revision;

        if trigger == Trigger::Invalidate {
            entry.state.send_modify(|state| state.is_invalidated = true);
        }

        if control.running {
            if trigger == Trigger::Invalidate {
                // 進行中の取得の完了後に追加取得を 1 回だけ行う
                control.rerun = true;
                return revision + 2;
            }
            return revision + 1;
        }

        control.running = true;
        entry.state.send_modify(|state| state.is_fetching = true);
        debug!(query = %entry.key, ?trigger, "query fetch started");
        tokio::spawn(Self::fetch_loop(Arc::clone(entry)));
        revision + 1
    }

    async fn fetch_loop(entry: Arc<QueryEntry<T>>) {
        loop {
            // fetcher が panic しても running を解放して待機者を起こす
            let fetcher = Arc::clone(&entry.fetcher);
            let result = AssertUnwindSafe(async move { fetcher().await })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(AppError::Internal(format!("query {} fetch panicked", entry.key)))
                });

            let mut control = entry.control.lock().await;
            let rerun = std::mem::take(&mut control.rerun);

            match &result {
                Ok(_) => debug!(query = %entry.key, rerun, "query fetch settled"),
                Err(err) => warn!(query = %entry.key, error = %err, "query fetch failed"),
            }

            entry.state.send_modify(|state| {
                state.revision += 1;
                state.is_fetching = rerun;
                match result {
                    Ok(data) => {
                        state.data = Some(data);
                        state.error = None;
                        state.is_invalidated = rerun;
                        state.updated_at = Some(Instant::now());
                    }
                    Err(err) => {
                        state.error = Some(err);
                    }
                }
            });

            if !rerun {
                control.running = false;
                break;
            }
        }
    }
}

/// マウント中のコンポーネントが保持する購読ハンドル
pub struct QueryHandle<T> {
    key: QueryKey,
    receiver: watch::Receiver<QueryState<T>>,
}

impl<T: Clone> QueryHandle<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn current(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.receiver.borrow().data.clone()
    }

    /// 状態が変わるまで待つ（再描画トリガー）
    pub async fn changed(&mut self) -> Result<(), AppError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| AppError::Internal(format!("query {} was removed", self.key)))
    }

    /// 指定回数以上の取得が完了するまで待つ
    pub async fn wait_for_revision(&mut self, revision: u64) -> Result<QueryState<T>, AppError> {
        let key = self.key.clone();
        self.receiver
            .wait_for(|state| state.revision >= revision)
            .await
            .map(|state| state.clone())
            .map_err(|_| AppError::Internal(format!("query {key} was removed")))
    }

    /// 進行中の取得が無くなるまで待つ
    pub async fn settled(&mut self) -> Result<QueryState<T>, AppError> {
        let key = self.key.clone();
        self.receiver
            .wait_for(|state| !state.is_fetching && state.revision > 0)
            .await
            .map(|state| state.clone())
            .map_err(|_| AppError::Internal(format!("query {key} was removed")))
    }
}
