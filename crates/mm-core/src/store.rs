use std::collections::BTreeSet;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

use crate::normalize::{normalize_code, normalize_code_str};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 訪問済みコード一覧の永続化先。スキーマは「コードらしき値の配列」のみ。
pub trait VisitedPersistence {
    /// 永続化された生データ。欠損・読めない場合は None。
    fn load_raw(&self) -> Option<Vec<Value>>;
    fn save_raw(&self, codes: &[String]) -> Result<(), StoreError>;
}

impl VisitedPersistence for Box<dyn VisitedPersistence + Send + Sync> {
    fn load_raw(&self) -> Option<Vec<Value>> {
        (**self).load_raw()
    }

    fn save_raw(&self, codes: &[String]) -> Result<(), StoreError> {
        (**self).save_raw(codes)
    }
}

/// 訪問済み市区町村コード集合の唯一の正本。
///
/// 読み込み経路は常に正規化＋空文字除外＋Set 化を通るため、
/// 外部で永続データが壊れていても重複や空エントリは現れない。
/// 変更は toggle のみで、毎回その場で全量を書き戻す。
pub struct VisitedStore<P> {
    visited: BTreeSet<String>,
    persistence: P,
}

impl<P: VisitedPersistence> VisitedStore<P> {
    /// 永続化済みデータから復元。壊れた・無いデータは空集合に落とし、
    /// エラーにはしない。
    pub fn load(persistence: P) -> Self {
        let visited = persistence
            .load_raw()
            .unwrap_or_default()
            .iter()
            .map(normalize_code)
            .filter(|code| !code.is_empty())
            .collect();
        Self {
            visited,
            persistence,
        }
    }

    /// 訪問状態を反転し、新しい所属フラグを返す。
    /// 正規化して空になる入力は何もしない（書き込みも発生しない）。
    /// 書き戻しは toggle 内で同期的に行い、1 回ごとの変更が即座に
    /// 永続化される。
    pub fn toggle(&mut self, code: &str) -> bool {
        let code = normalize_code_str(code);
        if code.is_empty() {
            return false;
        }

        let now_visited = if self.visited.remove(&code) {
            false
        } else {
            self.visited.insert(code);
            true
        };

        if let Err(err) = self.persist() {
            // メモリ上の状態を優先し、描画を止めない
            warn!(error = %err, "failed to persist visited set");
        }

        now_visited
    }

    pub fn contains(&self, code: &str) -> bool {
        self.visited.contains(normalize_code_str(code).as_str())
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let codes: Vec<String> = self.visited.iter().cloned().collect();
        self.persistence.save_raw(&codes)
    }
}

/// JSON ファイルへの永続化。書き込みは同ディレクトリの一時ファイル経由で
/// アトミックに差し替える。
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl VisitedPersistence for JsonFileStore {
    fn load_raw(&self) -> Option<Vec<Value>> {
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(values) => Some(values),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "visited file unreadable; starting from empty set"
                );
                None
            }
        }
    }

    fn save_raw(&self, codes: &[String]) -> Result<(), StoreError> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        serde_json::to_writer(BufWriter::new(&temp), codes)?;
        temp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

/// インメモリ永続化。テストと --ephemeral 運用用。
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Option<Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(entries: Vec<Value>) -> Self {
        Self {
            entries: Mutex::new(Some(entries)),
        }
    }
}

impl VisitedPersistence for MemoryStore {
    fn load_raw(&self) -> Option<Vec<Value>> {
        self.entries.lock().ok()?.clone()
    }

    fn save_raw(&self, codes: &[String]) -> Result<(), StoreError> {
        let values = codes.iter().map(|code| Value::from(code.clone())).collect();
        if let Ok(mut entries) = self.entries.lock() {
            *entries = Some(values);
        }
        Ok(())
    }
}
