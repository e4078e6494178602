use serde::Serialize;
use thiserror::Error;

use crate::index::MunicipalityIndex;
use crate::registry;
use crate::store::{VisitedPersistence, VisitedStore};

/// 全国進捗の分母（固定値）。
///
/// インデックスから導出した合計ではなく、外部の公称市区町村数を
/// そのまま使う。県別データの読み込みに失敗しても全国分母は揺れない
/// 代わりに、県別合計との不一致は許容する設計。
pub const NATIONAL_MUNICIPALITIES: usize = 1741;

/// その時点の訪問進捗。毎回 VisitedStore と MunicipalityIndex から
/// 計算し直す派生値で、永続化しない。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub hit: usize,
    pub total: usize,
    pub ratio: f64,
}

impl ProgressSnapshot {
    fn new(hit: usize, total: usize) -> Self {
        let ratio = if total > 0 {
            hit as f64 / total as f64
        } else {
            0.0
        };
        Self { hit, total, ratio }
    }
}

/// 県別一覧の 1 行。pct は表示用の 0〜100。
#[derive(Debug, Clone, Serialize)]
pub struct PrefectureProgress {
    pub code: &'static str,
    pub name: &'static str,
    pub hit: usize,
    pub total: usize,
    pub pct: f64,
}

#[derive(Debug, Error)]
pub enum ProgressError {
    /// レジストリに無い県名。UI へそのまま届けてよい唯一の失敗。
    #[error("unknown prefecture: {0}")]
    UnknownPrefecture(String),
}

/// 進捗の集計器。インデックスと訪問集合を読むだけで、どちらも変更しない。
pub struct ProgressTracker<'a, P> {
    index: &'a MunicipalityIndex,
    store: &'a VisitedStore<P>,
}

impl<'a, P: VisitedPersistence> ProgressTracker<'a, P> {
    pub fn new(index: &'a MunicipalityIndex, store: &'a VisitedStore<P>) -> Self {
        Self { index, store }
    }

    /// 全国進捗。分母は常に NATIONAL_MUNICIPALITIES 固定。
    pub fn national(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(self.store.len(), NATIONAL_MUNICIPALITIES)
    }

    /// 県単位の進捗。県名がレジストリに無ければエラー、
    /// インデックスにデータが無い・空の県は {0, 0, 0.0}。
    pub fn prefecture(&self, pref_name: &str) -> Result<ProgressSnapshot, ProgressError> {
        if registry::code_by_name(pref_name).is_none() {
            return Err(ProgressError::UnknownPrefecture(pref_name.to_string()));
        }

        Ok(self.snapshot_for(pref_name))
    }

    /// コロプレス塗り用の達成率。データ未取得と進捗ゼロはどちらも 0.0
    /// として扱う（塗り分け上の区別は不要）。
    pub fn visited_ratio(&self, pref_name: &str) -> f64 {
        self.snapshot_for(pref_name).ratio
    }

    /// 全 47 県の進捗を都道府県コード昇順で返す。
    /// 並び順は表示契約であり、インデックスの挿入順には依存しない。
    pub fn all_prefectures(&self) -> Vec<PrefectureProgress> {
        registry::all()
            .iter()
            .map(|pref| {
                let snapshot = self.snapshot_for(pref.name);
                PrefectureProgress {
                    code: pref.code,
                    name: pref.name,
                    hit: snapshot.hit,
                    total: snapshot.total,
                    pct: snapshot.ratio * 100.0,
                }
            })
            .collect()
    }

    fn snapshot_for(&self, pref_name: &str) -> ProgressSnapshot {
        let Some(codes) = self.index.codes(pref_name) else {
            return ProgressSnapshot::new(0, 0);
        };

        let hit = codes.iter().filter(|code| self.store.contains(code)).count();
        ProgressSnapshot::new(hit, codes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::HashSet;

    fn index_with(entries: &[(&str, &[&str])]) -> MunicipalityIndex {
        let mut index = MunicipalityIndex::default();
        for &(pref, codes) in entries {
            index.insert(pref, codes.iter().map(|c| c.to_string()).collect());
        }
        index
    }

    fn store_with(codes: &[&str]) -> VisitedStore<MemoryStore> {
        VisitedStore::load(MemoryStore::seeded(
            codes.iter().map(|c| json!(c)).collect(),
        ))
    }

    #[test]
    fn national_total_is_always_1741() {
        let empty_index = MunicipalityIndex::default();
        let store = store_with(&["13101", "14101"]);
        let tracker = ProgressTracker::new(&empty_index, &store);

        let national = tracker.national();
        assert_eq!(national.total, 1741);
        assert_eq!(national.hit, 2);
        assert!((national.ratio - 2.0 / 1741.0).abs() < 1e-12);
    }

    #[test]
    fn prefecture_progress_counts_intersection() {
        let index = index_with(&[("鳥取県", &["31201", "31202"])]);
        let store = store_with(&["31201", "99999"]);
        let tracker = ProgressTracker::new(&index, &store);

        let tottori = tracker.prefecture("鳥取県").unwrap();
        assert_eq!(tottori.hit, 1);
        assert_eq!(tottori.total, 2);
        assert_eq!(tottori.ratio, 0.5);
    }

    #[test]
    fn prefecture_missing_from_index_is_all_zero() {
        let index = MunicipalityIndex::default();
        let store = store_with(&["31201"]);
        let tracker = ProgressTracker::new(&index, &store);

        let shimane = tracker.prefecture("島根県").unwrap();
        assert_eq!(shimane.hit, 0);
        assert_eq!(shimane.total, 0);
        assert_eq!(shimane.ratio, 0.0);
        assert_eq!(tracker.visited_ratio("島根県"), 0.0);
    }

    #[test]
    fn unknown_prefecture_name_is_an_error() {
        let index = MunicipalityIndex::default();
        let store = store_with(&[]);
        let tracker = ProgressTracker::new(&index, &store);

        match tracker.prefecture("江戸") {
            Err(ProgressError::UnknownPrefecture(name)) => assert_eq!(name, "江戸"),
            other => panic!("unexpected result: {other:?}"),
        }
        // 塗り分け経路はエラーにせず 0 扱い
        assert_eq!(tracker.visited_ratio("江戸"), 0.0);
    }

    #[test]
    fn empty_code_set_has_zero_ratio() {
        let index = index_with(&[("沖縄県", &[])]);
        let store = store_with(&["47201"]);
        let tracker = ProgressTracker::new(&index, &store);

        let okinawa = tracker.prefecture("沖縄県").unwrap();
        assert_eq!(okinawa.total, 0);
        assert_eq!(okinawa.ratio, 0.0);
    }

    #[test]
    fn all_prefectures_ordered_by_code_regardless_of_insertion() {
        // 逆順で挿入してもレジストリ順で返る
        let mut index = MunicipalityIndex::default();
        for pref in registry::all().iter().rev() {
            index.insert(pref.name, HashSet::new());
        }
        let store = store_with(&[]);
        let tracker = ProgressTracker::new(&index, &store);

        let rows = tracker.all_prefectures();
        assert_eq!(rows.len(), 47);
        assert_eq!(rows[0].code, "01");
        assert_eq!(rows[46].code, "47");
        assert!(rows.windows(2).all(|w| w[0].code < w[1].code));
    }

    #[test]
    fn all_prefectures_reports_pct() {
        let index = index_with(&[("鳥取県", &["31201", "31202"])]);
        let store = store_with(&["31201"]);
        let tracker = ProgressTracker::new(&index, &store);

        let rows = tracker.all_prefectures();
        let tottori = rows.iter().find(|r| r.name == "鳥取県").unwrap();
        assert_eq!(tottori.pct, 50.0);

        let tokyo = rows.iter().find(|r| r.name == "東京都").unwrap();
        assert_eq!(tokyo.total, 0);
        assert_eq!(tokyo.pct, 0.0);
    }
}
