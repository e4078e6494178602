use std::collections::{HashMap, HashSet};
use std::future::Future;

use serde_json::Value;
use tracing::{debug, warn};

use crate::geojson::{ExtractorConfig, FeatureCollection, FetchError};
use crate::registry;

/// 県名 → その県の市区町村コード集合。
/// 一度構築したら読み取り専用で使う（再構築は丸ごと差し替え）。
#[derive(Debug, Clone, Default)]
pub struct MunicipalityIndex {
    by_prefecture: HashMap<String, HashSet<String>>,
}

impl MunicipalityIndex {
    pub fn insert(&mut self, pref_name: &str, codes: HashSet<String>) {
        self.by_prefecture.insert(pref_name.to_string(), codes);
    }

    pub fn codes(&self, pref_name: &str) -> Option<&HashSet<String>> {
        self.by_prefecture.get(pref_name)
    }

    /// 登録済み県数（失敗県も空集合として数える）
    pub fn len(&self) -> usize {
        self.by_prefecture.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefecture.is_empty()
    }

    /// 全県の和集合サイズ。全国分母 1741 とは独立の参考値であり、
    /// 読み込みに失敗した県があると一致しない。
    pub fn total_codes(&self) -> usize {
        self.by_prefecture.values().map(HashSet::len).sum()
    }
}

/// 47 県分のデータセットを並行取得してインデックスを構築する。
///
/// - 取得は全県同時に開始し、全件の完了を待ってから返す（join barrier）。
///   途中経過のインデックスは外から観測できない。
/// - 1 県の取得・解釈失敗はその県を空集合に縮退させるだけで、
///   構築全体は常に成功し、必ず 47 エントリを返す。
pub async fn build_index<F, Fut>(fetch: F, extractor: &ExtractorConfig) -> MunicipalityIndex
where
    F: Fn(&'static str) -> Fut,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    let mut handles = Vec::with_capacity(registry::all().len());
    for pref in registry::all() {
        let dataset = fetch(pref.code);
        let extractor = extractor.clone();
        handles.push((
            pref,
            tokio::spawn(async move {
                let raw = dataset.await?;
                Ok::<_, FetchError>(collect_codes(raw, &extractor))
            }),
        ));
    }

    let mut index = MunicipalityIndex::default();
    for (pref, handle) in handles {
        let codes = match handle.await {
            Ok(Ok(codes)) => codes,
            Ok(Err(err)) => {
                warn!(
                    prefecture = pref.name,
                    code = pref.code,
                    error = %err,
                    "dataset load failed; prefecture degraded to empty set"
                );
                HashSet::new()
            }
            Err(err) => {
                warn!(
                    prefecture = pref.name,
                    code = pref.code,
                    error = %err,
                    "dataset task aborted; prefecture degraded to empty set"
                );
                HashSet::new()
            }
        };
        debug!(prefecture = pref.name, municipalities = codes.len(), "indexed");
        index.insert(pref.name, codes);
    }

    index
}

fn collect_codes(raw: Value, extractor: &ExtractorConfig) -> HashSet<String> {
    FeatureCollection::from_value(raw)
        .features
        .iter()
        .map(|feature| extractor.municipality_code(feature))
        .filter(|code| !code.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset_for(pref_code: &str) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                { "properties": { "N03_007": format!("{pref_code}201") } },
                { "properties": { "N03_007": format!(" {pref_code}202 ") } },
                { "properties": { "N03_007": format!("{pref_code}201") } },
                { "properties": { "N03_007": null } }
            ]
        })
    }

    #[tokio::test]
    async fn builds_one_entry_per_prefecture() {
        let index = build_index(
            |code| {
                let data = dataset_for(code);
                async move { Ok(data) }
            },
            &ExtractorConfig::default(),
        )
        .await;

        assert_eq!(index.len(), 47);
        let tottori = index.codes("鳥取県").unwrap();
        assert_eq!(tottori.len(), 2);
        assert!(tottori.contains("31201"));
        assert!(tottori.contains("31202"));
        assert_eq!(index.total_codes(), 47 * 2);
    }

    #[tokio::test]
    async fn failed_prefecture_degrades_to_empty_set() {
        let index = build_index(
            |code| {
                let data = dataset_for(code);
                let fails = code == "13";
                async move {
                    if fails {
                        Err(FetchError::Unavailable("boom".into()))
                    } else {
                        Ok(data)
                    }
                }
            },
            &ExtractorConfig::default(),
        )
        .await;

        assert_eq!(index.len(), 47);
        assert!(index.codes("東京都").unwrap().is_empty());
        assert_eq!(index.codes("大阪府").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unparseable_dataset_yields_empty_set() {
        let index = build_index(
            |code| {
                let value = if code == "01" {
                    json!("not geojson at all")
                } else {
                    dataset_for(code)
                };
                async move { Ok(value) }
            },
            &ExtractorConfig::default(),
        )
        .await;

        assert!(index.codes("北海道").unwrap().is_empty());
        assert_eq!(index.len(), 47);
    }
}
