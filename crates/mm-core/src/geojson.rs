use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::normalize::normalize_code;

/// データセット取得・解釈の失敗。県単位で発生し、インデックス構築側が
/// 空集合へ縮退させる（全体を落とさない）。
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("dataset unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub properties: Map<String, Value>,
}

/// 入力 GeoJSON を一律の FeatureCollection 形へ正規化したもの。
/// FeatureCollection / 単一 Feature / `features` 配列だけのオブジェクト
/// のいずれも受け付け、それ以外は空になる。
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut obj) = value else {
            return Self::default();
        };

        if obj.get("type").and_then(Value::as_str) == Some("Feature") {
            return Self {
                features: vec![feature_from_value(Value::Object(obj))],
            };
        }

        match obj.remove("features") {
            Some(Value::Array(items)) => Self {
                features: items.into_iter().map(feature_from_value).collect(),
            },
            _ => Self::default(),
        }
    }
}

fn feature_from_value(value: Value) -> Feature {
    match value {
        Value::Object(mut obj) => Feature {
            properties: match obj.remove("properties") {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            },
        },
        _ => Feature::default(),
    }
}

/// プロパティからコード／表示名を取り出す際の候補キー列。
/// 先頭から順に試し、正規化後に空でない最初の値を採用する。
/// 既定値は国土数値情報 N03 形式＋汎用キー。新しいデータソースは
/// ここを差し替えるだけで対応できる。
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub code_keys: Vec<String>,
    pub name_keys: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            code_keys: ["N03_007", "code", "id"].map(String::from).to_vec(),
            name_keys: ["N03_004", "N03_003", "city", "name"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl ExtractorConfig {
    /// 市区町村コード。どの候補キーでも取れなければ空文字。
    pub fn municipality_code(&self, feature: &Feature) -> String {
        self.code_keys
            .iter()
            .filter_map(|key| feature.properties.get(key))
            .map(normalize_code)
            .find(|code| !code.is_empty())
            .unwrap_or_default()
    }

    /// 市区町村の表示名。コアの進捗計算には使わないが、描画層が
    /// 同じ候補キー解決を使い回せるようにここへ置く。
    pub fn municipality_name(&self, feature: &Feature) -> Option<String> {
        self.name_keys
            .iter()
            .filter_map(|key| feature.properties.get(key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// リモート配信の県別 GeoJSON（URL テンプレート中の `{code}` を
/// "01"〜"47" で置換する）。
#[derive(Debug, Clone)]
pub struct HttpDatasetSource {
    client: reqwest::Client,
    url_template: String,
}

impl HttpDatasetSource {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url_template: url_template.into(),
        }
    }

    pub async fn fetch(&self, pref_code: &str) -> Result<Value, FetchError> {
        let url = self.url_template.replace("{code}", pref_code);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// ローカルディレクトリ内の `<code>.json` を読む版。
#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    dir: PathBuf,
}

impl FileDatasetSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub async fn fetch(&self, pref_code: &str) -> Result<Value, FetchError> {
        let path = self.dir.join(format!("{pref_code}.json"));
        let bytes = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_feature_collection() {
        let fc = FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "N03_007": "31201" } },
                { "type": "Feature", "properties": { "N03_007": "31202" } }
            ]
        }));
        assert_eq!(fc.features.len(), 2);
    }

    #[test]
    fn wraps_single_feature() {
        let fc = FeatureCollection::from_value(json!({
            "type": "Feature",
            "properties": { "code": "13101" }
        }));
        assert_eq!(fc.features.len(), 1);
        assert_eq!(fc.features[0].properties["code"], json!("13101"));
    }

    #[test]
    fn accepts_bare_features_array() {
        let fc = FeatureCollection::from_value(json!({
            "features": [ { "properties": { "id": 31201 } } ]
        }));
        assert_eq!(fc.features.len(), 1);
    }

    #[test]
    fn anything_else_is_empty() {
        assert!(FeatureCollection::from_value(Value::Null).features.is_empty());
        assert!(FeatureCollection::from_value(json!("geojson"))
            .features
            .is_empty());
        assert!(FeatureCollection::from_value(json!({ "type": "Polygon" }))
            .features
            .is_empty());
    }

    #[test]
    fn features_without_properties_survive() {
        let fc = FeatureCollection::from_value(json!({
            "features": [ {}, { "properties": null } ]
        }));
        assert_eq!(fc.features.len(), 2);
        assert!(fc.features.iter().all(|f| f.properties.is_empty()));
    }

    #[test]
    fn code_keys_are_tried_in_order() {
        let config = ExtractorConfig::default();
        let fc = FeatureCollection::from_value(json!({
            "features": [
                { "properties": { "N03_007": "31201", "code": "xxxxx" } },
                { "properties": { "code": 31202 } },
                { "properties": { "id": "31203" } },
                { "properties": { "name": "コードなし" } }
            ]
        }));

        let codes: Vec<String> = fc
            .features
            .iter()
            .map(|f| config.municipality_code(f))
            .collect();
        assert_eq!(codes, vec!["31201", "31202", "31203", ""]);
    }

    #[test]
    fn blank_candidate_falls_through_to_next_key() {
        let config = ExtractorConfig::default();
        let fc = FeatureCollection::from_value(json!({
            "features": [ { "properties": { "N03_007": "  ", "code": "31201" } } ]
        }));
        assert_eq!(config.municipality_code(&fc.features[0]), "31201");
    }

    #[test]
    fn custom_code_keys_override_defaults() {
        let config = ExtractorConfig {
            code_keys: vec!["muni_cd".into()],
            ..ExtractorConfig::default()
        };
        let fc = FeatureCollection::from_value(json!({
            "features": [ { "properties": { "muni_cd": "01100", "N03_007": "ignored" } } ]
        }));
        assert_eq!(config.municipality_code(&fc.features[0]), "01100");
    }

    #[test]
    fn resolves_display_name() {
        let config = ExtractorConfig::default();
        let fc = FeatureCollection::from_value(json!({
            "features": [
                { "properties": { "N03_004": "鳥取市" } },
                { "properties": { "city": "米子市" } },
                { "properties": { "N03_007": "31203" } }
            ]
        }));

        assert_eq!(
            config.municipality_name(&fc.features[0]).as_deref(),
            Some("鳥取市")
        );
        assert_eq!(
            config.municipality_name(&fc.features[1]).as_deref(),
            Some("米子市")
        );
        assert_eq!(config.municipality_name(&fc.features[2]), None);
    }
}
