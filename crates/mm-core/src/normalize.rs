use serde_json::Value;

/// 市区町村コードの正規化。
///
/// GeoJSON のプロパティ値は文字列・数値・null が混在するため、
/// ここで一律にトリム済み文字列へ落とす。欠損・非スカラーは空文字。
/// 空文字が「無効／欠損」の番兵であり、呼び出し側は Set へ入れる前に
/// 必ず空文字を除外する契約。
pub fn normalize_code(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// 文字列入力用（toggle/contains などの外部入力経路）
pub fn normalize_code_str(raw: &str) -> String {
    raw.trim().to_string()
}
