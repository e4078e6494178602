use std::collections::HashMap;

use lazy_static::lazy_static;

/// 都道府県（コードは JIS X 0401 の 2 桁ゼロ埋め）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefecture {
    pub code: &'static str,
    pub name: &'static str,
}

/// 47 都道府県をコード昇順（"01"〜"47"）で保持する。プロセス起動時に固定。
pub const PREFECTURES: [Prefecture; 47] = [
    Prefecture { code: "01", name: "北海道" },
    Prefecture { code: "02", name: "青森県" },
    Prefecture { code: "03", name: "岩手県" },
    Prefecture { code: "04", name: "宮城県" },
    Prefecture { code: "05", name: "秋田県" },
    Prefecture { code: "06", name: "山形県" },
    Prefecture { code: "07", name: "福島県" },
    Prefecture { code: "08", name: "茨城県" },
    Prefecture { code: "09", name: "栃木県" },
    Prefecture { code: "10", name: "群馬県" },
    Prefecture { code: "11", name: "埼玉県" },
    Prefecture { code: "12", name: "千葉県" },
    Prefecture { code: "13", name: "東京都" },
    Prefecture { code: "14", name: "神奈川県" },
    Prefecture { code: "15", name: "新潟県" },
    Prefecture { code: "16", name: "富山県" },
    Prefecture { code: "17", name: "石川県" },
    Prefecture { code: "18", name: "福井県" },
    Prefecture { code: "19", name: "山梨県" },
    Prefecture { code: "20", name: "長野県" },
    Prefecture { code: "21", name: "岐阜県" },
    Prefecture { code: "22", name: "静岡県" },
    Prefecture { code: "23", name: "愛知県" },
    Prefecture { code: "24", name: "三重県" },
    Prefecture { code: "25", name: "滋賀県" },
    Prefecture { code: "26", name: "京都府" },
    Prefecture { code: "27", name: "大阪府" },
    Prefecture { code: "28", name: "兵庫県" },
    Prefecture { code: "29", name: "奈良県" },
    Prefecture { code: "30", name: "和歌山県" },
    Prefecture { code: "31", name: "鳥取県" },
    Prefecture { code: "32", name: "島根県" },
    Prefecture { code: "33", name: "岡山県" },
    Prefecture { code: "34", name: "広島県" },
    Prefecture { code: "35", name: "山口県" },
    Prefecture { code: "36", name: "徳島県" },
    Prefecture { code: "37", name: "香川県" },
    Prefecture { code: "38", name: "愛媛県" },
    Prefecture { code: "39", name: "高知県" },
    Prefecture { code: "40", name: "福岡県" },
    Prefecture { code: "41", name: "佐賀県" },
    Prefecture { code: "42", name: "長崎県" },
    Prefecture { code: "43", name: "熊本県" },
    Prefecture { code: "44", name: "大分県" },
    Prefecture { code: "45", name: "宮崎県" },
    Prefecture { code: "46", name: "鹿児島県" },
    Prefecture { code: "47", name: "沖縄県" },
];

lazy_static! {
    /// 県名 → 都道府県コード
    static ref CODE_BY_NAME: HashMap<&'static str, &'static str> =
        PREFECTURES.iter().map(|p| (p.name, p.code)).collect();

    /// 都道府県コード → 県名
    static ref NAME_BY_CODE: HashMap<&'static str, &'static str> =
        PREFECTURES.iter().map(|p| (p.code, p.name)).collect();
}

/// コード昇順の全都道府県
pub fn all() -> &'static [Prefecture] {
    &PREFECTURES
}

pub fn code_by_name(name: &str) -> Option<&'static str> {
    CODE_BY_NAME.get(name.trim()).copied()
}

pub fn name_by_code(code: &str) -> Option<&'static str> {
    NAME_BY_CODE.get(code.trim()).copied()
}
