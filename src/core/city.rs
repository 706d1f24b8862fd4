use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// 把城市名稱轉成可比較的形式：去重音、小寫、壓縮空白。
///
/// `"  Zürich   Airport "` → `"zurich airport"`
pub fn fold_city(name: &str) -> String {
    let stripped: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true when `target` appears inside `candidate` after folding both.
///
/// Direction matters: a configured `"Zurich"` matches a source `"Zürich Airport"`,
/// not the other way round. An empty target never matches.
pub fn matches(candidate: &str, target: &str) -> bool {
    matches_folded(&fold_city(candidate), &fold_city(target))
}

pub(crate) fn matches_folded(candidate: &str, target: &str) -> bool {
    !target.is_empty() && candidate.contains(target)
}
