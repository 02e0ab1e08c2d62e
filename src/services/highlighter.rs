//! 标记片段高亮 - 业务能力层
//!
//! 把被标记的原文片段用 `<mark>` 包裹，输出可直接渲染的 HTML 文本。
//!
//! 所有片段合成一个不区分大小写的正则，按长度降序排列：
//! 同一位置上较长的片段优先匹配，所以 "SPARTAN" 不会被拆成 "SPARTA" + "N"，
//! 也不会产生嵌套标签。

use regex::RegexBuilder;
use tracing::{debug, warn};

const MARK_OPEN: &str = "<mark>";
const MARK_CLOSE: &str = "</mark>";

/// 高亮所有被标记的片段
///
/// 文本或片段列表为空时原样返回（不转义）；找不到的片段直接跳过。
/// 其余情况下输出中的原文都已转义。
pub fn highlight_flagged_spans(text: &str, spans: &[String]) -> String {
    if text.is_empty() || spans.is_empty() {
        return text.to_string();
    }

    let mut ordered: Vec<&str> = spans
        .iter()
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    ordered.dedup();

    if ordered.is_empty() {
        return text.to_string();
    }

    let pattern = ordered
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");

    let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            warn!("构建高亮正则失败，跳过高亮: {}", e);
            return escape_html(text);
        }
    };

    let mut out = String::with_capacity(text.len() + ordered.len() * 16);
    let mut last = 0;
    let mut hits = 0;
    for m in re.find_iter(text) {
        out.push_str(&escape_html(&text[last..m.start()]));
        out.push_str(MARK_OPEN);
        out.push_str(&escape_html(m.as_str()));
        out.push_str(MARK_CLOSE);
        last = m.end();
        hits += 1;
    }
    out.push_str(&escape_html(&text[last..]));

    debug!("高亮 {} 处标记片段（共 {} 个候选）", hits, ordered.len());
    out
}

/// HTML 转义
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
