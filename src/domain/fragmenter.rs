//! 文本分片器
//!
//! 将任意文本切分为有序的、长度受限的片段，每个片段对应一次语音合成请求。
//!
//! 分片策略（逐段落处理）：
//! 1. 按换行切分段落，去除首尾空白，丢弃空段落
//! 2. 段落不超过上限时原样输出
//! 3. 否则按句号切分句子，在段落内累积句子直到接近上限
//! 4. 单个句子超过上限时按逗号切分子句，子句单独累积，输出时补句号
//!
//! 没有逗号且超过上限的子句会原样输出（超长），不会在词中间截断。

use serde::Serialize;
use thiserror::Error;

/// 默认片段字符数上限
pub const DEFAULT_MAX_CHARS: usize = 220;

/// 分片错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    #[error("Fragment limit must be positive, got {0}")]
    InvalidLimit(usize),
}

/// 片段字符数上限（按 Unicode 字符计数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentLimit(usize);

impl FragmentLimit {
    pub fn new(max_chars: usize) -> Result<Self, FragmentError> {
        if max_chars == 0 {
            return Err(FragmentError::InvalidLimit(max_chars));
        }
        Ok(Self(max_chars))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// 带序号的片段，序号从 1 开始
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub index: usize,
    pub text: String,
}

impl Fragment {
    /// 对应的音频文件名
    pub fn audio_filename(&self) -> String {
        format!("{}.mp3", self.index)
    }
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 段落内的累积状态
///
/// `current` 为句子级缓冲，段落结束时清空，不跨段落
struct Accumulator {
    limit: usize,
    fragments: Vec<String>,
    current: String,
}

impl Accumulator {
    fn new(limit: FragmentLimit) -> Self {
        Self {
            limit: limit.get(),
            fragments: Vec::new(),
            current: String::new(),
        }
    }

    /// 加入一个不超过上限的句子
    fn push_sentence(&mut self, sentence: &str) {
        let joined_len = if self.current.is_empty() {
            char_len(sentence)
        } else {
            char_len(&self.current) + 1 + char_len(sentence)
        };

        if joined_len > self.limit {
            self.flush_sentences();
            self.current.push_str(sentence);
        } else {
            if !self.current.is_empty() {
                self.current.push(' ');
            }
            self.current.push_str(sentence);
        }
    }

    /// 超长句子：按逗号累积子句，直接输出，不经过句子级缓冲
    ///
    /// 缓冲中已有的句子先输出，保证片段顺序与原文一致
    fn push_oversized_sentence(&mut self, sentence: &str) {
        self.flush_sentences();

        // 预留一个字符给补上的句号
        let budget = self.limit.saturating_sub(1);
        let mut part = String::new();

        for clause in sentence.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            if part.is_empty() {
                part.push_str(clause);
            } else if char_len(&part) + 2 + char_len(clause) <= budget {
                part.push_str(", ");
                part.push_str(clause);
            } else {
                self.emit_clause(std::mem::take(&mut part));
                part.push_str(clause);
            }
        }

        if !part.is_empty() {
            self.emit_clause(part);
        }
    }

    fn emit_clause(&mut self, mut part: String) {
        if !part.ends_with('.') {
            part.push('.');
        }
        self.fragments.push(part);
    }

    fn flush_sentences(&mut self) {
        let pending = std::mem::take(&mut self.current);
        let trimmed = pending.trim();
        if !trimmed.is_empty() {
            self.fragments.push(trimmed.to_string());
        }
    }

    fn push_paragraph(&mut self, paragraph: &str) {
        if char_len(paragraph) <= self.limit {
            self.fragments.push(paragraph.to_string());
            return;
        }

        for sentence in split_sentences(paragraph) {
            if char_len(&sentence) > self.limit {
                self.push_oversized_sentence(&sentence);
            } else {
                self.push_sentence(&sentence);
            }
        }

        self.flush_sentences();
    }
}

/// 按换行切分段落
fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|p| !p.is_empty())
}

/// 按句号切分句子，每个句子补回句号
///
/// 先把 ". " 折叠为 "."，避免分隔符吞掉后面的空格。缩写和小数同样会被切开。
fn split_sentences(paragraph: &str) -> Vec<String> {
    paragraph
        .replace(". ", ".")
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{}.", s))
        .collect()
}

/// 对文本进行分片
///
/// 片段顺序与原文一致，且不会返回空片段。
pub fn split_text(text: &str, limit: FragmentLimit) -> Vec<String> {
    let mut acc = Accumulator::new(limit);
    for paragraph in split_paragraphs(text) {
        acc.push_paragraph(paragraph);
    }
    acc.fragments
}

/// 校验上限后分片
pub fn split(text: &str, max_chars: usize) -> Result<Vec<String>, FragmentError> {
    let limit = FragmentLimit::new(max_chars)?;
    Ok(split_text(text, limit))
}

/// 为片段编号（从 1 开始）
pub fn index_fragments(fragments: Vec<String>) -> Vec<Fragment> {
    fragments
        .into_iter()
        .enumerate()
        .map(|(i, text)| Fragment { index: i + 1, text })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(n: usize) -> FragmentLimit {
        FragmentLimit::new(n).unwrap()
    }

    /// 构造长度恰为 `len` 的无逗号句子（以句号结尾）
    fn plain_sentence(len: usize) -> String {
        let mut s: String = "abcdefghi ".repeat(len / 10 + 1).chars().take(len - 1).collect();
        s = s.trim_end().to_string();
        while char_len(&s) < len - 1 {
            s.push('x');
        }
        s.push('.');
        s
    }

    #[test]
    fn test_empty_text_yields_no_fragments() {
        assert!(split_text("", limit(220)).is_empty());
        assert!(split_text(" \n\n  \t\n", limit(220)).is_empty());
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        assert_eq!(split("hola", 0), Err(FragmentError::InvalidLimit(0)));
    }

    #[test]
    fn test_short_text_single_fragment() {
        assert_eq!(split_text("Hello world.", limit(220)), vec!["Hello world."]);
    }

    #[test]
    fn test_lines_are_not_merged() {
        let fragments = split_text("Line one.\nLine two.", limit(220));
        assert_eq!(fragments, vec!["Line one.", "Line two."]);
    }

    #[test]
    fn test_fitting_paragraph_is_verbatim() {
        let paragraph = "First sentence. Second one! Third?  spaced   out";
        let fragments = split_text(&format!("  {}  \r\n", paragraph), limit(100));
        assert_eq!(fragments, vec![paragraph]);
    }

    #[test]
    fn test_sentences_accumulate_within_limit() {
        let text = "Aaaa aaaa aaaa. Bbbb bbbb bbbb. Cccc cccc cccc. Dddd dddd dddd.";
        let fragments = split_text(text, limit(35));
        assert_eq!(
            fragments,
            vec![
                "Aaaa aaaa aaaa. Bbbb bbbb bbbb.",
                "Cccc cccc cccc. Dddd dddd dddd."
            ]
        );
        assert!(fragments.iter().all(|f| char_len(f) <= 35));
    }

    #[test]
    fn test_joining_space_counts_against_limit() {
        // "Aaaa." + " " + "Bbbb." = 11 > 10
        let fragments = split_text("Aaaa. Bbbb. Cc", limit(10));
        assert_eq!(fragments, vec!["Aaaa.", "Bbbb. Cc."]);
    }

    #[test]
    fn test_periods_split_abbreviations() {
        let text = "Dr. Smith paid 3.50 dollars today at the market";
        let fragments = split_text(text, limit(20));
        assert_eq!(fragments, vec!["Dr. Smith paid 3.", "50 dollars today at the market."]);
    }

    #[test]
    fn test_oversized_sentence_splits_on_commas() {
        let clause = "word word word word word word word word word wo"; // 47
        let sentence = format!("{}.", vec![clause; 6].join(", "));
        assert!(char_len(&sentence) > 290);

        let fragments = split_text(&sentence, limit(100));
        assert!(fragments.len() > 1);
        for f in &fragments {
            assert!(char_len(f) <= 100, "{} chars: {}", char_len(f), f);
            assert!(f.ends_with('.'));
            assert!(!f.ends_with(".."));
        }
        let words: usize = fragments.iter().map(|f| f.matches("word").count()).sum();
        assert_eq!(words, 6 * 9);
    }

    #[test]
    fn test_clause_path_normalizes_terminal_punctuation() {
        let text = "Is this long enough, really long enough, to be split apart?";
        let fragments = split_text(text, limit(25));
        assert_eq!(
            fragments,
            vec!["Is this long enough.", "really long enough.", "to be split apart?."]
        );
    }

    #[test]
    fn test_clause_join_reserves_room_for_period() {
        // "aaaa, bbbb" 恰为 10 字符，补句号后会变成 11
        let fragments = split_text("aaaa, bbbb, cccccc.", limit(10));
        assert_eq!(fragments, vec!["aaaa.", "bbbb.", "cccccc."]);

        // 少一个字符时可以合并
        let fragments = split_text("aaa, bbbb, cccccc.", limit(10));
        assert_eq!(fragments, vec!["aaa, bbbb.", "cccccc."]);
        assert!(fragments.iter().all(|f| char_len(f) <= 10));
    }

    #[test]
    fn test_comma_free_oversized_sentence_is_kept_whole() {
        let sentence = plain_sentence(300);
        assert_eq!(char_len(&sentence), 300);

        let fragments = split_text(&sentence, limit(100));
        assert_eq!(fragments, vec![sentence.clone()]);
        assert_eq!(char_len(&fragments[0]), 300);
    }

    #[test]
    fn test_oversized_sentence_keeps_source_order() {
        let long = plain_sentence(60);
        let text = format!("Short one. {} Tail here.", long);
        let fragments = split_text(&text, limit(30));
        assert_eq!(fragments, vec!["Short one.".to_string(), long, "Tail here.".to_string()]);
    }

    #[test]
    fn test_buffer_does_not_cross_paragraphs() {
        let lead = plain_sentence(20);
        let text = format!("{} Alpha.\nBeta.", lead);
        let fragments = split_text(&text, limit(25));
        assert_eq!(fragments, vec![lead, "Alpha.".to_string(), "Beta.".to_string()]);
    }

    #[test]
    fn test_no_empty_fragments() {
        let text = "...\n. . .\n,,,,\nA. . B,, , C. ,\n\n";
        let fragments = split_text(text, limit(1));
        assert!(fragments.iter().all(|f| !f.is_empty()));
    }

    #[test]
    fn test_invariants_over_corpus() {
        let texts = [
            "Érase una vez, en un lugar muy lejano, un reino. El rey, que era sabio, gobernaba con justicia, paciencia y calma.\nFin.",
            "One. Two, three, four. Five six seven eight nine ten eleven twelve thirteen.",
            "No punctuation at all just a long run of words that keeps going and going without any pause whatsoever",
            "a,b,c,d,e,f,g,h,i,j,k,l,m,n,o,p,q,r,s,t,u,v,w,x,y,z. 1.2.3.4.5.6.7.8.9",
            "\n\n  Mixed!  Punctuation? Here; and: there, everywhere.  \n\t\nLast line, short.",
        ];

        for text in texts {
            for max_chars in [1, 5, 12, 25, 40, 100, 500] {
                let fragments = split_text(text, limit(max_chars));

                assert!(fragments.iter().all(|f| !f.is_empty()));
                // 超长片段只可能来自没有逗号的单个子句
                for f in &fragments {
                    assert!(
                        char_len(f) <= max_chars || !f.contains(','),
                        "limit {} violated by {:?}",
                        max_chars,
                        f
                    );
                }
                // 只有标点和空白会被规范化，字母数字的顺序不变
                let source: String = text.chars().filter(|c| c.is_alphanumeric()).collect();
                let output: String = fragments
                    .concat()
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect();
                assert_eq!(source, output, "order changed at limit {}", max_chars);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Uno, dos, tres. Cuatro, cinco.\nSeis siete ocho nueve diez.";
        assert_eq!(split_text(text, limit(12)), split_text(text, limit(12)));
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let text = "Canción añeja. Árbol pequeño.";
        // 29 字符，但字节数更多
        assert!(text.len() > 29);
        assert_eq!(split_text(text, limit(29)), vec![text]);
    }

    #[test]
    fn test_index_fragments_starts_at_one() {
        let fragments = index_fragments(vec!["a".into(), "b".into()]);
        assert_eq!(fragments[0].index, 1);
        assert_eq!(fragments[1].audio_filename(), "2.mp3");
    }
}
