//! Token sequence to display text.

use regex::{Captures, Regex};
use std::sync::OnceLock;
use voxstream_core::{RendererConfig, Token};

/// Word-boundary marker used by sentencepiece vocabularies.
const WORD_START: char = '\u{2581}';

const SPECIAL_SYMBOLS: [&str; 6] = ["<blk>", "<blank>", "<unk>", "<sos/eos>", "<s>", "</s>"];

pub trait TextRenderer: Send + Sync {
    fn render(&self, tokens: &[Token]) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct SymbolRenderer {
    normalize_digits: bool,
    lowercase: bool,
}

impl SymbolRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            normalize_digits: config.normalize_digits,
            lowercase: config.lowercase,
        }
    }
}

impl TextRenderer for SymbolRenderer {
    fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut pending_space = false;

        for token in tokens {
            if SPECIAL_SYMBOLS.contains(&token.symbol.as_str()) {
                continue;
            }
            let body = match token.symbol.strip_prefix(WORD_START) {
                Some(rest) => {
                    pending_space = !out.is_empty();
                    rest
                }
                None => token.symbol.as_str(),
            };
            for ch in body.chars() {
                if let Some(prev) = out.chars().next_back() {
                    if needs_space(prev, ch, pending_space) {
                        out.push(' ');
                    }
                }
                pending_space = false;
                out.push(ch);
            }
        }

        if self.normalize_digits {
            out = normalize_chinese_numerals(&out);
        }
        if self.lowercase {
            out = out.to_lowercase();
        }
        out.trim().to_string()
    }
}

fn needs_space(prev: char, next: char, pending_space: bool) -> bool {
    if prev == ' ' {
        return false;
    }
    match (is_cjk(prev), is_cjk(next)) {
        (true, true) => false,
        (true, false) => next.is_alphanumeric() || pending_space,
        (false, true) => prev.is_alphanumeric() || pending_space,
        (false, false) => pending_space,
    }
}

pub fn is_cjk(ch: char) -> bool {
    matches!(ch as u32,
        0x3000..=0x303F     // punctuation
        | 0x3040..=0x30FF   // kana
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xAC00..=0xD7AF   // hangul
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFFEF)
}

fn numeral_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new("[零〇一二两三四五六七八九十百千万亿]+")
            .expect("numeral pattern is valid")
    })
}

/// Rewrite runs of Chinese numerals as Arabic digits.
///
/// Runs with place units are read as a value (`二十三` -> `23`), runs of bare
/// digits are transliterated one by one (`一二三` -> `123`). Single
/// characters and runs where a large unit has no leading digit (`百`, `千万`,
/// `万一`) are kept as they are.
pub fn normalize_chinese_numerals(text: &str) -> String {
    numeral_run()
        .replace_all(text, |caps: &Captures| {
            let run = &caps[0];
            convert_run(run).unwrap_or_else(|| run.to_string())
        })
        .into_owned()
}

fn convert_run(run: &str) -> Option<String> {
    // a lone numeral is usually part of a word (统一, 一起, 十分)
    if run.chars().nth(1).is_none() {
        return None;
    }
    let has_digit = run.chars().any(|c| digit_value(c).is_some());
    if !has_digit && !run.contains('十') {
        return None;
    }
    if run.chars().all(|c| digit_value(c).is_some()) {
        return run
            .chars()
            .map(|c| digit_value(c).and_then(|d| char::from_digit(d as u32, 10)))
            .collect();
    }
    positional_value(run).map(|v| v.to_string())
}

fn digit_value(ch: char) -> Option<u64> {
    let value = match ch {
        '零' | '〇' => 0,
        '一' => 1,
        '二' | '两' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        _ => return None,
    };
    Some(value)
}

fn positional_value(run: &str) -> Option<u64> {
    // completed 亿 groups, completed 万 group, current section below 万
    let mut total: u64 = 0;
    let mut wan: u64 = 0;
    let mut section: u64 = 0;
    let mut number: u64 = 0;

    for ch in run.chars() {
        if let Some(d) = digit_value(ch) {
            number = d;
            continue;
        }
        match ch {
            '十' => {
                let n = if number == 0 { 1 } else { number };
                section = section.checked_add(n * 10)?;
                number = 0;
            }
            '百' | '千' => {
                if number == 0 {
                    return None;
                }
                let unit = if ch == '百' { 100 } else { 1000 };
                section = section.checked_add(number.checked_mul(unit)?)?;
                number = 0;
            }
            '万' => {
                let group = section.checked_add(number)?;
                if group == 0 {
                    return None;
                }
                wan = wan.checked_add(group.checked_mul(10_000)?)?;
                section = 0;
                number = 0;
            }
            '亿' => {
                let group = wan.checked_add(section)?.checked_add(number)?;
                if group == 0 {
                    return None;
                }
                total = total.checked_add(group.checked_mul(100_000_000)?)?;
                wan = 0;
                section = 0;
                number = 0;
            }
            _ => return None,
        }
    }

    total.checked_add(wan)?.checked_add(section)?.checked_add(number)
}
