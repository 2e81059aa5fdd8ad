//! Unicode to LaTeX encoding.
//!
//! Turns arbitrary Unicode text into pure ASCII that LaTeX renders as the
//! original characters. ASCII input is returned untouched so existing LaTeX
//! markup survives.

use lazy_static::lazy_static;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// Characters with a dedicated LaTeX command or ligature.
    static ref SYMBOLS: HashMap<char, &'static str> = [
        ('ß', "{\\ss}"),
        ('æ', "{\\ae}"), ('Æ', "{\\AE}"),
        ('œ', "{\\oe}"), ('Œ', "{\\OE}"),
        ('ø', "{\\o}"), ('Ø', "{\\O}"),
        ('ł', "{\\l}"), ('Ł', "{\\L}"),
        ('å', "{\\aa}"), ('Å', "{\\AA}"),
        ('ı', "{\\i}"), ('ȷ', "{\\j}"),
        ('đ', "{\\dj}"), ('Đ', "{\\DJ}"),
        ('þ', "{\\th}"), ('Þ', "{\\TH}"),
        ('ð', "{\\dh}"), ('Ð', "{\\DH}"),
        ('ŋ', "{\\ng}"), ('Ŋ', "{\\NG}"),
        ('¡', "{!`}"), ('¿', "{?`}"),
        ('«', "{\\guillemotleft}"), ('»', "{\\guillemotright}"),
        ('‹', "{\\guilsinglleft}"), ('›', "{\\guilsinglright}"),
        ('\u{2013}', "--"), ('\u{2014}', "---"),
        ('\u{2018}', "`"), ('\u{2019}', "'"),
        ('\u{201C}', "``"), ('\u{201D}', "''"),
        ('\u{201E}', ",,"),
        ('\u{00A0}', "~"),
        ('\u{2026}', "{\\ldots}"),
        ('§', "{\\S}"), ('¶', "{\\P}"),
        ('©', "{\\textcopyright}"), ('®', "{\\textregistered}"),
        ('™', "{\\texttrademark}"),
        ('°', "{\\textdegree}"),
        ('€', "{\\texteuro}"), ('£', "{\\pounds}"),
        ('†', "{\\dag}"), ('‡', "{\\ddag}"),
        ('•', "{\\textbullet}"),
        ('×', "{$\\times$}"), ('÷', "{$\\div$}"),
        ('±', "{$\\pm$}"), ('µ', "{$\\mu$}"),
        ('α', "{$\\alpha$}"), ('β', "{$\\beta$}"), ('γ', "{$\\gamma$}"),
        ('δ', "{$\\delta$}"), ('ε', "{$\\epsilon$}"), ('λ', "{$\\lambda$}"),
        ('μ', "{$\\mu$}"), ('π', "{$\\pi$}"), ('σ', "{$\\sigma$}"),
        ('τ', "{$\\tau$}"), ('φ', "{$\\phi$}"), ('ω', "{$\\omega$}"),
        ('Δ', "{$\\Delta$}"), ('Σ', "{$\\Sigma$}"), ('Ω', "{$\\Omega$}"),
    ]
    .into_iter()
    .collect();
}

/// LaTeX accent command for a combining mark.
fn accent_command(mark: char) -> Option<&'static str> {
    Some(match mark {
        '\u{0300}' => "`",
        '\u{0301}' => "'",
        '\u{0302}' => "^",
        '\u{0303}' => "~",
        '\u{0304}' => "=",
        '\u{0306}' => "u",
        '\u{0307}' => ".",
        '\u{0308}' => "\"",
        '\u{030A}' => "r",
        '\u{030B}' => "H",
        '\u{030C}' => "v",
        '\u{0323}' => "d",
        '\u{0327}' => "c",
        '\u{0328}' => "k",
        '\u{0331}' => "b",
        _ => return None,
    })
}

/// Encode `text` as ASCII LaTeX.
///
/// ```
/// use paperpal_core::bibtex::latex::encode;
/// assert_eq!(encode("Vasić"), "Vasi{\\'c}");
/// ```
pub fn encode(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.nfc().peekable();
    while let Some(c) = chars.next() {
        let mut cluster = String::from(c);
        while let Some(mark) = chars.next_if(|&next| is_combining_mark(next)) {
            cluster.push(mark);
        }
        encode_cluster(&cluster, &mut out);
    }
    out
}

/// A base character with the combining marks NFC could not fold into it.
fn encode_cluster(cluster: &str, out: &mut String) {
    let mut chars = cluster.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        encode_char(c, out);
    } else if let Some(accented) = encode_decomposed(cluster) {
        out.push_str(&accented);
    } else {
        for c in cluster.chars() {
            encode_char(c, out);
        }
    }
}

fn encode_char(c: char, out: &mut String) {
    if c.is_ascii() {
        out.push(c);
    } else if let Some(symbol) = SYMBOLS.get(&c) {
        out.push_str(symbol);
    } else if let Some(accented) = encode_decomposed(c.encode_utf8(&mut [0; 4])) {
        out.push_str(&accented);
    } else {
        out.push_str(&format!("{{\\char\"{:04X}}}", c as u32));
    }
}

/// `ć` -> `{\'c}`, `č` -> `{\v c}`, `ǘ` -> `{\'{\"u}}`, `í` -> `{\'\i}`.
/// Returns `None` when the text does not decompose into an ASCII letter
/// followed by known combining marks.
fn encode_decomposed(text: &str) -> Option<String> {
    let mut parts = text.nfd();
    let base = parts.next()?;
    if !base.is_ascii_alphabetic() {
        return None;
    }
    let marks: Vec<char> = parts.collect();
    if marks.is_empty() {
        return None;
    }

    let mut body = match base {
        'i' => "\\i".to_string(),
        'j' => "\\j".to_string(),
        other => other.to_string(),
    };
    let last = marks.len() - 1;
    for (i, mark) in marks.into_iter().enumerate() {
        let command = accent_command(mark)?;
        let letter_command = command.chars().all(|ch| ch.is_ascii_alphabetic());
        let separator = if letter_command && !body.starts_with('\\') && !body.starts_with('{') {
            " "
        } else {
            ""
        };
        let inner = format!("\\{command}{separator}{body}");
        body = if i == last { inner } else { format!("{{{inner}}}") };
    }
    Some(format!("{{{body}}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_untouched() {
        let text = r"Proceedings of the 1st {{Workshop}} on {\'e}t\'e \& more";
        assert_eq!(encode(text), text);
    }

    #[test]
    fn test_symbol_accents() {
        assert_eq!(encode("Vasić"), "Vasi{\\'c}");
        assert_eq!(encode("Müller"), "M{\\\"u}ller");
        assert_eq!(encode("Crème"), "Cr{\\`e}me");
        assert_eq!(encode("São"), "S{\\~a}o");
    }

    #[test]
    fn test_letter_accents_get_a_space() {
        assert_eq!(encode("Dvořák"), "Dvo{\\v r}{\\'a}k");
        assert_eq!(encode("Façade"), "Fa{\\c c}ade");
        assert_eq!(encode("Erdős"), "Erd{\\H o}s");
    }

    #[test]
    fn test_dotless_i() {
        assert_eq!(encode("Martín"), "Mart{\\'\\i}n");
        assert_eq!(encode("ı"), "{\\i}");
    }

    #[test]
    fn test_stacked_accents() {
        assert_eq!(encode("ǘ"), "{\\'{\\\"u}}");
    }

    #[test]
    fn test_symbols() {
        assert_eq!(encode("Straße"), "Stra{\\ss}e");
        assert_eq!(encode("Łódź"), "{\\L}{\\'o}d{\\'z}");
        assert_eq!(encode("pp. 37–42"), "pp. 37--42");
        assert_eq!(encode("“quoted”"), "``quoted''");
    }

    #[test]
    fn test_decomposed_input() {
        assert_eq!(encode("Vasic\u{0301}"), "Vasi{\\'c}");
        assert_eq!(encode("Dvor\u{030C}a\u{0301}k"), "Dvo{\\v r}{\\'a}k");
        // No precomposed form exists; the mark still attaches to its letter.
        assert_eq!(encode("q\u{0301}"), "{\\'q}");
        assert_eq!(encode("\u{0301}x"), "{\\char\"0301}x");
    }

    #[test]
    fn test_fallback_is_lossless_ascii() {
        assert_eq!(encode("漢"), "{\\char\"6F22}");
        assert_eq!(encode("😀"), "{\\char\"1F600}");
        assert!(encode("Ωmega ἀ 漢字").is_ascii());
    }
}
