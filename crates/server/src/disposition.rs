//! `Content-Disposition` assembly for downloads, and the matching decoder.
//!
//! Names made only of printable ASCII use the quoted `filename="..."` form
//! with `"` and `\` escaped. Anything else uses the RFC 2231 extended form
//! `filename*="UTF-8''<percent-encoded>"`. The decoder additionally accepts
//! RFC 2047 encoded words in the plain parameter, which some clients emit.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Bytes left unescaped in an RFC 2231 value (`attr-char` of RFC 5987).
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Build the header value for a download of a blob named `name`.
pub fn content_disposition(name: Option<&str>) -> String {
    match name {
        None | Some("") => "attachment".to_owned(),
        Some(name) if name.bytes().all(|b| (0x20..0x7f).contains(&b)) => {
            format!(
                "attachment; filename=\"{}\"",
                name.replace('\\', "\\\\").replace('"', "\\\"")
            )
        }
        Some(name) => format!(
            "attachment; filename*=\"UTF-8''{}\"",
            utf8_percent_encode(name, ATTR_CHAR)
        ),
    }
}

/// Recover the filename from a `Content-Disposition` value.
///
/// `filename*` wins over `filename` when both are present. Returns `None`
/// when neither parameter exists or the extended value cannot be decoded.
pub fn decode_filename(header: &str) -> Option<String> {
    let params = parameters(header);

    if let Some((_, value)) = params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("filename*"))
    {
        return decode_extended(value);
    }

    params
        .into_iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("filename"))
        .map(|(_, value)| decode_encoded_words(&value))
}

/// Split `type; k=v; k="quoted; v"` into unquoted `(k, v)` pairs.
fn parameters(header: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = header.chars().peekable();

    // Skip the disposition type.
    for c in chars.by_ref() {
        if c == ';' {
            break;
        }
    }

    loop {
        let mut key = String::new();
        for c in chars.by_ref() {
            if c == '=' {
                break;
            }
            key.push(c);
        }
        let key = key.trim().to_owned();
        if key.is_empty() {
            return params;
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    c => value.push(c),
                }
            }
            // Discard anything up to the next separator.
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                value.push(c);
            }
            value = value.trim().to_owned();
        }

        params.push((key, value));
    }
}

/// Decode `charset'language'percent-encoded`.
fn decode_extended(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    let bytes: Vec<u8> = percent_decode_str(encoded).collect();
    decode_charset(charset, bytes)
}

fn decode_charset(charset: &str, bytes: Vec<u8>) -> Option<String> {
    if charset.eq_ignore_ascii_case("utf-8")
        || charset.eq_ignore_ascii_case("utf8")
        || charset.eq_ignore_ascii_case("us-ascii")
    {
        String::from_utf8(bytes).ok()
    } else if charset.eq_ignore_ascii_case("iso-8859-1") || charset.eq_ignore_ascii_case("latin1") {
        Some(bytes.into_iter().map(char::from).collect())
    } else {
        None
    }
}

/// Replace every RFC 2047 encoded word in `value` with its decoded text.
///
/// Whitespace between two adjacent encoded words is dropped. Words that fail
/// to decode are kept verbatim.
fn decode_encoded_words(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut pending_space = String::new();
    let mut last_was_word = false;

    while !rest.is_empty() {
        if let Some((decoded, consumed)) = encoded_word(rest) {
            if !last_was_word {
                out.push_str(&pending_space);
            }
            pending_space.clear();
            out.push_str(&decoded);
            rest = &rest[consumed..];
            last_was_word = true;
            continue;
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        rest = &rest[c.len_utf8()..];
        if c.is_whitespace() {
            pending_space.push(c);
        } else {
            out.push_str(&pending_space);
            pending_space.clear();
            out.push(c);
            last_was_word = false;
        }
    }
    out.push_str(&pending_space);
    out
}

/// Decode one `=?charset?Q|B?text?=` word at the start of `input`, returning
/// the text and the number of bytes consumed.
fn encoded_word(input: &str) -> Option<(String, usize)> {
    let body = input.strip_prefix("=?")?;
    let (charset, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let end = body.find("?=")?;
    let text = &body[..end];
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;

    // RFC 2231 language suffix: charset*lang.
    let charset = charset.split('*').next().unwrap_or(charset);
    let bytes = if encoding.eq_ignore_ascii_case("b") {
        B64.decode(text).ok()?
    } else if encoding.eq_ignore_ascii_case("q") {
        decode_q(text)?
    } else {
        return None;
    };
    Some((decode_charset(charset, bytes)?, consumed))
}

fn decode_q(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'_' => out.push(b' '),
            b'=' => {
                let hi = bytes.next()?;
                let lo = bytes.next()?;
                let pair = [hi, lo];
                let hex = std::str::from_utf8(&pair).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
            }
            b => out.push(b),
        }
    }
    Some(out)
}
