//! Lexical helpers for assembly source.
//!
//! Token-level parsers are `nom` combinators; line-level splitting works on
//! plain string slices because assembly is rigidly line-oriented.

use std::borrow::Cow;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{map_res, opt, recognize},
    sequence::{pair, preceded},
    IResult,
};
use riscv32_isa::Gpr;

use crate::error::AsmError;

/// Parse a register name (ABI or numeric).
pub fn register(input: &str) -> IResult<&str, Gpr> {
    map_res(
        take_while1(|c: char| c.is_ascii_alphanumeric()),
        |s: &str| Gpr::from_name(s).ok_or(()),
    )(input)
}

/// Parse an integer literal: decimal, negative decimal, or `0x`/`-0x` hex.
///
/// Hex is tried first so `0x10` is not consumed as the decimal `0`
/// followed by junk. Values wrap into `i32` like the 32-bit machine they
/// describe.
pub fn int_literal(input: &str) -> IResult<&str, i32> {
    alt((
        map_res(
            recognize(pair(
                opt(char('-')),
                preceded(tag("0x"), take_while1(|c: char| c.is_ascii_hexdigit())),
            )),
            |s: &str| {
                let (negative, digits) = match s.strip_prefix('-') {
                    Some(rest) => (true, &rest[2..]),
                    None => (false, &s[2..]),
                };
                u32::from_str_radix(digits, 16)
                    .map(|v| if negative { (v as i32).wrapping_neg() } else { v as i32 })
            },
        ),
        map_res(
            recognize(pair(
                opt(char('-')),
                take_while1(|c: char| c.is_ascii_digit()),
            )),
            |s: &str| s.parse::<i64>().map(|v| v as i32),
        ),
    ))(input)
}

/// Parse an identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        opt(take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')),
    ))(input)
}

/// Whether a whole token is a valid identifier.
pub fn is_identifier(token: &str) -> bool {
    matches!(identifier(token), Ok(("", _)))
}

/// Interpret a token as a register, accepting non-alphanumeric trailing
/// characters (`,`, `)`) as terminators.
pub fn reg_from_token(token: &str) -> Option<Gpr> {
    register(token).ok().map(|(_, reg)| reg)
}

/// Interpret a token as an integer literal, if it looks like one.
///
/// Leading digit, sign-then-digit, and `0x` forms qualify; anything else
/// (a label reference) yields `None`. Trailing junk after the numeric
/// prefix is ignored.
pub fn literal_from_token(token: &str) -> Option<i32> {
    let mut bytes = token.bytes();
    let looks_numeric = match bytes.next() {
        Some(b'-') => matches!(bytes.next(), Some(b) if b.is_ascii_digit()),
        Some(b) => b.is_ascii_digit(),
        None => false,
    };
    if !looks_numeric {
        return None;
    }
    int_literal(token).ok().map(|(_, value)| value)
}

/// Strip a `#` comment, ignoring `#` inside a double-quoted string.
pub fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        match c {
            '\\' if in_string => escaped = !escaped,
            '"' if !escaped => in_string = !in_string,
            '#' if !in_string => return &line[..idx],
            _ => escaped = false,
        }
    }
    line
}

/// Decode a C-style escaped string. `input` starts just after the opening
/// quote; decoding stops at the closing quote.
///
/// Supported escapes: `\n \t \r \\ \"`. An unknown escape or a missing
/// closing quote is a fatal error.
pub fn decode_string(input: &str) -> Result<Vec<u8>, AsmError> {
    let mut bytes = Vec::new();
    let mut chars = input.chars();

    loop {
        match chars.next() {
            None => return Err(AsmError::UnterminatedString),
            Some('"') => return Ok(bytes),
            Some('\\') => {
                let escape = chars.next().ok_or(AsmError::UnterminatedString)?;
                let byte = match escape {
                    'n' => b'\n',
                    't' => b'\t',
                    'r' => b'\r',
                    '\\' => b'\\',
                    '"' => b'"',
                    other => return Err(AsmError::UnknownEscape(other)),
                };
                bytes.push(byte);
            }
            Some(c) => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}

/// Recognize a section switch: `.section NAME[, flags…]` or one of the
/// short forms `.text`/`.data`/`.rodata`/`.bss`. Returns the section name.
pub fn section_directive(line: &str) -> Option<&str> {
    let (keyword, rest) = split_keyword(line);
    match keyword {
        ".section" => {
            let name = rest
                .split(|c: char| c.is_ascii_whitespace() || c == ',')
                .next()
                .unwrap_or("");
            (!name.is_empty()).then_some(name)
        }
        ".text" | ".data" | ".rodata" | ".bss" if rest.is_empty() => Some(keyword),
        _ => None,
    }
}

/// Recognize a label definition: an identifier followed by `:`. Returns
/// the label name and the remainder of the line after the colon.
pub fn label_definition(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let name = line[..colon].trim();
    is_identifier(name).then(|| (name, &line[colon + 1..]))
}

/// Split a directive or instruction line into its leading keyword and the
/// remainder.
pub fn split_keyword(line: &str) -> (&str, &str) {
    match line.find(|c: char| c.is_ascii_whitespace()) {
        Some(idx) => (&line[..idx], line[idx..].trim_start()),
        None => (line, ""),
    }
}

/// Split an instruction line into its mnemonic and up to three
/// comma-separated operands, with surrounding whitespace and trailing
/// commas trimmed.
pub fn split_operands(line: &str) -> (&str, Vec<&str>) {
    let (mnemonic, rest) = split_keyword(line);
    if rest.is_empty() {
        return (mnemonic, Vec::new());
    }
    let operands = rest
        .split(',')
        .map(|arg| arg.trim().trim_end_matches(','))
        .filter(|arg| !arg.is_empty())
        .collect();
    (mnemonic, operands)
}

/// Split a comma-separated directive value list into tokens.
pub fn split_values(rest: &str) -> Vec<&str> {
    rest.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// Normalize `offset(reg)` addressing to the flat comma form, so
/// `lw a0, 8(sp)` parses with the same comma splitter as every other
/// instruction (it becomes `lw a0, 8, sp`).
pub fn normalize_mem_operand(line: &str) -> Cow<'_, str> {
    let Some(open) = line.find('(') else {
        return Cow::Borrowed(line);
    };
    let Some(close_rel) = line[open..].find(')') else {
        return Cow::Borrowed(line);
    };
    let close = open + close_rel;

    let mut offset_start = open;
    while offset_start > 0 {
        let prev = line.as_bytes()[offset_start - 1];
        if prev.is_ascii_whitespace() || prev == b',' {
            break;
        }
        offset_start -= 1;
    }

    let prefix = &line[..offset_start];
    let offset = &line[offset_start..open];
    let reg = &line[open + 1..close];
    let suffix = &line[close + 1..];
    Cow::Owned(format!("{prefix}{offset}, {reg}{suffix}"))
}
