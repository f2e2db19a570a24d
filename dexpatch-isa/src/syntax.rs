//! Line-level parser for the smali-style instruction syntax.
//!
//! ```text
//! :loop                                   # label definition
//! const-string v0, "search_query"
//! invoke-static {v1, $query}, Lapp/Ext;->f(Ljava/lang/String;)V
//! invoke-virtual/range {v0 .. v5}, Lapp/Cls;->g(IIIII)V
//! if-eqz v0, :loop
//! ```
//!
//! Registers are either concrete (`v3`) or placeholders (`$name`) that are
//! bound later by the instruction editor.

use crate::insn::Reg;
use crate::opcode::Opcode;

/// A register operand as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegToken {
    Reg(Reg),
    Placeholder(String),
}

/// One parsed operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Reg(RegToken),
    RegList(Vec<RegToken>),
    RegRange(RegToken, RegToken),
    Literal(i64),
    Str(String),
    Label(String),
    /// Type, field or method descriptor; interpreted by the opcode.
    Ref(String),
}

/// An instruction line before label and placeholder resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInsn {
    pub opcode: Opcode,
    pub args: Vec<Arg>,
}

/// One meaningful source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Label(String),
    Insn(ParsedInsn),
}

/// Errors from [`parse_line`]. Line numbers are attached by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("invalid label name `{0}`")]
    BadLabel(String),
    #[error("invalid register `{0}`")]
    BadRegister(String),
    #[error("invalid literal `{0}`")]
    BadLiteral(String),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape `\\{0}`")]
    BadEscape(char),
    #[error("unbalanced braces")]
    UnbalancedBraces,
    #[error("empty operand")]
    EmptyOperand,
}

/// Parse one line. Returns `Ok(None)` for blank and comment-only lines.
pub fn parse_line(line: &str) -> Result<Option<Statement>, SyntaxError> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(name) = line.strip_prefix(':') {
        return if is_ident(name) {
            Ok(Some(Statement::Label(name.to_string())))
        } else {
            Err(SyntaxError::BadLabel(name.to_string()))
        };
    }

    let (mnemonic, rest) = match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], line[i..].trim()),
        None => (line, ""),
    };
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| SyntaxError::UnknownOpcode(mnemonic.to_string()))?;

    let args = split_operands(rest)?
        .into_iter()
        .map(parse_arg)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Statement::Insn(ParsedInsn { opcode, args })))
}

/// Drop a trailing `# comment`, ignoring `#` inside string literals.
fn strip_comment(line: &str) -> &str {
    let mut in_str = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_str => escaped = true,
            '"' => in_str = !in_str,
            '#' if !in_str => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Split on top-level commas (outside quotes and braces).
fn split_operands(s: &str) -> Result<Vec<&str>, SyntaxError> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut in_str = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_str => escaped = true,
            '"' => in_str = !in_str,
            '{' if !in_str => depth += 1,
            '}' if !in_str => {
                depth -= 1;
                if depth < 0 {
                    return Err(SyntaxError::UnbalancedBraces);
                }
            }
            ',' if !in_str && depth == 0 => {
                out.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_str {
        return Err(SyntaxError::UnterminatedString);
    }
    if depth != 0 {
        return Err(SyntaxError::UnbalancedBraces);
    }
    out.push(s[start..].trim());
    if out.iter().any(|op| op.is_empty()) {
        return Err(SyntaxError::EmptyOperand);
    }
    Ok(out)
}

fn parse_arg(s: &str) -> Result<Arg, SyntaxError> {
    let first = s.chars().next().ok_or(SyntaxError::EmptyOperand)?;
    match first {
        '{' => s
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or(SyntaxError::UnbalancedBraces)
            .and_then(parse_reg_list),
        '"' => parse_string(s).map(Arg::Str),
        ':' => {
            let name = &s[1..];
            if is_ident(name) {
                Ok(Arg::Label(name.to_string()))
            } else {
                Err(SyntaxError::BadLabel(name.to_string()))
            }
        }
        '$' => parse_reg(s).map(Arg::Reg),
        'v' if s[1..].chars().next().is_some_and(|c| c.is_ascii_digit()) => {
            parse_reg(s).map(Arg::Reg)
        }
        '-' | '0'..='9' => parse_literal(s).map(Arg::Literal),
        _ => Ok(Arg::Ref(s.to_string())),
    }
}

fn parse_reg_list(inner: &str) -> Result<Arg, SyntaxError> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Ok(Arg::RegList(Vec::new()));
    }
    if let Some((lo, hi)) = inner.split_once("..") {
        return Ok(Arg::RegRange(parse_reg(lo.trim())?, parse_reg(hi.trim())?));
    }
    inner
        .split(',')
        .map(|r| parse_reg(r.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map(Arg::RegList)
}

fn parse_reg(s: &str) -> Result<RegToken, SyntaxError> {
    if let Some(name) = s.strip_prefix('$') {
        return if is_ident(name) {
            Ok(RegToken::Placeholder(name.to_string()))
        } else {
            Err(SyntaxError::BadRegister(s.to_string()))
        };
    }
    s.strip_prefix('v')
        .and_then(|n| n.parse::<u16>().ok())
        .map(|n| RegToken::Reg(Reg(n)))
        .ok_or_else(|| SyntaxError::BadRegister(s.to_string()))
}

/// Decimal or `0x` hex, optional leading `-`, optional `L`/`t`/`s` suffix.
pub fn parse_literal(s: &str) -> Result<i64, SyntaxError> {
    let bad = || SyntaxError::BadLiteral(s.to_string());
    let body = s.trim_end_matches(['L', 'l', 't', 's']);
    let (neg, digits) = match body.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, body),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| bad())?,
        None => digits.parse::<u64>().map_err(|_| bad())?,
    };
    if neg {
        0i64.checked_sub_unsigned(magnitude).ok_or_else(bad)
    } else {
        // Unsigned hex above i64::MAX wraps, matching how wide constants are
        // usually written.
        Ok(magnitude as i64)
    }
}

fn parse_string(s: &str) -> Result<String, SyntaxError> {
    let inner = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(SyntaxError::UnterminatedString)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next().ok_or(SyntaxError::UnterminatedString)? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let ch = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(SyntaxError::BadEscape('u'))?;
                out.push(ch);
            }
            other => return Err(SyntaxError::BadEscape(other)),
        }
    }
    Ok(out)
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
