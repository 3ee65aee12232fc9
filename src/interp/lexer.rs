//! Tokenizer with significant indentation.
//!
//! Indentation is tracked with a stack; INDENT/DEDENT tokens bracket blocks
//! the way the parser expects. Newlines inside brackets are suppressed so
//! expressions may span physical lines.

use crate::interp::Fault;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    // keywords
    Def,
    Return,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Import,
    Pass,
    Break,
    Continue,
    And,
    Or,
    Not,
    True,
    False,
    None,
    // punctuation
    Assign,
    PlusAssign,
    MinusAssign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    // structure
    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: u32,
}

fn keyword(word: &str) -> Option<Tok> {
    Some(match word {
        "def" => Tok::Def,
        "return" => Tok::Return,
        "if" => Tok::If,
        "elif" => Tok::Elif,
        "else" => Tok::Else,
        "while" => Tok::While,
        "for" => Tok::For,
        "in" => Tok::In,
        "import" => Tok::Import,
        "pass" => Tok::Pass,
        "break" => Tok::Break,
        "continue" => Tok::Continue,
        "and" => Tok::And,
        "or" => Tok::Or,
        "not" => Tok::Not,
        "True" => Tok::True,
        "False" => Tok::False,
        "None" => Tok::None,
        _ => return None,
    })
}

/// Tokenize a source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Fault> {
    let mut tokens = Vec::new();
    let mut indents: Vec<usize> = vec![0];
    let mut bracket_depth: usize = 0;
    let mut line_no: u32 = 0;

    for raw_line in source.lines() {
        line_no += 1;

        // Inside brackets the physical line is a continuation: no
        // indentation handling and no NEWLINE at its end.
        let continuation = bracket_depth > 0;

        let mut chars = raw_line.chars().peekable();
        let mut col = 0usize;

        if !continuation {
            let mut indent = 0usize;
            while let Some(&c) = chars.peek() {
                match c {
                    ' ' => indent += 1,
                    '\t' => indent += 4,
                    _ => break,
                }
                chars.next();
                col += 1;
            }
            // Blank and comment-only lines do not affect indentation.
            match chars.peek() {
                Option::None | Some('#') => continue,
                _ => {}
            }
            let current = *indents.last().unwrap_or(&0);
            if indent > current {
                indents.push(indent);
                tokens.push(Token {
                    tok: Tok::Indent,
                    line: line_no,
                });
            } else if indent < current {
                while indents.len() > 1 && *indents.last().unwrap() > indent {
                    indents.pop();
                    tokens.push(Token {
                        tok: Tok::Dedent,
                        line: line_no,
                    });
                }
                if *indents.last().unwrap() != indent {
                    return Err(Fault::syntax(
                        line_no,
                        "unindent does not match any outer indentation level",
                    ));
                }
            }
        }

        let mut emitted = false;
        while let Some(c) = chars.next() {
            col += 1;
            match c {
                ' ' | '\t' => continue,
                '#' => break,
                '(' => {
                    bracket_depth += 1;
                    tokens.push(Token { tok: Tok::LParen, line: line_no });
                }
                ')' => {
                    bracket_depth = bracket_depth.saturating_sub(1);
                    tokens.push(Token { tok: Tok::RParen, line: line_no });
                }
                '[' => {
                    bracket_depth += 1;
                    tokens.push(Token { tok: Tok::LBracket, line: line_no });
                }
                ']' => {
                    bracket_depth = bracket_depth.saturating_sub(1);
                    tokens.push(Token { tok: Tok::RBracket, line: line_no });
                }
                '{' => {
                    bracket_depth += 1;
                    tokens.push(Token { tok: Tok::LBrace, line: line_no });
                }
                '}' => {
                    bracket_depth = bracket_depth.saturating_sub(1);
                    tokens.push(Token { tok: Tok::RBrace, line: line_no });
                }
                ',' => tokens.push(Token { tok: Tok::Comma, line: line_no }),
                ':' => tokens.push(Token { tok: Tok::Colon, line: line_no }),
                '+' => {
                    let tok = if chars.peek() == Some(&'=') {
                        chars.next();
                        Tok::PlusAssign
                    } else {
                        Tok::Plus
                    };
                    tokens.push(Token { tok, line: line_no });
                }
                '-' => {
                    let tok = if chars.peek() == Some(&'=') {
                        chars.next();
                        Tok::MinusAssign
                    } else {
                        Tok::Minus
                    };
                    tokens.push(Token { tok, line: line_no });
                }
                '*' => tokens.push(Token { tok: Tok::Star, line: line_no }),
                '%' => tokens.push(Token { tok: Tok::Percent, line: line_no }),
                '/' => {
                    let tok = if chars.peek() == Some(&'/') {
                        chars.next();
                        Tok::SlashSlash
                    } else {
                        Tok::Slash
                    };
                    tokens.push(Token { tok, line: line_no });
                }
                '=' => {
                    let tok = if chars.peek() == Some(&'=') {
                        chars.next();
                        Tok::Eq
                    } else {
                        Tok::Assign
                    };
                    tokens.push(Token { tok, line: line_no });
                }
                '!' => {
                    if chars.peek() == Some(&'=') {
                        chars.next();
                        tokens.push(Token { tok: Tok::Ne, line: line_no });
                    } else {
                        return Err(Fault::syntax(line_no, "unexpected character '!'"));
                    }
                }
                '<' => {
                    let tok = if chars.peek() == Some(&'=') {
                        chars.next();
                        Tok::Le
                    } else {
                        Tok::Lt
                    };
                    tokens.push(Token { tok, line: line_no });
                }
                '>' => {
                    let tok = if chars.peek() == Some(&'=') {
                        chars.next();
                        Tok::Ge
                    } else {
                        Tok::Gt
                    };
                    tokens.push(Token { tok, line: line_no });
                }
                '\'' | '"' => {
                    let text = lex_string(&mut chars, c, line_no)?;
                    tokens.push(Token {
                        tok: Tok::Str(text),
                        line: line_no,
                    });
                }
                c if c.is_ascii_digit() => {
                    let tok = lex_number(c, &mut chars, line_no)?;
                    tokens.push(Token { tok, line: line_no });
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut word = String::new();
                    word.push(c);
                    while let Some(&n) = chars.peek() {
                        if n.is_ascii_alphanumeric() || n == '_' {
                            word.push(n);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let tok = keyword(&word).unwrap_or(Tok::Name(word));
                    tokens.push(Token { tok, line: line_no });
                }
                other => {
                    return Err(Fault::syntax(
                        line_no,
                        format!("unexpected character '{}' (column {})", other, col),
                    ));
                }
            }
            emitted = true;
        }

        if emitted && bracket_depth == 0 {
            tokens.push(Token {
                tok: Tok::Newline,
                line: line_no,
            });
        }
    }

    if bracket_depth > 0 {
        return Err(Fault::syntax(line_no.max(1), "unexpected end of input inside brackets"));
    }
    while indents.len() > 1 {
        indents.pop();
        tokens.push(Token {
            tok: Tok::Dedent,
            line: line_no.max(1),
        });
    }
    tokens.push(Token {
        tok: Tok::Eof,
        line: line_no.max(1),
    });
    Ok(tokens)
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
    line: u32,
) -> Result<String, Fault> {
    let mut out = String::new();
    loop {
        let Some(c) = chars.next() else {
            return Err(Fault::syntax(line, "unterminated string literal"));
        };
        if c == quote {
            return Ok(out);
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(Fault::syntax(line, "unterminated string literal"));
        };
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'x' => {
                let hex: String = take_hex(chars, 2);
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) if hex.len() == 2 => out.push(ch),
                    _ => return Err(Fault::syntax(line, "invalid \\x escape in string literal")),
                }
            }
            'u' => {
                let hex: String = take_hex(chars, 4);
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) if hex.len() == 4 => out.push(ch),
                    _ => return Err(Fault::syntax(line, "invalid \\u escape in string literal")),
                }
            }
            other => {
                // Unknown escapes are kept verbatim.
                out.push('\\');
                out.push(other);
            }
        }
    }
}

fn take_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, n: usize) -> String {
    let mut hex = String::new();
    for _ in 0..n {
        match chars.peek() {
            Some(&c) if c.is_ascii_hexdigit() => {
                hex.push(c);
                chars.next();
            }
            _ => break,
        }
    }
    hex
}

fn lex_number(
    first: char,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: u32,
) -> Result<Tok, Fault> {
    let mut text = String::new();
    text.push(first);
    let mut is_float = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            chars.next();
        } else if c == '.' && !is_float {
            // Only a digit after the dot makes this a float literal.
            let mut lookahead = chars.clone();
            lookahead.next();
            match lookahead.peek() {
                Some(d) if d.is_ascii_digit() => {
                    is_float = true;
                    text.push('.');
                    chars.next();
                }
                _ => break,
            }
        } else {
            break;
        }
    }
    if is_float {
        text.parse::<f64>()
            .map(Tok::Float)
            .map_err(|_| Fault::syntax(line, format!("invalid number literal '{}'", text)))
    } else {
        text.parse::<i64>()
            .map(Tok::Int)
            .map_err(|_| Fault::syntax(line, format!("integer literal out of range '{}'", text)))
    }
}
