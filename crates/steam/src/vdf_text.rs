//! Reader for Steam's text KeyValues files such as `loginusers.vdf`.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::SteamError;
use crate::vdf::{Map, Value};

/// Maximum nesting depth accepted by the parser.
const MAX_DEPTH: usize = 64;

#[derive(Debug, PartialEq)]
enum Token {
    Str(String),
    Open,
    Close,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, msg: impl fmt::Display) -> SteamError {
        SteamError::MalformedDocument(format!("{msg} at line {}", self.line))
    }

    fn next_token(&mut self) -> Result<Option<Token>, SteamError> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }

            let Some(c) = rest.chars().next() else {
                return Ok(None);
            };
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '{' => {
                    self.bump();
                    return Ok(Some(Token::Open));
                }
                '}' => {
                    self.bump();
                    return Ok(Some(Token::Close));
                }
                '"' => {
                    self.bump();
                    return self.quoted().map(|s| Some(Token::Str(s)));
                }
                _ => {
                    let word = self.bare();
                    // Platform conditionals like `[$WIN32]` are not evaluated.
                    if word.starts_with('[') && word.ends_with(']') {
                        continue;
                    }
                    return Ok(Some(Token::Str(word)));
                }
            }
        }
    }

    fn quoted(&mut self) -> Result<String, SteamError> {
        let start_line = self.line;
        let mut s = String::new();
        while let Some(c) = self.bump() {
            match c {
                '"' => return Ok(s),
                '\\' => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some(other) => {
                        s.push('\\');
                        s.push(other);
                    }
                    None => break,
                },
                c => s.push(c),
            }
        }
        Err(SteamError::MalformedDocument(format!(
            "unterminated string starting at line {start_line}"
        )))
    }

    fn bare(&mut self) -> String {
        let len = self
            .rest()
            .find(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | '"'))
            .unwrap_or(self.rest().len());
        let word = self.rest()[..len].to_owned();
        self.pos += len;
        word
    }
}

/// Parses a text VDF document into a map of strings and nested maps.
pub fn parse_text_vdf(input: &str) -> Result<Map, SteamError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lexer = Lexer::new(input);
    parse_block(&mut lexer, 0)
}

/// Reads and parses a text VDF file.
pub fn load(path: &Path) -> Result<Map, SteamError> {
    let data = fs::read(path)
        .map_err(|e| SteamError::Io(format!("failed to read {}: {e}", path.display())))?;
    parse_text_vdf(&String::from_utf8_lossy(&data))
}

fn parse_block(lexer: &mut Lexer<'_>, depth: usize) -> Result<Map, SteamError> {
    let mut map = Map::new();

    loop {
        let key = match lexer.next_token()? {
            None if depth == 0 => return Ok(map),
            None => return Err(lexer.error("unexpected end of input, missing '}'")),
            Some(Token::Close) if depth > 0 => return Ok(map),
            Some(Token::Close) => return Err(lexer.error("unexpected '}'")),
            Some(Token::Open) => return Err(lexer.error("unexpected '{' where a key was expected")),
            Some(Token::Str(key)) => key,
        };

        let value = match lexer.next_token()? {
            Some(Token::Str(v)) => Value::String(v),
            Some(Token::Open) if depth < MAX_DEPTH => Value::Map(parse_block(lexer, depth + 1)?),
            Some(Token::Open) => return Err(lexer.error(format!("nesting deeper than {MAX_DEPTH}"))),
            _ => return Err(lexer.error(format!("missing value for key '{key}'"))),
        };

        map.insert(key, value);
    }
}
