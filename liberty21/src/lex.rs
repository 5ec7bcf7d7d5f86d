//!
//! # Liberty Lexing Module
//!
//! Comment removal and tokenization.
//! Produces a [TokenStream]: an immutable arena of [Token]s over the comment-free source,
//! plus the matching-bracket table used by the extractors to bound each group.
//!

// Std-Lib
use std::str::Chars;

// Crates.io Imports
use serde::{Deserialize, Serialize};

// Local Imports
use crate::error::{LibResult, LibertyError};

/// Remove comments from `src`.
///
/// Block comments `/* ... */` and line comments `// ...` are overwritten with spaces,
/// keeping every newline, so that byte offsets and line numbers into the result
/// equal those of the original text. Comment markers inside quoted strings are left alone.
pub fn uncomment(src: &str) -> LibResult<String> {
    #[derive(PartialEq)]
    enum State {
        Code,
        Quoted,
        Block,
        Line,
    }
    let bytes = src.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    let (mut line, mut block_start, mut block_line) = (1, 0, 1);
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match (b, next) {
                (b'/', Some(b'*')) => {
                    state = State::Block;
                    block_start = i;
                    block_line = line;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'/', Some(b'/')) => {
                    state = State::Line;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'"', _) => {
                    state = State::Quoted;
                    out.push(b);
                }
                _ => out.push(b),
            },
            State::Quoted => match b {
                b'\\' if next.is_some() => {
                    // Escaped character, including the closing quote
                    out.push(b);
                    out.push(bytes[i + 1]);
                    if next == Some(b'\n') {
                        line += 1;
                    }
                    i += 2;
                    continue;
                }
                b'"' => {
                    state = State::Code;
                    out.push(b);
                }
                _ => out.push(b),
            },
            State::Block => match (b, next) {
                (b'*', Some(b'/')) => {
                    state = State::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'\n', _) => out.push(b'\n'),
                _ => out.push(b' '),
            },
            State::Line => match b {
                b'\n' => {
                    state = State::Code;
                    out.push(b'\n');
                }
                _ => out.push(b' '),
            },
        }
        if b == b'\n' {
            line += 1;
        }
        i += 1;
    }
    if state == State::Block {
        return Err(LibertyError::Lex {
            msg: "Unterminated block comment".into(),
            line: block_line,
            pos: block_start,
        });
    }
    // Only whole characters, or ASCII comment bytes, have been replaced by ASCII spaces
    String::from_utf8(out).map_err(|e| LibertyError::Boxed(Box::new(e)))
}

/// Remove comments from and tokenize `src`
pub fn lex(src: &str) -> LibResult<TokenStream> {
    let text = uncomment(src)?;
    let tokens = LibLexer::new(&text).lex_all()?;
    TokenStream::new(text, tokens)
}

/// # Liberty Lexer / Tokenizer
///
/// Breaks comment-free input string `self.src` into [Token]s,
/// consisting of source-locations and type-annotations.
///
/// Positions are byte offsets, so that token text is a direct slice of the source.
///
pub struct LibLexer<'src> {
    /// Source-string character iterator
    chars: Chars<'src>,
    /// Peekable next character
    next_char: Option<char>,
    /// Start position of the Token in progress
    start: usize,
    /// Active byte index
    pos: usize,
    /// Active line number
    line: usize,
    /// Line number at the start of the Token in progress
    start_line: usize,
}
impl<'src> LibLexer<'src> {
    pub(crate) fn new(src: &'src str) -> Self {
        let mut chars = src.chars();
        let next_char = chars.next();
        Self {
            chars,
            next_char,
            start: 0,
            pos: 0,
            line: 1,
            start_line: 1,
        }
    }
    /// Lex the entirety of the input
    pub fn lex_all(mut self) -> LibResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token()? {
            tokens.push(tok);
        }
        Ok(tokens)
    }
    /// Get and return our next character, updating our position along the way
    fn next_char(&mut self) -> Option<char> {
        let rv = self.next_char?;
        self.pos += rv.len_utf8();
        if rv == '\n' {
            self.line += 1;
        }
        self.next_char = self.chars.next();
        Some(rv)
    }
    /// Peek at our next character, without advancing.
    fn peek_char(&self) -> Option<char> {
        self.next_char
    }
    /// Peek at the character after next
    fn peek_char2(&self) -> Option<char> {
        self.chars.clone().next()
    }
    /// Pull our next [Token], skipping whitespace and line continuations
    fn next_token(&mut self) -> LibResult<Option<Token>> {
        loop {
            self.start = self.pos;
            self.start_line = self.line;
            let c = match self.peek_char() {
                None => return Ok(None),
                Some(c) => c,
            };
            if c.is_whitespace() {
                self.next_char();
                continue;
            }
            if c == '\\' && self.at_continuation() {
                self.skip_continuation();
                continue;
            }
            return self.lex_one().map(Some);
        }
    }
    /// Boolean indication of a backslash-newline line continuation at our position
    fn at_continuation(&self) -> bool {
        let mut chars = self.chars.clone();
        loop {
            match chars.next() {
                Some('\n') => return true,
                Some(' ') | Some('\t') | Some('\r') => continue,
                _ => return false,
            }
        }
    }
    /// Skip over a line continuation: backslash, trailing blanks, and the newline
    fn skip_continuation(&mut self) {
        self.next_char(); // The backslash
        while let Some(c) = self.next_char() {
            if c == '\n' {
                break;
            }
        }
    }
    /// Emit a [Token] of [TokenType] `ttype`
    fn emit(&mut self, ttype: TokenType) -> Token {
        let loc = SourceLocation {
            start: self.start,
            stop: self.pos,
            line: self.start_line,
        };
        Token { loc, ttype }
    }
    /// Accept a character if it meets predicate-function `f`
    fn accept(&mut self, f: impl Fn(char) -> bool) -> bool {
        match self.peek_char() {
            Some(ch) if f(ch) => {
                self.next_char();
                true
            }
            _ => false,
        }
    }
    /// Lex the next [Token]
    fn lex_one(&mut self) -> LibResult<Token> {
        if let Some(ttype) = self.peek_char().and_then(TokenType::punct) {
            self.next_char();
            return Ok(self.emit(ttype));
        }
        if self.accept(|c| c == '"') {
            return self.lex_string_literal();
        }
        self.lex_word()
    }
    /// Lex a quoted string literal.
    /// Backslash escapes the following character, including newlines and quotes.
    fn lex_string_literal(&mut self) -> LibResult<Token> {
        loop {
            match self.next_char() {
                None => return self.fail("Unterminated string literal"),
                Some('"') => break,
                Some('\\') => {
                    if self.next_char().is_none() {
                        return self.fail("Unterminated string literal");
                    }
                }
                Some(_) => continue,
            }
        }
        Ok(self.emit(TokenType::Str))
    }
    /// Lex a bare word: names, numbers, keywords, and unquoted expressions
    fn lex_word(&mut self) -> LibResult<Token> {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '"' || TokenType::punct(c).is_some() {
                break;
            }
            if c == '\\' && self.peek_char2().map_or(false, |c2| c2 == '\n' || c2 == '\r') {
                break;
            }
            self.next_char();
        }
        Ok(self.emit(TokenType::Word))
    }
    /// Error-Generation Helper
    /// Reports the start of the Token in progress
    fn fail<T>(&self, msg: &str) -> LibResult<T> {
        Err(LibertyError::Lex {
            msg: msg.into(),
            line: self.start_line,
            pos: self.start,
        })
    }
}

/// Location of a [Token] in the source string
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Start byte index (inclusive)
    pub start: usize,
    /// End byte index (exclusive)
    pub stop: usize,
    /// Line number
    pub line: usize,
}
/// Lexer Token
/// Provides indices into the source-string for the start and end of the source text,
/// as well as the line number and type-tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Source Location
    pub loc: SourceLocation,
    /// Token Type
    pub ttype: TokenType,
}
impl Token {
    /// Return a sub-string of input-string `src` over our locations
    pub fn substr<'src>(&self, src: &'src str) -> &'src str {
        &src[self.loc.start..self.loc.stop]
    }
    /// Return our text content. String literals are stripped of their quotes.
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        let s = self.substr(src);
        match self.ttype {
            TokenType::Str if s.len() >= 2 => &s[1..s.len() - 1],
            _ => s,
        }
    }
}
/// Token Types Enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    /// Bare word: names, keywords, numbers
    Word,
    /// Quoted string literal
    Str,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Colon,
    SemiColon,
    Comma,
}
impl TokenType {
    /// The single-character punctuation type for `c`, if any
    fn punct(c: char) -> Option<Self> {
        match c {
            '(' => Some(Self::LParen),
            ')' => Some(Self::RParen),
            '{' => Some(Self::LBrace),
            '}' => Some(Self::RBrace),
            ':' => Some(Self::Colon),
            ';' => Some(Self::SemiColon),
            ',' => Some(Self::Comma),
            _ => None,
        }
    }
    /// Boolean indication of a word-like (value-carrying) token
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Word | Self::Str)
    }
}

/// Position in a [TokenStream]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(pub usize);
impl Cursor {
    /// The [Cursor] `n` tokens ahead
    #[inline(always)]
    pub fn ahead(self, n: usize) -> Self {
        Self(self.0 + n)
    }
}

/// # Token Stream
///
/// Immutable token arena over comment-free source text.
/// Brackets are paired on construction; unbalanced input fails here, before any extraction.
#[derive(Debug, Clone)]
pub struct TokenStream {
    /// Comment-free source
    src: String,
    /// Tokens
    tokens: Vec<Token>,
    /// For each opening or closing bracket, the index of its partner
    partners: Vec<Option<usize>>,
}
impl TokenStream {
    fn new(src: String, tokens: Vec<Token>) -> LibResult<Self> {
        let mut partners = vec![None; tokens.len()];
        let mut stack: Vec<usize> = Vec::new();
        for (idx, tok) in tokens.iter().enumerate() {
            match tok.ttype {
                TokenType::LParen | TokenType::LBrace => stack.push(idx),
                TokenType::RParen | TokenType::RBrace => {
                    let want = match tok.ttype {
                        TokenType::RParen => TokenType::LParen,
                        _ => TokenType::LBrace,
                    };
                    match stack.pop() {
                        Some(open) if tokens[open].ttype == want => {
                            partners[open] = Some(idx);
                            partners[idx] = Some(open);
                        }
                        _ => return Self::unbalanced(tok, "Unmatched closing bracket"),
                    }
                }
                _ => (),
            }
        }
        if let Some(open) = stack.pop() {
            return Self::unbalanced(&tokens[open], "Unclosed bracket");
        }
        Ok(Self {
            src,
            tokens,
            partners,
        })
    }
    fn unbalanced<T>(tok: &Token, msg: &str) -> LibResult<T> {
        Err(LibertyError::Lex {
            msg: msg.into(),
            line: tok.loc.line,
            pos: tok.loc.start,
        })
    }
    /// Comment-free source text
    pub fn src(&self) -> &str {
        &self.src
    }
    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
    /// Boolean indication of an empty stream
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
    /// Cursor past the final token
    pub fn end(&self) -> Cursor {
        Cursor(self.tokens.len())
    }
    /// Get the [Token] at `at`, if in range
    pub fn get(&self, at: Cursor) -> Option<&Token> {
        self.tokens.get(at.0)
    }
    /// Get the text of the [Token] at `at`
    pub fn text(&self, at: Cursor) -> Option<&str> {
        self.get(at).map(|t| t.text(&self.src))
    }
    /// Get the matching bracket of the bracket at `at`
    pub fn partner(&self, at: Cursor) -> Option<Cursor> {
        self.partners.get(at.0).copied().flatten().map(Cursor)
    }
    /// Iterate over all [Token]s
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }
    /// Text of the source line containing byte offset `pos`
    pub(crate) fn line_at(&self, pos: usize) -> &str {
        let pos = pos.min(self.src.len());
        let start = self.src[..pos].rfind('\n').map_or(0, |i| i + 1);
        let stop = self.src[pos..].find('\n').map_or(self.src.len(), |i| pos + i);
        &self.src[start..stop]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(src: &str) -> LibResult<Vec<TokenType>> {
        let ts = lex(src)?;
        Ok(ts.tokens().map(|t| t.ttype).collect())
    }

    #[test]
    fn it_lexes() -> LibResult<()> {
        use TokenType::*;
        let src = "cell (INV_X1) { area : 0.532 ; }";
        assert_eq!(
            types(src)?,
            vec![Word, LParen, Word, RParen, LBrace, Word, Colon, Word, SemiColon, RBrace]
        );
        let ts = lex(src)?;
        assert_eq!(ts.text(Cursor(2)), Some("INV_X1"));
        assert_eq!(ts.text(Cursor(7)), Some("0.532"));
        assert_eq!(ts.partner(Cursor(4)), Some(Cursor(9)));
        assert_eq!(ts.partner(Cursor(9)), Some(Cursor(4)));
        assert_eq!(ts.partner(Cursor(1)), Some(Cursor(3)));
        Ok(())
    }
    #[test]
    fn it_lexes_strings() -> LibResult<()> {
        let src = "values (\"1, 2, 3\", \\\n  \"4, 5, 6\");";
        let ts = lex(src)?;
        let strs: Vec<_> = ts
            .tokens()
            .filter(|t| t.ttype == TokenType::Str)
            .map(|t| t.text(ts.src()))
            .collect();
        assert_eq!(strs, vec!["1, 2, 3", "4, 5, 6"]);
        let last = ts.get(Cursor(ts.len() - 1)).unwrap();
        assert_eq!(last.ttype, TokenType::SemiColon);
        assert_eq!(last.loc.line, 2);
        Ok(())
    }
    #[test]
    fn it_uncomments() -> LibResult<()> {
        let src = "a /* one\ntwo */ b // three\nc \"/* kept */\"";
        let out = uncomment(src)?;
        assert_eq!(out.len(), src.len());
        assert_eq!(out.lines().count(), src.lines().count());
        assert!(!out.contains("one"));
        assert!(!out.contains("three"));
        assert!(out.contains("\"/* kept */\""));
        let ts = lex(src)?;
        let words: Vec<_> = ts.tokens().map(|t| t.text(ts.src())).collect();
        assert_eq!(words, vec!["a", "b", "c", "/* kept */"]);
        // Offsets and lines refer to the original text
        let b = ts.get(Cursor(1)).unwrap();
        assert_eq!(&src[b.loc.start..b.loc.stop], "b");
        assert_eq!(b.loc.line, 2);
        Ok(())
    }
    #[test]
    fn it_keeps_utf8_offsets() -> LibResult<()> {
        let src = "/* résumé */ pin (Ω) ;";
        let ts = lex(src)?;
        let omega = ts.get(Cursor(2)).unwrap();
        assert_eq!(omega.substr(src), "Ω");
        Ok(())
    }
    #[test]
    fn it_fails_unterminated_comment() {
        let src = "library (x) {\n /* never closed \n }";
        let e = lex(src).unwrap_err();
        assert_eq!(e.kind(), crate::ErrorKind::MalformedFile);
        assert_eq!(e.pos(), Some(15));
        assert_eq!(e.line(), Some(2));
    }
    #[test]
    fn it_fails_unterminated_string() {
        let src = "library (x) {\n  comment : \"oops ; \n}";
        let e = lex(src).unwrap_err();
        assert_eq!(e.kind(), crate::ErrorKind::MalformedFile);
        assert_eq!(e.pos(), Some(src.find('"').unwrap()));
    }
    #[test]
    fn it_fails_unbalanced() {
        for src in ["library (x) {", "library (x) }", "cell (a { }", "cell (a) { ) }"] {
            let e = lex(src).unwrap_err();
            assert_eq!(e.kind(), crate::ErrorKind::MalformedFile, "{}", src);
        }
    }
}
