use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// All lexemes of the call-DAG source format.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Lexeme {
    // Keywords
    Let,
    True,
    False,
    None,

    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),

    // Symbols
    Eq,       // =
    Comma,    // ,
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]

    /// End of a statement. Not produced inside brackets.
    Newline,
    Eof,
}

impl Lexeme {
    pub(crate) fn describe(&self) -> String {
        let fixed = match self {
            Lexeme::Ident(name) => return format!("identifier '{}'", name),
            Lexeme::Int(n) => return format!("integer {}", n),
            Lexeme::Float(x) => return format!("float {:?}", x),
            Lexeme::Let => "'let'",
            Lexeme::True => "'true'",
            Lexeme::False => "'false'",
            Lexeme::None => "'none'",
            Lexeme::Str(_) => "string literal",
            Lexeme::Eq => "'='",
            Lexeme::Comma => "','",
            Lexeme::LParen => "'('",
            Lexeme::RParen => "')'",
            Lexeme::LBracket => "'['",
            Lexeme::RBracket => "']'",
            Lexeme::Newline => "end of line",
            Lexeme::Eof => "end of file",
        };
        fixed.to_string()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Token {
    pub(crate) lexeme: Lexeme,
    pub(crate) span: Span,
}

/// Byte-level scanner. `depth` counts open brackets; newlines inside them
/// are not statement ends.
pub(crate) struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.lexeme == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn span(&self, start: usize) -> Span {
        Span::new(start, self.pos)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn next_token(&mut self) -> Token {
        loop {
            self.skip_blanks();
            let start = self.pos;
            let Some(c) = self.peek() else {
                return Token {
                    lexeme: Lexeme::Eof,
                    span: self.span(start),
                };
            };

            let lexeme = match c {
                b'\n' => {
                    self.pos += 1;
                    if self.depth > 0 {
                        continue;
                    }
                    Lexeme::Newline
                }
                b'=' => self.single(Lexeme::Eq),
                b',' => self.single(Lexeme::Comma),
                b'(' => {
                    self.depth += 1;
                    self.single(Lexeme::LParen)
                }
                b')' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.single(Lexeme::RParen)
                }
                b'[' => {
                    self.depth += 1;
                    self.single(Lexeme::LBracket)
                }
                b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.single(Lexeme::RBracket)
                }
                b'"' => match self.string() {
                    Some(s) => Lexeme::Str(s),
                    None => continue,
                },
                b'-' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    match self.number() {
                        Some(lexeme) => lexeme,
                        None => continue,
                    }
                }
                c if c.is_ascii_digit() => match self.number() {
                    Some(lexeme) => lexeme,
                    None => continue,
                },
                c if c.is_ascii_alphabetic() || c == b'_' => self.word(),
                _ => {
                    let ch = self.current_char();
                    self.pos += ch.len_utf8();
                    self.diagnostics.push(Diagnostic::error(
                        format!("unexpected character '{}'", ch),
                        self.span(start),
                    ));
                    continue;
                }
            };
            return Token {
                lexeme,
                span: self.span(start),
            };
        }
    }

    fn current_char(&self) -> char {
        std::str::from_utf8(&self.source[self.pos..])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or('\u{FFFD}')
    }

    fn single(&mut self, lexeme: Lexeme) -> Lexeme {
        self.pos += 1;
        lexeme
    }

    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'#' => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn word(&mut self) -> Lexeme {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]);
        match text.as_ref() {
            "let" => {
                // `let` only starts a statement, so any bracket still open
                // was left unclosed.
                self.depth = 0;
                Lexeme::Let
            }
            "true" => Lexeme::True,
            "false" => Lexeme::False,
            "none" => Lexeme::None,
            _ => Lexeme::Ident(text.into_owned()),
        }
    }

    fn number(&mut self) -> Option<Lexeme> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let is_float =
            self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]);
        let parsed = if is_float {
            text.parse::<f64>().ok().map(Lexeme::Float)
        } else {
            text.parse::<i64>().ok().map(Lexeme::Int)
        };
        if parsed.is_none() {
            self.diagnostics.push(
                Diagnostic::error(
                    format!("number '{}' is out of range", text),
                    self.span(start),
                )
                .with_note("integers are 64-bit signed"),
            );
        }
        parsed
    }

    fn string(&mut self) -> Option<String> {
        let start = self.pos;
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    self.diagnostics.push(Diagnostic::error(
                        "unterminated string literal",
                        self.span(start),
                    ));
                    return None;
                }
                Some(b'"') => {
                    self.pos += 1;
                    return Some(String::from_utf8_lossy(&out).into_owned());
                }
                Some(b'\\') => {
                    let escaped = match self.peek_at(1) {
                        Some(b'n') => b'\n',
                        Some(b't') => b'\t',
                        Some(b'"') => b'"',
                        Some(b'\\') => b'\\',
                        _ => {
                            self.pos += 1;
                            self.diagnostics.push(
                                Diagnostic::error(
                                    "unknown escape sequence",
                                    self.span(self.pos - 1),
                                )
                                .with_help("supported escapes: \\n \\t \\\" \\\\"),
                            );
                            continue;
                        }
                    };
                    out.push(escaped);
                    self.pos += 2;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }
}
