//! Lossless tokens for the C# subset.
//!
//! Every token owns the trivia (whitespace, comments, preprocessor lines)
//! that precedes it, so concatenating `leading + text` over an entire tree
//! reproduces the original source byte for byte. Trailing trivia at the end
//! of a file hangs off the end-of-file token.

/// Token classification. Punctuation and keywords are distinguished by
/// text, not by kind, which keeps the lexer small.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    IntLiteral,
    StringLiteral,
    CharLiteral,
    Punct,
    EndOfFile,
}

/// A single token with its leading trivia and 0-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub leading: String,
    pub line: u32,
}

impl Token {
    /// Synthesize an identifier token with no trivia.
    pub fn ident(text: &str) -> Token {
        Token {
            kind: TokenKind::Ident,
            text: text.to_string(),
            leading: String::new(),
            line: 0,
        }
    }

    /// Synthesize a punctuation token with no trivia.
    pub fn punct(text: &str) -> Token {
        Token {
            kind: TokenKind::Punct,
            text: text.to_string(),
            leading: String::new(),
            line: 0,
        }
    }

    pub fn with_leading(mut self, leading: &str) -> Token {
        self.leading = leading.to_string();
        self
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }
}

/// Lex a source text into tokens. Lexing is total: any byte sequence
/// produces a token stream that prints back to the input.
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        loop {
            let leading = self.consume_trivia();
            let line = self.line;
            if self.pos >= self.bytes.len() {
                self.tokens.push(Token {
                    kind: TokenKind::EndOfFile,
                    text: String::new(),
                    leading,
                    line,
                });
                return self.tokens;
            }
            let start = self.pos;
            let kind = self.consume_token();
            self.tokens.push(Token {
                kind,
                text: self.src[start..self.pos].to_string(),
                leading,
                line,
            });
        }
    }

    fn peek(&self) -> u8 {
        if self.pos < self.bytes.len() {
            self.bytes[self.pos]
        } else {
            0
        }
    }

    fn peek_at(&self, offset: usize) -> u8 {
        if self.pos + offset < self.bytes.len() {
            self.bytes[self.pos + offset]
        } else {
            0
        }
    }

    fn bump(&mut self) {
        if self.peek() == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
    }

    /// Whitespace, comments and preprocessor directives are trivia.
    fn consume_trivia(&mut self) -> String {
        let start = self.pos;
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => self.bump(),
                b'/' if self.peek_at(1) == b'/' => {
                    while self.pos < self.bytes.len() && self.peek() != b'\n' {
                        self.bump();
                    }
                }
                b'/' if self.peek_at(1) == b'*' => {
                    self.bump();
                    self.bump();
                    while self.pos < self.bytes.len() {
                        if self.peek() == b'*' && self.peek_at(1) == b'/' {
                            self.bump();
                            self.bump();
                            break;
                        }
                        self.bump();
                    }
                }
                b'#' if self.at_line_start(start) => {
                    while self.pos < self.bytes.len() && self.peek() != b'\n' {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn at_line_start(&self, trivia_start: usize) -> bool {
        let before = &self.bytes[..self.pos];
        match before.iter().rposition(|&b| b == b'\n') {
            Some(nl) => before[nl + 1..]
                .iter()
                .all(|&b| b == b' ' || b == b'\t' || b == b'\r'),
            None => before[trivia_start..]
                .iter()
                .all(|&b| b == b' ' || b == b'\t' || b == b'\r'),
        }
    }

    fn consume_token(&mut self) -> TokenKind {
        let c = self.peek();
        if c == b'_' || c.is_ascii_alphabetic() {
            while self.peek() == b'_' || self.peek().is_ascii_alphanumeric() {
                self.bump();
            }
            return TokenKind::Ident;
        }
        if c.is_ascii_digit() {
            while self.peek().is_ascii_alphanumeric() || self.peek() == b'.' || self.peek() == b'_'
            {
                // Stop at a dot that is not followed by a digit (member access
                // on a literal, e.g. 1.ToString()).
                if self.peek() == b'.' && !self.peek_at(1).is_ascii_digit() {
                    break;
                }
                self.bump();
            }
            return TokenKind::IntLiteral;
        }
        if c == b'"' {
            self.consume_string(false);
            return TokenKind::StringLiteral;
        }
        if c == b'@' && self.peek_at(1) == b'"' {
            self.bump();
            self.consume_string(true);
            return TokenKind::StringLiteral;
        }
        if c == b'\'' {
            self.bump();
            while self.pos < self.bytes.len() && self.peek() != b'\'' {
                if self.peek() == b'\\' {
                    self.bump();
                }
                self.bump();
            }
            self.bump();
            return TokenKind::CharLiteral;
        }
        // Multi-character operators the parser cares about; everything
        // else is a single-character punct.
        for op in ["=>", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-="] {
            if self.src[self.pos..].starts_with(op) {
                self.bump();
                self.bump();
                return TokenKind::Punct;
            }
        }
        self.bump();
        TokenKind::Punct
    }

    fn consume_string(&mut self, verbatim: bool) {
        self.bump(); // opening quote
        while self.pos < self.bytes.len() {
            match self.peek() {
                b'"' if verbatim && self.peek_at(1) == b'"' => {
                    self.bump();
                    self.bump();
                }
                b'"' => {
                    self.bump();
                    return;
                }
                b'\\' if !verbatim => {
                    self.bump();
                    self.bump();
                }
                _ => self.bump(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(src: &str) {
        let tokens = lex(src);
        let rebuilt: String = tokens.iter().map(|t| format!("{}{}", t.leading, t.text)).collect();
        assert_eq!(rebuilt, src);
    }

    #[test]
    fn test_roundtrip_simple_statement() {
        roundtrip("_mock = MockRepository.GenerateMock<string> ();\n");
    }

    #[test]
    fn test_roundtrip_comments_and_directives() {
        roundtrip("// header\n#if DEBUG\nusing Rhino.Mocks; /* inline */\n#endif\n");
    }

    #[test]
    fn test_roundtrip_strings() {
        roundtrip(r#"var s = "a \" b" + @"c "" d";"#);
    }

    #[test]
    fn test_arrow_is_one_token() {
        let tokens = lex("m => m.DoSomething()");
        assert!(tokens.iter().any(|t| t.text == "=>"));
        assert!(!tokens.iter().any(|t| t.text == "="));
    }

    #[test]
    fn test_line_numbers_are_zero_based() {
        let tokens = lex("a\nb\nc");
        let lines: Vec<u32> = tokens.iter().filter(|t| t.is_ident()).map(|t| t.line).collect();
        assert_eq!(lines, vec![0, 1, 2]);
    }
}
