use grove_types::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: LexKind,
    pub(crate) text: String,
    pub(crate) range: Span,
    /// A line terminator separates this token from the previous one.
    pub(crate) newline_before: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexKind {
    Ident,
    IntLiteral,
    LongLiteral,
    BigIntLiteral,
    FloatLiteral,
    DoubleLiteral,
    BigDecimalLiteral,
    StringLiteral,
    GStringStart,
    GStringPart,
    GStringEnd,

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Colon,
    At,
    Arrow,

    Dot,
    SafeDot,
    SpreadDot,
    AttrDot,
    MemberPointer,
    DotDot,
    DotDotLt,

    Question,
    Elvis,

    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    EqEq,
    BangEq,
    Spaceship,
    RegexFind,
    RegexMatch,
    Lt,
    Le,
    Gt,
    Ge,

    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Bang,
    Tilde,
    AmpAmp,
    PipePipe,
    Amp,
    Pipe,
    Caret,

    Unknown,
}

pub(crate) struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    saw_newline: bool,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Lexer {
            text,
            pos: 0,
            saw_newline: false,
        }
    }

    pub(crate) fn tokenize(mut self) -> Vec<Token> {
        let mut out = Vec::new();
        self.lex_tokens(&mut out, false);
        out
    }

    fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(c) = self.peek_char() {
                if !c.is_whitespace() {
                    break;
                }
                if c == '\n' || c == '\r' {
                    self.saw_newline = true;
                }
                self.bump_char();
            }

            let rem = self.remaining();
            if rem.starts_with("//") || (self.pos == 0 && rem.starts_with("#!")) {
                while let Some(c) = self.peek_char() {
                    if c == '\n' || c == '\r' {
                        break;
                    }
                    self.bump_char();
                }
                continue;
            }

            if rem.starts_with("/*") {
                self.bump_char();
                self.bump_char();
                while !self.remaining().is_empty() && !self.remaining().starts_with("*/") {
                    if matches!(self.peek_char(), Some('\n' | '\r')) {
                        self.saw_newline = true;
                    }
                    self.bump_char();
                }
                if self.remaining().starts_with("*/") {
                    self.bump_char();
                    self.bump_char();
                }
                continue;
            }

            break;
        }
    }

    fn push(&mut self, out: &mut Vec<Token>, kind: LexKind, text: String, start: usize) {
        out.push(Token {
            kind,
            text,
            range: Span::new(start, self.pos),
            newline_before: std::mem::take(&mut self.saw_newline),
        });
    }

    /// Lex until end of input, or, inside a `${...}` interpolation, until the
    /// closing brace that balances the opening one.
    fn lex_tokens(&mut self, out: &mut Vec<Token>, in_interpolation: bool) {
        let mut brace_depth = 0usize;
        loop {
            self.skip_whitespace_and_comments();
            if self.remaining().is_empty() {
                return;
            }
            if in_interpolation && brace_depth == 0 && self.peek_char() == Some('}') {
                return;
            }

            let start = self.pos;
            let Some(ch) = self.bump_char() else {
                return;
            };

            let kind = match ch {
                '{' => {
                    brace_depth += 1;
                    LexKind::LBrace
                }
                '}' => {
                    brace_depth = brace_depth.saturating_sub(1);
                    LexKind::RBrace
                }
                '(' => LexKind::LParen,
                ')' => LexKind::RParen,
                '[' => LexKind::LBracket,
                ']' => LexKind::RBracket,
                ';' => LexKind::Semi,
                ',' => LexKind::Comma,
                ':' => LexKind::Colon,
                '@' => LexKind::At,
                '~' => LexKind::Tilde,
                '^' => LexKind::Caret,
                '.' => match (self.peek_char(), self.peek_char_n(1)) {
                    (Some('.'), Some('<')) => {
                        self.pos += 2;
                        LexKind::DotDotLt
                    }
                    (Some('.'), _) => {
                        self.pos += 1;
                        LexKind::DotDot
                    }
                    (Some('@'), _) => {
                        self.pos += 1;
                        LexKind::AttrDot
                    }
                    (Some('&'), _) => {
                        self.pos += 1;
                        LexKind::MemberPointer
                    }
                    (Some(c), _) if c.is_ascii_digit() => {
                        self.lex_number_tail();
                        let kind = self.lex_number_suffix(true, false);
                        let text = self.text[start..self.pos].to_string();
                        self.push(out, kind, text, start);
                        continue;
                    }
                    _ => LexKind::Dot,
                },
                '?' => match self.peek_char() {
                    Some('.') => {
                        self.pos += 1;
                        LexKind::SafeDot
                    }
                    Some(':') => {
                        self.pos += 1;
                        LexKind::Elvis
                    }
                    _ => LexKind::Question,
                },
                '=' => {
                    if self.remaining().starts_with("=~") {
                        self.pos += 2;
                        LexKind::RegexMatch
                    } else if self.remaining().starts_with('=') {
                        self.pos += 1;
                        LexKind::EqEq
                    } else if self.remaining().starts_with('~') {
                        self.pos += 1;
                        LexKind::RegexFind
                    } else {
                        LexKind::Eq
                    }
                }
                '!' => self.with_eq(LexKind::Bang, LexKind::BangEq),
                '<' => {
                    if self.remaining().starts_with("=>") {
                        self.pos += 2;
                        LexKind::Spaceship
                    } else {
                        self.with_eq(LexKind::Lt, LexKind::Le)
                    }
                }
                '>' => self.with_eq(LexKind::Gt, LexKind::Ge),
                '+' => match self.peek_char() {
                    Some('+') => {
                        self.pos += 1;
                        LexKind::PlusPlus
                    }
                    _ => self.with_eq(LexKind::Plus, LexKind::PlusEq),
                },
                '-' => match self.peek_char() {
                    Some('-') => {
                        self.pos += 1;
                        LexKind::MinusMinus
                    }
                    Some('>') => {
                        self.pos += 1;
                        LexKind::Arrow
                    }
                    _ => self.with_eq(LexKind::Minus, LexKind::MinusEq),
                },
                '*' => match self.peek_char() {
                    Some('*') => {
                        self.pos += 1;
                        LexKind::StarStar
                    }
                    Some('.') => {
                        self.pos += 1;
                        LexKind::SpreadDot
                    }
                    _ => self.with_eq(LexKind::Star, LexKind::StarEq),
                },
                '/' => self.with_eq(LexKind::Slash, LexKind::SlashEq),
                '%' => self.with_eq(LexKind::Percent, LexKind::PercentEq),
                '&' => {
                    if self.peek_char() == Some('&') {
                        self.pos += 1;
                        LexKind::AmpAmp
                    } else {
                        LexKind::Amp
                    }
                }
                '|' => {
                    if self.peek_char() == Some('|') {
                        self.pos += 1;
                        LexKind::PipePipe
                    } else {
                        LexKind::Pipe
                    }
                }
                '\'' => {
                    let value = self.lex_quoted('\'');
                    self.push(out, LexKind::StringLiteral, value, start);
                    continue;
                }
                '"' => {
                    self.lex_double_quoted(out, start);
                    continue;
                }
                c if c.is_ascii_digit() => {
                    let kind = self.lex_number(c);
                    let text = self.text[start..self.pos].to_string();
                    self.push(out, kind, text, start);
                    continue;
                }
                c if is_ident_start(c) => {
                    self.lex_identifier_tail();
                    let text = self.text[start..self.pos].to_string();
                    self.push(out, LexKind::Ident, text, start);
                    continue;
                }
                _ => LexKind::Unknown,
            };

            let text = self.text[start..self.pos].to_string();
            self.push(out, kind, text, start);
        }
    }

    fn with_eq(&mut self, plain: LexKind, with_eq: LexKind) -> LexKind {
        if self.peek_char() == Some('=') {
            self.pos += 1;
            with_eq
        } else {
            plain
        }
    }

    fn lex_identifier_tail(&mut self) {
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                self.bump_char();
            } else {
                break;
            }
        }
    }

    fn lex_number(&mut self, first: char) -> LexKind {
        if first == '0' && matches!(self.peek_char(), Some('x' | 'X' | 'b' | 'B')) {
            self.bump_char();
            while matches!(self.peek_char(), Some(c) if c.is_ascii_hexdigit() || c == '_') {
                self.bump_char();
            }
            return self.lex_number_suffix(false, true);
        }

        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump_char();
        }
        // `1..2` is a range, not a fraction.
        let mut decimal = false;
        if self.peek_char() == Some('.') && matches!(self.peek_char_n(1), Some(c) if c.is_ascii_digit())
        {
            self.bump_char();
            decimal = true;
        }
        if decimal || matches!(self.peek_char(), Some('e' | 'E')) {
            self.lex_number_tail();
            decimal = true;
        }
        self.lex_number_suffix(decimal, false)
    }

    /// Digits after the decimal point plus an optional exponent.
    fn lex_number_tail(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump_char();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.bump_char();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.bump_char();
            }
            while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                self.bump_char();
            }
        }
    }

    fn lex_number_suffix(&mut self, decimal: bool, radix_prefixed: bool) -> LexKind {
        let kind = match self.peek_char() {
            Some('l' | 'L') if !decimal => LexKind::LongLiteral,
            Some('i' | 'I') if !decimal => LexKind::IntLiteral,
            Some('g' | 'G') if decimal => LexKind::BigDecimalLiteral,
            Some('g' | 'G') => LexKind::BigIntLiteral,
            Some('f' | 'F') if !radix_prefixed => LexKind::FloatLiteral,
            Some('d' | 'D') if !radix_prefixed => LexKind::DoubleLiteral,
            _ => {
                return if decimal {
                    LexKind::BigDecimalLiteral
                } else {
                    LexKind::IntLiteral
                };
            }
        };
        self.bump_char();
        kind
    }

    /// Lex a single-quoted string body; the opening quote is already consumed.
    fn lex_quoted(&mut self, quote: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.bump_char() {
            match c {
                c if c == quote => break,
                '\\' => self.lex_escape(&mut out),
                '\n' | '\r' => {
                    // Unterminated; leave the terminator for the next token.
                    self.pos -= c.len_utf8();
                    break;
                }
                c => out.push(c),
            }
        }
        out
    }

    fn lex_escape(&mut self, out: &mut String) {
        match self.bump_char() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let digits: String = self.remaining().chars().take(4).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if digits.len() == 4 => {
                        self.pos += 4;
                        out.push(decoded);
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    /// A double-quoted string becomes a plain literal, or a GString token
    /// sequence when it contains `$` interpolations:
    /// `GStringStart (value GStringPart)* value GStringEnd`, where a value is
    /// either `{ tokens }` or `Ident (Dot Ident)*`.
    fn lex_double_quoted(&mut self, out: &mut Vec<Token>, start: usize) {
        let mut buf = String::new();
        let mut seg_start = start;
        let mut interpolated = false;
        loop {
            let Some(c) = self.bump_char() else {
                break;
            };
            match c {
                '"' => break,
                '\\' => self.lex_escape(&mut buf),
                '\n' | '\r' => {
                    self.pos -= c.len_utf8();
                    break;
                }
                '$' if matches!(self.peek_char(), Some(c) if c == '{' || is_ident_start(c)) => {
                    let kind = if interpolated {
                        LexKind::GStringPart
                    } else {
                        LexKind::GStringStart
                    };
                    interpolated = true;
                    self.push(out, kind, std::mem::take(&mut buf), seg_start);
                    self.lex_interpolation(out);
                    seg_start = self.pos;
                }
                c => buf.push(c),
            }
        }
        let kind = if interpolated {
            LexKind::GStringEnd
        } else {
            LexKind::StringLiteral
        };
        self.push(out, kind, buf, seg_start);
    }

    fn lex_interpolation(&mut self, out: &mut Vec<Token>) {
        if self.peek_char() == Some('{') {
            let start = self.pos;
            self.bump_char();
            self.push(out, LexKind::LBrace, "{".to_string(), start);
            self.lex_tokens(out, true);
            if self.peek_char() == Some('}') {
                let start = self.pos;
                self.bump_char();
                self.push(out, LexKind::RBrace, "}".to_string(), start);
            }
            return;
        }

        loop {
            let start = self.pos;
            self.lex_identifier_tail();
            let text = self.text[start..self.pos].to_string();
            self.push(out, LexKind::Ident, text, start);
            let continues = self.peek_char() == Some('.')
                && matches!(self.peek_char_n(1), Some(c) if is_ident_start(c));
            if !continues {
                return;
            }
            let start = self.pos;
            self.bump_char();
            self.push(out, LexKind::Dot, ".".to_string(), start);
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<LexKind> {
        Lexer::new(text).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn operators_prefer_longest_match() {
        assert_eq!(
            kinds("a?.b ?: c*.d ..< ..  <=> ==~ =~ -> .@x .&y"),
            vec![
                LexKind::Ident,
                LexKind::SafeDot,
                LexKind::Ident,
                LexKind::Elvis,
                LexKind::Ident,
                LexKind::SpreadDot,
                LexKind::Ident,
                LexKind::DotDotLt,
                LexKind::DotDot,
                LexKind::Spaceship,
                LexKind::RegexMatch,
                LexKind::RegexFind,
                LexKind::Arrow,
                LexKind::AttrDot,
                LexKind::Ident,
                LexKind::MemberPointer,
                LexKind::Ident,
            ]
        );
    }

    #[test]
    fn number_suffixes_pick_literal_kind() {
        assert_eq!(
            kinds("1 2L 3G 4.5 4.5f 6d 7.0G 0xFFL 1..2"),
            vec![
                LexKind::IntLiteral,
                LexKind::LongLiteral,
                LexKind::BigIntLiteral,
                LexKind::BigDecimalLiteral,
                LexKind::FloatLiteral,
                LexKind::DoubleLiteral,
                LexKind::BigDecimalLiteral,
                LexKind::LongLiteral,
                LexKind::IntLiteral,
                LexKind::DotDot,
                LexKind::IntLiteral,
            ]
        );
    }

    #[test]
    fn gstring_is_split_into_segments() {
        let tokens = Lexer::new(r#""a $b c ${d + 1}""#).tokenize();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LexKind::GStringStart,
                LexKind::Ident,
                LexKind::GStringPart,
                LexKind::LBrace,
                LexKind::Ident,
                LexKind::Plus,
                LexKind::IntLiteral,
                LexKind::RBrace,
                LexKind::GStringEnd,
            ]
        );
        assert_eq!(tokens[0].text, "a ");
        assert_eq!(tokens[2].text, " c ");
        assert_eq!(tokens[8].text, "");
        assert_eq!(tokens[8].range.end, 17);
    }

    #[test]
    fn newlines_are_recorded_on_the_following_token() {
        let tokens = Lexer::new("a // c\nb c").tokenize();
        let flags: Vec<_> = tokens.iter().map(|t| t.newline_before).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn string_escapes_are_decoded() {
        let tokens = Lexer::new(r"'a\n\'b\u0041'").tokenize();
        assert_eq!(tokens[0].text, "a\n'bA");
        assert_eq!(tokens[0].range, Span::new(0, 14));
    }
}
