//! A small recovering recognizer for the Groovy subset the converter
//! understands.
//!
//! Positions follow the conventions of grammar-generated Groovy trees: binary
//! operators, prefix/postfix operators, casts and index expressions only report
//! the operator token (or bracket pair), and property access reports trailing
//! whitespace. The converter repairs those ranges.

use grove_core::{LineCol, PositionIndex, TextSize};
use grove_types::Span;

use crate::lexer::{LexKind, Lexer, Token};
use crate::problems::{RecognizerOutput, SyntaxProblem, TokenEdit, TokenKind};
use crate::raw::{RawKind, RawNodeId, RawTreeBuilder};

/// Nesting beyond this many statements/expressions is skipped, not parsed.
pub const MAX_NESTING: usize = 128;

/// Identifier synthesized where an assignment is missing its right-hand side.
pub const MISSING_IDENT: &str = "$missing$";

const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
    "transient",
    "volatile",
    "synchronized",
    "native",
    "strictfp",
    "def",
    "default",
];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

const RESERVED: &[&str] = &[
    "as",
    "assert",
    "break",
    "case",
    "catch",
    "class",
    "continue",
    "do",
    "else",
    "enum",
    "extends",
    "finally",
    "for",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "package",
    "return",
    "switch",
    "throw",
    "throws",
    "trait",
    "try",
    "while",
];

/// Recognize `text`, producing a raw tree, problems and a token edit log.
///
/// Never fails: malformed input yields sentinel nodes plus problems.
pub fn recognize(text: &str) -> RecognizerOutput {
    let tokens = Lexer::new(text).tokenize();
    let mut parser = Parser::new(text, tokens);
    parser.parse_compilation_unit();
    let output = parser.finish();
    tracing::debug!(
        target: "grove.syntax",
        nodes = output.tree.len(),
        problems = output.problems.len(),
        edits = output.edits.len(),
        "recognized source"
    );
    output
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclStart {
    Type,
    Member,
    None,
}

struct Parser<'a> {
    text: &'a str,
    index: PositionIndex,
    tokens: Vec<Token>,
    pos: usize,
    builder: RawTreeBuilder,
    /// Full source extent of every node, indexed by node id. Differs from
    /// the reported position for operator-only nodes.
    extents: Vec<Span>,
    problems: Vec<SyntaxProblem>,
    edits: Vec<TokenEdit>,
    depth: usize,
    closure_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, tokens: Vec<Token>) -> Self {
        Parser {
            text,
            index: PositionIndex::new(text),
            tokens,
            pos: 0,
            builder: RawTreeBuilder::new(),
            extents: Vec::new(),
            problems: Vec::new(),
            edits: Vec::new(),
            depth: 0,
            closure_depth: 0,
        }
    }

    fn finish(self) -> RecognizerOutput {
        RecognizerOutput {
            tree: self.builder.finish(),
            problems: self.problems,
            edits: self.edits,
        }
    }

    // --- token cursor -------------------------------------------------------

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_n(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn peek_kind(&self) -> Option<LexKind> {
        self.peek().map(|t| t.kind)
    }

    fn nth_kind(&self, n: usize) -> Option<LexKind> {
        self.peek_n(n).map(|t| t.kind)
    }

    fn at_kind(&self, kind: LexKind) -> bool {
        self.peek().is_some_and(|token| token.kind == kind)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.nth_is_keyword(0, keyword)
    }

    fn nth_is_keyword(&self, n: usize, keyword: &str) -> bool {
        self.peek_n(n)
            .is_some_and(|token| token.kind == LexKind::Ident && token.text == keyword)
    }

    fn at_newline(&self) -> bool {
        self.peek().is_some_and(|token| token.newline_before)
    }

    fn bump(&mut self) -> Option<Token> {
        if self.is_eof() {
            return None;
        }
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        Some(tok)
    }

    /// Start of the current token, or end of input.
    fn cur_start(&self) -> usize {
        self.peek()
            .map(|t| t.range.start)
            .unwrap_or(self.text.len())
    }

    /// End of the most recently consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map(|t| t.range.end)
            .unwrap_or(0)
    }

    fn prev_kind(&self) -> Option<LexKind> {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map(|t| t.kind)
    }

    // --- node construction --------------------------------------------------

    fn lc(&self, offset: usize) -> LineCol {
        self.index
            .row_col(TextSize::from(offset as u32))
            .unwrap_or(LineCol::new(self.index.end_line(), self.index.end_column()))
    }

    fn mk(
        &mut self,
        kind: RawKind,
        text: &str,
        reported: Span,
        extent: Span,
        children: Vec<RawNodeId>,
    ) -> RawNodeId {
        let start = self.lc(reported.start);
        let end = self.lc(reported.end);
        let id = self.builder.node(kind, text, start, Some(end), children);
        debug_assert_eq!(id.idx(), self.extents.len());
        self.extents.push(extent);
        id
    }

    fn mk_full(
        &mut self,
        kind: RawKind,
        text: &str,
        span: Span,
        children: Vec<RawNodeId>,
    ) -> RawNodeId {
        self.mk(kind, text, span, span, children)
    }

    fn leaf(&mut self, kind: RawKind, tok: &Token) -> RawNodeId {
        self.mk_full(kind, &tok.text, tok.range, Vec::new())
    }

    fn extent(&self, id: RawNodeId) -> Span {
        self.extents[id.idx()]
    }

    fn duplicate(&mut self, id: RawNodeId) -> RawNodeId {
        let before = self.extents.len();
        let copy = self.builder.duplicate(id);
        // Copies are allocated children-first; mirror the source extents.
        let mut sources = Vec::new();
        collect_postorder(&self.builder, id, &mut sources);
        for (offset, source) in sources.into_iter().enumerate() {
            debug_assert_eq!(before + offset, self.extents.len());
            let extent = self.extents[source.idx()];
            self.extents.push(extent);
        }
        copy
    }

    fn sentinel(&mut self, offset: usize) -> RawNodeId {
        self.mk_full(RawKind::EmptyStat, "", Span::empty(offset), Vec::new())
    }

    fn missing_ident(&mut self, offset: usize) -> RawNodeId {
        self.edits
            .push(TokenEdit::insert(offset, TokenKind::Identifier));
        self.mk_full(RawKind::Ident, MISSING_IDENT, Span::empty(offset), Vec::new())
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        let start = self.lc(span.start);
        self.problems.push(SyntaxProblem {
            span,
            start,
            message: message.into(),
        });
    }

    /// Consume a token of `kind`, or report it missing and log an insertion
    /// at the end of the previous token.
    fn expect(&mut self, kind: LexKind) -> Option<Token> {
        if self.at_kind(kind) {
            return self.bump();
        }
        let at = self.prev_end();
        let edit_kind = edit_kind(kind);
        self.edits.push(TokenEdit::insert(at, edit_kind));
        let found = self
            .peek()
            .map(|t| format!("'{}'", t.text))
            .unwrap_or_else(|| "end of file".to_string());
        self.error(
            Span::empty(at),
            format!("expecting '{}', found {found}", edit_kind.text()),
        );
        None
    }

    /// Consume the current token as garbage.
    fn skip_token(&mut self) {
        if let Some(tok) = self.bump() {
            self.edits
                .push(TokenEdit::delete(tok.range.start, edit_kind(tok.kind)));
        }
    }

    fn unexpected_here(&mut self) {
        if let Some(tok) = self.peek().cloned() {
            self.error(tok.range, format!("unexpected token: {}", tok.text));
        }
    }

    // --- compilation unit ---------------------------------------------------

    fn parse_compilation_unit(&mut self) {
        self.skip_semis();
        if self.at_keyword("package") {
            let id = self.parse_package();
            self.builder.add_root(id);
            self.finish_statement(false);
        }

        loop {
            self.skip_semis();
            if self.is_eof() {
                break;
            }
            let before = self.pos;
            let mut out = Vec::new();
            if self.at_keyword("import") {
                out.push(self.parse_import());
            } else {
                self.parse_statements_into(&mut out);
            }
            for id in out {
                self.builder.add_root(id);
            }
            self.finish_statement(false);
            self.ensure_progress(before);
        }
    }

    fn skip_semis(&mut self) {
        while self.at_kind(LexKind::Semi) {
            self.bump();
        }
    }

    fn ensure_progress(&mut self, before: usize) {
        if self.pos == before && !self.is_eof() {
            self.unexpected_here();
            self.skip_token();
        }
    }

    /// Statements end at `;`, a line break, a closing brace or end of input.
    /// Anything else on the same line is reported and skipped.
    fn finish_statement(&mut self, in_block: bool) {
        if self.at_kind(LexKind::Semi) {
            self.bump();
            return;
        }
        if self.is_eof() || self.at_newline() {
            return;
        }
        if in_block && self.at_kind(LexKind::RBrace) {
            return;
        }
        if self.prev_kind() == Some(LexKind::RBrace) {
            return;
        }
        self.unexpected_here();
        self.skip_token();
        while !self.is_eof()
            && !self.at_newline()
            && !self.at_kind(LexKind::Semi)
            && !self.at_kind(LexKind::RBrace)
        {
            self.skip_token();
        }
        if self.at_kind(LexKind::Semi) {
            self.bump();
        }
    }

    fn parse_package(&mut self) -> RawNodeId {
        let kw = self.bump().map(|t| t.range.start).unwrap_or(0);
        let name = self.parse_qualified_name();
        let text = self.dotted_text(name);
        let end = self.prev_end();
        self.mk_full(RawKind::PackageDef, &text, Span::new(kw, end), vec![name])
    }

    fn parse_import(&mut self) -> RawNodeId {
        let start = self.bump().map(|t| t.range.start).unwrap_or(0);
        let kind = if self.at_keyword("static") {
            self.bump();
            RawKind::StaticImport
        } else {
            RawKind::Import
        };
        let mut name = self.parse_qualified_name();
        if self.at_kind(LexKind::Dot) && self.nth_kind(1) == Some(LexKind::Star) {
            self.bump();
            let star = self.bump();
            if let Some(star) = star {
                let star = self.leaf(RawKind::Ident, &star);
                let span = self.extent(name).cover(self.extent(star));
                name = self.mk_full(RawKind::Dot, "", span, vec![name, star]);
            }
        }
        let mut children = vec![name];
        if self.at_keyword("as") {
            self.bump();
            match self.peek().cloned() {
                Some(tok) if tok.kind == LexKind::Ident => {
                    self.bump();
                    children.push(self.leaf(RawKind::Ident, &tok));
                }
                _ => {
                    let at = self.prev_end();
                    self.error(Span::empty(at), "expecting an alias name after 'as'");
                    children.push(self.missing_ident(at));
                }
            }
        }
        let text = self.dotted_text(name);
        let end = self.prev_end();
        self.mk_full(kind, &text, Span::new(start, end), children)
    }

    fn parse_qualified_name(&mut self) -> RawNodeId {
        let mut name = self.parse_name_segment();
        while self.at_kind(LexKind::Dot) && self.nth_kind(1) == Some(LexKind::Ident) {
            self.bump();
            let segment = self.parse_name_segment();
            let span = self.extent(name).cover(self.extent(segment));
            name = self.mk_full(RawKind::Dot, "", span, vec![name, segment]);
        }
        name
    }

    fn parse_name_segment(&mut self) -> RawNodeId {
        match self.peek().cloned() {
            Some(tok) if tok.kind == LexKind::Ident => {
                self.bump();
                self.leaf(RawKind::Ident, &tok)
            }
            _ => {
                let at = self.prev_end();
                self.error(Span::empty(at), "expecting an identifier");
                self.missing_ident(at)
            }
        }
    }

    /// `a.b.c` for a tree of `Dot`/`Ident` nodes.
    fn dotted_text(&self, id: RawNodeId) -> String {
        let node = self.builder.get(id);
        match node.kind {
            RawKind::Dot => node
                .children()
                .iter()
                .map(|child| self.dotted_text(*child))
                .collect::<Vec<_>>()
                .join("."),
            _ => node.text.to_string(),
        }
    }

    // --- statements ---------------------------------------------------------

    /// Parse one statement; multi-variable declarations expand into several
    /// sibling `VariableDef`s.
    fn parse_statements_into(&mut self, out: &mut Vec<RawNodeId>) {
        if self.depth > MAX_NESTING {
            out.push(self.too_deep());
            return;
        }
        self.depth += 1;
        self.parse_statement_inner(out);
        self.depth -= 1;
    }

    fn parse_statement(&mut self) -> RawNodeId {
        let mut out = Vec::new();
        let start = self.cur_start();
        self.parse_statements_into(&mut out);
        match out.len() {
            0 => self.sentinel(start),
            1 => out[0],
            _ => {
                let span = Span::new(start, self.prev_end());
                self.mk_full(RawKind::Slist, "", span, out)
            }
        }
    }

    fn parse_statement_inner(&mut self, out: &mut Vec<RawNodeId>) {
        let Some(tok) = self.peek().cloned() else {
            out.push(self.sentinel(self.text.len()));
            return;
        };
        match tok.kind {
            LexKind::LBrace => {
                out.push(self.parse_block());
                return;
            }
            LexKind::At => {
                self.parse_declaration(out, None);
                return;
            }
            LexKind::Ident => {}
            _ => {
                out.push(self.parse_expression_statement());
                return;
            }
        }

        let next = self.nth_kind(1);
        let id = match tok.text.as_str() {
            "if" => self.parse_if(),
            "for" => self.parse_for(),
            "while" => self.parse_while(),
            "switch" => self.parse_switch(),
            "try" => self.parse_try(),
            "throw" => self.parse_keyword_with_expr(RawKind::Throw),
            "assert" => self.parse_assert(),
            "return" => self.parse_return(),
            "break" => self.parse_jump(RawKind::Break),
            "continue" => self.parse_jump(RawKind::Continue),
            "synchronized" if next == Some(LexKind::LParen) => self.parse_synchronized(),
            "this" | "super" if next == Some(LexKind::LParen) => self.parse_ctor_call(),
            "import" => self.parse_import(),
            _ if next == Some(LexKind::Colon) && !is_reserved(&tok.text) => {
                self.parse_labeled()
            }
            _ if self.decl_start() != DeclStart::None => {
                self.parse_declaration(out, None);
                return;
            }
            _ => self.parse_expression_statement(),
        };
        out.push(id);
    }

    fn parse_block(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.expect(LexKind::LBrace);
        let children = self.parse_block_body();
        self.expect(LexKind::RBrace);
        let end = self.prev_end();
        self.mk_full(RawKind::Slist, "", Span::new(start, end), children)
    }

    fn parse_block_body(&mut self) -> Vec<RawNodeId> {
        let mut children = Vec::new();
        loop {
            self.skip_semis();
            if self.is_eof() || self.at_kind(LexKind::RBrace) {
                break;
            }
            let before = self.pos;
            self.parse_statements_into(&mut children);
            self.finish_statement(true);
            self.ensure_progress(before);
        }
        children
    }

    fn parse_expression_statement(&mut self) -> RawNodeId {
        let expr = if self.at_command_call() {
            self.parse_command_call()
        } else {
            self.parse_expr()
        };
        let span = self.extent(expr);
        self.mk_full(RawKind::Expr, "", span, vec![expr])
    }

    /// `name arg, arg` on a single line.
    fn at_command_call(&self) -> bool {
        let Some(tok) = self.peek() else {
            return false;
        };
        if tok.kind != LexKind::Ident || is_reserved(&tok.text) || is_primary_keyword(&tok.text)
        {
            return false;
        }
        let Some(next) = self.peek_n(1) else {
            return false;
        };
        if next.newline_before {
            return false;
        }
        match next.kind {
            LexKind::Ident => !is_reserved(&next.text),
            LexKind::IntLiteral
            | LexKind::LongLiteral
            | LexKind::BigIntLiteral
            | LexKind::FloatLiteral
            | LexKind::DoubleLiteral
            | LexKind::BigDecimalLiteral
            | LexKind::StringLiteral
            | LexKind::GStringStart => true,
            _ => false,
        }
    }

    fn parse_command_call(&mut self) -> RawNodeId {
        let Some(name_tok) = self.bump() else {
            return self.sentinel(self.text.len());
        };
        let name = self.leaf(RawKind::Ident, &name_tok);
        let args_start = self.cur_start();
        let mut args = Vec::new();
        loop {
            args.push(self.parse_argument());
            if self.at_kind(LexKind::Comma) && !self.at_newline() {
                self.bump();
                continue;
            }
            break;
        }
        let args_end = self.prev_end();
        let elist = self.mk_full(RawKind::Elist, "", Span::new(args_start, args_end), args);
        let extent = Span::new(name_tok.range.start, args_end);
        self.mk(
            RawKind::MethodCall,
            "<command>",
            name_tok.range,
            extent,
            vec![name, elist],
        )
    }

    fn parse_paren_expr(&mut self) -> RawNodeId {
        self.expect(LexKind::LParen);
        let expr = if self.at_kind(LexKind::RParen) {
            let at = self.cur_start();
            self.error(Span::empty(at), "expecting an expression");
            self.sentinel(at)
        } else {
            self.parse_expr()
        };
        self.expect(LexKind::RParen);
        expr
    }

    fn parse_if(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        let cond = self.parse_paren_expr();
        let then = self.parse_statement();
        let mut children = vec![cond, then];
        let save = self.pos;
        self.skip_semis();
        if self.at_keyword("else") {
            self.bump();
            children.push(self.parse_statement());
        } else {
            self.pos = save;
        }
        let end = self.prev_end();
        self.mk_full(RawKind::If, "if", Span::new(start, end), children)
    }

    fn parse_while(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        let cond = self.parse_paren_expr();
        let body = self.parse_statement();
        let end = self.prev_end();
        self.mk_full(RawKind::While, "while", Span::new(start, end), vec![cond, body])
    }

    fn parse_for(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        self.expect(LexKind::LParen);

        let head = if let Some(var_end) = self.for_in_variable_end() {
            let var = self.parse_parameter_until(var_end);
            self.bump(); // `in` or `:`
            let iterable = self.parse_expr();
            let span = self.extent(var).cover(self.extent(iterable));
            vec![self.mk_full(RawKind::ForInIterable, "", span, vec![var, iterable])]
        } else {
            self.parse_classic_for_head()
        };

        self.expect(LexKind::RParen);
        let body = self.parse_statement();
        let mut children = head;
        children.push(body);
        let end = self.prev_end();
        self.mk_full(RawKind::For, "for", Span::new(start, end), children)
    }

    /// Token index of `in`/`:` when the loop header is a for-in.
    fn for_in_variable_end(&self) -> Option<usize> {
        let mut i = self.pos;
        while self
            .tokens
            .get(i)
            .is_some_and(|t| t.kind == LexKind::Ident && MODIFIER_KEYWORDS.contains(&t.text.as_str()))
        {
            i += 1;
        }
        let candidates = [Some(i + 1), self.scan_type(i).map(|j| j + 1)];
        candidates.into_iter().flatten().find(|&sep| {
            self.tokens.get(sep - 1).is_some_and(|t| t.kind == LexKind::Ident)
                && self.tokens.get(sep).is_some_and(|t| {
                    t.kind == LexKind::Colon || (t.kind == LexKind::Ident && t.text == "in")
                })
        })
    }

    fn parse_classic_for_head(&mut self) -> Vec<RawNodeId> {
        let init_start = self.cur_start();
        let mut init = Vec::new();
        if !self.at_kind(LexKind::Semi) {
            if self.decl_start() == DeclStart::Member {
                self.parse_declaration(&mut init, None);
            } else {
                init.push(self.parse_expr());
                while self.at_kind(LexKind::Comma) {
                    self.bump();
                    init.push(self.parse_expr());
                }
            }
        }
        let init = self.mk_full(
            RawKind::ForInit,
            "",
            Span::new(init_start, self.prev_end().max(init_start)),
            init,
        );
        self.expect(LexKind::Semi);

        let cond_start = self.cur_start();
        let cond = if self.at_kind(LexKind::Semi) {
            Vec::new()
        } else {
            vec![self.parse_expr()]
        };
        let cond = self.mk_full(
            RawKind::ForCondition,
            "",
            Span::new(cond_start, self.prev_end().max(cond_start)),
            cond,
        );
        self.expect(LexKind::Semi);

        let iter_start = self.cur_start();
        let mut updates = Vec::new();
        if !self.at_kind(LexKind::RParen) {
            updates.push(self.parse_expr());
            while self.at_kind(LexKind::Comma) {
                self.bump();
                updates.push(self.parse_expr());
            }
        }
        let span = Span::new(iter_start, self.prev_end().max(iter_start));
        let elist = self.mk_full(RawKind::Elist, "", span, updates);
        let iter = self.mk_full(RawKind::ForIterator, "", span, vec![elist]);
        vec![init, cond, iter]
    }

    fn parse_switch(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        let subject = self.parse_paren_expr();
        let mut children = vec![subject];
        self.expect(LexKind::LBrace);
        loop {
            self.skip_semis();
            if self.is_eof() || self.at_kind(LexKind::RBrace) {
                break;
            }
            if !(self.at_keyword("case") || self.at_keyword("default")) {
                self.unexpected_here();
                self.skip_token();
                continue;
            }
            children.push(self.parse_case_group());
        }
        self.expect(LexKind::RBrace);
        let end = self.prev_end();
        self.mk_full(RawKind::Switch, "switch", Span::new(start, end), children)
    }

    fn parse_case_group(&mut self) -> RawNodeId {
        let start = self.cur_start();
        let mut labels = Vec::new();
        while self.at_keyword("case") || self.at_keyword("default") {
            let Some(kw) = self.bump() else {
                break;
            };
            if kw.text == "case" {
                let value = self.parse_expr();
                self.expect(LexKind::Colon);
                let span = Span::new(kw.range.start, self.prev_end());
                labels.push(self.mk_full(RawKind::Case, "case", span, vec![value]));
            } else {
                self.expect(LexKind::Colon);
                let span = Span::new(kw.range.start, self.prev_end());
                labels.push(self.mk_full(RawKind::Default, "default", span, Vec::new()));
            }
        }

        let body_start = self.cur_start();
        let mut body = Vec::new();
        loop {
            self.skip_semis();
            if self.is_eof()
                || self.at_kind(LexKind::RBrace)
                || self.at_keyword("case")
                || self.at_keyword("default")
            {
                break;
            }
            let before = self.pos;
            self.parse_statements_into(&mut body);
            self.finish_statement(true);
            self.ensure_progress(before);
        }
        let body_end = self.prev_end().max(body_start);
        let slist = self.mk_full(RawKind::Slist, "", Span::new(body_start, body_end), body);
        labels.push(slist);
        let end = self.prev_end();
        self.mk_full(RawKind::CaseGroup, "", Span::new(start, end), labels)
    }

    fn parse_try(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        let mut children = vec![self.parse_block()];
        while self.at_keyword("catch") {
            let catch_start = self.cur_start();
            self.bump();
            self.expect(LexKind::LParen);
            let param = self.parse_catch_parameter();
            self.expect(LexKind::RParen);
            let body = self.parse_block();
            let span = Span::new(catch_start, self.prev_end());
            children.push(self.mk_full(RawKind::Catch, "catch", span, vec![param, body]));
        }
        if self.at_keyword("finally") {
            let finally_start = self.cur_start();
            self.bump();
            let body = self.parse_block();
            let span = Span::new(finally_start, self.prev_end());
            children.push(self.mk_full(RawKind::Finally, "finally", span, vec![body]));
        }
        let end = self.prev_end();
        self.mk_full(RawKind::Try, "try", Span::new(start, end), children)
    }

    /// `[final] [Type (| Type)*] name`
    fn parse_catch_parameter(&mut self) -> RawNodeId {
        let start = self.cur_start();
        let modifiers = self.parse_modifiers();
        let mut children = vec![modifiers];
        let typed = self
            .scan_type(self.pos)
            .is_some_and(|j| matches!(self.tokens.get(j).map(|t| t.kind), Some(LexKind::Ident | LexKind::Pipe)));
        if typed {
            children.push(self.parse_type());
            while self.at_kind(LexKind::Pipe) {
                self.bump();
                children.push(self.parse_type());
            }
        }
        let name = self.parse_name_segment();
        let name_text = self.builder.get(name).text.to_string();
        children.push(name);
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::ParameterDef, &name_text, span, children)
    }

    fn parse_keyword_with_expr(&mut self, kind: RawKind) -> RawNodeId {
        let Some(kw) = self.bump() else {
            return self.sentinel(self.text.len());
        };
        let value = if self.can_start_expression() && !self.at_newline() {
            self.parse_expr()
        } else {
            let at = self.prev_end();
            self.error(Span::empty(at), format!("expecting an expression after '{}'", kw.text));
            self.sentinel(at)
        };
        let span = Span::new(kw.range.start, self.prev_end());
        self.mk_full(kind, &kw.text, span, vec![value])
    }

    fn parse_assert(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        let mut children = vec![self.parse_expr()];
        if self.at_kind(LexKind::Colon) || self.at_kind(LexKind::Comma) {
            self.bump();
            children.push(self.parse_expr());
        }
        let end = self.prev_end();
        self.mk_full(RawKind::Assert, "assert", Span::new(start, end), children)
    }

    /// `return [expr]`.
    fn parse_return(&mut self) -> RawNodeId {
        let Some(kw) = self.bump() else {
            return self.sentinel(self.text.len());
        };
        let mut children = Vec::new();
        if !self.at_newline() && self.can_start_expression() {
            children.push(self.parse_expr());
        } else {
            self.virtual_semi(&kw);
        }
        let span = Span::new(kw.range.start, self.prev_end());
        self.mk_full(RawKind::Return, "return", span, children)
    }

    /// A bare jump keyword directly followed by `}` on the same line, outside
    /// closures, is terminated by a synthesized `;`.
    fn virtual_semi(&mut self, kw: &Token) {
        if self.closure_depth == 0 && self.at_kind(LexKind::RBrace) && !self.at_newline() {
            let at = kw.range.end;
            self.edits.push(TokenEdit::insert(at, TokenKind::Semi));
            self.error(
                Span::empty(at),
                format!("expecting ';' after '{}'", kw.text),
            );
        }
    }

    fn parse_jump(&mut self, kind: RawKind) -> RawNodeId {
        let Some(kw) = self.bump() else {
            return self.sentinel(self.text.len());
        };
        let mut children = Vec::new();
        if let Some(tok) = self.peek().cloned() {
            if tok.kind == LexKind::Ident && !tok.newline_before && !is_reserved(&tok.text) {
                self.bump();
                children.push(self.leaf(RawKind::Ident, &tok));
            }
        }
        if children.is_empty() {
            self.virtual_semi(&kw);
        }
        let span = Span::new(kw.range.start, self.prev_end());
        self.mk_full(kind, &kw.text, span, children)
    }

    fn parse_synchronized(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        let lock = self.parse_paren_expr();
        let body = self.parse_block();
        let end = self.prev_end();
        self.mk_full(
            RawKind::Synchronized,
            "synchronized",
            Span::new(start, end),
            vec![lock, body],
        )
    }

    fn parse_ctor_call(&mut self) -> RawNodeId {
        let Some(kw) = self.bump() else {
            return self.sentinel(self.text.len());
        };
        let kind = if kw.text == "this" {
            RawKind::CtorCall
        } else {
            RawKind::SuperCtorCall
        };
        let args = self.parse_arguments();
        let span = Span::new(kw.range.start, self.prev_end());
        self.mk_full(kind, &kw.text, span, vec![args])
    }

    fn parse_labeled(&mut self) -> RawNodeId {
        let Some(label) = self.bump() else {
            return self.sentinel(self.text.len());
        };
        self.bump(); // ':'
        let label_node = self.leaf(RawKind::Ident, &label);
        let body = self.parse_statement();
        let span = Span::new(label.range.start, self.prev_end());
        self.mk_full(RawKind::LabeledStat, &label.text, span, vec![label_node, body])
    }

    // --- declarations -------------------------------------------------------

    fn decl_start(&self) -> DeclStart {
        let mut i = self.pos;
        let mut had_modifiers = false;
        loop {
            let Some(tok) = self.tokens.get(i) else {
                return DeclStart::None;
            };
            match tok.kind {
                LexKind::At if self.tokens.get(i + 1).is_some_and(|t| t.text == "interface") => {
                    return DeclStart::Type;
                }
                LexKind::At => {
                    had_modifiers = true;
                    i = self.skip_annotation_tokens(i);
                }
                LexKind::Ident
                    if MODIFIER_KEYWORDS.contains(&tok.text.as_str())
                        && !(tok.text == "synchronized"
                            && self.tokens.get(i + 1).is_some_and(|t| t.kind == LexKind::LParen)) =>
                {
                    had_modifiers = true;
                    i += 1;
                }
                _ => break,
            }
        }
        let Some(tok) = self.tokens.get(i) else {
            return DeclStart::None;
        };
        if tok.kind == LexKind::Ident
            && matches!(tok.text.as_str(), "class" | "interface" | "enum" | "trait")
        {
            return DeclStart::Type;
        }
        if had_modifiers {
            return DeclStart::Member;
        }
        if tok.kind == LexKind::Lt {
            return DeclStart::Member;
        }
        match self.scan_type(i) {
            Some(j)
                if self.looks_like_type(i, j)
                    && self
                        .tokens
                        .get(j)
                        .is_some_and(|t| t.kind == LexKind::Ident && !is_reserved(&t.text)) =>
            {
                DeclStart::Member
            }
            _ => DeclStart::None,
        }
    }

    /// Index just past an annotation starting at `i` (the `@`).
    fn skip_annotation_tokens(&self, mut i: usize) -> usize {
        i += 1;
        while self.tokens.get(i).is_some_and(|t| t.kind == LexKind::Ident) {
            i += 1;
            if self.tokens.get(i).is_some_and(|t| t.kind == LexKind::Dot) {
                i += 1;
            } else {
                break;
            }
        }
        if self.tokens.get(i).is_some_and(|t| t.kind == LexKind::LParen) {
            let mut depth = 0usize;
            while let Some(tok) = self.tokens.get(i) {
                match tok.kind {
                    LexKind::LParen => depth += 1,
                    LexKind::RParen => {
                        depth -= 1;
                        if depth == 0 {
                            return i + 1;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
        }
        i
    }

    /// Scan a type reference starting at token `i`; returns the index just
    /// past it.
    fn scan_type(&self, mut i: usize) -> Option<usize> {
        let first = self.tokens.get(i)?;
        if first.kind != LexKind::Ident || is_reserved(&first.text) {
            return None;
        }
        i += 1;
        while self.tokens.get(i).is_some_and(|t| t.kind == LexKind::Dot)
            && self.tokens.get(i + 1).is_some_and(|t| t.kind == LexKind::Ident)
        {
            i += 2;
        }
        if self.tokens.get(i).is_some_and(|t| t.kind == LexKind::Lt) {
            let mut depth = 0usize;
            loop {
                let tok = self.tokens.get(i)?;
                match tok.kind {
                    LexKind::Lt => depth += 1,
                    LexKind::Gt => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    LexKind::Ident
                    | LexKind::Dot
                    | LexKind::Comma
                    | LexKind::Question
                    | LexKind::Amp
                    | LexKind::LBracket
                    | LexKind::RBracket => {}
                    _ => return None,
                }
                i += 1;
            }
        }
        while self.tokens.get(i).is_some_and(|t| t.kind == LexKind::LBracket)
            && self.tokens.get(i + 1).is_some_and(|t| t.kind == LexKind::RBracket)
        {
            i += 2;
        }
        Some(i)
    }

    /// Lowercase single identifiers are commands or variables, not types.
    fn looks_like_type(&self, start: usize, end: usize) -> bool {
        if end - start > 1 {
            return true;
        }
        self.tokens.get(start).is_some_and(|t| {
            PRIMITIVES.contains(&t.text.as_str())
                || t.text.chars().next().is_some_and(char::is_uppercase)
        })
    }

    fn parse_modifiers(&mut self) -> RawNodeId {
        let start = self.cur_start();
        let mut children = Vec::new();
        loop {
            let Some(tok) = self.peek().cloned() else {
                break;
            };
            match tok.kind {
                LexKind::At if !self.nth_is_keyword(1, "interface") => {
                    children.push(self.parse_annotation());
                }
                LexKind::Ident
                    if MODIFIER_KEYWORDS.contains(&tok.text.as_str())
                        && !(tok.text == "synchronized" && self.nth_kind(1) == Some(LexKind::LParen)) =>
                {
                    self.bump();
                    children.push(self.leaf(RawKind::Modifier, &tok));
                }
                _ => break,
            }
        }
        let span = if children.is_empty() {
            Span::empty(start)
        } else {
            Span::new(start, self.prev_end())
        };
        self.mk_full(RawKind::Modifiers, "", span, children)
    }

    fn parse_annotation(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump(); // '@'
        let name = self.parse_qualified_name();
        let text = self.dotted_text(name);
        let mut children = vec![name];
        if self.at_kind(LexKind::LParen) && !self.at_newline() {
            self.bump();
            while !self.is_eof() && !self.at_kind(LexKind::RParen) {
                let pair_start = self.cur_start();
                let named = self.at_kind(LexKind::Ident) && self.nth_kind(1) == Some(LexKind::Eq);
                let key = if named {
                    let tok = self.bump();
                    self.bump();
                    match tok {
                        Some(tok) => self.leaf(RawKind::Ident, &tok),
                        None => self.missing_ident(pair_start),
                    }
                } else {
                    self.mk_full(RawKind::Ident, "value", Span::empty(pair_start), Vec::new())
                };
                let value = self.parse_expr();
                let span = Span::new(pair_start, self.prev_end());
                children.push(self.mk_full(
                    RawKind::AnnotationMemberValuePair,
                    "",
                    span,
                    vec![key, value],
                ));
                if self.at_kind(LexKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect(LexKind::RParen);
        }
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::Annotation, &text, span, children)
    }

    fn parse_type(&mut self) -> RawNodeId {
        let start = self.cur_start();
        let name = self.parse_qualified_name();
        let text = self.dotted_text(name);
        let mut children = vec![name];
        if self.at_kind(LexKind::Lt) {
            children.push(self.parse_type_arguments());
        }
        while self.at_kind(LexKind::LBracket) && self.nth_kind(1) == Some(LexKind::RBracket) {
            let lb = self.cur_start();
            self.bump();
            self.bump();
            let span = Span::new(lb, self.prev_end());
            children.push(self.mk_full(RawKind::ArrayDeclarator, "[", span, Vec::new()));
        }
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::Type, &text, span, children)
    }

    fn parse_type_arguments(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump(); // '<'
        let mut args = Vec::new();
        while !self.is_eof() && !self.at_kind(LexKind::Gt) {
            let arg_start = self.cur_start();
            let arg = if self.at_kind(LexKind::Question) {
                self.bump();
                let (bound_kind, bound) = if self.at_keyword("extends") || self.at_keyword("super") {
                    let kw = self.bump().map(|t| t.text).unwrap_or_default();
                    (kw, vec![self.parse_type()])
                } else {
                    (String::new(), Vec::new())
                };
                let span = Span::new(arg_start, self.prev_end());
                self.mk_full(RawKind::Wildcard, &bound_kind, span, bound)
            } else if self.at_kind(LexKind::Ident) {
                let ty = self.parse_type();
                let span = self.extent(ty);
                self.mk_full(RawKind::TypeArgument, "", span, vec![ty])
            } else {
                self.unexpected_here();
                self.skip_token();
                continue;
            };
            args.push(arg);
            if self.at_kind(LexKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(LexKind::Gt);
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::TypeArguments, "", span, args)
    }

    fn parse_type_parameters(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump(); // '<'
        let mut params = Vec::new();
        while self.at_kind(LexKind::Ident) {
            let param_start = self.cur_start();
            let name = self.parse_name_segment();
            let text = self.builder.get(name).text.to_string();
            let mut children = vec![name];
            if self.at_keyword("extends") {
                let bounds_start = self.cur_start();
                self.bump();
                let mut bounds = vec![self.parse_type()];
                while self.at_kind(LexKind::Amp) {
                    self.bump();
                    bounds.push(self.parse_type());
                }
                let span = Span::new(bounds_start, self.prev_end());
                children.push(self.mk_full(RawKind::TypeUpperBounds, "", span, bounds));
            }
            let span = Span::new(param_start, self.prev_end());
            params.push(self.mk_full(RawKind::TypeParameter, &text, span, children));
            if self.at_kind(LexKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(LexKind::Gt);
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::TypeParameters, "", span, params)
    }

    /// Declarations: types, methods, constructors and variables. `member_of`
    /// names the enclosing type when parsing a type body.
    fn parse_declaration(&mut self, out: &mut Vec<RawNodeId>, member_of: Option<&str>) {
        let start = self.cur_start();
        let modifiers = self.parse_modifiers();

        if self.at_keyword("class")
            || self.at_keyword("interface")
            || self.at_keyword("enum")
            || self.at_keyword("trait")
            || (self.at_kind(LexKind::At) && self.nth_is_keyword(1, "interface"))
        {
            out.push(self.parse_type_def(modifiers, start));
            return;
        }

        let type_params = if self.at_kind(LexKind::Lt) {
            Some(self.parse_type_parameters())
        } else {
            None
        };

        if let Some(owner) = member_of {
            if self.at_keyword(owner) && self.nth_kind(1) == Some(LexKind::LParen) {
                out.push(self.parse_constructor(modifiers, start, owner));
                return;
            }
        }

        let untyped = self.at_kind(LexKind::Ident)
            && (matches!(
                self.nth_kind(1),
                Some(LexKind::LParen | LexKind::Eq | LexKind::Comma | LexKind::Semi | LexKind::RBrace)
                    | None
            ) || self.peek_n(1).is_some_and(|t| t.newline_before));
        let ty = if untyped {
            None
        } else if self.at_kind(LexKind::Ident) {
            Some(self.parse_type())
        } else {
            None
        };

        let name = self.parse_name_segment();
        if self.at_kind(LexKind::LParen) {
            out.push(self.parse_method(type_params, modifiers, ty, name, start));
            return;
        }
        if let Some(type_params) = type_params {
            let span = self.extent(type_params);
            self.error(span, "type parameters are only allowed on methods and types");
        }
        self.parse_variable_defs(out, modifiers, ty, name, start);
    }

    fn parse_variable_defs(
        &mut self,
        out: &mut Vec<RawNodeId>,
        modifiers: RawNodeId,
        ty: Option<RawNodeId>,
        mut name: RawNodeId,
        start: usize,
    ) {
        let mut first = true;
        loop {
            let mut children = if first {
                vec![modifiers]
            } else {
                vec![self.duplicate(modifiers)]
            };
            if let Some(ty) = ty {
                children.push(if first { ty } else { self.duplicate(ty) });
            }
            let name_text = self.builder.get(name).text.to_string();
            let decl_start = if first { start } else { self.extent(name).start };
            children.push(name);
            if self.at_kind(LexKind::Eq) {
                let Some(eq) = self.bump() else {
                    break;
                };
                let value = if self.can_start_expression() && !self.at_newline() {
                    self.parse_expr()
                } else {
                    self.error(Span::empty(eq.range.end), "expecting an expression after '='");
                    self.missing_ident(eq.range.end)
                };
                let span = Span::new(eq.range.start, self.extent(value).end);
                children.push(self.mk_full(RawKind::Assign, "=", span, vec![value]));
            }
            let span = Span::new(decl_start, self.prev_end());
            out.push(self.mk_full(RawKind::VariableDef, &name_text, span, children));
            first = false;

            if self.at_kind(LexKind::Comma) && self.nth_kind(1) == Some(LexKind::Ident) {
                self.bump();
                name = self.parse_name_segment();
            } else {
                break;
            }
        }
    }

    fn parse_method(
        &mut self,
        type_params: Option<RawNodeId>,
        modifiers: RawNodeId,
        ty: Option<RawNodeId>,
        name: RawNodeId,
        start: usize,
    ) -> RawNodeId {
        let name_text = self.builder.get(name).text.to_string();
        let mut children = Vec::new();
        children.extend(type_params);
        children.push(modifiers);
        children.extend(ty);
        children.push(name);
        children.push(self.parse_parameters());
        if self.at_keyword("throws") {
            children.push(self.parse_throws());
        }
        if self.at_kind(LexKind::LBrace) {
            children.push(self.parse_block());
        } else if self.at_keyword("default") {
            self.bump();
            children.push(self.parse_expr());
        }
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::MethodDef, &name_text, span, children)
    }

    fn parse_constructor(&mut self, modifiers: RawNodeId, start: usize, owner: &str) -> RawNodeId {
        self.bump(); // name
        let mut children = vec![modifiers, self.parse_parameters()];
        if self.at_keyword("throws") {
            children.push(self.parse_throws());
        }
        if self.at_kind(LexKind::LBrace) {
            children.push(self.parse_block());
        } else {
            let at = self.prev_end();
            self.expect(LexKind::LBrace);
            self.edits.push(TokenEdit::insert(at, TokenKind::RBrace));
            children.push(self.mk_full(RawKind::Slist, "", Span::empty(at), Vec::new()));
        }
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::CtorIdent, owner, span, children)
    }

    fn parse_throws(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        let mut types = vec![self.parse_type()];
        while self.at_kind(LexKind::Comma) {
            self.bump();
            types.push(self.parse_type());
        }
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::ThrowsClause, "throws", span, types)
    }

    fn parse_parameters(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.expect(LexKind::LParen);
        let mut params = Vec::new();
        while !self.is_eof() && !self.at_kind(LexKind::RParen) {
            let end = self.parameter_name_index();
            params.push(self.parse_parameter_until(end));
            if self.at_kind(LexKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(LexKind::RParen);
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::Parameters, "", span, params)
    }

    /// Token index just past the parameter name starting at the cursor.
    fn parameter_name_index(&self) -> usize {
        let mut i = self.pos;
        while let Some(tok) = self.tokens.get(i) {
            match tok.kind {
                LexKind::At => i = self.skip_annotation_tokens(i),
                LexKind::Ident if MODIFIER_KEYWORDS.contains(&tok.text.as_str()) => i += 1,
                _ => break,
            }
        }
        if let Some(j) = self.scan_type(i) {
            let j = if self.tokens.get(j).is_some_and(|t| t.kind == LexKind::DotDot)
                && self.tokens.get(j + 1).is_some_and(|t| t.kind == LexKind::Dot)
            {
                j + 2
            } else {
                j
            };
            if self.tokens.get(j).is_some_and(|t| t.kind == LexKind::Ident) {
                return j + 1;
            }
        }
        i + 1
    }

    /// A parameter whose name token ends just before token index `end`.
    ///
    /// Parameter nodes report their end at the start of the following token,
    /// trailing whitespace included.
    fn parse_parameter_until(&mut self, end: usize) -> RawNodeId {
        let start = self.cur_start();
        let modifiers = self.parse_modifiers();
        let mut children = vec![modifiers];
        let mut kind = RawKind::ParameterDef;
        if self.pos + 1 < end {
            children.push(self.parse_type());
            if self.at_kind(LexKind::DotDot) && self.nth_kind(1) == Some(LexKind::Dot) {
                self.bump();
                self.bump();
                kind = RawKind::VariableParameterDef;
            }
        }
        let name = self.parse_name_segment();
        let name_text = self.builder.get(name).text.to_string();
        children.push(name);
        if self.at_kind(LexKind::Eq) {
            let eq_start = self.cur_start();
            self.bump();
            let value = self.parse_expr();
            let span = Span::new(eq_start, self.extent(value).end);
            children.push(self.mk_full(RawKind::Assign, "=", span, vec![value]));
        }
        let extent = Span::new(start, self.prev_end());
        let reported = Span::new(start, self.cur_start());
        self.mk(kind, &name_text, reported, extent, children)
    }

    fn parse_type_def(&mut self, modifiers: RawNodeId, start: usize) -> RawNodeId {
        let kind = if self.at_kind(LexKind::At) {
            self.bump();
            RawKind::AnnotationDef
        } else {
            match self.peek().map(|t| t.text.as_str()) {
                Some("interface") => RawKind::InterfaceDef,
                Some("enum") => RawKind::EnumDef,
                Some("trait") => RawKind::TraitDef,
                _ => RawKind::ClassDef,
            }
        };
        self.bump(); // keyword
        let name = self.parse_name_segment();
        let name_text = self.builder.get(name).text.to_string();
        let mut children = vec![modifiers, name];
        if self.at_kind(LexKind::Lt) {
            children.push(self.parse_type_parameters());
        }
        if self.at_keyword("extends") {
            children.push(self.parse_type_list(RawKind::ExtendsClause));
        }
        if self.at_keyword("implements") {
            children.push(self.parse_type_list(RawKind::ImplementsClause));
        }
        children.push(self.parse_type_body(kind == RawKind::EnumDef, &name_text));
        let span = Span::new(start, self.prev_end());
        self.mk_full(kind, &name_text, span, children)
    }

    fn parse_type_list(&mut self, kind: RawKind) -> RawNodeId {
        let start = self.cur_start();
        self.bump();
        let mut types = vec![self.parse_type()];
        while self.at_kind(LexKind::Comma) {
            self.bump();
            types.push(self.parse_type());
        }
        let span = Span::new(start, self.prev_end());
        self.mk_full(kind, "", span, types)
    }

    fn parse_type_body(&mut self, is_enum: bool, type_name: &str) -> RawNodeId {
        let start = self.cur_start();
        let mut members = Vec::new();
        if self.expect(LexKind::LBrace).is_none() {
            let at = self.prev_end();
            self.edits.push(TokenEdit::insert(at, TokenKind::RBrace));
            return self.mk_full(RawKind::ObjBlock, "", Span::empty(at), members);
        }
        if is_enum {
            self.parse_enum_constants(&mut members);
        }
        loop {
            self.skip_semis();
            if self.is_eof() || self.at_kind(LexKind::RBrace) {
                break;
            }
            let before = self.pos;
            if self.at_keyword("static") && self.nth_kind(1) == Some(LexKind::LBrace) {
                let init_start = self.cur_start();
                self.bump();
                let body = self.parse_block();
                let span = Span::new(init_start, self.prev_end());
                members.push(self.mk_full(RawKind::StaticInit, "", span, vec![body]));
            } else if self.at_kind(LexKind::LBrace) {
                let body = self.parse_block();
                let span = self.extent(body);
                members.push(self.mk_full(RawKind::InstanceInit, "", span, vec![body]));
            } else if self.decl_start() == DeclStart::None && !self.at_kind(LexKind::Ident) {
                self.unexpected_here();
                self.skip_token();
                continue;
            } else {
                self.parse_declaration(&mut members, Some(type_name));
            }
            self.finish_statement(true);
            self.ensure_progress(before);
        }
        self.expect(LexKind::RBrace);
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::ObjBlock, "", span, members)
    }

    fn parse_enum_constants(&mut self, out: &mut Vec<RawNodeId>) {
        loop {
            let at_constant = self.at_kind(LexKind::Ident)
                && !MODIFIER_KEYWORDS.contains(&self.peek().map(|t| t.text.as_str()).unwrap_or(""))
                && (matches!(
                    self.nth_kind(1),
                    Some(LexKind::Comma | LexKind::LParen | LexKind::Semi | LexKind::RBrace) | None
                ) || self.peek_n(1).is_some_and(|t| t.newline_before));
            if !at_constant {
                return;
            }
            let start = self.cur_start();
            let annotations = self.mk_full(RawKind::Modifiers, "", Span::empty(start), Vec::new());
            let name = self.parse_name_segment();
            let text = self.builder.get(name).text.to_string();
            let mut children = vec![annotations, name];
            if self.at_kind(LexKind::LParen) {
                children.push(self.parse_arguments());
            }
            if self.at_kind(LexKind::LBrace) {
                let body_start = self.cur_start();
                self.error(
                    Span::empty(body_start),
                    "enum constant bodies are not supported",
                );
                self.skip_balanced();
            }
            let span = Span::new(start, self.prev_end());
            out.push(self.mk_full(RawKind::EnumConstantDef, &text, span, children));
            if self.at_kind(LexKind::Comma) {
                self.bump();
                continue;
            }
            if self.at_kind(LexKind::Semi) {
                self.bump();
            }
            return;
        }
    }

    /// Skip a balanced `{...}`, `(...)` or `[...]` group as garbage.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek_kind() {
            match kind {
                LexKind::LBrace | LexKind::LParen | LexKind::LBracket => depth += 1,
                LexKind::RBrace | LexKind::RParen | LexKind::RBracket => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            self.skip_token();
            if depth == 0 {
                break;
            }
        }
    }

    // --- expressions --------------------------------------------------------

    fn can_start_expression(&self) -> bool {
        let Some(tok) = self.peek() else {
            return false;
        };
        match tok.kind {
            LexKind::Ident => !is_reserved(&tok.text),
            LexKind::IntLiteral
            | LexKind::LongLiteral
            | LexKind::BigIntLiteral
            | LexKind::FloatLiteral
            | LexKind::DoubleLiteral
            | LexKind::BigDecimalLiteral
            | LexKind::StringLiteral
            | LexKind::GStringStart
            | LexKind::LParen
            | LexKind::LBracket
            | LexKind::LBrace
            | LexKind::Minus
            | LexKind::Plus
            | LexKind::Bang
            | LexKind::Tilde
            | LexKind::PlusPlus
            | LexKind::MinusMinus => true,
            _ => false,
        }
    }

    fn parse_expr(&mut self) -> RawNodeId {
        if self.depth > MAX_NESTING {
            return self.too_deep();
        }
        self.depth += 1;
        let id = self.parse_assignment();
        self.depth -= 1;
        id
    }

    /// Skip an over-deep subexpression, leaving a sentinel behind.
    fn too_deep(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.error(Span::empty(start), "nesting is too deep");
        let mut depth = 0usize;
        let mut consumed = false;
        while let Some(tok) = self.peek() {
            if consumed && depth == 0 && tok.newline_before {
                break;
            }
            match tok.kind {
                LexKind::LParen | LexKind::LBracket | LexKind::LBrace => depth += 1,
                LexKind::RParen | LexKind::RBracket | LexKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                LexKind::Comma | LexKind::Semi if depth == 0 => break,
                _ => {}
            }
            self.skip_token();
            consumed = true;
        }
        self.sentinel(start)
    }

    fn parse_assignment(&mut self) -> RawNodeId {
        let lhs = self.parse_ternary();
        let kind = match self.peek_kind() {
            Some(LexKind::Eq) => RawKind::Assign,
            Some(LexKind::PlusEq) => RawKind::PlusAssign,
            Some(LexKind::MinusEq) => RawKind::MinusAssign,
            Some(LexKind::StarEq) => RawKind::StarAssign,
            Some(LexKind::SlashEq) => RawKind::DivAssign,
            Some(LexKind::PercentEq) => RawKind::ModAssign,
            _ => return lhs,
        };
        if self.at_newline() {
            return lhs;
        }
        let Some(op) = self.bump() else {
            return lhs;
        };
        let rhs = if self.can_start_expression() && !self.at_newline() {
            self.parse_expr()
        } else {
            self.error(
                Span::empty(op.range.end),
                format!("expecting an expression after '{}'", op.text),
            );
            self.missing_ident(op.range.end)
        };
        let extent = self.extent(lhs).cover(self.extent(rhs));
        self.mk(kind, &op.text, op.range, extent, vec![lhs, rhs])
    }

    fn parse_ternary(&mut self) -> RawNodeId {
        let cond = self.parse_binary(0);
        if self.at_newline() {
            return cond;
        }
        match self.peek_kind() {
            Some(LexKind::Question) => {
                let Some(q) = self.bump() else {
                    return cond;
                };
                let then = self.parse_operand_after(&q);
                self.expect(LexKind::Colon);
                let otherwise = self.parse_ternary_operand();
                let extent = self.extent(cond).cover(self.extent(otherwise));
                self.mk(RawKind::Question, "?", q.range, extent, vec![cond, then, otherwise])
            }
            Some(LexKind::Elvis) => {
                let Some(op) = self.bump() else {
                    return cond;
                };
                let otherwise = self.parse_ternary_operand();
                let extent = self.extent(cond).cover(self.extent(otherwise));
                self.mk(RawKind::Elvis, "?:", op.range, extent, vec![cond, otherwise])
            }
            _ => cond,
        }
    }

    fn parse_ternary_operand(&mut self) -> RawNodeId {
        if self.can_start_expression() {
            if self.depth > MAX_NESTING {
                return self.too_deep();
            }
            self.depth += 1;
            let id = self.parse_ternary();
            self.depth -= 1;
            id
        } else {
            let at = self.prev_end();
            self.error(Span::empty(at), "expecting an expression");
            self.sentinel(at)
        }
    }

    fn parse_operand_after(&mut self, op: &Token) -> RawNodeId {
        if self.can_start_expression() {
            self.parse_expr()
        } else {
            self.error(
                Span::empty(op.range.end),
                format!("expecting an expression after '{}'", op.text),
            );
            self.sentinel(op.range.end)
        }
    }

    /// Binary operator at the cursor: kind, precedence and token count.
    fn binary_op(&self) -> Option<(RawKind, u8, usize)> {
        let tok = self.peek()?;
        if tok.newline_before {
            return None;
        }
        let adjacent = |kind: LexKind| {
            self.peek_n(1)
                .is_some_and(|next| next.kind == kind && next.range.start == tok.range.end)
        };
        let op = match tok.kind {
            LexKind::PipePipe => (RawKind::LogicalOr, 1, 1),
            LexKind::AmpAmp => (RawKind::LogicalAnd, 2, 1),
            LexKind::Pipe => (RawKind::BitOr, 3, 1),
            LexKind::Caret => (RawKind::BitXor, 4, 1),
            LexKind::Amp => (RawKind::BitAnd, 5, 1),
            LexKind::EqEq => (RawKind::Equal, 6, 1),
            LexKind::BangEq => (RawKind::NotEqual, 6, 1),
            LexKind::Spaceship => (RawKind::CompareTo, 6, 1),
            LexKind::RegexFind => (RawKind::RegexFind, 6, 1),
            LexKind::RegexMatch => (RawKind::RegexMatch, 6, 1),
            LexKind::Lt if adjacent(LexKind::Lt) => (RawKind::ShiftLeft, 8, 2),
            LexKind::Gt if adjacent(LexKind::Gt) => (RawKind::ShiftRight, 8, 2),
            LexKind::Lt => (RawKind::Lt, 7, 1),
            LexKind::Le => (RawKind::Le, 7, 1),
            LexKind::Gt => (RawKind::Gt, 7, 1),
            LexKind::Ge => (RawKind::Ge, 7, 1),
            LexKind::Ident if tok.text == "instanceof" => (RawKind::InstanceOf, 7, 1),
            LexKind::Ident if tok.text == "as" => (RawKind::As, 7, 1),
            LexKind::Ident if tok.text == "in" => (RawKind::In, 7, 1),
            LexKind::DotDot => (RawKind::RangeInclusive, 8, 1),
            LexKind::DotDotLt => (RawKind::RangeExclusive, 8, 1),
            LexKind::Plus => (RawKind::Plus, 9, 1),
            LexKind::Minus => (RawKind::Minus, 9, 1),
            LexKind::Star => (RawKind::Star, 10, 1),
            LexKind::Slash => (RawKind::Div, 10, 1),
            LexKind::Percent => (RawKind::Mod, 10, 1),
            LexKind::StarStar => (RawKind::StarStar, 11, 1),
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, min_prec: u8) -> RawNodeId {
        let mut lhs = self.parse_unary();
        loop {
            let Some((kind, prec, width)) = self.binary_op() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            let op_start = self.cur_start();
            let mut op_text = String::new();
            for _ in 0..width {
                if let Some(tok) = self.bump() {
                    op_text.push_str(&tok.text);
                }
            }
            let op_span = Span::new(op_start, self.prev_end());
            let rhs = if matches!(kind, RawKind::InstanceOf | RawKind::As) {
                if self.at_kind(LexKind::Ident) {
                    self.parse_type()
                } else {
                    self.error(Span::empty(op_span.end), "expecting a type");
                    self.missing_ident(op_span.end)
                }
            } else if self.can_start_expression() {
                // `**` is right-associative.
                let next_min = if kind == RawKind::StarStar { prec } else { prec + 1 };
                if self.depth > MAX_NESTING {
                    self.too_deep()
                } else {
                    self.depth += 1;
                    let rhs = self.parse_binary(next_min);
                    self.depth -= 1;
                    rhs
                }
            } else {
                self.error(
                    Span::empty(op_span.end),
                    format!("expecting an expression after '{op_text}'"),
                );
                self.edits
                    .push(TokenEdit::insert(op_span.end, TokenKind::Identifier));
                self.sentinel(op_span.end)
            };
            let extent = self.extent(lhs).cover(self.extent(rhs));
            lhs = self.mk(kind, &op_text, op_span, extent, vec![lhs, rhs]);
        }
        lhs
    }

    fn parse_unary(&mut self) -> RawNodeId {
        if self.depth > MAX_NESTING {
            return self.too_deep();
        }
        let kind = match self.peek_kind() {
            Some(LexKind::Bang) => Some(RawKind::LogicalNot),
            Some(LexKind::Tilde) => Some(RawKind::BitNot),
            Some(LexKind::Minus) => Some(RawKind::UnaryMinus),
            Some(LexKind::Plus) => Some(RawKind::UnaryPlus),
            Some(LexKind::PlusPlus) => Some(RawKind::Inc),
            Some(LexKind::MinusMinus) => Some(RawKind::Dec),
            _ => None,
        };
        if let Some(kind) = kind {
            let Some(op) = self.bump() else {
                return self.sentinel(self.text.len());
            };
            self.depth += 1;
            let operand = if self.can_start_expression() {
                self.parse_unary()
            } else {
                self.error(
                    Span::empty(op.range.end),
                    format!("expecting an expression after '{}'", op.text),
                );
                self.sentinel(op.range.end)
            };
            self.depth -= 1;
            let extent = Span::new(op.range.start, self.extent(operand).end);
            return self.mk(kind, &op.text, op.range, extent, vec![operand]);
        }

        if self.looks_like_cast() {
            let start = self.cur_start();
            self.bump();
            let ty = self.parse_type();
            self.expect(LexKind::RParen);
            let reported = Span::new(start, self.prev_end());
            self.depth += 1;
            let operand = self.parse_unary();
            self.depth -= 1;
            let extent = Span::new(start, self.extent(operand).end);
            return self.mk(RawKind::Typecast, "(", reported, extent, vec![ty, operand]);
        }

        self.parse_postfix()
    }

    fn looks_like_cast(&self) -> bool {
        if !self.at_kind(LexKind::LParen) {
            return false;
        }
        let start = self.pos + 1;
        let Some(end) = self.scan_type(start) else {
            return false;
        };
        if !self.tokens.get(end).is_some_and(|t| t.kind == LexKind::RParen) {
            return false;
        }
        let primitive = end - start == 1
            && self
                .tokens
                .get(start)
                .is_some_and(|t| PRIMITIVES.contains(&t.text.as_str()));
        if !primitive && !self.looks_like_type(start, end) {
            return false;
        }
        let Some(next) = self.tokens.get(end + 1) else {
            return false;
        };
        match next.kind {
            LexKind::Ident => !is_reserved(&next.text),
            LexKind::IntLiteral
            | LexKind::LongLiteral
            | LexKind::BigIntLiteral
            | LexKind::FloatLiteral
            | LexKind::DoubleLiteral
            | LexKind::BigDecimalLiteral
            | LexKind::StringLiteral
            | LexKind::GStringStart
            | LexKind::LParen
            | LexKind::LBracket
            | LexKind::Bang
            | LexKind::Tilde => true,
            LexKind::Minus | LexKind::Plus => primitive,
            _ => false,
        }
    }

    fn parse_postfix(&mut self) -> RawNodeId {
        let mut expr = self.parse_primary();
        loop {
            let Some(tok) = self.peek().cloned() else {
                break;
            };
            match tok.kind {
                LexKind::Dot | LexKind::SafeDot | LexKind::SpreadDot | LexKind::AttrDot => {
                    self.bump();
                    expr = self.parse_property(expr, tok.kind);
                }
                LexKind::MemberPointer => {
                    self.bump();
                    let name = self.parse_name_segment();
                    let span = self.extent(expr).cover(self.extent(name));
                    expr = self.mk_full(RawKind::MemberPointer, ".&", span, vec![expr, name]);
                }
                LexKind::LParen if !tok.newline_before => {
                    let args = self.parse_arguments();
                    expr = self.finish_call(expr, args);
                }
                LexKind::LBrace if !tok.newline_before && self.is_callable(expr) => {
                    let start = self.cur_start();
                    let args = self.mk_full(RawKind::Elist, "", Span::empty(start), Vec::new());
                    expr = self.finish_call(expr, args);
                }
                LexKind::LBracket if !tok.newline_before => {
                    self.bump();
                    let index = if self.at_kind(LexKind::RBracket) {
                        self.error(Span::empty(tok.range.end), "expecting an index expression");
                        self.sentinel(tok.range.end)
                    } else {
                        self.parse_expr()
                    };
                    self.expect(LexKind::RBracket);
                    let reported = Span::new(tok.range.start, self.prev_end());
                    let extent = Span::new(self.extent(expr).start, self.prev_end());
                    expr = self.mk(RawKind::IndexOp, "[", reported, extent, vec![expr, index]);
                }
                LexKind::PlusPlus | LexKind::MinusMinus if !tok.newline_before => {
                    self.bump();
                    let kind = if tok.kind == LexKind::PlusPlus {
                        RawKind::PostInc
                    } else {
                        RawKind::PostDec
                    };
                    let extent = Span::new(self.extent(expr).start, tok.range.end);
                    expr = self.mk(kind, &tok.text, tok.range, extent, vec![expr]);
                }
                _ => break,
            }
        }
        expr
    }

    fn is_callable(&self, id: RawNodeId) -> bool {
        let kind = self.builder.get(id).kind;
        (kind == RawKind::Ident && !is_primary_keyword(&self.builder.get(id).text))
            || kind.is_property_access()
            || kind == RawKind::MethodCall
    }

    /// Property access. The reported end runs to the start of the next
    /// token, so trailing whitespace is included.
    fn parse_property(&mut self, object: RawNodeId, op: LexKind) -> RawNodeId {
        let name = match self.peek().cloned() {
            Some(tok) if tok.kind == LexKind::Ident => {
                self.bump();
                self.leaf(RawKind::Ident, &tok)
            }
            Some(tok) if tok.kind == LexKind::StringLiteral => {
                self.bump();
                self.leaf(RawKind::StringLiteral, &tok)
            }
            _ => {
                let at = self.prev_end();
                self.error(Span::empty(at), "expecting a property name");
                self.missing_ident(at)
            }
        };
        let name = if op == LexKind::AttrDot {
            let span = self.extent(name);
            self.mk_full(RawKind::SelectSlot, "@", span, vec![name])
        } else {
            name
        };
        let kind = match op {
            LexKind::SafeDot => RawKind::OptionalDot,
            LexKind::SpreadDot => RawKind::SpreadDot,
            _ => RawKind::Dot,
        };
        let start = self.extent(object).start;
        let extent = Span::new(start, self.extent(name).end);
        let reported = Span::new(start, self.cur_start().max(extent.end));
        self.mk(kind, "", reported, extent, vec![object, name])
    }

    fn finish_call(&mut self, callee: RawNodeId, args: RawNodeId) -> RawNodeId {
        let mut children = vec![callee, args];
        while self.at_kind(LexKind::LBrace) && !self.at_newline() {
            children.push(self.parse_closure());
        }
        let span = Span::new(self.extent(callee).start, self.prev_end());
        self.mk_full(RawKind::MethodCall, "", span, children)
    }

    fn parse_arguments(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.expect(LexKind::LParen);
        let mut args = Vec::new();
        while !self.is_eof() && !self.at_kind(LexKind::RParen) {
            if !self.can_start_expression() && !self.at_kind(LexKind::Star) {
                self.unexpected_here();
                self.skip_token();
                continue;
            }
            args.push(self.parse_argument());
            if self.at_kind(LexKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(LexKind::RParen);
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::Elist, "", span, args)
    }

    /// A call or collection element: `expr`, `key: expr`, `*expr` or `*:expr`.
    fn parse_argument(&mut self) -> RawNodeId {
        let start = self.cur_start();
        if self.at_kind(LexKind::Star) {
            self.bump();
            let (kind, value) = if self.at_kind(LexKind::Colon) {
                self.bump();
                (RawKind::SpreadMapArg, self.parse_expr())
            } else {
                (RawKind::SpreadArg, self.parse_expr())
            };
            let span = Span::new(start, self.extent(value).end);
            return self.mk_full(kind, "*", span, vec![value]);
        }

        let labeled = matches!(
            self.peek_kind(),
            Some(
                LexKind::Ident
                    | LexKind::StringLiteral
                    | LexKind::IntLiteral
                    | LexKind::LongLiteral
                    | LexKind::BigDecimalLiteral
            )
        ) && self.nth_kind(1) == Some(LexKind::Colon);
        if labeled {
            let Some(key_tok) = self.bump() else {
                return self.sentinel(start);
            };
            self.bump(); // ':'
            let key_kind = match key_tok.kind {
                LexKind::Ident => RawKind::Ident,
                LexKind::StringLiteral => RawKind::StringLiteral,
                LexKind::LongLiteral => RawKind::NumLong,
                LexKind::BigDecimalLiteral => RawKind::NumBigDecimal,
                _ => RawKind::NumInt,
            };
            let key = self.leaf(key_kind, &key_tok);
            let value = if self.can_start_expression() {
                self.parse_expr()
            } else {
                let at = self.prev_end();
                self.error(Span::empty(at), "expecting a value after ':'");
                self.sentinel(at)
            };
            let span = Span::new(start, self.extent(value).end);
            return self.mk_full(RawKind::LabeledArg, ":", span, vec![key, value]);
        }

        self.parse_expr()
    }

    fn parse_primary(&mut self) -> RawNodeId {
        let Some(tok) = self.peek().cloned() else {
            let at = self.text.len();
            self.error(Span::empty(at), "unexpected end of file");
            return self.sentinel(at);
        };
        match tok.kind {
            LexKind::Ident => match tok.text.as_str() {
                "this" => self.bump_leaf(RawKind::This, &tok),
                "super" => self.bump_leaf(RawKind::Super, &tok),
                "true" => self.bump_leaf(RawKind::True, &tok),
                "false" => self.bump_leaf(RawKind::False, &tok),
                "null" => self.bump_leaf(RawKind::Null, &tok),
                "new" => self.parse_new(),
                text if is_reserved(text) => self.unexpected_primary(&tok),
                _ => self.bump_leaf(RawKind::Ident, &tok),
            },
            LexKind::IntLiteral => self.bump_leaf(RawKind::NumInt, &tok),
            LexKind::LongLiteral => self.bump_leaf(RawKind::NumLong, &tok),
            LexKind::BigIntLiteral => self.bump_leaf(RawKind::NumBigInt, &tok),
            LexKind::FloatLiteral => self.bump_leaf(RawKind::NumFloat, &tok),
            LexKind::DoubleLiteral => self.bump_leaf(RawKind::NumDouble, &tok),
            LexKind::BigDecimalLiteral => self.bump_leaf(RawKind::NumBigDecimal, &tok),
            LexKind::StringLiteral => self.bump_leaf(RawKind::StringLiteral, &tok),
            LexKind::GStringStart => self.parse_gstring(),
            LexKind::LParen => {
                self.bump();
                let inner = if self.at_kind(LexKind::RParen) {
                    self.error(Span::empty(tok.range.end), "expecting an expression");
                    self.sentinel(tok.range.end)
                } else {
                    self.parse_expr()
                };
                self.expect(LexKind::RParen);
                let span = Span::new(tok.range.start, self.prev_end());
                self.mk_full(RawKind::Expr, "(", span, vec![inner])
            }
            LexKind::LBracket => self.parse_collection(),
            LexKind::LBrace => self.parse_closure(),
            _ => self.unexpected_primary(&tok),
        }
    }

    fn bump_leaf(&mut self, kind: RawKind, tok: &Token) -> RawNodeId {
        self.bump();
        self.leaf(kind, tok)
    }

    /// Closers and separators are left for the caller; anything else is
    /// consumed as garbage.
    fn unexpected_primary(&mut self, tok: &Token) -> RawNodeId {
        self.error(tok.range, format!("unexpected token: {}", tok.text));
        let structural = matches!(
            tok.kind,
            LexKind::RParen
                | LexKind::RBracket
                | LexKind::RBrace
                | LexKind::Semi
                | LexKind::Comma
                | LexKind::Colon
        ) || (tok.kind == LexKind::Ident && is_reserved(&tok.text));
        if structural {
            let at = self.prev_end();
            return self.sentinel(at);
        }
        self.skip_token();
        self.sentinel(tok.range.start)
    }

    fn parse_gstring(&mut self) -> RawNodeId {
        let start = self.cur_start();
        let mut children = Vec::new();
        if let Some(head) = self.bump() {
            children.push(self.leaf(RawKind::StringLiteral, &head));
        }
        loop {
            let value = if self.at_kind(LexKind::LBrace) {
                let lb = self.cur_start();
                self.bump();
                let value = if self.at_kind(LexKind::RBrace) {
                    self.sentinel(lb + 1)
                } else {
                    self.parse_expr()
                };
                self.expect(LexKind::RBrace);
                value
            } else {
                let mut value = self.parse_name_segment();
                while self.at_kind(LexKind::Dot) && self.nth_kind(1) == Some(LexKind::Ident) {
                    self.bump();
                    let segment = self.parse_name_segment();
                    let span = self.extent(value).cover(self.extent(segment));
                    value = self.mk_full(RawKind::Dot, "", span, vec![value, segment]);
                }
                value
            };
            children.push(value);
            match self.peek().cloned() {
                Some(tok) if tok.kind == LexKind::GStringPart => {
                    self.bump();
                    children.push(self.leaf(RawKind::StringLiteral, &tok));
                }
                Some(tok) if tok.kind == LexKind::GStringEnd => {
                    self.bump();
                    children.push(self.leaf(RawKind::StringLiteral, &tok));
                    break;
                }
                _ => {
                    let at = self.prev_end();
                    self.error(Span::empty(at), "unterminated string");
                    break;
                }
            }
        }
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::StringConstructor, "", span, children)
    }

    fn parse_collection(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump(); // '['
        if self.at_kind(LexKind::Colon) && self.nth_kind(1) == Some(LexKind::RBracket) {
            self.bump();
            self.bump();
            let span = Span::new(start, self.prev_end());
            return self.mk_full(RawKind::MapConstructor, "[:]", span, Vec::new());
        }
        let mut elements = Vec::new();
        while !self.is_eof() && !self.at_kind(LexKind::RBracket) {
            if !self.can_start_expression() && !self.at_kind(LexKind::Star) {
                self.unexpected_here();
                self.skip_token();
                continue;
            }
            elements.push(self.parse_argument());
            if self.at_kind(LexKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(LexKind::RBracket);
        let is_map = elements.iter().any(|id| {
            matches!(
                self.builder.get(*id).kind,
                RawKind::LabeledArg | RawKind::SpreadMapArg
            )
        });
        let span = Span::new(start, self.prev_end());
        if is_map {
            self.mk_full(RawKind::MapConstructor, "[", span, elements)
        } else {
            self.mk_full(RawKind::ListConstructor, "[", span, elements)
        }
    }

    fn closure_has_parameters(&self) -> bool {
        let mut i = self.pos + 1;
        while let Some(tok) = self.tokens.get(i) {
            match tok.kind {
                LexKind::Arrow => return true,
                LexKind::Ident
                | LexKind::Comma
                | LexKind::Dot
                | LexKind::DotDot
                | LexKind::Lt
                | LexKind::Gt
                | LexKind::LBracket
                | LexKind::RBracket
                | LexKind::Question => i += 1,
                _ => return false,
            }
        }
        false
    }

    fn parse_closure(&mut self) -> RawNodeId {
        let start = self.cur_start();
        let has_params = self.closure_has_parameters();
        self.bump(); // '{'
        let mut children = Vec::new();
        if has_params {
            let params_start = self.cur_start();
            let mut params = Vec::new();
            while !self.is_eof() && !self.at_kind(LexKind::Arrow) {
                let end = self.parameter_name_index();
                params.push(self.parse_parameter_until(end));
                if self.at_kind(LexKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect(LexKind::Arrow);
            let span = Span::new(params_start, self.prev_end());
            children.push(self.mk_full(RawKind::Parameters, "", span, params));
        }
        self.closure_depth += 1;
        let body = self.parse_block_body();
        self.closure_depth -= 1;
        self.expect(LexKind::RBrace);
        let span = Span::new(start, self.prev_end());
        children.push(self.mk_full(RawKind::Slist, "", span, body));
        self.mk_full(RawKind::ClosableBlock, "{", span, children)
    }

    fn parse_new(&mut self) -> RawNodeId {
        let start = self.cur_start();
        self.bump(); // new
        let type_start = self.cur_start();
        let name = self.parse_qualified_name();
        let text = self.dotted_text(name);
        let mut type_children = vec![name];
        if self.at_kind(LexKind::Lt) {
            type_children.push(self.parse_type_arguments());
        }
        let type_span = Span::new(type_start, self.prev_end());
        let ty = self.mk_full(RawKind::Type, &text, type_span, type_children);
        let mut children = vec![ty];

        if self.at_kind(LexKind::LBracket) {
            while self.at_kind(LexKind::LBracket) {
                let lb = self.cur_start();
                self.bump();
                let size = if self.at_kind(LexKind::RBracket) {
                    Vec::new()
                } else {
                    vec![self.parse_expr()]
                };
                self.expect(LexKind::RBracket);
                let span = Span::new(lb, self.prev_end());
                children.push(self.mk_full(RawKind::ArrayDeclarator, "[", span, size));
            }
        } else if self.at_kind(LexKind::LParen) {
            children.push(self.parse_arguments());
            if self.at_kind(LexKind::LBrace) && !self.at_newline() {
                let at = self.cur_start();
                self.error(Span::empty(at), "anonymous inner classes are not supported");
                self.skip_balanced();
            }
        } else {
            let at = self.prev_end();
            self.expect(LexKind::LParen);
            self.edits.push(TokenEdit::insert(at, TokenKind::RParen));
            children.push(self.mk_full(RawKind::Elist, "", Span::empty(at), Vec::new()));
        }
        let span = Span::new(start, self.prev_end());
        self.mk_full(RawKind::New, "new", span, children)
    }
}

fn collect_postorder(builder: &RawTreeBuilder, id: RawNodeId, out: &mut Vec<RawNodeId>) {
    for child in builder.get(id).children() {
        collect_postorder(builder, *child, out);
    }
    out.push(id);
}

fn edit_kind(kind: LexKind) -> TokenKind {
    match kind {
        LexKind::Semi => TokenKind::Semi,
        LexKind::Comma => TokenKind::Comma,
        LexKind::LParen => TokenKind::LParen,
        LexKind::RParen => TokenKind::RParen,
        LexKind::LBrace => TokenKind::LBrace,
        LexKind::RBrace => TokenKind::RBrace,
        LexKind::LBracket => TokenKind::LBracket,
        LexKind::RBracket => TokenKind::RBracket,
        LexKind::Ident => TokenKind::Identifier,
        _ => TokenKind::Other,
    }
}

fn is_reserved(text: &str) -> bool {
    RESERVED.contains(&text) || MODIFIER_KEYWORDS.contains(&text)
}

fn is_primary_keyword(text: &str) -> bool {
    matches!(text, "this" | "super" | "true" | "false" | "null" | "new")
}
