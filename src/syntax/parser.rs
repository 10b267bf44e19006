use std::collections::{BTreeMap, BTreeSet};

use super::lexer::{Lexeme, Token};
use crate::builtins;
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::tree::{Callee, NodeId, Tree};
use crate::value::{Function, Value};

/// A tree read from source, with its root and named bindings.
#[derive(Clone, Debug)]
pub struct SourceTree {
    pub tree: Tree,
    pub root: NodeId,
    /// `let` bindings by name.
    pub bindings: BTreeMap<String, NodeId>,
    /// Non-fatal diagnostics (unused bindings).
    pub warnings: Vec<Diagnostic>,
}

/// A parsed expression before it is forced into a node. Bare builtin names
/// stay unmaterialized so that calling one embeds the function directly.
enum Operand {
    Node(NodeId),
    Builtin(Function),
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    tree: Tree,
    bindings: BTreeMap<String, (NodeId, Span)>,
    used: BTreeSet<String>,
    diagnostics: Vec<Diagnostic>,
}

type PResult<T> = Result<T, Diagnostic>;

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            tree: Tree::new(),
            bindings: BTreeMap::new(),
            used: BTreeSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn parse_file(mut self) -> Result<SourceTree, Vec<Diagnostic>> {
        let mut root: Option<(NodeId, Span)> = None;
        let mut root_seen = false;

        loop {
            self.skip_newlines();
            if self.at(&Lexeme::Eof) {
                break;
            }
            let start = self.current_span();
            let result = if self.at(&Lexeme::Let) {
                self.parse_let()
            } else {
                root_seen = true;
                self.parse_root(&mut root, start)
            };
            let result = result.and_then(|()| self.expect_end_of_statement());
            if let Err(diag) = result {
                self.diagnostics.push(diag);
                self.synchronize();
            }
        }

        let Some((root, _)) = root else {
            if root_seen {
                return Err(self.diagnostics);
            }
            let end = self.current_span();
            self.diagnostics.push(
                Diagnostic::error("missing root expression", end).with_help(
                    "end the file with the expression to compile, e.g. `total`",
                ),
            );
            return Err(self.diagnostics);
        };

        if self.diagnostics.iter().any(Diagnostic::is_error) {
            return Err(self.diagnostics);
        }

        let mut warnings = self.diagnostics;
        for (name, (_, span)) in &self.bindings {
            if !self.used.contains(name) {
                warnings.push(Diagnostic::warning(
                    format!("binding '{}' is never used", name),
                    *span,
                ));
            }
        }

        Ok(SourceTree {
            tree: self.tree,
            root,
            bindings: self
                .bindings
                .into_iter()
                .map(|(name, (id, _))| (name, id))
                .collect(),
            warnings,
        })
    }

    // ── Statements ────────────────────────────────────────────────

    fn parse_let(&mut self) -> PResult<()> {
        self.advance(); // let
        let (name, span) = self.expect_ident()?;
        if let Some((_, previous)) = self.bindings.get(&name) {
            return Err(
                Diagnostic::error(format!("'{}' is already bound", name), span).with_note(
                    format!(
                        "first bound at byte {}; bindings are immutable",
                        previous.start
                    ),
                ),
            );
        }
        self.expect(&Lexeme::Eq)?;
        let value = self.parse_expr()?;
        let id = self.force(value);
        self.bindings.insert(name, (id, span));
        Ok(())
    }

    fn parse_root(&mut self, root: &mut Option<(NodeId, Span)>, start: Span) -> PResult<()> {
        let value = self.parse_expr()?;
        let id = self.force(value);
        let span = start.to(self.previous_span());
        if let Some((_, first)) = root {
            return Err(
                Diagnostic::error("more than one root expression", span)
                    .with_note(format!("the root was already given at byte {}", first.start))
                    .with_help("bind intermediate values with `let`"),
            );
        }
        *root = Some((id, span));
        Ok(())
    }

    // ── Expressions ───────────────────────────────────────────────

    fn parse_expr(&mut self) -> PResult<Operand> {
        let mut operand = self.parse_primary()?;
        while self.at(&Lexeme::LParen) {
            operand = self.parse_call(operand)?;
        }
        Ok(operand)
    }

    fn parse_primary(&mut self) -> PResult<Operand> {
        let tok = self.advance();
        let span = tok.span;
        let value = match tok.lexeme {
            Lexeme::Int(n) => Value::Int(n),
            Lexeme::Float(x) => Value::Float(x),
            Lexeme::Str(s) => Value::str(&s),
            Lexeme::True => Value::Bool(true),
            Lexeme::False => Value::Bool(false),
            Lexeme::None => Value::None,
            Lexeme::Ident(name) => return self.resolve_name(name, span),
            Lexeme::LBracket => {
                let items = self.parse_list(&Lexeme::RBracket, |p| {
                    let item = p.parse_expr()?;
                    Ok(p.force(item))
                })?;
                return Ok(Operand::Node(self.tree.tuple(items)));
            }
            Lexeme::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Lexeme::RParen)?;
                return Ok(inner);
            }
            other => {
                return Err(Diagnostic::error(
                    format!("expected an expression, found {}", other.describe()),
                    span,
                ))
            }
        };
        Ok(Operand::Node(self.tree.terminal(value)))
    }

    fn resolve_name(&mut self, name: String, span: Span) -> PResult<Operand> {
        if let Some((id, _)) = self.bindings.get(&name) {
            let id = *id;
            self.used.insert(name);
            return Ok(Operand::Node(id));
        }
        match builtins::lookup(&name) {
            Some(f) => Ok(Operand::Builtin(f)),
            None => Err(Diagnostic::error(format!("unknown name '{}'", name), span)
                .with_help(format!("builtins: {}", builtins::NAMES.join(", ")))),
        }
    }

    fn parse_call(&mut self, callee: Operand) -> PResult<Operand> {
        self.expect(&Lexeme::LParen)?;
        let callee = match callee {
            Operand::Builtin(f) => Callee::Function(f),
            Operand::Node(id) => Callee::Node(id),
        };

        let mut args = Vec::new();
        let mut kwargs: Vec<(String, NodeId)> = Vec::new();
        let arguments = self.parse_list(&Lexeme::RParen, |p| {
            let start = p.current_span();
            let keyword = match (&p.peek().lexeme, &p.peek_at(1).lexeme) {
                (Lexeme::Ident(name), Lexeme::Eq) => Some(name.clone()),
                _ => None,
            };
            if keyword.is_some() {
                p.advance(); // name
                p.advance(); // =
            }
            let value = p.parse_expr()?;
            let id = p.force(value);
            Ok((keyword, id, start.to(p.previous_span())))
        })?;

        for (keyword, id, span) in arguments {
            match keyword {
                Some(name) => {
                    if kwargs.iter().any(|(existing, _)| *existing == name) {
                        return Err(Diagnostic::error(
                            format!("keyword argument '{}' given twice", name),
                            span,
                        ));
                    }
                    kwargs.push((name, id));
                }
                None if !kwargs.is_empty() => {
                    return Err(Diagnostic::error(
                        "positional argument after keyword argument",
                        span,
                    ))
                }
                None => args.push(id),
            }
        }

        Ok(Operand::Node(self.tree.call_with(callee, args, kwargs)))
    }

    /// Comma-separated items up to `close`, which is consumed. A trailing
    /// comma is allowed.
    fn parse_list<T>(
        &mut self,
        close: &Lexeme,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut items = Vec::new();
        while !self.at(close) {
            items.push(item(self)?);
            if !self.at(close) {
                self.expect(&Lexeme::Comma)?;
            }
        }
        self.advance();
        Ok(items)
    }

    /// Turn an operand into a node, materializing bare builtins as
    /// terminals holding the function.
    fn force(&mut self, operand: Operand) -> NodeId {
        match operand {
            Operand::Node(id) => id,
            Operand::Builtin(f) => self.tree.terminal(f),
        }
    }

    // ── Token helpers ─────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn at(&self, lexeme: &Lexeme) -> bool {
        &self.peek().lexeme == lexeme
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.lexeme != Lexeme::Eof {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, lexeme: &Lexeme) -> PResult<()> {
        if self.at(lexeme) {
            self.advance();
            return Ok(());
        }
        Err(Diagnostic::error(
            format!(
                "expected {}, found {}",
                lexeme.describe(),
                self.peek().lexeme.describe()
            ),
            self.current_span(),
        ))
    }

    fn expect_ident(&mut self) -> PResult<(String, Span)> {
        let tok = self.advance();
        match tok.lexeme {
            Lexeme::Ident(name) => Ok((name, tok.span)),
            other => Err(Diagnostic::error(
                format!("expected a name, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    fn expect_end_of_statement(&mut self) -> PResult<()> {
        if self.at(&Lexeme::Eof) {
            return Ok(());
        }
        self.expect(&Lexeme::Newline)
    }

    fn skip_newlines(&mut self) {
        while self.at(&Lexeme::Newline) {
            self.advance();
        }
    }

    /// Skip to the start of the next statement: a line break or a `let`.
    fn synchronize(&mut self) {
        while !self.at(&Lexeme::Newline) && !self.at(&Lexeme::Let) && !self.at(&Lexeme::Eof) {
            self.advance();
        }
    }
}
