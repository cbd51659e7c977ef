//! Recursive-descent XPath 1.0 parser.
//!
//! Grounded on `petty-xpath1`'s grammar-to-AST mapping (operator
//! precedence, location path / filter expression split), reimplemented as
//! hand-written recursive descent over a token slice instead of `nom`
//! combinators (SPEC_FULL.md §4.4).

use super::ast::*;
use super::lexer::{tokenize, Token};
use crate::error::{Error, Result};

pub(crate) fn parse(expr: &str) -> Result<Expr> {
    let tokens = tokenize(expr)?;
    let mut p = Parser { tokens, pos: 0 };
    let e = p.parse_or_expr()?;
    p.expect_eof()?;
    Ok(e)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect_eof(&self) -> Result<()> {
        if matches!(self.peek(), Token::Eof) {
            Ok(())
        } else {
            Err(Error::XPathParse(format!("trailing tokens near {:?}", self.peek())))
        }
    }

    fn err<T>(&self, what: &str) -> Result<T> {
        Err(Error::XPathParse(format!("expected {}, found {:?}", what, self.peek())))
    }

    // ---- operator precedence chain ----

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and_expr()?;
        while self.at_name("or") {
            self.bump();
            let rhs = self.parse_and_expr()?;
            lhs = Expr::BinaryOp(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_equality_expr()?;
        while self.at_name("and") {
            self.bump();
            let rhs = self.parse_equality_expr()?;
            lhs = Expr::BinaryOp(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_relational_expr()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinaryOp::Eq,
                Token::Ne => BinaryOp::Ne,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_relational_expr()?;
            lhs = Expr::BinaryOp(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_additive_expr()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_additive_expr()?;
            lhs = Expr::BinaryOp(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative_expr()?;
            lhs = Expr::BinaryOp(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary_expr()?;
        loop {
            let op = if matches!(self.peek(), Token::Star) {
                BinaryOp::Mul
            } else if self.at_name("div") {
                BinaryOp::Div
            } else if self.at_name("mod") {
                BinaryOp::Mod
            } else {
                break;
            };
            self.bump();
            let rhs = self.parse_unary_expr()?;
            lhs = Expr::BinaryOp(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Token::Minus) {
            self.bump();
            return Ok(Expr::Negate(Box::new(self.parse_unary_expr()?)));
        }
        self.parse_union_expr()
    }

    fn parse_union_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_path_expr()?;
        while matches!(self.peek(), Token::Pipe) {
            self.bump();
            let rhs = self.parse_path_expr()?;
            lhs = Expr::Union(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn at_name(&self, kw: &str) -> bool {
        matches!(self.peek(), Token::Name(n) if n == kw)
    }

    // ---- path / filter expressions ----

    fn parse_path_expr(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Token::Slash | Token::DoubleSlash) {
            return Ok(Expr::Path(self.parse_absolute_location_path()?));
        }
        if self.looks_like_step_start() {
            return Ok(Expr::Path(LocationPath {
                root: PathRoot::Relative,
                steps: self.parse_relative_location_path()?,
            }));
        }

        let primary = self.parse_primary_expr()?;
        let mut predicates = Vec::new();
        while matches!(self.peek(), Token::LBracket) {
            predicates.push(self.parse_predicate()?);
        }
        let filter = if predicates.is_empty() { primary } else { Expr::Filter(Box::new(primary), predicates) };

        if matches!(self.peek(), Token::Slash | Token::DoubleSlash) {
            let leading_descendant = matches!(self.peek(), Token::DoubleSlash);
            self.bump();
            let mut steps = self.parse_relative_location_path()?;
            if leading_descendant {
                steps.insert(0, descendant_or_self_step());
            }
            return Ok(Expr::Path(LocationPath { root: PathRoot::Filter(Box::new(filter)), steps }));
        }
        Ok(filter)
    }

    /// True if the upcoming tokens can only start a `Step` (as opposed to a
    /// `PrimaryExpr`): `.`, `..`, `@`, a node-type test, an axis name
    /// followed by `::`, or a bare name *not* immediately followed by `(`
    /// (which would make it a function call instead).
    fn looks_like_step_start(&self) -> bool {
        match self.peek() {
            Token::Dot | Token::DotDot | Token::At | Token::Star => true,
            Token::Name(n) => {
                if matches!(self.tokens.get(self.pos + 1), Some(Token::DoubleColon)) {
                    return true;
                }
                if matches!(self.tokens.get(self.pos + 1), Some(Token::LParen)) {
                    matches!(n.as_str(), "node" | "text" | "comment" | "processing-instruction")
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        match self.peek().clone() {
            Token::Dollar => {
                self.bump();
                let name = self.expect_name()?;
                Ok(Expr::Variable(name))
            }
            Token::LParen => {
                self.bump();
                let e = self.parse_or_expr()?;
                self.expect(Token::RParen)?;
                Ok(e)
            }
            Token::Literal(s) => {
                self.bump();
                Ok(Expr::Literal(s))
            }
            Token::Number(n) => {
                self.bump();
                Ok(Expr::Number(n))
            }
            Token::Name(name) => {
                if matches!(self.tokens.get(self.pos + 1), Some(Token::LParen)) {
                    self.bump();
                    self.bump();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Token::RParen) {
                        args.push(self.parse_or_expr()?);
                        while matches!(self.peek(), Token::Comma) {
                            self.bump();
                            args.push(self.parse_or_expr()?);
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Expr::FunctionCall(name, args))
                } else {
                    self.err("a primary expression")
                }
            }
            _ => self.err("a primary expression"),
        }
    }

    fn expect(&mut self, tok: Token) -> Result<()> {
        if *self.peek() == tok {
            self.bump();
            Ok(())
        } else {
            Err(Error::XPathParse(format!("expected {:?}, found {:?}", tok, self.peek())))
        }
    }

    fn expect_name(&mut self) -> Result<String> {
        match self.bump() {
            Token::Name(n) => Ok(n),
            other => Err(Error::XPathParse(format!("expected a name, found {:?}", other))),
        }
    }

    // ---- location paths ----

    fn parse_absolute_location_path(&mut self) -> Result<LocationPath> {
        let leading_descendant = matches!(self.peek(), Token::DoubleSlash);
        self.bump(); // '/' or '//'
        let mut steps = if self.looks_like_step_start() {
            self.parse_relative_location_path()?
        } else {
            Vec::new()
        };
        if leading_descendant {
            steps.insert(0, descendant_or_self_step());
        }
        Ok(LocationPath { root: PathRoot::Absolute, steps })
    }

    fn parse_relative_location_path(&mut self) -> Result<Vec<Step>> {
        let mut steps = vec![self.parse_step()?];
        loop {
            match self.peek() {
                Token::Slash => {
                    self.bump();
                    steps.push(self.parse_step()?);
                }
                Token::DoubleSlash => {
                    self.bump();
                    steps.push(descendant_or_self_step());
                    steps.push(self.parse_step()?);
                }
                _ => break,
            }
        }
        Ok(steps)
    }

    fn parse_step(&mut self) -> Result<Step> {
        if matches!(self.peek(), Token::Dot) {
            self.bump();
            return Ok(Step { axis: Axis::Self_, test: NodeTest::AnyNode, predicates: Vec::new() });
        }
        if matches!(self.peek(), Token::DotDot) {
            self.bump();
            return Ok(Step { axis: Axis::Parent, test: NodeTest::AnyNode, predicates: Vec::new() });
        }
        let axis = if matches!(self.peek(), Token::At) {
            self.bump();
            Axis::Attribute
        } else if let Token::Name(n) = self.peek().clone() {
            if matches!(self.tokens.get(self.pos + 1), Some(Token::DoubleColon)) {
                let axis = Axis::from_name(&n)
                    .ok_or_else(|| Error::XPathParse(format!("unknown axis '{}'", n)))?;
                self.bump();
                self.bump();
                axis
            } else {
                Axis::Child
            }
        } else {
            Axis::Child
        };

        let test = self.parse_node_test()?;
        let mut predicates = Vec::new();
        while matches!(self.peek(), Token::LBracket) {
            predicates.push(self.parse_predicate()?);
        }
        Ok(Step { axis, test, predicates })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest> {
        if matches!(self.peek(), Token::Star) {
            self.bump();
            return Ok(NodeTest::Name { prefix: None, local: NameMatch::Any });
        }
        let name = self.expect_name()?;
        if matches!(self.peek(), Token::LParen) {
            match name.as_str() {
                "node" => {
                    self.bump();
                    self.expect(Token::RParen)?;
                    return Ok(NodeTest::AnyNode);
                }
                "text" => {
                    self.bump();
                    self.expect(Token::RParen)?;
                    return Ok(NodeTest::Text);
                }
                "comment" => {
                    self.bump();
                    self.expect(Token::RParen)?;
                    return Ok(NodeTest::Comment);
                }
                "processing-instruction" => {
                    self.bump();
                    let target = if let Token::Literal(s) = self.peek().clone() {
                        self.bump();
                        Some(s)
                    } else {
                        None
                    };
                    self.expect(Token::RParen)?;
                    return Ok(NodeTest::ProcessingInstruction(target));
                }
                _ => return self.err("a node-type test"),
            }
        }
        if matches!(self.peek(), Token::DoubleColon) {
            return self.err("a node test after an axis name");
        }
        // `prefix:local` or `prefix:*` - the lexer already glued these
        // together into one Name token (see `consume_ncname_or_qname`).
        match name.find(':') {
            Some(i) => {
                let prefix = name[..i].to_string();
                let local = &name[i + 1..];
                if local == "*" {
                    Ok(NodeTest::Name { prefix: Some(prefix), local: NameMatch::Any })
                } else {
                    Ok(NodeTest::Name { prefix: Some(prefix), local: NameMatch::Exact(local.to_string()) })
                }
            }
            None => Ok(NodeTest::Name { prefix: None, local: NameMatch::Exact(name) }),
        }
    }

    fn parse_predicate(&mut self) -> Result<Expr> {
        self.expect(Token::LBracket)?;
        let e = self.parse_or_expr()?;
        self.expect(Token::RBracket)?;
        Ok(e)
    }
}

fn descendant_or_self_step() -> Step {
    Step { axis: Axis::DescendantOrSelf, test: NodeTest::AnyNode, predicates: Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_relative_path() {
        let e = parse("a/b").unwrap();
        match e {
            Expr::Path(p) => {
                assert_eq!(p.root, PathRoot::Relative);
                assert_eq!(p.steps.len(), 2);
            }
            _ => panic!("expected a path"),
        }
    }

    #[test]
    fn parses_an_absolute_descendant_path() {
        let e = parse("//a").unwrap();
        match e {
            Expr::Path(p) => {
                assert_eq!(p.root, PathRoot::Absolute);
                assert_eq!(p.steps.len(), 2);
                assert_eq!(p.steps[0].axis, Axis::DescendantOrSelf);
            }
            _ => panic!("expected a path"),
        }
    }

    #[test]
    fn parses_predicates_and_functions() {
        let e = parse("a[position()=1]/b[@id]").unwrap();
        match e {
            Expr::Path(p) => assert_eq!(p.steps.len(), 2),
            _ => panic!("expected a path"),
        }
    }

    #[test]
    fn parses_arithmetic_and_boolean_operators() {
        let e = parse("1 + 2 * 3 = 7 and true()").unwrap();
        assert!(matches!(e, Expr::BinaryOp(BinaryOp::And, _, _)));
    }

    #[test]
    fn parses_axis_steps() {
        let e = parse("ancestor::node()").unwrap();
        match e {
            Expr::Path(p) => assert_eq!(p.steps[0].axis, Axis::Ancestor),
            _ => panic!("expected a path"),
        }
    }
}
