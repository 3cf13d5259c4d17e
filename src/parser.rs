use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Block, Case, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::lexer::{Lexer, SourceMap};
use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Not,
    Assign,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Or => Precedence::Or,
        TokenKind::And => Precedence::And,
        TokenKind::Bang => Precedence::Not,
        TokenKind::Bind | TokenKind::Assign => Precedence::Assign,
        TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equals,
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            Precedence::LessGreater
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::LeftParen => Precedence::Call,
        TokenKind::LeftBracket | TokenKind::Dot => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
    let operator = match kind {
        TokenKind::Plus => InfixOperator::Add,
        TokenKind::Minus => InfixOperator::Subtract,
        TokenKind::Star => InfixOperator::Multiply,
        TokenKind::Slash => InfixOperator::Divide,
        TokenKind::Percent => InfixOperator::Modulo,
        TokenKind::EqualEqual => InfixOperator::Equal,
        TokenKind::BangEqual => InfixOperator::NotEqual,
        TokenKind::Less => InfixOperator::Less,
        TokenKind::LessEqual => InfixOperator::LessEqual,
        TokenKind::Greater => InfixOperator::Greater,
        TokenKind::GreaterEqual => InfixOperator::GreaterEqual,
        TokenKind::And => InfixOperator::And,
        TokenKind::Or => InfixOperator::Or,
        _ => return None,
    };

    Some(operator)
}

/// A single parse diagnostic, located by line and column.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}\n\t[{line}:{column}]\t{source_line}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub source_line: String,
}

fn render(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every diagnostic collected while parsing one source text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

type PrefixParseFn<'a> = fn(&mut Parser<'a>) -> Option<Expression>;
type InfixParseFn<'a> = fn(&mut Parser<'a>, Expression) -> Option<Expression>;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    errors: Vec<ParseError>,
    current: Token,
    peek: Token,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        let placeholder = Token::new(TokenKind::Eof, String::new(), Span::default());
        let mut parser = Parser {
            lexer,
            errors: Vec::new(),
            current: placeholder.clone(),
            peek: placeholder,
        };

        parser.next_token();
        parser.next_token();
        parser
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn source_map(&self) -> Rc<SourceMap> {
        self.lexer.source_map()
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.current.is(TokenKind::Eof) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }

        Program { statements }
    }

    fn prefix_rule(kind: TokenKind) -> Option<PrefixParseFn<'a>> {
        let rule: PrefixParseFn<'a> = match kind {
            TokenKind::Identifier => Self::parse_identifier,
            TokenKind::Int => Self::parse_integer_literal,
            TokenKind::Float => Self::parse_float_literal,
            TokenKind::String => Self::parse_string_literal,
            TokenKind::True | TokenKind::False => Self::parse_boolean,
            TokenKind::Null => Self::parse_null,
            TokenKind::Bang | TokenKind::Minus => Self::parse_prefix_expression,
            TokenKind::LeftParen => Self::parse_grouped_expression,
            TokenKind::LeftBracket => Self::parse_array_literal,
            TokenKind::LeftBrace => Self::parse_hash_literal,
            TokenKind::If => Self::parse_if_expression,
            TokenKind::While => Self::parse_while_expression,
            TokenKind::Function => Self::parse_function_literal,
            TokenKind::Import => Self::parse_import_expression,
            TokenKind::Switch => Self::parse_switch_expression,
            _ => return None,
        };

        Some(rule)
    }

    fn infix_rule(kind: TokenKind) -> Option<InfixParseFn<'a>> {
        let rule: InfixParseFn<'a> = match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::EqualEqual
            | TokenKind::BangEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::And
            | TokenKind::Or => Self::parse_infix_expression,
            TokenKind::LeftParen => Self::parse_call_expression,
            TokenKind::LeftBracket => Self::parse_index_expression,
            TokenKind::Dot => Self::parse_selector_expression,
            TokenKind::Bind => Self::parse_bind_expression,
            TokenKind::Assign => Self::parse_assignment_expression,
            _ => return None,
        };

        Some(rule)
    }

    /// Advances one token. Comments never reach the grammar.
    fn next_token(&mut self) {
        let mut next = self.lexer.next_token();
        while next.is(TokenKind::Comment) {
            next = self.lexer.next_token();
        }

        self.current = std::mem::replace(&mut self.peek, next);

        if self.current.is(TokenKind::Illegal) {
            let message = format!("Illegal token '{}'", self.current.slice);
            self.report(message, self.current.span);
        }
    }

    fn report(&mut self, message: String, span: Span) {
        let map = self.lexer.source_map();
        let (line, column, source_line) = map.locate(span.offset());

        self.errors.push(ParseError {
            message,
            line,
            column,
            source_line: source_line.to_owned(),
        });
    }

    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek.is(kind) {
            self.next_token();
            return Some(());
        }

        let message = format!("expected next token to be {}, got {} instead", kind, self.peek.kind);
        self.report(message, self.peek.span);
        None
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek.kind)
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        if self.peek.is(TokenKind::Semicolon) || self.peek.is(TokenKind::RightBrace) || self.peek.is(TokenKind::Eof) {
            if self.peek.is(TokenKind::Semicolon) {
                self.next_token();
            }
            return Some(Statement::Return(Expression::Null));
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek.is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;

        if self.peek.is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Statement::Expression(expression))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let prefix = match Self::prefix_rule(self.current.kind) {
            Some(prefix) => prefix,
            None => {
                let message = format!("no prefix parse function for '{}' found", self.current.slice);
                self.report(message, self.current.span);
                return None;
            }
        };

        let mut left = prefix(self)?;

        while !self.peek.is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let infix = match Self::infix_rule(self.peek.kind) {
                Some(infix) => infix,
                None => {
                    let message = format!("no infix parse function for '{}' found", self.peek.slice);
                    self.report(message, self.peek.span);
                    return None;
                }
            };

            self.next_token();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier {
            name: self.current.slice.clone(),
            span: self.current.span,
        })
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.current.slice.parse::<i64>() {
            Ok(value) => Some(Expression::Integer(value)),
            Err(_) => {
                let message = format!("could not parse '{}' as integer", self.current.slice);
                self.report(message, self.current.span);
                None
            }
        }
    }

    fn parse_float_literal(&mut self) -> Option<Expression> {
        match self.current.slice.parse::<f64>() {
            Ok(value) => Some(Expression::Float(value)),
            Err(_) => {
                let message = format!("could not parse '{}' as float", self.current.slice);
                self.report(message, self.current.span);
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        Some(Expression::String(self.current.slice.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::Boolean(self.current.is(TokenKind::True)))
    }

    fn parse_null(&mut self) -> Option<Expression> {
        Some(Expression::Null)
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = match self.current.kind {
            TokenKind::Bang => PrefixOperator::Not,
            _ => PrefixOperator::Negate,
        };
        let span = self.current.span;

        self.next_token();
        let operand = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::Prefix {
            operator,
            operand: Box::new(operand),
            span,
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = infix_operator(self.current.kind)?;
        let precedence = precedence_of(self.current.kind);
        let span = self.current.span;

        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;
        Some(expression)
    }

    fn parse_block(&mut self) -> Block {
        let mut statements = Vec::new();
        self.next_token();

        while !self.current.is(TokenKind::RightBrace) && !self.current.is(TokenKind::Eof) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.next_token();
        }

        if self.current.is(TokenKind::Eof) {
            self.report("expected '}' to close block, got EOF".to_owned(), self.current.span);
        }

        Block::new(statements)
    }

    // `if` takes its condition bare; `else if` nests a whole if-expression in the alternative.
    fn parse_if_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let consequence = self.parse_block();

        let mut alternative = None;
        if self.peek.is(TokenKind::Else) {
            self.next_token();

            if self.peek.is(TokenKind::If) {
                self.next_token();
                let nested = self.parse_if_expression()?;
                alternative = Some(Block::new(vec![Statement::Expression(nested)]));
            } else {
                self.expect_peek(TokenKind::LeftBrace)?;
                alternative = Some(self.parse_block());
            }
        }

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    // Unlike `if`, the `while` condition must be parenthesized.
    fn parse_while_expression(&mut self) -> Option<Expression> {
        self.expect_peek(TokenKind::LeftParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block();

        Some(Expression::While {
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_import_expression(&mut self) -> Option<Expression> {
        let span = self.current.span;

        self.expect_peek(TokenKind::LeftParen)?;
        self.next_token();
        let name = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;

        Some(Expression::Import {
            name: Box::new(name),
            span,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        self.expect_peek(TokenKind::LeftParen)?;
        let parameters = self.parse_function_parameters()?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block();

        Some(Expression::Function {
            name: None,
            parameters,
            body: Rc::new(body),
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();

        if self.peek.is(TokenKind::RightParen) {
            self.next_token();
            return Some(parameters);
        }

        self.expect_peek(TokenKind::Identifier)?;
        parameters.push(self.current.slice.clone());

        while self.peek.is(TokenKind::Comma) {
            self.next_token();
            self.expect_peek(TokenKind::Identifier)?;
            parameters.push(self.current.slice.clone());
        }

        self.expect_peek(TokenKind::RightParen)?;
        Some(parameters)
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek.is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek.is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Some(list)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let span = self.current.span;
        let arguments = self.parse_expression_list(TokenKind::RightParen)?;

        Some(Expression::Call {
            function: Box::new(function),
            arguments,
            span,
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenKind::RightBracket)?;
        Some(Expression::Array(elements))
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        let span = self.current.span;

        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightBracket)?;

        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
            span,
        })
    }

    /// `a.b` is sugar for `a["b"]`.
    fn parse_selector_expression(&mut self, left: Expression) -> Option<Expression> {
        let span = self.current.span;
        self.expect_peek(TokenKind::Identifier)?;

        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(Expression::String(self.current.slice.clone())),
            span,
        })
    }

    fn parse_bind_expression(&mut self, left: Expression) -> Option<Expression> {
        let name = match left {
            Expression::Identifier { name, .. } => name,
            other => {
                let message = format!("expected identifier on left of ':=' but got {}", other);
                self.report(message, self.current.span);
                return None;
            }
        };
        let span = self.current.span;

        self.next_token();
        let mut value = self.parse_expression(Precedence::Lowest)?;

        // Functions remember the first name they were bound to.
        if let Expression::Function { name: function_name @ None, .. } = &mut value {
            *function_name = Some(name.clone());
        }

        Some(Expression::Bind {
            name,
            value: Box::new(value),
            span,
        })
    }

    fn parse_assignment_expression(&mut self, target: Expression) -> Option<Expression> {
        if !matches!(target, Expression::Identifier { .. } | Expression::Index { .. }) {
            let message = format!("expected identifier or index expression on left of '=' but got {}", target);
            self.report(message, self.current.span);
            return None;
        }
        let span = self.current.span;

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        Some(Expression::Assign {
            target: Box::new(target),
            value: Box::new(value),
            span,
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let span = self.current.span;
        let mut pairs = Vec::new();

        while !self.peek.is(TokenKind::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            self.expect_peek(TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;

            pairs.push((key, value));

            if !self.peek.is(TokenKind::RightBrace) {
                self.expect_peek(TokenKind::Comma)?;
            }
        }

        self.expect_peek(TokenKind::RightBrace)?;
        Some(Expression::Hash { pairs, span })
    }

    fn parse_switch_expression(&mut self) -> Option<Expression> {
        let span = self.current.span;

        self.next_token();
        let subject = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        self.next_token();

        let mut cases = Vec::new();
        while !self.current.is(TokenKind::RightBrace) {
            if self.current.is(TokenKind::Eof) {
                self.report("unterminated switch expression".to_owned(), span);
                return None;
            }

            let mut default = false;
            let mut candidates = Vec::new();

            match self.current.kind {
                TokenKind::Default => default = true,
                TokenKind::Case => {
                    self.next_token();

                    if self.current.is(TokenKind::Default) {
                        default = true;
                    } else {
                        candidates.push(self.parse_expression(Precedence::Lowest)?);

                        while self.peek.is(TokenKind::Comma) {
                            self.next_token();
                            self.next_token();
                            candidates.push(self.parse_expression(Precedence::Lowest)?);
                        }
                    }
                }
                _ => {
                    let message = format!("expected 'case' or 'default' in switch, got '{}'", self.current.slice);
                    self.report(message, self.current.span);
                    return None;
                }
            }

            self.expect_peek(TokenKind::LeftBrace)?;
            let body = self.parse_block();

            if !self.current.is(TokenKind::RightBrace) {
                return None;
            }
            self.next_token();

            cases.push(Case {
                default,
                candidates,
                body,
            });
        }

        if cases.iter().filter(|case| case.default).count() > 1 {
            self.report("a switch expression may only have one default block".to_owned(), span);
            return None;
        }

        Some(Expression::Switch {
            subject: Box::new(subject),
            cases,
        })
    }
}

/// Lexes and parses `source`, returning the program with the line table used to locate runtime errors.
pub fn parse(source: &str) -> Result<(Program, Rc<SourceMap>), ParseErrors> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        return Err(ParseErrors(parser.errors().to_vec()));
    }

    Ok((program, parser.source_map()))
}
