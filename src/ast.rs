use std::fmt;
use std::rc::Rc;

use crate::token::Span;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    Return(Expression),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expression(expression) => write!(f, "{}", expression),
            Statement::Return(value) => write!(f, "return {};", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Block { statements }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

/// One arm of a switch: either the default arm or a list of candidate expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub default: bool,
    pub candidates: Vec<Expression>,
    pub body: Block,
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.default {
            write!(f, "default {{{}}}", self.body)
        } else {
            write!(f, "case {} {{{}}}", join(&self.candidates, ","), self.body)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier {
        name: String,
        span: Span,
    },
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Prefix {
        operator: PrefixOperator,
        operand: Box<Expression>,
        span: Span,
    },
    Infix {
        left: Box<Expression>,
        operator: InfixOperator,
        right: Box<Expression>,
        span: Span,
    },
    If {
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },
    While {
        condition: Box<Expression>,
        body: Block,
    },
    Function {
        name: Option<String>,
        parameters: Vec<String>,
        body: Rc<Block>,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
        span: Span,
    },
    Array(Vec<Expression>),
    Hash {
        pairs: Vec<(Expression, Expression)>,
        span: Span,
    },
    Bind {
        name: String,
        value: Box<Expression>,
        span: Span,
    },
    Assign {
        target: Box<Expression>,
        value: Box<Expression>,
        span: Span,
    },
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
    Import {
        name: Box<Expression>,
        span: Span,
    },
    Switch {
        subject: Box<Expression>,
        cases: Vec<Case>,
    },
}

fn join(expressions: &[Expression], separator: &str) -> String {
    expressions
        .iter()
        .map(|expression| expression.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier { name, .. } => f.write_str(name),
            Expression::Integer(value) => write!(f, "{}", value),
            Expression::Float(value) => write!(f, "{}", value),
            Expression::String(value) => f.write_str(value),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::Null => f.write_str("null"),
            Expression::Prefix { operator, operand, .. } => write!(f, "({}{})", operator, operand),
            Expression::Infix { left, operator, right, .. } => write!(f, "({} {} {})", left, operator, right),
            Expression::If { condition, consequence, alternative } => {
                write!(f, "if{} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, "else {}", alternative)?;
                }
                Ok(())
            }
            Expression::While { condition, body } => write!(f, "while{} {}", condition, body),
            Expression::Function { name, parameters, body } => {
                write!(f, "fn {}({}) {}", name.as_deref().unwrap_or(""), parameters.join(", "), body)
            }
            Expression::Call { function, arguments, .. } => write!(f, "{}({})", function, join(arguments, ", ")),
            Expression::Array(elements) => write!(f, "[{}]", join(elements, ", ")),
            Expression::Hash { pairs, .. } => {
                let pairs = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect::<Vec<_>>();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Expression::Bind { name, value, .. } => write!(f, "{}:={}", name, value),
            Expression::Assign { target, value, .. } => write!(f, "{}={}", target, value),
            Expression::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expression::Import { name, .. } => write!(f, "import({})", name),
            Expression::Switch { subject, cases } => {
                write!(f, "switch ({}) {{", subject)?;
                for case in cases {
                    write!(f, "{}", case)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefixOperator {
    Not,
    Negate,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Not => f.write_str("!"),
            PrefixOperator::Negate => f.write_str("-"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Modulo => "%",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
            InfixOperator::Less => "<",
            InfixOperator::LessEqual => "<=",
            InfixOperator::Greater => ">",
            InfixOperator::GreaterEqual => ">=",
            InfixOperator::And => "&&",
            InfixOperator::Or => "||",
        };

        f.write_str(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_round_trip() {
        let program = Program {
            statements: vec![Statement::Expression(Expression::Bind {
                name: "myVar".to_owned(),
                value: Box::new(Expression::Identifier {
                    name: "anotherVar".to_owned(),
                    span: Span(8, 18),
                }),
                span: Span(5, 7),
            })],
        };

        assert_eq!(program.to_string(), "myVar:=anotherVar");
    }

    #[test]
    fn test_nested_display() {
        let expression = Expression::Infix {
            left: Box::new(Expression::Integer(1)),
            operator: InfixOperator::Add,
            right: Box::new(Expression::Prefix {
                operator: PrefixOperator::Negate,
                operand: Box::new(Expression::Integer(2)),
                span: Span::default(),
            }),
            span: Span::default(),
        };

        assert_eq!(expression.to_string(), "(1 + (-2))");
        assert_eq!(Statement::Return(expression).to_string(), "return (1 + (-2));");
    }
}
