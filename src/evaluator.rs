use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::ast::{Block, Case, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::builtin::Builtins;
use crate::env::Env;
use crate::lexer::SourceMap;
use crate::module::{FileResolver, ModuleResolver, ResolveError};
use crate::object::{Function, HashKey, HashPair, HashPairs, Module, Object};
use crate::parser;
use crate::token::Span;

/// Longest string a repeat (`"ab" * n`) may produce, in bytes.
const MAX_STRING_LEN: usize = 1 << 30;

/// Early exits travelling up the evaluation: a `return` or a runtime error.
#[derive(Debug)]
enum Unwind {
  Return(Object),
  Error(String),
}

/// `Ok(None)` is the absence of a value, as produced by an empty block or an unmatched switch.
type Flow<T> = Result<T, Unwind>;

#[derive(Debug)]
pub struct Evaluator {
  pub env: Rc<RefCell<Env>>,
  builtins: Rc<Builtins>,
  resolver: Rc<dyn ModuleResolver>,
  source: Option<Rc<SourceMap>>,
}

impl Evaluator {
  pub fn new(env: Rc<RefCell<Env>>) -> Self {
    Evaluator {
      env,
      builtins: Rc::new(Builtins::standard()),
      resolver: Rc::new(FileResolver::new()),
      source: None,
    }
  }

  pub fn with_builtins(mut self, builtins: Rc<Builtins>) -> Self {
    self.builtins = builtins;
    self
  }

  pub fn with_resolver(mut self, resolver: Rc<dyn ModuleResolver>) -> Self {
    self.resolver = resolver;
    self
  }

  /// Errors raised at a known node get the offending source line appended.
  pub fn with_source_map(mut self, source: Rc<SourceMap>) -> Self {
    self.source = Some(source);
    self
  }

  /// Runs `program`. `None` means the last statement produced no value; a
  /// runtime failure comes back as `Some(Object::Error(..))`.
  pub fn eval(&mut self, program: &Program) -> Option<Object> {
    let mut result = None;

    for statement in &program.statements {
      match self.eval_statement(statement) {
        Ok(value) => result = value,
        Err(Unwind::Return(value)) => return Some(value),
        Err(Unwind::Error(message)) => return Some(Object::Error(message)),
      }
    }

    result
  }

  fn error(&self, span: Span, message: String) -> Unwind {
    match &self.source {
      Some(source) => {
        let (line, _, text) = source.locate(span.offset());
        Unwind::Error(format!("{}\n    * line: {}\t{}", message, line, text))
      }
      None => Unwind::Error(message),
    }
  }

  fn eval_statement(&mut self, statement: &Statement) -> Flow<Option<Object>> {
    match statement {
      Statement::Expression(expression) => self.eval_expression(expression),
      Statement::Return(expression) => {
        let value = self.eval_value(expression)?;
        Err(Unwind::Return(value))
      }
    }
  }

  fn eval_block(&mut self, block: &Block) -> Flow<Option<Object>> {
    let mut result = None;

    for statement in &block.statements {
      result = self.eval_statement(statement)?;
    }

    Ok(result)
  }

  fn eval_value(&mut self, expression: &Expression) -> Flow<Object> {
    Ok(self.eval_expression(expression)?.unwrap_or(Object::Null))
  }

  fn eval_expression(&mut self, expression: &Expression) -> Flow<Option<Object>> {
    let value = match expression {
      Expression::Identifier { name, span } => self.eval_identifier(name, *span)?,
      Expression::Integer(value) => Object::Integer(*value),
      Expression::Float(value) => Object::Float(*value),
      Expression::String(value) => Object::String(value.clone()),
      Expression::Boolean(value) => Object::Boolean(*value),
      Expression::Null => Object::Null,
      Expression::Prefix { operator, operand, span } => {
        let operand = self.eval_value(operand)?;
        self.eval_prefix_expression(*operator, operand, *span)?
      }
      Expression::Infix { left, operator, right, span } => {
        let left = self.eval_value(left)?;
        let right = self.eval_value(right)?;
        self.eval_infix_expression(*operator, left, right, *span)?
      }
      Expression::If { condition, consequence, alternative } => {
        let condition = self.eval_value(condition)?;

        if condition.truthy() {
          return self.eval_block(consequence);
        }
        match alternative {
          Some(alternative) => return self.eval_block(alternative),
          None => Object::Null,
        }
      }
      Expression::While { condition, body } => {
        let mut result = None;

        while self.eval_value(condition)?.truthy() {
          result = self.eval_block(body)?;
        }

        result.unwrap_or(Object::Null)
      }
      Expression::Function { name, parameters, body } => Object::Function(Rc::new(Function {
        name: name.clone(),
        parameters: parameters.clone(),
        body: body.clone(),
        env: self.env.clone(),
      })),
      Expression::Call { function, arguments, span } => {
        let function = self.eval_value(function)?;
        let arguments = self.eval_expressions(arguments)?;
        return self.apply_function(function, arguments, *span);
      }
      Expression::Array(elements) => Object::array(self.eval_expressions(elements)?),
      Expression::Hash { pairs, span } => self.eval_hash_literal(pairs, *span)?,
      Expression::Bind { name, value, .. } => {
        let value = self.eval_value(value)?;
        self.env.borrow_mut().set(name, value);
        Object::Null
      }
      Expression::Assign { target, value, span } => {
        self.eval_assignment(target, value, *span)?;
        Object::Null
      }
      Expression::Index { left, index, span } => {
        let left = self.eval_value(left)?;
        let index = self.eval_value(index)?;
        self.eval_index_expression(left, index, *span)?
      }
      Expression::Import { name, span } => self.eval_import_expression(name, *span)?,
      Expression::Switch { subject, cases } => return self.eval_switch_expression(subject, cases),
    };

    Ok(Some(value))
  }

  fn eval_expressions(&mut self, expressions: &[Expression]) -> Flow<Vec<Object>> {
    expressions.iter().map(|expression| self.eval_value(expression)).collect()
  }

  fn eval_identifier(&self, name: &str, span: Span) -> Flow<Object> {
    if let Some(object) = self.env.borrow().get(name) {
      return Ok(object);
    }

    if let Some(builtin) = self.builtins.get(name) {
      return Ok(builtin);
    }

    Err(self.error(span, format!("identifier not found: {}", name)))
  }

  fn eval_prefix_expression(&self, operator: PrefixOperator, operand: Object, span: Span) -> Flow<Object> {
    match (operator, operand) {
      (PrefixOperator::Not, operand) => Ok(Object::Boolean(!operand.truthy())),
      (PrefixOperator::Negate, Object::Integer(value)) => Ok(Object::Integer(value.wrapping_neg())),
      (PrefixOperator::Negate, Object::Float(value)) => Ok(Object::Float(-value)),
      (PrefixOperator::Negate, operand) => {
        Err(self.error(span, format!("unknown operator: -{}", operand.type_name())))
      }
    }
  }

  fn unknown_infix(&self, operator: InfixOperator, left: &Object, right: &Object, span: Span) -> Unwind {
    let message = format!(
      "unknown operator: {} {} {}",
      left.type_name(),
      operator,
      right.type_name()
    );
    self.error(span, message)
  }

  fn eval_infix_expression(
    &self,
    operator: InfixOperator,
    left: Object,
    right: Object,
    span: Span,
  ) -> Flow<Object> {
    use InfixOperator::*;

    match (operator, &left, &right) {
      (Multiply, Object::String(text), Object::Integer(count))
      | (Multiply, Object::Integer(count), Object::String(text)) => {
        let repeated_len = usize::try_from(*count)
          .ok()
          .and_then(|count| text.len().checked_mul(count))
          .filter(|len| *len <= MAX_STRING_LEN);
        if repeated_len.is_none() {
          return Err(self.error(span, format!("invalid repeat count: {}", count)));
        }
        return Ok(Object::String(text.repeat(*count as usize)));
      }
      (Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual, _, _) => {
        let ordering = match left.compare(&right) {
          Some(ordering) => ordering,
          None => return Err(self.unknown_infix(operator, &left, &right, span)),
        };

        let result = match operator {
          Equal => ordering == 0,
          NotEqual => ordering != 0,
          Less => ordering == -1,
          LessEqual => ordering < 1,
          Greater => ordering == 1,
          _ => ordering > -1,
        };
        return Ok(Object::Boolean(result));
      }
      _ => {}
    }

    match (&left, &right) {
      (Object::Boolean(a), Object::Boolean(b)) => match operator {
        And => Ok(Object::Boolean(*a && *b)),
        Or => Ok(Object::Boolean(*a || *b)),
        _ => Err(self.unknown_infix(operator, &left, &right, span)),
      },
      (Object::Integer(a), Object::Integer(b)) => self.eval_integer_infix_expression(operator, *a, *b, span),
      (Object::Integer(a), Object::Float(b)) => self.eval_float_infix_expression(operator, *a as f64, *b, span),
      (Object::Float(a), Object::Integer(b)) => self.eval_float_infix_expression(operator, *a, *b as f64, span),
      (Object::Float(a), Object::Float(b)) => self.eval_float_infix_expression(operator, *a, *b, span),
      (Object::String(a), Object::String(b)) if operator == Add => Ok(Object::String(format!("{}{}", a, b))),
      _ => Err(self.unknown_infix(operator, &left, &right, span)),
    }
  }

  fn eval_integer_infix_expression(&self, operator: InfixOperator, left: i64, right: i64, span: Span) -> Flow<Object> {
    let value = match operator {
      InfixOperator::Add => left.wrapping_add(right),
      InfixOperator::Subtract => left.wrapping_sub(right),
      InfixOperator::Multiply => left.wrapping_mul(right),
      InfixOperator::Divide | InfixOperator::Modulo if right == 0 => {
        return Err(self.error(span, "division by zero".to_owned()));
      }
      InfixOperator::Divide => left.wrapping_div(right),
      InfixOperator::Modulo => left.wrapping_rem(right),
      _ => {
        return Err(self.unknown_infix(operator, &Object::Integer(left), &Object::Integer(right), span));
      }
    };

    Ok(Object::Integer(value))
  }

  fn eval_float_infix_expression(&self, operator: InfixOperator, left: f64, right: f64, span: Span) -> Flow<Object> {
    let value = match operator {
      InfixOperator::Add => left + right,
      InfixOperator::Subtract => left - right,
      InfixOperator::Multiply => left * right,
      InfixOperator::Divide => left / right,
      InfixOperator::Modulo => left % right,
      _ => {
        return Err(self.unknown_infix(operator, &Object::Float(left), &Object::Float(right), span));
      }
    };

    Ok(Object::Float(value))
  }

  fn apply_function(&mut self, function: Object, arguments: Vec<Object>, span: Span) -> Flow<Option<Object>> {
    match function {
      Object::Function(function) => {
        let mut env = Env::new_with_parent(function.env.clone());

        for (i, parameter) in function.parameters.iter().enumerate() {
          match arguments.get(i) {
            Some(argument) => {
              env.set(parameter, argument.clone());
            }
            None => {
              let message = format!(
                "argument '{}' to function '{}' is missing",
                parameter,
                function.name.as_deref().unwrap_or("<anonymous>")
              );
              return Err(self.error(span, message));
            }
          }
        }

        let previous = std::mem::replace(&mut self.env, Rc::new(RefCell::new(env)));
        let result = self.eval_block(&function.body);
        self.env = previous;

        match result {
          Err(Unwind::Return(value)) => Ok(Some(value)),
          other => other,
        }
      }
      Object::Builtin(builtin) => {
        trace!(name = %builtin.name, arguments = arguments.len(), "calling builtin");

        let result = (builtin.func)(&self.env.borrow(), &arguments);
        match result {
          Ok(value) => Ok(Some(value.unwrap_or(Object::Null))),
          Err(message) => Err(Unwind::Error(message)),
        }
      }
      other => Err(self.error(span, format!("not a function: {}", other.type_name()))),
    }
  }

  fn eval_hash_literal(&mut self, pairs: &[(Expression, Expression)], span: Span) -> Flow<Object> {
    let mut hash = HashPairs::new();

    for (key, value) in pairs {
      let key = self.eval_value(key)?;
      let hash_key = match key.hash_key() {
        Some(hash_key) => hash_key,
        None => return Err(self.error(span, format!("unusable as hash key: {}", key.type_name()))),
      };

      let value = self.eval_value(value)?;
      hash.insert(hash_key, HashPair { key, value });
    }

    Ok(Object::hash(hash))
  }

  fn eval_index_expression(&self, left: Object, index: Object, span: Span) -> Flow<Object> {
    match (&left, &index) {
      (Object::String(text), Object::Integer(i)) => {
        let character = usize::try_from(*i).ok().and_then(|i| text.chars().nth(i));
        Ok(Object::String(character.map(String::from).unwrap_or_default()))
      }
      (Object::Array(elements), Object::Integer(i)) => {
        let element = usize::try_from(*i).ok().and_then(|i| elements.borrow().get(i).cloned());
        Ok(element.unwrap_or(Object::Null))
      }
      (Object::Hash(pairs), _) => self.lookup(&pairs.borrow(), &index, span),
      (Object::Module(module), _) => self.lookup(&module.attrs.borrow(), &index, span),
      _ => Err(self.error(span, format!("index operator not supported: {}", left.type_name()))),
    }
  }

  fn lookup(&self, pairs: &HashPairs, index: &Object, span: Span) -> Flow<Object> {
    let key = match index.hash_key() {
      Some(key) => key,
      None => return Err(self.error(span, format!("unusable as hash key: {}", index.type_name()))),
    };

    Ok(pairs.get(&key).map(|pair| pair.value.clone()).unwrap_or(Object::Null))
  }

  // The target is evaluated before the value, so assigning to an unknown name fails.
  fn eval_assignment(&mut self, target: &Expression, value: &Expression, span: Span) -> Flow<()> {
    match target {
      Expression::Identifier { name, span } => {
        self.eval_identifier(name, *span)?;
        let value = self.eval_value(value)?;
        self.env.borrow_mut().set(name, value);
        Ok(())
      }
      Expression::Index { left, index, .. } => {
        let container = self.eval_value(left)?;
        let index = self.eval_value(index)?;
        let value = self.eval_value(value)?;

        match &container {
          Object::Array(elements) => {
            let i = match index {
              Object::Integer(i) => i,
              other => return Err(self.error(span, format!("cannot index array with {}", other.type_name()))),
            };

            let mut elements = elements.borrow_mut();
            if let Some(slot) = usize::try_from(i).ok().and_then(|i| elements.get_mut(i)) {
              *slot = value;
            }
            Ok(())
          }
          Object::Hash(pairs) => {
            let key = match index.hash_key() {
              Some(key) => key,
              None => return Err(self.error(span, format!("unusable as hash key: {}", index.type_name()))),
            };

            pairs.borrow_mut().insert(key, HashPair { key: index, value });
            Ok(())
          }
          other => Err(self.error(
            span,
            format!("object type {} does not support item assignment", other.type_name()),
          )),
        }
      }
      other => Err(self.error(
        span,
        format!("expected identifier or index expression on left of '=' but got {}", other),
      )),
    }
  }

  fn eval_import_expression(&mut self, name: &Expression, span: Span) -> Flow<Object> {
    let name = match self.eval_value(name)? {
      Object::String(name) => name,
      other => return Err(self.error(span, format!("ImportError: invalid import path '{}'", other))),
    };

    debug!(module = %name, "importing module");

    let host = self.env.borrow().host().clone();
    let source = self.resolver.resolve(&name, &host).map_err(|err| {
      let message = match err {
        ResolveError::NotFound(_) => format!("ImportError: {}", err),
        ResolveError::Io { .. } => format!("IOError: {}", err),
      };
      self.error(span, message)
    })?;

    let (program, source_map) =
      parser::parse(&source).map_err(|errors| self.error(span, format!("ParseError: {}", errors)))?;

    let env = Rc::new(RefCell::new(Env::new(host)));
    let mut evaluator = Evaluator {
      env: env.clone(),
      builtins: self.builtins.clone(),
      resolver: self.resolver.clone(),
      source: Some(source_map),
    };

    if let Some(Object::Error(message)) = evaluator.eval(&program) {
      return Err(Unwind::Error(message));
    }

    let attrs = env
      .borrow()
      .exported()
      .into_iter()
      .map(|(export, value)| {
        let key = HashKey::of_str(&export);
        (key, HashPair { key: Object::String(export), value })
      })
      .collect::<HashPairs>();

    debug!(module = %name, exports = attrs.len(), "module loaded");

    Ok(Object::Module(Rc::new(Module {
      name,
      attrs: Rc::new(RefCell::new(attrs)),
    })))
  }

  // Candidates match when they are `true` or print the same as a subject of the same type.
  fn eval_switch_expression(&mut self, subject: &Expression, cases: &[Case]) -> Flow<Option<Object>> {
    let subject = self.eval_value(subject)?;
    let subject_text = subject.to_string();

    for case in cases.iter().filter(|case| !case.default) {
      for candidate in &case.candidates {
        let value = self.eval_value(candidate)?;

        let matched = matches!(value, Object::Boolean(true))
          || (value.type_name() == subject.type_name() && value.to_string() == subject_text);
        if matched {
          return self.eval_block(&case.body);
        }
      }
    }

    match cases.iter().find(|case| case.default) {
      Some(default) => self.eval_block(&default.body),
      None => Ok(None),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use crate::env::Env;
  use crate::evaluator::Evaluator;
  use crate::host::Host;
  use crate::object::Object;
  use crate::parser::parse;

  fn eval(input: &str) -> Option<Object> {
    let (program, _) = parse(input).expect("program should parse");
    let env = Rc::new(RefCell::new(Env::new(Rc::new(Host::new()))));
    Evaluator::new(env).eval(&program)
  }

  fn eval_ok(input: &str) -> Object {
    match eval(input) {
      Some(Object::Error(message)) => panic!("unexpected error for {:?}: {}", input, message),
      Some(object) => object,
      None => panic!("no value for {:?}", input),
    }
  }

  fn eval_err(input: &str) -> String {
    match eval(input) {
      Some(Object::Error(message)) => message,
      other => panic!("expected an error for {:?}, got {:?}", input, other),
    }
  }

  #[test]
  fn test_integer_arithmetic() {
    let tests = vec![
      ("5 + 5 + 5 + 5 - 10", 10),
      ("50 / 2 * 2 + 10", 60),
      ("2 * (5 + 10)", 30),
      ("-50 + 100 + -50", 0),
      ("7 % 3", 1),
      ("-7 / 2", -3),
      ("9223372036854775807 + 1", i64::MIN),
    ];

    for (input, expected) in tests {
      assert_eq!(eval_ok(input), Object::Integer(expected), "input: {}", input);
    }
  }

  #[test]
  fn test_float_arithmetic() {
    assert_eq!(eval_ok("1.5 + 1"), Object::Float(2.5));
    assert_eq!(eval_ok("3 / 2.0"), Object::Float(1.5));
    assert_eq!(eval_ok("5.5 % 2"), Object::Float(1.5));
    assert_eq!(eval_ok("-2.5"), Object::Float(-2.5));
  }

  #[test]
  fn test_division_by_zero() {
    assert_eq!(eval_err("1 / 0"), "division by zero");
    assert_eq!(eval_err("1 % 0"), "division by zero");
    assert_eq!(eval_ok("1.0 / 0"), Object::Float(f64::INFINITY));
  }

  #[test]
  fn test_string_operations() {
    assert_eq!(eval_ok(r#""Hello" + " " + "World!""#), Object::String("Hello World!".to_owned()));
    assert_eq!(eval_ok(r#"" " * 4"#), Object::String("    ".to_owned()));
    assert_eq!(eval_ok(r#"4 * " ""#), Object::String("    ".to_owned()));
    assert_eq!(eval_err(r#""a" * -1"#), "invalid repeat count: -1");
    assert_eq!(
      eval_err(r#""abc" * 9223372036854775807"#),
      "invalid repeat count: 9223372036854775807"
    );
    assert_eq!(eval_err(r#"2147483648 * "ab""#), "invalid repeat count: 2147483648");
    assert_eq!(eval_err(r#""a" - "b""#), "unknown operator: str - str");
  }

  #[test]
  fn test_comparisons() {
    let tests = vec![
      ("(1 <= 2) == true", true),
      ("1 < 2", true),
      ("2 >= 2", true),
      ("1 == 1.0", true),
      ("\"a\" < \"b\"", true),
      ("null == null", true),
      ("1 == \"1\"", false),
      ("[1, 2] == [1, 2]", true),
      ("{\"a\": 1} == {\"a\": 1}", true),
      ("true != false", true),
    ];

    for (input, expected) in tests {
      assert_eq!(eval_ok(input), Object::Boolean(expected), "input: {}", input);
    }
  }

  #[test]
  fn test_incomparable_is_an_error() {
    assert_eq!(eval_err("fn(x) { x } == 1"), "unknown operator: fn == int");
    assert_eq!(eval_err("len < 1"), "unknown operator: builtin < int");
  }

  #[test]
  fn test_boolean_operators_do_not_short_circuit() {
    assert_eq!(eval_ok("true && false"), Object::Boolean(false));
    assert_eq!(eval_ok("false || true"), Object::Boolean(true));
    assert_eq!(eval_err("false && missing"), "identifier not found: missing");
    assert_eq!(eval_err("1 && 2"), "unknown operator: int && int");
  }

  #[test]
  fn test_prefix_operators() {
    assert_eq!(eval_ok("!true"), Object::Boolean(false));
    assert_eq!(eval_ok("!null"), Object::Boolean(true));
    assert_eq!(eval_ok("!0"), Object::Boolean(false));
    assert_eq!(eval_ok("!!\"\""), Object::Boolean(true));
    assert_eq!(eval_err("-true"), "unknown operator: -bool");
  }

  #[test]
  fn test_errors_stop_evaluation() {
    assert_eq!(eval_err("5 + true; 5"), "unknown operator: int + bool");
    assert_eq!(eval_err("x := 1; x + true; x = 5"), "unknown operator: int + bool");
    assert_eq!(
      eval_err("if 10 > 1 { if 10 > 1 { return true + false; } return 1; }"),
      "unknown operator: bool + bool"
    );
  }

  #[test]
  fn test_if_expressions() {
    assert_eq!(eval_ok("if true { 10 }"), Object::Integer(10));
    assert_eq!(eval_ok("if 0 { 10 } else { 20 }"), Object::Integer(10));
    assert_eq!(eval_ok("if false { 10 }"), Object::Null);
    assert_eq!(eval_ok("if 1 > 2 { 10 } else if 2 > 1 { 20 } else { 30 }"), Object::Integer(20));
  }

  #[test]
  fn test_while_expressions() {
    assert_eq!(eval_ok("n := 0; while (n < 5) { n = n + 1 }; n"), Object::Integer(5));
    assert_eq!(eval_ok("while (false) { 1 }"), Object::Null);
    assert_eq!(eval_ok("n := 0; while (n < 3) { n = n + 1; n * 10 }"), Object::Integer(30));
  }

  #[test]
  fn test_return_unwinds_loops_and_functions() {
    assert_eq!(eval_ok("return 10; 9"), Object::Integer(10));
    assert_eq!(
      eval_ok("f := fn() { n := 0; while (true) { n = n + 1; if n == 3 { return n } } }; f() + 1"),
      Object::Integer(4)
    );
  }

  #[test]
  fn test_functions_and_closures() {
    assert_eq!(eval_ok("identity := fn(x) { x; }; identity(5)"), Object::Integer(5));
    assert_eq!(eval_ok("double := fn(x) { return x * 2; }; double(5)"), Object::Integer(10));
    assert_eq!(eval_ok("fn(x, y) { x + y }(2, 3)"), Object::Integer(5));
    assert_eq!(
      eval_ok("newAdder := fn(x) { fn(y) { x + y } }; addTwo := newAdder(2); addTwo(3)"),
      Object::Integer(5)
    );
    assert_eq!(
      eval_ok("fact := fn(n) { if n < 2 { return 1 } n * fact(n - 1) }; fact(10)"),
      Object::Integer(3628800)
    );
    assert_eq!(eval_ok("f := fn(a) { a }; f(1, 2, 3)"), Object::Integer(1));
  }

  #[test]
  fn test_call_errors() {
    assert_eq!(eval_err("add := fn(a, b) { a + b }; add(1)"), "argument 'b' to function 'add' is missing");
    assert_eq!(eval_err("5()"), "not a function: int");
    assert_eq!(eval_err("len(1, 2)"), "TypeError: len() takes exactly 1 argument (2 given)");
  }

  #[test]
  fn test_closures_see_their_defining_scope() {
    let input = "
      x := 1
      get := fn() { x }
      shadow := fn() { x := 2; get() }
      shadow()
    ";
    assert_eq!(eval_ok(input), Object::Integer(1));
  }

  #[test]
  fn test_reference_and_value_binding() {
    assert_eq!(eval_ok("a := [1]; b := a; b[0] = 9; a[0]"), Object::Integer(9));
    assert_eq!(eval_ok("a := 1; b := a; b = 9; a"), Object::Integer(1));
    assert_eq!(eval_ok(r#"h := {}; g := h; g["k"] = 1; h["k"]"#), Object::Integer(1));
    assert_eq!(eval_ok(r#"s := "x"; t := s; t = "y"; s"#), Object::String("x".to_owned()));
  }

  #[test]
  fn test_assignment() {
    assert_eq!(eval_err("y = 1"), "identifier not found: y");
    assert_eq!(eval_ok("a := [1, 2]; a[5] = 3; a"), Object::array(vec![Object::Integer(1), Object::Integer(2)]));
    assert_eq!(eval_err(r#"a := [1]; a["x"] = 3"#), "cannot index array with str");
    assert_eq!(eval_err("n := 1; n[0] = 3"), "object type int does not support item assignment");
    assert_eq!(eval_ok("x := 1; x = 2"), Object::Null);
  }

  #[test]
  fn test_assignment_writes_innermost_scope() {
    assert_eq!(eval_ok("x := 1; f := fn() { x = 2 }; f(); x"), Object::Integer(1));
  }

  #[test]
  fn test_reserved_names_are_ignored() {
    assert_eq!(eval_ok("PI := 3; PI"), Object::Float(std::f64::consts::PI));
  }

  #[test]
  fn test_indexing() {
    assert_eq!(eval_ok("[1, 2, 3][1]"), Object::Integer(2));
    assert_eq!(eval_ok("[1, 2, 3][3]"), Object::Null);
    assert_eq!(eval_ok("[1, 2, 3][-1]"), Object::Null);
    assert_eq!(eval_ok(r#""héllo"[1]"#), Object::String("é".to_owned()));
    assert_eq!(eval_ok(r#""abc"[10]"#), Object::String(String::new()));
    assert_eq!(eval_ok(r#"{"one": 1, 2: "two", true: 3}[2]"#), Object::String("two".to_owned()));
    assert_eq!(eval_ok(r#"{"one": 1}["two"]"#), Object::Null);
    assert_eq!(eval_ok(r#"p := {"x": 4}; p.x"#), Object::Integer(4));
    assert_eq!(eval_err("1[0]"), "index operator not supported: int");
    assert_eq!(eval_err(r#"{"a": 1}[[1]]"#), "unusable as hash key: array");
    assert_eq!(eval_err("{[1]: 2}"), "unusable as hash key: array");
  }

  #[test]
  fn test_switch() {
    let input = |subject: &str| {
      format!(
        r#"switch {} {{
          case 1, 2 {{ "small" }}
          case "5" {{ "text" }}
          case 5 {{ "five" }}
          default {{ "other" }}
        }}"#,
        subject
      )
    };

    assert_eq!(eval_ok(&input("2")), Object::String("small".to_owned()));
    assert_eq!(eval_ok(&input("5")), Object::String("five".to_owned()));
    assert_eq!(eval_ok(&input(r#""5""#)), Object::String("text".to_owned()));
    assert_eq!(eval_ok(&input("9")), Object::String("other".to_owned()));

    assert_eq!(eval_ok("x := 7; switch x { case x > 5 { \"big\" } case 7 { \"seven\" } }"), Object::String("big".to_owned()));
    assert_eq!(eval("switch 5 { case 1 { 1 } }"), None);
    assert_eq!(eval_ok("switch 5 { case 1 { 1 } }; 3"), Object::Integer(3));
  }

  #[test]
  fn test_builtins_are_found_after_scope() {
    assert_eq!(eval_ok(r#"len("four")"#), Object::Integer(4));
    assert_eq!(eval_ok(r#"len := fn(x) { 0 }; len("four")"#), Object::Integer(0));
    assert_eq!(eval_ok("type(1.5)"), Object::String("float".to_owned()));
    assert_eq!(eval_ok("println(1)"), Object::Null);
  }

  #[test]
  fn test_bind_returns_null_and_program_value() {
    assert_eq!(eval_ok("a := 5"), Object::Null);
    assert_eq!(eval_ok("a := b := 5; [a, b]").to_string(), "[null, 5]");
    assert_eq!(eval(""), None);
  }

  #[test]
  fn test_function_values_print() {
    assert_eq!(eval_ok("add := fn(a, b) { a + b }; add").to_string(), "fn add(a, b) (a + b)");
    assert_eq!(eval_ok("len").to_string(), "<built-in function len>");
  }

  #[test]
  fn test_error_location_suffix() {
    let input = "x := 1\ny := x + true";
    let (program, source_map) = parse(input).unwrap();
    let env = Rc::new(RefCell::new(Env::new(Rc::new(Host::new()))));

    let result = Evaluator::new(env).with_source_map(source_map).eval(&program);
    assert_eq!(
      result,
      Some(Object::Error("unknown operator: int + bool\n    * line: 2\ty := x + true".to_owned()))
    );
  }
}
