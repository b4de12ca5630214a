use crate::error::EvalError;
use crate::traits::{Bindings, ExpressionEvaluator, Scalar};
use std::cell::RefCell;
use std::collections::HashMap;

/// Variables an ODE right-hand side may reference, in VM slot order.
pub const ODE_VARIABLES: [&str; 2] = ["x", "y"];

/// Single-argument built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function1 {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Log2,
    Sqrt,
    Cbrt,
    Abs,
    Sign,
    Floor,
    Ceil,
    Round,
}

impl Function1 {
    fn apply<T: Scalar>(self, a: T) -> T {
        match self {
            Function1::Sin => a.sin(),
            Function1::Cos => a.cos(),
            Function1::Tan => a.tan(),
            Function1::Asin => a.asin(),
            Function1::Acos => a.acos(),
            Function1::Atan => a.atan(),
            Function1::Sinh => a.sinh(),
            Function1::Cosh => a.cosh(),
            Function1::Tanh => a.tanh(),
            Function1::Exp => a.exp(),
            Function1::Ln => a.ln(),
            Function1::Log10 => a.log10(),
            Function1::Log2 => a.log2(),
            Function1::Sqrt => a.sqrt(),
            Function1::Cbrt => a.cbrt(),
            Function1::Abs => a.abs(),
            // sign(0) is 0, unlike Float::signum.
            Function1::Sign => {
                if a > T::zero() {
                    T::one()
                } else if a < T::zero() {
                    -T::one()
                } else {
                    a
                }
            }
            Function1::Floor => a.floor(),
            Function1::Ceil => a.ceil(),
            Function1::Round => a.round(),
        }
    }
}

/// Two-argument built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function2 {
    Pow,
    Atan2,
    Min,
    Max,
    /// Floored modulo: the result takes the sign of the divisor.
    Mod,
    /// `log(value, base)`.
    LogBase,
}

impl Function2 {
    fn apply<T: Scalar>(self, a: T, b: T) -> T {
        match self {
            Function2::Pow => a.powf(b),
            Function2::Atan2 => a.atan2(b),
            Function2::Min => a.min(b),
            Function2::Max => a.max(b),
            Function2::Mod => a - b * (a / b).floor(),
            Function2::LogBase => a.ln() / b.ln(),
        }
    }
}

enum FunctionKind {
    One(Function1),
    Two(Function2),
    /// `log(x)` is the natural log, `log(x, b)` takes an explicit base.
    Log,
}

fn lookup_function(name: &str) -> Option<FunctionKind> {
    let kind = match name {
        "sin" => FunctionKind::One(Function1::Sin),
        "cos" => FunctionKind::One(Function1::Cos),
        "tan" => FunctionKind::One(Function1::Tan),
        "asin" => FunctionKind::One(Function1::Asin),
        "acos" => FunctionKind::One(Function1::Acos),
        "atan" => FunctionKind::One(Function1::Atan),
        "sinh" => FunctionKind::One(Function1::Sinh),
        "cosh" => FunctionKind::One(Function1::Cosh),
        "tanh" => FunctionKind::One(Function1::Tanh),
        "exp" => FunctionKind::One(Function1::Exp),
        "ln" => FunctionKind::One(Function1::Ln),
        "log10" => FunctionKind::One(Function1::Log10),
        "log2" => FunctionKind::One(Function1::Log2),
        "sqrt" => FunctionKind::One(Function1::Sqrt),
        "cbrt" => FunctionKind::One(Function1::Cbrt),
        "abs" => FunctionKind::One(Function1::Abs),
        "sign" => FunctionKind::One(Function1::Sign),
        "floor" => FunctionKind::One(Function1::Floor),
        "ceil" => FunctionKind::One(Function1::Ceil),
        "round" => FunctionKind::One(Function1::Round),
        "pow" => FunctionKind::Two(Function2::Pow),
        "atan2" => FunctionKind::Two(Function2::Atan2),
        "min" => FunctionKind::Two(Function2::Min),
        "max" => FunctionKind::Two(Function2::Max),
        "mod" => FunctionKind::Two(Function2::Mod),
        "log" => FunctionKind::Log,
        _ => return None,
    };
    Some(kind)
}

fn lookup_constant(name: &str) -> Option<f64> {
    match name {
        "pi" | "PI" => Some(std::f64::consts::PI),
        "e" | "E" => Some(std::f64::consts::E),
        "tau" => Some(std::f64::consts::TAU),
        _ => None,
    }
}

/// OpCodes for the Stack-based Virtual Machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant `f64` value onto the stack.
    LoadConst(f64),
    /// Pushes the value of a variable (by slot index) onto the stack.
    LoadVar(usize),
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b).
    Div,
    /// Pops top two values (b, a), pushes (a ^ b).
    Pow,
    /// Pops top value (a), pushes -a.
    Neg,
    /// Pops top value (a), pushes f(a).
    Call1(Function1),
    /// Pops top two values (b, a), pushes f(a, b).
    Call2(Function2),
}

/// Represents a compiled sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }
}

/// Stack-based Virtual Machine for evaluating equations.
///
/// The VM is stateless; `execute` takes all necessary context:
/// - `bytecode`: Instructions to run.
/// - `vars`: Variable values in slot order (read-only).
/// - `stack`: A mutable buffer for intermediate computations.
pub struct VM;

impl VM {
    pub fn execute<T: Scalar>(
        bytecode: &Bytecode,
        vars: &[T],
        stack: &mut Vec<T>,
    ) -> Result<T, EvalError> {
        stack.clear();

        for op in &bytecode.ops {
            match *op {
                OpCode::LoadConst(val) => {
                    stack.push(T::from_f64(val).unwrap_or_else(T::nan));
                }
                OpCode::LoadVar(idx) => {
                    let value = vars
                        .get(idx)
                        .copied()
                        .ok_or_else(|| EvalError::UnknownVariable(format!("#{idx}")))?;
                    stack.push(value);
                }
                OpCode::Add => {
                    let (a, b) = pop_pair(stack)?;
                    stack.push(a + b);
                }
                OpCode::Sub => {
                    let (a, b) = pop_pair(stack)?;
                    stack.push(a - b);
                }
                OpCode::Mul => {
                    let (a, b) = pop_pair(stack)?;
                    stack.push(a * b);
                }
                OpCode::Div => {
                    let (a, b) = pop_pair(stack)?;
                    stack.push(a / b);
                }
                OpCode::Pow => {
                    let (a, b) = pop_pair(stack)?;
                    stack.push(a.powf(b));
                }
                OpCode::Neg => {
                    let a = stack.pop().ok_or(EvalError::StackUnderflow)?;
                    stack.push(-a);
                }
                OpCode::Call1(func) => {
                    let a = stack.pop().ok_or(EvalError::StackUnderflow)?;
                    stack.push(func.apply(a));
                }
                OpCode::Call2(func) => {
                    let (a, b) = pop_pair(stack)?;
                    stack.push(func.apply(a, b));
                }
            }
        }

        stack.pop().ok_or(EvalError::EmptyExpression)
    }
}

fn pop_pair<T: Scalar>(stack: &mut Vec<T>) -> Result<(T, T), EvalError> {
    let b = stack.pop().ok_or(EvalError::StackUnderflow)?;
    let a = stack.pop().ok_or(EvalError::StackUnderflow)?;
    Ok((a, b))
}

// --- AST & Parser ---

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, char, Box<Expr>), // char is operator +, -, *, /, ^
    Unary(char, Box<Expr>),             // -
    Call(String, Vec<Expr>),            // functions like sin(x), pow(x, 2)
}

/// Compiles an AST (`Expr`) into `Bytecode`.
/// Resolves variable names to slot indices and named constants to literals.
pub struct Compiler {
    pub var_map: HashMap<String, usize>,
}

impl Compiler {
    pub fn new(var_names: &[&str]) -> Self {
        let var_map = var_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        Self { var_map }
    }

    pub fn compile(&self, expr: &Expr) -> Result<Bytecode, EvalError> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> Result<(), EvalError> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable(name) => {
                if let Some(&idx) = self.var_map.get(name) {
                    ops.push(OpCode::LoadVar(idx));
                } else if let Some(value) = lookup_constant(name) {
                    ops.push(OpCode::LoadConst(value));
                } else {
                    return Err(EvalError::UnknownVariable(name.clone()));
                }
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                let code = match op {
                    '+' => OpCode::Add,
                    '-' => OpCode::Sub,
                    '*' => OpCode::Mul,
                    '/' => OpCode::Div,
                    '^' => OpCode::Pow,
                    other => return Err(EvalError::UnexpectedToken(other.to_string())),
                };
                ops.push(code);
            }
            Expr::Unary(op, operand) => {
                self.compile_recursive(operand, ops)?;
                match op {
                    '-' => ops.push(OpCode::Neg),
                    other => return Err(EvalError::UnexpectedToken(other.to_string())),
                }
            }
            Expr::Call(func, args) => {
                let kind =
                    lookup_function(func).ok_or_else(|| EvalError::UnknownFunction(func.clone()))?;
                let code = match (kind, args.len()) {
                    (FunctionKind::One(f), 1) => OpCode::Call1(f),
                    (FunctionKind::Two(f), 2) => OpCode::Call2(f),
                    (FunctionKind::Log, 1) => OpCode::Call1(Function1::Ln),
                    (FunctionKind::Log, 2) => OpCode::Call2(Function2::LogBase),
                    (kind, found) => {
                        let expected = match kind {
                            FunctionKind::One(_) => "1",
                            FunctionKind::Two(_) => "2",
                            FunctionKind::Log => "1 or 2",
                        };
                        return Err(EvalError::WrongArgumentCount {
                            name: func.clone(),
                            expected,
                            found,
                        });
                    }
                };
                for arg in args {
                    self.compile_recursive(arg, ops)?;
                }
                ops.push(code);
            }
        }
        Ok(())
    }
}

/// Parses and compiles `expression` against the given variable slots.
pub fn compile_expression(expression: &str, var_names: &[&str]) -> Result<Bytecode, EvalError> {
    let parsed = parse(expression)?;
    Compiler::new(var_names).compile(&parsed)
}

// --- Simple Parser ---

/// Parses a string expression into an AST.
///
/// Precedence from loosest to tightest: `+ -`, `* /` (and implicit
/// multiplication such as `2x`), unary sign, `^` (right associative).
pub fn parse(input: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::EmptyExpression);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(EvalError::UnexpectedToken(token.describe())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Identifier(name) => name.clone(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Caret => "^".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // Exponent only when digits follow, so `2e` stays `2 * e`.
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let value = literal
                .parse::<f64>()
                .map_err(|_| EvalError::InvalidNumber(literal.clone()))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Identifier(chars[start..i].iter().collect()));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                _ => return Err(EvalError::UnexpectedCharacter { ch: c, position: i }),
            };
            tokens.push(token);
            i += 1;
        }
    }
    Ok(tokens)
}

fn is_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Number(_) => true,
        Expr::Unary('-', inner) => is_literal(inner),
        _ => false,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_closing_paren(&mut self) -> Result<(), EvalError> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            Some(other) => Err(EvalError::UnexpectedToken(other.describe())),
            None => Err(EvalError::ExpectedClosingParen),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, EvalError> {
        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_factor()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => '+',
                Token::Minus => '-',
                _ => break,
            };
            self.consume();
            let right = self.parse_factor()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_implicit()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => '*',
                Token::Slash => '/',
                _ => break,
            };
            self.consume();
            let right = self.parse_implicit()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    /// Implicit multiplication (`2x`, `3(x + 1)`, `x y`) binds tighter than
    /// `*` and `/`, so `x/2y` is `x/(2y)`.
    fn parse_implicit(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_literal_fraction()?;

        while self.at_implicit_operand() {
            let right = self.parse_literal_fraction()?;
            left = Expr::Binary(Box::new(left), '*', Box::new(right));
        }
        Ok(left)
    }

    fn at_implicit_operand(&self) -> bool {
        match self.peek() {
            Some(Token::Identifier(_)) | Some(Token::LParen) => true,
            // `x 2` and `(x + 1) 2` multiply, `2 3` does not.
            Some(Token::Number(_)) => matches!(
                self.previous(),
                Some(Token::Identifier(_)) | Some(Token::RParen)
            ),
            _ => false,
        }
    }

    /// A literal fraction ahead of an implicit product stays whole:
    /// `1/2x` is `(1/2)x`.
    fn parse_literal_fraction(&mut self) -> Result<Expr, EvalError> {
        let mut node = self.parse_unary()?;
        let mut last_is_literal = is_literal(&node);

        while last_is_literal && self.at_literal_fraction() {
            self.consume();
            let denominator = self.parse_unary()?;
            last_is_literal = is_literal(&denominator);
            node = Expr::Binary(Box::new(node), '/', Box::new(denominator));
        }
        Ok(node)
    }

    /// `/ <number> <identifier or '('>`
    fn at_literal_fraction(&self) -> bool {
        matches!(self.peek(), Some(Token::Slash))
            && matches!(self.tokens.get(self.pos + 1), Some(Token::Number(_)))
            && matches!(
                self.tokens.get(self.pos + 2),
                Some(Token::Identifier(_)) | Some(Token::LParen)
            )
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary('-', Box::new(expr)))
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            // Right associative, and the exponent may carry its own sign.
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(Box::new(base), '^', Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.consume(); // eat '('
                    let mut args = vec![self.parse_expression()?];
                    while let Some(Token::Comma) = self.peek() {
                        self.consume();
                        args.push(self.parse_expression()?);
                    }
                    self.expect_closing_paren()?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_closing_paren()?;
                Ok(expr)
            }
            Some(other) => Err(EvalError::UnexpectedToken(other.describe())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

// --- EngineEvaluator ---

/// The bundled [`ExpressionEvaluator`]: parse, compile and run on every call.
///
/// Nothing is cached between calls; a solve issues at most a few hundred
/// evaluations.
#[derive(Debug, Default)]
pub struct EngineEvaluator {
    // Interior mutability for VM stack to avoid allocation per evaluation.
    // Note: This makes the evaluator !Sync; use one per thread.
    stack: RefCell<Vec<f64>>,
}

impl EngineEvaluator {
    pub fn new() -> Self {
        Self {
            stack: RefCell::new(Vec::with_capacity(64)),
        }
    }
}

impl ExpressionEvaluator for EngineEvaluator {
    fn evaluate(&self, expression: &str, bindings: Bindings) -> Result<f64, EvalError> {
        let bytecode = compile_expression(expression, &ODE_VARIABLES)?;
        let mut stack = self.stack.borrow_mut();
        let value = VM::execute(&bytecode, &[bindings.x, bindings.y], &mut stack)?;
        // Infinities pass through (`1/0`); NaN is a domain error.
        if value.is_nan() {
            return Err(EvalError::NotANumber);
        }
        Ok(value)
    }
}
