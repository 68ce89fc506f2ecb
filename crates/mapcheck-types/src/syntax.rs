//! Closed expression grammar for configuration call arguments.
//!
//! Hosts lower lambda bodies and call arguments into [`Expr`]; anything the
//! grammar cannot express becomes [`Expr::Opaque`] carrying the original text.
//! The `Display` impls print valid C# and are what fix synthesis emits.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Null,
    Default,
    Bool(bool),
    /// Numeric token as written, including any suffix (`0`, `0m`, `1.5f`).
    Number(String),
    String(String),
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    /// Null-forgiving `!` postfix.
    Bang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Null,
    NotNull,
    Type(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpolationPart {
    Text(String),
    Hole(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LambdaBody {
    Expr(Expr),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Identifier: a local, parameter, field, or type name (`src`, `_client`, `DateTime`).
    Name(String),
    Member {
        receiver: Box<Expr>,
        name: String,
        conditional: bool,
    },
    Call {
        receiver: Option<Box<Expr>>,
        method: String,
        type_args: Vec<String>,
        args: Vec<Expr>,
        conditional: bool,
    },
    Lambda {
        params: Vec<String>,
        body: Box<LambdaBody>,
    },
    Literal(Literal),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Interpolated(Vec<InterpolationPart>),
    New {
        type_name: String,
        args: Vec<Expr>,
    },
    Cast {
        type_name: String,
        expr: Box<Expr>,
    },
    Await(Box<Expr>),
    Is {
        expr: Box<Expr>,
        pattern: Pattern,
    },
    TypeOf(String),
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Expr(Expr),
    Local { name: String, init: Option<Expr> },
    Return(Option<Expr>),
    Throw(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
}

impl Expr {
    pub fn name(name: impl Into<String>) -> Expr {
        Expr::Name(name.into())
    }

    pub fn member(self, name: impl Into<String>) -> Expr {
        Expr::Member {
            receiver: Box::new(self),
            name: name.into(),
            conditional: false,
        }
    }

    pub fn conditional_member(self, name: impl Into<String>) -> Expr {
        Expr::Member {
            receiver: Box::new(self),
            name: name.into(),
            conditional: true,
        }
    }

    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Expr {
        self.call_generic(method, Vec::new(), args)
    }

    pub fn call_generic(
        self,
        method: impl Into<String>,
        type_args: Vec<String>,
        args: Vec<Expr>,
    ) -> Expr {
        Expr::Call {
            receiver: Some(Box::new(self)),
            method: method.into(),
            type_args,
            args,
            conditional: false,
        }
    }

    pub fn conditional_call(self, method: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            receiver: Some(Box::new(self)),
            method: method.into(),
            type_args: Vec::new(),
            args,
            conditional: true,
        }
    }

    /// Call without a receiver (`Foo(x)`).
    pub fn free_call(method: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            receiver: None,
            method: method.into(),
            type_args: Vec::new(),
            args,
            conditional: false,
        }
    }

    pub fn lambda(param: impl Into<String>, body: Expr) -> Expr {
        Expr::Lambda {
            params: vec![param.into()],
            body: Box::new(LambdaBody::Expr(body)),
        }
    }

    pub fn lambda_with(params: &[&str], body: LambdaBody) -> Expr {
        Expr::Lambda {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Box::new(body),
        }
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn number(token: impl Into<String>) -> Expr {
        Expr::Literal(Literal::Number(token.into()))
    }

    pub fn int(value: i64) -> Expr {
        Expr::number(value.to_string())
    }

    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn new_object(type_name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::New {
            type_name: type_name.into(),
            args,
        }
    }

    pub fn cast(type_name: impl Into<String>, expr: Expr) -> Expr {
        Expr::Cast {
            type_name: type_name.into(),
            expr: Box::new(expr),
        }
    }

    pub fn type_of(type_name: impl Into<String>) -> Expr {
        Expr::TypeOf(type_name.into())
    }

    /// `param.Member` for a plain (non-conditional) read of `param`.
    pub fn as_member_read(&self, param: &str) -> Option<&str> {
        match self {
            Expr::Member {
                receiver,
                name,
                conditional: false,
            } if matches!(receiver.as_ref(), Expr::Name(n) if n == param) => Some(name),
            _ => None,
        }
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_int_literal(&self) -> Option<i64> {
        match self {
            Expr::Literal(Literal::Number(token)) => token.parse().ok(),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<(&[String], &LambdaBody)> {
        match self {
            Expr::Lambda { params, body } => Some((params, body)),
            _ => None,
        }
    }

    /// Visit this expression and every sub-expression, pre-order, descending
    /// into lambda bodies.
    pub fn walk(&self, f: &mut dyn FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Name(_) | Expr::Literal(_) | Expr::TypeOf(_) | Expr::Opaque(_) => {}
            Expr::Member { receiver, .. } => receiver.walk(f),
            Expr::Call { receiver, args, .. } => {
                if let Some(receiver) = receiver {
                    receiver.walk(f);
                }
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Lambda { body, .. } => body.walk(f),
            Expr::Unary { operand, .. } => operand.walk(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                condition.walk(f);
                when_true.walk(f);
                when_false.walk(f);
            }
            Expr::Interpolated(parts) => {
                for part in parts {
                    if let InterpolationPart::Hole(expr) = part {
                        expr.walk(f);
                    }
                }
            }
            Expr::New { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Cast { expr, .. } | Expr::Await(expr) | Expr::Is { expr, .. } => expr.walk(f),
        }
    }

    fn is_primary(&self) -> bool {
        matches!(
            self,
            Expr::Name(_)
                | Expr::Member { .. }
                | Expr::Call { .. }
                | Expr::Literal(_)
                | Expr::Interpolated(_)
                | Expr::New { .. }
                | Expr::TypeOf(_)
                | Expr::Opaque(_)
        )
    }
}

impl LambdaBody {
    pub fn walk(&self, f: &mut dyn FnMut(&Expr)) {
        match self {
            LambdaBody::Expr(expr) => expr.walk(f),
            LambdaBody::Block(stmts) => {
                for stmt in stmts {
                    stmt.walk(f);
                }
            }
        }
    }

    /// The single expression a body evaluates to: the expression itself, or
    /// the operand of a block's only `return`.
    pub fn result_expr(&self) -> Option<&Expr> {
        match self {
            LambdaBody::Expr(expr) => Some(expr),
            LambdaBody::Block(stmts) => match stmts.as_slice() {
                [Stmt::Return(Some(expr))] => Some(expr),
                _ => None,
            },
        }
    }
}

impl Stmt {
    pub fn walk(&self, f: &mut dyn FnMut(&Expr)) {
        match self {
            Stmt::Expr(expr) => expr.walk(f),
            Stmt::Local { init, .. } => {
                if let Some(init) = init {
                    init.walk(f);
                }
            }
            Stmt::Return(expr) | Stmt::Throw(expr) => {
                if let Some(expr) = expr {
                    expr.walk(f);
                }
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.walk(f);
                for stmt in then_branch.iter().chain(else_branch) {
                    stmt.walk(f);
                }
            }
        }
    }
}

struct Parenthesized<'a>(&'a Expr);

impl fmt::Display for Parenthesized<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_primary() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "({})", self.0)
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

fn write_type_args(f: &mut fmt::Formatter<'_>, type_args: &[String]) -> fmt::Result {
    if !type_args.is_empty() {
        write!(f, "<{}>", type_args.join(", "))?;
    }
    Ok(())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Default => f.write_str("default"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Number(token) => f.write_str(token),
            Literal::String(value) => {
                f.write_str("\"")?;
                for ch in value.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        _ => write!(f, "{ch}")?,
                    }
                }
                f.write_str("\"")
            }
            Literal::Char(ch) => match ch {
                '\0' => f.write_str("'\\0'"),
                '\'' => f.write_str("'\\''"),
                '\\' => f.write_str("'\\\\'"),
                _ => write!(f, "'{ch}'"),
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name(name) => f.write_str(name),
            Expr::Member {
                receiver,
                name,
                conditional,
            } => {
                let dot = if *conditional { "?." } else { "." };
                write!(f, "{}{dot}{name}", Parenthesized(receiver))
            }
            Expr::Call {
                receiver,
                method,
                type_args,
                args,
                conditional,
            } => {
                if let Some(receiver) = receiver {
                    let dot = if *conditional { "?." } else { "." };
                    write!(f, "{}{dot}", Parenthesized(receiver))?;
                }
                f.write_str(method)?;
                write_type_args(f, type_args)?;
                f.write_str("(")?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::Lambda { params, body } => {
                match params.as_slice() {
                    [single] => write!(f, "{single}")?,
                    _ => write!(f, "({})", params.join(", "))?,
                }
                f.write_str(" => ")?;
                match body.as_ref() {
                    LambdaBody::Expr(expr) => write!(f, "{expr}"),
                    LambdaBody::Block(stmts) => write_block(f, stmts),
                }
            }
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{}", Parenthesized(operand)),
                UnaryOp::Neg => write!(f, "-{}", Parenthesized(operand)),
                UnaryOp::Bang => write!(f, "{}!", Parenthesized(operand)),
            },
            Expr::Binary { op, lhs, rhs } => {
                write!(
                    f,
                    "{} {} {}",
                    Operand(lhs),
                    op.as_str(),
                    Operand(rhs)
                )
            }
            Expr::Conditional {
                condition,
                when_true,
                when_false,
            } => write!(
                f,
                "{} ? {} : {}",
                Operand(condition),
                Operand(when_true),
                Operand(when_false)
            ),
            Expr::Interpolated(parts) => {
                f.write_str("$\"")?;
                for part in parts {
                    match part {
                        InterpolationPart::Text(text) => f.write_str(text)?,
                        InterpolationPart::Hole(expr) => write!(f, "{{{expr}}}")?,
                    }
                }
                f.write_str("\"")
            }
            Expr::New { type_name, args } => {
                write!(f, "new {type_name}(")?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::Cast { type_name, expr } => write!(f, "({type_name}){}", Parenthesized(expr)),
            Expr::Await(expr) => write!(f, "await {}", Parenthesized(expr)),
            Expr::Is { expr, pattern } => {
                write!(f, "{} is ", Parenthesized(expr))?;
                match pattern {
                    Pattern::Null => f.write_str("null"),
                    Pattern::NotNull => f.write_str("not null"),
                    Pattern::Type(name) => f.write_str(name),
                }
            }
            Expr::TypeOf(name) => write!(f, "typeof({name})"),
            Expr::Opaque(text) => f.write_str(text),
        }
    }
}

/// Binary operands keep unary/cast forms bare but parenthesize other binaries.
struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Binary { .. } | Expr::Conditional { .. } | Expr::Lambda { .. } => {
                write!(f, "({})", self.0)
            }
            other => write!(f, "{other}"),
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, stmts: &[Stmt]) -> fmt::Result {
    f.write_str("{")?;
    for stmt in stmts {
        write!(f, " {stmt}")?;
    }
    f.write_str(" }")
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(expr) => write!(f, "{expr};"),
            Stmt::Local { name, init } => match init {
                Some(init) => write!(f, "var {name} = {init};"),
                None => write!(f, "var {name};"),
            },
            Stmt::Return(Some(expr)) => write!(f, "return {expr};"),
            Stmt::Return(None) => f.write_str("return;"),
            Stmt::Throw(Some(expr)) => write!(f, "throw {expr};"),
            Stmt::Throw(None) => f.write_str("throw;"),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "if ({condition}) ")?;
                write_block(f, then_branch)?;
                if !else_branch.is_empty() {
                    f.write_str(" else ")?;
                    write_block(f, else_branch)?;
                }
                Ok(())
            }
        }
    }
}
