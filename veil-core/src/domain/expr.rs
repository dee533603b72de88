// veil-core/src/domain/expr.rs
//
// Expression AST used as policy key material. Parsed expressions carry a
// ParseContext (where they came from); policy keys never do: they go through
// `SqlExpr::normalize` first, which strips every context recursively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an expression was parsed from. Never part of a policy key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParseContext {
    /// Alias or relation the expression was written against (`e` in `e.salary`).
    pub scope: Option<String>,
    pub line: u64,
    pub column: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Literal {
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnaryOp {
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SqlExpr {
    /// Direct column reference.
    Field {
        name: String,
        ctx: Option<ParseContext>,
    },
    Literal {
        value: Literal,
        ctx: Option<ParseContext>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<SqlExpr>,
        ctx: Option<ParseContext>,
    },
    Binary {
        left: Box<SqlExpr>,
        op: BinaryOp,
        right: Box<SqlExpr>,
        ctx: Option<ParseContext>,
    },
    Function {
        name: String,
        args: Vec<SqlExpr>,
        ctx: Option<ParseContext>,
    },
}

impl SqlExpr {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            ctx: None,
        }
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self::Literal {
            value: Literal::Number(value.into()),
            ctx: None,
        }
    }

    pub fn binary(left: SqlExpr, op: BinaryOp, right: SqlExpr) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            ctx: None,
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<SqlExpr>) -> Self {
        Self::Function {
            name: name.into(),
            args,
            ctx: None,
        }
    }

    /// Attaches a parse context to the root node.
    pub fn with_context(mut self, context: ParseContext) -> Self {
        match &mut self {
            Self::Field { ctx, .. }
            | Self::Literal { ctx, .. }
            | Self::Unary { ctx, .. }
            | Self::Binary { ctx, .. }
            | Self::Function { ctx, .. } => *ctx = Some(context),
        }
        self
    }

    pub fn context(&self) -> Option<&ParseContext> {
        match self {
            Self::Field { ctx, .. }
            | Self::Literal { ctx, .. }
            | Self::Unary { ctx, .. }
            | Self::Binary { ctx, .. }
            | Self::Function { ctx, .. } => ctx.as_ref(),
        }
    }

    /// Column name when this is a direct column reference.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Deep copy with every parse context removed.
    pub fn strip_context(&self) -> SqlExpr {
        match self {
            Self::Field { name, .. } => Self::Field {
                name: name.clone(),
                ctx: None,
            },
            Self::Literal { value, .. } => Self::Literal {
                value: value.clone(),
                ctx: None,
            },
            Self::Unary { op, expr, .. } => Self::Unary {
                op: *op,
                expr: Box::new(expr.strip_context()),
                ctx: None,
            },
            Self::Binary {
                left, op, right, ..
            } => Self::Binary {
                left: Box::new(left.strip_context()),
                op: *op,
                right: Box::new(right.strip_context()),
                ctx: None,
            },
            Self::Function { name, args, .. } => Self::Function {
                name: name.clone(),
                args: args.iter().map(SqlExpr::strip_context).collect(),
                ctx: None,
            },
        }
    }

    pub fn normalize(&self) -> NormalizedExpr {
        NormalizedExpr(self.strip_context())
    }

    /// Renders `self` as an operand of a binary operator. `NOT` binds looser
    /// than comparisons, so it is parenthesized along with nested binaries.
    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary { .. }
            | Self::Unary {
                op: UnaryOp::Not, ..
            } => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }

    /// Renders `self` under a unary operator. A nested unary is parenthesized
    /// so that `- -x` never prints as the line comment `--x`.
    fn fmt_unary_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary { .. } | Self::Unary { .. } => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }
}

impl fmt::Display for SqlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { name, .. } => write!(f, "{name}"),
            Self::Literal { value, .. } => match value {
                Literal::Number(n) => write!(f, "{n}"),
                Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
                Literal::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
                Literal::Null => write!(f, "NULL"),
            },
            Self::Unary { op, expr, .. } => {
                match op {
                    UnaryOp::Minus => write!(f, "-")?,
                    UnaryOp::Not => write!(f, "NOT ")?,
                }
                expr.fmt_unary_operand(f)
            }
            Self::Binary {
                left, op, right, ..
            } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.as_str())?;
                right.fmt_operand(f)
            }
            Self::Function { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A context-free expression, safe to use as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedExpr(SqlExpr);

impl NormalizedExpr {
    pub fn as_expr(&self) -> &SqlExpr {
        &self.0
    }

    pub fn into_expr(self) -> SqlExpr {
        self.0
    }

    /// Strips again. Normalized expressions are already context-free, so this
    /// is the identity on well-formed values.
    pub fn renormalize(&self) -> NormalizedExpr {
        self.0.normalize()
    }
}

impl From<&SqlExpr> for NormalizedExpr {
    fn from(expr: &SqlExpr) -> Self {
        expr.normalize()
    }
}

impl From<SqlExpr> for NormalizedExpr {
    fn from(expr: SqlExpr) -> Self {
        expr.normalize()
    }
}

impl fmt::Display for NormalizedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
