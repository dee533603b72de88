// veil-core/src/infrastructure/sql.rs
//
// SQL text -> SqlExpr. Parsing goes through sqlparser's generic dialect; the
// walk below keeps only the node kinds a design can be keyed on.

use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, Ident, Spanned,
    UnaryOperator, Value,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;
use tracing::debug;

use crate::domain::expr::{BinaryOp, Literal, ParseContext, SqlExpr, UnaryOp};
use crate::infrastructure::error::InfrastructureError;

pub struct ExprParser;

impl ExprParser {
    /// Parses a single scalar expression such as `l_price * (1 - l_discount)`.
    pub fn parse(sql: &str) -> Result<SqlExpr, InfrastructureError> {
        let dialect = GenericDialect {};
        let ast = Parser::new(&dialect)
            .try_with_sql(sql)
            .and_then(|mut p| {
                let expr = p.parse_expr()?;
                p.expect_token(&Token::EOF)?;
                Ok(expr)
            })
            .map_err(|source| InfrastructureError::SqlParse {
                sql: sql.to_string(),
                source,
            })?;

        let expr = Self::convert(&ast)?;
        debug!(input = sql, parsed = %expr, "Parsed expression");
        Ok(expr)
    }

    fn convert(expr: &Expr) -> Result<SqlExpr, InfrastructureError> {
        let converted = match expr {
            Expr::Identifier(ident) => SqlExpr::Field {
                name: Self::ident_name(ident),
                ctx: Some(Self::context(expr, None)),
            },
            Expr::CompoundIdentifier(parts) => match parts.as_slice() {
                [qualifier, column] => SqlExpr::Field {
                    name: Self::ident_name(column),
                    ctx: Some(Self::context(expr, Some(Self::ident_name(qualifier)))),
                },
                _ => return Err(Self::unsupported(expr)),
            },
            Expr::Value(v) => {
                let value = match &v.value {
                    Value::Number(n, _) => Literal::Number(n.clone()),
                    Value::SingleQuotedString(s) => Literal::String(s.clone()),
                    Value::Boolean(b) => Literal::Boolean(*b),
                    Value::Null => Literal::Null,
                    _ => return Err(Self::unsupported(expr)),
                };
                SqlExpr::Literal {
                    value,
                    ctx: Some(Self::context(expr, None)),
                }
            }
            Expr::BinaryOp { left, op, right } => SqlExpr::Binary {
                left: Box::new(Self::convert(left)?),
                op: Self::binary_op(op).ok_or_else(|| Self::unsupported(expr))?,
                right: Box::new(Self::convert(right)?),
                ctx: Some(Self::context(expr, None)),
            },
            Expr::UnaryOp { op, expr: inner } => {
                let op = match op {
                    // `+x` is `x`
                    UnaryOperator::Plus => return Self::convert(inner),
                    UnaryOperator::Minus => UnaryOp::Minus,
                    UnaryOperator::Not => UnaryOp::Not,
                    _ => return Err(Self::unsupported(expr)),
                };
                SqlExpr::Unary {
                    op,
                    expr: Box::new(Self::convert(inner)?),
                    ctx: Some(Self::context(expr, None)),
                }
            }
            Expr::Nested(inner) => Self::convert(inner)?,
            Expr::Function(func) => {
                let args = match &func.args {
                    FunctionArguments::None => Vec::new(),
                    FunctionArguments::List(list) => list
                        .args
                        .iter()
                        .map(|arg| match arg {
                            FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => Self::convert(e),
                            _ => Err(Self::unsupported(expr)),
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    FunctionArguments::Subquery(_) => return Err(Self::unsupported(expr)),
                };
                SqlExpr::Function {
                    name: func.name.to_string().to_lowercase(),
                    args,
                    ctx: Some(Self::context(expr, None)),
                }
            }
            _ => return Err(Self::unsupported(expr)),
        };
        Ok(converted)
    }

    /// Unquoted identifiers are case-insensitive and fold to lowercase.
    fn ident_name(ident: &Ident) -> String {
        match ident.quote_style {
            Some(_) => ident.value.clone(),
            None => ident.value.to_lowercase(),
        }
    }

    fn context(expr: &Expr, scope: Option<String>) -> ParseContext {
        let span = expr.span();
        ParseContext {
            scope,
            line: span.start.line,
            column: span.start.column,
        }
    }

    fn binary_op(op: &BinaryOperator) -> Option<BinaryOp> {
        let op = match op {
            BinaryOperator::Plus => BinaryOp::Plus,
            BinaryOperator::Minus => BinaryOp::Minus,
            BinaryOperator::Multiply => BinaryOp::Multiply,
            BinaryOperator::Divide => BinaryOp::Divide,
            BinaryOperator::Modulo => BinaryOp::Modulo,
            BinaryOperator::Eq => BinaryOp::Eq,
            BinaryOperator::NotEq => BinaryOp::NotEq,
            BinaryOperator::Lt => BinaryOp::Lt,
            BinaryOperator::LtEq => BinaryOp::LtEq,
            BinaryOperator::Gt => BinaryOp::Gt,
            BinaryOperator::GtEq => BinaryOp::GtEq,
            BinaryOperator::And => BinaryOp::And,
            BinaryOperator::Or => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    fn unsupported(expr: &Expr) -> InfrastructureError {
        InfrastructureError::UnsupportedExpression(expr.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arithmetic() -> anyhow::Result<()> {
        let expr = ExprParser::parse("L_EXTENDEDPRICE * (1 - l_discount)")?;
        let expected = SqlExpr::binary(
            SqlExpr::field("l_extendedprice"),
            BinaryOp::Multiply,
            SqlExpr::binary(SqlExpr::number("1"), BinaryOp::Minus, SqlExpr::field("l_discount")),
        );
        assert_eq!(expr.normalize().as_expr(), &expected);
        assert_eq!(expr.to_string(), "l_extendedprice * (1 - l_discount)");
        Ok(())
    }

    #[test]
    fn test_qualified_column_keeps_scope() -> anyhow::Result<()> {
        let expr = ExprParser::parse("e.Salary")?;
        assert_eq!(expr.as_field(), Some("salary"));
        let ctx = expr.context().unwrap();
        assert_eq!(ctx.scope.as_deref(), Some("e"));
        assert_eq!(ctx.line, 1);
        // Context never leaks into keys.
        assert_eq!(expr.normalize().as_expr(), &SqlExpr::field("salary"));
        Ok(())
    }

    #[test]
    fn test_quoted_identifier_keeps_case() -> anyhow::Result<()> {
        let expr = ExprParser::parse("\"MixedCase\"")?;
        assert_eq!(expr.as_field(), Some("MixedCase"));
        Ok(())
    }

    #[test]
    fn test_parse_function_and_literals() -> anyhow::Result<()> {
        let expr = ExprParser::parse("COALESCE(bonus, 0) + -rate")?;
        assert_eq!(expr.to_string(), "coalesce(bonus, 0) + -rate");

        let expr = ExprParser::parse("status = 'open' AND NOT archived")?;
        assert!(matches!(expr, SqlExpr::Binary { op: BinaryOp::And, .. }));
        Ok(())
    }

    #[test]
    fn test_rendered_sql_parses_to_same_key() -> anyhow::Result<()> {
        for text in [
            "(NOT a) = b",
            "NOT a = b",
            "- -x",
            "NOT (NOT flag)",
            "-(a + b) * c",
            "coalesce(bonus, 0) + -rate",
            "status = 'it''s' AND NOT archived OR x < 1.5",
        ] {
            let expr = ExprParser::parse(text)?;
            let rendered = expr.to_string();
            let reparsed = ExprParser::parse(&rendered)?;
            assert_eq!(reparsed.normalize(), expr.normalize(), "{text} -> {rendered}");
        }

        assert_eq!(ExprParser::parse("(NOT a) = b")?.to_string(), "(NOT a) = b");
        assert_eq!(ExprParser::parse("- -x")?.to_string(), "-(-x)");
        Ok(())
    }

    #[test]
    fn test_same_expression_same_key() -> anyhow::Result<()> {
        let a = ExprParser::parse("price*qty")?;
        let b = ExprParser::parse("  PRICE * qty ")?;
        assert_ne!(a, b);
        assert_eq!(a.normalize(), b.normalize());
        Ok(())
    }

    #[test]
    fn test_rejects_unsupported() {
        assert!(matches!(
            ExprParser::parse("CASE WHEN a THEN 1 END"),
            Err(InfrastructureError::UnsupportedExpression(_))
        ));
        assert!(matches!(
            ExprParser::parse("a.b.c"),
            Err(InfrastructureError::UnsupportedExpression(_))
        ));
        assert!(matches!(
            ExprParser::parse("price *"),
            Err(InfrastructureError::SqlParse { .. })
        ));
        assert!(matches!(
            ExprParser::parse("price qty"),
            Err(InfrastructureError::SqlParse { .. })
        ));
    }
}
