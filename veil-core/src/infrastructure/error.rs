// veil-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(veil::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(veil::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(veil::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(veil::infra::config_missing))]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(veil::infra::validation))]
    Validation(#[from] validator::ValidationErrors),

    // --- SQL EXPRESSIONS ---
    #[error("SQL Parsing Error in '{sql}': {source}")]
    #[diagnostic(
        code(veil::infra::sql),
        help("Expressions are parsed with the generic SQL dialect.")
    )]
    SqlParse {
        sql: String,
        source: sqlparser::parser::ParserError,
    },

    #[error("Unsupported expression: {0}")]
    #[diagnostic(
        code(veil::infra::unsupported_expr),
        help("Only columns, literals, arithmetic, comparisons, boolean operators and plain function calls can key a design.")
    )]
    UnsupportedExpression(String),
}
