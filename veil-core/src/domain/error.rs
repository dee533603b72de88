// veil-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, PartialEq, Eq)]
pub enum DomainError {
    #[error("Expected exactly one onion, got mask {0}")]
    #[diagnostic(
        code(veil::domain::not_single_onion),
        help("Masks accumulate through repeated single-onion calls, never through one multi-bit call.")
    )]
    NotSingleOnion(String),

    #[error("PLAIN is not a permitted onion here (relation '{relation}')")]
    #[diagnostic(code(veil::domain::plain_onion))]
    PlainOnion { relation: String },

    #[error("Onion {0} cannot be bound as a regular onion")]
    #[diagnostic(
        code(veil::domain::irregular_onion),
        help("PLAIN, HOM, HOM_AGG and HOM_ROW_DESC have dedicated binding shapes.")
    )]
    IrregularOnion(String),

    #[error("Unsatisfiable onion selection from mask {0}")]
    #[diagnostic(code(veil::domain::unsatisfiable))]
    UnsatisfiableSelection(String),

    #[error("Homomorphic group {index} of relation '{relation}' does not exist ({len} groups)")]
    #[diagnostic(code(veil::domain::group_out_of_range))]
    GroupIndexOutOfRange {
        relation: String,
        index: usize,
        len: usize,
    },

    #[error("Relation '{0}' is missing from the canonical precomputed expression list")]
    #[diagnostic(code(veil::domain::canonical_relation))]
    MissingCanonicalRelation(String),

    #[error("Expression '{expr}' of relation '{relation}' is missing from the canonical precomputed expression list")]
    #[diagnostic(
        code(veil::domain::canonical_expr),
        help("Every precomputed expression of the design must appear in the canonical list.")
    )]
    MissingCanonicalExpression { relation: String, expr: String },

    #[error("Name '{name}' is already assigned to another expression of relation '{relation}'")]
    #[diagnostic(code(veil::domain::duplicate_name))]
    DuplicateName { relation: String, name: String },

    #[error("No admissible plan for the query under this physical design")]
    #[diagnostic(
        code(veil::domain::no_plan),
        help("Complete the design against the schema before planning.")
    )]
    NoAdmissiblePlan,
}
