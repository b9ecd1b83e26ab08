//! AND / OR over compiled clauses.
//!
//! Two static clauses combine into another static clause. Anything else is
//! first coerced to a [`ParameterMatchClause`]:
//!
//! - AND yields the Cartesian product of both sides' assignments, merged
//!   key by key. Pairs that disagree on a shared parameter are dropped.
//! - OR yields both sides' assignments concatenated, and requires both
//!   sides to constrain the same parameters.

use std::collections::BTreeSet;

use tracing::trace;

use crate::ast::BinaryOp;
use crate::clause::{
    CompiledClause, FilterParameters, ParameterMatchClause, StaticRowValueClause,
};
use crate::error::CombineError;
use crate::functions::{evaluate_operator, operator_return_type};
use crate::schema::ExpressionType;
use crate::value::{is_truthy, SqliteValue, SQLITE_TRUE};

/// Combines two clauses with AND.
///
/// # Errors
///
/// Returns [`CombineError::MultipleUnbounded`] if both sides can produce
/// more than one assignment per input.
pub fn and_filters(
    a: CompiledClause,
    b: CompiledClause,
) -> Result<CompiledClause, CombineError> {
    if let (CompiledClause::StaticValue(a), CompiledClause::StaticValue(b)) = (&a, &b) {
        let (a, b) = (a.clone(), b.clone());
        return Ok(StaticRowValueClause::new(
            move |parameters| {
                let left = is_truthy(&a.evaluate(parameters));
                SqliteValue::from(left && is_truthy(&b.evaluate(parameters)))
            },
            |_| ExpressionType::INTEGER,
        )
        .into());
    }

    let a = to_boolean_parameter_set_clause(a);
    let b = to_boolean_parameter_set_clause(b);

    if a.is_unbounded() && b.is_unbounded() {
        return Err(CombineError::MultipleUnbounded);
    }

    let mut bucket_parameters = a.bucket_parameters().to_vec();
    bucket_parameters.extend_from_slice(b.bucket_parameters());
    let unbounded = a.is_unbounded() || b.is_unbounded();
    let error = a.is_error() || b.is_error();

    Ok(ParameterMatchClause::new(bucket_parameters, unbounded, move |parameters| {
        let left = a.filter(parameters)?;
        let right = b.filter(parameters)?;

        let mut results = Vec::with_capacity(left.len() * right.len());
        for l in &left {
            for r in &right {
                if let Some(merged) = merge_assignments(l, r) {
                    results.push(merged);
                }
            }
        }
        trace!(
            left = left.len(),
            right = right.len(),
            matched = results.len(),
            "AND filter"
        );
        Ok(results)
    })
    .with_error(error)
    .into())
}

/// Combines two clauses with OR.
///
/// # Errors
///
/// Returns [`CombineError::MismatchedParameters`] if the two sides do not
/// constrain the same set of bucket parameters.
pub fn or_filters(
    a: CompiledClause,
    b: CompiledClause,
) -> Result<CompiledClause, CombineError> {
    if let (CompiledClause::StaticValue(a), CompiledClause::StaticValue(b)) = (&a, &b) {
        let (a, b) = (a.clone(), b.clone());
        return Ok(StaticRowValueClause::new(
            move |parameters| {
                let left = is_truthy(&a.evaluate(parameters));
                SqliteValue::from(left || is_truthy(&b.evaluate(parameters)))
            },
            |_| ExpressionType::INTEGER,
        )
        .into());
    }

    let a = to_boolean_parameter_set_clause(a);
    let b = to_boolean_parameter_set_clause(b);
    or_parameter_set_clauses(a, b).map(Into::into)
}

/// Unions two match clauses over the same parameters.
///
/// # Errors
///
/// Returns [`CombineError::MismatchedParameters`] if the parameter sets
/// differ. Order does not matter.
pub fn or_parameter_set_clauses(
    a: ParameterMatchClause,
    b: ParameterMatchClause,
) -> Result<ParameterMatchClause, CombineError> {
    let left: BTreeSet<&String> = a.bucket_parameters().iter().collect();
    let right: BTreeSet<&String> = b.bucket_parameters().iter().collect();
    if left != right {
        return Err(CombineError::MismatchedParameters {
            left: a.bucket_parameters().to_vec(),
            right: b.bucket_parameters().to_vec(),
        });
    }

    let bucket_parameters = a.bucket_parameters().to_vec();
    let unbounded = a.is_unbounded() || b.is_unbounded();
    let error = a.is_error() || b.is_error();

    Ok(ParameterMatchClause::new(bucket_parameters, unbounded, move |parameters| {
        let mut results = a.filter(parameters)?;
        results.extend(b.filter(parameters)?);
        Ok(results)
    })
    .with_error(error))
}

/// Coerces any clause to a match clause.
///
/// - a match clause is returned as is;
/// - a static clause matches with no constraints when truthy, and not at
///   all otherwise;
/// - a bare parameter `p` behaves like `p = TRUE`;
/// - an error becomes an error match clause.
#[must_use]
pub fn to_boolean_parameter_set_clause(clause: CompiledClause) -> ParameterMatchClause {
    match clause {
        CompiledClause::ParameterMatch(clause) => clause,
        CompiledClause::StaticValue(clause) => {
            ParameterMatchClause::new(vec![], false, move |parameters| {
                if is_truthy(&clause.evaluate(parameters)) {
                    Ok(vec![FilterParameters::new()])
                } else {
                    Ok(vec![])
                }
            })
        }
        CompiledClause::ParameterValue(clause) => {
            let name = clause.bucket_parameter;
            ParameterMatchClause::new(vec![name.clone()], false, move |_| {
                Ok(vec![FilterParameters::from([(
                    name.clone(),
                    SqliteValue::Integer(SQLITE_TRUE),
                )])])
            })
        }
        CompiledClause::Error(_) => ParameterMatchClause::error(),
    }
}

/// Applies a binary operator to two static clauses.
#[must_use]
pub fn compile_static_operator(
    op: BinaryOp,
    left: StaticRowValueClause,
    right: StaticRowValueClause,
) -> StaticRowValueClause {
    let (l, r) = (left.clone(), right.clone());
    StaticRowValueClause::new(
        move |parameters| evaluate_operator(op, &l.evaluate(parameters), &r.evaluate(parameters)),
        move |schema| operator_return_type(op, left.result_type(schema), right.result_type(schema)),
    )
}

/// Merges two assignments. Returns `None` if they give a shared parameter
/// different values.
fn merge_assignments(a: &FilterParameters, b: &FilterParameters) -> Option<FilterParameters> {
    let mut merged = a.clone();
    for (name, value) in b {
        match merged.get(name) {
            Some(existing) if !existing.loosely_equals(value) => return None,
            Some(_) => {}
            None => {
                merged.insert(name.clone(), value.clone());
            }
        }
    }
    Some(merged)
}
