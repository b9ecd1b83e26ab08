//! Compiles parsed rule expressions into [`CompiledClause`]s.

use serde_json::Value as JsonValue;

use crate::ast::{
    BinaryOp, Expr, ExprKind, FunctionCall, InTarget, Literal, SelectColumn, SelectStatement,
    UnaryOp,
};
use crate::clause::{
    ClauseError, CompiledClause, FilterParameters, ParameterMatchClause, ParameterValueClause,
    StaticRowValueClause,
};
use crate::compiled::Compiled;
use crate::error::{CombineError, SqlRuleError};
use crate::filters::{
    and_filters, compile_static_operator, or_filters, to_boolean_parameter_set_clause,
};
use crate::functions::{
    cast_return_type, cast_value, evaluate_operator, evaluate_unary, unary_return_type,
    ScalarFunction,
};
use crate::lexer::Span;
use crate::schema::ExpressionType;
use crate::value::{is_truthy, QueryParameters, SqliteValue, SQLITE_FALSE, SQLITE_TRUE};

/// Table holding bucket parameters.
pub const BUCKET_TABLE: &str = "bucket";
/// Parameters derived from the session token.
pub const TOKEN_PARAMETERS_TABLE: &str = "token_parameters";
/// Parameters supplied by the client.
pub const USER_PARAMETERS_TABLE: &str = "user_parameters";

/// Which tables an expression may refer to, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlToolsOptions {
    /// The full SQL text, for diagnostics.
    pub sql: String,
    /// The row table. Unqualified columns resolve to it.
    pub table: Option<String>,
    /// Tables whose columns are bucket parameters.
    pub parameter_tables: Vec<String>,
    /// Tables whose columns are read as plain values.
    pub value_tables: Vec<String>,
}

impl SqlToolsOptions {
    /// Options for a query with no row table, reading the token and user
    /// parameters and matching `bucket` parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            table: None,
            parameter_tables: vec![String::from(BUCKET_TABLE)],
            value_tables: vec![
                String::from(TOKEN_PARAMETERS_TABLE),
                String::from(USER_PARAMETERS_TABLE),
            ],
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_value_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_parameter_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_tables = tables.into_iter().map(Into::into).collect();
        self
    }
}

/// Expression compiler for one query.
#[derive(Debug, Clone)]
pub struct SqlTools {
    options: SqlToolsOptions,
}

impl SqlTools {
    #[must_use]
    pub const fn new(options: SqlToolsOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.options.sql
    }

    #[must_use]
    pub const fn options(&self) -> &SqlToolsOptions {
        &self.options
    }

    /// Creates a diagnostic for this query.
    #[must_use]
    pub fn error(&self, message: impl Into<String>, location: Option<Span>) -> SqlRuleError {
        SqlRuleError::new(message, self.options.sql.clone(), location)
    }

    fn error_clause(&self, message: impl Into<String>, span: Span) -> Compiled<CompiledClause> {
        Compiled::with_error(ClauseError.into(), self.error(message, Some(span)))
    }

    /// Compiles an optional WHERE clause into the query filter. A missing
    /// WHERE clause matches everything with no constraints.
    ///
    /// # Errors
    ///
    /// Returns a [`CombineError`] if an AND or OR cannot be combined.
    pub fn compile_where_clause(
        &self,
        where_clause: Option<&Expr>,
    ) -> Result<Compiled<ParameterMatchClause>, CombineError> {
        let compiled = match where_clause {
            Some(expr) => self.compile_clause(expr)?,
            None => Compiled::ok(
                StaticRowValueClause::constant(SqliteValue::Integer(SQLITE_TRUE)).into(),
            ),
        };
        Ok(compiled.map(to_boolean_parameter_set_clause))
    }

    /// Compiles an expression.
    ///
    /// # Errors
    ///
    /// Returns a [`CombineError`] if an AND or OR cannot be combined.
    /// Every other problem is reported as a diagnostic alongside an error
    /// clause.
    pub fn compile_clause(&self, expr: &Expr) -> Result<Compiled<CompiledClause>, CombineError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(Compiled::ok(
                StaticRowValueClause::constant(literal_value(literal)).into(),
            )),

            ExprKind::Column { table, name } => {
                Ok(self.compile_column(table.as_deref(), name, expr.span))
            }

            ExprKind::Wildcard { .. } => {
                Ok(self.error_clause("* is not supported here", expr.span))
            }

            ExprKind::Binary { left, op, right } => self.compile_binary(*op, left, right),

            ExprKind::Unary { op, operand } => {
                let op = *op;
                let operands = self.compile_static_operands(&[operand.as_ref()])?;
                Ok(static_clause(operands, |mut clauses| {
                    let operand = clauses.remove(0);
                    let type_source = operand.clone();
                    StaticRowValueClause::new(
                        move |parameters| evaluate_unary(op, &operand.evaluate(parameters)),
                        move |schema| unary_return_type(op, type_source.result_type(schema)),
                    )
                }))
            }

            ExprKind::IsNull { expr: inner, negated } => {
                let negated = *negated;
                let operands = self.compile_static_operands(&[inner.as_ref()])?;
                Ok(static_clause(operands, |mut clauses| {
                    let operand = clauses.remove(0);
                    StaticRowValueClause::new(
                        move |parameters| {
                            SqliteValue::from(operand.evaluate(parameters).is_null() != negated)
                        },
                        |_| ExpressionType::INTEGER,
                    )
                }))
            }

            ExprKind::In {
                expr: left,
                target,
                negated,
            } => self.compile_in(left, target, *negated, expr.span),

            ExprKind::Between {
                expr: value,
                low,
                high,
                negated,
            } => {
                let negated = *negated;
                let operands =
                    self.compile_static_operands(&[value.as_ref(), low.as_ref(), high.as_ref()])?;
                Ok(static_clause(operands, |clauses| {
                    StaticRowValueClause::new(
                        move |parameters| {
                            let value = clauses[0].evaluate(parameters);
                            let low = clauses[1].evaluate(parameters);
                            let high = clauses[2].evaluate(parameters);
                            let result = evaluate_operator(
                                BinaryOp::And,
                                &evaluate_operator(BinaryOp::GtEq, &value, &low),
                                &evaluate_operator(BinaryOp::LtEq, &value, &high),
                            );
                            if negated {
                                evaluate_unary(UnaryOp::Not, &result)
                            } else {
                                result
                            }
                        },
                        |_| ExpressionType::INTEGER,
                    )
                }))
            }

            ExprKind::Cast { expr: inner, cast_as } => {
                let cast_as = *cast_as;
                let operands = self.compile_static_operands(&[inner.as_ref()])?;
                Ok(static_clause(operands, |mut clauses| {
                    let operand = clauses.remove(0);
                    StaticRowValueClause::new(
                        move |parameters| cast_value(&operand.evaluate(parameters), cast_as),
                        move |_| cast_return_type(cast_as),
                    )
                }))
            }

            ExprKind::Function(call) => self.compile_function(call, expr.span),
        }
    }

    /// Compiles an output column expression into a value extractor.
    ///
    /// Returns `None` as the value if the expression failed to compile or
    /// depends on bucket parameters; the diagnostic is included.
    ///
    /// # Errors
    ///
    /// Returns a [`CombineError`] if an AND or OR cannot be combined.
    pub fn compile_static_extractor(
        &self,
        expr: &Expr,
    ) -> Result<Compiled<Option<StaticRowValueClause>>, CombineError> {
        let (clause, mut errors) = self.compile_clause(expr)?.into_parts();
        let extractor = self.require_static(clause, expr.span);
        errors.extend(extractor.errors);
        Ok(Compiled {
            value: extractor.value,
            errors,
        })
    }

    /// The name an output column is exposed under: its alias, or the name
    /// of the column it selects.
    ///
    /// # Errors
    ///
    /// Returns a diagnostic for `*` and for unaliased expressions.
    pub fn output_name(&self, column: &SelectColumn) -> Result<String, SqlRuleError> {
        if let Some(alias) = &column.alias {
            return Ok(alias.clone());
        }
        match &column.expr.kind {
            ExprKind::Column { name, .. } => Ok(name.clone()),
            ExprKind::Wildcard { .. } => Err(self.error(
                "* columns are not supported here",
                Some(column.expr.span),
            )),
            _ => Err(self.error("alias is required", Some(column.expr.span))),
        }
    }

    fn compile_column(
        &self,
        table: Option<&str>,
        name: &str,
        span: Span,
    ) -> Compiled<CompiledClause> {
        let table = match (table, self.options.table.as_deref()) {
            (Some(table), _) | (None, Some(table)) => table,
            (None, None) => {
                return self.error_clause(
                    format!("Column '{name}' must be qualified with a table name"),
                    span,
                );
            }
        };

        if self.options.parameter_tables.iter().any(|t| t == table) {
            return Compiled::ok(
                ParameterValueClause {
                    bucket_parameter: format!("{table}.{name}"),
                }
                .into(),
            );
        }

        let is_row_table = self.options.table.as_deref() == Some(table);
        if is_row_table || self.options.value_tables.iter().any(|t| t == table) {
            let (value_table, value_column) = (table.to_string(), name.to_string());
            let (type_table, type_column) = (value_table.clone(), value_column.clone());
            return Compiled::ok(
                StaticRowValueClause::new(
                    move |parameters| parameters.get(&value_table, &value_column).clone(),
                    move |schema| schema.column_type_or_any(&type_table, &type_column),
                )
                .into(),
            );
        }

        self.error_clause(format!("Undefined table {table}"), span)
    }

    fn compile_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Compiled<CompiledClause>, CombineError> {
        let l = self.compile_clause(left)?;
        let r = self.compile_clause(right)?;

        match op {
            BinaryOp::And => return l.zip(r).try_map(|(l, r)| and_filters(l, r)),
            BinaryOp::Or => return l.zip(r).try_map(|(l, r)| or_filters(l, r)),
            _ => {}
        }

        if op == BinaryOp::Eq {
            let (pair, errors) = l.zip(r).into_parts();
            let matched = match &pair {
                (CompiledClause::ParameterValue(parameter), CompiledClause::StaticValue(value))
                | (
                    CompiledClause::StaticValue(value),
                    CompiledClause::ParameterValue(parameter),
                ) => {
                    Some(parameter_equals(parameter.bucket_parameter.clone(), value.clone()))
                }
                _ => None,
            };
            if let Some(matched) = matched {
                return Ok(Compiled {
                    value: matched.into(),
                    errors,
                });
            }
            let l = Compiled {
                value: pair.0,
                errors,
            };
            let r = Compiled::ok(pair.1);
            return Ok(self.compile_operator(op, (l, left.span), (r, right.span)));
        }

        Ok(self.compile_operator(op, (l, left.span), (r, right.span)))
    }

    fn compile_operator(
        &self,
        op: BinaryOp,
        left: (Compiled<CompiledClause>, Span),
        right: (Compiled<CompiledClause>, Span),
    ) -> Compiled<CompiledClause> {
        let operands = self.statics(vec![left, right]);
        static_clause(operands, |mut clauses| {
            let right = clauses.remove(1);
            let left = clauses.remove(0);
            compile_static_operator(op, left, right)
        })
    }

    fn compile_in(
        &self,
        left: &Expr,
        target: &InTarget,
        negated: bool,
        span: Span,
    ) -> Result<Compiled<CompiledClause>, CombineError> {
        let value = self.compile_clause(left)?;
        let items = match target {
            InTarget::List(list) => {
                let refs: Vec<&Expr> = list.iter().collect();
                self.compile_static_operands(&refs)?
                    .map(|clauses| clauses.map(InItems::List))
            }
            InTarget::Array(array) => self
                .compile_static_operands(&[array.as_ref()])?
                .map(|clauses| clauses.map(|mut c| InItems::Array(c.remove(0)))),
        };

        let (value, mut errors) = value.into_parts();
        let (items, item_errors) = items.into_parts();
        errors.extend(item_errors);

        let clause: CompiledClause = match (value, items) {
            (CompiledClause::ParameterValue(_), _) if negated => {
                errors.push(self.error("Cannot use NOT IN with bucket parameters", Some(span)));
                ClauseError.into()
            }
            (CompiledClause::ParameterValue(parameter), Some(items)) => {
                let name = parameter.bucket_parameter;
                ParameterMatchClause::new(vec![name.clone()], true, move |parameters| {
                    Ok(items
                        .evaluate(parameters)
                        .into_iter()
                        .filter(|item| !item.is_null())
                        .map(|item| FilterParameters::from([(name.clone(), item)]))
                        .collect())
                })
                .into()
            }
            (CompiledClause::StaticValue(value), Some(items)) => StaticRowValueClause::new(
                move |parameters| {
                    let result =
                        in_values(&value.evaluate(parameters), &items.evaluate(parameters));
                    if negated {
                        evaluate_unary(UnaryOp::Not, &result)
                    } else {
                        result
                    }
                },
                |_| ExpressionType::INTEGER,
            )
            .into(),
            (CompiledClause::ParameterMatch(_), _) => {
                errors.push(self.error(
                    "Cannot use bucket parameters in expressions",
                    Some(left.span),
                ));
                ClauseError.into()
            }
            _ => ClauseError.into(),
        };

        Ok(Compiled {
            value: clause,
            errors,
        })
    }

    fn compile_function(
        &self,
        call: &FunctionCall,
        span: Span,
    ) -> Result<Compiled<CompiledClause>, CombineError> {
        let Some(function) = ScalarFunction::from_name(&call.name) else {
            return Ok(self.error_clause(format!("Function '{}' is not defined", call.name), span));
        };
        if let Err(message) = function.check_arity(call.args.len()) {
            return Ok(self.error_clause(message, span));
        }

        let args: Vec<&Expr> = call.args.iter().collect();
        let operands = self.compile_static_operands(&args)?;
        Ok(static_clause(operands, |clauses| {
            let type_sources = clauses.clone();
            StaticRowValueClause::new(
                move |parameters| {
                    let values: Vec<SqliteValue> =
                        clauses.iter().map(|c| c.evaluate(parameters)).collect();
                    function.evaluate(&values)
                },
                move |schema| {
                    let types: Vec<ExpressionType> =
                        type_sources.iter().map(|c| c.result_type(schema)).collect();
                    function.return_type(&types)
                },
            )
        }))
    }

    /// Compiles operands that must all be static.
    fn compile_static_operands(
        &self,
        exprs: &[&Expr],
    ) -> Result<Compiled<Option<Vec<StaticRowValueClause>>>, CombineError> {
        let mut compiled = Vec::with_capacity(exprs.len());
        for expr in exprs {
            compiled.push((self.compile_clause(expr)?, expr.span));
        }
        Ok(self.statics(compiled))
    }

    /// Requires every operand to be static. The value is `None` if any is
    /// not; operands that are already errors add no further diagnostic.
    fn statics(
        &self,
        operands: Vec<(Compiled<CompiledClause>, Span)>,
    ) -> Compiled<Option<Vec<StaticRowValueClause>>> {
        let mut result = Compiled::ok(Some(Vec::with_capacity(operands.len())));
        for (operand, span) in operands {
            let (clause, errors) = operand.into_parts();
            result.errors.extend(errors);
            let required = self.require_static(clause, span);
            result.errors.extend(required.errors);
            match (required.value, result.value.as_mut()) {
                (Some(clause), Some(clauses)) => clauses.push(clause),
                _ => result.value = None,
            }
        }
        result
    }

    fn require_static(
        &self,
        clause: CompiledClause,
        span: Span,
    ) -> Compiled<Option<StaticRowValueClause>> {
        match clause {
            CompiledClause::StaticValue(clause) => Compiled::ok(Some(clause)),
            CompiledClause::Error(_) => Compiled::ok(None),
            CompiledClause::ParameterValue(_) | CompiledClause::ParameterMatch(_) => {
                Compiled::with_error(
                    None,
                    self.error("Cannot use bucket parameters in expressions", Some(span)),
                )
            }
        }
    }
}

/// Reports every clause of `statement` that bucket queries do not support.
#[must_use]
pub fn check_unsupported_features(sql: &str, statement: &SelectStatement) -> Vec<SqlRuleError> {
    let mut errors = Vec::new();
    let mut report = |message: &str, location: Option<Span>| {
        errors.push(SqlRuleError::new(message, sql, location));
    };

    if let Some(limit) = &statement.limit {
        report("LIMIT is not supported", Some(limit.span));
    }
    if let Some(order) = statement.order_by.first() {
        report("ORDER BY is not supported", Some(order.expr.span));
    }
    if let Some(offset) = &statement.offset {
        report("OFFSET is not supported", Some(offset.span));
    }
    if let Some(having) = &statement.having {
        report("HAVING is not supported", Some(having.span));
    }
    if let Some(group) = statement.group_by.first() {
        report("GROUP BY is not supported", Some(group.span));
    }
    if let Some(distinct) = statement.distinct {
        report("DISTINCT is not supported", Some(distinct));
    }
    if let Some(locking) = &statement.locking {
        report("SELECT FOR is not supported", Some(locking.span));
    }

    errors
}

/// Values on the right of an `IN`.
#[derive(Clone)]
enum InItems {
    List(Vec<StaticRowValueClause>),
    /// A JSON array, as text.
    Array(StaticRowValueClause),
}

impl InItems {
    fn evaluate(&self, parameters: &QueryParameters) -> Vec<SqliteValue> {
        match self {
            Self::List(items) => items.iter().map(|item| item.evaluate(parameters)).collect(),
            Self::Array(array) => json_array_items(&array.evaluate(parameters)),
        }
    }
}

/// Elements of a JSON array held as text. Anything else has no elements.
fn json_array_items(value: &SqliteValue) -> Vec<SqliteValue> {
    let SqliteValue::Text(text) = value else {
        return vec![];
    };
    match serde_json::from_str::<JsonValue>(text) {
        Ok(JsonValue::Array(items)) => items.into_iter().map(SqliteValue::from).collect(),
        _ => vec![],
    }
}

/// `value IN (items)` with SQL NULL semantics.
fn in_values(value: &SqliteValue, items: &[SqliteValue]) -> SqliteValue {
    if items.is_empty() {
        return SqliteValue::Integer(SQLITE_FALSE);
    }
    if value.is_null() {
        return SqliteValue::Null;
    }
    let mut saw_null = false;
    for item in items {
        if item.is_null() {
            saw_null = true;
        } else if is_truthy(&evaluate_operator(BinaryOp::Eq, value, item)) {
            return SqliteValue::Integer(SQLITE_TRUE);
        }
    }
    if saw_null {
        SqliteValue::Null
    } else {
        SqliteValue::Integer(SQLITE_FALSE)
    }
}

/// `bucket.p = value`: one assignment, or none when the value is NULL.
fn parameter_equals(name: String, value: StaticRowValueClause) -> ParameterMatchClause {
    ParameterMatchClause::new(vec![name.clone()], false, move |parameters| {
        let value = value.evaluate(parameters);
        if value.is_null() {
            return Ok(vec![]);
        }
        Ok(vec![FilterParameters::from([(name.clone(), value)])])
    })
}

/// Builds a static clause from compiled operands, or an error clause if any
/// operand is missing.
fn static_clause(
    operands: Compiled<Option<Vec<StaticRowValueClause>>>,
    build: impl FnOnce(Vec<StaticRowValueClause>) -> StaticRowValueClause,
) -> Compiled<CompiledClause> {
    operands.map(|clauses| clauses.map_or(ClauseError.into(), |clauses| build(clauses).into()))
}

fn literal_value(literal: &Literal) -> SqliteValue {
    match literal {
        Literal::Integer(n) => SqliteValue::Integer(*n),
        Literal::Float(f) => SqliteValue::Real(*f),
        Literal::String(s) => SqliteValue::Text(s.clone()),
        Literal::Blob(b) => SqliteValue::Blob(b.clone()),
        Literal::Boolean(b) => SqliteValue::from(*b),
        Literal::Null => SqliteValue::Null,
    }
}
