//! Data queries: which buckets a replicated row belongs to.
//!
//! ```sql
//! SELECT id, name, owner_id FROM lists WHERE lists.owner_id = bucket.user_id
//! ```
//!
//! The WHERE clause binds every declared bucket parameter; each assignment
//! it yields for a row places the row in one bucket.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, trace};

use crate::ast::{ExprKind, SelectStatement};
use crate::bucket_id::get_bucket_id;
use crate::clause::{ParameterMatchClause, StaticRowValueClause};
use crate::error::{Result, SqlRuleError};
use crate::parser::parse_select;
use crate::tools::{check_unsupported_features, SqlTools, SqlToolsOptions, BUCKET_TABLE};
use crate::value::{QueryParameters, SqliteRow, SqliteValue};

/// One output column of a data query.
#[derive(Debug, Clone)]
enum OutputColumn {
    /// `*`: every column of the row.
    AllColumns,
    /// A named value.
    Value {
        name: String,
        extractor: StaticRowValueClause,
    },
}

/// A row placed in a bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedRow {
    /// The bucket id.
    pub bucket: String,
    /// Source table name.
    pub table: String,
    /// The row's `id` column as text.
    pub id: String,
    /// Output columns.
    pub data: SqliteRow,
}

/// A compiled data query.
#[derive(Debug, Clone)]
pub struct SqlDataQuery {
    sql: String,
    descriptor: String,
    bucket_parameters: Vec<String>,
    source_table: Option<String>,
    table_alias: Option<String>,
    filter: ParameterMatchClause,
    columns: Vec<OutputColumn>,
    errors: Vec<SqlRuleError>,
}

impl SqlDataQuery {
    /// Parses and compiles `sql` for the rule `descriptor`, whose buckets
    /// are parameterized by `bucket_parameters` (names without the
    /// `bucket.` prefix).
    ///
    /// # Errors
    ///
    /// Returns an error if `sql` cannot be parsed, or if its WHERE clause
    /// combines clauses in a way that is never valid.
    pub fn from_sql(descriptor: &str, bucket_parameters: &[String], sql: &str) -> Result<Self> {
        let statement = parse_select(sql)?;
        Self::from_statement(descriptor, bucket_parameters, sql, &statement)
    }

    /// Compiles a parsed statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the WHERE clause combines clauses in a way that
    /// is never valid.
    pub fn from_statement(
        descriptor: &str,
        bucket_parameters: &[String],
        sql: &str,
        statement: &SelectStatement,
    ) -> Result<Self> {
        let mut errors = check_unsupported_features(sql, statement);

        let mut options = SqlToolsOptions::new(sql).with_value_tables(Vec::<String>::new());
        let (source_table, table_alias) = match &statement.from {
            Some(from) => {
                options = options.with_table(from.effective_name());
                (Some(from.name.clone()), Some(from.effective_name().to_string()))
            }
            None => {
                errors.push(SqlRuleError::new(
                    "Must SELECT from a single table",
                    sql,
                    Some(statement.span),
                ));
                (None, None)
            }
        };
        let tools = SqlTools::new(options);

        let (filter, filter_errors) = tools
            .compile_where_clause(statement.where_clause.as_ref())?
            .into_parts();
        errors.extend(filter_errors);

        let expected: BTreeSet<String> = bucket_parameters
            .iter()
            .map(|name| format!("{BUCKET_TABLE}.{name}"))
            .collect();
        let actual: BTreeSet<String> = filter.bucket_parameters().iter().cloned().collect();
        if !filter.is_error() && expected != actual {
            let message = format!(
                "Query must cover all bucket parameters. Expected: {expected:?} Got: {actual:?}"
            );
            let location = statement.where_clause.as_ref().map_or(statement.span, |w| w.span);
            errors.push(tools.error(message, Some(location)));
        }

        let mut columns = Vec::with_capacity(statement.columns.len());
        for column in &statement.columns {
            if matches!(column.expr.kind, ExprKind::Wildcard { .. }) && column.alias.is_none() {
                columns.push(OutputColumn::AllColumns);
                continue;
            }
            let name = match tools.output_name(column) {
                Ok(name) => name,
                Err(error) => {
                    errors.push(error);
                    continue;
                }
            };
            let (extractor, column_errors) =
                tools.compile_static_extractor(&column.expr)?.into_parts();
            errors.extend(column_errors);
            if let Some(extractor) = extractor {
                columns.push(OutputColumn::Value { name, extractor });
            }
        }

        debug!(
            descriptor,
            table = ?source_table,
            errors = errors.len(),
            "Compiled data query"
        );

        Ok(Self {
            sql: sql.to_string(),
            descriptor: descriptor.to_string(),
            bucket_parameters: bucket_parameters.to_vec(),
            source_table,
            table_alias,
            filter,
            columns,
            errors,
        })
    }

    /// True if rows of `table` are evaluated by this query.
    #[must_use]
    pub fn applies_to(&self, table: &str) -> bool {
        self.source_table.as_deref() == Some(table)
    }

    /// Places a row of `table` in its buckets.
    ///
    /// Returns one entry per distinct bucket. Rows of other tables, and
    /// assignments holding values that cannot be part of a bucket id, are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SyncRulesError::InvalidClause`](crate::SyncRulesError::InvalidClause)
    /// if the filter failed to compile.
    pub fn evaluate_row(&self, table: &str, row: &SqliteRow) -> Result<Vec<EvaluatedRow>> {
        if !self.applies_to(table) {
            return Ok(vec![]);
        }
        let alias = self.table_alias.as_deref().unwrap_or(table);
        let parameters = QueryParameters::new().with_table(alias, row.clone());

        let assignments = self.filter.filter(&parameters)?;
        trace!(
            descriptor = %self.descriptor,
            assignments = assignments.len(),
            "Evaluated row"
        );
        if assignments.is_empty() {
            return Ok(vec![]);
        }

        let names: Vec<String> = self
            .bucket_parameters
            .iter()
            .map(|name| format!("{BUCKET_TABLE}.{name}"))
            .collect();
        let mut seen = BTreeSet::new();
        let mut buckets = Vec::new();
        for assignment in &assignments {
            if assignment.values().any(|value| !value.is_json_value()) {
                continue;
            }
            let bucket = get_bucket_id(&self.descriptor, &names, assignment)?;
            if seen.insert(bucket.clone()) {
                buckets.push(bucket);
            }
        }
        if buckets.is_empty() {
            return Ok(vec![]);
        }

        let data = self.output_data(&parameters, row);
        let id = row
            .get("id")
            .and_then(SqliteValue::to_text)
            .unwrap_or_default();

        Ok(buckets
            .into_iter()
            .map(|bucket| EvaluatedRow {
                bucket,
                table: table.to_string(),
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    fn output_data(&self, parameters: &QueryParameters, row: &SqliteRow) -> SqliteRow {
        let mut data = SqliteRow::new();
        for column in &self.columns {
            match column {
                OutputColumn::AllColumns => {
                    data.extend(row.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                OutputColumn::Value { name, extractor } => {
                    data.insert(name.clone(), extractor.evaluate(parameters));
                }
            }
        }
        data
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Declared bucket parameter names, without the `bucket.` prefix.
    #[must_use]
    pub fn bucket_parameters(&self) -> &[String] {
        &self.bucket_parameters
    }

    /// The table rows are read from.
    #[must_use]
    pub fn source_table(&self) -> Option<&str> {
        self.source_table.as_deref()
    }

    #[must_use]
    pub const fn filter(&self) -> &ParameterMatchClause {
        &self.filter
    }

    #[must_use]
    pub fn errors(&self) -> &[SqlRuleError] {
        &self.errors
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, SqliteValue)]) -> SqliteRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_wildcard_copies_row() {
        let query = SqlDataQuery::from_sql(
            "by_owner",
            &[String::from("user_id")],
            "SELECT * FROM lists WHERE lists.owner_id = bucket.user_id",
        )
        .unwrap();
        assert!(!query.has_errors(), "{:?}", query.errors());

        let input = row(&[("id", "l1".into()), ("owner_id", "u1".into())]);
        let rows = query.evaluate_row("lists", &input).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bucket, r#"by_owner["u1"]"#);
        assert_eq!(rows[0].id, "l1");
        assert_eq!(rows[0].data, input);
    }

    #[test]
    fn test_other_tables_are_ignored() {
        let query = SqlDataQuery::from_sql("all", &[], "SELECT id FROM lists").unwrap();
        assert!(query.applies_to("lists"));
        let rows = query
            .evaluate_row("todos", &row(&[("id", "t1".into())]))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_from_is_reported() {
        let query = SqlDataQuery::from_sql("q", &[], "SELECT 1 AS one").unwrap();
        assert_eq!(query.errors()[0].message, "Must SELECT from a single table");
        assert!(query.source_table().is_none());
    }
}
