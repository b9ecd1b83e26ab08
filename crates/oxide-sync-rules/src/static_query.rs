//! Bucket parameter queries that read no table.
//!
//! ```sql
//! SELECT token_parameters.user_id AS user_id
//! SELECT token_parameters.org_id AS org_id WHERE token_parameters.is_admin
//! ```
//!
//! Such a query resolves buckets from the session parameters alone.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::ast::SelectStatement;
use crate::bucket_id::get_bucket_id;
use crate::clause::{ParameterMatchClause, StaticRowValueClause};
use crate::error::{Result, SqlRuleError};
use crate::parameters::SyncParameters;
use crate::parser::parse_select;
use crate::tools::{check_unsupported_features, SqlTools, SqlToolsOptions};
use crate::value::QueryParameters;

/// A compiled static bucket parameter query.
///
/// Compilation problems are collected in [`errors`](Self::errors) rather
/// than failing construction. Bucket ids of a query with errors are not
/// reliable.
#[derive(Debug, Clone)]
pub struct StaticSqlParameterQuery {
    sql: String,
    descriptor: String,
    bucket_parameters: Vec<String>,
    filter: ParameterMatchClause,
    static_extractors: BTreeMap<String, StaticRowValueClause>,
    errors: Vec<SqlRuleError>,
}

impl StaticSqlParameterQuery {
    /// Parses and compiles `sql` for the rule `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns an error if `sql` cannot be parsed, or if its WHERE clause
    /// combines clauses in a way that is never valid.
    pub fn from_sql(descriptor: &str, sql: &str) -> Result<Self> {
        let statement = parse_select(sql)?;
        Self::from_statement(descriptor, sql, &statement)
    }

    /// Compiles a parsed statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the WHERE clause combines clauses in a way that
    /// is never valid.
    pub fn from_statement(
        descriptor: &str,
        sql: &str,
        statement: &SelectStatement,
    ) -> Result<Self> {
        // Only the session parameter tables are in scope; `bucket.*` is not.
        let tools = SqlTools::new(
            SqlToolsOptions::new(sql).with_parameter_tables(Vec::<String>::new()),
        );
        let mut errors = check_unsupported_features(sql, statement);

        if let Some(from) = &statement.from {
            errors.push(tools.error(
                "FROM is not supported in static parameter queries",
                Some(from.span),
            ));
        }

        let (filter, filter_errors) = tools
            .compile_where_clause(statement.where_clause.as_ref())?
            .into_parts();
        errors.extend(filter_errors);

        let mut bucket_parameters = Vec::with_capacity(statement.columns.len());
        let mut static_extractors = BTreeMap::new();
        for column in &statement.columns {
            let name = match tools.output_name(column) {
                Ok(name) => name,
                Err(error) => {
                    errors.push(error);
                    // Keep the parameter slot so the bucket id never loses a
                    // position; with no extractor the query yields no buckets.
                    let placeholder = column.expr.span.slice(sql).unwrap_or("?");
                    bucket_parameters.push(placeholder.to_string());
                    continue;
                }
            };
            let (extractor, column_errors) =
                tools.compile_static_extractor(&column.expr)?.into_parts();
            errors.extend(column_errors);
            if let Some(extractor) = extractor {
                static_extractors.insert(name.clone(), extractor);
            }
            bucket_parameters.push(name);
        }

        debug!(
            descriptor,
            bucket_parameters = ?bucket_parameters,
            errors = errors.len(),
            "Compiled static parameter query"
        );

        Ok(Self {
            sql: sql.to_string(),
            descriptor: descriptor.to_string(),
            bucket_parameters,
            filter,
            static_extractors,
            errors,
        })
    }

    /// Returns the bucket ids the session belongs to under this query: none
    /// if the filter does not match, otherwise exactly one.
    ///
    /// A parameter value that cannot be part of a bucket id (a blob), or a
    /// parameter whose expression failed to compile, yields no bucket ids.
    ///
    /// # Errors
    ///
    /// Returns [`SyncRulesError::InvalidClause`](crate::SyncRulesError::InvalidClause)
    /// if the filter failed to compile.
    pub fn get_static_bucket_ids(&self, parameters: &SyncParameters) -> Result<Vec<String>> {
        self.bucket_ids(&parameters.to_query_parameters())
    }

    /// Same as [`get_static_bucket_ids`](Self::get_static_bucket_ids), for an
    /// already built evaluation context.
    ///
    /// # Errors
    ///
    /// Returns [`SyncRulesError::InvalidClause`](crate::SyncRulesError::InvalidClause)
    /// if the filter failed to compile.
    pub fn bucket_ids(&self, parameters: &QueryParameters) -> Result<Vec<String>> {
        let assignments = self.filter.filter(parameters)?;
        if assignments.is_empty() {
            trace!(descriptor = %self.descriptor, "Filter did not match");
            return Ok(vec![]);
        }

        let mut values = BTreeMap::new();
        for name in &self.bucket_parameters {
            let Some(extractor) = self.static_extractors.get(name) else {
                debug!(
                    descriptor = %self.descriptor,
                    parameter = %name,
                    "No extractor for bucket parameter"
                );
                return Ok(vec![]);
            };
            let value = extractor.evaluate(parameters);
            if !value.is_json_value() {
                debug!(
                    descriptor = %self.descriptor,
                    parameter = %name,
                    value_type = value.type_name(),
                    "Bucket parameter is not a JSON value, skipping"
                );
                return Ok(vec![]);
            }
            values.insert(name.clone(), value);
        }

        Ok(vec![get_bucket_id(
            &self.descriptor,
            &self.bucket_parameters,
            &values,
        )?])
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Output bucket parameter names, in select list order.
    #[must_use]
    pub fn bucket_parameters(&self) -> &[String] {
        &self.bucket_parameters
    }

    #[must_use]
    pub const fn filter(&self) -> &ParameterMatchClause {
        &self.filter
    }

    /// Value extractors by output name. Columns that failed to compile are
    /// missing.
    #[must_use]
    pub const fn static_extractors(&self) -> &BTreeMap<String, StaticRowValueClause> {
        &self.static_extractors
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
