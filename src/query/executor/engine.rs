// Query Execution Engine Implementation
//
// Tree-walking interpreter for parsed SELECT statements. A select runs as a
// fixed pipeline over materialized tables:
//
//   from -> joins -> where -> group by / projection -> order by -> offset -> limit
//
// Expressions are evaluated against an explicit `RowContext` that names the
// row (and, inside grouped queries, the group) currently in view.

use log::{debug, info};

use crate::catalog::column::Column;
use crate::catalog::row::Row;
use crate::catalog::table::Table;
use crate::catalog::value::DataValue;
use crate::query::executor::expression_eval::{
    evaluate_between, evaluate_binary, evaluate_like, evaluate_logical, evaluate_negate, evaluate_not, is_truthy,
    short_circuit, truth_value, values_equal,
};
use crate::query::executor::functions::{AggregateInput, FunctionRegistry};
use crate::query::executor::operators::{self, Group};
use crate::query::executor::result::{QueryError, QueryResult};
use crate::query::executor::scope::{ExecutionContext, Scope};
use crate::query::parser::ast::{
    ColumnReference, Expression, JoinClause, JoinType, OrderByExpr, SelectStatement, SortDirection,
    Statement, TableReference, TableSource, UnaryOperator,
};
use crate::query::parser::{parse, parse_all};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lowercase query text before scanning, making keywords and
    /// identifiers case-insensitive
    pub lowercase_input: bool,
    /// Prefix of the aliases generated for unaliased tables
    pub subquery_alias_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            lowercase_input: false,
            subquery_alias_prefix: "t".to_string(),
        }
    }
}

/// The row, and for grouped queries the group, an expression is evaluated
/// against
#[derive(Debug, Clone, Copy, Default)]
pub struct RowContext<'r> {
    pub row: Option<&'r Row>,
    pub group: Option<&'r [Row]>,
}

impl<'r> RowContext<'r> {
    /// No row bound; column references fail to resolve
    pub fn none() -> Self {
        RowContext::default()
    }

    pub fn row(row: &'r Row) -> Self {
        RowContext { row: Some(row), group: None }
    }

    pub fn grouped(row: &'r Row, group: &'r [Row]) -> Self {
        RowContext { row: Some(row), group: Some(group) }
    }
}

/// Executes queries against a set of bound tables.
///
/// An engine instance is single-threaded; use one engine per concurrent
/// query.
#[derive(Debug)]
pub struct ExecutionEngine {
    config: EngineConfig,
    functions: FunctionRegistry,
    scope: Scope,
    /// Source frame of the grouped select whose `having` is being evaluated
    group_source: Option<ExecutionContext>,
    alias_counter: usize,
}

impl ExecutionEngine {
    pub fn new(bindings: impl IntoIterator<Item = (String, Table)>) -> Self {
        Self::with_config(bindings, EngineConfig::default())
    }

    pub fn with_config(bindings: impl IntoIterator<Item = (String, Table)>, config: EngineConfig) -> Self {
        let mut engine = ExecutionEngine {
            config,
            functions: FunctionRegistry::default(),
            scope: Scope::new(ExecutionContext::new()),
            group_source: None,
            alias_counter: 0,
        };
        engine.bind_tables(bindings);
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Register additional functions
    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    /// Bind a table in the root scope. A table whose name differs from the
    /// binding name is renamed to it.
    pub fn bind_table(&mut self, name: &str, table: Table) {
        let table = if table.name() == name { table } else { table.renamed(name) };
        debug!("binding table {} ({} rows)", name, table.len());
        self.scope.set_table(name, table);
    }

    pub fn bind_tables(&mut self, bindings: impl IntoIterator<Item = (String, Table)>) {
        for (name, table) in bindings {
            self.bind_table(&name, table);
        }
    }

    /// Execute a parsed statement after adding `bindings` to the root scope
    pub fn execute(
        &mut self,
        statement: &Statement,
        bindings: impl IntoIterator<Item = (String, Table)>,
    ) -> QueryResult<Table> {
        self.bind_tables(bindings);

        info!("executing {}", statement);
        let result = match statement {
            Statement::Select(select) => self.evaluate_select(select)?,
        };
        info!("query returned {} rows", result.len());

        Ok(result)
    }

    /// Parse and execute a single statement
    pub fn execute_query(&mut self, query: &str) -> QueryResult<Table> {
        let statement = parse(&self.prepare_input(query))?;
        self.execute(&statement, Vec::new())
    }

    /// Parse and execute a `;`-separated script, one result per statement
    pub fn execute_script(&mut self, script: &str) -> QueryResult<Vec<Table>> {
        let statements = parse_all(&self.prepare_input(script))?;
        statements
            .iter()
            .map(|statement| self.execute(statement, Vec::new()))
            .collect()
    }

    fn prepare_input(&self, query: &str) -> String {
        if self.config.lowercase_input {
            query.to_lowercase()
        } else {
            query.to_string()
        }
    }

    /// Evaluate a select in a fresh child scope
    fn evaluate_select(&mut self, select: &SelectStatement) -> QueryResult<Table> {
        let outer_group_source = self.group_source.take();
        self.scope.push_frame();
        let result = self.evaluate_select_in_scope(select);
        self.scope.pop_frame();
        self.group_source = outer_group_source;
        result
    }

    fn evaluate_select_in_scope(&mut self, select: &SelectStatement) -> QueryResult<Table> {
        if select.star_select {
            return Err(QueryError::StarSelectUnsupported);
        }

        let from = match &select.from {
            Some(from) => from,
            None => return self.evaluate_results_once(select),
        };

        if select.having.is_some() && select.group_by.is_empty() {
            return Err(QueryError::MalformedGroupBy(format!(
                "'having' without 'group by' at {}",
                select.token.position()
            )));
        }

        let mut table = self.evaluate_from(from, false)?;
        debug!("from {}: {} rows", table.name(), table.len());

        for join in &select.joins {
            table = self.evaluate_join(join, table)?;
            debug!("{} join: {} rows", join.join_type, table.len());
        }

        if let Some(condition) = &select.where_clause {
            table = operators::filter_rows(&table, |row| self.evaluate_condition(condition, RowContext::row(row)))?;
            debug!("where: {} rows", table.len());
        }

        table = if select.group_by.is_empty() {
            self.evaluate_projection(select, &table)?
        } else {
            self.evaluate_group_by(select, &table)?
        };

        if !select.order_by.is_empty() {
            table = self.evaluate_order_by(&select.order_by, table)?;
        }

        if let Some(offset) = &select.offset {
            let offset = self.evaluate_row_count(offset, "offset")?;
            table = operators::apply_offset(table, offset);
            debug!("offset {}: {} rows", offset, table.len());
        }

        if let Some(limit) = &select.limit {
            let limit = self.evaluate_row_count(limit, "limit")?;
            table = operators::apply_limit(table, limit);
            debug!("limit {}: {} rows", limit, table.len());
        }

        Ok(table)
    }

    /// A select without `from` evaluates its results once, over no row
    fn evaluate_results_once(&mut self, select: &SelectStatement) -> QueryResult<Table> {
        let fields = operators::output_names(&select.columns);
        let values = select
            .columns
            .iter()
            .map(|column| self.evaluate_expression(&column.expr, RowContext::none()))
            .collect::<QueryResult<Vec<_>>>()?;

        let row = Row::from_values("result", &fields, values)?;
        Ok(Table::new("result", fields, vec![row]))
    }

    /// Resolve a table reference and register it in the local scope.
    /// Joined tables and subqueries are renamed to their alias.
    fn evaluate_from(&mut self, reference: &TableReference, in_join: bool) -> QueryResult<Table> {
        let table = match &reference.source {
            TableSource::Table { name, .. } => {
                let table = self
                    .scope
                    .get_by_identifier(name)
                    .cloned()
                    .ok_or_else(|| QueryError::TableNotFound(name.clone()))?;

                if in_join {
                    let alias = reference.alias.as_deref().ok_or_else(|| {
                        QueryError::MissingAlias(format!("joined table {} at {}", name, reference.token.position()))
                    })?;
                    table.renamed(alias)
                } else {
                    table
                }
            }
            TableSource::Subquery(subquery) => {
                let alias = reference.alias.as_deref().ok_or_else(|| {
                    QueryError::MissingAlias(format!("subquery at {}", reference.token.position()))
                })?;
                if self.scope.get_local_table_by_name(alias).is_some() {
                    return Err(QueryError::DuplicateAlias(alias.to_string()));
                }
                self.evaluate_select(subquery)?.renamed(alias)
            }
        };

        let alias = match &reference.alias {
            Some(alias) => {
                if self.scope.get_table_alias(alias).is_some() {
                    return Err(QueryError::DuplicateAlias(alias.clone()));
                }
                alias.clone()
            }
            None => self.generate_alias(),
        };

        let name = table.name().to_string();
        self.scope.set_table(&name, table.clone());
        self.scope.set_table_alias(&alias, &name);

        Ok(table)
    }

    /// Next `<prefix><n>` alias not visible from the current scope
    fn generate_alias(&mut self) -> String {
        loop {
            let alias = format!("{}{}", self.config.subquery_alias_prefix, self.alias_counter);
            self.alias_counter += 1;

            if self.scope.get_table_alias(&alias).is_none() {
                return alias;
            }
        }
    }

    fn evaluate_join(&mut self, join: &JoinClause, left: Table) -> QueryResult<Table> {
        if matches!(join.join_type, JoinType::Right | JoinType::Full) {
            return Err(QueryError::UnsupportedJoinType(format!(
                "{} join at {}",
                join.join_type,
                join.token.position()
            )));
        }

        let right = self.evaluate_from(&join.table, true)?;
        let name = operators::joined_name(&left, &right, join.join_type);

        if join.join_type == JoinType::Cross {
            return Ok(operators::cross_join(&name, &left, &right));
        }

        let condition = join
            .condition
            .as_deref()
            .ok_or_else(|| QueryError::MissingJoinCondition(join.join_type.to_string()))?;

        operators::nested_loop_join(&name, &left, &right, join.join_type == JoinType::Left, |row| {
            self.evaluate_condition(condition, RowContext::row(row))
        })
    }

    fn evaluate_projection(&mut self, select: &SelectStatement, table: &Table) -> QueryResult<Table> {
        let fields = operators::output_names(&select.columns);

        let projected = operators::project_rows(table.name(), &fields, table.rows(), |row| {
            select
                .columns
                .iter()
                .map(|column| self.evaluate_expression(&column.expr, RowContext::row(row)))
                .collect()
        })?;

        // later clauses resolve names against the projection
        self.scope.rebind_local(projected.clone());
        Ok(projected)
    }

    fn evaluate_group_by(&mut self, select: &SelectStatement, table: &Table) -> QueryResult<Table> {
        let keys = select
            .group_by
            .iter()
            .map(|expr| match expr {
                Expression::Column(reference) => Ok(reference),
                other => Err(QueryError::MalformedGroupBy(format!(
                    "grouping key at {} must be a column",
                    other.token().position()
                ))),
            })
            .collect::<QueryResult<Vec<_>>>()?;

        for column in &select.columns {
            let allowed = match &column.expr {
                Expression::Column(_) => true,
                call @ Expression::Call { .. } => call.function_name().is_some_and(|name| self.functions.is_aggregate(name)),
                _ => false,
            };
            if !allowed {
                return Err(QueryError::MalformedGroupBy(format!(
                    "only grouping keys and aggregates can be selected, found an expression at {}",
                    column.expr.token().position()
                )));
            }
        }

        let groups = operators::group_rows(table.name(), table.rows(), |row| {
            keys.iter()
                .map(|key| {
                    let (column, value) = self.resolve_column(key, row)?;
                    Ok((column.clone(), value.clone()))
                })
                .collect()
        })?;
        debug!("group by: {} groups", groups.len());

        let name = format!("{}_groupby", table.name());
        let fields = operators::output_names(&select.columns);
        let rows = groups
            .iter()
            .map(|group| self.project_group(select, &name, &fields, group))
            .collect::<QueryResult<Vec<_>>>()?;

        let projected = Table::new(name, fields, rows);
        let source = self.scope.rebind_local(projected.clone());

        let having = match &select.having {
            Some(having) => having,
            None => return Ok(projected),
        };

        // aggregates in `having` read their arguments from the source tables
        let outer_group_source = self.group_source.replace(source);
        let kept = self.filter_groups(having, &projected, &groups);
        self.group_source = outer_group_source;

        let filtered = projected.with_rows(kept?);
        debug!("having: {} groups", filtered.len());
        self.scope.rebind_local(filtered.clone());
        Ok(filtered)
    }

    /// Keep the projected group rows for which `having` holds. Each row is
    /// evaluated together with the rows of its group.
    fn filter_groups(&mut self, having: &Expression, projected: &Table, groups: &[Group]) -> QueryResult<Vec<Row>> {
        let mut kept = Vec::new();

        for (row, group) in projected.iter().zip(groups) {
            if self.evaluate_condition(having, RowContext::grouped(row, &group.rows))? {
                kept.push(row.clone());
            }
        }

        Ok(kept)
    }

    /// Run `f` with the grouped select's source frame in place of the
    /// projection, when a `having` clause is being evaluated
    fn with_group_source<T>(&mut self, f: impl FnOnce(&mut Self) -> QueryResult<T>) -> QueryResult<T> {
        let source = match self.group_source.take() {
            Some(source) => source,
            None => return f(self),
        };

        let projection = self.scope.replace_local(source);
        let result = f(self);
        let source = self.scope.replace_local(projection);
        self.group_source = Some(source);
        result
    }

    fn project_group(
        &mut self,
        select: &SelectStatement,
        name: &str,
        fields: &[String],
        group: &Group,
    ) -> QueryResult<Row> {
        let context = RowContext::grouped(&group.key_row, &group.rows);

        let values = select
            .columns
            .iter()
            .map(|column| {
                self.evaluate_expression(&column.expr, context).map_err(|err| match err {
                    QueryError::ColumnNotFound(column) => QueryError::MalformedGroupBy(format!(
                        "{} is neither a grouping key nor aggregated",
                        column
                    )),
                    other => other,
                })
            })
            .collect::<QueryResult<Vec<_>>>()?;

        Row::from_values(name, fields, values)
    }

    fn evaluate_order_by(&mut self, order_by: &[OrderByExpr], table: Table) -> QueryResult<Table> {
        if order_by.is_empty() {
            return Err(QueryError::ExecutionError("order by needs at least one column".to_string()));
        }

        let directions: Vec<SortDirection> = order_by.iter().map(|o| o.direction).collect();
        let sorted = operators::sort_table(table, &directions, |row| {
            order_by
                .iter()
                .map(|o| self.resolve_column(&o.column, row).map(|(_, value)| value.clone()))
                .collect()
        })?;

        debug!("order by: {} keys", order_by.len());
        Ok(sorted)
    }

    /// Offset and limit must be non-negative integers
    fn evaluate_row_count(&mut self, expr: &Expression, clause: &'static str) -> QueryResult<usize> {
        let invalid = |reason: QueryError| QueryError::InvalidLimit { clause, reason: Box::new(reason) };

        match self.evaluate_expression(expr, RowContext::none()).map_err(invalid)? {
            DataValue::Number(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
            other => Err(invalid(QueryError::TypeMismatch(format!(
                "expected a non-negative integer, got {}",
                other
            )))),
        }
    }

    fn evaluate_condition(&mut self, expr: &Expression, context: RowContext<'_>) -> QueryResult<bool> {
        let value = self.evaluate_expression(expr, context)?;
        is_truthy(&value)
    }

    /// Find the column a reference names on `row`.
    ///
    /// A qualified reference resolves its table through the scope's aliases.
    /// An unqualified one must belong to exactly one table of the local scope.
    fn resolve_column<'r>(&self, reference: &ColumnReference, row: &'r Row) -> QueryResult<(&'r Column, &'r DataValue)> {
        let table_name = match &reference.table {
            Some(qualifier) => self
                .scope
                .get_table_alias(qualifier)
                .map(str::to_string)
                .or_else(|| self.scope.get_table_by_name(qualifier).map(|t| t.name().to_string()))
                .ok_or_else(|| QueryError::TableNotFound(qualifier.clone()))?,
            None => {
                let mut owners = self
                    .scope
                    .get_local_tables()
                    .filter(|t| t.has_field(&reference.name))
                    .map(|t| t.name().to_string());

                let owner = owners
                    .next()
                    .ok_or_else(|| QueryError::ColumnNotFound(reference.to_string()))?;
                if owners.next().is_some() {
                    return Err(QueryError::AmbiguousColumn(reference.to_string()));
                }
                owner
            }
        };

        let column = row
            .get_column(&reference.name, &table_name)?
            .ok_or_else(|| QueryError::ColumnNotFound(reference.to_string()))?;
        let value = row
            .value(column.index())
            .ok_or_else(|| QueryError::InvalidRow(format!("no value for column {}", reference)))?;

        Ok((column, value))
    }

    pub fn evaluate_expression(&mut self, expr: &Expression, context: RowContext<'_>) -> QueryResult<DataValue> {
        match expr {
            Expression::Literal { value, .. } => Ok(value.clone()),

            Expression::Column(reference) => {
                let row = context
                    .row
                    .ok_or_else(|| QueryError::UnresolvedVariable(reference.to_string()))?;
                Ok(self.resolve_column(reference, row)?.1.clone())
            }

            Expression::Binary { left, op, right, .. } => {
                let left = self.evaluate_expression(left, context)?;
                let right = self.evaluate_expression(right, context)?;
                evaluate_binary(*op, &left, &right)
            }

            Expression::Logical { left, op, right, .. } => {
                let left = truth_value(&self.evaluate_expression(left, context)?)?;
                if let Some(decided) = short_circuit(*op, left) {
                    return Ok(DataValue::Boolean(decided));
                }
                let right = truth_value(&self.evaluate_expression(right, context)?)?;
                Ok(evaluate_logical(*op, left, right))
            }

            Expression::Unary { op, expr, .. } => {
                let value = self.evaluate_expression(expr, context)?;
                match op {
                    UnaryOperator::Not => evaluate_not(&value),
                    UnaryOperator::Minus => evaluate_negate(&value),
                }
            }

            Expression::Between { value, low, high, .. } => {
                let value = self.evaluate_expression(value, context)?;
                let low = self.evaluate_expression(low, context)?;
                let high = self.evaluate_expression(high, context)?;
                evaluate_between(&value, &low, &high)
            }

            Expression::In { value, list, .. } => {
                let value = self.evaluate_expression(value, context)?;
                for candidate in self.evaluate_in_list(list, context)? {
                    if values_equal(&value, &candidate) {
                        return Ok(DataValue::Boolean(true));
                    }
                }
                Ok(DataValue::Boolean(false))
            }

            Expression::Like { value, pattern, case_insensitive, .. } => {
                let value = self.evaluate_expression(value, context)?;
                let pattern = self.evaluate_expression(pattern, context)?;
                evaluate_like(&value, &pattern, *case_insensitive)
            }

            Expression::IsNull { expr, .. } => {
                let value = self.evaluate_expression(expr, context)?;
                Ok(DataValue::Boolean(value.is_null()))
            }

            Expression::Case { token, whens, thens, else_branch } => {
                if whens.len() != thens.len() {
                    return Err(QueryError::ExecutionError(format!(
                        "case at {} has {} 'when' and {} 'then' branches",
                        token.position(),
                        whens.len(),
                        thens.len()
                    )));
                }

                for (when, then) in whens.iter().zip(thens) {
                    if self.evaluate_condition(when, context)? {
                        return self.evaluate_expression(then, context);
                    }
                }

                match else_branch {
                    Some(branch) => self.evaluate_expression(branch, context),
                    None => Ok(DataValue::Null),
                }
            }

            Expression::Call { token, args, star, .. } => {
                let name = expr.function_name().ok_or_else(|| {
                    QueryError::ExecutionError(format!("only named functions can be called at {}", token.position()))
                })?;

                if self.functions.is_aggregate(name) {
                    let group = context
                        .group
                        .ok_or_else(|| QueryError::AggregateOutsideGroupBy(name.to_string()))?;
                    return self.evaluate_aggregate(name, args, *star, group);
                }

                let values = args
                    .iter()
                    .map(|arg| self.evaluate_expression(arg, context))
                    .collect::<QueryResult<Vec<_>>>()?;
                self.functions.call_scalar(name, &values)
            }

            Expression::Grouping { expr, .. } => self.evaluate_expression(expr, context),

            Expression::Exists { subquery, .. } => {
                let result = self.evaluate_select(subquery)?;
                Ok(DataValue::Boolean(!result.is_empty()))
            }

            Expression::Subquery(subquery) => self.evaluate_scalar_subquery(subquery),
        }
    }

    /// Values of an `in` list; a subquery contributes its single column
    fn evaluate_in_list(&mut self, list: &[Expression], context: RowContext<'_>) -> QueryResult<Vec<DataValue>> {
        let mut values = Vec::with_capacity(list.len());

        for item in list {
            match item {
                Expression::Subquery(subquery) => {
                    let result = self.evaluate_select(subquery)?;
                    single_column(&result)?;
                    values.extend(result.into_rows().into_iter().filter_map(|row| row.into_values().into_iter().next()));
                }
                other => values.push(self.evaluate_expression(other, context)?),
            }
        }

        Ok(values)
    }

    fn evaluate_scalar_subquery(&mut self, subquery: &SelectStatement) -> QueryResult<DataValue> {
        let result = self.evaluate_select(subquery)?;
        single_column(&result)?;

        match result.len() {
            0 => Ok(DataValue::Null),
            1 => Ok(result.rows()[0].value(0).cloned().unwrap_or(DataValue::Null)),
            n => Err(QueryError::ScalarSubquery(n)),
        }
    }

    /// Apply an aggregate to a group; arguments are evaluated for every row
    fn evaluate_aggregate(&mut self, name: &str, args: &[Expression], star: bool, group: &[Row]) -> QueryResult<DataValue> {
        self.functions.check_aggregate_arity(name, args.len(), star)?;

        let values = match args.first() {
            Some(arg) if !star => Some(self.with_group_source(|engine| {
                group
                    .iter()
                    .map(|row| engine.evaluate_expression(arg, RowContext::row(row)))
                    .collect::<QueryResult<Vec<_>>>()
            })?),
            _ => None,
        };

        let function = self
            .functions
            .aggregate(name)
            .ok_or_else(|| QueryError::UnknownFunction(name.to_string()))?;
        match &values {
            Some(values) => function.call(AggregateInput::Values(values)),
            None => function.call(AggregateInput::Rows(group.len())),
        }
    }
}

fn single_column(table: &Table) -> QueryResult<()> {
    if table.fields().len() != 1 {
        return Err(QueryError::TypeMismatch(format!(
            "subquery must return one column, got {}",
            table.fields().len()
        )));
    }
    Ok(())
}
