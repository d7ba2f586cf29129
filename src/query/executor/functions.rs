// Function Registry
//
// Named aggregate and scalar functions callable from queries. Aggregates
// receive the values of their argument across a whole group; scalar
// functions receive already evaluated argument values.

use std::collections::HashMap;
use std::fmt;

use crate::catalog::value::DataValue;
use crate::query::executor::result::{QueryError, QueryResult};

/// What an aggregate is applied to
#[derive(Debug, Clone, Copy)]
pub enum AggregateInput<'a> {
    /// `f()` or `f(*)`: only the number of rows in the group
    Rows(usize),
    /// `f(expr)`: the argument evaluated for every row of the group
    Values(&'a [DataValue]),
}

pub trait AggregateFunction: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `f()` / `f(*)` is accepted
    fn accepts_rows(&self) -> bool {
        false
    }

    fn call(&self, input: AggregateInput<'_>) -> QueryResult<DataValue>;
}

pub trait ScalarFunction: Send + Sync {
    fn name(&self) -> &str;

    /// Inclusive range of accepted argument counts
    fn arity(&self) -> (usize, usize);

    fn call(&self, args: &[DataValue]) -> QueryResult<DataValue>;
}

fn numeric_values(name: &str, values: &[DataValue]) -> QueryResult<Vec<f64>> {
    values
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| {
            v.as_number().ok_or_else(|| {
                QueryError::TypeMismatch(format!("{} expects numbers, got {}", name, v.type_name()))
            })
        })
        .collect()
}

/// `count()` counts rows, `count(expr)` counts non-null values
pub struct CountFunction;

impl AggregateFunction for CountFunction {
    fn name(&self) -> &str {
        "count"
    }

    fn accepts_rows(&self) -> bool {
        true
    }

    fn call(&self, input: AggregateInput<'_>) -> QueryResult<DataValue> {
        let count = match input {
            AggregateInput::Rows(rows) => rows,
            AggregateInput::Values(values) => values.iter().filter(|v| !v.is_null()).count(),
        };
        Ok(DataValue::Number(count as f64))
    }
}

/// Sum of non-null numbers, 0 for an empty group
pub struct SumFunction;

impl AggregateFunction for SumFunction {
    fn name(&self) -> &str {
        "sum"
    }

    fn call(&self, input: AggregateInput<'_>) -> QueryResult<DataValue> {
        match input {
            AggregateInput::Values(values) => {
                Ok(DataValue::Number(numeric_values(self.name(), values)?.iter().sum()))
            }
            AggregateInput::Rows(_) => Err(QueryError::InvalidArgumentCount {
                name: self.name().to_string(),
                expected: "1".to_string(),
                actual: 0,
            }),
        }
    }
}

/// Mean of non-null numbers, 0 for an empty group
pub struct AvgFunction;

impl AggregateFunction for AvgFunction {
    fn name(&self) -> &str {
        "avg"
    }

    fn call(&self, input: AggregateInput<'_>) -> QueryResult<DataValue> {
        match input {
            AggregateInput::Values(values) => {
                let numbers = numeric_values(self.name(), values)?;
                if numbers.is_empty() {
                    return Ok(DataValue::Number(0.0));
                }
                Ok(DataValue::Number(numbers.iter().sum::<f64>() / numbers.len() as f64))
            }
            AggregateInput::Rows(_) => Err(QueryError::InvalidArgumentCount {
                name: self.name().to_string(),
                expected: "1".to_string(),
                actual: 0,
            }),
        }
    }
}

/// Largest power of ten a double holds
const MAX_ROUND_PLACES: i32 = 308;

/// From 2^53 on every double is a whole number
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// `round(value[, places])`
pub struct RoundFunction;

impl ScalarFunction for RoundFunction {
    fn name(&self) -> &str {
        "round"
    }

    fn arity(&self) -> (usize, usize) {
        (1, 2)
    }

    fn call(&self, args: &[DataValue]) -> QueryResult<DataValue> {
        let value = match args.first() {
            Some(DataValue::Null) | None => return Ok(DataValue::Null),
            Some(DataValue::Number(n)) => *n,
            Some(other) => {
                return Err(QueryError::TypeMismatch(format!("round expects a number, got {}", other.type_name())));
            }
        };

        let places = match args.get(1) {
            None => 0,
            Some(DataValue::Number(p)) if p.fract() == 0.0 && *p >= 0.0 => (*p).min(MAX_ROUND_PLACES as f64) as i32,
            Some(other) => {
                return Err(QueryError::TypeMismatch(format!(
                    "round places must be a non-negative integer, got {}",
                    other
                )));
            }
        };

        let factor = 10f64.powi(places);
        let scaled = value * factor;
        if scaled.abs() >= EXACT_INTEGER_LIMIT {
            // no digits left to round at this many places
            return Ok(DataValue::Number(value));
        }
        Ok(DataValue::Number(scaled.round() / factor))
    }
}

/// `toint(value)`: booleans to 1/0, numbers truncated
pub struct ToIntFunction;

impl ScalarFunction for ToIntFunction {
    fn name(&self) -> &str {
        "toint"
    }

    fn arity(&self) -> (usize, usize) {
        (1, 1)
    }

    fn call(&self, args: &[DataValue]) -> QueryResult<DataValue> {
        match args.first() {
            Some(DataValue::Boolean(b)) => Ok(DataValue::Number(if *b { 1.0 } else { 0.0 })),
            Some(DataValue::Number(n)) => Ok(DataValue::Number(n.trunc())),
            Some(DataValue::Null) | None => Ok(DataValue::Null),
            Some(other) => Err(QueryError::TypeMismatch(format!(
                "toint expects a boolean or number, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Functions by lowercase name
pub struct FunctionRegistry {
    aggregates: HashMap<String, Box<dyn AggregateFunction>>,
    scalars: HashMap<String, Box<dyn ScalarFunction>>,
}

impl FunctionRegistry {
    /// Registry without any functions
    pub fn empty() -> Self {
        FunctionRegistry {
            aggregates: HashMap::new(),
            scalars: HashMap::new(),
        }
    }

    pub fn register_aggregate(&mut self, function: Box<dyn AggregateFunction>) {
        self.aggregates.insert(function.name().to_lowercase(), function);
    }

    pub fn register_scalar(&mut self, function: Box<dyn ScalarFunction>) {
        self.scalars.insert(function.name().to_lowercase(), function);
    }

    pub fn is_aggregate(&self, name: &str) -> bool {
        self.aggregates.contains_key(&name.to_lowercase())
    }

    pub fn aggregate(&self, name: &str) -> Option<&dyn AggregateFunction> {
        self.aggregates.get(&name.to_lowercase()).map(|f| f.as_ref())
    }

    pub fn scalar(&self, name: &str) -> Option<&dyn ScalarFunction> {
        self.scalars.get(&name.to_lowercase()).map(|f| f.as_ref())
    }

    /// Check an aggregate call shape: rows form or exactly one argument
    pub fn check_aggregate_arity(&self, name: &str, args: usize, star: bool) -> QueryResult<&dyn AggregateFunction> {
        let function = self
            .aggregate(name)
            .ok_or_else(|| QueryError::UnknownFunction(name.to_string()))?;

        let rows_form = star || args == 0;
        let valid = if rows_form { function.accepts_rows() && !(star && args > 0) } else { args == 1 };

        if !valid {
            return Err(QueryError::InvalidArgumentCount {
                name: name.to_string(),
                expected: if function.accepts_rows() { "0 or 1".to_string() } else { "1".to_string() },
                actual: args,
            });
        }

        Ok(function)
    }

    /// Call a scalar function after checking its arity
    pub fn call_scalar(&self, name: &str, args: &[DataValue]) -> QueryResult<DataValue> {
        let function = self
            .scalar(name)
            .ok_or_else(|| QueryError::UnknownFunction(name.to_string()))?;

        let (min, max) = function.arity();
        if args.len() < min || args.len() > max {
            let expected = if min == max { min.to_string() } else { format!("{} to {}", min, max) };
            return Err(QueryError::InvalidArgumentCount {
                name: name.to_string(),
                expected,
                actual: args.len(),
            });
        }

        function.call(args)
    }
}

impl Default for FunctionRegistry {
    /// Registry with the built-in functions
    fn default() -> Self {
        let mut registry = FunctionRegistry::empty();
        registry.register_aggregate(Box::new(CountFunction));
        registry.register_aggregate(Box::new(SumFunction));
        registry.register_aggregate(Box::new(AvgFunction));
        registry.register_scalar(Box::new(RoundFunction));
        registry.register_scalar(Box::new(ToIntFunction));
        registry
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut aggregates: Vec<_> = self.aggregates.keys().collect();
        let mut scalars: Vec<_> = self.scalars.keys().collect();
        aggregates.sort();
        scalars.sort();
        f.debug_struct("FunctionRegistry")
            .field("aggregates", &aggregates)
            .field("scalars", &scalars)
            .finish()
    }
}
