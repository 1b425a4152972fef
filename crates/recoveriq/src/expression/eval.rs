use std::cmp::Ordering;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::{EvalError, Value, Variables};

pub(crate) fn evaluate(expr: &Expr, variables: &Variables) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(name) => variables
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnresolvedVariable(name.clone())),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, variables)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Negate => Ok(Value::Number(-number(&value, "-")?)),
                UnaryOp::Plus => Ok(Value::Number(number(&value, "+")?)),
            }
        }
        Expr::Binary { op, left, right } => binary(*op, left, right, variables),
        Expr::Call { function, args } => call(function, args, variables),
    }
}

fn binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    variables: &Variables,
) -> Result<Value, EvalError> {
    match op {
        BinaryOp::And => {
            if !evaluate(left, variables)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(evaluate(right, variables)?.is_truthy()))
        }
        BinaryOp::Or => {
            if evaluate(left, variables)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(evaluate(right, variables)?.is_truthy()))
        }
        BinaryOp::Eq | BinaryOp::NotEq => {
            let same = equals(&evaluate(left, variables)?, &evaluate(right, variables)?);
            Ok(Value::Bool(if op == BinaryOp::Eq { same } else { !same }))
        }
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let lhs = evaluate(left, variables)?;
            let rhs = evaluate(right, variables)?;
            let ordering = compare(op, &lhs, &rhs)?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::LtEq => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => arithmetic(op, left, right, variables, |a, b| a + b),
        BinaryOp::Sub => arithmetic(op, left, right, variables, |a, b| a - b),
        BinaryOp::Mul => arithmetic(op, left, right, variables, |a, b| a * b),
        BinaryOp::Div => arithmetic(op, left, right, variables, |a, b| a / b),
        BinaryOp::Rem => arithmetic(op, left, right, variables, |a, b| a % b),
        BinaryOp::Pow => arithmetic(op, left, right, variables, f64::powf),
    }
}

fn arithmetic(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    variables: &Variables,
    apply: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let a = number(&evaluate(left, variables)?, op.symbol())?;
    let b = number(&evaluate(right, variables)?, op.symbol())?;
    let result = apply(a, b);
    if result.is_finite() {
        Ok(Value::Number(result))
    } else {
        Err(EvalError::NonFinite {
            operation: op.symbol(),
        })
    }
}

fn equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Str(_), _) | (_, Value::Str(_)) => false,
        _ => lhs.as_number() == rhs.as_number(),
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Ordering, EvalError> {
    if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        return Ok(a.cmp(b));
    }
    let a = number(lhs, op.symbol())?;
    let b = number(rhs, op.symbol())?;
    a.partial_cmp(&b).ok_or(EvalError::NonFinite {
        operation: op.symbol(),
    })
}

fn call(function: &str, args: &[Expr], variables: &Variables) -> Result<Value, EvalError> {
    match function {
        "min" | "max" => {
            let (first, rest) = args.split_first().ok_or_else(|| EvalError::Arity {
                function: function.to_string(),
                expected: "at least 1",
                found: 0,
            })?;
            let mut acc = number(&evaluate(first, variables)?, function)?;
            for arg in rest {
                let n = number(&evaluate(arg, variables)?, function)?;
                acc = if function == "min" { acc.min(n) } else { acc.max(n) };
            }
            Ok(Value::Number(acc))
        }
        "clamp" => {
            let [x, lo, hi] = three_args(function, args)?;
            let x = number(&evaluate(x, variables)?, function)?;
            let lo = number(&evaluate(lo, variables)?, function)?;
            let hi = number(&evaluate(hi, variables)?, function)?;
            Ok(Value::Number(x.max(lo).min(hi)))
        }
        "if" => {
            let [condition, then, otherwise] = three_args(function, args)?;
            if evaluate(condition, variables)?.is_truthy() {
                evaluate(then, variables)
            } else {
                evaluate(otherwise, variables)
            }
        }
        _ => Err(EvalError::UnknownFunction(function.to_string())),
    }
}

fn three_args<'a>(function: &str, args: &'a [Expr]) -> Result<[&'a Expr; 3], EvalError> {
    match args {
        [a, b, c] => Ok([a, b, c]),
        _ => Err(EvalError::Arity {
            function: function.to_string(),
            expected: "exactly 3",
            found: args.len(),
        }),
    }
}

fn number(value: &Value, operation: &str) -> Result<f64, EvalError> {
    value.as_number().ok_or_else(|| EvalError::TypeMismatch {
        operation: operation.to_string(),
        found: value.type_name(),
    })
}
