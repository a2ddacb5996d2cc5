use crate::error::RuntimeError;
use crate::value::Value;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Xor,
    And,
    Or,
}

impl BinOp {
    fn name(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "subtract",
            BinOp::Mul => "multiply",
            BinOp::Div => "divide",
            BinOp::Mod => "mod",
            BinOp::Xor => "xor",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// Python-style floor modulo: the result takes the sign of the divisor,
/// not the dividend (unlike Rust's `%`).
fn floor_mod_i64(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

fn floor_mod_f64(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

/// `left OP right`, where `left` was popped and `right` is what remained
/// on top of the stack — the exact pop order the source VM uses, which
/// matters for the non-commutative operators.
pub fn apply(op: BinOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    use Value::{Float, Int};

    match (left, right) {
        (Int(l), Int(r)) => int_op(op, *l, *r),
        (Float(l), Float(r)) => float_op(op, *l, *r),
        (Int(l), Float(r)) => float_op(op, *l as f64, *r),
        (Float(l), Int(r)) => float_op(op, *l, *r as f64),
        _ => Err(RuntimeError::ArithmeticTypeMismatch {
            op: op.name(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn int_op(op: BinOp, l: i64, r: i64) -> Result<Value, RuntimeError> {
    let v = match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::Div => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            l.wrapping_div(r)
        }
        BinOp::Mod => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            floor_mod_i64(l, r)
        }
        BinOp::Xor => l ^ r,
        BinOp::And => l & r,
        BinOp::Or => l | r,
    };
    Ok(Value::Int(v))
}

fn float_op(op: BinOp, l: f64, r: f64) -> Result<Value, RuntimeError> {
    let v = match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mul => l * r,
        BinOp::Div => l / r,
        BinOp::Mod => floor_mod_f64(l, r),
        BinOp::Xor | BinOp::And | BinOp::Or => {
            return Err(RuntimeError::ArithmeticTypeMismatch {
                op: op.name(),
                left: "float",
                right: "float",
            });
        }
    };
    Ok(Value::Float(v))
}
