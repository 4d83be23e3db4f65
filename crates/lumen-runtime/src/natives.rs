//! Native (host-provided) functions registered into the VM's globals at
//! `load()` time (§4.4.2, §6). Each matches the `NativeFn` ABI in
//! `value.rs`: `(args: &[Value], interner: &SharedInterner) -> Result<Value,
//! RuntimeError>`, argument count already checked against `arity` by the
//! call protocol before the function body runs. The interner is threaded
//! through so natives that mint strings (`input`) intern into the same
//! table the compiler and VM use, keeping string equality handle-based even
//! for host-produced values.

use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::symbol::SharedInterner;
use crate::value::{NativeFunction, RuntimeError, Value};

fn clock(_args: &[Value], _interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| RuntimeError::Native(e.to_string()))?;
    Ok(Value::Number(now.as_secs_f64()))
}

fn abs(args: &[Value], _interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let n = args[0].as_number().ok_or(RuntimeError::NotANumber)?;
    Ok(Value::Number(n.abs()))
}

fn sqrt(args: &[Value], _interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let n = args[0].as_number().ok_or(RuntimeError::NotANumber)?;
    if n < 0.0 {
        return Err(RuntimeError::Native("sqrt of a negative number.".to_string()));
    }
    Ok(Value::Number(n.sqrt()))
}

fn pow(args: &[Value], _interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let base = args[0].as_number().ok_or(RuntimeError::NotANumber)?;
    let exponent = args[1].as_number().ok_or(RuntimeError::NotANumber)?;
    Ok(Value::Number(base.powf(exponent)))
}

fn floor(args: &[Value], _interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let n = args[0].as_number().ok_or(RuntimeError::NotANumber)?;
    Ok(Value::Number(n.floor()))
}

fn ceil(args: &[Value], _interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let n = args[0].as_number().ok_or(RuntimeError::NotANumber)?;
    Ok(Value::Number(n.ceil()))
}

fn round(args: &[Value], _interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let n = args[0].as_number().ok_or(RuntimeError::NotANumber)?;
    Ok(Value::Number(n.round()))
}

fn len(args: &[Value], interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let sym = args[0]
        .as_string_symbol()
        .ok_or_else(|| RuntimeError::Native("len expects a string.".to_string()))?;
    let i = interner.borrow();
    Ok(Value::Number(i.resolve(sym).chars().count() as f64))
}

fn type_of(args: &[Value], interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let sym = interner.borrow_mut().intern(args[0].type_name());
    Ok(Value::string_symbol(sym))
}

fn to_string(args: &[Value], interner: &SharedInterner) -> Result<Value, RuntimeError> {
    let text = crate::vm::display_value(&args[0], &interner.borrow());
    let sym = interner.borrow_mut().intern(&text);
    Ok(Value::string_symbol(sym))
}

fn to_number(args: &[Value], interner: &SharedInterner) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Object(crate::value::Object::Str(sym)) => {
            let i = interner.borrow();
            let text = i.resolve(*sym);
            text.trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| RuntimeError::Native(format!("Cannot convert '{}' to a number.", text)))
        }
        other => Err(RuntimeError::Native(format!(
            "Cannot convert {} to a number.",
            other.type_name()
        ))),
    }
}

fn input(_args: &[Value], interner: &SharedInterner) -> Result<Value, RuntimeError> {
    io::stdout().flush().map_err(|e| RuntimeError::Native(e.to_string()))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| RuntimeError::Native(e.to_string()))?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    let sym = interner.borrow_mut().intern(&line);
    Ok(Value::string_symbol(sym))
}

/// Builds the `(name, NativeFunction)` pairs to install into `globals`.
/// Takes the interner so native names share the same symbol table the
/// compiler and VM use.
pub fn builtins(interner: &SharedInterner) -> Vec<(&'static str, Rc<NativeFunction>)> {
    let mut i = interner.borrow_mut();
    vec![
        (
            "clock",
            Rc::new(NativeFunction { name: i.intern("clock"), arity: Some(0), func: clock }),
        ),
        ("abs", Rc::new(NativeFunction { name: i.intern("abs"), arity: Some(1), func: abs })),
        ("sqrt", Rc::new(NativeFunction { name: i.intern("sqrt"), arity: Some(1), func: sqrt })),
        ("pow", Rc::new(NativeFunction { name: i.intern("pow"), arity: Some(2), func: pow })),
        (
            "floor",
            Rc::new(NativeFunction { name: i.intern("floor"), arity: Some(1), func: floor }),
        ),
        ("ceil", Rc::new(NativeFunction { name: i.intern("ceil"), arity: Some(1), func: ceil })),
        (
            "round",
            Rc::new(NativeFunction { name: i.intern("round"), arity: Some(1), func: round }),
        ),
        ("len", Rc::new(NativeFunction { name: i.intern("len"), arity: Some(1), func: len })),
        (
            "type_of",
            Rc::new(NativeFunction { name: i.intern("type_of"), arity: Some(1), func: type_of }),
        ),
        (
            "to_string",
            Rc::new(NativeFunction {
                name: i.intern("to_string"),
                arity: Some(1),
                func: to_string,
            }),
        ),
        (
            "to_number",
            Rc::new(NativeFunction {
                name: i.intern("to_number"),
                arity: Some(1),
                func: to_number,
            }),
        ),
        (
            "input",
            Rc::new(NativeFunction { name: i.intern("input"), arity: Some(0), func: input }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::new_shared_interner;
    use rstest::rstest;

    #[test]
    fn abs_negates_negative_numbers() {
        let interner = new_shared_interner();
        assert_eq!(abs(&[Value::Number(-4.0)], &interner).unwrap().as_number(), Some(4.0));
    }

    #[test]
    fn sqrt_rejects_negative_input() {
        let interner = new_shared_interner();
        assert!(sqrt(&[Value::Number(-1.0)], &interner).is_err());
    }

    #[test]
    fn clock_returns_a_nonnegative_number() {
        let interner = new_shared_interner();
        let v = clock(&[], &interner).unwrap();
        assert!(v.as_number().unwrap() >= 0.0);
    }

    #[test]
    fn builtins_are_registered_with_distinct_names() {
        let interner = new_shared_interner();
        let fns = builtins(&interner);
        let names: Vec<&str> = fns.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "clock", "abs", "sqrt", "pow", "floor", "ceil", "round", "len", "type_of",
                "to_string", "to_number", "input",
            ]
        );
    }

    #[test]
    fn pow_raises_base_to_exponent() {
        let interner = new_shared_interner();
        let v = pow(&[Value::Number(2.0), Value::Number(10.0)], &interner).unwrap();
        assert_eq!(v.as_number(), Some(1024.0));
    }

    #[rstest]
    #[case(floor, 1.7, 1.0)]
    #[case(floor, -1.2, -2.0)]
    #[case(ceil, 1.2, 2.0)]
    #[case(ceil, -1.7, -1.0)]
    #[case(round, 1.5, 2.0)]
    #[case(round, 1.4, 1.0)]
    fn rounding_natives_match_std(
        #[case] native: fn(&[Value], &SharedInterner) -> Result<Value, RuntimeError>,
        #[case] input: f64,
        #[case] expected: f64,
    ) {
        let interner = new_shared_interner();
        assert_eq!(native(&[Value::Number(input)], &interner).unwrap().as_number(), Some(expected));
    }

    #[test]
    fn len_counts_characters_of_an_interned_string() {
        let interner = new_shared_interner();
        let sym = interner.borrow_mut().intern("hello");
        let v = len(&[Value::string_symbol(sym)], &interner).unwrap();
        assert_eq!(v.as_number(), Some(5.0));
    }

    #[test]
    fn len_rejects_non_strings() {
        let interner = new_shared_interner();
        assert!(len(&[Value::Number(1.0)], &interner).is_err());
    }

    #[test]
    fn type_of_names_every_kind() {
        let interner = new_shared_interner();
        let sym = type_of(&[Value::Nil], &interner).unwrap().as_string_symbol().unwrap();
        assert_eq!(interner.borrow().resolve(sym), "nil");
    }

    #[test]
    fn to_string_matches_print_formatting() {
        let interner = new_shared_interner();
        let sym = to_string(&[Value::Number(7.0)], &interner).unwrap().as_string_symbol().unwrap();
        assert_eq!(interner.borrow().resolve(sym), "7");
    }

    #[rstest]
    #[case(" 42 ", 42.0)]
    #[case("3.5", 3.5)]
    #[case("-7", -7.0)]
    #[case("\t1\n", 1.0)]
    fn to_number_parses_trimmed_strings(#[case] input: &str, #[case] expected: f64) {
        let interner = new_shared_interner();
        let sym = interner.borrow_mut().intern(input);
        let v = to_number(&[Value::string_symbol(sym)], &interner).unwrap();
        assert_eq!(v.as_number(), Some(expected));
    }

    #[test]
    fn to_number_rejects_unparsable_strings() {
        let interner = new_shared_interner();
        let sym = interner.borrow_mut().intern("not a number");
        assert!(to_number(&[Value::string_symbol(sym)], &interner).is_err());
    }
}
