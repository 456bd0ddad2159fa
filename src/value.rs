// prologue - swi-prolog bindings for rust
// Copyright (C) 2025  Andrew Chi

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Plain rust values decoded terms normalize to.

use {
    bstr::BString,
    itertools::Itertools,
    parking_lot::RwLock,
    std::{
        collections::{BTreeMap, HashMap},
        fmt::{self, Display, Formatter},
        sync::{Arc, LazyLock},
    },
};

/// Normalized term.
///
/// `[]` is [Value::None] and the atoms `true` and `false` are [Value::Bool].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Atom(String),
    String(BString),
    Integer(i64),
    Float(f64),
    List(Vec<Value>),
    /// Flattened `','/2`.
    Tuple(Vec<Value>),
    Dict(BTreeMap<String, Value>),
    Compound { name: String, args: Vec<Value> },
    /// Unbound variable with the name the engine gave it.
    Variable(String),
    Error(ErrorTerm),
    /// Terms with no rust counterpart, as written by the engine.
    Opaque(String),
}
impl Value {
    pub(crate) fn from_atom(name: &str) -> Self {
        match name {
            "[]" => Self::None,
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Atom(name.to_owned()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "nil",
            Self::Bool(_) => "bool",
            Self::Atom(_) => "atom",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Compound { .. } => "compound",
            Self::Variable(_) => "variable",
            Self::Error(_) => "error",
            Self::Opaque(_) => "opaque",
        }
    }

    /// Text of an atom or a string.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Atom(name) => Some(name.clone()),
            Self::String(text) => Some(text.to_string()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            Self::None => Some(&[]),
            _ => None,
        }
    }
}
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::None => f.write_str("[]"),
            Self::Bool(value) => Display::fmt(value, f),
            Self::Atom(name) => f.write_str(name),
            Self::String(text) => Display::fmt(text, f),
            Self::Integer(value) => Display::fmt(value, f),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::List(items) => write!(f, "[{}]", items.iter().format(", ")),
            Self::Tuple(items) => write!(f, "({})", items.iter().format(", ")),
            Self::Dict(entries) => write!(
                f,
                "_{{{}}}",
                entries
                    .iter()
                    .format_with(", ", |(key, value), f| f(&format_args!("{key}: {value}")))
            ),
            Self::Compound { name, args } if args.is_empty() => f.write_str(name),
            Self::Compound { name, args } => write!(f, "{name}({})", args.iter().format(", ")),
            Self::Variable(name) | Self::Opaque(name) => f.write_str(name),
            Self::Error(error) => Display::fmt(error, f),
        }
    }
}
impl PartialEq<str> for Value {
    /// Atoms and strings compare equal to their text.
    fn eq(&self, other: &str) -> bool {
        match self {
            Self::Atom(name) => name == other,
            Self::String(text) => text == other,
            _ => false,
        }
    }
}
impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Error term given a rust shape.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorTerm {
    /// `error(Formal, Context)`.
    Error {
        formal: Box<Value>,
        context: Box<Value>,
    },
    /// `existence_error(Kind, What)`.
    Existence { kind: Box<Value>, what: Box<Value> },
}
impl Display for ErrorTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Error { formal, context } => write!(f, "error({formal}, {context})"),
            Self::Existence { kind, what } => write!(f, "Does not exist: {kind} {what}"),
        }
    }
}

/// Turns the arguments of a compound into a value.
pub type Interpreter = Arc<dyn Fn(Vec<Value>) -> Value + Send + Sync>;

static INTERPRETERS: LazyLock<RwLock<HashMap<(String, usize), Interpreter>>> =
    LazyLock::new(|| {
        let builtins: [(&str, usize, Interpreter); 4] = [
            ("=", 2, Arc::new(interpret_unification)),
            (",", 2, Arc::new(interpret_conjunction)),
            ("error", 2, Arc::new(interpret_error)),
            ("existence_error", 2, Arc::new(interpret_existence_error)),
        ];

        RwLock::new(
            builtins
                .into_iter()
                .map(|(name, arity, interpreter)| ((name.to_owned(), arity), interpreter))
                .collect(),
        )
    });

fn into_pair(args: Vec<Value>) -> (Value, Value) {
    let mut args = args.into_iter();
    let first = args.next().unwrap_or(Value::None);
    let second = args.next().unwrap_or(Value::None);
    (first, second)
}

fn interpret_unification(args: Vec<Value>) -> Value {
    let (name, value) = into_pair(args);
    Value::Dict(BTreeMap::from([(name.to_string(), value)]))
}

fn interpret_conjunction(args: Vec<Value>) -> Value {
    let (left, right) = into_pair(args);
    match right {
        Value::Tuple(mut rest) => {
            rest.insert(0, left);
            Value::Tuple(rest)
        }
        right => Value::Tuple(vec![left, right]),
    }
}

fn interpret_error(args: Vec<Value>) -> Value {
    let (formal, context) = into_pair(args);
    Value::Error(ErrorTerm::Error {
        formal: Box::new(formal),
        context: Box::new(context),
    })
}

fn interpret_existence_error(args: Vec<Value>) -> Value {
    let (kind, what) = into_pair(args);
    Value::Error(ErrorTerm::Existence {
        kind: Box::new(kind),
        what: Box::new(what),
    })
}

/// Set the interpreter for compounds `name/arity`, returning the previous one.
///
/// # Examples
///
/// ```
/// # use {prologue::{Value, register_interpreter, with_prolog}, std::sync::Arc};
/// register_interpreter("point", 2, Arc::new(|args| Value::Tuple(args)));
/// # #[cfg(not(miri))]
/// with_prolog(|prolog| {
///     let solution = prolog.query("X = point(1, 2)").unwrap().next().unwrap().unwrap();
///     assert_eq!(
///         solution["X"],
///         Value::Tuple(vec![Value::Integer(1), Value::Integer(2)])
///     );
/// })
/// .unwrap();
/// ```
pub fn register_interpreter<S>(name: S, arity: usize, interpreter: Interpreter) -> Option<Interpreter>
where
    S: Into<String>,
{
    INTERPRETERS.write().insert((name.into(), arity), interpreter)
}

/// Normalize the compound `name(args...)`.
pub(crate) fn interpret(name: &str, args: Vec<Value>) -> Value {
    let interpreter = INTERPRETERS
        .read()
        .get(&(name.to_owned(), args.len()))
        .cloned();

    match interpreter {
        Some(interpreter) => interpreter(args),
        None => Value::Compound {
            name: name.to_owned(),
            args,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms() {
        assert_eq!(Value::from_atom("[]"), Value::None);
        assert_eq!(Value::from_atom("true"), Value::Bool(true));
        assert_eq!(Value::from_atom("false"), Value::Bool(false));
        assert_eq!(Value::from_atom("gnu"), "gnu");
    }

    #[test]
    fn builtin_interpreters() {
        assert_eq!(
            interpret("=", vec![Value::Atom("X".into()), Value::Integer(1)]),
            Value::Dict(BTreeMap::from([("X".into(), Value::Integer(1))]))
        );
        assert_eq!(
            interpret(
                ",",
                vec![
                    Value::Atom("a".into()),
                    interpret(",", vec![Value::Atom("b".into()), Value::Atom("c".into())])
                ]
            ),
            Value::Tuple(vec![
                Value::Atom("a".into()),
                Value::Atom("b".into()),
                Value::Atom("c".into())
            ])
        );
        assert_eq!(
            interpret(
                "existence_error",
                vec![Value::Atom("procedure".into()), Value::Atom("foo/0".into())]
            )
            .to_string(),
            "Does not exist: procedure foo/0"
        );
        assert_eq!(
            interpret("=", vec![Value::Integer(1)]),
            Value::Compound {
                name: "=".into(),
                args: vec![Value::Integer(1)]
            }
        );
    }

    #[test]
    fn display() {
        let value = Value::Compound {
            name: "f".into(),
            args: vec![
                Value::List(vec![Value::Integer(1), Value::Float(2.0)]),
                Value::Tuple(vec![Value::Atom("a".into()), Value::String("b".into())]),
                Value::Dict(BTreeMap::from([("k".into(), Value::None)])),
            ],
        };
        assert_eq!(value.to_string(), "f([1, 2.0], (a, b), _{k: []})");
        assert_eq!(
            Value::Compound {
                name: "nil".into(),
                args: Vec::new()
            }
            .to_string(),
            "nil"
        );
    }

    #[test]
    fn custom_interpreter() {
        let previous = register_interpreter(
            "celsius",
            1,
            Arc::new(|args| Value::Float(args[0].as_f64().unwrap_or(0.0) * 1.8 + 32.0)),
        );
        assert!(previous.is_none());
        assert_eq!(
            interpret("celsius", vec![Value::Integer(100)]),
            Value::Float(212.0)
        );
    }
}
