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

use {
    crate::{
        Error, engine,
        atom::Atom,
        frame::Frame,
        functor::Compound,
        sys::PL_get_list,
        term::{ListShape, Term, TermType},
        utils::c_predicate,
        value::Value,
        variable::Variable,
    },
    bstr::BString,
    itertools::Itertools,
    std::fmt::{self, Display, Formatter},
};

/// Term decoded one level into rust, still holding handles into its frame.
#[derive(Clone, Debug)]
pub enum Decoded<'f> {
    Variable(Variable<'f>),
    Atom(Atom),
    String(BString),
    Integer(i64),
    Float(f64),
    /// Proper list. `[]` decodes as an empty list.
    List(Vec<Decoded<'f>>),
    Compound(Compound<'f>),
    Dict(Dict<'f>),
    /// Rationals and blobs, as written by the engine.
    Opaque(String),
}
impl<'f> Decoded<'f> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Variable(_) => "variable",
            Self::Atom(_) => "atom",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::List(_) => "list",
            Self::Compound(_) => "compound",
            Self::Dict(_) => "dict",
            Self::Opaque(_) => "opaque",
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::ArgumentType {
            expected,
            found: self.type_name().to_owned(),
        }
    }

    pub fn as_i64(&self) -> Result<i64, Error> {
        match self {
            Self::Integer(value) => Ok(*value),
            _ => Err(self.mismatch("integer")),
        }
    }

    pub fn as_f64(&self) -> Result<f64, Error> {
        match self {
            Self::Float(value) => Ok(*value),
            Self::Integer(value) => Ok(*value as f64),
            _ => Err(self.mismatch("float")),
        }
    }

    /// Text of an atom or a string.
    pub fn as_text(&self) -> Result<String, Error> {
        match self {
            Self::Atom(atom) => Ok(atom.name().to_owned()),
            Self::String(text) => Ok(text.to_string()),
            _ => Err(self.mismatch("text")),
        }
    }

    pub fn as_variable_mut(&mut self) -> Result<&mut Variable<'f>, Error> {
        match self {
            Self::Variable(variable) => Ok(variable),
            _ => Err(self.mismatch("variable")),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Variable(variable) => Value::Variable(variable.to_string()),
            Self::Atom(atom) => Value::from_atom(atom.name()),
            Self::String(text) => Value::String(text.clone()),
            Self::Integer(value) => Value::Integer(*value),
            Self::Float(value) => Value::Float(*value),
            Self::List(items) => Value::List(items.iter().map(Self::to_value).collect()),
            Self::Compound(compound) => compound.to_value(),
            Self::Dict(dict) => Value::Dict(
                dict.entries
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_value()))
                    .collect(),
            ),
            Self::Opaque(text) => Value::Opaque(text.clone()),
        }
    }
}
impl Display for Decoded<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Variable(variable) => Display::fmt(variable, f),
            Self::Atom(atom) => Display::fmt(atom, f),
            Self::String(text) => Display::fmt(text, f),
            Self::Integer(value) => Display::fmt(value, f),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::List(items) => write!(f, "[{}]", items.iter().format(", ")),
            Self::Compound(compound) => Display::fmt(compound, f),
            Self::Dict(dict) => Display::fmt(dict, f),
            Self::Opaque(text) => f.write_str(text),
        }
    }
}

/// SWI-Prolog dict.
#[derive(Clone, Debug)]
pub struct Dict<'f> {
    pub tag: Box<Decoded<'f>>,
    /// Key value pairs in standard order of the keys.
    pub entries: Vec<(Decoded<'f>, Decoded<'f>)>,
}
impl Display for Dict<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let tag = match &*self.tag {
            Decoded::Variable(_) => "_".to_owned(),
            tag => tag.to_string(),
        };
        write!(
            f,
            "{tag}{{{}}}",
            self.entries
                .iter()
                .format_with(", ", |(key, value), f| f(&format_args!("{key}: {value}")))
        )
    }
}

impl Term<'_> {
    /// Decode the term one level into rust.
    ///
    /// Every handle in the result is made in `frame`, which has to be the innermost open frame.
    /// Cyclic terms are rejected before anything is decoded.
    pub fn decode<'g>(&self, frame: &'g Frame<'_>) -> Result<Decoded<'g>, Error> {
        if !self.is_acyclic() {
            return Err(Error::CyclicTerm);
        }
        decode_acyclic(frame.copy_term_ref(self), frame)
    }

    /// Decode and normalize the term.
    pub fn value(&self) -> Result<Value, Error> {
        engine::with_current(|prolog| {
            prolog.with_frame(|frame| self.decode(frame).map(|decoded| decoded.to_value()))
        })
    }
}

pub(crate) fn decode_acyclic<'g>(
    term: Term<'g>,
    frame: &'g Frame<'_>,
) -> Result<Decoded<'g>, Error> {
    match term.term_type() {
        TermType::Variable => Ok(Decoded::Variable(Variable::from_term(term))),
        TermType::Atom => term.get_atom().map(Decoded::Atom),
        TermType::Nil => Ok(Decoded::List(Vec::new())),
        TermType::String => term.get_string().map(Decoded::String),
        TermType::Integer => term
            .get_i64()
            .map(Decoded::Integer)
            .map_err(|_| Error::InvalidType {
                expected: "64-bit integer",
            }),
        TermType::Float => term.get_f64().map(Decoded::Float),
        TermType::Rational | TermType::Blob => Ok(Decoded::Opaque(term.to_string())),
        TermType::Compound | TermType::ListPair => match term.list_shape() {
            ListShape::Proper(len) => decode_list(term, len, frame).map(Decoded::List),
            ListShape::Cyclic => Err(Error::CyclicTerm),
            ListShape::Partial | ListShape::NotAList => {
                Compound::decode(term, frame).map(Decoded::Compound)
            }
        },
        TermType::Dict => decode_dict(term, frame).map(Decoded::Dict),
        TermType::Unknown(tag) => Err(Error::UnknownTermType(tag)),
    }
}

fn decode_list<'g>(
    term: Term<'g>,
    len: usize,
    frame: &'g Frame<'_>,
) -> Result<Vec<Decoded<'g>>, Error> {
    let list = frame.copy_term_ref(&term);
    let mut items = Vec::with_capacity(len);

    loop {
        let head = frame.new_term_ref();
        if !c_predicate(|| unsafe { PL_get_list(list.as_raw(), head.as_raw(), list.as_raw()) }) {
            break Ok(items);
        }
        items.push(decode_acyclic(head, frame)?);
    }
}

fn decode_dict<'g>(term: Term<'g>, frame: &'g Frame<'_>) -> Result<Dict<'g>, Error> {
    let mut args = Compound::decode(term, frame)?.into_args().into_iter();
    let tag = args.next().ok_or(Error::InvalidType { expected: "dict" })?;

    Ok(Dict {
        tag: Box::new(tag),
        entries: args.tuples().map(|(value, key)| (key, value)).collect(),
    })
}
