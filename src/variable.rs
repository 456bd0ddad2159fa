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
        Error,
        encode::Unify,
        frame::Frame,
        term::{Term, TermType},
        value::Value,
    },
    std::fmt::{self, Display, Formatter},
};

/// Logical variable, possibly bound by now.
#[derive(Clone, Debug)]
pub struct Variable<'f> {
    term: Term<'f>,
    name: Option<String>,
}
impl<'f> Variable<'f> {
    pub fn new(frame: &'f Frame<'_>) -> Self {
        Self {
            term: frame.new_term_ref(),
            name: None,
        }
    }

    /// Fresh variable displayed as `name`.
    pub fn named<S>(frame: &'f Frame<'_>, name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            term: frame.new_term_ref(),
            name: Some(name.into()),
        }
    }

    /// Wrap a term, reading back the engine's name for it if it is unbound.
    pub fn from_term(term: Term<'f>) -> Self {
        Self {
            name: term.variable_name(),
            term,
        }
    }

    pub fn term(&self) -> Term<'f> {
        self.term
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.term.term_type() != TermType::Variable
    }

    /// Unify the variable with `value`.
    ///
    /// The binding lives as long as the innermost frame open at the time of the call.
    pub fn unify<T>(&mut self, value: &T) -> Result<bool, Error>
    where
        T: Unify + ?Sized,
    {
        value.unify_term(&self.term)
    }

    /// Current value of the variable.
    pub fn value(&self) -> Result<Value, Error> {
        self.term.value()
    }
}
impl PartialEq for Variable<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
    }
}
impl Display for Variable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.name {
            Some(name) if !self.is_bound() => f.write_str(name),
            _ => Display::fmt(&self.term, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::with_prolog};

    #[cfg_attr(miri, ignore)]
    #[test]
    fn unify_scalars() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let mut x = Variable::named(frame, "X");
                assert_eq!(x.to_string(), "X");
                assert!(!x.is_bound());
                assert!(x.unify(&42).unwrap());
                assert!(x.is_bound());
                assert_eq!(x.value().unwrap(), Value::Integer(42));
                assert!(!x.unify(&43).unwrap());

                let mut s = Variable::new(frame);
                assert!(s.unify("test").unwrap());
                assert_eq!(s.value().unwrap(), Value::String("test".into()));

                let mut b = Variable::new(frame);
                assert!(b.unify(&true).unwrap());
                assert_eq!(b.value().unwrap(), Value::Bool(true));
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn unify_list() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let mut list = Variable::new(frame);
                assert!(list.unify(&[1_i64, 2, 3][..]).unwrap());
                assert_eq!(
                    list.value().unwrap(),
                    Value::List(vec![
                        Value::Integer(1),
                        Value::Integer(2),
                        Value::Integer(3)
                    ])
                );

                let partial = frame.parse("[1, X, 3]").unwrap();
                let mut copy = Variable::from_term(partial);
                assert!(copy.unify(&[1_i64, 2, 3][..]).unwrap());
                assert_eq!(partial, list.term());
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn bindings_end_with_their_frame() {
        with_prolog(|prolog| {
            prolog.with_frame(|outer| {
                let mut x = Variable::new(outer);
                prolog.with_frame(|_| {
                    assert!(x.unify(&1).unwrap());
                    assert_eq!(x.value().unwrap(), Value::Integer(1));
                });
                let y = outer.new_term_ref();
                y.put(&99).unwrap();

                assert!(!x.is_bound());
                assert!(matches!(x.value().unwrap(), Value::Variable(_)));
                assert!(x.unify(&2).unwrap());
                assert_eq!(x.value().unwrap(), Value::Integer(2));
                assert_eq!(y.get_i64().unwrap(), 99);
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn engine_names() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let unbound = Variable::from_term(frame.new_term_ref());
                assert!(unbound.name().is_some_and(|name| name.starts_with('_')));
                assert_eq!(unbound, unbound.clone());
            })
        })
        .unwrap();
    }
}
