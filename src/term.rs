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
        atom::Atom,
        frame::StringsMark,
        sys::{
            PL_compare, PL_copy_term_ref, PL_get_atom, PL_get_bool, PL_get_float, PL_get_int64,
            PL_get_nchars, PL_is_acyclic, PL_new_term_ref, PL_skip_list, PL_term_type,
            PL_unify, PROLOGUE_REEXPORTS_BUF_STACK, PROLOGUE_REEXPORTS_CVT_STRING,
            PROLOGUE_REEXPORTS_CVT_VARIABLE, PROLOGUE_REEXPORTS_CVT_WRITE,
            PROLOGUE_REEXPORTS_CVT_WRITEQ, PROLOGUE_REEXPORTS_PL_ATOM,
            PROLOGUE_REEXPORTS_PL_BLOB, PROLOGUE_REEXPORTS_PL_CYCLIC_TERM,
            PROLOGUE_REEXPORTS_PL_DICT, PROLOGUE_REEXPORTS_PL_FLOAT,
            PROLOGUE_REEXPORTS_PL_INTEGER, PROLOGUE_REEXPORTS_PL_LIST,
            PROLOGUE_REEXPORTS_PL_LIST_PAIR, PROLOGUE_REEXPORTS_PL_NIL,
            PROLOGUE_REEXPORTS_PL_PARTIAL_LIST, PROLOGUE_REEXPORTS_PL_RATIONAL,
            PROLOGUE_REEXPORTS_PL_STRING, PROLOGUE_REEXPORTS_PL_TERM,
            PROLOGUE_REEXPORTS_PL_VARIABLE, PROLOGUE_REEXPORTS_REP_UTF8, term_t,
        },
        utils::c_predicate,
    },
    bstr::{BStr, BString},
    std::{
        ffi::{c_int, c_uint},
        fmt::{self, Debug, Display, Formatter},
        marker::PhantomData,
        ptr, slice,
    },
};

/// Type tag of a term as reported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermType {
    Variable,
    Atom,
    /// The reserved `[]`.
    Nil,
    Integer,
    Rational,
    Float,
    String,
    Compound,
    /// A `'[|]'/2` cell.
    ListPair,
    Blob,
    Dict,
    Unknown(c_int),
}
impl TermType {
    fn from_tag(tag: c_int) -> Self {
        let tags = unsafe {
            [
                (PROLOGUE_REEXPORTS_PL_VARIABLE, Self::Variable),
                (PROLOGUE_REEXPORTS_PL_ATOM, Self::Atom),
                (PROLOGUE_REEXPORTS_PL_NIL, Self::Nil),
                (PROLOGUE_REEXPORTS_PL_INTEGER, Self::Integer),
                (PROLOGUE_REEXPORTS_PL_RATIONAL, Self::Rational),
                (PROLOGUE_REEXPORTS_PL_FLOAT, Self::Float),
                (PROLOGUE_REEXPORTS_PL_STRING, Self::String),
                (PROLOGUE_REEXPORTS_PL_TERM, Self::Compound),
                (PROLOGUE_REEXPORTS_PL_LIST_PAIR, Self::ListPair),
                (PROLOGUE_REEXPORTS_PL_BLOB, Self::Blob),
                (PROLOGUE_REEXPORTS_PL_DICT, Self::Dict),
            ]
        };

        tags.into_iter()
            .find_map(|(known, ty)| (known == tag).then_some(ty))
            .unwrap_or(Self::Unknown(tag))
    }
}

/// Result of walking a list skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ListShape {
    Proper(usize),
    Partial,
    Cyclic,
    NotAList,
}

/// Reference to a term on the engine's stack, valid while the frame `'f` is alive.
#[derive(Clone, Copy)]
pub struct Term<'f> {
    handle: term_t,
    _marker: PhantomData<&'f ()>,
}
impl<'f> Term<'f> {
    /// # Safety
    ///
    /// `handle` must be a term reference that stays valid for `'f`.
    pub unsafe fn from_raw(handle: term_t) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    pub fn as_raw(&self) -> term_t {
        self.handle
    }

    pub fn term_type(&self) -> TermType {
        TermType::from_tag(unsafe { PL_term_type(self.handle) })
    }

    /// New reference to the same term in the innermost frame.
    ///
    /// Scratch only: the reference must not outlive the call that made it.
    pub(crate) fn copy(&self) -> Self {
        unsafe { Self::from_raw(PL_copy_term_ref(self.handle)) }
    }

    /// New unbound term reference in the innermost frame. Scratch only, like [Term::copy].
    pub(crate) fn fresh(&self) -> Self {
        unsafe { Self::from_raw(PL_new_term_ref()) }
    }

    pub fn is_acyclic(&self) -> bool {
        c_predicate(|| unsafe { PL_is_acyclic(self.handle) })
    }

    pub(crate) fn list_shape(&self) -> ListShape {
        let mut len = 0;
        let shape = unsafe { PL_skip_list(self.handle, 0, &raw mut len) };
        unsafe {
            if shape == PROLOGUE_REEXPORTS_PL_LIST {
                ListShape::Proper(len)
            } else if shape == PROLOGUE_REEXPORTS_PL_PARTIAL_LIST {
                ListShape::Partial
            } else if shape == PROLOGUE_REEXPORTS_PL_CYCLIC_TERM {
                ListShape::Cyclic
            } else {
                ListShape::NotAList
            }
        }
    }

    /// Copy the text of the term as converted by `flags`.
    pub(crate) fn text(&self, flags: c_uint) -> Option<Vec<u8>> {
        let _mark = StringsMark::new();
        let mut len = 0;
        let mut chars = ptr::null_mut();

        c_predicate(|| unsafe {
            PL_get_nchars(
                self.handle,
                &raw mut len,
                &raw mut chars,
                flags | PROLOGUE_REEXPORTS_BUF_STACK | PROLOGUE_REEXPORTS_REP_UTF8,
            )
        })
        .then(|| unsafe { slice::from_raw_parts(chars.cast::<u8>(), len) }.to_vec())
    }

    pub fn get_i64(&self) -> Result<i64, Error> {
        let mut value = 0;
        c_predicate(|| unsafe { PL_get_int64(self.handle, &raw mut value) })
            .then_some(value)
            .ok_or(Error::InvalidType {
                expected: "integer",
            })
    }

    pub fn get_f64(&self) -> Result<f64, Error> {
        let mut value = 0.0;
        c_predicate(|| unsafe { PL_get_float(self.handle, &raw mut value) })
            .then_some(value)
            .ok_or(Error::InvalidType { expected: "float" })
    }

    pub fn get_bool(&self) -> Result<bool, Error> {
        let mut value = 0;
        c_predicate(|| unsafe { PL_get_bool(self.handle, &raw mut value) })
            .then_some(value != 0)
            .ok_or(Error::InvalidType { expected: "bool" })
    }

    pub fn get_atom(&self) -> Result<Atom, Error> {
        let mut atom = 0;
        c_predicate(|| unsafe { PL_get_atom(self.handle, &raw mut atom) })
            .then(|| unsafe { Atom::from_raw(atom) })
            .ok_or(Error::InvalidType { expected: "atom" })
    }

    /// Bytes of a string term.
    pub fn get_string(&self) -> Result<BString, Error> {
        (self.term_type() == TermType::String)
            .then(|| self.text(unsafe { PROLOGUE_REEXPORTS_CVT_STRING }))
            .flatten()
            .map(BString::from)
            .ok_or(Error::InvalidType { expected: "string" })
    }

    /// Engine name of an unbound variable, such as `_G123`.
    pub(crate) fn variable_name(&self) -> Option<String> {
        self.text(unsafe { PROLOGUE_REEXPORTS_CVT_VARIABLE })
            .map(|name| String::from_utf8_lossy(&name).into_owned())
    }

    /// Unify with another term.
    pub fn unify_with(&self, other: &Term<'_>) -> bool {
        c_predicate(|| unsafe { PL_unify(self.handle, other.handle) })
    }

    fn write(&self, f: &mut Formatter<'_>, flags: c_uint) -> Result<(), fmt::Error> {
        match self.text(flags) {
            Some(text) => Display::fmt(BStr::new(&text), f),
            None => write!(f, "<term {}>", self.handle),
        }
    }
}
impl PartialEq for Term<'_> {
    /// Compare by the standard order of terms.
    fn eq(&self, other: &Self) -> bool {
        unsafe { PL_compare(self.handle, other.handle) == 0 }
    }
}
impl Display for Term<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.write(f, unsafe { PROLOGUE_REEXPORTS_CVT_WRITE })
    }
}
impl Debug for Term<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.write(f, unsafe { PROLOGUE_REEXPORTS_CVT_WRITEQ })
    }
}
