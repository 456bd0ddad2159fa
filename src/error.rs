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

//! Defines [`Error`], the error type shared by every fallible operation in this crate.

use {
    crate::value::Value,
    std::{ffi::NulError, path::PathBuf},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not initialize the Prolog environment. PL_initialise returned {0}")]
    Initialization(i32),

    #[error("failed to assert the bridge predicate `prologue_run/2`")]
    Bootstrap,

    #[error("unable to attach a prolog engine to the current thread")]
    AttachEngine,

    /// A query was opened on a thread that already has one open.
    #[error("The last query was not closed")]
    NestedQuery,

    #[error("the engine refused to open a query for `{0}`")]
    OpenQuery(String),

    /// The goal of a query raised an exception.
    #[error("Caused by: '{query}'. Returned: '{term}'.")]
    Prolog { query: String, term: Value },

    /// A goal run with [Prolog::call](crate::Prolog::call) raised an exception.
    #[error("{0}")]
    Exception(Value),

    #[error("cannot read `{0}` as a term")]
    Syntax(String),

    #[error("Term is expected to be of type: '{expected}'")]
    InvalidType { expected: &'static str },

    #[error("Expected an argument of type '{expected}' but got '{found}'")]
    ArgumentType {
        expected: &'static str,
        found: String,
    },

    /// The value has no term representation.
    #[error("cannot encode {0} as a term")]
    Unsupported(&'static str),

    #[error("the engine failed to build a {0} term")]
    Encode(&'static str),

    #[error("cannot decode a cyclic term")]
    CyclicTerm,

    #[error("unknown term type tag {0}")]
    UnknownTermType(i32),

    #[error("functor {name}/{arity} cannot be applied to {found} arguments")]
    ArityMismatch {
        name: String,
        arity: usize,
        found: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("goal `{goal}` failed")]
    Failed { goal: String },

    #[error("failed to register foreign predicate {name}/{arity}")]
    Registration { name: String, arity: usize },

    #[error("foreign predicate panicked: {0}")]
    ForeignPanic(String),

    #[error("cannot resolve `{}`: {reason}", path.display())]
    Path { path: PathBuf, reason: &'static str },

    #[error(transparent)]
    Nul(#[from] NulError),
}
