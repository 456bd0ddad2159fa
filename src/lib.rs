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

//! Rust bindings to swi-prolog.
//!
//! Everything that talks to the engine goes through [with_prolog], which initializes the engine
//! on first use and attaches an engine to the calling thread.
//!
//! # Examples
//!
//! ```
//! # use prologue::with_prolog;
//! # #[cfg(not(miri))]
//! with_prolog(|prolog| {
//!     prolog.assertz("father(michael, john)").unwrap();
//!     prolog.assertz("father(michael, gina)").unwrap();
//!
//!     let children = prolog
//!         .query("father(michael, X)")
//!         .unwrap()
//!         .map(|solution| solution.unwrap()["X"].to_string())
//!         .collect::<Vec<_>>();
//!     assert_eq!(children, ["john", "gina"]);
//! })
//! .unwrap();
//! ```

pub mod atom;
pub mod database;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod error;
pub mod foreign;
pub mod frame;
pub mod functor;
pub mod init;
pub mod module;
pub mod query;
pub mod sys;
pub mod term;
pub mod utils;
pub mod value;
pub mod variable;

pub use {
    atom::Atom,
    decode::{Decoded, Dict},
    encode::{PutTerm, Unify},
    engine::with_prolog,
    error::Error,
    foreign::{Control, ForeignPredicate, IntoOutcome, Outcome, Predicate, Registration},
    frame::Frame,
    functor::{Compound, Functor},
    init::{Bootstrap, Config, Initialization, exit, initialize},
    module::Module,
    prologue_proc_macros::foreign_predicate,
    query::{Query, QueryOptions, Solution, TermQuery},
    term::{Term, TermType},
    value::{ErrorTerm, Value, register_interpreter},
    variable::Variable,
};

use {
    crate::frame::FrameSlot,
    std::{
        cell::{Cell, RefCell},
        marker::PhantomData,
    },
};

/// Engine session of the current thread.
///
/// Obtained through [with_prolog]. Each thread has its own session, so at most one query is open
/// per thread at a time.
#[derive(Debug)]
pub struct Prolog {
    query_open: Cell<bool>,
    frames: RefCell<Vec<FrameSlot>>,
    _marker: PhantomData<*mut ()>,
}
impl Prolog {
    const fn new() -> Self {
        Self {
            query_open: Cell::new(false),
            frames: RefCell::new(Vec::new()),
            _marker: PhantomData,
        }
    }

    /// Whether a [Query] opened on this thread has not been closed yet.
    pub fn is_query_open(&self) -> bool {
        self.query_open.get()
    }

    /// Run `operation` inside a fresh foreign frame.
    ///
    /// Terms made inside the frame cannot leave it and any bindings are undone afterwards.
    ///
    /// ```compile_fail
    /// # use prologue::with_prolog;
    /// with_prolog(|prolog| prolog.with_frame(|frame| frame.new_term_ref())).unwrap();
    /// ```
    pub fn with_frame<F, O>(&self, operation: F) -> O
    where
        F: for<'f> FnOnce(&'f Frame<'_>) -> O,
    {
        let frame = Frame::open(self);
        operation(&frame)
    }
}
