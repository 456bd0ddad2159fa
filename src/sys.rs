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

//! Subset of `SWI-Prolog.h` used by this crate.
//!
//! Sizes that changed from `int` to `size_t` between releases are declared as [usize] since
//! that is safe to pass either way on the supported targets.

#![allow(non_camel_case_types, non_upper_case_globals)]

use std::ffi::{c_char, c_int, c_uint, c_void};

pub type atom_t = usize;
pub type functor_t = usize;
pub type term_t = usize;
pub type qid_t = usize;
pub type fid_t = usize;
pub type foreign_t = usize;
pub type buf_mark_t = usize;
pub type module_t = *mut c_void;
pub type predicate_t = *mut c_void;
pub type control_t = *mut c_void;

pub type pl_varargs_function_t =
    unsafe extern "C" fn(_: term_t, _: c_int, _: control_t) -> foreign_t;

unsafe extern "C" {
    pub fn atexit(_: extern "C" fn()) -> c_int;

    pub static PROLOGUE_REEXPORTS_PL_VARIABLE: c_int;
    pub static PROLOGUE_REEXPORTS_PL_ATOM: c_int;
    pub static PROLOGUE_REEXPORTS_PL_INTEGER: c_int;
    pub static PROLOGUE_REEXPORTS_PL_RATIONAL: c_int;
    pub static PROLOGUE_REEXPORTS_PL_FLOAT: c_int;
    pub static PROLOGUE_REEXPORTS_PL_STRING: c_int;
    pub static PROLOGUE_REEXPORTS_PL_TERM: c_int;
    pub static PROLOGUE_REEXPORTS_PL_NIL: c_int;
    pub static PROLOGUE_REEXPORTS_PL_BLOB: c_int;
    pub static PROLOGUE_REEXPORTS_PL_LIST_PAIR: c_int;
    pub static PROLOGUE_REEXPORTS_PL_DICT: c_int;

    pub static PROLOGUE_REEXPORTS_PL_LIST: c_int;
    pub static PROLOGUE_REEXPORTS_PL_PARTIAL_LIST: c_int;
    pub static PROLOGUE_REEXPORTS_PL_CYCLIC_TERM: c_int;
    pub static PROLOGUE_REEXPORTS_PL_NOT_A_LIST: c_int;

    pub static PROLOGUE_REEXPORTS_PL_Q_NORMAL: c_int;
    pub static PROLOGUE_REEXPORTS_PL_Q_NODEBUG: c_int;
    pub static PROLOGUE_REEXPORTS_PL_Q_CATCH_EXCEPTION: c_int;

    pub static PROLOGUE_REEXPORTS_PL_FA_NONDETERMINISTIC: c_int;
    pub static PROLOGUE_REEXPORTS_PL_FA_VARARGS: c_int;

    pub static PROLOGUE_REEXPORTS_PL_FIRST_CALL: c_int;
    pub static PROLOGUE_REEXPORTS_PL_PRUNED: c_int;
    pub static PROLOGUE_REEXPORTS_PL_REDO: c_int;

    pub static PROLOGUE_REEXPORTS_CVT_ATOM: c_uint;
    pub static PROLOGUE_REEXPORTS_CVT_STRING: c_uint;
    pub static PROLOGUE_REEXPORTS_CVT_VARIABLE: c_uint;
    pub static PROLOGUE_REEXPORTS_CVT_WRITE: c_uint;
    pub static PROLOGUE_REEXPORTS_CVT_WRITEQ: c_uint;
    pub static PROLOGUE_REEXPORTS_BUF_STACK: c_uint;
    pub static PROLOGUE_REEXPORTS_REP_UTF8: c_uint;

    // lifecycle
    pub fn PL_initialise(_: c_int, _: *mut *mut c_char) -> c_int;
    pub fn PL_is_initialised(_: *mut c_int, _: *mut *mut *mut c_char) -> c_int;
    pub fn PL_cleanup(_: c_int) -> c_int;
    pub fn PL_thread_self() -> c_int;
    pub fn PL_thread_attach_engine(_: *mut c_void) -> c_int;
    pub fn PL_thread_destroy_engine() -> c_int;

    // frames and term references
    pub fn PL_open_foreign_frame() -> fid_t;
    pub fn PL_close_foreign_frame(_: fid_t);
    pub fn PL_discard_foreign_frame(_: fid_t);
    pub fn PL_new_term_ref() -> term_t;
    pub fn PL_new_term_refs(_: usize) -> term_t;
    pub fn PL_copy_term_ref(_: term_t) -> term_t;
    pub fn PL_mark_string_buffers(_: *mut buf_mark_t);
    pub fn PL_release_string_buffers_from_mark(_: buf_mark_t);

    // atoms and functors
    pub fn PL_new_atom_mbchars(_: c_int, _: usize, _: *const c_char) -> atom_t;
    pub fn PL_atom_mbchars(_: atom_t, _: *mut usize, _: *mut *mut c_char, _: c_uint) -> c_int;
    pub fn PL_register_atom(_: atom_t);
    pub fn PL_unregister_atom(_: atom_t);
    pub fn PL_new_functor(_: atom_t, _: usize) -> functor_t;
    pub fn PL_functor_name(_: functor_t) -> atom_t;
    pub fn PL_functor_arity(_: functor_t) -> usize;
    pub fn PL_new_module(_: atom_t) -> module_t;
    pub fn PL_module_name(_: module_t) -> atom_t;

    // inspection
    pub fn PL_term_type(_: term_t) -> c_int;
    pub fn PL_is_acyclic(_: term_t) -> c_int;
    pub fn PL_skip_list(_: term_t, _: term_t, _: *mut usize) -> c_int;
    pub fn PL_compare(_: term_t, _: term_t) -> c_int;

    // decoding
    pub fn PL_get_nchars(_: term_t, _: *mut usize, _: *mut *mut c_char, _: c_uint) -> c_int;
    pub fn PL_get_atom(_: term_t, _: *mut atom_t) -> c_int;
    pub fn PL_get_bool(_: term_t, _: *mut c_int) -> c_int;
    pub fn PL_get_int64(_: term_t, _: *mut i64) -> c_int;
    pub fn PL_get_float(_: term_t, _: *mut f64) -> c_int;
    pub fn PL_get_functor(_: term_t, _: *mut functor_t) -> c_int;
    pub fn PL_get_arg(_: usize, _: term_t, _: term_t) -> c_int;
    pub fn PL_get_list(_: term_t, _: term_t, _: term_t) -> c_int;

    // encoding
    pub fn PL_put_variable(_: term_t) -> c_int;
    pub fn PL_put_atom(_: term_t, _: atom_t) -> c_int;
    pub fn PL_put_chars(_: term_t, _: c_int, _: usize, _: *const c_char) -> c_int;
    pub fn PL_put_bool(_: term_t, _: c_int) -> c_int;
    pub fn PL_put_int64(_: term_t, _: i64) -> c_int;
    pub fn PL_put_float(_: term_t, _: f64) -> c_int;
    pub fn PL_put_nil(_: term_t) -> c_int;
    pub fn PL_put_term(_: term_t, _: term_t) -> c_int;
    pub fn PL_put_functor(_: term_t, _: functor_t) -> c_int;
    pub fn PL_cons_functor_v(_: term_t, _: functor_t, _: term_t) -> c_int;
    pub fn PL_cons_list(_: term_t, _: term_t, _: term_t) -> c_int;
    pub fn PL_chars_to_term(_: *const c_char, _: term_t) -> c_int;

    // unification
    pub fn PL_unify(_: term_t, _: term_t) -> c_int;
    pub fn PL_unify_atom(_: term_t, _: atom_t) -> c_int;
    pub fn PL_unify_chars(_: term_t, _: c_int, _: usize, _: *const c_char) -> c_int;
    pub fn PL_unify_bool(_: term_t, _: c_int) -> c_int;
    pub fn PL_unify_int64(_: term_t, _: i64) -> c_int;
    pub fn PL_unify_float(_: term_t, _: f64) -> c_int;
    pub fn PL_unify_list(_: term_t, _: term_t, _: term_t) -> c_int;
    pub fn PL_unify_nil(_: term_t) -> c_int;

    // calling
    pub fn PL_predicate(_: *const c_char, _: c_int, _: *const c_char) -> predicate_t;
    pub fn PL_pred(_: functor_t, _: module_t) -> predicate_t;
    pub fn PL_open_query(_: module_t, _: c_int, _: predicate_t, _: term_t) -> qid_t;
    pub fn PL_next_solution(_: qid_t) -> c_int;
    pub fn PL_cut_query(_: qid_t) -> c_int;
    pub fn PL_close_query(_: qid_t) -> c_int;
    pub fn PL_exception(_: qid_t) -> term_t;
    pub fn PL_clear_exception();
    pub fn PL_raise_exception(_: term_t) -> c_int;
    pub fn PL_call(_: term_t, _: module_t) -> c_int;

    // foreign predicates
    pub fn PL_register_foreign_in_module(
        _: *const c_char,
        _: *const c_char,
        _: c_int,
        _: pl_varargs_function_t,
        _: c_int,
        ...
    ) -> c_int;
    pub fn PL_foreign_control(_: control_t) -> c_int;
    pub fn PL_foreign_context(_: control_t) -> isize;
    pub fn PL_foreign_context_address(_: control_t) -> *mut c_void;
    pub fn PL_foreign_context_predicate(_: control_t) -> predicate_t;
    pub fn PL_predicate_info(
        _: predicate_t,
        _: *mut atom_t,
        _: *mut usize,
        _: *mut module_t,
    ) -> c_int;
    pub fn _PL_retry(_: isize) -> foreign_t;
    pub fn _PL_retry_address(_: *mut c_void) -> foreign_t;
}
