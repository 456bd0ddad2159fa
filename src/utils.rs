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
    crate::Error,
    std::{
        ffi::c_int,
        fs,
        path::{Path, PathBuf},
    },
};

pub fn c_predicate<F>(f: F) -> bool
where
    F: FnOnce() -> c_int,
{
    f() != 0
}

/// Resolve `path` against `relative_to`.
///
/// Absolute paths and a missing `relative_to` return `path` unchanged. A directory makes `path` a
/// child of it and a file makes `path` a sibling of it.
pub fn resolve_path(path: &Path, relative_to: Option<&Path>) -> Result<PathBuf, Error> {
    let Some(base) = relative_to.filter(|_| path.is_relative()) else {
        return Ok(path.to_path_buf());
    };

    let metadata = fs::symlink_metadata(base).map_err(|_| Error::Path {
        path: base.to_path_buf(),
        reason: "relative path does not exist",
    })?;
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        Err(Error::Path {
            path: base.to_path_buf(),
            reason: "symbolic links are not supported",
        })
    } else if file_type.is_dir() {
        Ok(base.join(path))
    } else if file_type.is_file() {
        Ok(base.parent().unwrap_or(Path::new("")).join(path))
    } else {
        Err(Error::Path {
            path: base.to_path_buf(),
            reason: "must be either a file or a directory",
        })
    }
}

/// Quote `text` as a prolog atom.
pub fn quote_atom(text: &str) -> String {
    text.chars()
        .fold(String::from("'"), |mut quoted, ch| {
            if matches!(ch, '\\' | '\'') {
                quoted.push('\\');
            }
            quoted.push(ch);
            quoted
        })
        + "'"
}
