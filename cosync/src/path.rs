// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Resolve upload path templates into object keys.
//!
//! Supported placeholders:
//!
//! | placeholder  | value                                             |
//! |--------------|---------------------------------------------------|
//! | `{YYYY}`     | 4-digit year                                      |
//! | `{MM}`       | zero padded month                                 |
//! | `{DD}`       | zero padded day                                   |
//! | `{PATH}`     | directory of the current file                     |
//! | `{FILENAME}` | current file name without extension               |
//! | `{FOLDER}`   | last segment of the current file's directory      |
//!
//! The upload file name is always appended after substitution, so the last
//! segment of a resolved key is the file being uploaded whatever the
//! template looks like.

use std::path::Path;

use chrono::{Datelike, Local, NaiveDate};
use cosync_core::time::DateTime;

/// Inputs of [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct PathContext<'a> {
    /// Path of the note the upload belongs to, `/` separated.
    pub current_file_path: &'a str,
    /// Name of the uploaded file, appended verbatim.
    pub file_name: &'a str,
    /// Date used for `{YYYY}`, `{MM}` and `{DD}`, today (local time) if unset.
    pub date: Option<NaiveDate>,
}

/// Resolve `template` into an object key.
///
/// ```
/// use chrono::NaiveDate;
/// use cosync::path::{resolve, PathContext};
///
/// let key = resolve(
///     "images/{YYYY}/{MM}/{DD}",
///     &PathContext {
///         current_file_path: "notes/a.md",
///         file_name: "pic.png",
///         date: NaiveDate::from_ymd_opt(2024, 3, 5),
///     },
/// );
/// assert_eq!(key, "images/2024/03/05/pic.png");
/// ```
pub fn resolve(template: &str, ctx: &PathContext<'_>) -> String {
    let date = ctx.date.unwrap_or_else(|| Local::now().date_naive());

    let (dir, leaf) = match ctx.current_file_path.rsplit_once('/') {
        Some((dir, leaf)) => (dir, leaf),
        None => ("", ctx.current_file_path),
    };
    let folder = dir.rsplit('/').next().unwrap_or_default();

    let mut result = template
        .replace("{YYYY}", &format!("{:04}", date.year()))
        .replace("{MM}", &format!("{:02}", date.month()))
        .replace("{DD}", &format!("{:02}", date.day()))
        .replace("{PATH}", dir)
        .replace("{FILENAME}", strip_extension(leaf))
        .replace("{FOLDER}", folder);

    if !result.ends_with('/') {
        result.push('/');
    }
    result.push_str(ctx.file_name);

    let mut key = String::with_capacity(result.len());
    for c in result.chars() {
        if c == '/' && key.ends_with('/') {
            continue;
        }
        key.push(c);
    }
    match key.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => key,
    }
}

/// Drop the last `.ext` of a file name, `.ext` needs at least one character.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

/// Name a pasted file `image-{epoch ms}.{ext}`, keeping the original
/// extension or falling back to `png`.
pub fn unique_file_name(original_name: &str, now: DateTime) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|v| v.to_str())
        .filter(|v| !v.is_empty())
        .unwrap_or("png");
    format!("image-{}.{ext}", now.timestamp_millis())
}
