//! Output filename generation.
//!
//! A filename format is expanded with these tokens:
//!
//! | Token  | Expands to                 |
//! |--------|----------------------------|
//! | `%SRC` | name of the tapped source  |
//! | `%CCYY`| four-digit year            |
//! | `%YY`  | two-digit year             |
//! | `%MM`  | month, `01`-`12`           |
//! | `%DD`  | day of month               |
//! | `%hh`  | hour, `00`-`23`            |
//! | `%mm`  | minute                     |
//! | `%ss`  | second                     |
//! | `%%`   | a literal `%`              |
//!
//! Unknown `%` sequences are kept as-is.

use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime, Timelike};

use crate::models::error::WriterError;

/// Characters that are replaced with `_` in the generated part of a path.
pub const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '!', '&', '"', '\'', '<', '>', '|'];

const TOKENS: [(&str, &str); 9] = [
    ("SRC", ""),
    ("CCYY", "%Y"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("hh", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("%", "%%"),
];

/// Consecutive seconds tried before falling back to a numbered suffix.
const SECOND_STEPS: i64 = 60;

/// Derives collision-free output paths for one source.
#[derive(Debug, Clone, Copy)]
pub struct FilenameGenerator<'a> {
    folder: &'a Path,
    format: &'a str,
    source_name: &'a str,
    extension: &'a str,
}

impl<'a> FilenameGenerator<'a> {
    pub fn new(folder: &'a Path, format: &'a str, source_name: &'a str, extension: &'a str) -> Self {
        Self {
            folder,
            format,
            source_name,
            extension,
        }
    }

    /// Generate a path stamped with the current local time.
    pub fn generate(&self) -> Result<PathBuf, WriterError> {
        self.generate_at(Local::now().naive_local())
    }

    /// Generate a path stamped with `time`.
    ///
    /// If the candidate already exists and the expanded name changes from one
    /// second to the next, the timestamp is advanced one second at a time for
    /// up to [`SECOND_STEPS`] tries. Otherwise, or when those are all taken,
    /// the name at `time` gets a ` (n)` suffix.
    pub fn generate_at(&self, time: NaiveDateTime) -> Result<PathBuf, WriterError> {
        if self.folder.as_os_str().is_empty() {
            return Err(WriterError::ConfigurationFailed("output folder is not set".into()));
        }

        let steps = if self.varies_per_second(time) { SECOND_STEPS } else { 1 };
        for step in 0..steps {
            let path = self.candidate(&self.expand(time + Duration::seconds(step)));
            if !path.exists() {
                return Ok(path);
            }
            log::debug!("{} exists, trying the next name", path.display());
        }

        let stem = self.expand(time);
        let mut n = 2u32;
        loop {
            let path = self.candidate(&format!("{} ({})", stem, n));
            if !path.exists() {
                return Ok(path);
            }
            log::debug!("{} exists, trying the next name", path.display());
            n += 1;
        }
    }

    /// Whether the expansion differs between two adjacent seconds. Decided
    /// from the expansion itself, so an escaped `%%ss` does not count.
    fn varies_per_second(&self, time: NaiveDateTime) -> bool {
        let minute = time - Duration::seconds(i64::from(time.second()));
        self.expand(minute) != self.expand(minute + Duration::seconds(1))
    }

    fn candidate(&self, stem: &str) -> PathBuf {
        self.folder.join(sanitize(&format!("{}.{}", stem, self.extension)))
    }

    fn expand(&self, time: NaiveDateTime) -> String {
        let mut out = String::with_capacity(self.format.len() + self.source_name.len() + 16);
        let mut rest = self.format;

        while let Some(pos) = rest.find('%') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];
            match TOKENS.iter().find(|(token, _)| tail.starts_with(*token)) {
                Some((token, pattern)) => {
                    if *token == "SRC" {
                        out.push_str(self.source_name);
                    } else {
                        out.push_str(&time.format(pattern).to_string());
                    }
                    rest = &tail[token.len()..];
                }
                None => {
                    out.push('%');
                    rest = tail;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Replace every forbidden character with `_`.
pub fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
