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

//! Error types for filter construction and wire decoding

use std::fmt;

/// ErrorKind is all kinds of Error of blossom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The entries or error rate given for a filter is out of range.
    InvalidParameters,
    /// The bit array could not be allocated.
    AllocationFailure,
    /// A seed buffer or payload does not match the derived byte length.
    LengthMismatch,
    /// The serialized buffer is shorter than a header plus one payload byte.
    TruncatedInput,
    /// The payload checksum does not match the one stored in the header.
    ChecksumMismatch,
    /// The seed source could not be read as bytes.
    UnsupportedBuffer,
}

impl ErrorKind {
    /// Convert this error kind instance into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::InvalidParameters => "InvalidParameters",
            ErrorKind::AllocationFailure => "AllocationFailure",
            ErrorKind::LengthMismatch => "LengthMismatch",
            ErrorKind::TruncatedInput => "TruncatedInput",
            ErrorKind::ChecksumMismatch => "ChecksumMismatch",
            ErrorKind::UnsupportedBuffer => "UnsupportedBuffer",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by all blossom functions.
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::default(),
            source: None,
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Set source for error.
    ///
    /// # Panics
    ///
    /// Panics if the source has been set.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::error::Error as _;
    /// use blossom::error::{Error, ErrorKind};
    ///
    /// let mut error = Error::new(ErrorKind::UnsupportedBuffer, "failed to read seed data");
    /// assert!(error.source().is_none());
    /// error = error.set_source(std::io::Error::new(std::io::ErrorKind::Other, "IO error"));
    /// assert!(error.source().is_some());
    /// ```
    pub fn set_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        assert!(self.source.is_none(), "the source error has been set");
        self.source = Some(src.into());
        self
    }

    /// Return error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Return the value recorded under `key`, if any.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

// Shorthands used across the crate.
impl Error {
    pub(crate) fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameters, message)
    }

    pub(crate) fn allocation_failure(num_bytes: u64) -> Self {
        Self::new(
            ErrorKind::AllocationFailure,
            "failed to allocate the bit array",
        )
        .with_context("num_bytes", num_bytes)
    }

    pub(crate) fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::LengthMismatch, "invalid data length")
            .with_context("expected", expected)
            .with_context("actual", actual)
    }

    pub(crate) fn truncated_input(min_len: usize, actual: usize) -> Self {
        Self::new(ErrorKind::TruncatedInput, "incomplete payload")
            .with_context("min_len", min_len)
            .with_context("actual", actual)
    }

    pub(crate) fn checksum_mismatch(expected: u16, actual: u16) -> Self {
        Self::new(ErrorKind::ChecksumMismatch, "checksum mismatch")
            .with_context("expected", format!("{expected:#06x}"))
            .with_context("actual", format!("{actual:#06x}"))
    }

    pub(crate) fn unsupported_buffer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedBuffer, message)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("source", &self.source);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "Source:")?;
            writeln!(f, "   {source:#}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| v.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context_and_message() {
        let err = Error::length_mismatch(1199, 12);
        assert_eq!(
            err.to_string(),
            "LengthMismatch, context: { expected: 1199, actual: 12 } => invalid data length"
        );
        assert_eq!(err.context_value("actual"), Some("12"));
        assert_eq!(err.context_value("missing"), None);
    }

    #[test]
    fn test_checksum_mismatch_formats_hex() {
        let err = Error::checksum_mismatch(0xbeef, 0x0001);
        assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
        assert_eq!(err.context_value("expected"), Some("0xbeef"));
        assert_eq!(err.context_value("actual"), Some("0x0001"));
    }

    #[test]
    fn test_debug_lists_source() {
        let err = Error::unsupported_buffer("could not read seed data")
            .set_source(std::io::Error::other("device unplugged"));
        let debug = format!("{err:?}");
        assert!(debug.starts_with("UnsupportedBuffer => could not read seed data"));
        assert!(debug.contains("device unplugged"));
    }

    #[test]
    #[should_panic(expected = "the source error has been set")]
    fn test_set_source_twice_panics() {
        let _ = Error::unsupported_buffer("twice")
            .set_source(std::io::Error::other("first"))
            .set_source(std::io::Error::other("second"));
    }
}
