use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt;

/// A `Result` alias where `Err` case is `mongo_update::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The errors that may occur when building or executing an update request.
pub struct Error {
    inner: Box<Inner>,
}

pub(crate) type Source = Box<dyn StdError + Send + Sync>;

struct Inner {
    kind: Kind,
    source: Option<Source>,
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner { kind, source: None }),
        }
    }

    pub(crate) fn with<S: Into<Source>>(mut self, source: S) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    /// Returns the kind of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use mongo_update::{ErrorKind, UpdateRequest};
    ///
    /// let mut request = UpdateRequest::new(false);
    /// if let Err(e) = request.set("count", u64::MAX) {
    ///     match e.kind() {
    ///         ErrorKind::InvalidOperand => println!("we have an operand error..."),
    ///         _ => {},
    ///     }
    /// }
    /// ```
    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Creates a custom `Kind::InvalidDocument` error.
    ///
    /// This is useful when manually implementating the `Filter` and `Update` traits.
    pub fn invalid_document<E: Into<Source>>(error: E) -> Error {
        Error::new(Kind::InvalidDocument).with(error)
    }

    /// Creates a custom `Kind::InvalidOperand` error.
    pub fn invalid_operand<E: Into<Source>>(error: E) -> Error {
        Error::new(Kind::InvalidOperand).with(error)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = fmt.debug_struct("mongo_update::Error");
        builder.field("kind", &self.inner.kind);
        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match self.inner.kind {
            Kind::Builder => "builder error",
            Kind::InvalidDocument => "invalid document",
            Kind::InvalidOperand => "invalid operand",
            Kind::ModeConflict => "update mode conflict",
            Kind::Mongodb => "mongodb error",
            Kind::Runtime => "runtime error",
        };
        if let Some(ref source) = self.inner.source {
            write!(f, "{}: {}", desc, source)
        } else {
            f.write_str(desc)
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<crate::ext::bson::ser::Error> for Error {
    fn from(ser: crate::ext::bson::ser::Error) -> Self {
        Error::invalid_operand(ser)
    }
}

/// The `Kind` of `mongo_update::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// The client could not be configured.
    Builder,
    /// A predicate or typed update could not be rendered into a document.
    InvalidDocument,
    /// A value cannot be used as the operand of an update operator.
    InvalidOperand,
    /// Operators and a replacement document were mixed on a strict call.
    ModeConflict,
    /// The mongodb driver returned an error.
    Mongodb,
    /// The blocking runtime could not be reached.
    Runtime,
}

// Helpers
pub(crate) fn builder<E: Into<Source>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e)
}

pub(crate) fn mode_conflict<E: Into<Source>>(e: E) -> Error {
    Error::new(Kind::ModeConflict).with(e)
}

pub(crate) fn mongodb<E: Into<Source>>(e: E) -> Error {
    Error::new(Kind::Mongodb).with(e)
}

#[cfg(feature = "blocking")]
pub(crate) fn runtime<E: Into<Source>>(e: E) -> Error {
    Error::new(Kind::Runtime).with(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_source() {
        let e = Error::invalid_operand("`foo` is not numeric");
        assert_eq!(e.to_string(), "invalid operand: `foo` is not numeric");
        assert_eq!(*e.kind(), Kind::InvalidOperand);
        assert!(e.source().is_some());
    }

    #[test]
    fn display_without_source() {
        let e = Error::new(Kind::Runtime);
        assert_eq!(e.to_string(), "runtime error");
        assert!(e.source().is_none());
    }
}
