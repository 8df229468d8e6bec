//! Status classes for rejected requests.

use std::fmt;

/// Every rejection falls into one of these. Feature crates pick the class,
/// the HTTP layer turns it into a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    /// Missing, malformed or expired credentials.
    Unauthorized,
    Forbidden,
    NotFound,
    /// Uniqueness collision or a parent that still has children.
    Conflict,
    InternalServerError,
}

impl ErrorKind {
    const fn parts(self) -> (u16, &'static str) {
        match self {
            ErrorKind::BadRequest => (400, "Bad Request"),
            ErrorKind::Unauthorized => (401, "Unauthorized"),
            ErrorKind::Forbidden => (403, "Forbidden"),
            ErrorKind::NotFound => (404, "Not Found"),
            ErrorKind::Conflict => (409, "Conflict"),
            ErrorKind::InternalServerError => (500, "Internal Server Error"),
        }
    }

    pub const fn status_code(self) -> u16 {
        self.parts().0
    }

    /// Reason phrase, used as the problem `title`.
    pub const fn title(self) -> &'static str {
        self.parts().1
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
