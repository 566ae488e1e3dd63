// SPDX-License-Identifier: MPL-2.0

use core::fmt;

macro_rules! define_errno {
    ($($name:ident => $desc:literal,)*) => {
        /// Error number.
        ///
        /// Only the codes produced by the semaphore syscalls get a variant of
        /// their own. Anything else is kept verbatim in [`Errno::Other`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Errno {
            $(
                #[doc = $desc]
                $name,
            )*
            /// An error number without a dedicated variant.
            Other(i32),
        }

        impl Errno {
            /// Converts a raw `errno` value.
            pub fn from_raw(raw: i32) -> Self {
                match raw {
                    $(libc::$name => Errno::$name,)*
                    other => Errno::Other(other),
                }
            }

            /// Returns the raw `errno` value of the running platform.
            pub fn as_raw(&self) -> i32 {
                match self {
                    $(Errno::$name => libc::$name,)*
                    Errno::Other(raw) => *raw,
                }
            }

            fn description(&self) -> &'static str {
                match self {
                    $(Errno::$name => $desc,)*
                    Errno::Other(_) => "Unknown error",
                }
            }
        }
    };
}

define_errno! {
    EPERM => "Operation not permitted",
    ENOENT => "No such file or directory",
    EINTR => "Interrupted system call",
    E2BIG => "Argument list too long",
    EAGAIN => "Try again",
    ENOMEM => "Out of memory",
    EACCES => "Permission denied",
    EFAULT => "Bad address",
    EEXIST => "File exists",
    EINVAL => "Invalid argument",
    EFBIG => "File too large",
    ENOSPC => "No space left on device",
    ERANGE => "Math result not representable",
    EIDRM => "Identifier removed",
    ENOSYS => "Invalid system call number",
}

impl Errno {
    /// Reads the calling thread's `errno`.
    pub fn last() -> Self {
        let raw = std::io::Error::last_os_error()
            .raw_os_error()
            .unwrap_or_default();
        Self::from_raw(raw)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Errno::Other(raw) => write!(f, "errno {}", raw),
            errno => write!(f, "{:?} ({})", errno, errno.description()),
        }
    }
}

/// The class of an [`Error`], independent of the platform's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No set exists for the key, or the set was removed.
    NotFound,
    /// An exclusive creation found an existing set.
    AlreadyExists,
    /// The permission bits of the set reject the caller.
    PermissionDenied,
    /// A counter index, count, value or flag is out of range.
    InvalidArgument,
    /// A no-wait operation could not proceed immediately.
    WouldBlock,
    /// A blocking wait was interrupted by a signal.
    Interrupted,
    /// The system ran out of semaphore sets or memory.
    SystemLimit,
    /// Any other failure.
    Other,
}

/// error used in this crate
#[derive(Debug, Clone, Copy)]
pub struct Error {
    errno: Errno,
    msg: Option<&'static str>,
}

impl Error {
    pub const fn new(errno: Errno) -> Self {
        Error { errno, msg: None }
    }

    pub const fn with_message(errno: Errno, msg: &'static str) -> Self {
        Error {
            errno,
            msg: Some(msg),
        }
    }

    /// Builds an error from the calling thread's `errno`.
    pub fn last_os_error() -> Self {
        Error::new(Errno::last())
    }

    pub const fn error(&self) -> Errno {
        self.errno
    }

    pub const fn message(&self) -> Option<&'static str> {
        self.msg
    }

    pub fn kind(&self) -> ErrorKind {
        match self.errno {
            Errno::ENOENT | Errno::EIDRM => ErrorKind::NotFound,
            Errno::EEXIST => ErrorKind::AlreadyExists,
            Errno::EACCES | Errno::EPERM => ErrorKind::PermissionDenied,
            Errno::EINVAL | Errno::EFBIG | Errno::E2BIG | Errno::ERANGE => {
                ErrorKind::InvalidArgument
            }
            Errno::EAGAIN => ErrorKind::WouldBlock,
            Errno::EINTR => ErrorKind::Interrupted,
            Errno::ENOSPC | Errno::ENOMEM => ErrorKind::SystemLimit,
            _ => ErrorKind::Other,
        }
    }
}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Error::new(errno)
    }
}

impl AsRef<Error> for Error {
    fn as_ref(&self) -> &Error {
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.msg {
            Some(msg) => write!(f, "{}: {}", self.errno, msg),
            None => write!(f, "{}", self.errno),
        }
    }
}

impl std::error::Error for Error {}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        let os_error = std::io::Error::from_raw_os_error(error.errno.as_raw());
        match error.msg {
            Some(msg) => std::io::Error::new(os_error.kind(), msg),
            None => os_error,
        }
    }
}

impl From<std::ffi::NulError> for Error {
    fn from(_: std::ffi::NulError) -> Self {
        Error::with_message(Errno::EINVAL, "path contains an interior nul byte")
    }
}

#[macro_export]
macro_rules! return_errno_with_message {
    ($errno: expr, $message: expr) => {
        return Err($crate::error::Error::with_message($errno, $message))
    };
}
