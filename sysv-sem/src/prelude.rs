// SPDX-License-Identifier: MPL-2.0

#![expect(unused)]

pub(crate) use log::{debug, error, trace, warn};

pub(crate) use crate::{
    error::{Errno, Error, ErrorKind},
    flags::PermissionMode,
    Result,
};
pub(crate) use crate::return_errno_with_message;
