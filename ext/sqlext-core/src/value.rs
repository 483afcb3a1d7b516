///
/// SQL value types as seen by raw function callbacks.
///
/// `sqlite3_value_type()` reports one of the five fundamental datatypes.
/// Callbacks decode that code once into `ValueType` and branch on the enum.
///

use std::os::raw::c_int;

use rusqlite::ffi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Real,
    Text,
    Blob,
    Null,
}

impl ValueType {
    /// Decode a `SQLITE_*` fundamental type code. Unrecognized codes are treated as NULL.
    pub fn from_raw(code: c_int) -> Self {
        match code {
            ffi::SQLITE_INTEGER => ValueType::Integer,
            ffi::SQLITE_FLOAT => ValueType::Real,
            ffi::SQLITE_TEXT => ValueType::Text,
            ffi::SQLITE_BLOB => ValueType::Blob,
            _ => ValueType::Null,
        }
    }

    /// Read the type of a raw argument value.
    ///
    /// # Safety
    /// `value` must be a valid `sqlite3_value` pointer handed to the current callback.
    pub unsafe fn of(value: *mut ffi::sqlite3_value) -> Self {
        Self::from_raw(unsafe { ffi::sqlite3_value_type(value) })
    }

    pub fn is_null(self) -> bool {
        self == ValueType::Null
    }
}
