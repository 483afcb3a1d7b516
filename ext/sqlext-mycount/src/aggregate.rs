///
/// mycount aggregate implementation.
///
/// SQLite drives one invocation per aggregate expression per group:
/// zero or more xStep calls, then exactly one xFinal call. The accumulator
/// lives in the slot returned by sqlite3_aggregate_context(), which SQLite
/// zero-fills on first request and frees after xFinal.
///
/// Registered twice, for arity 0 and arity 1, with
/// SQLITE_UTF8 | SQLITE_DETERMINISTIC | SQLITE_INNOCUOUS.
///

use std::mem::size_of;
use std::os::raw::{c_char, c_int};
use std::ptr;

use rusqlite::{Connection, ffi};
use sqlext_core::{Extension, ExtensionError, ValueType, check_code};
use tracing::debug;

pub const FUNCTION_NAME: &str = "mycount";

pub const EXTENSION: Extension = Extension::new(FUNCTION_NAME, sqlite3_mycount_init);

const FLAGS: c_int = ffi::SQLITE_UTF8 | ffi::SQLITE_DETERMINISTIC | ffi::SQLITE_INNOCUOUS;

/// Running count for one aggregate invocation.
///
/// Transparent over `i64` so the zero-filled host slot reads as a zero count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct RowCount(i64);

impl RowCount {
    pub fn new() -> Self {
        Self(0)
    }

    /// Feed one row. `arg` is the type of the single argument, `None` when
    /// the function was called without one.
    pub fn step(&mut self, arg: Option<ValueType>) {
        if counts_row(arg) {
            self.0 += 1;
        }
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

pub fn counts_row(arg: Option<ValueType>) -> bool {
    !matches!(arg, Some(ValueType::Null))
}

/// Advance the accumulator behind `slot`. A null slot (failed allocation) is skipped.
///
/// # Safety
/// `slot` must be null or point to a live `RowCount`.
unsafe fn step_slot(slot: *mut RowCount, arg: Option<ValueType>) {
    if let Some(count) = unsafe { slot.as_mut() } {
        count.step(arg);
    }
}

/// # Safety
/// `slot` must be null or point to a live `RowCount`.
unsafe fn final_slot(slot: *const RowCount) -> i64 {
    unsafe { slot.as_ref() }.map_or(0, RowCount::get)
}

unsafe extern "C" fn mycount_step(
    ctx: *mut ffi::sqlite3_context,
    argc: c_int,
    argv: *mut *mut ffi::sqlite3_value,
) {
    let slot = unsafe { ffi::sqlite3_aggregate_context(ctx, size_of::<RowCount>() as c_int) } as *mut RowCount;
    let arg = if argc > 0 {
        Some(unsafe { ValueType::of(*argv) })
    } else {
        None
    };
    unsafe { step_slot(slot, arg) };
}

unsafe extern "C" fn mycount_final(ctx: *mut ffi::sqlite3_context) {
    // Size 0: look up without allocating, null when no row was stepped.
    let slot = unsafe { ffi::sqlite3_aggregate_context(ctx, 0) } as *const RowCount;
    let count = unsafe { final_slot(slot) };
    unsafe { ffi::sqlite3_result_int64(ctx, count) };
}

unsafe fn create_mycount(db: *mut ffi::sqlite3, n_arg: c_int) -> c_int {
    unsafe {
        ffi::sqlite3_create_function_v2(
            db,
            c"mycount".as_ptr(),
            n_arg,
            FLAGS,
            ptr::null_mut(),
            None,
            Some(mycount_step),
            Some(mycount_final),
            None,
        )
    }
}

/// Extension entry point. Returns the first non-OK registration code unchanged.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sqlite3_mycount_init(
    db: *mut ffi::sqlite3,
    _pz_err_msg: *mut *const c_char,
    _p_api: *const ffi::sqlite3_api_routines,
) -> c_int {
    for n_arg in [0, 1] {
        let rc = unsafe { create_mycount(db, n_arg) };
        if rc != ffi::SQLITE_OK {
            return rc;
        }
    }
    debug!(function = FUNCTION_NAME, "Registered aggregate");
    ffi::SQLITE_OK
}

/// Register `mycount` on one connection.
pub fn register(conn: &Connection) -> Result<(), ExtensionError> {
    let rc = unsafe { sqlite3_mycount_init(conn.handle(), ptr::null_mut(), ptr::null()) };
    check_code(FUNCTION_NAME, rc)
}
