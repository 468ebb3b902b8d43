//! Registers the `sqlite-vec` extension with every SQLite connection opened
//! afterwards in this process, so the local vector backend can rank with
//! `vec_distance_cosine`.

use rusqlite::Connection;
use std::sync::OnceLock;

const AUTO_ENABLE_ENV: &str = "SHORTLIST_SQLITE_VEC";

static REGISTRATION: OnceLock<Result<(), String>> = OnceLock::new();

/// Register the extension once per process.
///
/// Setting `SHORTLIST_SQLITE_VEC` to `0`, `false` or `off` opts out, in which
/// case callers rank vectors without the extension.
pub fn register_auto_extension() -> Result<(), String> {
    if matches!(
        std::env::var(AUTO_ENABLE_ENV).ok().as_deref(),
        Some("0" | "false" | "off")
    ) {
        return Err(format!("sqlite-vec disabled by {AUTO_ENABLE_ENV}"));
    }

    REGISTRATION.get_or_init(register_once).clone()
}

/// The loaded extension version on `conn`, if any.
#[must_use]
pub fn vec_version(conn: &Connection) -> Option<String> {
    conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
        .ok()
}

fn register_once() -> Result<(), String> {
    #[allow(clippy::transmute_ptr_to_ptr)]
    let entrypoint: unsafe extern "C" fn(
        *mut rusqlite::ffi::sqlite3,
        *mut *const std::os::raw::c_char,
        *const rusqlite::ffi::sqlite3_api_routines,
    ) -> std::os::raw::c_int =
        unsafe { std::mem::transmute(sqlite_vec::sqlite3_vec_init as *const ()) };

    let rc = unsafe { rusqlite::ffi::sqlite3_auto_extension(Some(entrypoint)) };
    if rc == rusqlite::ffi::SQLITE_OK {
        Ok(())
    } else {
        Err(format!("sqlite3_auto_extension failed with rc={rc}"))
    }
}
