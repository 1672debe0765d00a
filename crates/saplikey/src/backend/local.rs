//! Local file system access with passwd lookups.

use crate::backend::FileSystem;
use crate::error::{Error, Result};
use crate::types::UserIds;
use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Buffer size for `getpw*_r` string data.
const PASSWD_BUF_LEN: usize = 4096;

/// The host's own file system.
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    fn owner(&self, path: &Path) -> Result<String> {
        let uid = std::fs::metadata(path).map_err(|e| Error::io(path, e))?.uid();
        user_name(uid)?.ok_or_else(|| Error::Other(format!("no passwd entry for uid {uid}")))
    }

    fn chown(&self, path: &Path, ids: UserIds) -> Result<()> {
        std::os::unix::fs::chown(path, Some(ids.uid), Some(ids.gid)).map_err(|e| Error::io(path, e))
    }

    fn lookup_user(&self, name: &str) -> Result<UserIds> {
        user_ids(name)?.ok_or_else(|| Error::Other(format!("no such user: {name}")))
    }
}

/// Resolve a uid to a user name.
fn user_name(uid: u32) -> Result<Option<String>> {
    let mut pwd: MaybeUninit<libc::passwd> = MaybeUninit::uninit();
    let mut buf = vec![0 as libc::c_char; PASSWD_BUF_LEN];
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    // SAFETY: all pointers are valid for the duration of the call and the
    // buffer length matches the allocation
    let rc = unsafe {
        libc::getpwuid_r(
            uid as libc::uid_t,
            pwd.as_mut_ptr(),
            buf.as_mut_ptr(),
            buf.len(),
            &mut result,
        )
    };
    if rc != 0 {
        return Err(Error::Other(format!(
            "getpwuid_r({uid}) failed: {}",
            std::io::Error::from_raw_os_error(rc)
        )));
    }
    if result.is_null() {
        return Ok(None);
    }

    // SAFETY: result is non-null, so pwd was initialized and pw_name points
    // into buf
    let name = unsafe { CStr::from_ptr((*result).pw_name) };
    Ok(Some(name.to_string_lossy().into_owned()))
}

/// Resolve a user name to uid and primary gid.
fn user_ids(name: &str) -> Result<Option<UserIds>> {
    let c_name = CString::new(name).map_err(|_| Error::Other(format!("invalid user name: {name}")))?;
    let mut pwd: MaybeUninit<libc::passwd> = MaybeUninit::uninit();
    let mut buf = vec![0 as libc::c_char; PASSWD_BUF_LEN];
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    // SAFETY: see user_name
    let rc = unsafe {
        libc::getpwnam_r(
            c_name.as_ptr(),
            pwd.as_mut_ptr(),
            buf.as_mut_ptr(),
            buf.len(),
            &mut result,
        )
    };
    if rc != 0 {
        return Err(Error::Other(format!(
            "getpwnam_r({name}) failed: {}",
            std::io::Error::from_raw_os_error(rc)
        )));
    }
    if result.is_null() {
        return Ok(None);
    }

    // SAFETY: result is non-null, so pwd was initialized
    let pwd = unsafe { &*result };
    Ok(Some(UserIds {
        uid: pwd.pw_uid,
        gid: pwd.pw_gid,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_to_string() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "SAPSYSTEM=S4H\n").unwrap();
        let content = LocalFileSystem.read_to_string(file.path()).unwrap();
        assert_eq!(content, "SAPSYSTEM=S4H\n");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = LocalFileSystem
            .read_to_string(Path::new("/nonexistent/license.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_root_lookup() {
        let ids = LocalFileSystem.lookup_user("root").unwrap();
        assert_eq!(ids.uid, 0);
        assert_eq!(user_name(0).unwrap().as_deref(), Some("root"));
    }

    #[test]
    fn test_unknown_user() {
        assert!(user_ids("no-such-user-likey-test").unwrap().is_none());
        assert!(LocalFileSystem.lookup_user("no-such-user-likey-test").is_err());
    }

    #[test]
    fn test_owner_of_own_file() {
        let file = NamedTempFile::new().unwrap();
        let uid = std::fs::metadata(file.path()).unwrap().uid();
        let expected = user_name(uid).unwrap();
        if let Some(expected) = expected {
            assert_eq!(LocalFileSystem.owner(file.path()).unwrap(), expected);
        }
    }
}
