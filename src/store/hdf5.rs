//! HDF5 backend (cargo feature `hdf5`).
//!
//! Traversal walks links in name order. A dataset is copied with `H5Ocopy`
//! and a link-creation list that creates intermediate groups, so attributes,
//! type, shape and payload travel unchanged and group shells appear only for
//! kept paths.
//!
//! A failed copy is classified from the library's error stack: I/O and
//! file-level errors abort the file, anything else is a fault of that one
//! object.

use std::ffi::{CStr, CString, c_uint, c_void};
use std::path::{Path, PathBuf};

use hdf5::plist::LinkCreate;
use hdf5::{File, Group, LocationType};
use hdf5_sys::h5e::{
    H5E_CLOSEERROR, H5E_DEFAULT, H5E_FILE, H5E_IO, H5E_READERROR, H5E_SEEKERROR, H5E_WRITEERROR,
    H5E_direction_t, H5E_error2_t, H5Ewalk2,
};
use hdf5_sys::h5i::hid_t;
use hdf5_sys::h5o::H5Ocopy;
use hdf5_sys::h5p::H5P_DEFAULT;

use super::{Container, Node, StoreError};

pub struct Hdf5File {
    file: File,
    path: PathBuf,
}

impl Hdf5File {
    fn wrap(&self, source: hdf5::Error) -> StoreError {
        StoreError::Hdf5 {
            path: self.path.clone(),
            source,
        }
    }

    fn walk(
        &self,
        group: &Group,
        prefix: &str,
        visitor: &mut dyn FnMut(Node),
    ) -> Result<(), StoreError> {
        let mut names = group.member_names().map_err(|e| self.wrap(e))?;
        names.sort();
        for name in names {
            let path = format!("{prefix}/{name}");
            match group.loc_type_by_name(&name).map_err(|e| self.wrap(e))? {
                LocationType::Group => {
                    visitor(Node::Group { path: path.clone() });
                    let child = group.group(&name).map_err(|e| self.wrap(e))?;
                    self.walk(&child, &path, visitor)?;
                }
                LocationType::Dataset => {
                    let shape = group.dataset(&name).map_err(|e| self.wrap(e))?.shape();
                    visitor(Node::Dataset { path, shape });
                }
                // committed datatypes carry no data
                _ => {}
            }
        }
        Ok(())
    }
}

impl Container for Hdf5File {
    fn open(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::Hdf5 {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn create(path: &Path) -> Result<Self, StoreError> {
        let file = File::create(path).map_err(|source| StoreError::Hdf5 {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn visit(&self, visitor: &mut dyn FnMut(Node)) -> Result<(), StoreError> {
        self.walk(&self.file, "", visitor)
    }

    fn copy_dataset(&self, path: &str, dest: &mut Self) -> Result<(), StoreError> {
        let name = CString::new(path).map_err(|_| StoreError::Unsupported {
            path: path.to_string(),
            reason: "path contains a NUL byte".into(),
        })?;
        let lcpl = LinkCreate::build()
            .create_intermediate_group(true)
            .finish()
            .map_err(|e| dest.wrap(e))?;
        let (status, stack) = hdf5::sync::sync(|| {
            let status = unsafe {
                H5Ocopy(
                    self.file.id(),
                    name.as_ptr(),
                    dest.file.id(),
                    name.as_ptr(),
                    H5P_DEFAULT,
                    lcpl.id(),
                )
            };
            let stack = if status < 0 { current_stack() } else { StackSummary::default() };
            (status, stack)
        });
        if status >= 0 {
            return Ok(());
        }
        let reason = if stack.messages.is_empty() {
            format!("H5Ocopy returned {status}")
        } else {
            stack.messages.join("; ")
        };
        if stack.file_level {
            return Err(StoreError::Backend {
                path: dest.path.clone(),
                node: path.to_string(),
                reason,
            });
        }
        Err(StoreError::CopyRejected {
            path: path.to_string(),
            reason,
        })
    }

    fn close(self) -> Result<(), StoreError> {
        let path = self.path;
        self.file
            .close()
            .map_err(|source| StoreError::Hdf5 { path, source })
    }
}

/// What the thread's error stack says about the last failed call.
#[derive(Debug, Default)]
struct StackSummary {
    file_level: bool,
    messages: Vec<String>,
}

/// Major or minor classes that mean the file, not one object, is failing.
fn is_file_level(major: hid_t, minor: hid_t) -> bool {
    [*H5E_IO, *H5E_FILE].contains(&major)
        || [*H5E_READERROR, *H5E_WRITEERROR, *H5E_SEEKERROR, *H5E_CLOSEERROR].contains(&minor)
}

unsafe extern "C" fn collect_frame(
    _n: c_uint,
    err: *const H5E_error2_t,
    data: *mut c_void,
) -> hdf5_sys::h5::herr_t {
    let summary = unsafe { &mut *(data as *mut StackSummary) };
    let Some(frame) = (unsafe { err.as_ref() }) else {
        return 0;
    };
    if is_file_level(frame.maj_num, frame.min_num) {
        summary.file_level = true;
    }
    if !frame.desc.is_null() {
        let desc = unsafe { CStr::from_ptr(frame.desc) };
        summary.messages.push(desc.to_string_lossy().into_owned());
    }
    0
}

/// Walk the calling thread's default error stack. Call under
/// `hdf5::sync::sync`, right after the failing call.
fn current_stack() -> StackSummary {
    let mut summary = StackSummary::default();
    unsafe {
        H5Ewalk2(
            H5E_DEFAULT,
            H5E_direction_t::H5E_WALK_DOWNWARD,
            Some(collect_frame),
            (&mut summary as *mut StackSummary).cast(),
        );
    }
    summary
}
