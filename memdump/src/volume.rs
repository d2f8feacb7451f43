use alloc::string::String;
use core::{
    mem::{self, ManuallyDrop},
    ptr,
};

use acquire::{DumpFile, Error, Result, Volume};
use physmap::uefi::raw::{
    BootServices, FileProtocol, Handle, LoadedImageProtocol, SimpleFileSystemProtocol, Status, FILE_MODE_CREATE,
    FILE_MODE_READ, FILE_MODE_WRITE, LOADED_IMAGE_PROTOCOL_GUID, SIMPLE_FILE_SYSTEM_PROTOCOL_GUID,
};

use crate::text::to_cstr16;

const VOLUME: &str = "boot volume";

#[inline]
fn check(status: Status, op: &'static str, file: &str) -> Result<()> {
    match status.is_error() {
        true => Err(Error::io(op, file, status.0)),
        false => Ok(()),
    }
}

/// `Delete` reports a file it could not remove with a warning, not an error. Creating over
/// it would keep the stale bytes past the new end, so anything but success is fatal.
#[inline]
fn check_deleted(status: Status, file: &str) -> Result<()> {
    match status.is_success() {
        true => Ok(()),
        false => Err(Error::io("replace", file, status.0)),
    }
}

/// Root directory of the volume this image was loaded from.
pub struct BootVolume {
    root: *mut FileProtocol,
}

impl BootVolume {
    /// # Safety
    /// `bs` must be the live boot services table and `image` this image's handle.
    pub unsafe fn open(bs: &BootServices, image: Handle) -> Result<Self> {
        let mut loaded = ptr::null_mut();
        check((bs.handle_protocol)(image, &LOADED_IMAGE_PROTOCOL_GUID, &mut loaded), "locate", VOLUME)?;
        let loaded = &*loaded.cast::<LoadedImageProtocol>();

        let mut fs = ptr::null_mut();
        check((bs.handle_protocol)(loaded.device_handle, &SIMPLE_FILE_SYSTEM_PROTOCOL_GUID, &mut fs), "locate", VOLUME)?;
        let fs = fs.cast::<SimpleFileSystemProtocol>();

        let mut root = ptr::null_mut();
        check(((*fs).open_volume)(fs, &mut root), "open", VOLUME)?;
        Ok(Self { root })
    }
}

impl Volume for BootVolume {
    type File = EfiFile;

    fn create(&mut self, name: &str) -> Result<EfiFile> {
        let wide = to_cstr16(name);
        unsafe {
            // drop whatever a previous run left under this name
            let mut old = ptr::null_mut::<FileProtocol>();
            let status = ((*self.root).open)(self.root, &mut old, wide.as_ptr(), FILE_MODE_READ | FILE_MODE_WRITE, 0);
            if status.is_success() {
                check_deleted(((*old).delete)(old), name)?;
            }

            let mut handle = ptr::null_mut();
            let mode = FILE_MODE_CREATE | FILE_MODE_READ | FILE_MODE_WRITE;
            check(((*self.root).open)(self.root, &mut handle, wide.as_ptr(), mode, 0), "create", name)?;
            Ok(EfiFile { handle, name: String::from(name) })
        }
    }
}

impl Drop for BootVolume {
    fn drop(&mut self) {
        unsafe { ((*self.root).close)(self.root) };
    }
}

/// An open file on the boot volume. Dropping it without `close` still closes the handle,
/// so an aborted run keeps whatever reached the disk.
pub struct EfiFile {
    handle: *mut FileProtocol,
    name: String,
}

impl DumpFile for EfiFile {
    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let mut size = buf.len();
            let status = unsafe { ((*self.handle).write)(self.handle, &mut size, buf.as_ptr()) };
            check(status, "write", &self.name)?;
            if size == 0 {
                return Err(Error::io("write", self.name.as_str(), Status::DEVICE_ERROR.0));
            }
            buf = &buf[size.min(buf.len())..];
        }
        Ok(())
    }

    fn close(self) -> Result<()> {
        let mut this = ManuallyDrop::new(self);
        let name = mem::take(&mut this.name);
        let (flushed, closed) = unsafe { (((*this.handle).flush)(this.handle), ((*this.handle).close)(this.handle)) };
        check(flushed, "flush", &name)?;
        check(closed, "close", &name)
    }
}

impl Drop for EfiFile {
    fn drop(&mut self) {
        log::warn!("{} left open, closing", self.name);
        unsafe {
            ((*self.handle).flush)(self.handle);
            ((*self.handle).close)(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_deleted() {
        assert!(check_deleted(Status::SUCCESS, "dump1.bin").is_ok());

        let err = check_deleted(Status::WARN_DELETE_FAILURE, "dump1.bin").unwrap_err();
        assert_eq!(err, Error::io("replace", "dump1.bin", Status::WARN_DELETE_FAILURE.0));
        assert_eq!(err.to_string(), "failed to replace dump1.bin: Delete Failure");

        let err = check_deleted(Status::DEVICE_ERROR, "dump2.bin").unwrap_err();
        assert!(matches!(err, Error::Io { op: "replace", .. }));
    }
}
