//! Platform-specific lookup of a child process's current working directory,
//! used by the status bar to show a working directory.
//!
//! Capability-injected: `Model` depends on a function-valued
//! `cwd_of(pid) -> Option<PathBuf>` field rather than calling platform code
//! directly, so tests can substitute a fake.

use std::path::PathBuf;

pub type CwdResolver = Box<dyn Fn(u32) -> Option<PathBuf> + Send + Sync>;

#[cfg(target_os = "linux")]
pub fn cwd_of(pid: u32) -> Option<PathBuf> {
    std::fs::read_link(format!("/proc/{pid}/cwd")).ok()
}

#[cfg(target_os = "macos")]
pub fn cwd_of(pid: u32) -> Option<PathBuf> {
    darwin::cwd_via_proc_pidinfo(pid)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn cwd_of(_pid: u32) -> Option<PathBuf> {
    None
}

pub fn default_resolver() -> CwdResolver {
    Box::new(cwd_of)
}

#[cfg(target_os = "macos")]
mod darwin {
    use std::path::PathBuf;

    // PROC_PIDVNODEPATHINFO per <sys/proc_info.h>; we only need the cwd
    // field of `proc_vnodepathinfo`, so the struct is kept minimal and
    // zero-initialized rather than binding the full libproc header.
    const PROC_PIDVNODEPATHINFO: libc::c_int = 9;
    const MAXPATHLEN: usize = 1024;

    #[repr(C)]
    struct VnodeInfoPath {
        vip_vi: [u8; 152],
        vip_path: [u8; MAXPATHLEN],
    }

    unsafe extern "C" {
        fn proc_pidinfo(
            pid: libc::c_int,
            flavor: libc::c_int,
            arg: u64,
            buffer: *mut libc::c_void,
            buffersize: libc::c_int,
        ) -> libc::c_int;
    }

    pub fn cwd_via_proc_pidinfo(pid: u32) -> Option<PathBuf> {
        let mut info: VnodeInfoPath = unsafe { std::mem::zeroed() };
        let size = std::mem::size_of::<VnodeInfoPath>() as libc::c_int;
        let written = unsafe {
            proc_pidinfo(
                pid as libc::c_int,
                PROC_PIDVNODEPATHINFO,
                0,
                &mut info as *mut _ as *mut libc::c_void,
                size,
            )
        };
        if written <= 0 {
            return None;
        }
        let nul = info.vip_path.iter().position(|&b| b == 0).unwrap_or(0);
        if nul == 0 {
            return None;
        }
        let path = std::str::from_utf8(&info.vip_path[..nul]).ok()?;
        Some(PathBuf::from(path))
    }
}
