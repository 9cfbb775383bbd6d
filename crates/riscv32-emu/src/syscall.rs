//! Linux-style system-call passthrough.
//!
//! `ecall` dispatches on `a7`; arguments arrive in `a0..a2` and the return
//! value goes back in `a0`. Guest buffers are bounds-checked against the
//! memory image before any host I/O. Only `exit` stops the CPU; every
//! other call (including the unknown-number case) returns
//! [`StepStatus::Ok`] after setting `a0`.
//!
//! The host side uses raw fds because the guest ABI traffics in fd
//! numbers and raw `struct stat` bytes.

use std::ffi::CString;

use crate::cpu::{Cpu, StepStatus};
use crate::memory::Memory;

const SYS_OPENAT: u32 = 56;
const SYS_CLOSE: u32 = 57;
const SYS_READ: u32 = 63;
const SYS_WRITE: u32 = 64;
const SYS_FSTAT: u32 = 80;
const SYS_EXIT: u32 = 93;
const SYS_BRK: u32 = 214;

/// Longest guest path accepted by `openat`.
const PATH_MAX: usize = 255;

/// At most this many bytes of the host `struct stat` are copied to the
/// guest.
const STAT_COPY_MAX: usize = 64;

/// Byte range of a guest buffer, or `None` if it escapes the image.
fn guest_range(mem: &Memory, addr: u32, len: u32) -> Option<std::ops::Range<usize>> {
    let end = addr as u64 + len as u64;
    if end > mem.size() as u64 {
        return None;
    }
    Some(addr as usize..end as usize)
}

/// Read a NUL-terminated path out of guest memory.
fn guest_path(mem: &Memory, addr: u32) -> Option<CString> {
    let data = mem.data();
    let mut bytes = Vec::new();
    for i in 0..PATH_MAX {
        let idx = addr as usize + i;
        if idx >= data.len() {
            break;
        }
        if data[idx] == 0 {
            break;
        }
        bytes.push(data[idx]);
    }
    CString::new(bytes).ok()
}

pub(crate) fn handle_syscall(cpu: &mut Cpu, mem: &mut Memory) -> StepStatus {
    let number = cpu.x[17];
    let a0 = cpu.x[10];
    let a1 = cpu.x[11];
    let a2 = cpu.x[12];

    match number {
        SYS_EXIT => {
            cpu.running = false;
            return StepStatus::SyscallExit;
        }

        SYS_WRITE => {
            let result = match guest_range(mem, a1, a2) {
                Some(range) => {
                    let buf = &mem.data()[range];
                    unsafe {
                        libc::write(a0 as i32, buf.as_ptr() as *const libc::c_void, buf.len())
                    }
                }
                None => -1,
            };
            cpu.x[10] = result as u32;
        }

        SYS_READ => {
            let result = match guest_range(mem, a1, a2) {
                Some(range) => {
                    let buf = &mut mem.data_mut()[range];
                    unsafe { libc::read(a0 as i32, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) }
                }
                None => -1,
            };
            cpu.x[10] = result as u32;
        }

        SYS_OPENAT => {
            // The dirfd in a0 is ignored; flags and mode arrive folded in
            // a2.
            let result = match guest_path(mem, a1) {
                Some(path) => unsafe {
                    libc::open(path.as_ptr(), a2 as libc::c_int, a2 as libc::c_uint)
                },
                None => -1,
            };
            cpu.x[10] = result as u32;
        }

        SYS_CLOSE => {
            let result = unsafe { libc::close(a0 as i32) };
            cpu.x[10] = result as u32;
        }

        SYS_BRK => {
            cpu.x[10] = (-libc::ENOMEM) as u32;
        }

        SYS_FSTAT => {
            let mut st: libc::stat = unsafe { std::mem::zeroed() };
            let result = unsafe { libc::fstat(a0 as i32, &mut st) };
            if result == 0 {
                let copy_len = std::mem::size_of::<libc::stat>().min(STAT_COPY_MAX);
                if let Some(range) = guest_range(mem, a1, copy_len as u32) {
                    let src = unsafe {
                        std::slice::from_raw_parts(&st as *const libc::stat as *const u8, copy_len)
                    };
                    mem.data_mut()[range].copy_from_slice(src);
                }
            }
            cpu.x[10] = result as u32;
        }

        _ => {
            cpu.x[10] = (-libc::ENOSYS) as u32;
        }
    }

    StepStatus::Ok
}
