// file is called peeker poker
// because it's the lingo[1] that ptrace
// uses to refer to reading/writing
// from/to a tracee's memory (only the peeking half is left)
//
// [1]: https://en.wikipedia.org/wiki/PEEK_and_POKE
//
use std::io::IoSliceMut;

use log::trace;
use nix::{
    sys::uio::{process_vm_readv, RemoteIoVec},
    unistd::Pid,
};

use crate::{
    errors::DecodeError,
    introspection::{builtin_type, AddressSpace, Introspector, TypeInfo},
};

/// A live process under ptrace, read with `process_vm_readv`.
///
/// Only the tracee's own address space is reachable; the kernel structures
/// behind it need an engine that sees physical memory.
#[derive(Clone, Copy, Debug)]
pub struct Tracee {
    pub pid: Pid,
}

impl Tracee {
    pub fn new(pid: Pid) -> Self {
        Tracee { pid }
    }
}

impl Introspector for Tracee {
    fn lookup_type(&self, name: &str) -> Result<TypeInfo, DecodeError> {
        builtin_type(name).ok_or_else(|| DecodeError::TypeCastFailure(name.to_owned()))
    }

    fn read(&self, space: AddressSpace, address: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
        if space == AddressSpace::Kernel {
            return Err(DecodeError::dereference(
                address,
                "kernel memory is not visible from a traced process",
            ));
        }
        if buf.is_empty() {
            return Ok(());
        }
        let len = buf.len();
        let base = usize::try_from(address)
            .map_err(|_| DecodeError::dereference(address, "address out of range"))?;
        let remote_iov = RemoteIoVec { base, len };
        // partial reads stop at the first unmapped page
        let read = process_vm_readv(self.pid, &mut [IoSliceMut::new(buf)], &[remote_iov])
            .map_err(|errno| DecodeError::dereference(address, errno.desc()))?;
        trace!("read {read} of {len} bytes at 0x{address:x} in {}", self.pid);
        if read < len {
            return Err(DecodeError::dereference(
                address.wrapping_add(read as u64),
                format!("short read ({read} of {len} bytes)"),
            ));
        }
        Ok(())
    }

    fn symbol_address(&self, name: &str) -> Result<u64, DecodeError> {
        Err(DecodeError::SymbolNotFound(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressSpaceRoot;

    #[test]
    fn reads_our_own_memory() {
        let tracee = Tracee::new(nix::unistd::getpid());
        let data = *b"peek";
        let space = AddressSpace::User(AddressSpaceRoot(0));
        let mut buf = [0u8; 4];
        tracee
            .read(space, data.as_ptr() as u64, &mut buf)
            .unwrap();
        assert_eq!(&buf, b"peek");
        let text = b"poke\0".to_vec();
        assert_eq!(
            tracee.read_c_string(space, text.as_ptr() as u64, 16).unwrap(),
            b"poke"
        );
    }

    #[test]
    fn kernel_and_unmapped_reads_fail() {
        let tracee = Tracee::new(nix::unistd::getpid());
        let mut buf = [0u8; 8];
        assert!(tracee
            .read(AddressSpace::Kernel, 0xffff_ffff_8100_0000, &mut buf)
            .unwrap_err()
            .is_dereference());
        assert!(tracee
            .read(AddressSpace::User(AddressSpaceRoot(0)), 8, &mut buf)
            .unwrap_err()
            .is_dereference());
        assert!(tracee
            .read(AddressSpace::User(AddressSpaceRoot(0)), u64::MAX - 3, &mut buf)
            .unwrap_err()
            .is_dereference());
        assert!(tracee.symbol_address("socket_file_ops").is_err());
    }
}
