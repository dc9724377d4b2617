//! File descriptor to file object resolution.
//!
//! The kernel walk goes task -> files_struct -> fdtable -> fd array -> struct
//! file and then either into the socket hanging off `private_data` or into
//! the dentry's inline name. Every link can be null or unreadable on a live
//! target, so each step fails with its own `ResolutionFailure`.

use log::debug;
use nix::unistd::Pid;
use procfs::process::{FDInfo, FDTarget};

use crate::{
    errors::DecodeError,
    introspection::{AddressSpace, Introspector},
    kernel_layout::KernelLayout,
    types::FileObjectView,
};

/// Resolves `fd` of the task at `task` by walking kernel memory.
pub fn resolve_in_kernel<I: Introspector + ?Sized>(
    engine: &I,
    layout: &KernelLayout,
    task: u64,
    fd: i32,
) -> Result<FileObjectView, DecodeError> {
    let kernel = AddressSpace::Kernel;
    if fd < 0 {
        return Err(DecodeError::resolution(format!("invalid descriptor {fd}")));
    }
    let files = engine.read_pointer(kernel, task.wrapping_add(layout.task_files))?;
    debug!("task 0x{task:x} -> files_struct 0x{files:x}");
    if files == 0 {
        return Err(DecodeError::resolution("task has no open-file table"));
    }
    let fdt = engine.read_pointer(kernel, files.wrapping_add(layout.files_fdt))?;
    if fdt == 0 {
        return Err(DecodeError::resolution("open-file table has no fdtable"));
    }
    let max_fds = engine.read_unsigned(kernel, fdt.wrapping_add(layout.fdtable_max_fds), 4)?;
    if fd as u64 >= max_fds {
        return Err(DecodeError::resolution(format!(
            "descriptor {fd} is past max_fds {max_fds}"
        )));
    }
    let fd_array = engine.read_pointer(kernel, fdt.wrapping_add(layout.fdtable_fd))?;
    if fd_array == 0 {
        return Err(DecodeError::resolution("fdtable has no descriptor array"));
    }
    let slot = fd_array.wrapping_add(fd as u64 * layout.pointer_size);
    let file = engine.read_pointer(kernel, slot)?;
    debug!("fd {fd} -> slot 0x{slot:x} -> file 0x{file:x}");
    if file == 0 {
        return Err(DecodeError::resolution(format!("descriptor {fd} is not open")));
    }

    let f_op = engine.read_pointer(kernel, file.wrapping_add(layout.file_f_op))?;
    let socket_ops = match engine.symbol_address(layout.socket_ops_symbol) {
        Ok(address) => Some(address),
        Err(error) => {
            debug!("sockets cannot be recognized: {error}");
            None
        }
    };
    if socket_ops.is_some_and(|socket_ops| socket_ops == f_op) {
        let socket = engine.read_pointer(kernel, file.wrapping_add(layout.file_private_data))?;
        if socket == 0 {
            return Err(DecodeError::resolution("socket file without a socket"));
        }
        let socket_type = engine.read_unsigned(kernel, socket.wrapping_add(layout.socket_type), 2)?;
        let socket_flags =
            engine.read_unsigned(kernel, socket.wrapping_add(layout.socket_flags), layout.pointer_size as usize)?;
        debug!("fd {fd} is socket 0x{socket:x}");
        return Ok(FileObjectView::socket(fd, Some(socket_type), Some(socket_flags)));
    }

    let dentry = engine.read_pointer(kernel, file.wrapping_add(layout.file_dentry))?;
    if dentry == 0 {
        return Ok(FileObjectView::regular_file(fd, None));
    }
    let name = engine.read_c_string(kernel, dentry.wrapping_add(layout.dentry_iname), layout.dentry_iname_len)?;
    Ok(FileObjectView::regular_file(
        fd,
        Some(String::from_utf8_lossy(&name).into_owned()),
    ))
}

/// Resolves `fd` of a live process through `/proc/<pid>/fd`.
pub fn resolve_in_procfs(pid: Pid, fd: i32) -> Result<FileObjectView, DecodeError> {
    let info = FDInfo::from_raw_fd(pid.as_raw(), fd)?;
    let view = match info.target {
        FDTarget::Path(path) => {
            FileObjectView::regular_file(fd, Some(path.to_string_lossy().into_owned()))
        }
        FDTarget::Socket(inode) => FileObjectView::socket(fd, socket_type_by_inode(inode), None),
        FDTarget::Net(inode) => FileObjectView::unknown(fd, format!("net:[{inode}]")),
        FDTarget::Pipe(inode) => FileObjectView::unknown(fd, format!("pipe:[{inode}]")),
        FDTarget::AnonInode(kind) => FileObjectView::unknown(fd, format!("anon_inode:{kind}")),
        FDTarget::MemFD(name) => FileObjectView::unknown(fd, format!("memfd:{name}")),
        FDTarget::Other(first, second) => {
            FileObjectView::unknown(fd, format!("{first}:[{second}]"))
        }
    };
    Ok(view)
}

// procfs only tells which table the inode sits in
fn socket_type_by_inode(inode: u64) -> Option<u64> {
    let stream = nix::libc::SOCK_STREAM as u64;
    let datagram = nix::libc::SOCK_DGRAM as u64;
    let in_tcp = procfs::net::tcp()
        .into_iter()
        .chain(procfs::net::tcp6())
        .flatten()
        .any(|entry| entry.inode == inode);
    if in_tcp {
        return Some(stream);
    }
    let in_udp = procfs::net::udp()
        .into_iter()
        .chain(procfs::net::udp6())
        .flatten()
        .any(|entry| entry.inode == inode);
    if in_udp {
        return Some(datagram);
    }
    match procfs::net::unix() {
        Ok(entries) => entries
            .into_iter()
            .find(|entry| entry.inode == inode)
            .map(|entry| entry.socket_type as u64),
        Err(error) => {
            debug!("/proc/net/unix unreadable: {error}");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{flags::kernel::SOCK_NOSPACE, test_image::MemoryImage, types::FileKind};

    pub const TASK: u64 = 0xffff_8800_0000_1000;
    pub const FILES: u64 = 0xffff_8800_0000_2000;
    pub const FDT: u64 = 0xffff_8800_0000_3000;
    pub const FD_ARRAY: u64 = 0xffff_8800_0000_4000;
    pub const SOCKET_OPS: u64 = 0xffff_ffff_8160_0000;
    pub const FILE_OPS: u64 = 0xffff_ffff_8170_0000;

    /// A task whose descriptor table has room for 16 entries, all closed.
    pub fn task_with_fd_table(image: &mut MemoryImage) {
        let layout = KernelLayout::default();
        image.add_symbol(layout.socket_ops_symbol, SOCKET_OPS);
        image.kernel_word(TASK + layout.task_files, FILES);
        image.kernel_word(FILES + layout.files_fdt, FDT);
        image.map_kernel(FDT + layout.fdtable_max_fds, &16u32.to_le_bytes());
        image.kernel_word(FDT + layout.fdtable_fd, FD_ARRAY);
        for fd in 0..16 {
            image.kernel_word(FD_ARRAY + fd * 8, 0);
        }
    }

    pub fn open_regular_file(image: &mut MemoryImage, fd: u64, file: u64, name: Option<&str>) {
        let layout = KernelLayout::default();
        image.kernel_word(FD_ARRAY + fd * 8, file);
        image.kernel_word(file + layout.file_f_op, FILE_OPS);
        match name {
            Some(name) => {
                let dentry = file + 0x1000;
                image.kernel_word(file + layout.file_dentry, dentry);
                let mut inline = name.as_bytes().to_vec();
                inline.resize(layout.dentry_iname_len, 0);
                image.map_kernel(dentry + layout.dentry_iname, &inline);
            }
            None => image.kernel_word(file + layout.file_dentry, 0),
        }
    }

    pub fn open_socket(image: &mut MemoryImage, fd: u64, file: u64, socket_type: u16, flags: u64) {
        let layout = KernelLayout::default();
        let socket = file + 0x1000;
        image.kernel_word(FD_ARRAY + fd * 8, file);
        image.kernel_word(file + layout.file_f_op, SOCKET_OPS);
        image.kernel_word(file + layout.file_private_data, socket);
        image.map_kernel(socket + layout.socket_type, &socket_type.to_le_bytes());
        image.kernel_word(socket + layout.socket_flags, flags);
    }

    #[test]
    fn regular_file_resolves_to_its_inline_name() {
        let mut image = MemoryImage::new();
        task_with_fd_table(&mut image);
        open_regular_file(&mut image, 3, 0xffff_8800_1000_0000, Some("passwd"));
        let view = resolve_in_kernel(&image, &KernelLayout::default(), TASK, 3).unwrap();
        assert_eq!(view.kind, FileKind::RegularFile);
        assert_eq!(view.path.as_deref(), Some("passwd"));
        assert_eq!(view.socket_type, None);
        assert_eq!(view.to_string(), "\"passwd\"");
    }

    #[test]
    fn null_dentry_means_no_filename() {
        let mut image = MemoryImage::new();
        task_with_fd_table(&mut image);
        open_regular_file(&mut image, 4, 0xffff_8800_1000_0000, None);
        let view = resolve_in_kernel(&image, &KernelLayout::default(), TASK, 4).unwrap();
        assert_eq!(view.to_string(), "no filename");
    }

    #[test]
    fn sockets_carry_type_and_flags_but_no_path() {
        let mut image = MemoryImage::new();
        task_with_fd_table(&mut image);
        open_socket(&mut image, 5, 0xffff_8800_2000_0000, 1, 1 << SOCK_NOSPACE);
        let view = resolve_in_kernel(&image, &KernelLayout::default(), TASK, 5).unwrap();
        assert_eq!(view.kind, FileKind::Socket);
        assert_eq!(view.path, None);
        assert_eq!(view.socket_type, Some(1));
        let text = view.to_string();
        assert!(text.starts_with("(socket) -> type: SOCK_STREAM flags: "), "{text}");
        assert!(text.contains("SOCK_NOSPACE"), "{text}");
    }

    #[test]
    fn broken_chains_fail_without_panicking() {
        let layout = KernelLayout::default();
        let mut image = MemoryImage::new();
        task_with_fd_table(&mut image);
        assert!(matches!(
            resolve_in_kernel(&image, &layout, TASK, 7),
            Err(DecodeError::ResolutionFailure(_))
        ));
        assert!(matches!(
            resolve_in_kernel(&image, &layout, TASK, 99),
            Err(DecodeError::ResolutionFailure(_))
        ));
        assert!(resolve_in_kernel(&image, &layout, TASK, -1).is_err());

        image.kernel_word(TASK + layout.task_files, 0);
        assert!(matches!(
            resolve_in_kernel(&image, &layout, TASK, 1),
            Err(DecodeError::ResolutionFailure(_))
        ));
        assert!(resolve_in_kernel(&image, &layout, 0xdead_0000, 1).unwrap_err().is_dereference());
    }

    #[test]
    fn pointers_near_the_top_of_memory_wrap_into_read_errors() {
        let layout = KernelLayout::default();
        let mut image = MemoryImage::new();
        task_with_fd_table(&mut image);
        image.kernel_word(FD_ARRAY + 6 * 8, 0xffff_ffff_ffff_fff0);
        assert!(resolve_in_kernel(&image, &layout, TASK, 6).unwrap_err().is_dereference());

        assert!(resolve_in_kernel(&image, &layout, u64::MAX, 6).unwrap_err().is_dereference());

        image.kernel_word(FILES + layout.files_fdt, u64::MAX);
        assert!(resolve_in_kernel(&image, &layout, TASK, 6).unwrap_err().is_dereference());
    }
}
