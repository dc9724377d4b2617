use std::{collections::HashMap, sync::LazyLock};

use syscalls::x86_64::Sysno;

use crate::{
    introspection::normalize_type_name,
    types::{
        ArgDescriptor, PointerDirection, SemanticRole, SockaddrLength, SocketParam,
        SyscallDescriptor,
    },
};

// TODO! generate this from include/linux/syscalls.h of the target build instead of
// keeping the 2.6.32 prototypes by hand. Numbers 2.6.32 never implemented on
// x86-64 (create_module, tuxcall, vserver, ...) have no entry.

pub static SIGNATURE_MAP: LazyLock<HashMap<Sysno, SyscallDescriptor>> =
    LazyLock::new(initialize_signature_map);

/// `None` means the number has no known signature.
pub fn lookup(number: u64) -> Option<&'static SyscallDescriptor> {
    let sysno = Sysno::new(usize::try_from(number).ok()?)?;
    SIGNATURE_MAP.get(&sysno)
}

/// One parameter of a C prototype, before roles are attached.
#[derive(Clone, Copy, Debug)]
pub struct Param {
    name: &'static str,
    ty: &'static str,
    pointer: Option<PointerDirection>,
}

const fn val(ty: &'static str, name: &'static str) -> Param {
    Param {
        name,
        ty,
        pointer: None,
    }
}

// the kernel reads through this pointer
const fn user_in(ty: &'static str, name: &'static str) -> Param {
    Param {
        name,
        ty,
        pointer: Some(PointerDirection::UserRead),
    }
}

// the kernel writes through this pointer
const fn user_out(ty: &'static str, name: &'static str) -> Param {
    Param {
        name,
        ty,
        pointer: Some(PointerDirection::UserWrite),
    }
}

pub fn initialize_signature_map() -> HashMap<Sysno, SyscallDescriptor> {
    let array: Vec<(Sysno, &'static str, Vec<Param>)> = vec![
        // FILES
        (
            Sysno::read,
            "long",
            vec![val("unsigned int", "fd"), user_out("char", "buf"), val("size_t", "count")],
        ),
        (
            Sysno::write,
            "long",
            vec![val("unsigned int", "fd"), user_in("const char", "buf"), val("size_t", "count")],
        ),
        (
            Sysno::open,
            "long",
            vec![user_in("const char", "filename"), val("int", "flags"), val("int", "mode")],
        ),
        (Sysno::close, "long", vec![val("unsigned int", "fd")]),
        (
            Sysno::stat,
            "long",
            vec![user_in("char", "filename"), user_out("struct stat", "statbuf")],
        ),
        (Sysno::fstat, "long", vec![val("unsigned int", "fd"), user_out("struct stat", "statbuf")]),
        (
            Sysno::lstat,
            "long",
            vec![user_in("char", "filename"), user_out("struct stat", "statbuf")],
        ),
        (
            Sysno::poll,
            "long",
            vec![
                user_in("struct pollfd", "ufds"),
                val("unsigned int", "nfds"),
                val("long", "timeout"),
            ],
        ),
        (
            Sysno::lseek,
            "long",
            vec![val("unsigned int", "fd"), val("off_t", "offset"), val("unsigned int", "origin")],
        ),
        (
            Sysno::ioctl,
            "long",
            vec![
                val("unsigned int", "fd"),
                val("unsigned int", "cmd"),
                val("unsigned long", "arg"),
            ],
        ),
        // pread and pwrite come with their own offset and leave the file position alone
        (
            Sysno::pread64,
            "long",
            vec![
                val("unsigned int", "fd"),
                user_out("char", "buf"),
                val("size_t", "count"),
                val("loff_t", "pos"),
            ],
        ),
        (
            Sysno::pwrite64,
            "long",
            vec![
                val("unsigned int", "fd"),
                user_in("const char", "buf"),
                val("size_t", "count"),
                val("loff_t", "pos"),
            ],
        ),
        (
            Sysno::readv,
            "long",
            vec![
                val("unsigned long", "fd"),
                user_in("const struct iovec", "vec"),
                val("unsigned long", "vlen"),
            ],
        ),
        (
            Sysno::writev,
            "long",
            vec![
                val("unsigned long", "fd"),
                user_in("const struct iovec", "vec"),
                val("unsigned long", "vlen"),
            ],
        ),
        (
            Sysno::preadv,
            "long",
            vec![
                val("unsigned long", "fd"),
                user_in("const struct iovec", "vec"),
                val("unsigned long", "vlen"),
                val("unsigned long", "pos_l"),
                val("unsigned long", "pos_h"),
            ],
        ),
        (
            Sysno::pwritev,
            "long",
            vec![
                val("unsigned long", "fd"),
                user_in("const struct iovec", "vec"),
                val("unsigned long", "vlen"),
                val("unsigned long", "pos_l"),
                val("unsigned long", "pos_h"),
            ],
        ),
        (Sysno::access, "long", vec![user_in("const char", "filename"), val("int", "mode")]),
        (
            Sysno::faccessat,
            "long",
            vec![val("int", "dfd"), user_in("const char", "filename"), val("int", "mode")],
        ),
        (Sysno::pipe, "long", vec![user_out("int", "fildes")]),
        (Sysno::pipe2, "long", vec![user_out("int", "fildes"), val("int", "flags")]),
        (
            Sysno::select,
            "long",
            vec![
                val("int", "n"),
                user_in("fd_set", "inp"),
                user_in("fd_set", "outp"),
                user_in("fd_set", "exp"),
                user_in("struct timeval", "tvp"),
            ],
        ),
        (
            Sysno::pselect6,
            "long",
            vec![
                val("int", "n"),
                user_in("fd_set", "inp"),
                user_in("fd_set", "outp"),
                user_in("fd_set", "exp"),
                user_in("struct timespec", "tsp"),
                user_in("void", "sig"),
            ],
        ),
        (
            Sysno::ppoll,
            "long",
            vec![
                user_in("struct pollfd", "ufds"),
                val("unsigned int", "nfds"),
                user_in("struct timespec", "tsp"),
                user_in("const sigset_t", "sigmask"),
                val("size_t", "sigsetsize"),
            ],
        ),
        (Sysno::dup, "long", vec![val("unsigned int", "fildes")]),
        (Sysno::dup2, "long", vec![val("unsigned int", "oldfd"), val("unsigned int", "newfd")]),
        (
            Sysno::dup3,
            "long",
            vec![val("unsigned int", "oldfd"), val("unsigned int", "newfd"), val("int", "flags")],
        ),
        (
            Sysno::sendfile,
            "long",
            vec![
                val("int", "out_fd"),
                val("int", "in_fd"),
                user_in("off_t", "offset"),
                val("size_t", "count"),
            ],
        ),
        (
            Sysno::splice,
            "long",
            vec![
                val("int", "fd_in"),
                user_in("loff_t", "off_in"),
                val("int", "fd_out"),
                user_in("loff_t", "off_out"),
                val("size_t", "len"),
                val("unsigned int", "flags"),
            ],
        ),
        (
            Sysno::tee,
            "long",
            vec![
                val("int", "fdin"),
                val("int", "fdout"),
                val("size_t", "len"),
                val("unsigned int", "flags"),
            ],
        ),
        (
            Sysno::vmsplice,
            "long",
            vec![
                val("int", "fd"),
                user_in("const struct iovec", "iov"),
                val("unsigned long", "nr_segs"),
                val("unsigned int", "flags"),
            ],
        ),
        (
            Sysno::fcntl,
            "long",
            vec![
                val("unsigned int", "fd"),
                val("unsigned int", "cmd"),
                val("unsigned long", "arg"),
            ],
        ),
        (Sysno::flock, "long", vec![val("unsigned int", "fd"), val("unsigned int", "cmd")]),
        (Sysno::fsync, "long", vec![val("unsigned int", "fd")]),
        (Sysno::fdatasync, "long", vec![val("unsigned int", "fd")]),
        (Sysno::sync, "long", vec![]),
        (
            Sysno::sync_file_range,
            "long",
            vec![
                val("int", "fd"),
                val("loff_t", "offset"),
                val("loff_t", "nbytes"),
                val("unsigned int", "flags"),
            ],
        ),
        (Sysno::truncate, "long", vec![user_in("const char", "path"), val("long", "length")]),
        (Sysno::ftruncate, "long", vec![val("unsigned int", "fd"), val("unsigned long", "length")]),
        (
            Sysno::fallocate,
            "long",
            vec![
                val("int", "fd"),
                val("int", "mode"),
                val("loff_t", "offset"),
                val("loff_t", "len"),
            ],
        ),
        (
            Sysno::fadvise64,
            "long",
            vec![
                val("int", "fd"),
                val("loff_t", "offset"),
                val("size_t", "len"),
                val("int", "advice"),
            ],
        ),
        (
            Sysno::readahead,
            "long",
            vec![val("int", "fd"), val("loff_t", "offset"), val("size_t", "count")],
        ),
        (
            Sysno::getdents,
            "long",
            vec![
                val("unsigned int", "fd"),
                user_out("struct linux_dirent", "dirent"),
                val("unsigned int", "count"),
            ],
        ),
        (
            Sysno::getdents64,
            "long",
            vec![
                val("unsigned int", "fd"),
                user_out("struct linux_dirent64", "dirent"),
                val("unsigned int", "count"),
            ],
        ),
        (Sysno::getcwd, "long", vec![user_out("char", "buf"), val("unsigned long", "size")]),
        (Sysno::chdir, "long", vec![user_in("const char", "filename")]),
        (Sysno::fchdir, "long", vec![val("unsigned int", "fd")]),
        (Sysno::chroot, "long", vec![user_in("const char", "filename")]),
        (
            Sysno::pivot_root,
            "long",
            vec![user_in("const char", "new_root"), user_in("const char", "put_old")],
        ),
        (
            Sysno::rename,
            "long",
            vec![user_in("const char", "oldname"), user_in("const char", "newname")],
        ),
        (
            Sysno::renameat,
            "long",
            vec![
                val("int", "olddfd"),
                user_in("const char", "oldname"),
                val("int", "newdfd"),
                user_in("const char", "newname"),
            ],
        ),
        (Sysno::mkdir, "long", vec![user_in("const char", "pathname"), val("int", "mode")]),
        (
            Sysno::mkdirat,
            "long",
            vec![val("int", "dfd"), user_in("const char", "pathname"), val("int", "mode")],
        ),
        (Sysno::rmdir, "long", vec![user_in("const char", "pathname")]),
        (Sysno::creat, "long", vec![user_in("const char", "pathname"), val("int", "mode")]),
        (
            Sysno::link,
            "long",
            vec![user_in("const char", "oldname"), user_in("const char", "newname")],
        ),
        (
            Sysno::linkat,
            "long",
            vec![
                val("int", "olddfd"),
                user_in("const char", "oldname"),
                val("int", "newdfd"),
                user_in("const char", "newname"),
                val("int", "flags"),
            ],
        ),
        (Sysno::unlink, "long", vec![user_in("const char", "pathname")]),
        (
            Sysno::unlinkat,
            "long",
            vec![val("int", "dfd"), user_in("const char", "pathname"), val("int", "flag")],
        ),
        (Sysno::symlink, "long", vec![user_in("const char", "old"), user_in("const char", "new")]),
        (
            Sysno::symlinkat,
            "long",
            vec![
                user_in("const char", "oldname"),
                val("int", "newdfd"),
                user_in("const char", "newname"),
            ],
        ),
        (
            Sysno::readlink,
            "long",
            vec![user_in("const char", "path"), user_out("char", "buf"), val("int", "bufsiz")],
        ),
        (
            Sysno::readlinkat,
            "long",
            vec![
                val("int", "dfd"),
                user_in("const char", "path"),
                user_out("char", "buf"),
                val("int", "bufsiz"),
            ],
        ),
        (Sysno::chmod, "long", vec![user_in("const char", "filename"), val("mode_t", "mode")]),
        (Sysno::fchmod, "long", vec![val("unsigned int", "fd"), val("mode_t", "mode")]),
        (
            Sysno::fchmodat,
            "long",
            vec![val("int", "dfd"), user_in("const char", "filename"), val("mode_t", "mode")],
        ),
        (
            Sysno::chown,
            "long",
            vec![user_in("const char", "filename"), val("uid_t", "user"), val("gid_t", "group")],
        ),
        (
            Sysno::fchown,
            "long",
            vec![val("unsigned int", "fd"), val("uid_t", "user"), val("gid_t", "group")],
        ),
        (
            Sysno::lchown,
            "long",
            vec![user_in("const char", "filename"), val("uid_t", "user"), val("gid_t", "group")],
        ),
        (
            Sysno::fchownat,
            "long",
            vec![
                val("int", "dfd"),
                user_in("const char", "filename"),
                val("uid_t", "user"),
                val("gid_t", "group"),
                val("int", "flag"),
            ],
        ),
        (
            Sysno::mknod,
            "long",
            vec![user_in("const char", "filename"), val("int", "mode"), val("unsigned", "dev")],
        ),
        (
            Sysno::mknodat,
            "long",
            vec![
                val("int", "dfd"),
                user_in("const char", "filename"),
                val("int", "mode"),
                val("unsigned", "dev"),
            ],
        ),
        (Sysno::umask, "long", vec![val("int", "mask")]),
        (
            Sysno::openat,
            "long",
            vec![
                val("int", "dfd"),
                user_in("const char", "filename"),
                val("int", "flags"),
                val("int", "mode"),
            ],
        ),
        (
            Sysno::newfstatat,
            "long",
            vec![
                val("int", "dfd"),
                user_in("char", "filename"),
                user_out("struct stat", "statbuf"),
                val("int", "flag"),
            ],
        ),
        (
            Sysno::utime,
            "long",
            vec![user_in("char", "filename"), user_in("struct utimbuf", "times")],
        ),
        (
            Sysno::utimes,
            "long",
            vec![user_in("char", "filename"), user_in("struct timeval", "utimes")],
        ),
        (
            Sysno::futimesat,
            "long",
            vec![
                val("int", "dfd"),
                user_in("char", "filename"),
                user_in("struct timeval", "utimes"),
            ],
        ),
        (
            Sysno::utimensat,
            "long",
            vec![
                val("int", "dfd"),
                user_in("char", "filename"),
                user_in("struct timespec", "utimes"),
                val("int", "flags"),
            ],
        ),
        (
            Sysno::statfs,
            "long",
            vec![user_in("const char", "path"), user_out("struct statfs", "buf")],
        ),
        (Sysno::fstatfs, "long", vec![val("unsigned int", "fd"), user_out("struct statfs", "buf")]),
        (Sysno::ustat, "long", vec![val("unsigned", "dev"), user_out("struct ustat", "ubuf")]),
        (
            Sysno::setxattr,
            "long",
            vec![
                user_in("const char", "path"),
                user_in("const char", "name"),
                user_in("const void", "value"),
                val("size_t", "size"),
                val("int", "flags"),
            ],
        ),
        (
            Sysno::lsetxattr,
            "long",
            vec![
                user_in("const char", "path"),
                user_in("const char", "name"),
                user_in("const void", "value"),
                val("size_t", "size"),
                val("int", "flags"),
            ],
        ),
        (
            Sysno::fsetxattr,
            "long",
            vec![
                val("int", "fd"),
                user_in("const char", "name"),
                user_in("const void", "value"),
                val("size_t", "size"),
                val("int", "flags"),
            ],
        ),
        (
            Sysno::getxattr,
            "long",
            vec![
                user_in("const char", "path"),
                user_in("const char", "name"),
                user_out("void", "value"),
                val("size_t", "size"),
            ],
        ),
        (
            Sysno::lgetxattr,
            "long",
            vec![
                user_in("const char", "path"),
                user_in("const char", "name"),
                user_out("void", "value"),
                val("size_t", "size"),
            ],
        ),
        (
            Sysno::fgetxattr,
            "long",
            vec![
                val("int", "fd"),
                user_in("const char", "name"),
                user_out("void", "value"),
                val("size_t", "size"),
            ],
        ),
        (
            Sysno::listxattr,
            "long",
            vec![user_in("const char", "path"), user_out("char", "list"), val("size_t", "size")],
        ),
        (
            Sysno::llistxattr,
            "long",
            vec![user_in("const char", "path"), user_out("char", "list"), val("size_t", "size")],
        ),
        (
            Sysno::flistxattr,
            "long",
            vec![val("int", "fd"), user_out("char", "list"), val("size_t", "size")],
        ),
        (
            Sysno::removexattr,
            "long",
            vec![user_in("const char", "path"), user_in("const char", "name")],
        ),
        (
            Sysno::lremovexattr,
            "long",
            vec![user_in("const char", "path"), user_in("const char", "name")],
        ),
        (Sysno::fremovexattr, "long", vec![val("int", "fd"), user_in("const char", "name")]),
        (Sysno::inotify_init, "long", vec![]),
        (Sysno::inotify_init1, "long", vec![val("int", "flags")]),
        (
            Sysno::inotify_add_watch,
            "long",
            vec![val("int", "fd"), user_in("const char", "path"), val("u32", "mask")],
        ),
        (Sysno::inotify_rm_watch, "long", vec![val("int", "fd"), val("__s32", "wd")]),
        (Sysno::epoll_create, "long", vec![val("int", "size")]),
        (Sysno::epoll_create1, "long", vec![val("int", "flags")]),
        (
            Sysno::epoll_ctl,
            "long",
            vec![
                val("int", "epfd"),
                val("int", "op"),
                val("int", "fd"),
                user_in("struct epoll_event", "event"),
            ],
        ),
        (
            Sysno::epoll_wait,
            "long",
            vec![
                val("int", "epfd"),
                user_out("struct epoll_event", "events"),
                val("int", "maxevents"),
                val("int", "timeout"),
            ],
        ),
        (
            Sysno::epoll_pwait,
            "long",
            vec![
                val("int", "epfd"),
                user_out("struct epoll_event", "events"),
                val("int", "maxevents"),
                val("int", "timeout"),
                user_in("const sigset_t", "sigmask"),
                val("size_t", "sigsetsize"),
            ],
        ),
        (
            Sysno::signalfd,
            "long",
            vec![val("int", "ufd"), user_in("sigset_t", "user_mask"), val("size_t", "sizemask")],
        ),
        (
            Sysno::signalfd4,
            "long",
            vec![
                val("int", "ufd"),
                user_in("sigset_t", "user_mask"),
                val("size_t", "sizemask"),
                val("int", "flags"),
            ],
        ),
        (Sysno::timerfd_create, "long", vec![val("int", "clockid"), val("int", "flags")]),
        (
            Sysno::timerfd_settime,
            "long",
            vec![
                val("int", "ufd"),
                val("int", "flags"),
                user_in("const struct itimerspec", "utmr"),
                user_out("struct itimerspec", "otmr"),
            ],
        ),
        (
            Sysno::timerfd_gettime,
            "long",
            vec![val("int", "ufd"), user_out("struct itimerspec", "otmr")],
        ),
        (Sysno::eventfd, "long", vec![val("unsigned int", "count")]),
        (Sysno::eventfd2, "long", vec![val("unsigned int", "count"), val("int", "flags")]),
        (
            Sysno::io_setup,
            "long",
            vec![val("unsigned", "nr_reqs"), user_out("aio_context_t", "ctx")],
        ),
        (Sysno::io_destroy, "long", vec![val("aio_context_t", "ctx")]),
        (
            Sysno::io_getevents,
            "long",
            vec![
                val("aio_context_t", "ctx_id"),
                val("long", "min_nr"),
                val("long", "nr"),
                user_out("struct io_event", "events"),
                user_in("struct timespec", "timeout"),
            ],
        ),
        (
            Sysno::io_submit,
            "long",
            vec![
                val("aio_context_t", "ctx_id"),
                val("long", "nr"),
                user_in("struct iocb __user *", "iocbpp"),
            ],
        ),
        (
            Sysno::io_cancel,
            "long",
            vec![
                val("aio_context_t", "ctx_id"),
                user_in("struct iocb", "iocb"),
                user_out("struct io_event", "result"),
            ],
        ),
        (
            Sysno::lookup_dcookie,
            "long",
            vec![val("u64", "cookie64"), user_out("char", "buf"), val("size_t", "len")],
        ),
        (
            Sysno::mount,
            "long",
            vec![
                user_in("char", "dev_name"),
                user_in("char", "dir_name"),
                user_in("char", "type"),
                val("unsigned long", "flags"),
                user_in("void", "data"),
            ],
        ),
        (Sysno::umount2, "long", vec![user_in("char", "name"), val("int", "flags")]),
        (
            Sysno::swapon,
            "long",
            vec![user_in("const char", "specialfile"), val("int", "swap_flags")],
        ),
        (Sysno::swapoff, "long", vec![user_in("const char", "specialfile")]),
        (
            Sysno::quotactl,
            "long",
            vec![
                val("unsigned int", "cmd"),
                user_in("const char", "special"),
                val("qid_t", "id"),
                user_in("void", "addr"),
            ],
        ),
        (
            Sysno::nfsservctl,
            "long",
            vec![val("int", "cmd"), user_in("struct nfsctl_arg", "arg"), user_out("void", "res")],
        ),
        // MEMORY
        (
            Sysno::mmap,
            "long",
            vec![
                val("unsigned long", "addr"),
                val("unsigned long", "len"),
                val("unsigned long", "prot"),
                val("unsigned long", "flags"),
                val("unsigned long", "fd"),
                val("unsigned long", "pgoff"),
            ],
        ),
        (
            Sysno::mprotect,
            "long",
            vec![val("unsigned long", "start"), val("size_t", "len"), val("unsigned long", "prot")],
        ),
        (Sysno::munmap, "long", vec![val("unsigned long", "addr"), val("size_t", "len")]),
        (
            Sysno::mremap,
            "unsigned long",
            vec![
                val("unsigned long", "addr"),
                val("unsigned long", "old_len"),
                val("unsigned long", "new_len"),
                val("unsigned long", "flags"),
                val("unsigned long", "new_addr"),
            ],
        ),
        (
            Sysno::remap_file_pages,
            "long",
            vec![
                val("unsigned long", "start"),
                val("unsigned long", "size"),
                val("unsigned long", "prot"),
                val("unsigned long", "pgoff"),
                val("unsigned long", "flags"),
            ],
        ),
        (
            Sysno::msync,
            "long",
            vec![val("unsigned long", "start"), val("size_t", "len"), val("int", "flags")],
        ),
        (
            Sysno::mincore,
            "long",
            vec![
                val("unsigned long", "start"),
                val("size_t", "len"),
                user_out("unsigned char", "vec"),
            ],
        ),
        (
            Sysno::madvise,
            "long",
            vec![val("unsigned long", "start"), val("size_t", "len_in"), val("int", "behavior")],
        ),
        (Sysno::mlock, "long", vec![val("unsigned long", "start"), val("size_t", "len")]),
        (Sysno::munlock, "long", vec![val("unsigned long", "start"), val("size_t", "len")]),
        (Sysno::mlockall, "long", vec![val("int", "flags")]),
        (Sysno::munlockall, "long", vec![]),
        (Sysno::brk, "unsigned long", vec![val("unsigned long", "brk")]),
        (
            Sysno::mbind,
            "long",
            vec![
                val("unsigned long", "start"),
                val("unsigned long", "len"),
                val("unsigned long", "mode"),
                user_in("unsigned long", "nmask"),
                val("unsigned long", "maxnode"),
                val("unsigned", "flags"),
            ],
        ),
        (
            Sysno::set_mempolicy,
            "long",
            vec![
                val("int", "mode"),
                user_in("unsigned long", "nmask"),
                val("unsigned long", "maxnode"),
            ],
        ),
        (
            Sysno::get_mempolicy,
            "long",
            vec![
                user_out("int", "policy"),
                user_out("unsigned long", "nmask"),
                val("unsigned long", "maxnode"),
                val("unsigned long", "addr"),
                val("unsigned long", "flags"),
            ],
        ),
        (
            Sysno::migrate_pages,
            "long",
            vec![
                val("pid_t", "pid"),
                val("unsigned long", "maxnode"),
                user_in("const unsigned long", "from"),
                user_in("const unsigned long", "to"),
            ],
        ),
        (
            Sysno::move_pages,
            "long",
            vec![
                val("pid_t", "pid"),
                val("unsigned long", "nr_pages"),
                user_in("const void __user *", "pages"),
                user_in("const int", "nodes"),
                user_out("int", "status"),
                val("int", "flags"),
            ],
        ),
        (
            Sysno::modify_ldt,
            "long",
            vec![val("int", "func"), user_in("void", "ptr"), val("unsigned long", "bytecount")],
        ),
        // NETWORK
        (
            Sysno::socket,
            "long",
            vec![val("int", "family"), val("int", "type"), val("int", "protocol")],
        ),
        (
            Sysno::socketpair,
            "long",
            vec![
                val("int", "family"),
                val("int", "type"),
                val("int", "protocol"),
                user_out("int", "usockvec"),
            ],
        ),
        (
            Sysno::connect,
            "long",
            vec![val("int", "fd"), user_in("struct sockaddr", "uservaddr"), val("int", "addrlen")],
        ),
        (
            Sysno::bind,
            "long",
            vec![val("int", "fd"), user_in("struct sockaddr", "umyaddr"), val("int", "addrlen")],
        ),
        (Sysno::listen, "long", vec![val("int", "fd"), val("int", "backlog")]),
        (
            Sysno::accept,
            "long",
            vec![
                val("int", "fd"),
                user_out("struct sockaddr", "upeer_sockaddr"),
                user_out("int", "upeer_addrlen"),
            ],
        ),
        (
            Sysno::accept4,
            "long",
            vec![
                val("int", "fd"),
                user_out("struct sockaddr", "upeer_sockaddr"),
                user_out("int", "upeer_addrlen"),
                val("int", "flags"),
            ],
        ),
        (
            Sysno::getsockname,
            "long",
            vec![
                val("int", "fd"),
                user_out("struct sockaddr", "usockaddr"),
                user_out("int", "usockaddr_len"),
            ],
        ),
        (
            Sysno::getpeername,
            "long",
            vec![
                val("int", "fd"),
                user_out("struct sockaddr", "usockaddr"),
                user_out("int", "usockaddr_len"),
            ],
        ),
        (
            Sysno::sendto,
            "long",
            vec![
                val("int", "fd"),
                user_in("void", "buff"),
                val("size_t", "len"),
                val("unsigned", "flags"),
                user_in("struct sockaddr", "addr"),
                val("int", "addr_len"),
            ],
        ),
        (
            Sysno::recvfrom,
            "long",
            vec![
                val("int", "fd"),
                user_out("void", "ubuf"),
                val("size_t", "size"),
                val("unsigned", "flags"),
                user_out("struct sockaddr", "addr"),
                user_out("int", "addr_len"),
            ],
        ),
        (
            Sysno::sendmsg,
            "long",
            vec![val("int", "fd"), user_in("struct msghdr", "msg"), val("unsigned", "flags")],
        ),
        (
            Sysno::recvmsg,
            "long",
            vec![val("int", "fd"), user_out("struct msghdr", "msg"), val("unsigned int", "flags")],
        ),
        (Sysno::shutdown, "long", vec![val("int", "fd"), val("int", "how")]),
        (
            Sysno::setsockopt,
            "long",
            vec![
                val("int", "fd"),
                val("int", "level"),
                val("int", "optname"),
                user_in("char", "optval"),
                val("int", "optlen"),
            ],
        ),
        (
            Sysno::getsockopt,
            "long",
            vec![
                val("int", "fd"),
                val("int", "level"),
                val("int", "optname"),
                user_out("char", "optval"),
                user_out("int", "optlen"),
            ],
        ),
        // PROCESS
        (
            Sysno::execve,
            "long",
            vec![
                user_in("char", "filename"),
                user_in("char __user *", "argv"),
                user_in("char __user *", "envp"),
            ],
        ),
        (
            Sysno::clone,
            "long",
            vec![
                val("unsigned long", "clone_flags"),
                val("unsigned long", "newsp"),
                user_out("int", "parent_tid"),
                user_out("int", "child_tid"),
            ],
        ),
        (Sysno::fork, "long", vec![]),
        (Sysno::vfork, "long", vec![]),
        (Sysno::exit, "long", vec![val("int", "error_code")]),
        (Sysno::exit_group, "long", vec![val("int", "error_code")]),
        (
            Sysno::wait4,
            "long",
            vec![
                val("pid_t", "upid"),
                user_out("int", "stat_addr"),
                val("int", "options"),
                user_out("struct rusage", "ru"),
            ],
        ),
        (
            Sysno::waitid,
            "long",
            vec![
                val("int", "which"),
                val("pid_t", "pid"),
                user_out("struct siginfo", "infop"),
                val("int", "options"),
                user_out("struct rusage", "ru"),
            ],
        ),
        (Sysno::kill, "long", vec![val("pid_t", "pid"), val("int", "sig")]),
        (Sysno::tkill, "long", vec![val("int", "pid"), val("int", "sig")]),
        (Sysno::tgkill, "long", vec![val("int", "tgid"), val("int", "pid"), val("int", "sig")]),
        (
            Sysno::ptrace,
            "long",
            vec![
                val("long", "request"),
                val("long", "pid"),
                val("long", "addr"),
                val("long", "data"),
            ],
        ),
        (Sysno::getpid, "long", vec![]),
        (Sysno::getppid, "long", vec![]),
        (Sysno::gettid, "long", vec![]),
        (Sysno::set_tid_address, "long", vec![user_in("int", "tidptr")]),
        (Sysno::getuid, "long", vec![]),
        (Sysno::getgid, "long", vec![]),
        (Sysno::geteuid, "long", vec![]),
        (Sysno::getegid, "long", vec![]),
        (Sysno::setuid, "long", vec![val("uid_t", "uid")]),
        (Sysno::setgid, "long", vec![val("gid_t", "gid")]),
        (Sysno::setreuid, "long", vec![val("uid_t", "ruid"), val("uid_t", "euid")]),
        (Sysno::setregid, "long", vec![val("gid_t", "rgid"), val("gid_t", "egid")]),
        (
            Sysno::setresuid,
            "long",
            vec![val("uid_t", "ruid"), val("uid_t", "euid"), val("uid_t", "suid")],
        ),
        (
            Sysno::getresuid,
            "long",
            vec![user_out("uid_t", "ruid"), user_out("uid_t", "euid"), user_out("uid_t", "suid")],
        ),
        (
            Sysno::setresgid,
            "long",
            vec![val("gid_t", "rgid"), val("gid_t", "egid"), val("gid_t", "sgid")],
        ),
        (
            Sysno::getresgid,
            "long",
            vec![user_out("gid_t", "rgid"), user_out("gid_t", "egid"), user_out("gid_t", "sgid")],
        ),
        (Sysno::setfsuid, "long", vec![val("uid_t", "uid")]),
        (Sysno::setfsgid, "long", vec![val("gid_t", "gid")]),
        (Sysno::getgroups, "long", vec![val("int", "gidsetsize"), user_out("gid_t", "grouplist")]),
        (Sysno::setgroups, "long", vec![val("int", "gidsetsize"), user_in("gid_t", "grouplist")]),
        (Sysno::setpgid, "long", vec![val("pid_t", "pid"), val("pid_t", "pgid")]),
        (Sysno::getpgid, "long", vec![val("pid_t", "pid")]),
        (Sysno::getpgrp, "long", vec![]),
        (Sysno::setsid, "long", vec![]),
        (Sysno::getsid, "long", vec![val("pid_t", "pid")]),
        (
            Sysno::capget,
            "long",
            vec![
                user_in("struct __user_cap_header_struct", "header"),
                user_out("struct __user_cap_data_struct", "dataptr"),
            ],
        ),
        (
            Sysno::capset,
            "long",
            vec![
                user_in("struct __user_cap_header_struct", "header"),
                user_in("const struct __user_cap_data_struct", "data"),
            ],
        ),
        (Sysno::personality, "long", vec![val("unsigned long", "personality")]),
        (
            Sysno::prctl,
            "long",
            vec![
                val("int", "option"),
                val("unsigned long", "arg2"),
                val("unsigned long", "arg3"),
                val("unsigned long", "arg4"),
                val("unsigned long", "arg5"),
            ],
        ),
        (Sysno::arch_prctl, "long", vec![val("int", "code"), val("unsigned long", "addr")]),
        (Sysno::unshare, "long", vec![val("unsigned long", "unshare_flags")]),
        (
            Sysno::set_robust_list,
            "long",
            vec![user_in("struct robust_list_head", "head"), val("size_t", "len")],
        ),
        (
            Sysno::get_robust_list,
            "long",
            vec![
                val("int", "pid"),
                user_out("struct robust_list_head __user *", "head_ptr"),
                user_out("size_t", "len_ptr"),
            ],
        ),
        (
            Sysno::futex,
            "long",
            vec![
                user_in("u32", "uaddr"),
                val("int", "op"),
                val("u32", "val"),
                user_in("struct timespec", "utime"),
                user_in("u32", "uaddr2"),
                val("u32", "val3"),
            ],
        ),
        (Sysno::getpriority, "long", vec![val("int", "which"), val("int", "who")]),
        (
            Sysno::setpriority,
            "long",
            vec![val("int", "which"), val("int", "who"), val("int", "niceval")],
        ),
        (
            Sysno::ioprio_set,
            "long",
            vec![val("int", "which"), val("int", "who"), val("int", "ioprio")],
        ),
        (Sysno::ioprio_get, "long", vec![val("int", "which"), val("int", "who")]),
        (Sysno::sched_yield, "long", vec![]),
        (
            Sysno::sched_setparam,
            "long",
            vec![val("pid_t", "pid"), user_in("struct sched_param", "param")],
        ),
        (
            Sysno::sched_getparam,
            "long",
            vec![val("pid_t", "pid"), user_out("struct sched_param", "param")],
        ),
        (
            Sysno::sched_setscheduler,
            "long",
            vec![val("pid_t", "pid"), val("int", "policy"), user_in("struct sched_param", "param")],
        ),
        (Sysno::sched_getscheduler, "long", vec![val("pid_t", "pid")]),
        (Sysno::sched_get_priority_max, "long", vec![val("int", "policy")]),
        (Sysno::sched_get_priority_min, "long", vec![val("int", "policy")]),
        (
            Sysno::sched_rr_get_interval,
            "long",
            vec![val("pid_t", "pid"), user_out("struct timespec", "interval")],
        ),
        (
            Sysno::sched_setaffinity,
            "long",
            vec![
                val("pid_t", "pid"),
                val("unsigned int", "len"),
                user_in("unsigned long", "user_mask_ptr"),
            ],
        ),
        (
            Sysno::sched_getaffinity,
            "long",
            vec![
                val("pid_t", "pid"),
                val("unsigned int", "len"),
                user_out("unsigned long", "user_mask_ptr"),
            ],
        ),
        (
            Sysno::getrlimit,
            "long",
            vec![val("unsigned int", "resource"), user_out("struct rlimit", "rlim")],
        ),
        (
            Sysno::setrlimit,
            "long",
            vec![val("unsigned int", "resource"), user_in("struct rlimit", "rlim")],
        ),
        (Sysno::getrusage, "long", vec![val("int", "who"), user_out("struct rusage", "ru")]),
        (Sysno::times, "long", vec![user_out("struct tms", "tbuf")]),
        (
            Sysno::perf_event_open,
            "long",
            vec![
                user_in("struct perf_event_attr", "attr_uptr"),
                val("pid_t", "pid"),
                val("int", "cpu"),
                val("int", "group_fd"),
                val("unsigned long", "flags"),
            ],
        ),
        // SIGNALS
        (
            Sysno::rt_sigaction,
            "long",
            vec![
                val("int", "sig"),
                user_in("const struct sigaction", "act"),
                user_out("struct sigaction", "oact"),
                val("size_t", "sigsetsize"),
            ],
        ),
        (
            Sysno::rt_sigprocmask,
            "long",
            vec![
                val("int", "how"),
                user_in("sigset_t", "set"),
                user_out("sigset_t", "oset"),
                val("size_t", "sigsetsize"),
            ],
        ),
        (Sysno::rt_sigreturn, "long", vec![]),
        (
            Sysno::rt_sigpending,
            "long",
            vec![user_out("sigset_t", "set"), val("size_t", "sigsetsize")],
        ),
        (
            Sysno::rt_sigtimedwait,
            "long",
            vec![
                user_in("const sigset_t", "uthese"),
                user_out("siginfo_t", "uinfo"),
                user_in("const struct timespec", "uts"),
                val("size_t", "sigsetsize"),
            ],
        ),
        (
            Sysno::rt_sigqueueinfo,
            "long",
            vec![val("int", "pid"), val("int", "sig"), user_in("siginfo_t", "uinfo")],
        ),
        (
            Sysno::rt_tgsigqueueinfo,
            "long",
            vec![
                val("pid_t", "tgid"),
                val("pid_t", "pid"),
                val("int", "sig"),
                user_in("siginfo_t", "uinfo"),
            ],
        ),
        (
            Sysno::rt_sigsuspend,
            "long",
            vec![user_in("sigset_t", "unewset"), val("size_t", "sigsetsize")],
        ),
        (
            Sysno::sigaltstack,
            "long",
            vec![user_in("const stack_t", "uss"), user_out("stack_t", "uoss")],
        ),
        (Sysno::pause, "long", vec![]),
        (Sysno::restart_syscall, "long", vec![]),
        // IPC
        (
            Sysno::shmget,
            "long",
            vec![val("key_t", "key"), val("size_t", "size"), val("int", "flag")],
        ),
        (
            Sysno::shmat,
            "long",
            vec![val("int", "shmid"), user_in("char", "shmaddr"), val("int", "shmflg")],
        ),
        (
            Sysno::shmctl,
            "long",
            vec![val("int", "shmid"), val("int", "cmd"), user_in("struct shmid_ds", "buf")],
        ),
        (Sysno::shmdt, "long", vec![user_in("char", "shmaddr")]),
        (
            Sysno::semget,
            "long",
            vec![val("key_t", "key"), val("int", "nsems"), val("int", "semflg")],
        ),
        (
            Sysno::semop,
            "long",
            vec![val("int", "semid"), user_in("struct sembuf", "sops"), val("unsigned", "nsops")],
        ),
        (
            Sysno::semtimedop,
            "long",
            vec![
                val("int", "semid"),
                user_in("struct sembuf", "sops"),
                val("unsigned", "nsops"),
                user_in("const struct timespec", "timeout"),
            ],
        ),
        (
            Sysno::semctl,
            "long",
            vec![
                val("int", "semid"),
                val("int", "semnum"),
                val("int", "cmd"),
                val("unsigned long", "arg"),
            ],
        ),
        (Sysno::msgget, "long", vec![val("key_t", "key"), val("int", "msgflg")]),
        (
            Sysno::msgsnd,
            "long",
            vec![
                val("int", "msqid"),
                user_in("struct msgbuf", "msgp"),
                val("size_t", "msgsz"),
                val("int", "msgflg"),
            ],
        ),
        (
            Sysno::msgrcv,
            "long",
            vec![
                val("int", "msqid"),
                user_out("struct msgbuf", "msgp"),
                val("size_t", "msgsz"),
                val("long", "msgtyp"),
                val("int", "msgflg"),
            ],
        ),
        (
            Sysno::msgctl,
            "long",
            vec![val("int", "msqid"), val("int", "cmd"), user_in("struct msqid_ds", "buf")],
        ),
        (
            Sysno::mq_open,
            "long",
            vec![
                user_in("const char", "u_name"),
                val("int", "oflag"),
                val("mode_t", "mode"),
                user_in("struct mq_attr", "u_attr"),
            ],
        ),
        (Sysno::mq_unlink, "long", vec![user_in("const char", "u_name")]),
        (
            Sysno::mq_timedsend,
            "long",
            vec![
                val("mqd_t", "mqdes"),
                user_in("const char", "u_msg_ptr"),
                val("size_t", "msg_len"),
                val("unsigned int", "msg_prio"),
                user_in("const struct timespec", "u_abs_timeout"),
            ],
        ),
        (
            Sysno::mq_timedreceive,
            "long",
            vec![
                val("mqd_t", "mqdes"),
                user_out("char", "u_msg_ptr"),
                val("size_t", "msg_len"),
                user_out("unsigned int", "u_msg_prio"),
                user_in("const struct timespec", "u_abs_timeout"),
            ],
        ),
        (
            Sysno::mq_notify,
            "long",
            vec![val("mqd_t", "mqdes"), user_in("const struct sigevent", "u_notification")],
        ),
        (
            Sysno::mq_getsetattr,
            "long",
            vec![
                val("mqd_t", "mqdes"),
                user_in("const struct mq_attr", "u_mqstat"),
                user_out("struct mq_attr", "u_omqstat"),
            ],
        ),
        // TIME
        (
            Sysno::nanosleep,
            "long",
            vec![user_in("struct timespec", "rqtp"), user_out("struct timespec", "rmtp")],
        ),
        (
            Sysno::gettimeofday,
            "long",
            vec![user_out("struct timeval", "tv"), user_out("struct timezone", "tz")],
        ),
        (
            Sysno::settimeofday,
            "long",
            vec![user_in("struct timeval", "tv"), user_in("struct timezone", "tz")],
        ),
        (Sysno::time, "long", vec![user_out("time_t", "tloc")]),
        (Sysno::adjtimex, "long", vec![user_in("struct timex", "txc_p")]),
        (
            Sysno::getitimer,
            "long",
            vec![val("int", "which"), user_out("struct itimerval", "value")],
        ),
        (
            Sysno::setitimer,
            "long",
            vec![
                val("int", "which"),
                user_in("struct itimerval", "value"),
                user_out("struct itimerval", "ovalue"),
            ],
        ),
        (Sysno::alarm, "long", vec![val("unsigned int", "seconds")]),
        (
            Sysno::timer_create,
            "long",
            vec![
                val("clockid_t", "which_clock"),
                user_in("struct sigevent", "timer_event_spec"),
                user_out("timer_t", "created_timer_id"),
            ],
        ),
        (
            Sysno::timer_settime,
            "long",
            vec![
                val("timer_t", "timer_id"),
                val("int", "flags"),
                user_in("const struct itimerspec", "new_setting"),
                user_out("struct itimerspec", "old_setting"),
            ],
        ),
        (
            Sysno::timer_gettime,
            "long",
            vec![val("timer_t", "timer_id"), user_out("struct itimerspec", "setting")],
        ),
        (Sysno::timer_getoverrun, "long", vec![val("timer_t", "timer_id")]),
        (Sysno::timer_delete, "long", vec![val("timer_t", "timer_id")]),
        (
            Sysno::clock_settime,
            "long",
            vec![val("clockid_t", "which_clock"), user_in("const struct timespec", "tp")],
        ),
        (
            Sysno::clock_gettime,
            "long",
            vec![val("clockid_t", "which_clock"), user_out("struct timespec", "tp")],
        ),
        (
            Sysno::clock_getres,
            "long",
            vec![val("clockid_t", "which_clock"), user_out("struct timespec", "tp")],
        ),
        (
            Sysno::clock_nanosleep,
            "long",
            vec![
                val("clockid_t", "which_clock"),
                val("int", "flags"),
                user_in("const struct timespec", "rqtp"),
                user_out("struct timespec", "rmtp"),
            ],
        ),
        // SYSTEM
        (Sysno::uname, "long", vec![user_out("struct new_utsname", "name")]),
        (Sysno::sysinfo, "long", vec![user_out("struct sysinfo", "info")]),
        (
            Sysno::syslog,
            "long",
            vec![val("int", "type"), user_out("char", "buf"), val("int", "len")],
        ),
        (
            Sysno::sysfs,
            "long",
            vec![val("int", "option"), val("unsigned long", "arg1"), val("unsigned long", "arg2")],
        ),
        (Sysno::_sysctl, "long", vec![user_in("struct __sysctl_args", "args")]),
        (
            Sysno::reboot,
            "long",
            vec![
                val("int", "magic1"),
                val("int", "magic2"),
                val("unsigned int", "cmd"),
                user_in("void", "arg"),
            ],
        ),
        (Sysno::sethostname, "long", vec![user_in("char", "name"), val("int", "len")]),
        (Sysno::setdomainname, "long", vec![user_in("char", "name"), val("int", "len")]),
        (Sysno::iopl, "long", vec![val("unsigned int", "level")]),
        (
            Sysno::ioperm,
            "long",
            vec![val("unsigned long", "from"), val("unsigned long", "num"), val("int", "turn_on")],
        ),
        (Sysno::vhangup, "long", vec![]),
        (Sysno::acct, "long", vec![user_in("const char", "name")]),
        (Sysno::uselib, "long", vec![user_in("const char", "library")]),
        (
            Sysno::init_module,
            "long",
            vec![
                user_in("void", "umod"),
                val("unsigned long", "len"),
                user_in("const char", "uargs"),
            ],
        ),
        (
            Sysno::delete_module,
            "long",
            vec![user_in("const char", "name_user"), val("unsigned int", "flags")],
        ),
        (
            Sysno::kexec_load,
            "long",
            vec![
                val("unsigned long", "entry"),
                val("unsigned long", "nr_segments"),
                user_in("struct kexec_segment", "segments"),
                val("unsigned long", "flags"),
            ],
        ),
        (
            Sysno::add_key,
            "long",
            vec![
                user_in("const char", "_type"),
                user_in("const char", "_description"),
                user_in("const void", "_payload"),
                val("size_t", "plen"),
                val("key_serial_t", "destringid"),
            ],
        ),
        (
            Sysno::request_key,
            "long",
            vec![
                user_in("const char", "_type"),
                user_in("const char", "_description"),
                user_in("const char", "_callout_info"),
                val("key_serial_t", "destringid"),
            ],
        ),
        (
            Sysno::keyctl,
            "long",
            vec![
                val("int", "cmd"),
                val("unsigned long", "arg2"),
                val("unsigned long", "arg3"),
                val("unsigned long", "arg4"),
                val("unsigned long", "arg5"),
            ],
        ),
    ];
    array
        .into_iter()
        .map(|(sysno, return_type, params)| {
            let args = params
                .iter()
                .enumerate()
                .map(|(index, param)| ArgDescriptor {
                    index,
                    name: param.name,
                    declared_type: param.ty,
                    is_pointer: param.pointer.is_some(),
                    direction: param.pointer.unwrap_or(PointerDirection::Unspecified),
                    role: classify(sysno, &params, index),
                })
                .collect();
            (
                sysno,
                SyscallDescriptor {
                    sysno,
                    return_type,
                    args,
                },
            )
        })
        .collect()
}

fn classify(sysno: Sysno, params: &[Param], index: usize) -> SemanticRole {
    let param = params[index];
    let next = params.get(index + 1);
    if param.pointer.is_none() {
        return match (sysno, param.name) {
            (Sysno::mmap, "flags") => SemanticRole::MmapFlags,
            (Sysno::mmap, "fd" | "pgoff") => SemanticRole::MmapBacking,
            (Sysno::mmap | Sysno::mprotect, "prot") => SemanticRole::MmapProt,
            (Sysno::sendto | Sysno::recvfrom | Sysno::sendmsg | Sysno::recvmsg, "flags") => {
                SemanticRole::MsgFlags
            }
            (_, "fd" | "sockfd") => SemanticRole::FileDescriptor,
            (Sysno::socket | Sysno::socketpair, "family" | "domain") => {
                SemanticRole::SocketParam(SocketParam::Domain)
            }
            (Sysno::socket | Sysno::socketpair, "type") => {
                SemanticRole::SocketParam(SocketParam::Type)
            }
            (Sysno::socket | Sysno::socketpair, "protocol") => {
                SemanticRole::SocketParam(SocketParam::Protocol)
            }
            _ => SemanticRole::Plain,
        };
    }
    let pointee = normalize_type_name(param.ty);
    match param.name {
        "filename" | "pathname" | "oldname" | "newname" | "path" => SemanticRole::FilenamePointer,
        // read's buffer is only filled once the syscall returns
        "buf"
            if sysno != Sysno::read
                && next.is_some_and(|next| matches!(next.name, "count" | "len")) =>
        {
            SemanticRole::BufferPointer {
                length_index: index + 1,
            }
        }
        "argv" | "envp" => SemanticRole::StringArrayPointer,
        _ if pointee == "struct sockaddr" => SemanticRole::SockaddrPointer {
            length: match next {
                Some(next) if next.name.contains("len") && next.pointer.is_some() => {
                    SockaddrLength::Pointer(index + 1)
                }
                Some(next) if next.name.contains("len") => SockaddrLength::Value(index + 1),
                _ => SockaddrLength::Absent,
            },
        },
        _ if pointee == "struct msghdr" || pointee == "struct user_msghdr" => {
            SemanticRole::MsghdrPointer
        }
        _ => SemanticRole::Plain,
    }
}
