/// Structure offsets of one specific kernel build.
///
/// None of these can be discovered from the syscall itself; they are read
/// off the build's debug info by hand and have to be swapped together when
/// the target kernel changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelLayout {
    pub pointer_size: u64,
    pub page_size: u64,
    pub current_task_symbol: &'static str,
    pub socket_ops_symbol: &'static str,
    // struct task_struct
    pub task_files: u64,
    pub task_mm: u64,
    // struct files_struct
    pub files_fdt: u64,
    // struct fdtable
    pub fdtable_max_fds: u64,
    pub fdtable_fd: u64,
    // struct file
    pub file_dentry: u64,
    pub file_f_op: u64,
    pub file_private_data: u64,
    // struct dentry
    pub dentry_iname: u64,
    pub dentry_iname_len: usize,
    // struct socket
    pub socket_type: u64,
    pub socket_flags: u64,
    // struct mm_struct
    pub mm_mmap: u64,
    // struct vm_area_struct
    pub vma_start: u64,
    pub vma_end: u64,
    pub vma_next: u64,
    pub vma_flags: u64,
    pub vma_pgoff: u64,
}

impl KernelLayout {
    /// Linux 2.6.32, x86-64, distribution default config.
    pub fn linux_2_6_32_x86_64() -> Self {
        KernelLayout {
            pointer_size: 8,
            page_size: 4096,
            current_task_symbol: "per_cpu__current_task",
            socket_ops_symbol: "socket_file_ops",
            task_files: 0x5c8,
            task_mm: 0x248,
            files_fdt: 0x8,
            fdtable_max_fds: 0x0,
            fdtable_fd: 0x8,
            // f_path.dentry, behind the f_u union and f_path.mnt
            file_dentry: 0x18,
            file_f_op: 0x20,
            file_private_data: 0xb8,
            dentry_iname: 0xa0,
            dentry_iname_len: 32,
            socket_type: 0x4,
            socket_flags: 0x8,
            mm_mmap: 0x0,
            vma_start: 0x8,
            vma_end: 0x10,
            vma_next: 0x18,
            vma_flags: 0x28,
            vma_pgoff: 0x78,
        }
    }

    pub fn page_shift(&self) -> u32 {
        self.page_size.trailing_zeros()
    }
}

impl Default for KernelLayout {
    fn default() -> Self {
        KernelLayout::linux_2_6_32_x86_64()
    }
}
