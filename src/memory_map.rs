use log::{debug, warn};
use nix::unistd::Pid;
use procfs::process::{MMPermissions, MMapPath, Process};
use tabled::{builder::Builder, settings::Style};

use crate::{
    errors::DecodeError,
    flags::{self, kernel::*},
    introspection::{AddressSpace, Introspector},
    kernel_layout::KernelLayout,
    process::ProcessView,
    types::Bytes,
};

// a corrupted vm_next chain must not spin forever
const MAX_AREAS: usize = 65536;

pub const MEMORY_MAP_TITLE: &str = "Memory mapping before syscall:";

/// One virtual memory area. `end` is exclusive like the kernel's `vm_end`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmArea {
    pub start: u64,
    pub end: u64,
    pub flags: u64,
    pub io_address: Option<u64>,
    pub path: Option<String>,
}

impl VmArea {
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn pages(&self, page_size: u64) -> u64 {
        self.size().div_ceil(page_size.max(1))
    }
}

/// Walks `task->mm->mmap` along `vm_next`.
pub fn areas_in_kernel<I: Introspector + ?Sized>(
    engine: &I,
    layout: &KernelLayout,
    task: u64,
) -> Result<Vec<VmArea>, DecodeError> {
    let kernel = AddressSpace::Kernel;
    let mm = engine.read_pointer(kernel, task.wrapping_add(layout.task_mm))?;
    if mm == 0 {
        return Err(DecodeError::resolution("task has no mm (kernel thread)"));
    }
    let mut vma = engine.read_pointer(kernel, mm.wrapping_add(layout.mm_mmap))?;
    let mut areas = Vec::new();
    while vma != 0 {
        if areas.len() == MAX_AREAS {
            warn!("vm_area list of task 0x{task:x} is longer than {MAX_AREAS}, truncated");
            break;
        }
        let start = engine.read_pointer(kernel, vma.wrapping_add(layout.vma_start))?;
        let end = engine.read_pointer(kernel, vma.wrapping_add(layout.vma_end))?;
        let flags = engine.read_pointer(kernel, vma.wrapping_add(layout.vma_flags))?;
        let io_address = if flags & (VM_IO | VM_PFNMAP) != 0 {
            let pgoff = engine.read_pointer(kernel, vma.wrapping_add(layout.vma_pgoff))?;
            Some(pgoff << layout.page_shift())
        } else {
            None
        };
        areas.push(VmArea {
            start,
            end,
            flags,
            io_address,
            path: None,
        });
        vma = engine.read_pointer(kernel, vma.wrapping_add(layout.vma_next))?;
    }
    debug!("task 0x{task:x} has {} memory areas", areas.len());
    Ok(areas)
}

/// Converts `/proc/<pid>/maps`.
pub fn areas_in_procfs(pid: Pid) -> Result<Vec<VmArea>, DecodeError> {
    let maps = Process::new(pid.as_raw())?.maps()?;
    Ok(maps
        .0
        .into_iter()
        .map(|map| {
            let mut flags = 0;
            for (permission, bit) in [
                (MMPermissions::READ, VM_READ),
                (MMPermissions::WRITE, VM_WRITE),
                (MMPermissions::EXECUTE, VM_EXEC),
                (MMPermissions::SHARED, VM_SHARED),
            ] {
                if map.perms.contains(permission) {
                    flags |= bit;
                }
            }
            VmArea {
                start: map.address.0,
                end: map.address.1,
                flags,
                io_address: None,
                path: describe_path(&map.pathname),
            }
        })
        .collect())
}

fn describe_path(path: &MMapPath) -> Option<String> {
    match path {
        MMapPath::Path(path) => Some(path.to_string_lossy().into_owned()),
        MMapPath::Heap => Some("[heap]".to_owned()),
        MMapPath::Stack => Some("[stack]".to_owned()),
        MMapPath::TStack(tid) => Some(format!("[stack:{tid}]")),
        MMapPath::Vdso => Some("[vdso]".to_owned()),
        MMapPath::Vvar => Some("[vvar]".to_owned()),
        MMapPath::Vsyscall => Some("[vsyscall]".to_owned()),
        MMapPath::Rollup => Some("[rollup]".to_owned()),
        MMapPath::Vsys(key) => Some(format!("/SYSV{key:08x}")),
        MMapPath::Other(other) => Some(other.clone()),
        MMapPath::Anonymous => None,
    }
}

pub fn render_table(areas: &[VmArea], page_size: u64) -> String {
    let mut builder = Builder::new();
    builder.push_record([
        "Start vaddr",
        "End vaddr",
        "Size",
        "Nr.pages",
        "Flags",
        "I/O paddr.",
        "Path",
    ]);
    for area in areas {
        builder.push_record([
            format!("0x{:016x}", area.start),
            // inclusive, unlike vm_end
            format!("0x{:016x}", area.end.saturating_sub(1)),
            Bytes::from(area.size()).to_string(),
            area.pages(page_size).to_string(),
            flags::vm_flags(area.flags),
            area.io_address
                .map(|address| format!("0x{address:x}"))
                .unwrap_or_default(),
            area.path.clone().unwrap_or_default(),
        ]);
    }
    builder.build().with(Style::ascii_rounded()).to_string()
}

/// The memory-map block appended to a report. Failing to enumerate the
/// areas gives a single line instead of a table.
pub fn report(process: &dyn ProcessView, page_size: u64) -> String {
    match process.memory_areas() {
        Ok(areas) => format!("{MEMORY_MAP_TITLE}\n{}", render_table(&areas, page_size)),
        Err(error) => {
            debug!("memory areas unavailable: {error}");
            format!("{MEMORY_MAP_TITLE} unavailable: {error}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fd_resolver::tests::TASK, process::KernelTask, test_image::MemoryImage};

    const MM: u64 = 0xffff_8800_0005_0000;

    fn add_area(image: &mut MemoryImage, vma: u64, start: u64, end: u64, flags: u64, next: u64) {
        let layout = KernelLayout::default();
        image.kernel_word(vma + layout.vma_start, start);
        image.kernel_word(vma + layout.vma_end, end);
        image.kernel_word(vma + layout.vma_flags, flags);
        image.kernel_word(vma + layout.vma_pgoff, 0xfee00);
        image.kernel_word(vma + layout.vma_next, next);
    }

    fn image_with_two_areas() -> MemoryImage {
        let layout = KernelLayout::default();
        let mut image = MemoryImage::new();
        image.kernel_word(TASK + layout.task_mm, MM);
        image.kernel_word(MM + layout.mm_mmap, 0xffff_8800_0006_0000);
        add_area(
            &mut image,
            0xffff_8800_0006_0000,
            0x40_0000,
            0x40_2000,
            VM_READ | VM_EXEC,
            0xffff_8800_0006_1000,
        );
        add_area(
            &mut image,
            0xffff_8800_0006_1000,
            0x7f00_0000_0000,
            0x7f00_0000_1000,
            VM_READ | VM_WRITE | VM_SHARED | VM_IO,
            0,
        );
        image
    }

    #[test]
    fn kernel_walk_follows_vm_next() {
        let image = image_with_two_areas();
        let areas = areas_in_kernel(&image, &KernelLayout::default(), TASK).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].pages(4096), 2);
        assert_eq!(areas[0].io_address, None);
        assert_eq!(areas[1].io_address, Some(0xfee0_0000));
    }

    #[test]
    fn table_has_inclusive_end_and_io_address() {
        let image = image_with_two_areas();
        let layout = KernelLayout::default();
        let task = KernelTask::new(&image, &layout, TASK);
        let text = report(&task, 4096);
        assert!(text.starts_with(MEMORY_MAP_TITLE));
        assert!(text.contains("Nr.pages"));
        assert!(text.contains("0x0000000000401fff"));
        assert!(text.contains("r-xp"));
        assert!(text.contains("rw-s io"));
        assert!(text.contains("0xfee00000"));
    }

    #[test]
    fn enumeration_failure_is_one_line() {
        let layout = KernelLayout::default();
        let mut image = MemoryImage::new();
        image.kernel_word(TASK + layout.task_mm, 0);
        let task = KernelTask::new(&image, &layout, TASK);
        let text = report(&task, 4096);
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("kernel thread"), "{text}");
    }

    #[test]
    fn area_list_pointing_past_the_top_of_memory_ends_in_an_error() {
        let layout = KernelLayout::default();
        let mut image = image_with_two_areas();
        image.kernel_word(0xffff_8800_0006_1000 + layout.vma_next, 0xffff_ffff_ffff_fff8);
        assert!(areas_in_kernel(&image, &layout, TASK).unwrap_err().is_dereference());
        let task = KernelTask::new(&image, &layout, TASK);
        assert_eq!(report(&task, 4096).lines().count(), 1);

        image.kernel_word(TASK + layout.task_mm, u64::MAX);
        assert!(areas_in_kernel(&image, &layout, TASK).is_err());
    }
}
