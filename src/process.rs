use log::debug;
use nix::unistd::Pid;

use crate::{
    errors::DecodeError,
    fd_resolver,
    introspection::{AddressSpace, Introspector},
    kernel_layout::KernelLayout,
    memory_map::{self, VmArea},
    types::FileObjectView,
};

/// The process a syscall was captured in, as far as decoding needs it.
pub trait ProcessView {
    fn resolve_fd(&self, fd: i32) -> Result<FileObjectView, DecodeError>;

    fn memory_areas(&self) -> Result<Vec<VmArea>, DecodeError>;
}

/// A task found in kernel memory, walked through the engine.
pub struct KernelTask<'a, I: Introspector + ?Sized> {
    engine: &'a I,
    layout: &'a KernelLayout,
    task: u64,
}

impl<'a, I: Introspector + ?Sized> KernelTask<'a, I> {
    pub fn new(engine: &'a I, layout: &'a KernelLayout, task: u64) -> Self {
        KernelTask {
            engine,
            layout,
            task,
        }
    }

    /// The task running on the cpu whose per-cpu area starts at `gs_base`.
    pub fn current(
        engine: &'a I,
        gs_base: u64,
        layout: &'a KernelLayout,
    ) -> Result<Self, DecodeError> {
        let slot = engine
            .symbol_address(layout.current_task_symbol)?
            .wrapping_add(gs_base);
        let task = engine.read_pointer(AddressSpace::Kernel, slot)?;
        debug!("current task at 0x{task:x} (per-cpu slot 0x{slot:x})");
        if task == 0 {
            return Err(DecodeError::resolution("no current task"));
        }
        Ok(KernelTask::new(engine, layout, task))
    }
}

impl<I: Introspector + ?Sized> ProcessView for KernelTask<'_, I> {
    fn resolve_fd(&self, fd: i32) -> Result<FileObjectView, DecodeError> {
        fd_resolver::resolve_in_kernel(self.engine, self.layout, self.task, fd)
    }

    fn memory_areas(&self) -> Result<Vec<VmArea>, DecodeError> {
        memory_map::areas_in_kernel(self.engine, self.layout, self.task)
    }
}

/// A process on this machine, seen through procfs.
#[derive(Clone, Copy, Debug)]
pub struct LiveProcess {
    pub pid: Pid,
}

impl LiveProcess {
    pub fn new(pid: Pid) -> Self {
        LiveProcess { pid }
    }
}

impl ProcessView for LiveProcess {
    fn resolve_fd(&self, fd: i32) -> Result<FileObjectView, DecodeError> {
        fd_resolver::resolve_in_procfs(self.pid, fd)
    }

    fn memory_areas(&self) -> Result<Vec<VmArea>, DecodeError> {
        memory_map::areas_in_procfs(self.pid)
    }
}
