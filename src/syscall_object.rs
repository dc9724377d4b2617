//! Decoding of one captured syscall invocation.
//!
//! Every argument is decoded on its own: a failing cast, an unreadable page
//! or a broken descriptor chain becomes text on that argument's line and the
//! next argument is decoded regardless.

use std::panic::{self, AssertUnwindSafe};

use log::{debug, trace};
use syscalls::x86_64::Sysno;

use crate::{
    errors::DecodeError,
    flags,
    introspection::{AddressSpace, Introspector, TypedCursor},
    memory_map,
    process::ProcessView,
    register_binder::{self, ARGUMENT_REGISTERS},
    sockets::{self, MAX_SOCKADDR_LEN},
    syscall_skeleton_map,
    types::{
        ArgDescriptor, DecodeReport, DecodedLine, SemanticRole, SockaddrLength, SyscallInvocation,
    },
    utilities::{hex_dump, printable},
};

pub const MAX_STRING_ARRAY: usize = 1024;

// buffers are read a page at a time so a wild count fails before it allocates
const BUFFER_CHUNK: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Cap on buffer dumps. `None` dumps the whole buffer.
    pub buffer_limit: Option<u64>,
    pub string_limit: usize,
    pub memory_map: bool,
    pub page_size: u64,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            buffer_limit: None,
            string_limit: 256,
            memory_map: true,
            page_size: 4096,
        }
    }
}

/// Decodes `invocation`. Never fails: whatever goes wrong ends up as text
/// in the report.
pub fn decode<I: Introspector + ?Sized>(
    engine: &I,
    process: &dyn ProcessView,
    invocation: &SyscallInvocation,
    config: &DecodeConfig,
) -> DecodeReport {
    let mut report = DecodeReport::default();
    let mut object = SyscallObject::new(engine, process, invocation, config);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| object.decode_into(&mut report)));
    if let Err(payload) = outcome {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|reason| reason.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown failure".to_owned());
        report.diagnostics.push(format!("Exception in decode: {reason}"));
    }
    report
}

/// State of one decode. Nothing here outlives the invocation.
pub struct SyscallObject<'a, I: Introspector + ?Sized> {
    engine: &'a I,
    process: &'a dyn ProcessView,
    invocation: &'a SyscallInvocation,
    config: &'a DecodeConfig,
    anonymous_mapping: bool,
    want_memory_map: bool,
}

impl<'a, I: Introspector + ?Sized> SyscallObject<'a, I> {
    pub fn new(
        engine: &'a I,
        process: &'a dyn ProcessView,
        invocation: &'a SyscallInvocation,
        config: &'a DecodeConfig,
    ) -> Self {
        SyscallObject {
            engine,
            process,
            invocation,
            config,
            anonymous_mapping: false,
            want_memory_map: false,
        }
    }

    fn user_space(&self) -> AddressSpace {
        AddressSpace::User(self.invocation.root)
    }

    pub fn decode_into(&mut self, report: &mut DecodeReport) {
        let number = self.invocation.number;
        let descriptor = match syscall_skeleton_map::lookup(number)
            .ok_or(DecodeError::UnknownSyscall(number))
        {
            Ok(descriptor) => descriptor,
            Err(error) => {
                debug!("{error}");
                self.dump_registers(report);
                return;
            }
        };
        debug!("decoding {} with root {}", descriptor.name(), self.invocation.root);
        report.header = format!("{}: {}", descriptor.name(), descriptor.signature());
        for (arg, value) in register_binder::bind(self.invocation, descriptor) {
            let rendered = match value {
                Ok(value) => match self.decode_argument(arg, value) {
                    Ok(text) => text,
                    Err(error) => {
                        debug!("{}: {error}", arg.display_name());
                        if error.is_dereference() {
                            self.want_memory_map = true;
                        }
                        format!("0x{value:x} exception: {error}")
                    }
                },
                Err(error) => format!("skipped: {error}"),
            };
            report
                .lines
                .push(DecodedLine::new(arg.display_name(), rendered));
        }
        if self.config.memory_map && (descriptor.is_memory_mapping() || self.want_memory_map) {
            report.memory_map = Some(memory_map::report(self.process, self.config.page_size));
        }
    }

    fn dump_registers(&self, report: &mut DecodeReport) {
        let number = self.invocation.number;
        let name = usize::try_from(number)
            .ok()
            .and_then(Sysno::new)
            .map_or("unknown", |sysno| sysno.name());
        report.header = format!("{name} (syscall {number})");
        report
            .notices
            .push("unknown signature, dumping registers".to_owned());
        for index in 0..ARGUMENT_REGISTERS {
            let register = self
                .invocation
                .registers
                .get(index)
                .and_then(|register| register.as_deref());
            let text = match register_binder::parse_register(index, register) {
                Ok(value) => format!("0x{value:x}"),
                Err(error) => error.to_string(),
            };
            report.lines.push(DecodedLine::new(format!("arg{index}"), text));
        }
    }

    fn decode_argument(&mut self, arg: &ArgDescriptor, value: u64) -> Result<String, DecodeError> {
        if arg.is_pointer {
            Ok(self.decode_pointer(arg, value))
        } else {
            self.decode_scalar(arg, value)
        }
    }

    fn decode_scalar(&mut self, arg: &ArgDescriptor, value: u64) -> Result<String, DecodeError> {
        // only the type is checked, the value is the register itself
        let mut cursor = TypedCursor::new(self.engine);
        cursor.set_address(0);
        cursor.change_type(arg.declared_type)?;
        let mut text = format!("{}: 0x{value:x}", arg.declared_type);
        match arg.role {
            SemanticRole::MmapFlags => {
                text.push_str(&format!(" ({})", flags::mmap_flags(value)));
                if flags::is_anonymous_mapping(value) {
                    self.anonymous_mapping = true;
                }
            }
            SemanticRole::MmapProt => text.push_str(&format!(" ({})", flags::mmap_prot(value))),
            SemanticRole::MsgFlags => text.push_str(&format!(" ({})", flags::msg_flags(value))),
            SemanticRole::SocketParam(param) => {
                text.push_str(&format!(" ({})", flags::socket_param(param, value)))
            }
            SemanticRole::MmapBacking if self.anonymous_mapping => {
                text.push_str(" (ignored due to MAP_ANONYMOUS)")
            }
            SemanticRole::MmapBacking if arg.name == "fd" => {
                text.push_str(&format!(" -> {}", self.resolve_fd(value)))
            }
            SemanticRole::FileDescriptor => {
                text.push_str(&format!(" -> {}", self.resolve_fd(value)))
            }
            _ => {}
        }
        Ok(text)
    }

    fn resolve_fd(&self, value: u64) -> String {
        // fd registers carry an int, the upper half is noise
        let fd = value as u32 as i32;
        match self.process.resolve_fd(fd) {
            Ok(view) => view.to_string(),
            Err(error) => {
                debug!("fd {fd} unresolved: {error}");
                format!("cannot resolve: {error}")
            }
        }
    }

    fn decode_pointer(&mut self, arg: &ArgDescriptor, value: u64) -> String {
        let mut text = format!("{}: 0x{value:x}", pointer_type(arg));
        if value == 0 {
            text.push_str(" (NULL)");
            return text;
        }
        let space = self.user_space();
        let mut cursor = TypedCursor::new(self.engine);
        cursor.set_address(value);
        if let Err(error) = cursor.change_type(arg.declared_type) {
            text.push_str(&format!(" cannot dereference: {error}"));
            return text;
        }
        match cursor.render(space) {
            Ok(rendered) => {
                text.push_str(" ->\n");
                text.push_str(&rendered);
            }
            Err(error) => {
                if error.is_dereference() {
                    self.want_memory_map = true;
                }
                text.push_str(&format!(" cannot dereference: {error}"));
                return text;
            }
        }
        let overlay = match arg.role {
            SemanticRole::FilenamePointer => self.filename(space, value),
            SemanticRole::BufferPointer { length_index } => self.buffer(space, value, length_index),
            SemanticRole::StringArrayPointer => self.string_array(arg, space, value),
            SemanticRole::SockaddrPointer { length } => self.sockaddr(space, value, length),
            SemanticRole::MsghdrPointer => {
                sockets::decode_msghdr(self.engine, space, value, &mut self.want_memory_map)
                    .map(|decoded| format!("\n{decoded}"))
            }
            _ => Ok(String::new()),
        };
        match overlay {
            Ok(overlay) => text.push_str(&overlay),
            Err(error) => {
                debug!("{} overlay failed: {error}", arg.display_name());
                self.want_memory_map = true;
                text.push_str(&format!("\nexception: {error}"));
            }
        }
        text
    }

    fn filename(&self, space: AddressSpace, address: u64) -> Result<String, DecodeError> {
        let bytes = self
            .engine
            .read_c_string(space, address, self.config.string_limit)?;
        Ok(format!(
            "\nhex: {} string: {:?}",
            hex_dump(&bytes),
            printable(&bytes)
        ))
    }

    fn buffer(
        &self,
        space: AddressSpace,
        address: u64,
        length_index: usize,
    ) -> Result<String, DecodeError> {
        let count = register_binder::sibling(self.invocation, length_index)?;
        let wanted = self
            .config
            .buffer_limit
            .map_or(count, |limit| count.min(limit));
        let bytes = self.read_bytes(space, address, wanted)?;
        let mut text = format!(
            "\nbuffer content hex (of size {count}):\n{}\nbuffer content string: {:?}",
            hex_dump(&bytes),
            printable(&bytes)
        );
        if wanted < count {
            text.push_str(&format!(" (first {wanted} of {count} bytes)"));
        }
        Ok(text)
    }

    fn read_bytes(&self, space: AddressSpace, address: u64, len: u64) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = Vec::new();
        let mut offset = 0u64;
        while offset < len {
            let chunk = (len - offset).min(BUFFER_CHUNK as u64) as usize;
            let start = bytes.len();
            bytes.resize(start + chunk, 0);
            self.engine
                .read(space, address.wrapping_add(offset), &mut bytes[start..])?;
            offset += chunk as u64;
        }
        trace!("read {len} bytes at 0x{address:x}");
        Ok(bytes)
    }

    fn string_array(
        &mut self,
        arg: &ArgDescriptor,
        space: AddressSpace,
        address: u64,
    ) -> Result<String, DecodeError> {
        // walks the array one element type at a time
        let mut cursor = TypedCursor::new(self.engine);
        cursor.set_address(address);
        cursor.change_type("char __user *")?;
        let stride = cursor.type_size() as i64;
        let mut text = String::new();
        let mut index = 0;
        loop {
            if index == MAX_STRING_ARRAY {
                text.push_str(&format!("\n... stopped after {MAX_STRING_ARRAY} entries"));
                break;
            }
            let pointer = cursor.to_u64(space)?;
            trace!("{}[{index}] at 0x{:x}", arg.display_name(), cursor.address());
            if pointer == 0 {
                break;
            }
            let entry = match self
                .engine
                .read_c_string(space, pointer, self.config.string_limit)
            {
                Ok(bytes) => format!("{:?}", String::from_utf8_lossy(&bytes)),
                Err(error) => {
                    self.want_memory_map = true;
                    format!("cannot dereference: {error}")
                }
            };
            text.push_str(&format!(
                "\n{}[{index}] @ 0x{pointer:x} -> {entry}",
                arg.display_name()
            ));
            cursor.add_to_address(stride);
            index += 1;
        }
        Ok(text)
    }

    fn sockaddr(
        &self,
        space: AddressSpace,
        address: u64,
        length: SockaddrLength,
    ) -> Result<String, DecodeError> {
        let len = match length {
            SockaddrLength::Value(index) => register_binder::sibling(self.invocation, index)?,
            SockaddrLength::Pointer(index) => {
                match register_binder::sibling(self.invocation, index)? {
                    0 => MAX_SOCKADDR_LEN,
                    pointer => {
                        let mut cursor = TypedCursor::new(self.engine);
                        cursor.set_address(pointer);
                        cursor.change_type("int")?;
                        cursor.to_u64(space)?
                    }
                }
            }
            SockaddrLength::Absent => 16,
        };
        let decoded = sockets::decode_sockaddr(self.engine, space, address, len)?;
        Ok(format!("\n{decoded}"))
    }
}

/// `const char __user *` for a `const char __user *filename`.
fn pointer_type(arg: &ArgDescriptor) -> String {
    let annotation = arg.direction.annotation();
    if annotation.is_empty() {
        format!("{} *", arg.declared_type)
    } else {
        format!("{} {annotation} *", arg.declared_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fd_resolver::tests::{open_regular_file, open_socket, task_with_fd_table, FD_ARRAY, TASK},
        introspection::{builtin_type, TypeInfo},
        kernel_layout::KernelLayout,
        memory_map::MEMORY_MAP_TITLE,
        process::KernelTask,
        test_image::{MemoryImage, USER_ROOT},
        types::FileObjectView,
    };
    use nix::libc;

    fn target() -> MemoryImage {
        let mut image = MemoryImage::new();
        task_with_fd_table(&mut image);
        open_regular_file(&mut image, 1, 0xffff_8800_1000_0000, Some("tty1"));
        open_regular_file(&mut image, 3, 0xffff_8800_1100_0000, Some("libc.so.6"));
        open_regular_file(&mut image, 4, 0xffff_8800_1200_0000, None);
        open_socket(&mut image, 5, 0xffff_8800_1300_0000, 1, 0);
        image
    }

    fn run_with(image: &MemoryImage, number: u64, values: [u64; 6], config: &DecodeConfig) -> DecodeReport {
        let layout = KernelLayout::default();
        let task = KernelTask::new(image, &layout, TASK);
        let invocation = SyscallInvocation::from_values(number, values, USER_ROOT);
        decode(image, &task, &invocation, config)
    }

    fn run(image: &MemoryImage, number: u64, values: [u64; 6]) -> DecodeReport {
        run_with(image, number, values, &DecodeConfig::default())
    }

    fn line<'r>(report: &'r DecodeReport, name: &str) -> &'r str {
        report
            .lines
            .iter()
            .find(|line| line.argument_name == name)
            .map(|line| line.rendered_text.as_str())
            .unwrap_or_else(|| panic!("no line for {name} in {report:#?}"))
    }

    #[test]
    fn open_shows_path_flags_and_mode() {
        let mut image = target();
        image.map_user_string(0x4000, "/etc/passwd");
        let report = run(&image, 2, [0x4000, 0, 0o666, 0, 0, 0]);

        assert!(report.header.starts_with("open: long sys_open("), "{}", report.header);
        assert_eq!(report.lines.len(), 3);
        let filename = line(&report, "filename");
        assert!(filename.contains("hex: 2f 65 74 63 2f 70 61 73 73 77 64"), "{filename}");
        assert!(filename.contains("string: \"/etc/passwd\""), "{filename}");
        assert_eq!(line(&report, "flags"), "int: 0x0");
        assert_eq!(line(&report, "mode"), "int: 0x1b6");
        assert_eq!(report.memory_map, None);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn anonymous_mmap_ignores_fd_and_pgoff() {
        let image = target();
        let flags = (libc::MAP_PRIVATE | libc::MAP_ANONYMOUS) as u64;
        let report = run(&image, 9, [0, 0x1000, 3, flags, u64::MAX, 0]);

        assert_eq!(line(&report, "len"), "unsigned long: 0x1000");
        assert_eq!(line(&report, "prot"), "unsigned long: 0x3 (PROT_READ|PROT_WRITE)");
        assert!(line(&report, "flags").contains("MAP_ANONYMOUS"));
        for name in ["fd", "pgoff"] {
            let text = line(&report, name);
            assert!(text.ends_with("(ignored due to MAP_ANONYMOUS)"), "{text}");
            assert!(!text.contains("->"), "{text}");
        }
        let memory_map = report.memory_map.as_deref().unwrap();
        assert!(memory_map.starts_with(MEMORY_MAP_TITLE));
    }

    #[test]
    fn file_backed_mmap_resolves_its_fd() {
        let image = target();
        let report = run(&image, 9, [0, 0x2000, 1, libc::MAP_PRIVATE as u64, 3, 0]);
        assert_eq!(line(&report, "fd"), "unsigned long: 0x3 -> \"libc.so.6\"");
        assert_eq!(line(&report, "pgoff"), "unsigned long: 0x0");
        assert!(report.memory_map.is_some());
    }

    #[test]
    fn anonymous_state_does_not_leak_into_the_next_invocation() {
        let image = target();
        let anonymous = (libc::MAP_PRIVATE | libc::MAP_ANONYMOUS) as u64;
        run(&image, 9, [0, 0x1000, 3, anonymous, u64::MAX, 0]);
        let report = run(&image, 9, [0, 0x1000, 3, libc::MAP_SHARED as u64, 3, 0]);
        assert!(!line(&report, "fd").contains("ignored"));
    }

    #[test]
    fn socket_with_unknown_values_still_renders() {
        let image = target();
        let report = run(&image, 41, [4242, 14, 9999, 0, 0, 0]);
        assert_eq!(report.lines.len(), 3);
        for name in ["family", "type", "protocol"] {
            assert!(line(&report, name).contains("(unrecognized value)"));
        }
        assert_eq!(line(&report, "type"), "int: 0xe (14 (unrecognized value))");
        assert_eq!(report.memory_map, None);
    }

    #[test]
    fn socket_with_known_values() {
        let image = target();
        let report = run(&image, 41, [2, (libc::SOCK_STREAM | libc::SOCK_CLOEXEC) as u64, 0, 0, 0, 0]);
        assert_eq!(line(&report, "family"), "int: 0x2 (AF_INET)");
        assert!(line(&report, "type").ends_with("(SOCK_STREAM|SOCK_CLOEXEC)"));
        assert_eq!(line(&report, "protocol"), "int: 0x0 (default)");
    }

    #[test]
    fn unknown_syscalls_dump_six_registers() {
        let image = target();
        for number in [184, 335, 100_000] {
            let report = run(&image, number, [1, 2, 3, 4, 5, 0xdead]);
            assert_eq!(report.notices, ["unknown signature, dumping registers"]);
            assert_eq!(report.lines.len(), 6);
            for (index, line) in report.lines.iter().enumerate() {
                assert_eq!(line.argument_name, format!("arg{index}"));
                assert!(line.rendered_text.starts_with("0x"));
            }
            assert_eq!(report.lines[5].rendered_text, "0xdead");
        }
        assert_eq!(run(&image, 184, [0; 6]).header, "tuxcall (syscall 184)");
        assert_eq!(run(&image, 335, [0; 6]).header, "unknown (syscall 335)");
    }

    #[test]
    fn dereference_failure_is_inline_and_requests_the_memory_map() {
        let image = target();
        let report = run(&image, 1, [1, 0xdead_0000, 5, 0, 0, 0]);
        assert_eq!(report.lines.len(), 3);
        assert_eq!(line(&report, "fd"), "unsigned int: 0x1 -> \"tty1\"");
        assert!(line(&report, "buf").contains("cannot dereference"));
        assert_eq!(line(&report, "count"), "size_t: 0x5");
        assert!(report.memory_map.is_some());
    }

    #[test]
    fn write_dumps_the_buffer() {
        let mut image = target();
        image.map_user(0x4000, b"hello");
        let report = run(&image, 1, [1, 0x4000, 5, 0, 0, 0]);
        let buf = line(&report, "buf");
        assert!(
            buf.contains("buffer content hex (of size 5):\n68 65 6c 6c 6f\nbuffer content string: \"hello\""),
            "{buf}"
        );
        assert_eq!(report.memory_map, None);
    }

    #[test]
    fn buffer_limit_truncates_the_dump() {
        let mut image = target();
        image.map_user(0x4000, b"hello");
        let config = DecodeConfig {
            buffer_limit: Some(2),
            ..DecodeConfig::default()
        };
        let report = run_with(&image, 1, [1, 0x4000, 5, 0, 0, 0], &config);
        let buf = line(&report, "buf");
        assert!(buf.contains("\n68 65\n"), "{buf}");
        assert!(buf.ends_with("(first 2 of 5 bytes)"), "{buf}");
    }

    #[test]
    fn read_buffer_is_not_dumped_at_entry() {
        let mut image = target();
        image.map_user(0x4000, b"hello");
        let report = run(&image, 0, [3, 0x4000, 5, 0, 0, 0]);
        let buf = line(&report, "buf");
        assert!(buf.contains("->"), "{buf}");
        assert!(!buf.contains("buffer content"), "{buf}");
        assert_eq!(line(&report, "fd"), "unsigned int: 0x3 -> \"libc.so.6\"");
    }

    #[test]
    fn filenames_stop_at_256_bytes() {
        let mut image = target();
        image.map_user(0x4000, &[b'a'; 300]);
        let report = run(&image, 2, [0x4000, 0, 0, 0, 0, 0]);
        let filename = line(&report, "filename");
        let expected = format!("string: \"{}\"", "a".repeat(256));
        assert!(filename.ends_with(&expected), "{filename}");
        assert_eq!(report, run(&image, 2, [0x4000, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn argv_and_envp_stop_at_the_null_pointer() {
        let mut image = target();
        image.map_user_string(0x4000, "/bin/ls");
        image.user_word(0x6000, 0x7000);
        image.user_word(0x6008, 0x7010);
        image.user_word(0x6010, 0);
        image.user_word(0x6100, 0);
        image.map_user_string(0x7000, "ls");
        image.map_user_string(0x7010, "-l");
        let report = run(&image, 59, [0x4000, 0x6000, 0x6100, 0, 0, 0]);

        let argv = line(&report, "argv");
        assert!(argv.contains("\nargv[0] @ 0x7000 -> \"ls\""), "{argv}");
        assert!(argv.contains("\nargv[1] @ 0x7010 -> \"-l\""), "{argv}");
        assert!(!argv.contains("argv[2]"), "{argv}");
        assert!(!line(&report, "envp").contains("envp["));
        assert_eq!(report, run(&image, 59, [0x4000, 0x6000, 0x6100, 0, 0, 0]));
    }

    #[test]
    fn unreadable_argv_string_is_reported_per_entry() {
        let mut image = target();
        image.map_user_string(0x4000, "/bin/ls");
        image.user_word(0x6000, 0xdead_0000);
        image.user_word(0x6008, 0);
        image.user_word(0x6100, 0);
        let report = run(&image, 59, [0x4000, 0x6000, 0x6100, 0, 0, 0]);
        assert!(line(&report, "argv").contains("argv[0] @ 0xdead0000 -> cannot dereference"));
        assert!(report.memory_map.is_some());
    }

    #[test]
    fn socket_descriptors_show_type_and_flags() {
        let mut image = target();
        let mut address = (libc::AF_INET as u16).to_le_bytes().to_vec();
        address.extend(80u16.to_be_bytes());
        address.extend([127, 0, 0, 1]);
        address.extend([0u8; 8]);
        image.map_user(0x5000, &address);
        let report = run(&image, 42, [5, 0x5000, 16, 0, 0, 0]);

        let fd = line(&report, "fd");
        assert_eq!(fd, "int: 0x5 -> (socket) -> type: SOCK_STREAM flags: 0");
        assert!(!fd.contains('"'));
        assert!(line(&report, "uservaddr").ends_with("\nAF_INET 127.0.0.1:80"));
    }

    #[test]
    fn accept_reads_the_address_length_through_its_pointer() {
        let mut image = target();
        let mut address = (libc::AF_INET as u16).to_le_bytes().to_vec();
        address.extend(443u16.to_be_bytes());
        address.extend([10, 1, 2, 3]);
        address.extend([0u8; 8]);
        image.map_user(0x5000, &address);
        image.map_user(0x5100, &16u32.to_le_bytes());
        let report = run(&image, 43, [5, 0x5000, 0x5100, 0, 0, 0]);
        assert!(line(&report, "upeer_sockaddr").ends_with("AF_INET 10.1.2.3:443"));
    }

    #[test]
    fn null_dentry_and_closed_descriptors() {
        let image = target();
        let report = run(&image, 3, [4, 0, 0, 0, 0, 0]);
        assert_eq!(line(&report, "fd"), "unsigned int: 0x4 -> no filename");
        let report = run(&image, 3, [9, 0, 0, 0, 0, 0]);
        assert!(line(&report, "fd").contains("cannot resolve"));
    }

    #[test]
    fn null_pointers_are_not_dereferenced() {
        let image = target();
        let report = run(&image, 96, [0, 0, 0, 0, 0, 0]);
        assert_eq!(line(&report, "tv"), "struct timeval __user *: 0x0 (NULL)");
        assert_eq!(report.memory_map, None);
    }

    #[test]
    fn missing_registers_skip_only_their_argument() {
        let mut image = target();
        image.map_user(0x4000, b"hello");
        let layout = KernelLayout::default();
        let task = KernelTask::new(&image, &layout, TASK);
        let invocation = SyscallInvocation::new(
            1,
            [Some("1".to_owned()), Some("0x4000".to_owned()), None, None, None, None],
            USER_ROOT,
        );
        let report = decode(&image, &task, &invocation, &DecodeConfig::default());
        assert_eq!(report.lines.len(), 3);
        assert!(line(&report, "count").starts_with("skipped: "));
        assert!(line(&report, "buf").contains("exception: "));
        assert_eq!(line(&report, "fd"), "unsigned int: 0x1 -> \"tty1\"");
    }

    #[test]
    fn unknown_types_are_noted_and_decoding_continues() {
        let mut image = target();
        image.hide_type("int");
        let report = run(&image, 41, [2, 1, 0, 0, 0, 0]);
        assert_eq!(report.lines.len(), 3);
        for line in &report.lines {
            assert!(line.rendered_text.contains("exception: "), "{line:?}");
        }
    }

    #[test]
    fn registered_types_render_through_the_engine() {
        let mut image = target();
        image.add_type(TypeInfo::structure(
            "struct timespec",
            16,
            vec![
                ("tv_sec", 0, builtin_type("long").unwrap()),
                ("tv_nsec", 8, builtin_type("long").unwrap()),
            ],
        ));
        image.user_word(0x4000, 2);
        image.user_word(0x4008, 500);
        let report = run(&image, 35, [0x4000, 0, 0, 0, 0, 0]);
        let rqtp = line(&report, "rqtp");
        assert!(rqtp.contains("tv_sec: 2"), "{rqtp}");
        assert!(rqtp.contains("tv_nsec: 500"), "{rqtp}");
    }

    fn msghdr(iov: u64, iovlen: u64) -> Vec<u8> {
        let mut header = vec![0u8; 56];
        header[16..24].copy_from_slice(&iov.to_le_bytes());
        header[24..32].copy_from_slice(&iovlen.to_le_bytes());
        header
    }

    #[test]
    fn iovec_array_at_the_top_of_memory_keeps_the_following_arguments() {
        let mut image = target();
        image.map_user(0x7000, &msghdr(0xffff_ffff_ffff_fff8, 2));
        let report = run(&image, 46, [5, 0x7000, 0, 0, 0, 0]);

        assert_eq!(report.lines.len(), 3);
        let msg = line(&report, "msg");
        assert!(msg.contains("msg_iov: 0xfffffffffffffff8 msg_iovlen: 2"), "{msg}");
        assert!(msg.contains("[0] cannot dereference"), "{msg}");
        assert!(msg.contains("[1] cannot dereference"), "{msg}");
        assert!(report.lines.iter().all(|line| line.depth == 1));
        assert!(line(&report, "flags").starts_with("unsigned: 0x0"));
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert!(report.memory_map.is_some());
    }

    #[test]
    fn torn_file_pointer_keeps_the_buffer_and_count() {
        let mut image = target();
        image.kernel_word(FD_ARRAY + 6 * 8, 0xffff_ffff_ffff_fff0);
        image.map_user(0x4000, b"hello");
        let report = run(&image, 1, [6, 0x4000, 5, 0, 0, 0]);

        assert_eq!(report.lines.len(), 3);
        assert!(line(&report, "fd").contains("cannot resolve"));
        assert!(line(&report, "buf").contains("buffer content string: \"hello\""));
        assert_eq!(line(&report, "count"), "size_t: 0x5");
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    }

    #[test]
    fn torn_vma_chain_only_costs_the_memory_map() {
        let layout = KernelLayout::default();
        let mm = 0xffff_8800_0005_0000;
        let mut image = target();
        image.kernel_word(TASK + layout.task_mm, mm);
        image.kernel_word(mm + layout.mm_mmap, 0xffff_ffff_ffff_fff8);
        let report = run(&image, 9, [0, 0x1000, 3, libc::MAP_PRIVATE as u64, 3, 0]);

        assert_eq!(report.lines.len(), 6);
        assert_eq!(line(&report, "fd"), "unsigned long: 0x3 -> \"libc.so.6\"");
        let memory_map = report.memory_map.as_deref().unwrap();
        assert!(memory_map.contains("unavailable"), "{memory_map}");
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    }

    struct Exploding;

    impl Introspector for Exploding {
        fn lookup_type(&self, name: &str) -> Result<TypeInfo, DecodeError> {
            builtin_type(name).ok_or_else(|| DecodeError::TypeCastFailure(name.to_owned()))
        }

        fn read(&self, _: AddressSpace, _: u64, _: &mut [u8]) -> Result<(), DecodeError> {
            panic!("engine lost the target")
        }

        fn symbol_address(&self, name: &str) -> Result<u64, DecodeError> {
            Err(DecodeError::SymbolNotFound(name.to_owned()))
        }
    }

    struct Orphan;

    impl ProcessView for Orphan {
        fn resolve_fd(&self, fd: i32) -> Result<FileObjectView, DecodeError> {
            Ok(FileObjectView::unknown(fd, "orphan"))
        }

        fn memory_areas(&self) -> Result<Vec<memory_map::VmArea>, DecodeError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn a_panicking_engine_becomes_a_diagnostic_line() {
        let invocation = SyscallInvocation::from_values(1, [1, 0x4000, 3, 0, 0, 0], USER_ROOT);
        let report = decode(&Exploding, &Orphan, &invocation, &DecodeConfig::default());
        assert_eq!(report.lines.len(), 1);
        assert_eq!(
            report.diagnostics,
            ["Exception in decode: engine lost the target"]
        );
    }

    #[test]
    fn text_lines_indent_nested_output() {
        let mut image = target();
        image.map_user_string(0x4000, "/tmp");
        let report = run(&image, 80, [0x4000, 0, 0, 0, 0, 0]);
        let text = report.text_lines();
        assert!(text[0].starts_with("chdir: "));
        assert!(text[1].starts_with("\tfilename: const char __user *: 0x4000 ->\n\t\t"));
    }
}
