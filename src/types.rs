use crate::flags;
use std::fmt::Display;
use syscalls::x86_64::Sysno;

/// Identifier of the page-table hierarchy that translates the target's
/// user addresses (cr3 on x86-64, the pid for a ptraced process).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct AddressSpaceRoot(pub u64);

impl Display for AddressSpaceRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerDirection {
    // kernel reads what the caller filled in
    UserRead,
    // kernel fills it in, nothing meaningful at entry
    UserWrite,
    Unspecified,
}

impl PointerDirection {
    pub fn annotation(&self) -> &'static str {
        match self {
            PointerDirection::UserRead | PointerDirection::UserWrite => "__user",
            PointerDirection::Unspecified => "",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketParam {
    Domain,
    Type,
    Protocol,
}

/// Where the length of a socket address comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SockaddrLength {
    // the register holds the length
    Value(usize),
    // the register points at the length (accept, getsockname, ...)
    Pointer(usize),
    Absent,
}

/// What an argument means beyond its C type, fixed when the signature map is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SemanticRole {
    Plain,
    FileDescriptor,
    MmapFlags,
    MmapProt,
    MsgFlags,
    // mmap's fd and pgoff, meaningless for anonymous mappings
    MmapBacking,
    SocketParam(SocketParam),
    FilenamePointer,
    BufferPointer { length_index: usize },
    StringArrayPointer,
    SockaddrPointer { length: SockaddrLength },
    MsghdrPointer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgDescriptor {
    pub index: usize,
    pub name: &'static str,
    pub declared_type: &'static str,
    pub is_pointer: bool,
    pub direction: PointerDirection,
    pub role: SemanticRole,
}

impl ArgDescriptor {
    pub fn display_name(&self) -> &'static str {
        if self.name.is_empty() {
            "unknown"
        } else {
            self.name
        }
    }

    /// The argument as it reads in a C prototype.
    pub fn prototype(&self) -> String {
        let mut text = String::from(self.declared_type);
        if self.is_pointer {
            let annotation = self.direction.annotation();
            if !annotation.is_empty() {
                text.push(' ');
                text.push_str(annotation);
            }
            text.push_str(" *");
        } else {
            text.push(' ');
        }
        text.push_str(self.name);
        text
    }
}

#[derive(Clone, Debug)]
pub struct SyscallDescriptor {
    pub sysno: Sysno,
    pub return_type: &'static str,
    pub args: Vec<ArgDescriptor>,
}

impl SyscallDescriptor {
    pub fn number(&self) -> u64 {
        self.sysno.id() as u64
    }

    pub fn name(&self) -> &'static str {
        self.sysno.name()
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    pub fn signature(&self) -> String {
        let args = self
            .args
            .iter()
            .map(ArgDescriptor::prototype)
            .collect::<Vec<_>>();
        let args = if args.is_empty() {
            "void".to_owned()
        } else {
            args.join(", ")
        };
        format!("{} sys_{}({})", self.return_type, self.name(), args)
    }

    pub fn is_memory_mapping(&self) -> bool {
        matches!(
            self.sysno,
            Sysno::mmap | Sysno::munmap | Sysno::mremap | Sysno::remap_file_pages
        )
    }
}

/// One captured syscall entry. Registers stay in the hex form the host
/// handed over; the binder parses them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyscallInvocation {
    pub number: u64,
    pub registers: [Option<String>; 6],
    pub root: AddressSpaceRoot,
}

impl SyscallInvocation {
    pub fn new(number: u64, registers: [Option<String>; 6], root: AddressSpaceRoot) -> Self {
        SyscallInvocation {
            number,
            registers,
            root,
        }
    }

    pub fn from_values(number: u64, values: [u64; 6], root: AddressSpaceRoot) -> Self {
        SyscallInvocation {
            number,
            registers: values.map(|value| Some(format!("{value:x}"))),
            root,
        }
    }

    // rdi, rsi, rdx, r10, r8, r9
    pub fn from_registers(registers: &nix::libc::user_regs_struct, root: AddressSpaceRoot) -> Self {
        SyscallInvocation::from_values(
            registers.orig_rax,
            [
                registers.rdi,
                registers.rsi,
                registers.rdx,
                registers.r10,
                registers.r8,
                registers.r9,
            ],
            root,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    RegularFile,
    Socket,
    Unknown,
}

/// A file descriptor resolved to the object behind it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileObjectView {
    pub descriptor: i32,
    pub kind: FileKind,
    pub path: Option<String>,
    pub socket_type: Option<u64>,
    pub socket_flags: Option<u64>,
    pub detail: Option<String>,
}

impl FileObjectView {
    pub fn regular_file(descriptor: i32, path: Option<String>) -> Self {
        FileObjectView {
            descriptor,
            kind: FileKind::RegularFile,
            path,
            socket_type: None,
            socket_flags: None,
            detail: None,
        }
    }

    pub fn socket(descriptor: i32, socket_type: Option<u64>, socket_flags: Option<u64>) -> Self {
        FileObjectView {
            descriptor,
            kind: FileKind::Socket,
            path: None,
            socket_type,
            socket_flags,
            detail: None,
        }
    }

    pub fn unknown(descriptor: i32, detail: impl Into<String>) -> Self {
        FileObjectView {
            descriptor,
            kind: FileKind::Unknown,
            path: None,
            socket_type: None,
            socket_flags: None,
            detail: Some(detail.into()),
        }
    }
}

impl Display for FileObjectView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FileKind::Socket => {
                write!(f, "(socket) -> type: ")?;
                match self.socket_type {
                    Some(socket_type) => write!(f, "{}", flags::socket_type(socket_type))?,
                    None => write!(f, "unavailable")?,
                }
                write!(f, " flags: ")?;
                match self.socket_flags {
                    Some(socket_flags) => write!(f, "{}", flags::socket_struct_flags(socket_flags)),
                    None => write!(f, "unavailable"),
                }
            }
            FileKind::RegularFile => match &self.path {
                Some(path) => write!(f, "{path:?}"),
                None => write!(f, "no filename"),
            },
            FileKind::Unknown => write!(
                f,
                "(unknown) {}",
                self.detail.as_deref().unwrap_or("unclassified file object")
            ),
        }
    }
}

/// One rendered argument. Sub-text of pointer recursion is embedded in
/// `rendered_text` with its own line breaks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedLine {
    pub argument_name: String,
    pub rendered_text: String,
    /// Always 1: nested output lives inside `rendered_text`, never in
    /// lines of its own.
    pub depth: usize,
}

impl DecodedLine {
    pub fn new(argument_name: impl Into<String>, rendered_text: impl Into<String>) -> Self {
        DecodedLine {
            argument_name: argument_name.into(),
            rendered_text: rendered_text.into(),
            depth: 1,
        }
    }
}

/// Everything produced for one invocation, in output order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub header: String,
    pub notices: Vec<String>,
    pub lines: Vec<DecodedLine>,
    pub memory_map: Option<String>,
    pub diagnostics: Vec<String>,
}

impl DecodeReport {
    /// Every line of the report as plain text.
    pub fn text_lines(&self) -> Vec<String> {
        let mut output = vec![self.header.clone()];
        output.extend(self.notices.iter().cloned());
        for line in &self.lines {
            let indent = "\t".repeat(line.depth);
            let nested = format!("\n{indent}\t");
            output.push(format!(
                "{indent}{}: {}",
                line.argument_name,
                line.rendered_text.replace('\n', &nested)
            ));
        }
        if let Some(memory_map) = &self.memory_map {
            output.push(memory_map.clone());
        }
        output.extend(self.diagnostics.iter().cloned());
        output
    }
}

pub enum Bytes {
    Norm(u64),
    Kilo(f64),
    Mega(f64),
    Giga(f64),
}

impl Display for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bytes::Norm(bytes) => write!(f, "{bytes} B"),
            Bytes::Kilo(bytes) => write!(f, "{bytes:.1} KiB"),
            Bytes::Mega(bytes) => write!(f, "{bytes:.1} MiB"),
            Bytes::Giga(bytes) => write!(f, "{bytes:.1} GiB"),
        }
    }
}

impl From<u64> for Bytes {
    fn from(value: u64) -> Self {
        let value_float = value as f64;
        if (value_float / 1_073_741_824.0) >= 1.0 {
            Bytes::Giga(value_float / 1_073_741_824.0)
        } else if (value_float / 1_048_576.0) >= 1.0 {
            Bytes::Mega(value_float / 1_048_576.0)
        } else if (value_float / 1_024.0) >= 1.0 {
            Bytes::Kilo(value_float / 1_024.0)
        } else {
            Bytes::Norm(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_view_never_shows_a_path() {
        let view = FileObjectView::socket(3, Some(1), Some(0));
        let text = view.to_string();
        assert!(text.starts_with("(socket) -> type: SOCK_STREAM"));
        assert!(text.contains("flags: "));
        assert!(!text.contains('"'));
    }

    #[test]
    fn regular_file_without_dentry_has_no_filename() {
        assert_eq!(FileObjectView::regular_file(4, None).to_string(), "no filename");
        assert_eq!(
            FileObjectView::regular_file(4, Some("passwd".into())).to_string(),
            "\"passwd\""
        );
    }

    #[test]
    fn bytes_pick_the_largest_unit() {
        assert_eq!(Bytes::from(512).to_string(), "512 B");
        assert_eq!(Bytes::from(8192).to_string(), "8.0 KiB");
        assert_eq!(Bytes::from(3 * 1_048_576).to_string(), "3.0 MiB");
    }

    #[test]
    fn nested_text_is_indented_under_its_argument() {
        let report = DecodeReport {
            header: "open: long sys_open(...)".into(),
            lines: vec![DecodedLine::new("filename", "0x10 ->\nchar: 47")],
            ..Default::default()
        };
        assert_eq!(
            report.text_lines(),
            vec![
                "open: long sys_open(...)".to_owned(),
                "\tfilename: 0x10 ->\n\t\tchar: 47".to_owned(),
            ]
        );
    }
}
