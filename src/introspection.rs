//! The seam to the memory introspection engine.
//!
//! The engine owns address translation and type knowledge. The decoder only
//! ever asks it three things: what a type name means, what bytes live at an
//! address in some address space, and where a well-known symbol lives.

use crate::{errors::DecodeError, types::AddressSpaceRoot};

pub const POINTER_SIZE: usize = 8;

// nested structs deeper than this are elided
const MAX_RENDER_DEPTH: usize = 4;
const MAX_RENDERED_ELEMENTS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressSpace {
    Kernel,
    User(AddressSpaceRoot),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Signed,
    Unsigned,
    Char,
    Pointer,
    Array { element: Box<TypeInfo>, len: usize },
    Struct(Vec<Field>),
    // known size, unknown layout
    Opaque,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub offset: usize,
    pub ty: TypeInfo,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: String,
    pub size: usize,
    pub kind: TypeKind,
}

impl TypeInfo {
    pub fn scalar(name: &str, size: usize, kind: TypeKind) -> Self {
        TypeInfo {
            name: name.to_owned(),
            size,
            kind,
        }
    }

    pub fn char_array(len: usize) -> Self {
        TypeInfo {
            name: format!("char[{len}]"),
            size: len,
            kind: TypeKind::Array {
                element: Box::new(TypeInfo::scalar("char", 1, TypeKind::Char)),
                len,
            },
        }
    }

    pub fn structure(name: &str, size: usize, fields: Vec<(&str, usize, TypeInfo)>) -> Self {
        TypeInfo {
            name: name.to_owned(),
            size,
            kind: TypeKind::Struct(
                fields
                    .into_iter()
                    .map(|(name, offset, ty)| Field {
                        name: name.to_owned(),
                        offset,
                        ty,
                    })
                    .collect(),
            ),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Signed | TypeKind::Unsigned | TypeKind::Char | TypeKind::Pointer
        ) && self.size <= 8
    }
}

/// Drops qualifiers that do not change layout: `const char __user` is `char`.
pub fn normalize_type_name(name: &str) -> String {
    name.split_whitespace()
        .filter(|word| !matches!(*word, "const" | "volatile" | "__user" | "__force"))
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" *", "*")
}

/// C types of the x86-64 System V ABI and the kernel structs syscalls take.
pub fn builtin_type(name: &str) -> Option<TypeInfo> {
    use TypeKind::*;
    let name = normalize_type_name(name);
    if name.ends_with('*') {
        return Some(TypeInfo::scalar(&name, POINTER_SIZE, Pointer));
    }
    let int = |size| TypeInfo::scalar(&name, size, Signed);
    let uint = |size| TypeInfo::scalar(&name, size, Unsigned);
    let field_int = |name: &str, size| TypeInfo::scalar(name, size, Signed);
    let field_uint = |name: &str, size| TypeInfo::scalar(name, size, Unsigned);
    let field_ptr = || TypeInfo::scalar("void*", POINTER_SIZE, Pointer);
    let ty = match name.as_str() {
        "char" => TypeInfo::scalar(&name, 1, Char),
        "signed char" => int(1),
        "unsigned char" | "u8" | "__u8" | "uint8_t" => uint(1),
        "short" | "s16" => int(2),
        "unsigned short" | "u16" | "__u16" | "umode_t" | "sa_family_t" => uint(2),
        "int" | "s32" | "pid_t" | "key_t" | "clockid_t" | "timer_t" | "mqd_t" => int(4),
        "unsigned int" | "unsigned" | "u32" | "__u32" | "uint32_t" | "uid_t" | "gid_t"
        | "mode_t" | "socklen_t" | "qid_t" => uint(4),
        "long" | "long long" | "s64" | "ssize_t" | "off_t" | "loff_t" | "time_t" => int(8),
        "unsigned long" | "unsigned long long" | "u64" | "__u64" | "uint64_t" | "size_t"
        | "aio_context_t" => uint(8),
        "struct sockaddr" => TypeInfo::structure(
            &name,
            16,
            vec![
                ("sa_family", 0, field_uint("sa_family_t", 2)),
                ("sa_data", 2, TypeInfo::char_array(14)),
            ],
        ),
        "struct iovec" => TypeInfo::structure(
            &name,
            16,
            vec![
                ("iov_base", 0, field_ptr()),
                ("iov_len", 8, field_uint("size_t", 8)),
            ],
        ),
        "struct msghdr" | "struct user_msghdr" => TypeInfo::structure(
            &name,
            56,
            vec![
                ("msg_name", 0, field_ptr()),
                ("msg_namelen", 8, field_int("int", 4)),
                ("msg_iov", 16, field_ptr()),
                ("msg_iovlen", 24, field_uint("size_t", 8)),
                ("msg_control", 32, field_ptr()),
                ("msg_controllen", 40, field_uint("size_t", 8)),
                ("msg_flags", 48, field_uint("unsigned int", 4)),
            ],
        ),
        "struct timespec" => TypeInfo::structure(
            &name,
            16,
            vec![
                ("tv_sec", 0, field_int("time_t", 8)),
                ("tv_nsec", 8, field_int("long", 8)),
            ],
        ),
        "struct timeval" => TypeInfo::structure(
            &name,
            16,
            vec![
                ("tv_sec", 0, field_int("time_t", 8)),
                ("tv_usec", 8, field_int("long", 8)),
            ],
        ),
        "struct timezone" => TypeInfo::structure(
            &name,
            8,
            vec![
                ("tz_minuteswest", 0, field_int("int", 4)),
                ("tz_dsttime", 4, field_int("int", 4)),
            ],
        ),
        "struct pollfd" => TypeInfo::structure(
            &name,
            8,
            vec![
                ("fd", 0, field_int("int", 4)),
                ("events", 4, field_int("short", 2)),
                ("revents", 6, field_int("short", 2)),
            ],
        ),
        "struct rlimit" => TypeInfo::structure(
            &name,
            16,
            vec![
                ("rlim_cur", 0, field_uint("unsigned long", 8)),
                ("rlim_max", 8, field_uint("unsigned long", 8)),
            ],
        ),
        "struct stat" => TypeInfo::structure(
            &name,
            144,
            vec![
                ("st_dev", 0, field_uint("unsigned long", 8)),
                ("st_ino", 8, field_uint("unsigned long", 8)),
                ("st_nlink", 16, field_uint("unsigned long", 8)),
                ("st_mode", 24, field_uint("unsigned int", 4)),
                ("st_uid", 28, field_uint("unsigned int", 4)),
                ("st_gid", 32, field_uint("unsigned int", 4)),
                ("st_size", 48, field_int("long", 8)),
            ],
        ),
        "struct old_utsname" | "struct new_utsname" => TypeInfo::structure(
            &name,
            390,
            vec![
                ("sysname", 0, TypeInfo::char_array(65)),
                ("nodename", 65, TypeInfo::char_array(65)),
                ("release", 130, TypeInfo::char_array(65)),
                ("version", 195, TypeInfo::char_array(65)),
                ("machine", 260, TypeInfo::char_array(65)),
            ],
        ),
        "struct itimerval" => TypeInfo::structure(
            &name,
            32,
            vec![
                ("it_interval", 0, builtin_type("struct timeval")?),
                ("it_value", 16, builtin_type("struct timeval")?),
            ],
        ),
        "struct itimerspec" => TypeInfo::structure(
            &name,
            32,
            vec![
                ("it_interval", 0, builtin_type("struct timespec")?),
                ("it_value", 16, builtin_type("struct timespec")?),
            ],
        ),
        "struct utimbuf" => TypeInfo::structure(
            &name,
            16,
            vec![
                ("actime", 0, field_int("time_t", 8)),
                ("modtime", 8, field_int("time_t", 8)),
            ],
        ),
        "struct tms" => TypeInfo::structure(
            &name,
            32,
            vec![
                ("tms_utime", 0, field_int("long", 8)),
                ("tms_stime", 8, field_int("long", 8)),
                ("tms_cutime", 16, field_int("long", 8)),
                ("tms_cstime", 24, field_int("long", 8)),
            ],
        ),
        // packed on x86-64
        "struct epoll_event" => TypeInfo::structure(
            &name,
            12,
            vec![
                ("events", 0, field_uint("u32", 4)),
                ("data", 4, field_uint("u64", 8)),
            ],
        ),
        "struct sched_param" => {
            TypeInfo::structure(&name, 4, vec![("sched_priority", 0, field_int("int", 4))])
        }
        "struct sembuf" => TypeInfo::structure(
            &name,
            6,
            vec![
                ("sem_num", 0, field_uint("unsigned short", 2)),
                ("sem_op", 2, field_int("short", 2)),
                ("sem_flg", 4, field_int("short", 2)),
            ],
        ),
        "struct msgbuf" => TypeInfo::structure(&name, 8, vec![("mtype", 0, field_int("long", 8))]),
        "struct mq_attr" => TypeInfo::structure(
            &name,
            64,
            vec![
                ("mq_flags", 0, field_int("long", 8)),
                ("mq_maxmsg", 8, field_int("long", 8)),
                ("mq_msgsize", 16, field_int("long", 8)),
                ("mq_curmsgs", 24, field_int("long", 8)),
            ],
        ),
        "struct io_event" => TypeInfo::structure(
            &name,
            32,
            vec![
                ("data", 0, field_uint("u64", 8)),
                ("obj", 8, field_uint("u64", 8)),
                ("res", 16, field_int("s64", 8)),
                ("res2", 24, field_int("s64", 8)),
            ],
        ),
        // fixed header only, d_name follows
        "struct linux_dirent" => TypeInfo::structure(
            &name,
            18,
            vec![
                ("d_ino", 0, field_uint("unsigned long", 8)),
                ("d_off", 8, field_uint("unsigned long", 8)),
                ("d_reclen", 16, field_uint("unsigned short", 2)),
            ],
        ),
        "struct linux_dirent64" => TypeInfo::structure(
            &name,
            19,
            vec![
                ("d_ino", 0, field_uint("u64", 8)),
                ("d_off", 8, field_int("s64", 8)),
                ("d_reclen", 16, field_uint("unsigned short", 2)),
                ("d_type", 18, field_uint("unsigned char", 1)),
            ],
        ),
        "stack_t" => TypeInfo::structure(
            &name,
            24,
            vec![
                ("ss_sp", 0, field_ptr()),
                ("ss_flags", 8, field_int("int", 4)),
                ("ss_size", 16, field_uint("size_t", 8)),
            ],
        ),
        "struct __user_cap_header_struct" => TypeInfo::structure(
            &name,
            8,
            vec![
                ("version", 0, field_uint("u32", 4)),
                ("pid", 4, field_int("int", 4)),
            ],
        ),
        "struct __user_cap_data_struct" => TypeInfo::structure(
            &name,
            12,
            vec![
                ("effective", 0, field_uint("u32", 4)),
                ("permitted", 4, field_uint("u32", 4)),
                ("inheritable", 8, field_uint("u32", 4)),
            ],
        ),
        "sigset_t" => uint(8),
        "__s32" | "key_serial_t" => int(4),
        "fd_set" => TypeInfo::scalar(&name, 128, Opaque),
        "siginfo_t" | "struct siginfo" => TypeInfo::scalar(&name, 128, Opaque),
        "struct sigevent" => TypeInfo::scalar(&name, 64, Opaque),
        "struct rusage" => TypeInfo::scalar(&name, 144, Opaque),
        "struct sigaction" => TypeInfo::scalar(&name, 32, Opaque),
        "struct sysinfo" => TypeInfo::scalar(&name, 112, Opaque),
        "struct statfs" => TypeInfo::scalar(&name, 120, Opaque),
        "struct ustat" => TypeInfo::scalar(&name, 32, Opaque),
        "struct timex" => TypeInfo::scalar(&name, 208, Opaque),
        "struct shmid_ds" => TypeInfo::scalar(&name, 112, Opaque),
        "struct msqid_ds" => TypeInfo::scalar(&name, 120, Opaque),
        "struct iocb" => TypeInfo::scalar(&name, 64, Opaque),
        "struct kexec_segment" => TypeInfo::scalar(&name, 32, Opaque),
        "struct robust_list_head" => TypeInfo::scalar(&name, 24, Opaque),
        "struct perf_event_attr" => TypeInfo::scalar(&name, 64, Opaque),
        "struct __sysctl_args" => TypeInfo::scalar(&name, 80, Opaque),
        _ => return None,
    };
    Some(ty)
}

/// The introspection engine as the decoder sees it.
pub trait Introspector {
    /// Fails with `TypeCastFailure` for names the engine has no layout for.
    fn lookup_type(&self, name: &str) -> Result<TypeInfo, DecodeError>;

    /// Fills `buf` from `address`, failing with `DereferenceFailure` if any
    /// byte is not resident.
    fn read(&self, space: AddressSpace, address: u64, buf: &mut [u8]) -> Result<(), DecodeError>;

    fn symbol_address(&self, name: &str) -> Result<u64, DecodeError>;

    fn read_unsigned(&self, space: AddressSpace, address: u64, size: usize) -> Result<u64, DecodeError> {
        let mut bytes = [0u8; 8];
        let size = size.min(8);
        self.read(space, address, &mut bytes[..size])?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_pointer(&self, space: AddressSpace, address: u64) -> Result<u64, DecodeError> {
        self.read_unsigned(space, address, POINTER_SIZE)
    }

    /// Reads at most `limit` bytes, stopping before the first zero byte.
    fn read_c_string(&self, space: AddressSpace, address: u64, limit: usize) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        for offset in 0..limit as u64 {
            self.read(space, address.wrapping_add(offset), &mut byte)?;
            if byte[0] == 0 {
                break;
            }
            bytes.push(byte[0]);
        }
        Ok(bytes)
    }

    /// Generic structured rendering of the value of type `ty` at `address`.
    fn render(&self, ty: &TypeInfo, space: AddressSpace, address: u64) -> Result<String, DecodeError> {
        let mut bytes = vec![0u8; ty.size];
        self.read(space, address, &mut bytes)?;
        Ok(format_value(ty, &bytes, 0))
    }
}

fn scalar_from(bytes: &[u8]) -> u64 {
    let mut buffer = [0u8; 8];
    let len = bytes.len().min(8);
    buffer[..len].copy_from_slice(&bytes[..len]);
    u64::from_le_bytes(buffer)
}

fn sign_extend(value: u64, size: usize) -> i64 {
    if size == 0 || size >= 8 {
        return value as i64;
    }
    let shift = 64 - size * 8;
    ((value << shift) as i64) >> shift
}

fn format_value(ty: &TypeInfo, bytes: &[u8], depth: usize) -> String {
    let bytes = &bytes[..ty.size.min(bytes.len())];
    match &ty.kind {
        TypeKind::Signed => sign_extend(scalar_from(bytes), ty.size).to_string(),
        TypeKind::Unsigned => scalar_from(bytes).to_string(),
        TypeKind::Char => {
            let value = scalar_from(bytes) as u8;
            if value.is_ascii_graphic() || value == b' ' {
                format!("{value} '{}'", value as char)
            } else {
                value.to_string()
            }
        }
        TypeKind::Pointer => match scalar_from(bytes) {
            0 => "NULL".to_owned(),
            address => format!("0x{address:x}"),
        },
        TypeKind::Array { element, .. } if element.kind == TypeKind::Char => {
            let end = bytes.iter().position(|byte| *byte == 0).unwrap_or(bytes.len());
            format!("{:?}", String::from_utf8_lossy(&bytes[..end]))
        }
        TypeKind::Array { element, len } => {
            let shown = (*len).min(MAX_RENDERED_ELEMENTS);
            let mut items = Vec::with_capacity(shown);
            for index in 0..shown {
                let start = index * element.size;
                match bytes.get(start..start + element.size) {
                    Some(slice) => items.push(format_value(element, slice, depth + 1)),
                    None => break,
                }
            }
            if *len > shown {
                items.push("...".to_owned());
            }
            format!("[{}]", items.join(", "))
        }
        TypeKind::Struct(fields) => {
            if depth >= MAX_RENDER_DEPTH {
                return format!("{} {{...}}", ty.name);
            }
            let indent = "  ".repeat(depth + 1);
            let mut text = format!("{} {{", ty.name);
            for field in fields {
                let value = bytes
                    .get(field.offset..field.offset + field.ty.size)
                    .map(|slice| format_value(&field.ty, slice, depth + 1))
                    .unwrap_or_else(|| "<out of bounds>".to_owned());
                text.push_str(&format!("\n{indent}{}: {value}", field.name));
            }
            text.push_str(&format!("\n{}}}", "  ".repeat(depth)));
            text
        }
        TypeKind::Opaque => format!("{} <{} bytes>", ty.name, ty.size),
    }
}

/// A movable, retypable view on one memory location.
pub struct TypedCursor<'a, I: Introspector + ?Sized> {
    engine: &'a I,
    address: u64,
    ty: Option<TypeInfo>,
}

impl<'a, I: Introspector + ?Sized> TypedCursor<'a, I> {
    pub fn new(engine: &'a I) -> Self {
        TypedCursor {
            engine,
            address: 0,
            ty: None,
        }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn set_address(&mut self, address: u64) {
        self.address = address;
    }

    pub fn add_to_address(&mut self, offset: i64) {
        self.address = self.address.wrapping_add_signed(offset);
    }

    /// On failure the previous type stays in place.
    pub fn change_type(&mut self, name: &str) -> Result<&TypeInfo, DecodeError> {
        let ty = self.engine.lookup_type(name)?;
        Ok(self.ty.insert(ty))
    }

    pub fn type_size(&self) -> usize {
        self.ty.as_ref().map_or(0, |ty| ty.size)
    }

    fn current_type(&self) -> Result<&TypeInfo, DecodeError> {
        self.ty
            .as_ref()
            .ok_or_else(|| DecodeError::TypeCastFailure("<no type>".to_owned()))
    }

    pub fn to_u64(&self, space: AddressSpace) -> Result<u64, DecodeError> {
        let ty = self.current_type()?;
        if !ty.is_scalar() {
            return Err(DecodeError::TypeCastFailure(format!(
                "{} is not a scalar type",
                ty.name
            )));
        }
        self.engine.read_unsigned(space, self.address, ty.size)
    }

    pub fn render(&self, space: AddressSpace) -> Result<String, DecodeError> {
        let ty = self.current_type()?;
        self.engine.render(ty, space, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_image::MemoryImage;

    const USER: AddressSpace = AddressSpace::User(AddressSpaceRoot(0x1000));

    #[test]
    fn qualifiers_do_not_change_the_type() {
        assert_eq!(normalize_type_name("const char __user"), "char");
        assert_eq!(normalize_type_name("  unsigned   long "), "unsigned long");
        assert_eq!(normalize_type_name("char __user *"), "char*");
        assert_eq!(builtin_type("const struct sockaddr").map(|ty| ty.size), Some(16));
        assert!(builtin_type("struct made_up").is_none());
    }

    #[test]
    fn cursor_keeps_its_type_when_a_cast_fails() {
        let image = MemoryImage::new();
        let mut cursor = TypedCursor::new(&image);
        cursor.change_type("int").unwrap();
        assert!(matches!(
            cursor.change_type("struct nonexistent"),
            Err(DecodeError::TypeCastFailure(_))
        ));
        assert_eq!(cursor.type_size(), 4);
    }

    #[test]
    fn cursor_reads_scalars_little_endian() {
        let mut image = MemoryImage::new();
        image.map_user(0x4000, &[0x34, 0x12, 0xff, 0xff]);
        let mut cursor = TypedCursor::new(&image);
        cursor.change_type("unsigned short").unwrap();
        cursor.set_address(0x4000);
        assert_eq!(cursor.to_u64(USER).unwrap(), 0x1234);
        cursor.add_to_address(2);
        assert_eq!(cursor.to_u64(USER).unwrap(), 0xffff);
        cursor.add_to_address(2);
        assert!(cursor.to_u64(USER).unwrap_err().is_dereference());
    }

    #[test]
    fn structs_render_field_by_field() {
        let mut image = MemoryImage::new();
        let mut sockaddr = vec![2u8, 0];
        sockaddr.extend_from_slice(b"ab\0\0\0\0\0\0\0\0\0\0\0\0");
        image.map_user(0x5000, &sockaddr);
        let ty = builtin_type("struct sockaddr").unwrap();
        assert_eq!(
            image.render(&ty, USER, 0x5000).unwrap(),
            "struct sockaddr {\n  sa_family: 2\n  sa_data: \"ab\"\n}"
        );
    }

    #[test]
    fn signed_values_are_sign_extended() {
        let mut image = MemoryImage::new();
        image.map_user(0x6000, &(-3i32).to_le_bytes());
        let ty = builtin_type("int").unwrap();
        assert_eq!(image.render(&ty, USER, 0x6000).unwrap(), "-3");
    }
}
