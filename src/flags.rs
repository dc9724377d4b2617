//! Translations from raw integers to symbolic names.
//!
//! Every function here is total: values nobody knows a name for are still
//! rendered, just numerically.

use crate::types::SocketParam;
use nix::libc;

// kernel side constants, not exported to userland
pub mod kernel {
    // include/linux/net.h, bit numbers in struct socket's flags
    pub const SOCK_ASYNC_NOSPACE: u64 = 0;
    pub const SOCK_ASYNC_WAITDATA: u64 = 1;
    pub const SOCK_NOSPACE: u64 = 2;
    pub const SOCK_PASSCRED: u64 = 3;
    pub const SOCK_PASSSEC: u64 = 4;

    // include/linux/mm.h
    pub const VM_READ: u64 = 0x0000_0001;
    pub const VM_WRITE: u64 = 0x0000_0002;
    pub const VM_EXEC: u64 = 0x0000_0004;
    pub const VM_SHARED: u64 = 0x0000_0008;
    pub const VM_GROWSDOWN: u64 = 0x0000_0100;
    pub const VM_PFNMAP: u64 = 0x0000_0400;
    pub const VM_LOCKED: u64 = 0x0000_2000;
    pub const VM_IO: u64 = 0x0000_4000;
    pub const VM_DONTCOPY: u64 = 0x0002_0000;
    pub const VM_HUGETLB: u64 = 0x0040_0000;
}

fn bitmask_names(value: u64, definitions: &[(u64, &'static str)]) -> Vec<String> {
    let mut names = Vec::new();
    let mut known = 0u64;
    for (bit, name) in definitions {
        if *bit != 0 && value & bit == *bit {
            names.push((*name).to_owned());
            known |= bit;
        }
    }
    let unknown = value & !known;
    if unknown != 0 {
        names.push(format!("unknown 0x{unknown:x}"));
    }
    names
}

fn join_or(names: Vec<String>, empty: &str) -> String {
    if names.is_empty() {
        empty.to_owned()
    } else {
        names.join("|")
    }
}

fn unrecognized(value: u64) -> String {
    format!("{} (unrecognized value)", value as i64)
}

const MMAP_FLAGS: &[(u64, &str)] = &[
    (libc::MAP_SHARED as u64, "MAP_SHARED"),
    (libc::MAP_PRIVATE as u64, "MAP_PRIVATE"),
    (libc::MAP_FIXED as u64, "MAP_FIXED"),
    (libc::MAP_ANONYMOUS as u64, "MAP_ANONYMOUS"),
    #[cfg(target_arch = "x86_64")]
    (libc::MAP_32BIT as u64, "MAP_32BIT"),
    (libc::MAP_GROWSDOWN as u64, "MAP_GROWSDOWN"),
    (libc::MAP_DENYWRITE as u64, "MAP_DENYWRITE"),
    (libc::MAP_EXECUTABLE as u64, "MAP_EXECUTABLE"),
    (libc::MAP_LOCKED as u64, "MAP_LOCKED"),
    (libc::MAP_NORESERVE as u64, "MAP_NORESERVE"),
    (libc::MAP_POPULATE as u64, "MAP_POPULATE"),
    (libc::MAP_NONBLOCK as u64, "MAP_NONBLOCK"),
    (libc::MAP_STACK as u64, "MAP_STACK"),
    (libc::MAP_HUGETLB as u64, "MAP_HUGETLB"),
    (libc::MAP_SYNC as u64, "MAP_SYNC"),
    (libc::MAP_FIXED_NOREPLACE as u64, "MAP_FIXED_NOREPLACE"),
];

pub fn mmap_flags(value: u64) -> String {
    join_or(bitmask_names(value, MMAP_FLAGS), "0")
}

pub fn is_anonymous_mapping(value: u64) -> bool {
    value & libc::MAP_ANONYMOUS as u64 != 0
}

pub fn mmap_prot(value: u64) -> String {
    let definitions = [
        (libc::PROT_READ as u64, "PROT_READ"),
        (libc::PROT_WRITE as u64, "PROT_WRITE"),
        (libc::PROT_EXEC as u64, "PROT_EXEC"),
        (libc::PROT_GROWSDOWN as u64, "PROT_GROWSDOWN"),
        (libc::PROT_GROWSUP as u64, "PROT_GROWSUP"),
    ];
    join_or(bitmask_names(value, &definitions), "PROT_NONE")
}

pub fn socket_domain(value: u64) -> String {
    let name = match value as i32 {
        libc::AF_UNSPEC => "AF_UNSPEC",
        libc::AF_UNIX => "AF_UNIX",
        libc::AF_INET => "AF_INET",
        libc::AF_AX25 => "AF_AX25",
        libc::AF_IPX => "AF_IPX",
        libc::AF_APPLETALK => "AF_APPLETALK",
        libc::AF_X25 => "AF_X25",
        libc::AF_INET6 => "AF_INET6",
        libc::AF_KEY => "AF_KEY",
        libc::AF_NETLINK => "AF_NETLINK",
        libc::AF_PACKET => "AF_PACKET",
        libc::AF_CAN => "AF_CAN",
        libc::AF_BLUETOOTH => "AF_BLUETOOTH",
        libc::AF_ALG => "AF_ALG",
        libc::AF_VSOCK => "AF_VSOCK",
        _ => return unrecognized(value),
    };
    name.to_owned()
}

pub fn socket_type(value: u64) -> String {
    // lower bits hold the base type, the rest are creation flags
    let base = (value & 0xf) as i32;
    let base = match base {
        libc::SOCK_STREAM => "SOCK_STREAM",
        libc::SOCK_DGRAM => "SOCK_DGRAM",
        libc::SOCK_RAW => "SOCK_RAW",
        libc::SOCK_RDM => "SOCK_RDM",
        libc::SOCK_SEQPACKET => "SOCK_SEQPACKET",
        libc::SOCK_DCCP => "SOCK_DCCP",
        libc::SOCK_PACKET => "SOCK_PACKET",
        _ => return unrecognized(value),
    };
    let mut names = vec![base.to_owned()];
    names.extend(bitmask_names(
        value & !0xf,
        &[
            (libc::SOCK_NONBLOCK as u64, "SOCK_NONBLOCK"),
            (libc::SOCK_CLOEXEC as u64, "SOCK_CLOEXEC"),
        ],
    ));
    names.join("|")
}

pub fn ip_protocol(value: u64) -> String {
    let name = match value as i32 {
        0 => "default",
        libc::IPPROTO_ICMP => "IPPROTO_ICMP",
        libc::IPPROTO_IGMP => "IPPROTO_IGMP",
        libc::IPPROTO_TCP => "IPPROTO_TCP",
        libc::IPPROTO_UDP => "IPPROTO_UDP",
        libc::IPPROTO_IPV6 => "IPPROTO_IPV6",
        libc::IPPROTO_ICMPV6 => "IPPROTO_ICMPV6",
        libc::IPPROTO_SCTP => "IPPROTO_SCTP",
        libc::IPPROTO_UDPLITE => "IPPROTO_UDPLITE",
        libc::IPPROTO_RAW => "IPPROTO_RAW",
        _ => return unrecognized(value),
    };
    name.to_owned()
}

pub fn socket_param(param: SocketParam, value: u64) -> String {
    match param {
        SocketParam::Domain => socket_domain(value),
        SocketParam::Type => socket_type(value),
        SocketParam::Protocol => ip_protocol(value),
    }
}

/// Flags of the kernel's `struct socket`, stored as bit numbers.
pub fn socket_struct_flags(value: u64) -> String {
    use self::kernel::*;
    let definitions = [
        (1u64 << SOCK_ASYNC_NOSPACE, "SOCK_ASYNC_NOSPACE"),
        (1u64 << SOCK_ASYNC_WAITDATA, "SOCK_ASYNC_WAITDATA"),
        (1u64 << SOCK_NOSPACE, "SOCK_NOSPACE"),
        (1u64 << SOCK_PASSCRED, "SOCK_PASSCRED"),
        (1u64 << SOCK_PASSSEC, "SOCK_PASSSEC"),
    ];
    join_or(bitmask_names(value, &definitions), "0")
}

pub fn msg_flags(value: u64) -> String {
    let definitions = [
        (libc::MSG_OOB as u64, "MSG_OOB"),
        (libc::MSG_PEEK as u64, "MSG_PEEK"),
        (libc::MSG_DONTROUTE as u64, "MSG_DONTROUTE"),
        (libc::MSG_CTRUNC as u64, "MSG_CTRUNC"),
        (libc::MSG_TRUNC as u64, "MSG_TRUNC"),
        (libc::MSG_DONTWAIT as u64, "MSG_DONTWAIT"),
        (libc::MSG_EOR as u64, "MSG_EOR"),
        (libc::MSG_WAITALL as u64, "MSG_WAITALL"),
        (libc::MSG_NOSIGNAL as u64, "MSG_NOSIGNAL"),
        (libc::MSG_MORE as u64, "MSG_MORE"),
        (libc::MSG_WAITFORONE as u64, "MSG_WAITFORONE"),
        (libc::MSG_CMSG_CLOEXEC as u64, "MSG_CMSG_CLOEXEC"),
    ];
    join_or(bitmask_names(value, &definitions), "0")
}

/// `r-xp` like /proc/<pid>/maps, followed by the flags maps does not show.
pub fn vm_flags(value: u64) -> String {
    use self::kernel::*;
    let mut text = String::with_capacity(4);
    text.push(if value & VM_READ != 0 { 'r' } else { '-' });
    text.push(if value & VM_WRITE != 0 { 'w' } else { '-' });
    text.push(if value & VM_EXEC != 0 { 'x' } else { '-' });
    text.push(if value & VM_SHARED != 0 { 's' } else { 'p' });
    let extras = [
        (VM_IO, "io"),
        (VM_PFNMAP, "pfnmap"),
        (VM_GROWSDOWN, "growsdown"),
        (VM_LOCKED, "locked"),
        (VM_DONTCOPY, "dontcopy"),
        (VM_HUGETLB, "hugetlb"),
    ];
    for (bit, name) in extras {
        if value & bit != 0 {
            text.push(' ');
            text.push_str(name);
        }
    }
    text
}
