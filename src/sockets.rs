//! Decoders for the socket structures syscalls take by pointer.

use std::net::{Ipv4Addr, Ipv6Addr};

use log::debug;
use nix::libc;

use crate::{
    errors::DecodeError,
    flags,
    introspection::{AddressSpace, Introspector},
    utilities::{hex_dump, printable},
};

/// Larger than any sockaddr_storage; longer lengths are clamped.
pub const MAX_SOCKADDR_LEN: u64 = 128;
pub const MAX_IOVECS: u64 = 8;
pub const IOVEC_PREVIEW: u64 = 64;

// struct msghdr on x86-64
const MSG_NAME: u64 = 0;
const MSG_NAMELEN: u64 = 8;
const MSG_IOV: u64 = 16;
const MSG_IOVLEN: u64 = 24;
const MSG_CONTROL: u64 = 32;
const MSG_CONTROLLEN: u64 = 40;
const MSG_FLAGS: u64 = 48;
const IOVEC_SIZE: u64 = 16;

fn family_of(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Decodes `len` bytes of socket address at `address`.
pub fn decode_sockaddr<I: Introspector + ?Sized>(
    engine: &I,
    space: AddressSpace,
    address: u64,
    len: u64,
) -> Result<String, DecodeError> {
    if len < 2 {
        return Ok(format!(
            "length {len} is shorter than the address family"
        ));
    }
    let clamped = len.min(MAX_SOCKADDR_LEN);
    let mut bytes = vec![0u8; clamped as usize];
    engine.read(space, address, &mut bytes)?;
    let family = family_of(&bytes);
    let family_name = flags::socket_domain(family as u64);
    let data = &bytes[2..];
    let text = match family as i32 {
        libc::AF_INET if data.len() >= 6 => {
            let port = u16::from_be_bytes([data[0], data[1]]);
            let ip = Ipv4Addr::new(data[2], data[3], data[4], data[5]);
            format!("{family_name} {ip}:{port}")
        }
        libc::AF_INET6 if data.len() >= 26 => {
            let port = u16::from_be_bytes([data[0], data[1]]);
            let flowinfo = u32::from_be_bytes([data[2], data[3], data[4], data[5]]);
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&data[6..22]);
            let ip = Ipv6Addr::from(octets);
            let scope_id = u32::from_le_bytes([data[22], data[23], data[24], data[25]]);
            format!("{family_name} [{ip}]:{port} flowinfo {flowinfo} scope_id {scope_id}")
        }
        libc::AF_UNIX => match data.first() {
            None => format!("{family_name} unnamed"),
            // abstract namespace
            Some(0) => format!("{family_name} @{}", printable(trim_nul(&data[1..]))),
            Some(_) => format!("{family_name} {:?}", printable(trim_nul(data))),
        },
        libc::AF_NETLINK if data.len() >= 10 => {
            let pid = u32::from_le_bytes([data[2], data[3], data[4], data[5]]);
            let groups = u32::from_le_bytes([data[6], data[7], data[8], data[9]]);
            format!("{family_name} pid {pid} groups 0x{groups:x}")
        }
        _ => format!("{family_name} data: {}", hex_dump(data)),
    };
    if len > MAX_SOCKADDR_LEN {
        return Ok(format!("{text} (length {len} clamped to {MAX_SOCKADDR_LEN})"));
    }
    Ok(text)
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|byte| *byte == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Decodes a `struct msghdr`. Failures inside it are reported inline and
/// raise `dereference_failed`; only an unreadable header itself is an `Err`.
pub fn decode_msghdr<I: Introspector + ?Sized>(
    engine: &I,
    space: AddressSpace,
    address: u64,
    dereference_failed: &mut bool,
) -> Result<String, DecodeError> {
    let name = engine.read_pointer(space, address.wrapping_add(MSG_NAME))?;
    let namelen = engine.read_unsigned(space, address.wrapping_add(MSG_NAMELEN), 4)?;
    let iov = engine.read_pointer(space, address.wrapping_add(MSG_IOV))?;
    let iovlen = engine.read_unsigned(space, address.wrapping_add(MSG_IOVLEN), 8)?;
    let control = engine.read_pointer(space, address.wrapping_add(MSG_CONTROL))?;
    let controllen = engine.read_unsigned(space, address.wrapping_add(MSG_CONTROLLEN), 8)?;
    let msg_flags = engine.read_unsigned(space, address.wrapping_add(MSG_FLAGS), 4)?;

    let mut lines = Vec::new();
    let mut note_failure = |error: DecodeError| -> String {
        debug!("msghdr at 0x{address:x}: {error}");
        *dereference_failed = true;
        format!("cannot dereference: {error}")
    };

    let name_text = if name == 0 {
        "NULL".to_owned()
    } else {
        match decode_sockaddr(engine, space, name, namelen) {
            Ok(text) => format!("0x{name:x} -> {text}"),
            Err(error) => format!("0x{name:x} {}", note_failure(error)),
        }
    };
    lines.push(format!("msg_name: {name_text} (namelen {namelen})"));

    lines.push(format!("msg_iov: 0x{iov:x} msg_iovlen: {iovlen}"));
    if iov != 0 {
        for index in 0..iovlen.min(MAX_IOVECS) {
            let entry = iov.wrapping_add(index * IOVEC_SIZE);
            let text = read_iovec(engine, space, entry).unwrap_or_else(&mut note_failure);
            lines.push(format!("\t[{index}] {text}"));
        }
        if iovlen > MAX_IOVECS {
            lines.push(format!("\t... {} more", iovlen - MAX_IOVECS));
        }
    }

    lines.push(format!(
        "msg_control: 0x{control:x} msg_controllen: {controllen}"
    ));
    lines.push(format!("msg_flags: {}", flags::msg_flags(msg_flags)));
    Ok(lines.join("\n"))
}

fn read_iovec<I: Introspector + ?Sized>(
    engine: &I,
    space: AddressSpace,
    entry: u64,
) -> Result<String, DecodeError> {
    let base = engine.read_pointer(space, entry)?;
    let len = engine.read_unsigned(space, entry.wrapping_add(8), 8)?;
    let mut preview = vec![0u8; len.min(IOVEC_PREVIEW) as usize];
    if base != 0 {
        engine.read(space, base, &mut preview)?;
    }
    let mut text = format!(
        "base 0x{base:x} len {len} hex: {} string: {:?}",
        hex_dump(&preview),
        printable(&preview)
    );
    if len > IOVEC_PREVIEW {
        text.push_str(" ...");
    }
    Ok(text)
}
