use crate::{
    errors::DecodeError,
    types::{ArgDescriptor, SyscallDescriptor, SyscallInvocation},
};

/// Number of argument registers of the x86-64 syscall convention.
pub const ARGUMENT_REGISTERS: usize = 6;

/// Parses one register as the host hands it over: hex, `0x` prefix optional.
pub fn parse_register(index: usize, text: Option<&str>) -> Result<u64, DecodeError> {
    let text = text.ok_or(DecodeError::MissingRegister { index })?;
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).map_err(|_| DecodeError::MalformedRegister {
        index,
        value: text.to_owned(),
    })
}

/// Pairs every declared argument with the register that carries it, in order.
/// Registers past the declared arity are never looked at.
pub fn bind<'d>(
    invocation: &SyscallInvocation,
    descriptor: &'d SyscallDescriptor,
) -> Vec<(&'d ArgDescriptor, Result<u64, DecodeError>)> {
    descriptor
        .args
        .iter()
        .take(ARGUMENT_REGISTERS)
        .map(|arg| {
            let register = invocation
                .registers
                .get(arg.index)
                .and_then(|register| register.as_deref());
            (arg, parse_register(arg.index, register))
        })
        .collect()
}

/// Value of another argument of the same invocation, used for lengths.
pub fn sibling(invocation: &SyscallInvocation, index: usize) -> Result<u64, DecodeError> {
    parse_register(
        index,
        invocation
            .registers
            .get(index)
            .and_then(|register| register.as_deref()),
    )
}
