//! Synthetic target memory for tests: byte-addressed kernel and user
//! spaces, a type registry on top of the built-in catalog, and symbols.

use crate::{
    errors::DecodeError,
    introspection::{builtin_type, normalize_type_name, AddressSpace, Introspector, TypeInfo},
    types::AddressSpaceRoot,
};
use std::collections::HashMap;

pub const USER_ROOT: AddressSpaceRoot = AddressSpaceRoot(0x1000);

#[derive(Default)]
pub struct MemoryImage {
    bytes: HashMap<(AddressSpace, u64), u8>,
    types: HashMap<String, TypeInfo>,
    hidden_types: Vec<String>,
    symbols: HashMap<String, u64>,
}

impl MemoryImage {
    pub fn new() -> Self {
        MemoryImage::default()
    }

    pub fn map(&mut self, space: AddressSpace, address: u64, data: &[u8]) {
        for (offset, byte) in data.iter().enumerate() {
            self.bytes.insert((space, address + offset as u64), *byte);
        }
    }

    pub fn map_user(&mut self, address: u64, data: &[u8]) {
        self.map(AddressSpace::User(USER_ROOT), address, data);
    }

    pub fn map_kernel(&mut self, address: u64, data: &[u8]) {
        self.map(AddressSpace::Kernel, address, data);
    }

    pub fn map_user_string(&mut self, address: u64, text: &str) {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        self.map_user(address, &data);
    }

    pub fn kernel_word(&mut self, address: u64, value: u64) {
        self.map_kernel(address, &value.to_le_bytes());
    }

    pub fn user_word(&mut self, address: u64, value: u64) {
        self.map_user(address, &value.to_le_bytes());
    }

    pub fn add_symbol(&mut self, name: &str, address: u64) {
        self.symbols.insert(name.to_owned(), address);
    }

    pub fn add_type(&mut self, ty: TypeInfo) {
        self.types.insert(normalize_type_name(&ty.name), ty);
    }

    // makes a catalog type unknown, like an engine without debug info for it
    pub fn hide_type(&mut self, name: &str) {
        self.hidden_types.push(normalize_type_name(name));
    }
}

impl Introspector for MemoryImage {
    fn lookup_type(&self, name: &str) -> Result<TypeInfo, DecodeError> {
        let normalized = normalize_type_name(name);
        if self.hidden_types.contains(&normalized) {
            return Err(DecodeError::TypeCastFailure(normalized));
        }
        self.types
            .get(&normalized)
            .cloned()
            .or_else(|| builtin_type(&normalized))
            .ok_or(DecodeError::TypeCastFailure(normalized))
    }

    fn read(&self, space: AddressSpace, address: u64, buf: &mut [u8]) -> Result<(), DecodeError> {
        for (offset, slot) in buf.iter_mut().enumerate() {
            let at = address.wrapping_add(offset as u64);
            *slot = *self
                .bytes
                .get(&(space, at))
                .ok_or_else(|| DecodeError::dereference(at, "page not present"))?;
        }
        Ok(())
    }

    fn symbol_address(&self, name: &str) -> Result<u64, DecodeError> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| DecodeError::SymbolNotFound(name.to_owned()))
    }
}
