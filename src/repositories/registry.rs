//! Registry access - thin wrapper over winreg.

use super::Store;
use crate::domain::{AccessFlags, AccessMode, KeyInfo, RootKey, Variant};
use crate::error::{RegistryError, Result};
use tracing::trace;
use windows::core::PWSTR;
use windows::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_PATH_NOT_FOUND,
    ERROR_SUCCESS, WIN32_ERROR,
};
use windows::Win32::System::Registry::{RegEnumKeyExW, RegEnumValueW, HKEY};
use winreg::enums::*;
use winreg::types::FromRegValue;
use winreg::{RegKey, RegValue};

/// The live Windows registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinRegistry;

fn classify(e: std::io::Error, context: &str) -> RegistryError {
    let code = e.raw_os_error().and_then(|c| u32::try_from(c).ok());
    match code {
        Some(c) if c == ERROR_FILE_NOT_FOUND.0 || c == ERROR_PATH_NOT_FOUND.0 => {
            RegistryError::NotFound(format!("{context}: {e}"))
        }
        Some(c) if c == ERROR_ACCESS_DENIED.0 => {
            RegistryError::AccessDenied(format!("{context}: {e}"))
        }
        _ => RegistryError::OsFailure(format!("{context}: {e}")),
    }
}

// Longest key name and value name the registry accepts, plus the terminator.
const MAX_KEY_NAME: usize = 256;
const MAX_VALUE_NAME: usize = 16_384;

fn raw(key: &RegKey) -> HKEY {
    HKEY(key.raw_handle() as _)
}

/// Turn the status and filled prefix of a single enumeration call into a name.
fn enumerated(status: WIN32_ERROR, buf: &[u16], len: u32, context: &str) -> Result<Option<String>> {
    if status == ERROR_NO_MORE_ITEMS {
        return Ok(None);
    }
    if status != ERROR_SUCCESS {
        // Win32 codes fit in an i32; io::Error stores them that way.
        #[allow(clippy::cast_possible_wrap)]
        let e = std::io::Error::from_raw_os_error(status.0 as i32);
        return Err(classify(e, context));
    }
    let name = buf.get(..len as usize).unwrap_or(buf);
    String::from_utf16(name)
        .map(Some)
        .map_err(|e| RegistryError::OsFailure(format!("{context}: {e}")))
}

fn decode(value: &RegValue) -> Result<Variant> {
    Ok(match value.vtype {
        REG_DWORD => Variant::Integer(u32::from_reg_value(value)?),
        REG_SZ | REG_EXPAND_SZ => Variant::String(String::from_reg_value(value)?),
        REG_MULTI_SZ => Variant::StringList(Vec::<String>::from_reg_value(value)?),
        _ => Variant::Binary(value.bytes.to_vec()),
    })
}

impl Store for WinRegistry {
    type Key = RegKey;

    fn open(
        &self,
        root: RootKey,
        path: &str,
        mode: AccessMode,
        flags: AccessFlags,
    ) -> Result<RegKey> {
        trace!(%root, path, mode = mode.as_str(), flags = flags.bits(), "RegOpenKeyEx");
        let predef = RegKey::predef(root.hkey());
        let opened = match mode {
            AccessMode::Read => predef.open_subkey_with_flags(path, KEY_READ | flags.bits()),
            AccessMode::Create => predef
                .create_subkey_with_flags(path, KEY_READ | KEY_WRITE | flags.bits())
                .map(|(key, _)| key),
        };
        opened.map_err(|e| classify(e, &format!("{root}\\{path}")))
    }

    fn close(&self, key: RegKey) -> Result<()> {
        // RegKey closes the native handle on drop.
        drop(key);
        Ok(())
    }

    // One RegEnumKeyExW per index. winreg's iterators restart from zero, so
    // seeking them to `index` would re-query every earlier entry.
    fn enum_key(&self, key: &RegKey, index: u32) -> Result<Option<String>> {
        let mut buf = [0u16; MAX_KEY_NAME];
        let mut len = MAX_KEY_NAME as u32;
        // SAFETY: the handle is open for the lifetime of `key`, and `len`
        // holds the capacity of `buf` in UTF-16 units.
        let status = unsafe {
            RegEnumKeyExW(
                raw(key),
                index,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
                None,
                None,
                None,
                None,
            )
        };
        enumerated(status, &buf, len, &format!("subkey #{index}"))
    }

    // One RegEnumValueW for the name, then one read of its data.
    fn enum_value(&self, key: &RegKey, index: u32) -> Result<Option<(String, Variant)>> {
        let mut buf = vec![0u16; MAX_VALUE_NAME];
        let mut len = MAX_VALUE_NAME as u32;
        // SAFETY: as in `enum_key`; type and data are not requested.
        let status = unsafe {
            RegEnumValueW(
                raw(key),
                index,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
                None,
                None,
                None,
                None,
            )
        };
        let context = format!("value #{index}");
        let Some(name) = enumerated(status, &buf, len, &context)? else {
            return Ok(None);
        };
        let data = key
            .get_raw_value(&name)
            .map_err(|e| classify(e, &format!("{context} ({name})")))?;
        Ok(Some((name, decode(&data)?)))
    }

    fn query_value(&self, key: &RegKey, name: &str) -> Result<Option<Variant>> {
        match key.get_raw_value(name) {
            Ok(raw) => decode(&raw).map(Some),
            Err(e) => match classify(e, name) {
                RegistryError::NotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    fn set_value(&self, key: &RegKey, name: &str, value: &Variant) -> Result<()> {
        let written = match value {
            Variant::Integer(v) => key.set_value(name, v),
            Variant::String(s) => key.set_value(name, s),
            Variant::StringList(l) => key.set_value(name, l),
            Variant::Binary(b) => key.set_raw_value(
                name,
                &RegValue {
                    bytes: b.clone().into(),
                    vtype: REG_BINARY,
                },
            ),
        };
        written.map_err(|e| classify(e, name))
    }

    fn delete_key(&self, root: RootKey, path: &str, flags: AccessFlags) -> Result<()> {
        trace!(%root, path, "RegDeleteKeyEx");
        // Only the view-selection bits are meaningful for deletion.
        let view = flags.bits() & (KEY_WOW64_32KEY | KEY_WOW64_64KEY);
        RegKey::predef(root.hkey())
            .delete_subkey_with_flags(path, view)
            .map_err(|e| classify(e, &format!("{root}\\{path}")))
    }

    fn query_info(&self, key: &RegKey) -> Result<KeyInfo> {
        let meta = key.query_info().map_err(|e| classify(e, "RegQueryInfoKey"))?;
        Ok(KeyInfo {
            subkeys: meta.sub_keys as usize,
            values: meta.values as usize,
            last_write: Some(meta.get_last_write_time_chrono().and_utc()),
        })
    }
}
