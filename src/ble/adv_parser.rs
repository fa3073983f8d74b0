use heapless::String;

use crate::ble::advertising::{AD_TYPE_COMPLETE_128, AD_TYPE_COMPLETE_NAME, AD_TYPE_SHORT_NAME};
use crate::ble::service::Uuid128;

/// Incomplete list of 128-bit service UUIDs.
const AD_TYPE_INCOMPLETE_128: u8 = 0x06;

/// Return the data of the first AD structure of type `ad_type`.
pub fn find_ad_structure(data: &[u8], ad_type: u8) -> Option<&[u8]> {
    let mut i = 0;
    while i < data.len() {
        let len = data[i] as usize;
        if len == 0 || i + len >= data.len() {
            break;
        }
        if data[i + 1] == ad_type {
            return Some(&data[i + 2..i + 1 + len]);
        }
        i += len + 1;
    }
    None
}

/// Check if raw advertisement data lists `uuid` as a 128-bit service.
pub fn contains_service_uuid128(data: &[u8], uuid: &Uuid128) -> bool {
    [AD_TYPE_INCOMPLETE_128, AD_TYPE_COMPLETE_128]
        .iter()
        .filter_map(|&ty| find_ad_structure(data, ty))
        .any(|list| {
            list.chunks_exact(16)
                .any(|chunk| chunk == uuid.as_le_bytes())
        })
}

/// Extract complete/shortened local name from advertisement data.
///
/// Names that aren't valid UTF-8 come back as "Unknown"; names longer than
/// the capacity are cut at a character boundary.
pub fn extract_device_name(data: &[u8]) -> String<32> {
    let found = find_ad_structure(data, AD_TYPE_COMPLETE_NAME)
        .or_else(|| find_ad_structure(data, AD_TYPE_SHORT_NAME))
        .and_then(|bytes| core::str::from_utf8(bytes).ok());

    let mut name = String::new();
    match found {
        Some(text) => {
            for c in text.chars() {
                if name.push(c).is_err() {
                    break;
                }
            }
        }
        None => {
            let _ = name.push_str("Unknown");
        }
    }
    name
}
