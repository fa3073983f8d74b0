//! Advertising payload encoder and advertising parameters.
//!
//! Builds the two legacy advertising buffers (advertising data and scan
//! response) as sequences of AD structures: `[len, type, data...]`.
//! Content that does not fit a 31-byte PDU is an error - nothing is
//! truncated or shortened behind the caller's back.

use heapless::Vec;

use crate::ble::service::Uuid128;
use crate::error::{AdvBuffer, AdvError};

/// Payload capacity of a legacy advertising PDU.
pub const LEGACY_ADV_DATA_LEN: usize = 31;

// AD types (Bluetooth Assigned Numbers, "Common Data Types").
pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_COMPLETE_128: u8 = 0x07;
pub const AD_TYPE_SHORT_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_NAME: u8 = 0x09;
pub const AD_TYPE_APPEARANCE: u8 = 0x19;

// Flags AD bits.
pub const LE_LIMITED_DISCOVERABLE: u8 = 0b0000_0001;
pub const LE_GENERAL_DISCOVERABLE: u8 = 0b0000_0010;
pub const BR_EDR_NOT_SUPPORTED: u8 = 0b0000_0100;

/// `BLE_GAP_ADV_FLAGS_LE_ONLY_GENERAL_DISC_MODE`.
pub const LE_ONLY_GENERAL_DISC_MODE: u8 = LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED;

/// What goes into the advertising buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingContent<'a> {
    pub name: &'a str,
    /// `None` leaves the appearance AD out.
    pub appearance: Option<u16>,
    pub flags: u8,
    /// Complete list of 128-bit service UUIDs, placed in the scan response.
    pub services: &'a [Uuid128],
}

/// Encoded advertising data + scan response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingPayload {
    adv_data: Vec<u8, LEGACY_ADV_DATA_LEN>,
    scan_data: Vec<u8, LEGACY_ADV_DATA_LEN>,
}

impl AdvertisingPayload {
    /// Encode `content`.
    ///
    /// The advertising buffer carries appearance, flags and the complete
    /// name (name last); the scan response carries the service list.
    pub fn build(content: &AdvertisingContent<'_>) -> Result<Self, AdvError> {
        let mut adv = AdEncoder::new(AdvBuffer::Advertising);
        if let Some(appearance) = content.appearance {
            adv.push(AD_TYPE_APPEARANCE, &appearance.to_le_bytes())?;
        }
        if content.flags != 0 {
            adv.push(AD_TYPE_FLAGS, &[content.flags])?;
        }
        adv.push(AD_TYPE_COMPLETE_NAME, content.name.as_bytes())?;

        let mut scan = AdEncoder::new(AdvBuffer::ScanResponse);
        if !content.services.is_empty() {
            scan.begin(AD_TYPE_COMPLETE_128, content.services.len() * 16)?;
            for uuid in content.services {
                scan.extend(uuid.as_le_bytes());
            }
        }

        Ok(Self {
            adv_data: adv.finish(),
            scan_data: scan.finish(),
        })
    }

    pub fn adv_data(&self) -> &[u8] {
        &self.adv_data
    }

    pub fn scan_data(&self) -> &[u8] {
        &self.scan_data
    }
}

/// Appends AD structures to one fixed-capacity buffer.
struct AdEncoder {
    which: AdvBuffer,
    buf: Vec<u8, LEGACY_ADV_DATA_LEN>,
}

impl AdEncoder {
    fn new(which: AdvBuffer) -> Self {
        Self {
            which,
            buf: Vec::new(),
        }
    }

    /// Append one AD structure.
    fn push(&mut self, ad_type: u8, data: &[u8]) -> Result<(), AdvError> {
        self.begin(ad_type, data.len())?;
        self.extend(data);
        Ok(())
    }

    /// Write the `[len, type]` header of a structure carrying `data_len`
    /// bytes, after checking the whole structure fits.
    fn begin(&mut self, ad_type: u8, data_len: usize) -> Result<(), AdvError> {
        let needed = self.buf.len() + 2 + data_len;
        if needed > LEGACY_ADV_DATA_LEN {
            return Err(AdvError::SizeExceeded {
                buffer: self.which,
                needed,
            });
        }
        self.extend(&[(data_len + 1) as u8, ad_type]);
        Ok(())
    }

    fn extend(&mut self, data: &[u8]) {
        // Capacity is checked in `begin`.
        let _ = self.buf.extend_from_slice(data);
    }

    fn finish(self) -> Vec<u8, LEGACY_ADV_DATA_LEN> {
        self.buf
    }
}

/// Advertising PDU type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingKind {
    /// `ADV_IND`: connectable and scannable, undirected.
    ConnectableScannableUndirected,
    /// `ADV_SCAN_IND`: scannable, not connectable.
    ScannableUndirected,
}

/// Parameters submitted with the payload when advertising starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingParams {
    /// 0.625 ms units.
    pub interval: u32,
    /// 10 ms units; `None` advertises until a connection or an explicit stop.
    pub timeout: Option<u16>,
    pub connectable: bool,
}

impl AdvertisingParams {
    pub const fn kind(&self) -> AdvertisingKind {
        if self.connectable {
            AdvertisingKind::ConnectableScannableUndirected
        } else {
            AdvertisingKind::ScannableUndirected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::adv_parser::{contains_service_uuid128, extract_device_name, find_ad_structure};

    const SERVICE: Uuid128 = Uuid128::from_le_bytes([
        0x23, 0xD1, 0xBC, 0xEA, 0x5F, 0x78, 0x23, 0x15, 0xDE, 0xEF, 0x12, 0x12, 0x34, 0x12, 0x00,
        0x00,
    ]);

    fn content(name: &str) -> AdvertisingContent<'_> {
        AdvertisingContent {
            name,
            appearance: Some(0),
            flags: LE_ONLY_GENERAL_DISC_MODE,
            services: core::slice::from_ref(&SERVICE),
        }
    }

    #[test]
    fn reference_payload_bytes() {
        let payload = AdvertisingPayload::build(&content("nRF52840_TechDemo")).unwrap();

        let mut expected = vec![0x03, 0x19, 0x00, 0x00, 0x02, 0x01, 0x06, 0x12, 0x09];
        expected.extend_from_slice(b"nRF52840_TechDemo");
        assert_eq!(payload.adv_data(), expected.as_slice());
        assert_eq!(payload.adv_data().len(), 26);

        let mut scan = vec![0x11, 0x07];
        scan.extend_from_slice(SERVICE.as_le_bytes());
        assert_eq!(payload.scan_data(), scan.as_slice());
    }

    #[test]
    fn payload_decodes_back() {
        let payload = AdvertisingPayload::build(&content("nRF52840_TechDemo")).unwrap();
        assert_eq!(
            extract_device_name(payload.adv_data()).as_str(),
            "nRF52840_TechDemo"
        );
        assert_eq!(
            find_ad_structure(payload.adv_data(), AD_TYPE_FLAGS),
            Some(&[0x06][..])
        );
        assert!(contains_service_uuid128(payload.scan_data(), &SERVICE));
        assert!(!contains_service_uuid128(payload.adv_data(), &SERVICE));
    }

    #[test]
    fn name_that_fills_the_pdu_exactly() {
        // 4 (appearance) + 3 (flags) + 2 (header) = 9; 22 bytes of name fill 31.
        let name = "ABCDEFGHIJKLMNOPQRSTUV";
        let payload = AdvertisingPayload::build(&content(name)).unwrap();
        assert_eq!(payload.adv_data().len(), LEGACY_ADV_DATA_LEN);
    }

    #[test]
    fn oversized_name_is_an_error_not_a_truncation() {
        let name = "ABCDEFGHIJKLMNOPQRSTUVW";
        assert_eq!(
            AdvertisingPayload::build(&content(name)),
            Err(AdvError::SizeExceeded {
                buffer: AdvBuffer::Advertising,
                needed: 32,
            })
        );
    }

    #[test]
    fn too_many_services_overflow_scan_response() {
        let services = [SERVICE, SERVICE];
        let c = AdvertisingContent {
            services: &services,
            ..content("x")
        };
        // 2 + 32 bytes.
        assert_eq!(
            AdvertisingPayload::build(&c),
            Err(AdvError::SizeExceeded {
                buffer: AdvBuffer::ScanResponse,
                needed: 34,
            })
        );

        let services = [SERVICE, SERVICE, SERVICE];
        let c = AdvertisingContent {
            services: &services,
            ..content("x")
        };
        assert!(matches!(
            AdvertisingPayload::build(&c),
            Err(AdvError::SizeExceeded {
                buffer: AdvBuffer::ScanResponse,
                ..
            })
        ));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let c = AdvertisingContent {
            name: "n",
            appearance: None,
            flags: 0,
            services: &[],
        };
        let payload = AdvertisingPayload::build(&c).unwrap();
        assert_eq!(payload.adv_data(), &[0x02, 0x09, b'n']);
        assert!(payload.scan_data().is_empty());
    }

    #[test]
    fn building_twice_is_byte_identical() {
        let a = AdvertisingPayload::build(&content("nRF52840_TechDemo")).unwrap();
        let b = AdvertisingPayload::build(&content("nRF52840_TechDemo")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn params_kind() {
        let mut p = AdvertisingParams {
            interval: 64,
            timeout: None,
            connectable: true,
        };
        assert_eq!(p.kind(), AdvertisingKind::ConnectableScannableUndirected);
        p.connectable = false;
        assert_eq!(p.kind(), AdvertisingKind::ScannableUndirected);
    }
}
