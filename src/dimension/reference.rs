//! Fixed reference enumerations
//!
//! The trip feed carries bare integer codes for vendors, payment types and
//! rate codes. Their labels come from the data dictionary and never change
//! between runs, so they live here as static tables.

use serde::Serialize;

/// Trip-providing operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VendorRecord {
    pub id: i32,
    pub name: &'static str,
    pub short_name: &'static str,
}

/// How a trip was paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentTypeRecord {
    pub id: i32,
    pub name: &'static str,
    pub is_card_payment: bool,
    pub allows_tip: bool,
}

/// Final rate code in effect at the end of the trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateCodeRecord {
    pub id: i32,
    pub name: &'static str,
    pub is_airport: bool,
    pub is_standard: bool,
}

pub const VENDORS: &[VendorRecord] = &[
    VendorRecord {
        id: 1,
        name: "Creative Mobile Technologies",
        short_name: "CMT",
    },
    VendorRecord {
        id: 2,
        name: "VeriFone Inc.",
        short_name: "VTS",
    },
    VendorRecord {
        id: 6,
        name: "Other",
        short_name: "Other",
    },
    VendorRecord {
        id: 7,
        name: "Other",
        short_name: "Other",
    },
];

pub const PAYMENT_TYPES: &[PaymentTypeRecord] = &[
    PaymentTypeRecord {
        id: 0,
        name: "Unknown",
        is_card_payment: false,
        allows_tip: false,
    },
    PaymentTypeRecord {
        id: 1,
        name: "Credit card",
        is_card_payment: true,
        allows_tip: true,
    },
    PaymentTypeRecord {
        id: 2,
        name: "Cash",
        is_card_payment: false,
        allows_tip: false,
    },
    PaymentTypeRecord {
        id: 3,
        name: "No charge",
        is_card_payment: false,
        allows_tip: false,
    },
    PaymentTypeRecord {
        id: 4,
        name: "Dispute",
        is_card_payment: false,
        allows_tip: false,
    },
    PaymentTypeRecord {
        id: 5,
        name: "Unknown",
        is_card_payment: false,
        allows_tip: false,
    },
];

pub const RATE_CODES: &[RateCodeRecord] = &[
    RateCodeRecord {
        id: 1,
        name: "Standard rate",
        is_airport: false,
        is_standard: true,
    },
    RateCodeRecord {
        id: 2,
        name: "JFK",
        is_airport: true,
        is_standard: false,
    },
    RateCodeRecord {
        id: 3,
        name: "Newark",
        is_airport: true,
        is_standard: false,
    },
    RateCodeRecord {
        id: 4,
        name: "Nassau or Westchester",
        is_airport: false,
        is_standard: false,
    },
    RateCodeRecord {
        id: 5,
        name: "Negotiated fare",
        is_airport: false,
        is_standard: false,
    },
    RateCodeRecord {
        id: 6,
        name: "Group ride",
        is_airport: false,
        is_standard: false,
    },
    RateCodeRecord {
        id: 99,
        name: "Other",
        is_airport: false,
        is_standard: false,
    },
];

/// Look up a vendor by code
pub fn vendor(id: i32) -> Option<&'static VendorRecord> {
    VENDORS.iter().find(|v| v.id == id)
}

/// Look up a payment type by code
pub fn payment_type(id: i32) -> Option<&'static PaymentTypeRecord> {
    PAYMENT_TYPES.iter().find(|p| p.id == id)
}

/// Look up a rate code by code
pub fn rate_code(id: i32) -> Option<&'static RateCodeRecord> {
    RATE_CODES.iter().find(|r| r.id == id)
}

/// Rate codes that denote airport trips
pub fn airport_rate_codes() -> impl Iterator<Item = &'static RateCodeRecord> {
    RATE_CODES.iter().filter(|r| r.is_airport)
}
