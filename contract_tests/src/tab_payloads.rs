//! Tab descriptor contract tests
//!
//! The descriptor is consumed by code on the far side of the channel
//! that expects the extension-API tab object shape.

// ===== Descriptor Field Names =====
pub const TAB_FIELDS: &[&str] = &[
    "id",
    "index",
    "windowId",
    "highlighted",
    "active",
    "pinned",
    "url",
    "title",
    "incognito",
];
