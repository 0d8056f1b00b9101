//! Compiled-in special-use and CDN ranges
//!
//! Row order here does not matter: [`ClassificationTable`](crate::ClassificationTable)
//! sorts by prefix length when it is built.

use crate::{AddressCategory, RangeEntry};
use netcalc_cidr::Cidr;

const CLOUDFLARE: &str = "Cloudflare";

const fn v4(octets: [u8; 4], prefix_len: u8, category: AddressCategory) -> RangeEntry {
    RangeEntry::new(Cidr::v4(octets, prefix_len), category)
}

const fn v6(segments: [u16; 8], prefix_len: u8, category: AddressCategory) -> RangeEntry {
    RangeEntry::new(Cidr::v6(segments, prefix_len), category)
}

/// IANA special-use IPv4 blocks
pub static IPV4_SPECIAL_USE: &[RangeEntry] = &[
    v4([0, 0, 0, 0], 8, AddressCategory::Reserved),
    v4([10, 0, 0, 0], 8, AddressCategory::PrivateRfc1918),
    v4([100, 64, 0, 0], 10, AddressCategory::SharedAddressSpaceRfc6598),
    v4([127, 0, 0, 0], 8, AddressCategory::Loopback),
    v4([169, 254, 0, 0], 16, AddressCategory::LinkLocal),
    v4([172, 16, 0, 0], 12, AddressCategory::PrivateRfc1918),
    v4([192, 0, 0, 0], 24, AddressCategory::Reserved),
    v4([192, 0, 2, 0], 24, AddressCategory::Reserved),
    v4([192, 168, 0, 0], 16, AddressCategory::PrivateRfc1918),
    v4([198, 18, 0, 0], 15, AddressCategory::Reserved),
    v4([198, 51, 100, 0], 24, AddressCategory::Reserved),
    v4([203, 0, 113, 0], 24, AddressCategory::Reserved),
    v4([224, 0, 0, 0], 4, AddressCategory::Multicast),
    v4([240, 0, 0, 0], 4, AddressCategory::Reserved),
    v4([255, 255, 255, 255], 32, AddressCategory::Reserved),
];

/// IANA special-use IPv6 blocks
pub static IPV6_SPECIAL_USE: &[RangeEntry] = &[
    v6([0, 0, 0, 0, 0, 0, 0, 0], 128, AddressCategory::Reserved),
    v6([0, 0, 0, 0, 0, 0, 0, 1], 128, AddressCategory::Loopback),
    v6([0, 0, 0, 0, 0, 0xffff, 0, 0], 96, AddressCategory::Reserved),
    v6([0x64, 0xff9b, 0, 0, 0, 0, 0, 0], 96, AddressCategory::Reserved),
    v6([0x2001, 0x0db8, 0, 0, 0, 0, 0, 0], 32, AddressCategory::Reserved),
    v6([0xfc00, 0, 0, 0, 0, 0, 0, 0], 7, AddressCategory::Reserved),
    v6([0xfe80, 0, 0, 0, 0, 0, 0, 0], 10, AddressCategory::LinkLocal),
    v6([0xff00, 0, 0, 0, 0, 0, 0, 0], 8, AddressCategory::Multicast),
];

/// Cloudflare published IPv4 ranges (https://www.cloudflare.com/ips-v4/)
pub static CLOUDFLARE_IPV4: &[RangeEntry] = &[
    v4([173, 245, 48, 0], 20, AddressCategory::cdn(CLOUDFLARE)),
    v4([103, 21, 244, 0], 22, AddressCategory::cdn(CLOUDFLARE)),
    v4([103, 22, 200, 0], 22, AddressCategory::cdn(CLOUDFLARE)),
    v4([103, 31, 4, 0], 22, AddressCategory::cdn(CLOUDFLARE)),
    v4([141, 101, 64, 0], 18, AddressCategory::cdn(CLOUDFLARE)),
    v4([108, 162, 192, 0], 18, AddressCategory::cdn(CLOUDFLARE)),
    v4([190, 93, 240, 0], 20, AddressCategory::cdn(CLOUDFLARE)),
    v4([188, 114, 96, 0], 20, AddressCategory::cdn(CLOUDFLARE)),
    v4([197, 234, 240, 0], 22, AddressCategory::cdn(CLOUDFLARE)),
    v4([198, 41, 128, 0], 17, AddressCategory::cdn(CLOUDFLARE)),
    v4([162, 158, 0, 0], 15, AddressCategory::cdn(CLOUDFLARE)),
    v4([104, 16, 0, 0], 13, AddressCategory::cdn(CLOUDFLARE)),
    v4([104, 24, 0, 0], 14, AddressCategory::cdn(CLOUDFLARE)),
    v4([172, 64, 0, 0], 13, AddressCategory::cdn(CLOUDFLARE)),
    v4([131, 0, 72, 0], 22, AddressCategory::cdn(CLOUDFLARE)),
];

/// Cloudflare published IPv6 ranges (https://www.cloudflare.com/ips-v6/)
pub static CLOUDFLARE_IPV6: &[RangeEntry] = &[
    v6([0x2400, 0xcb00, 0, 0, 0, 0, 0, 0], 32, AddressCategory::cdn(CLOUDFLARE)),
    v6([0x2606, 0x4700, 0, 0, 0, 0, 0, 0], 32, AddressCategory::cdn(CLOUDFLARE)),
    v6([0x2803, 0xf800, 0, 0, 0, 0, 0, 0], 32, AddressCategory::cdn(CLOUDFLARE)),
    v6([0x2405, 0xb500, 0, 0, 0, 0, 0, 0], 32, AddressCategory::cdn(CLOUDFLARE)),
    v6([0x2405, 0x8100, 0, 0, 0, 0, 0, 0], 32, AddressCategory::cdn(CLOUDFLARE)),
    v6([0x2a06, 0x98c0, 0, 0, 0, 0, 0, 0], 29, AddressCategory::cdn(CLOUDFLARE)),
    v6([0x2c0f, 0xf248, 0, 0, 0, 0, 0, 0], 32, AddressCategory::cdn(CLOUDFLARE)),
];

/// Every compiled-in row
pub fn all() -> impl Iterator<Item = &'static RangeEntry> {
    IPV4_SPECIAL_USE
        .iter()
        .chain(IPV6_SPECIAL_USE)
        .chain(CLOUDFLARE_IPV4)
        .chain(CLOUDFLARE_IPV6)
}
