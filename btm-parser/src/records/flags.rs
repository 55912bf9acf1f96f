/*!
 Human-readable descriptions of the `type` and `disposition` bitmasks of an item.
*/

/// Bits of an item's `type`
pub mod item_type {
    pub const APP: i64 = 0x2;
    pub const LOGIN_ITEM: i64 = 0x4;
    pub const AGENT: i64 = 0x8;
    pub const DAEMON: i64 = 0x10;
    pub const DEVELOPER: i64 = 0x20;
    pub const LEGACY: i64 = 0x10000;
    pub const CURATED: i64 = 0x80000;
}

/// Bits of an item's `disposition`
pub mod disposition {
    pub const ENABLED: i64 = 0x1;
    pub const ALLOWED: i64 = 0x2;
    pub const HIDDEN: i64 = 0x4;
    pub const NOTIFIED: i64 = 0x8;
}

/// Order in which `type` bits are described
const TYPE_WORDS: [(i64, &str); 7] = [
    (item_type::CURATED, "curated"),
    (item_type::LEGACY, "legacy"),
    (item_type::DEVELOPER, "developer"),
    (item_type::DAEMON, "daemon"),
    (item_type::AGENT, "agent"),
    (item_type::LOGIN_ITEM, "login item"),
    (item_type::APP, "app"),
];

/// Each `disposition` bit with its set and unset descriptions
const DISPOSITION_WORDS: [(i64, &str, &str); 4] = [
    (disposition::ENABLED, "enabled", "disabled"),
    (disposition::ALLOWED, "allowed", "disallowed"),
    (disposition::HIDDEN, "hidden", "visible"),
    (disposition::NOTIFIED, "notified", "not notified"),
];

/// Determine if `flag` is set in `value`
pub fn has_flag(value: i64, flag: i64) -> bool {
    value & flag != 0
}

/// Describe the set bits of an item's `type`
///
/// # Example:
///
/// ```
/// use btm_parser::records::flags::type_details;
///
/// assert_eq!(type_details(0x10 | 0x20), "developer daemon");
/// assert_eq!(type_details(0), "");
/// ```
pub fn type_details(item_type: i64) -> String {
    TYPE_WORDS
        .iter()
        .filter(|(flag, _)| has_flag(item_type, *flag))
        .map(|(_, word)| *word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Describe an item's `disposition`, always as four words
///
/// # Example:
///
/// ```
/// use btm_parser::records::flags::disposition_details;
///
/// assert_eq!(disposition_details(1), "enabled disallowed visible not notified");
/// ```
pub fn disposition_details(disposition: i64) -> String {
    DISPOSITION_WORDS
        .iter()
        .map(|(flag, set, unset)| {
            if has_flag(disposition, *flag) {
                *set
            } else {
                *unset
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
