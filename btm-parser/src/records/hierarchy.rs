/*!
 Resolves the parent of an item from its `container` field.
*/

use crate::parsed::ParsedItem;

/// The parent an item names in its `container` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent<'a> {
    /// Another item in the same user scope
    Resolved(&'a ParsedItem),
    /// No item in the scope has this identifier
    Unresolved(&'a str),
}

/// Find the parent of `item` among the items of its user scope
///
/// The first item, in archived order, whose `identifier` matches wins. `item` itself is
/// never its own parent. Returns [`None`] when the item has no `container`.
pub fn find_parent<'a>(item: &'a ParsedItem, scope: &'a [ParsedItem]) -> Option<Parent<'a>> {
    let container = item.container.as_deref().filter(|container| !container.is_empty())?;

    Some(
        scope
            .iter()
            .find(|candidate| {
                !std::ptr::eq(*candidate, item) && candidate.identifier == container
            })
            .map_or(Parent::Unresolved(container), Parent::Resolved),
    )
}
