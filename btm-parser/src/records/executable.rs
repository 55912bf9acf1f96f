/*!
 Resolves the executables of login items and apps from their bundles.

 Agents and daemons point at their launchd property list instead, see
 [`ParsedItem::manifest_path`].
*/

use std::path::PathBuf;

use crate::{
    error::{bundle::PathResolutionError, diagnostic::Diagnostic},
    parsed::ParsedItem,
    records::{
        flags::{has_flag, item_type},
        hierarchy::{find_parent, Parent},
    },
    util::bundle::Bundle,
};

/// The bundle directory an item's executable lives in, if the item has one
///
/// A login item's `url` is relative to its parent's bundle; the two paths are
/// concatenated as stored.
fn bundle_directory(
    item: &ParsedItem,
    scope: &[ParsedItem],
) -> Result<Option<PathBuf>, PathResolutionError> {
    if item.is_launchd_job() {
        return Ok(None);
    }

    if has_flag(item.item_type, item_type::LOGIN_ITEM) {
        let parent = match find_parent(item, scope) {
            Some(Parent::Resolved(parent)) => parent,
            Some(Parent::Unresolved(container)) => {
                return Err(PathResolutionError::NoParent(container.to_string()))
            }
            None => return Err(PathResolutionError::MissingContainer),
        };
        let parent_path = parent
            .url_path()
            .ok_or_else(|| PathResolutionError::MissingUrl(parent.identifier.clone()))?;
        let item_path = item
            .url_path()
            .ok_or_else(|| PathResolutionError::MissingUrl(item.identifier.clone()))?;
        return Ok(Some(PathBuf::from(format!("{parent_path}{item_path}"))));
    }

    if has_flag(item.item_type, item_type::APP) {
        return item
            .url_path()
            .map(|path| Some(PathBuf::from(path)))
            .ok_or_else(|| PathResolutionError::MissingUrl(item.identifier.clone()));
    }

    Ok(None)
}

/// Overwrite `executablePath` of the login items and apps of one user scope
///
/// Failures leave the archived value in place and are reported to `diagnostics`.
pub fn resolve_executable_paths(scope: &mut [ParsedItem], diagnostics: &mut Vec<Diagnostic>) {
    for index in 0..scope.len() {
        let resolved = bundle_directory(&scope[index], scope).and_then(|directory| {
            directory
                .map(|directory| Bundle::open(directory)?.executable_path())
                .transpose()
        });

        match resolved {
            Ok(Some(path)) => {
                scope[index].executable_path = Some(path.to_string_lossy().into_owned());
            }
            Ok(None) => {}
            Err(why) => Diagnostic::PathResolutionWarning {
                identifier: scope[index].identifier.clone(),
                reason: why.to_string(),
            }
            .report(diagnostics),
        }
    }
}
