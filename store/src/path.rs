use crate::StoreError;

/// Canonical form of a blob name: `/`-separated, no leading or trailing
/// separator, no empty or `.` segments. Backslashes count as separators.
///
/// Names that are empty after cleanup, or that climb with `..`, are
/// rejected with [`StoreError::InvalidName`].
pub fn normalize(name: &str) -> Result<String, StoreError> {
    let unified = name.replace('\\', "/");
    let parts: Vec<&str> = unified
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    if parts.contains(&"..") {
        return Err(StoreError::InvalidName(format!(
            "'{name}' leaves the store root"
        )));
    }
    if parts.is_empty() {
        return Err(StoreError::InvalidName(format!("'{name}' names nothing")));
    }
    Ok(parts.join("/"))
}

/// Normalize a listing prefix. Unlike [`normalize`], the empty prefix is valid
/// and names the root.
pub(crate) fn normalize_prefix(prefix: &str) -> Result<String, StoreError> {
    let unified = prefix.replace('\\', "/");
    if unified.split('/').all(|part| part.is_empty() || part == ".") {
        return Ok(String::new());
    }
    normalize(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name() {
        assert_eq!(normalize("saves/slot_1.ron").unwrap(), "saves/slot_1.ron");
    }

    #[test]
    fn leading_and_trailing_slashes() {
        assert_eq!(normalize("/saves/slot_1.ron/").unwrap(), "saves/slot_1.ron");
    }

    #[test]
    fn redundant_separators_and_dots() {
        assert_eq!(normalize("saves//./slot.bin").unwrap(), "saves/slot.bin");
    }

    #[test]
    fn windows_separators() {
        assert_eq!(normalize("saves\\slot.bin").unwrap(), "saves/slot.bin");
    }

    #[test]
    fn reject_parent_segments() {
        assert!(matches!(
            normalize("saves/../secret"),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn names_that_reduce_to_nothing() {
        for name in ["", "///", "././."] {
            assert!(matches!(normalize(name), Err(StoreError::InvalidName(_))));
        }
    }

    #[test]
    fn empty_prefix_is_root() {
        assert_eq!(normalize_prefix("").unwrap(), "");
        assert_eq!(normalize_prefix("/").unwrap(), "");
        assert_eq!(normalize_prefix("saves/").unwrap(), "saves");
    }
}
