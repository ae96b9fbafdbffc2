use tracing::debug;

use crate::pattern::SkipMatcher;
use crate::store::{Container, Node, StoreError};

/// A dataset accepted during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeptDataset {
    pub path: String,
    pub shape: Vec<usize>,
}

/// Datasets selected for copying, in source traversal order.
#[derive(Debug, Clone, Default)]
pub struct KeepList {
    entries: Vec<KeptDataset>,
    excluded: Vec<String>,
    groups_seen: usize,
}

impl KeepList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeptDataset> {
        self.entries.iter()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    /// Dataset paths left out because they matched a skip pattern.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn groups_seen(&self) -> usize {
        self.groups_seen
    }
}

/// Walk the whole source tree and decide which datasets survive.
///
/// Groups are never kept directly; they reappear in the destination only as
/// ancestors of kept datasets.
pub fn collect<C: Container>(source: &C, matcher: &SkipMatcher) -> Result<KeepList, StoreError> {
    let mut keep = KeepList::default();
    source.visit(&mut |node| match node {
        Node::Group { .. } => keep.groups_seen += 1,
        Node::Dataset { path, shape } => {
            if matcher.matches(&path) {
                debug!(path = %path, "skip");
                keep.excluded.push(path);
            } else {
                debug!(path = %path, ?shape, "keep");
                keep.entries.push(KeptDataset { path, shape });
            }
        }
    })?;
    Ok(keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternSyntax;
    use crate::store::tree::{Dataset, TreeFile};

    fn source() -> TreeFile {
        let mut t = TreeFile::in_memory();
        for path in [
            "/run/CsPad0/image",
            "/run/CsPad0/config/gain",
            "/run/Camera1/image",
            "/run/meta/temperature",
            "/run/meta/pressure",
            "/scalar",
        ] {
            t.insert_dataset(path, Dataset::scalar_f64(1.0)).unwrap();
        }
        t.insert_group("/empty/nested").unwrap();
        t
    }

    #[test]
    fn keep_all_matches_every_dataset() {
        let src = source();
        let keep = collect(&src, &SkipMatcher::MatchAll).unwrap();
        assert_eq!(keep.paths(), src.dataset_paths());
        assert!(keep.excluded().is_empty());
    }

    #[test]
    fn empty_pattern_list_equals_keep_all() {
        let src = source();
        let m = SkipMatcher::from_patterns(Vec::<&str>::new(), PatternSyntax::Regex).unwrap();
        let a = collect(&src, &m).unwrap();
        let b = collect(&src, &SkipMatcher::MatchAll).unwrap();
        assert_eq!(a.paths(), b.paths());
    }

    #[test]
    fn excluded_datasets_are_all_or_nothing() {
        let src = source();
        let m = SkipMatcher::from_list("CsPad,Camera", PatternSyntax::Regex).unwrap();
        let keep = collect(&src, &m).unwrap();
        assert_eq!(
            keep.paths(),
            vec!["/run/meta/pressure", "/run/meta/temperature", "/scalar"]
        );
        assert_eq!(keep.excluded().len(), 3);
        assert_eq!(keep.len() + keep.excluded().len(), src.dataset_paths().len());
    }

    #[test]
    fn groups_are_counted_not_kept() {
        let src = source();
        let keep = collect(&src, &SkipMatcher::MatchAll).unwrap();
        // run, CsPad0, config, Camera1, meta, empty, nested
        assert_eq!(keep.groups_seen(), 7);
        assert!(keep.iter().all(|k| !k.path.ends_with("nested")));
    }

    #[test]
    fn order_is_deterministic() {
        let src = source();
        let m = SkipMatcher::single("meta", PatternSyntax::Literal).unwrap();
        let first = collect(&src, &m).unwrap();
        let second = collect(&src, &m).unwrap();
        assert_eq!(first.paths(), second.paths());
    }
}
