use crate::parser::{ParseError, PathSegment, Parser};
use serde_json::Value;
use std::fmt;

/// A parsed data model path, e.g. `Group[0].field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPath {
    segments: Vec<PathSegment>,
}

impl DataPath {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let segments = Parser::new(input).parse_path()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walk the form data. Missing keys, out of range indexes and type
    /// mismatches all yield `None`.
    pub fn lookup<'v>(&self, data: &'v Value) -> Option<&'v Value> {
        let mut current = data;
        for seg in &self.segments {
            current = match (seg, current) {
                (PathSegment::Key(k), Value::Object(m)) => m.get(k)?,
                (PathSegment::Index(i), Value::Array(a)) => a.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Insert row indexes after each repeating group prefix that is not
    /// already indexed.
    ///
    /// `groups` are the unindexed bindings of the enclosing repeating groups,
    /// outermost first, paired positionally with `rows`.
    pub fn with_row_indices(&self, groups: &[DataPath], rows: &[usize]) -> DataPath {
        let mut segments = self.segments.clone();
        for (group, row) in groups.iter().zip(rows) {
            if let Some(pos) = prefix_end(&segments, group) {
                if !matches!(segments.get(pos), Some(PathSegment::Index(_))) {
                    segments.insert(pos, PathSegment::Index(*row));
                }
            }
        }
        DataPath { segments }
    }

    /// The path with every index removed.
    pub fn without_indices(&self) -> DataPath {
        DataPath {
            segments: self
                .segments
                .iter()
                .filter(|s| matches!(s, PathSegment::Key(_)))
                .cloned()
                .collect(),
        }
    }
}

/// Position right after `group`'s keys if they prefix `segments`, ignoring
/// any indexes already present in `segments`.
fn prefix_end(segments: &[PathSegment], group: &DataPath) -> Option<usize> {
    let mut pos = 0;
    for want in group.segments.iter().filter_map(|s| match s {
        PathSegment::Key(k) => Some(k),
        PathSegment::Index(_) => None,
    }) {
        while let Some(PathSegment::Index(_)) = segments.get(pos) {
            pos += 1;
        }
        match segments.get(pos) {
            Some(PathSegment::Key(k)) if k == want => pos += 1,
            _ => return None,
        }
    }
    Some(pos)
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Key(k) if i == 0 => write!(f, "{k}")?,
                PathSegment::Key(k) => write!(f, ".{k}")?,
                PathSegment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn path(s: &str) -> DataPath {
        DataPath::parse(s).unwrap()
    }

    #[test]
    fn lookup_follows_keys_and_indexes() {
        let data = json!({"Group": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(path("Group[1].name").lookup(&data), Some(&json!("b")));
        assert_eq!(path("Group[2].name").lookup(&data), None);
        assert_eq!(path("Group.name").lookup(&data), None);
    }

    #[test]
    fn transposes_nested_groups() {
        let groups = vec![path("Outer"), path("Outer.Inner")];
        let p = path("Outer.Inner.value").with_row_indices(&groups, &[2, 0]);
        assert_eq!(p.to_string(), "Outer[2].Inner[0].value");
    }

    #[test]
    fn keeps_explicit_indexes() {
        let groups = vec![path("Outer")];
        let p = path("Outer[5].value").with_row_indices(&groups, &[1]);
        assert_eq!(p.to_string(), "Outer[5].value");
    }

    #[test]
    fn leaves_unrelated_paths_alone() {
        let groups = vec![path("Outer")];
        let p = path("Other.value").with_row_indices(&groups, &[1]);
        assert_eq!(p.to_string(), "Other.value");
    }
}
