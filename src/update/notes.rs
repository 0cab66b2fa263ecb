//! Release-notes merging across a span of versions

use crate::version::types::Version;

/// Merge the notes of several versions into one text
///
/// Versions with empty notes are skipped. With `include_tag` each version's
/// notes are preceded by a `## <tag>` heading so a multi-version changelog
/// stays readable.
pub fn merge(versions: &[Version], include_tag: bool) -> String {
    versions
        .iter()
        .filter_map(|version| {
            let notes = version.notes.trim();
            if notes.is_empty() {
                return None;
            }

            if include_tag {
                Some(format!("## {}\n\n{}", version.tag, notes))
            } else {
                Some(notes.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
