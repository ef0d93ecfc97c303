//! The packed-refs snapshot format: a consolidated file of direct,
//! non-`HEAD` refs.

use crate::hash::ObjectHash;

const HEADER: &str = "# pack-refs with: peeled fully-peeled sorted\n";

/// Serializes a sorted (by name) set of `(id, name)` pairs into the
/// packed-refs wire format.
pub fn serialize(mut entries: Vec<(ObjectHash, String)>) -> String {
    entries.sort_by(|a, b| a.1.cmp(&b.1));
    let mut out = String::from(HEADER);
    for (id, name) in entries {
        out.push_str(&format!("{id} {name}\n"));
    }
    out
}

/// Parses the packed-refs format back into `(id, name)` pairs. Comment
/// lines (`#`) and peeled-tag annotation lines (`^`) are ignored.
pub fn parse(text: &str) -> Vec<(ObjectHash, String)> {
    let mut out = Vec::new();
    for line in text.lines() {
        if line.starts_with('#') || line.starts_with('^') || line.is_empty() {
            continue;
        }
        if let Some((id, name)) = line.split_once(' ')
            && let Ok(id) = id.parse::<ObjectHash>()
        {
            out.push((id, name.to_string()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_sorted_entries() {
        let id = ObjectHash::from_bytes(&[1u8; 20]).unwrap();
        let text = serialize(vec![(id, "refs/heads/main".to_string())]);
        assert!(text.starts_with(HEADER));
        assert_eq!(parse(&text), vec![(id, "refs/heads/main".to_string())]);
    }

    #[test]
    fn ignores_peeled_tag_lines() {
        let id = ObjectHash::from_bytes(&[1u8; 20]).unwrap();
        let text = format!("{HEADER}{id} refs/tags/v1\n^{id}\n");
        assert_eq!(parse(&text), vec![(id, "refs/tags/v1".to_string())]);
    }
}
