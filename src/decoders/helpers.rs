/// Find the earliest occurrence of any of `markers` in `text`.
///
/// Returns the byte offset of the match and the index of the marker in
/// `markers`. When two markers match at the same offset the longer one wins.
/// Empty markers never match.
pub fn find_first_marker(text: &str, markers: &[&str]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;

    for (index, marker) in markers.iter().enumerate() {
        if marker.is_empty() {
            continue;
        }
        if let Some(pos) = text.find(marker) {
            best = match best {
                Some((best_pos, best_index))
                    if best_pos < pos
                        || (best_pos == pos && markers[best_index].len() >= marker.len()) =>
                {
                    Some((best_pos, best_index))
                }
                _ => Some((pos, index)),
            };
        }
    }

    best
}

/// Length in bytes of the longest suffix of `text` that is a proper prefix
/// of one of `markers`.
///
/// That suffix cannot be classified yet: the next chunk may complete it into
/// a marker.
pub fn partial_marker_len(text: &str, markers: &[&str]) -> usize {
    let mut longest = 0;

    for marker in markers {
        for len in (1..marker.len()).rev() {
            if len <= longest {
                break;
            }
            if !marker.is_char_boundary(len) {
                continue;
            }
            if text.ends_with(&marker[..len]) {
                longest = len;
                break;
            }
        }
    }

    longest
}

/// Split `text` into the part that can be classified now and the withheld
/// tail that may still grow into one of `markers`.
pub fn split_partial_marker<'a>(text: &'a str, markers: &[&str]) -> (&'a str, &'a str) {
    let hold = partial_marker_len(text, markers);
    text.split_at(text.len() - hold)
}
