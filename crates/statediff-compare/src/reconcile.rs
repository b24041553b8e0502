//! Highest common version of two trees.

use statediff_types::Version;

use crate::error::{CompareError, CompareResult, Side};

/// Return the highest version present in both `left` and `right`.
///
/// Inputs may be in any order and contain duplicates. Version `0` is the
/// "latest" sentinel, never a committed version, and is ignored.
///
/// Walks both sorted sets from the top, so the first match is the answer.
pub fn reconcile(left: &[Version], right: &[Version]) -> CompareResult<Version> {
    let l = normalize(left);
    let r = normalize(right);
    if l.is_empty() {
        return Err(CompareError::NoVersions { side: Side::Left });
    }
    if r.is_empty() {
        return Err(CompareError::NoVersions { side: Side::Right });
    }

    let (mut i, mut j) = (l.len(), r.len());
    while i > 0 && j > 0 {
        let (a, b) = (l[i - 1], r[j - 1]);
        if a == b {
            return Ok(a);
        }
        if a > b {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    Err(CompareError::NoCommonVersion {
        left: l,
        right: r,
    })
}

fn normalize(versions: &[Version]) -> Vec<Version> {
    let mut out: Vec<Version> = versions.iter().copied().filter(|v| *v > 0).collect();
    out.sort_unstable();
    out.dedup();
    out
}
