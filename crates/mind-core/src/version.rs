//! Semantic-version ordering and bump rules for Mind tags.
//!
//! Versions are stored in history as annotated tags named `v<semver>`. The
//! newest one is found by comparing precedence, never by sorting tag names:
//! `v0.0.10` sorts before `v0.0.9` as a string but is the newer release.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease};
use serde::{Deserialize, Serialize};

pub use semver::Version;

/// Prefix of every version tag name.
pub const TAG_PREFIX: &str = "v";

/// Version tagged on the root commit of every Mind.
pub const BASE_VERSION: Version = Version::new(0, 0, 0);

const PRERELEASE_TOKEN: &str = "rc";
const BUILD_TOKEN: &str = "build";

// =============================================================================
// Tags
// =============================================================================

/// Tag name for a version, e.g. `v1.0.0-rc.1`.
pub fn tag_name(version: &Version) -> String {
    format!("{TAG_PREFIX}{version}")
}

/// Parse a tag name (short or `refs/tags/...`) back into a version.
///
/// Returns `None` for tags that are not version tags.
pub fn parse_tag(name: &str) -> Option<Version> {
    let short = name.strip_prefix("refs/tags/").unwrap_or(name);
    Version::parse(short.strip_prefix(TAG_PREFIX)?).ok()
}

/// True for the untouched template version `0.0.0` (no prerelease, no build).
pub fn is_base(version: &Version) -> bool {
    *version == BASE_VERSION
}

// =============================================================================
// Ordering
// =============================================================================

/// Semantic-version precedence. Build metadata is ignored.
pub fn precedence(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| cmp_prerelease(a.pre.as_str(), b.pre.as_str()))
}

/// Ordering used to pick the newest tag in a history.
///
/// Precedence first; equal precedence is broken by build metadata so that a
/// build save is newer than the version it was cut from. The base version
/// sits below everything else since it only marks the template commit.
pub fn newest(a: &Version, b: &Version) -> Ordering {
    match (is_base(a), is_base(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => precedence(a, b)
            .then_with(|| cmp_build(a.build.as_str(), b.build.as_str())),
    }
}

fn cmp_prerelease(a: &str, b: &str) -> Ordering {
    // A release outranks any prerelease of the same triple.
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => cmp_identifiers(a, b),
    }
}

fn cmp_build(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => cmp_identifiers(a, b),
    }
}

/// Field-by-field comparison of dot-separated identifiers.
fn cmp_identifiers(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match cmp_identifier(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

fn cmp_identifier(x: &str, y: &str) -> Ordering {
    match (is_numeric(x), is_numeric(y)) {
        // Compare digit strings by magnitude without parsing, so arbitrarily
        // long identifiers cannot overflow.
        (true, true) => {
            let x = x.trim_start_matches('0');
            let y = y.trim_start_matches('0');
            x.len().cmp(&y.len()).then_with(|| x.cmp(y))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.cmp(y),
    }
}

fn is_numeric(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Bumping
// =============================================================================

/// Kind of increment applied by a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    Major,
    Minor,
    Patch,
    Prerelease,
    Build,
}

impl Bump {
    /// All bump kinds, most significant first.
    pub const ALL: [Bump; 5] = [
        Bump::Major,
        Bump::Minor,
        Bump::Patch,
        Bump::Prerelease,
        Bump::Build,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bump::Major => "major",
            Bump::Minor => "minor",
            Bump::Patch => "patch",
            Bump::Prerelease => "prerelease",
            Bump::Build => "build",
        }
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bump {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bump::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown bump '{s}', expected one of major, minor, patch, prerelease, build")
            })
    }
}

/// Apply a bump of the given kind.
pub fn bump(kind: Bump, version: &Version) -> Result<Version, semver::Error> {
    match kind {
        Bump::Major => Ok(bump_major(version)),
        Bump::Minor => Ok(bump_minor(version)),
        Bump::Patch => Ok(bump_patch(version)),
        Bump::Prerelease => bump_prerelease(version),
        Bump::Build => bump_build(version),
    }
}

/// `x.y.z` → `(x+1).0.0`, clearing prerelease and build.
pub fn bump_major(version: &Version) -> Version {
    Version::new(version.major + 1, 0, 0)
}

/// `x.y.z` → `x.(y+1).0`, clearing prerelease and build.
pub fn bump_minor(version: &Version) -> Version {
    Version::new(version.major, version.minor + 1, 0)
}

/// `x.y.z` → `x.y.(z+1)`, clearing prerelease and build.
pub fn bump_patch(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch + 1)
}

/// Next prerelease: `1.2.3-rc.1` → `1.2.3-rc.2`, `1.2.3` → `1.2.4-rc.1`,
/// and the base version `0.0.0` → `0.0.0-rc.1`. Build metadata is cleared.
pub fn bump_prerelease(version: &Version) -> Result<Version, semver::Error> {
    let (patch, pre) = if !version.pre.is_empty() {
        (version.patch, increment_identifiers(version.pre.as_str()))
    } else if is_base(version) {
        (version.patch, format!("{PRERELEASE_TOKEN}.1"))
    } else {
        (version.patch + 1, format!("{PRERELEASE_TOKEN}.1"))
    };

    Ok(Version {
        major: version.major,
        minor: version.minor,
        patch,
        pre: Prerelease::new(&pre)?,
        build: BuildMetadata::EMPTY,
    })
}

/// Next build: `1.2.3-rc.1+build.1` → `1.2.3-rc.1+build.2`, `1.2.3` → `1.2.3+build.1`.
pub fn bump_build(version: &Version) -> Result<Version, semver::Error> {
    let build = if version.build.is_empty() {
        format!("{BUILD_TOKEN}.1")
    } else {
        increment_identifiers(version.build.as_str())
    };

    Ok(Version {
        build: BuildMetadata::new(&build)?,
        ..version.clone()
    })
}

/// Increment the trailing numeric identifier, or append `.1` when the last
/// identifier is alphanumeric.
fn increment_identifiers(identifiers: &str) -> String {
    match identifiers.rsplit_once('.') {
        Some((head, last)) => match increment_numeric(last) {
            Some(next) => format!("{head}.{next}"),
            None => format!("{identifiers}.1"),
        },
        None => match increment_numeric(identifiers) {
            Some(next) => next,
            None => format!("{identifiers}.1"),
        },
    }
}

fn increment_numeric(identifier: &str) -> Option<String> {
    if !is_numeric(identifier) {
        return None;
    }
    identifier
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_add(1))
        .map(|n| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn max_of(tags: &[&str]) -> Version {
        tags.iter()
            .filter_map(|t| parse_tag(t))
            .max_by(newest)
            .unwrap()
    }

    #[test]
    fn test_tag_round_trip() {
        let version = v("0.0.0-rc.1+build.1");
        assert_eq!(tag_name(&version), "v0.0.0-rc.1+build.1");
        assert_eq!(parse_tag("v0.0.0-rc.1+build.1"), Some(version.clone()));
        assert_eq!(parse_tag("refs/tags/v0.0.0-rc.1+build.1"), Some(version));
        assert_eq!(parse_tag("release-1"), None);
        assert_eq!(parse_tag("vnext"), None);
    }

    #[test]
    fn test_numeric_fields_compare_numerically() {
        assert_eq!(max_of(&["v0.0.9", "v0.0.10"]), v("0.0.10"));
        assert_eq!(max_of(&["v0.10.0", "v0.9.9", "v0.2.0"]), v("0.10.0"));
        assert_eq!(max_of(&["v9.0.0", "v10.0.0"]), v("10.0.0"));
    }

    #[test]
    fn test_prerelease_precedence() {
        // Example chain from semver.org §11.
        let chain = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        for pair in chain.windows(2) {
            assert_eq!(
                precedence(&v(pair[0]), &v(pair[1])),
                Ordering::Less,
                "{} < {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_build_metadata_ignored_by_precedence() {
        assert_eq!(
            precedence(&v("1.0.0+build.1"), &v("1.0.0+build.9")),
            Ordering::Equal
        );
        assert_eq!(
            newest(&v("1.0.0+build.2"), &v("1.0.0+build.10")),
            Ordering::Less
        );
        assert_eq!(newest(&v("1.0.0"), &v("1.0.0+build.1")), Ordering::Less);
    }

    #[test]
    fn test_base_version_ranks_lowest() {
        assert_eq!(newest(&v("0.0.0"), &v("0.0.0-rc.1")), Ordering::Less);
        assert_eq!(newest(&v("0.0.0"), &v("0.0.0+build.1")), Ordering::Less);
        assert_eq!(newest(&v("0.0.0"), &v("0.0.0")), Ordering::Equal);
        assert_eq!(max_of(&["v0.0.0"]), BASE_VERSION);
    }

    #[test]
    fn test_bump_release_fields() {
        let version = v("1.2.3-rc.4+build.5");
        assert_eq!(bump_major(&version), v("2.0.0"));
        assert_eq!(bump_minor(&version), v("1.3.0"));
        assert_eq!(bump_patch(&version), v("1.2.4"));
    }

    #[test]
    fn test_bump_prerelease() {
        assert_eq!(bump_prerelease(&v("0.0.0")).unwrap(), v("0.0.0-rc.1"));
        assert_eq!(bump_prerelease(&v("0.0.0-rc.1")).unwrap(), v("0.0.0-rc.2"));
        assert_eq!(bump_prerelease(&v("1.2.3")).unwrap(), v("1.2.4-rc.1"));
        assert_eq!(
            bump_prerelease(&v("1.2.3-rc.1+build.7")).unwrap(),
            v("1.2.3-rc.2")
        );
        assert_eq!(bump_prerelease(&v("1.0.0-alpha")).unwrap(), v("1.0.0-alpha.1"));
        assert_eq!(bump_prerelease(&v("1.0.0-9")).unwrap(), v("1.0.0-10"));
    }

    #[test]
    fn test_bump_build() {
        assert_eq!(bump_build(&v("0.0.0-rc.1")).unwrap(), v("0.0.0-rc.1+build.1"));
        assert_eq!(
            bump_build(&v("0.0.0-rc.1+build.1")).unwrap(),
            v("0.0.0-rc.1+build.2")
        );
        assert_eq!(bump_build(&v("2.0.0+sha")).unwrap(), v("2.0.0+sha.1"));
    }

    #[test]
    fn test_every_bump_is_newer() {
        let starts = ["0.0.0", "0.0.0-rc.1", "0.0.1", "1.2.3-beta+exp.sha", "3.0.0+build.9"];
        for start in starts {
            let start = v(start);
            for kind in Bump::ALL {
                let next = bump(kind, &start).unwrap();
                assert_eq!(
                    newest(&next, &start),
                    Ordering::Greater,
                    "{kind} of {start} gave {next}"
                );
            }
        }
    }

    #[test]
    fn test_save_sequence() {
        let mut version = BASE_VERSION;
        let expected = [
            (Bump::Prerelease, "0.0.0-rc.1"),
            (Bump::Build, "0.0.0-rc.1+build.1"),
            (Bump::Patch, "0.0.1"),
            (Bump::Minor, "0.1.0"),
            (Bump::Major, "1.0.0"),
        ];
        for (kind, want) in expected {
            version = bump(kind, &version).unwrap();
            assert_eq!(version.to_string(), want);
        }
    }

    #[test]
    fn test_bump_parse_and_serde() {
        assert_eq!("Patch".parse::<Bump>(), Ok(Bump::Patch));
        assert!("tiny".parse::<Bump>().is_err());
        assert_eq!(serde_json::to_string(&Bump::Prerelease).unwrap(), "\"prerelease\"");
    }
}
