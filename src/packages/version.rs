//! Package versions and version specifiers.
//!
//! Implements the subset of PEP 440 needed to decide whether a version
//! already installed in an ancestor environment satisfies a request such
//! as `numpy>=1.24,<2`. Installed versions are always eligible, including
//! pre-releases, matching how installers treat already-installed packages.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)
        ^v?
        (?:(?P<epoch>\d+)!)?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre_l>a|b|c|rc|alpha|beta|pre|preview)[-_.]?(?P<pre_n>\d+)?)?
        (?:-(?P<post_n1>\d+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>\d+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>\d+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        $",
    )
    .expect("version regex is valid")
});

/// Pre-release phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

/// A parsed version.
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreRelease, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Option<String>,
}

/// Error returned for strings that are not versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError(pub String);

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version: {}", self.0)
    }
}

impl std::error::Error for VersionParseError {}

fn parse_number(value: Option<regex::Match<'_>>) -> u64 {
    value.and_then(|m| m.as_str().parse().ok()).unwrap_or(0)
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = VERSION_RE
            .captures(s.trim())
            .ok_or_else(|| VersionParseError(s.to_string()))?;

        let release = caps["release"]
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionParseError(s.to_string()))?;

        let pre = caps.name("pre_l").map(|label| {
            let phase = match label.as_str().to_ascii_lowercase().as_str() {
                "a" | "alpha" => PreRelease::Alpha,
                "b" | "beta" => PreRelease::Beta,
                _ => PreRelease::Rc,
            };
            (phase, parse_number(caps.name("pre_n")))
        });

        let post = if let Some(n) = caps.name("post_n1") {
            Some(parse_number(Some(n)))
        } else {
            caps.name("post_l")
                .map(|_| parse_number(caps.name("post_n2")))
        };

        let dev = caps.name("dev_l").map(|_| parse_number(caps.name("dev_n")));

        Ok(Self {
            epoch: parse_number(caps.name("epoch")),
            release,
            pre,
            post,
            dev,
            local: caps.name("local").map(|m| m.as_str().to_ascii_lowercase()),
        })
    }
}

impl Version {
    /// Release segment `i`, with missing trailing segments reading as zero.
    fn segment(&self, i: usize) -> u64 {
        self.release.get(i).copied().unwrap_or(0)
    }

    fn cmp_release(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    // A bare dev release (1.0.dev1) sorts before every pre-release of the
    // same release; a final release sorts after all of them.
    fn pre_key(&self) -> (u8, u64) {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (0, 0),
            (Some((PreRelease::Alpha, n)), _, _) => (1, n),
            (Some((PreRelease::Beta, n)), _, _) => (2, n),
            (Some((PreRelease::Rc, n)), _, _) => (3, n),
            (None, _, _) => (4, 0),
        }
    }

    fn post_key(&self) -> (u8, u64) {
        self.post.map_or((0, 0), |n| (1, n))
    }

    fn dev_key(&self) -> (u8, u64) {
        self.dev.map_or((1, 0), |n| (0, n))
    }

    /// Whether the release segments start with `prefix` (used by `==X.Y.*`).
    fn release_starts_with(&self, prefix: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, part)| self.segment(i) == *part)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.cmp_release(other))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post_key().cmp(&other.post_key()))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Comparison operator of a single specifier clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterEqual,
    LessEqual,
    Greater,
    Less,
    Compatible,
    Arbitrary,
}

impl Operator {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::Compatible => "~=",
            Self::Arbitrary => "===",
        }
    }
}

/// One clause such as `>=1.2` or `==2.*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub operator: Operator,
    pub version: String,
    pub wildcard: bool,
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator.as_str(), self.version)?;
        if self.wildcard {
            write!(f, ".*")?;
        }
        Ok(())
    }
}

impl FromStr for Specifier {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Longest operators first so `===` is not read as `==`.
        const OPERATORS: [(&str, Operator); 8] = [
            ("===", Operator::Arbitrary),
            ("~=", Operator::Compatible),
            ("==", Operator::Equal),
            ("!=", Operator::NotEqual),
            (">=", Operator::GreaterEqual),
            ("<=", Operator::LessEqual),
            (">", Operator::Greater),
            ("<", Operator::Less),
        ];

        let (operator, rest) = OPERATORS
            .iter()
            .find_map(|(token, op)| s.strip_prefix(token).map(|rest| (*op, rest.trim())))
            .ok_or_else(|| VersionParseError(s.to_string()))?;

        if rest.is_empty() {
            return Err(VersionParseError(s.to_string()));
        }

        let (version, wildcard) = match rest.strip_suffix(".*") {
            Some(prefix) if matches!(operator, Operator::Equal | Operator::NotEqual) => {
                (prefix.to_string(), true)
            }
            Some(_) => return Err(VersionParseError(s.to_string())),
            None => (rest.to_string(), false),
        };

        if operator != Operator::Arbitrary {
            let parsed: Version = version.parse()?;
            if operator == Operator::Compatible && parsed.release.len() < 2 {
                return Err(VersionParseError(s.to_string()));
            }
        }

        Ok(Self {
            operator,
            version,
            wildcard,
        })
    }
}

impl Specifier {
    /// Check whether `candidate` satisfies this clause.
    pub fn contains(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();

        if self.operator == Operator::Arbitrary {
            return candidate.eq_ignore_ascii_case(&self.version);
        }

        let (Ok(have), Ok(want)) = (candidate.parse::<Version>(), self.version.parse::<Version>())
        else {
            // Unparseable versions only support literal comparison.
            return match self.operator {
                Operator::Equal => !self.wildcard && candidate == self.version,
                Operator::NotEqual => self.wildcard || candidate != self.version,
                _ => false,
            };
        };

        match self.operator {
            Operator::Equal if self.wildcard => {
                have.epoch == want.epoch && have.release_starts_with(&want.release)
            }
            Operator::NotEqual if self.wildcard => {
                !(have.epoch == want.epoch && have.release_starts_with(&want.release))
            }
            Operator::Equal => have == want,
            Operator::NotEqual => have != want,
            Operator::GreaterEqual => have >= want,
            Operator::LessEqual => have <= want,
            Operator::Greater => have > want,
            Operator::Less => have < want,
            Operator::Compatible => {
                let prefix = &want.release[..want.release.len() - 1];
                have >= want && have.epoch == want.epoch && have.release_starts_with(prefix)
            }
            Operator::Arbitrary => unreachable!("handled above"),
        }
    }
}

/// A comma-separated list of clauses that must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierSet {
    pub specifiers: Vec<Specifier>,
}

impl FromStr for SpecifierSet {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let specifiers = s
            .split(',')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Specifier>, _>>()?;
        Ok(Self { specifiers })
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.specifiers.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(","))
    }
}

impl SpecifierSet {
    /// Whether the set has no clauses (any version satisfies it).
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Check whether `candidate` satisfies every clause.
    pub fn contains(&self, candidate: &str) -> bool {
        self.specifiers.iter().all(|spec| spec.contains(candidate))
    }
}
