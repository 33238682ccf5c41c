//! Allow-list of paths that bypass the gateway.
//!
//! Patterns use Ant-style wildcards:
//!
//! - `/health` matches exactly `/health` (a trailing slash is ignored)
//! - `/users/*` matches one segment, `*` never crosses a `/`
//! - `/.well-known/**` matches `/.well-known` and anything below it

/// Compiled public-path patterns.
#[derive(Debug, Clone, Default)]
pub struct PublicPaths {
    patterns: Vec<Vec<String>>,
}

impl PublicPaths {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| segments(p.as_ref()).map(str::to_string).collect())
                .collect(),
        }
    }

    /// Whether `path` is reachable without a bearer token.
    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = segments(path).collect();

        // Dot segments are never public; routing does not resolve them.
        if path.iter().any(|s| *s == "." || *s == "..") {
            return false;
        }

        self.patterns.iter().any(|pattern| {
            let pattern: Vec<&str> = pattern.iter().map(String::as_str).collect();
            segments_match(&pattern, &path)
        })
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn segments_match(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len())
            .any(|skip| path.get(skip..).is_some_and(|tail| segments_match(rest, tail))),
        Some((head, rest)) => match path.split_first() {
            Some((segment, tail)) => segment_matches(head, segment) && segments_match(rest, tail),
            None => false,
        },
    }
}

/// Glob match for a single segment where `*` matches any run of characters.
fn segment_matches(pattern: &str, segment: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == segment;
    }

    let mut parts = pattern.split('*');
    let Some(mut rest) = parts.next().and_then(|prefix| segment.strip_prefix(prefix)) else {
        return false;
    };

    let mut middle: Vec<&str> = parts.collect();
    let suffix = middle.pop().unwrap_or("");

    for part in middle {
        match rest.find(part) {
            Some(at) => rest = rest.get(at + part.len()..).unwrap_or(""),
            None => return false,
        }
    }

    rest.len() >= suffix.len() && rest.ends_with(suffix)
}
