use std::fmt;

/// `userinfo@host:port` of a hierarchical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    pub userinfo: Option<String>,
    pub hostname: String,
    pub port: Option<String>,
}

impl Authority {
    fn parse(raw: &str) -> Self {
        let (userinfo, host_port) = match raw.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo.to_string()), host_port),
            None => (None, raw),
        };
        // A bracketed IPv6 host never ends in `:digits`, so it stays whole.
        let (hostname, port) = match host_port.rsplit_once(':') {
            Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                (host, Some(port.to_string()))
            }
            _ => (host_port, None),
        };
        Self {
            userinfo,
            hostname: hostname.to_ascii_lowercase(),
            port,
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(userinfo) = &self.userinfo {
            write!(f, "{userinfo}@")?;
        }
        f.write_str(&self.hostname)?;
        if let Some(port) = &self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

/// A document or link URL, split just far enough to resolve anchor hrefs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParts {
    pub scheme: String,
    /// `None` for opaque URLs such as `mailto:` or `javascript:`.
    pub authority: Option<Authority>,
    pub path: String,
    /// Includes the leading `?` when present.
    pub query: String,
    /// Includes the leading `#` when present.
    pub fragment: String,
}

impl LocationParts {
    pub fn parse(input: &str) -> Option<Self> {
        let (scheme, rest) = input.trim().split_once(':')?;
        if !is_valid_url_scheme(scheme) {
            return None;
        }
        let scheme = scheme.to_ascii_lowercase();

        let Some(hierarchical) = rest.strip_prefix("//") else {
            let (path, query, fragment) = split_suffixes(rest);
            return Some(Self {
                scheme,
                authority: None,
                path: path.to_string(),
                query: query.to_string(),
                fragment: fragment.to_string(),
            });
        };
        let boundary = hierarchical
            .find(|ch| matches!(ch, '/' | '?' | '#'))
            .unwrap_or(hierarchical.len());
        let (authority, tail) = hierarchical.split_at(boundary);
        let (path, query, fragment) = split_suffixes(tail);
        Some(Self {
            scheme,
            authority: Some(Authority::parse(authority)),
            path: normalize_pathname(path),
            query: query.to_string(),
            fragment: fragment.to_string(),
        })
    }

    pub fn href(&self) -> String {
        let mut out = format!("{}:", self.scheme);
        if let Some(authority) = &self.authority {
            out.push_str("//");
            out.push_str(&authority.to_string());
        }
        out.push_str(&self.path);
        out.push_str(&self.query);
        out.push_str(&self.fragment);
        out
    }

    /// Resolves `input` the way an anchor resolves its `href` against the
    /// document URL.
    pub fn resolve(&self, input: &str) -> String {
        let input = input.trim();
        if input.is_empty() {
            return self.href();
        }
        if let Some(absolute) = Self::parse(input) {
            return absolute.href();
        }
        if input.starts_with("//") {
            return Self::parse(&format!("{}:{input}", self.scheme))
                .map_or_else(|| input.to_string(), |parts| parts.href());
        }

        let (path, query, fragment) = split_suffixes(input);
        let mut next = self.clone();
        next.fragment = fragment.to_string();
        if path.is_empty() {
            if !input.starts_with('#') {
                next.query = query.to_string();
            }
            return next.href();
        }

        next.query = query.to_string();
        next.path = match (&self.authority, path.starts_with('/')) {
            (None, _) => path.to_string(),
            (Some(_), true) => normalize_pathname(path),
            (Some(_), false) => {
                let dir = self.path.rsplit_once('/').map_or("", |(dir, _)| dir);
                normalize_pathname(&format!("{dir}/{path}"))
            }
        };
        next.href()
    }
}

pub fn is_valid_url_scheme(scheme: &str) -> bool {
    scheme
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

/// Splits `path?query#fragment`, keeping the delimiters on the suffixes.
fn split_suffixes(input: &str) -> (&str, &str, &str) {
    let (before_fragment, fragment) = input
        .find('#')
        .map_or((input, ""), |pos| input.split_at(pos));
    let (path, query) = before_fragment
        .find('?')
        .map_or((before_fragment, ""), |pos| before_fragment.split_at(pos));
    (path, query, fragment)
}

/// Collapses `.` and `..` segments of a hierarchical path. The result
/// always starts with `/`.
fn normalize_pathname(path: &str) -> String {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    let keeps_trailing_slash = ["/", "/.", "/.."].iter().any(|end| path.ends_with(end));
    let mut out = format!("/{}", segments.join("/"));
    if keeps_trailing_slash && out.len() > 1 {
        out.push('/');
    }
    out
}
