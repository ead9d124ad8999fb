//! Encoded deep-link strings for jumping straight to a widget state.

/// Token separating the segments of an encoded deep link.
pub const SEPARATOR: &str = "->*cbhdeeplink^&^cbhdeeplink*->";

/// Browsing context a URL deep link opens into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlTarget {
    New,
    Current,
}

/// A parsed navigation intent, consumed immediately after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLink {
    /// Internal navigation to `(tab, view, element)`. An element of `null`
    /// (or an empty segment) is the "start new" sentinel.
    Navigate {
        tab: String,
        view: String,
        element: Option<String>,
    },
    /// External navigation. An unrecognized target segment falls back to the
    /// current browsing context.
    Url { url: String, target: UrlTarget },
}

#[derive(Debug, thiserror::Error)]
pub enum DeepLinkError {
    #[error("expected 3 deep-link segments, got {got}: {input:?}")]
    WrongSegmentCount { got: usize, input: String },
    #[error("url deep link is missing its target segment: {input:?}")]
    MissingUrlTarget { input: String },
}

impl DeepLink {
    pub fn parse(raw: &str) -> Result<Self, DeepLinkError> {
        let parts: Vec<&str> = raw.split(SEPARATOR).collect();
        if raw.starts_with("http") {
            if parts.len() < 2 {
                return Err(DeepLinkError::MissingUrlTarget {
                    input: raw.to_owned(),
                });
            }
            let target = match parts[1] {
                "new" => UrlTarget::New,
                _ => UrlTarget::Current,
            };
            return Ok(Self::Url {
                url: parts[0].to_owned(),
                target,
            });
        }
        if parts.len() != 3 {
            return Err(DeepLinkError::WrongSegmentCount {
                got: parts.len(),
                input: raw.to_owned(),
            });
        }
        let element = match parts[2] {
            "" | "null" => None,
            other => Some(other.to_owned()),
        };
        Ok(Self::Navigate {
            tab: parts[0].to_owned(),
            view: parts[1].to_owned(),
            element,
        })
    }
}
