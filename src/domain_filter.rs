use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as, skip_serializing_none};

/// The way to tell the orchestrator what kind of domains a provider could
/// handle.
/// The domain names used here does not accept the trailing dot.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all_fields = "camelCase", untagged)]
pub enum DomainFilter {
    Strings {
        include: Option<Vec<String>>,
        exclude: Option<Vec<String>>,
    },
    Regex {
        #[serde_as(as = "Option<DisplayFromStr>")]
        regex_include: Option<Regex>,
        #[serde_as(as = "Option<DisplayFromStr>")]
        regex_exclude: Option<Regex>,
    },
}
impl DomainFilter {
    /// A filter that lets every domain through.
    /// This is what a remote provider reports, as its real filter lives in
    /// the remote process and cannot be observed from here.
    pub fn accept_all() -> Self {
        DomainFilter::Strings {
            include: None,
            exclude: None,
        }
    }

    pub fn is_accept_all(&self) -> bool {
        match self {
            DomainFilter::Strings { include, exclude } => {
                include.as_ref().is_none_or(Vec::is_empty)
                    && exclude.as_ref().is_none_or(Vec::is_empty)
            }
            DomainFilter::Regex {
                regex_include,
                regex_exclude,
            } => regex_include.is_none() && regex_exclude.is_none(),
        }
    }

    /// Whether `domain` is handled under this filter.
    /// Plain names match the domain itself and every subdomain of it, a
    /// leading dot only matches subdomains. Exclusion wins over inclusion.
    pub fn matches(&self, domain: &str) -> bool {
        let domain = domain.trim_end_matches('.').to_ascii_lowercase();
        match self {
            DomainFilter::Strings { include, exclude } => {
                let included = match include.as_deref() {
                    None | Some([]) => true,
                    Some(include) => include.iter().any(|f| suffix_match(&domain, f)),
                };
                let excluded = exclude
                    .as_deref()
                    .is_some_and(|exclude| exclude.iter().any(|f| suffix_match(&domain, f)));
                included && !excluded
            }
            DomainFilter::Regex {
                regex_include,
                regex_exclude,
            } => {
                regex_include.as_ref().is_none_or(|r| r.is_match(&domain))
                    && !regex_exclude.as_ref().is_some_and(|r| r.is_match(&domain))
            }
        }
    }
}
impl Default for DomainFilter {
    fn default() -> Self {
        Self::accept_all()
    }
}

fn suffix_match(domain: &str, filter: &str) -> bool {
    let filter = filter.trim().trim_end_matches('.').to_ascii_lowercase();
    if filter.is_empty() {
        return false;
    }
    if filter.starts_with('.') {
        domain.ends_with(&filter)
    } else {
        domain == filter || domain.ends_with(&format!(".{filter}"))
    }
}
