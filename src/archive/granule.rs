use serde::Deserialize;

const DATA_LINK_REL: &str = "http://esipfed.org/ns/fedsearch/1.1/data#";

/// One file of the collection as returned by a granule search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Granule {
    pub id: String,
    pub title: String,
    pub data_links: Vec<String>,
}

impl Granule {
    pub fn new(id: impl Into<String>, title: impl Into<String>, data_links: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            data_links,
        }
    }

    /// The HTTPS link to the `.nc4` file, or the first data link if none matches.
    pub fn data_url(&self) -> Option<&str> {
        self.data_links
            .iter()
            .find(|href| href.starts_with("https://") && href.ends_with(".nc4"))
            .or_else(|| self.data_links.first())
            .map(String::as_str)
    }

    /// Name under which the granule is stored in the cache directory.
    pub fn file_name(&self) -> String {
        self.data_url()
            .and_then(|url| url.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.title
                    .rsplit(':')
                    .next()
                    .unwrap_or(&self.title)
                    .to_string()
            })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CmrResponse {
    feed: CmrFeed,
}

#[derive(Debug, Deserialize)]
struct CmrFeed {
    #[serde(default)]
    entry: Vec<CmrEntry>,
}

#[derive(Debug, Deserialize)]
struct CmrEntry {
    id: String,
    title: String,
    #[serde(default)]
    links: Vec<CmrLink>,
}

#[derive(Debug, Deserialize)]
struct CmrLink {
    rel: String,
    href: String,
    #[serde(default)]
    inherited: bool,
}

/// Error body of a rejected CMR search.
#[derive(Debug, Deserialize)]
pub(crate) struct CmrErrors {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl CmrResponse {
    pub(crate) fn into_granules(self) -> Vec<Granule> {
        self.feed
            .entry
            .into_iter()
            .map(|entry| {
                let data_links = entry
                    .links
                    .into_iter()
                    .filter(|link| link.rel == DATA_LINK_REL && !link.inherited)
                    .map(|link| link.href)
                    .collect();
                Granule::new(entry.id, entry.title, data_links)
            })
            .collect()
    }
}
