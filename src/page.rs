//! Fetched page contents.

use scraper::Html;

use crate::category::PageCategory;
use crate::url::PageUrl;

/// One fetched netkeiba page: the origin URL, its category tag and the
/// parsed document tree. Created once per successful fetch and read-only
/// afterwards; the tree is owned exclusively by this value.
pub struct Page {
    url: PageUrl,
    html: Html,
}

impl Page {
    pub(crate) fn new(url: PageUrl, html: Html) -> Page {
        Page { url, html }
    }

    /// Build a page from an HTML string, e.g. a document saved to disk.
    pub fn from_html(url: PageUrl, html: &str) -> Page {
        Page {
            url,
            html: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        self.url.url()
    }

    pub fn category(&self) -> PageCategory {
        self.url.category()
    }

    pub fn html(&self) -> &Html {
        &self.html
    }
}
