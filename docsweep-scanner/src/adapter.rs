//! Per-vendor navigation descriptors.
//!
//! Each help portal renders its sidebar differently. Instead of one collector
//! per vendor, the discovery engine is written once against the capability set
//! below and every vendor contributes a static [`VendorAdapter`] value.

use crate::result::canonical_url;
use url::Url;

/// How to reach the clickable element from a collapsed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The collapsed node is itself the click target.
    Itself,
    /// Click the nearest ancestor-or-self matching the selector.
    Closest(&'static str),
}

/// Where the display title of a navigation link comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    AnchorText,
    /// Text of the first descendant matching the selector.
    Descendant(&'static str),
}

/// Stable identity of a collapsed node across re-queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKey {
    /// Value of a vendor attribute; falls back to the structural signature when absent.
    Attribute(&'static str),
    /// Child-index path from the document root.
    Structural,
}

/// A resolved sidebar href awaiting classification.
#[derive(Debug, Clone, Copy)]
pub struct LinkCandidate<'a> {
    pub href: &'a str,
    pub absolute: &'a Url,
    pub base: &'a Url,
}

pub type DocumentFilter = fn(&LinkCandidate<'_>) -> bool;
pub type Canonicalizer = fn(&Url) -> String;

#[derive(Debug, Clone)]
pub struct VendorAdapter {
    pub vendor: &'static str,
    pub default_base_url: &'static str,
    pub sidebar_selector: &'static str,
    pub collapsed_selector: &'static str,
    pub trigger: Trigger,
    pub node_key: NodeKey,
    pub link_selector: &'static str,
    /// Attributes consulted in order for the link target.
    pub href_attributes: &'static [&'static str],
    pub title_source: TitleSource,
    pub is_valid_document: DocumentFilter,
    pub canonicalize: Canonicalizer,
}

impl VendorAdapter {
    /// Looks up a built-in adapter by vendor key (case-insensitive).
    pub fn for_vendor(vendor: &str) -> Option<&'static VendorAdapter> {
        let vendor = vendor.to_lowercase();
        BUILTIN_ADAPTERS.iter().find(|adapter| adapter.vendor == vendor)
    }

    pub fn builtin() -> &'static [VendorAdapter] {
        BUILTIN_ADAPTERS
    }

    /// Resolves a sidebar href against the vendor base URL.
    ///
    /// Empty, fragment-only and non-navigational (`javascript:`, `mailto:`,
    /// `tel:`) hrefs yield `None`.
    pub fn resolve(&self, base: &Url, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            return None;
        }
        join_base(base).join(href).ok()
    }
}

/// The configured base is treated as a directory so relative hrefs land
/// beneath it rather than replacing its last segment.
pub fn join_base(base: &Url) -> Url {
    if base.path().ends_with('/') {
        return base.clone();
    }
    let mut directory = base.clone();
    let path = format!("{}/", base.path());
    directory.set_path(&path);
    directory
}

fn starts_with_base(candidate: &LinkCandidate<'_>) -> bool {
    candidate
        .absolute
        .as_str()
        .starts_with(join_base(candidate.base).as_str())
}

fn aliyun_document(candidate: &LinkCandidate<'_>) -> bool {
    candidate
        .absolute
        .host_str()
        .map(|host| host.contains("help.aliyun.com"))
        .unwrap_or(false)
}

fn tencentcloud_document(candidate: &LinkCandidate<'_>) -> bool {
    starts_with_base(candidate)
}

fn huaweicloud_document(candidate: &LinkCandidate<'_>) -> bool {
    matches!(candidate.absolute.scheme(), "http" | "https")
}

fn volcengine_document(candidate: &LinkCandidate<'_>) -> bool {
    candidate.href.starts_with("/docs/") && starts_with_base(candidate)
}

pub const ALIYUN: VendorAdapter = VendorAdapter {
    vendor: "aliyun",
    default_base_url: "https://help.aliyun.com",
    sidebar_selector: "#common-menu-container",
    collapsed_selector: "i.help-icon-close-arrow",
    trigger: Trigger::Closest("a"),
    node_key: NodeKey::Structural,
    link_selector: "a[href]",
    href_attributes: &["href"],
    title_source: TitleSource::AnchorText,
    is_valid_document: aliyun_document,
    canonicalize: canonical_url,
};

pub const TENCENTCLOUD: VendorAdapter = VendorAdapter {
    vendor: "tencentcloud",
    default_base_url: "https://cloud.tencent.com",
    sidebar_selector: ".doc-aside-wrap",
    collapsed_selector: ".J-expandable:not(.active) > a.J-navLayer",
    trigger: Trigger::Itself,
    node_key: NodeKey::Attribute("data-node"),
    link_selector: "a.J-navLayer",
    href_attributes: &["href"],
    title_source: TitleSource::AnchorText,
    is_valid_document: tencentcloud_document,
    canonicalize: canonical_url,
};

pub const HUAWEICLOUD: VendorAdapter = VendorAdapter {
    vendor: "huaweicloud",
    default_base_url: "https://support.huaweicloud.com",
    sidebar_selector: "div.side-nav.sidenav-main",
    collapsed_selector: "li.nav-item:not(.unfold):has(> i.foldIcon) > a.js-title",
    trigger: Trigger::Itself,
    node_key: NodeKey::Structural,
    link_selector: "a.js-title.ajax-nav",
    href_attributes: &["p-href", "href"],
    title_source: TitleSource::AnchorText,
    is_valid_document: huaweicloud_document,
    canonicalize: canonical_url,
};

pub const VOLCENGINE: VendorAdapter = VendorAdapter {
    vendor: "volcengine",
    default_base_url: "https://www.volcengine.com",
    sidebar_selector: ".arco-menu-inner",
    collapsed_selector: "div.arco-menu-inline-header[aria-expanded=\"false\"]",
    trigger: Trigger::Itself,
    node_key: NodeKey::Structural,
    link_selector: "a",
    href_attributes: &["href"],
    title_source: TitleSource::Descendant("span.label-z77I"),
    is_valid_document: volcengine_document,
    canonicalize: canonical_url,
};

static BUILTIN_ADAPTERS: &[VendorAdapter] = &[ALIYUN, TENCENTCLOUD, HUAWEICLOUD, VOLCENGINE];

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate_for<'a>(href: &'a str, absolute: &'a Url, base: &'a Url) -> LinkCandidate<'a> {
        LinkCandidate {
            href,
            absolute,
            base,
        }
    }

    #[test]
    fn test_for_vendor_is_case_insensitive() {
        let adapter = VendorAdapter::for_vendor("TencentCloud").unwrap();
        assert_eq!(adapter.vendor, "tencentcloud");
        assert!(VendorAdapter::for_vendor("acme").is_none());
    }

    #[test]
    fn test_builtin_covers_all_vendors() {
        let vendors: Vec<_> = VendorAdapter::builtin().iter().map(|a| a.vendor).collect();
        assert_eq!(vendors, vec!["aliyun", "tencentcloud", "huaweicloud", "volcengine"]);
    }

    #[test]
    fn test_resolve_skips_non_navigational_hrefs() {
        let base = Url::parse("https://help.aliyun.com").unwrap();
        for href in ["", "  ", "#", "#section", "javascript:void(0)", "mailto:a@b.c", "tel:123"] {
            assert!(ALIYUN.resolve(&base, href).is_none(), "{href:?} should be skipped");
        }
    }

    #[test]
    fn test_resolve_treats_base_as_directory() {
        let base = Url::parse("https://support.huaweicloud.com/ecs").unwrap();
        let resolved = HUAWEICLOUD.resolve(&base, "productdesc-ecs/index.html").unwrap();
        assert_eq!(
            resolved.as_str(),
            "https://support.huaweicloud.com/ecs/productdesc-ecs/index.html"
        );
    }

    #[test]
    fn test_resolve_root_relative() {
        let base = Url::parse("https://cloud.tencent.com").unwrap();
        let resolved = TENCENTCLOUD.resolve(&base, "/document/product/213").unwrap();
        assert_eq!(resolved.as_str(), "https://cloud.tencent.com/document/product/213");
    }

    #[test]
    fn test_aliyun_filter_requires_help_host() {
        let base = Url::parse("https://help.aliyun.com").unwrap();
        let inside = Url::parse("https://help.aliyun.com/zh/ecs/what-is-ecs").unwrap();
        let outside = Url::parse("https://www.aliyun.com/product/ecs").unwrap();
        assert!((ALIYUN.is_valid_document)(&candidate_for("/zh/ecs/what-is-ecs", &inside, &base)));
        assert!(!(ALIYUN.is_valid_document)(&candidate_for("https://www.aliyun.com/product/ecs", &outside, &base)));
    }

    #[test]
    fn test_volcengine_filter_requires_docs_prefix() {
        let base = Url::parse("https://www.volcengine.com").unwrap();
        let doc = Url::parse("https://www.volcengine.com/docs/6396/69767").unwrap();
        let other = Url::parse("https://www.volcengine.com/product/ecs").unwrap();
        assert!((VOLCENGINE.is_valid_document)(&candidate_for("/docs/6396/69767", &doc, &base)));
        assert!(!(VOLCENGINE.is_valid_document)(&candidate_for("/product/ecs", &other, &base)));
        assert!(!(VOLCENGINE.is_valid_document)(&candidate_for("https://www.volcengine.com/docs/1", &doc, &base)));
    }

    #[test]
    fn test_tencentcloud_filter_rejects_foreign_hosts() {
        let base = Url::parse("https://cloud.tencent.com").unwrap();
        let foreign = Url::parse("https://intl.cloud.tencent.com/document/product/213").unwrap();
        assert!(!(TENCENTCLOUD.is_valid_document)(&candidate_for("https://intl.cloud.tencent.com/document/product/213", &foreign, &base)));
    }

    #[test]
    fn test_huaweicloud_reads_p_href_first() {
        assert_eq!(HUAWEICLOUD.href_attributes, ["p-href", "href"].as_slice());
    }
}
