//! Unit tests for backend records and hotspot targets

use flipcache::metadata::{Hotspot, HotspotTarget, PageRecord};
use flipcache::PercentRect;

fn parse(json: &str) -> Hotspot {
    serde_json::from_str(json).unwrap()
}

#[test]
fn numeric_ids_become_strings() {
    let hotspot = parse(r#"{"id": 17, "x": 1, "y": 2, "width": 3, "height": 4}"#);
    assert_eq!(hotspot.id, "17");
    assert_eq!(hotspot.page_number, 0);
    assert_eq!(hotspot.z_index, 0);
    assert!(!hotspot.is_interactive());
}

#[test]
fn http_links_are_external() {
    let hotspot = parse(
        r#"{"id": "a", "x": 0, "y": 0, "width": 1, "height": 1,
            "linkUrl": "https://shop.test", "productSku": "GC-1"}"#,
    );
    assert_eq!(
        hotspot.target(),
        Some(HotspotTarget::External {
            url: "https://shop.test".to_string()
        })
    );
}

#[test]
fn relative_links_are_internal() {
    let hotspot = parse(
        r#"{"id": "a", "x": 0, "y": 0, "width": 1, "height": 1, "linkUrl": "/catalog/7"}"#,
    );
    assert_eq!(
        hotspot.target(),
        Some(HotspotTarget::Internal {
            path: "/catalog/7".to_string()
        })
    );
}

#[test]
fn blank_link_falls_back_to_product() {
    let hotspot = parse(
        r#"{"id": "a", "x": 0, "y": 0, "width": 1, "height": 1,
            "linkUrl": "  ", "productSku": "GC-1", "zIndex": 3}"#,
    );
    assert_eq!(
        hotspot.target(),
        Some(HotspotTarget::Product {
            sku: "GC-1".to_string()
        })
    );
    assert_eq!(hotspot.z_index, 3);
}

#[test]
fn percent_rect_is_clamped() {
    let hotspot = parse(r#"{"id": "a", "x": -5, "y": 95, "width": 120, "height": 10}"#);
    assert_eq!(hotspot.percent_rect(), PercentRect::new(0.0, 95.0, 100.0, 10.0));
}

#[test]
fn page_record_from_backend_json() {
    let page: PageRecord =
        serde_json::from_str(r#"{"id": 3, "pageNumber": 2, "imageUrl": "/img/2.png"}"#).unwrap();
    assert_eq!(page.id.as_deref(), Some("3"));
    assert_eq!(page.page_number, 2);
    assert_eq!(page.image_url, "/img/2.png");
}

#[test]
fn target_serializes_with_kind_tag() {
    let json = serde_json::to_string(&HotspotTarget::Product {
        sku: "GC-1".to_string(),
    })
    .unwrap();
    assert_eq!(json, r#"{"kind":"product","sku":"GC-1"}"#);
}
