//! The index page: upload form, gallery of current results, bundle link.
//!
//! Rendered with Maud on every request; the results directory is the only
//! input.

use crate::naming;
use crate::store::StoreEntry;
use maud::{DOCTYPE, Markup, html};

const CSS: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 960px; padding: 0 1rem; }
.upload-form { display: flex; gap: 1rem; align-items: center; margin-bottom: 2rem; }
.gallery { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 1rem; }
.gallery figure { margin: 0; }
.gallery img { width: 100%; height: auto; display: block; }
.gallery figcaption { font-size: 0.85rem; word-break: break-all; }
.empty { color: #666; }
"#;

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) }
            }
            body {
                (content)
            }
        }
    }
}

fn human_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    match bytes {
        b if b >= KIB * KIB => format!("{:.1} MB", b as f64 / (KIB * KIB) as f64),
        b if b >= KIB => format!("{:.1} KB", b as f64 / KIB as f64),
        b => format!("{b} B"),
    }
}

pub fn render_index(results: &[StoreEntry]) -> Markup {
    let content = html! {
        h1 { "retouch" }
        form.upload-form action="/upload" method="post" enctype="multipart/form-data" {
            input type="file" name="files" multiple accept="image/*";
            button type="submit" { "Upload & enhance" }
        }
        h2 { "Results" }
        @if results.is_empty() {
            p.empty { "Nothing enhanced yet." }
        } @else {
            p { a href="/download_all" { "Download all (" (results.len()) ")" } }
            div.gallery {
                @for entry in results {
                    @let url = naming::results_url(&entry.name);
                    figure {
                        a href=(url) { img src=(url) alt=(entry.name) loading="lazy"; }
                        figcaption { (entry.name) " · " (human_size(entry.size)) }
                    }
                }
            }
        }
    };
    base_document("retouch", content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(name: &str, size: u64) -> StoreEntry {
        StoreEntry {
            name: name.to_string(),
            path: PathBuf::from(name),
            size,
        }
    }

    #[test]
    fn index_includes_doctype_and_form() {
        let doc = render_index(&[]).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(r#"enctype="multipart/form-data""#));
        assert!(doc.contains(r#"name="files""#));
        assert!(doc.contains("Nothing enhanced yet."));
        assert!(!doc.contains("/download_all"));
    }

    #[test]
    fn index_lists_results() {
        let doc = render_index(&[entry("enhanced_cat_1.jpg", 2048)]).into_string();
        assert!(doc.contains(r#"src="/results/enhanced_cat_1.jpg""#));
        assert!(doc.contains("2.0 KB"));
        assert!(doc.contains("/download_all"));
    }

    #[test]
    fn names_are_escaped() {
        let doc = render_index(&[entry("<b>.png", 1)]).into_string();
        assert!(doc.contains("&lt;b&gt;.png"));
    }

    #[test]
    fn human_size_units() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
