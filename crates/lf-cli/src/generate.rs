//! Synthetic listing pages for exercising the filter.

use std::fmt::Write;

use lf_core::types::{BADGE_FAST_PATH_CLASS, LOCAL_BADGE_TEXT};

/// A grid of `groups` product cards, the first `local` of them badged.
///
/// Badges alternate between the fast-path class and a bare text span
/// nested one level deeper, so both detection paths are exercised.
pub fn synthetic_page(groups: usize, local: usize) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"tr\">\n<head><meta charset=\"utf-8\"><title>Listing</title></head>\n<body>\n<div class=\"grid\">\n");
    for i in 0..groups {
        let badge = if i >= local {
            String::new()
        } else if i % 2 == 0 {
            format!("<span class=\"{BADGE_FAST_PATH_CLASS}\">{LOCAL_BADGE_TEXT}</span>")
        } else {
            format!("<div><span> {LOCAL_BADGE_TEXT} </span></div>")
        };
        let _ = writeln!(
            html,
            "  <div class=\"card\" id=\"card-{i}\"><div class=\"inner\"><div role=\"group\"><div class=\"title\">Product {i}</div>{badge}</div></div></div>"
        );
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}
