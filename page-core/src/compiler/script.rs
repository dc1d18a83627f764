//! Behavior script emitted as `app.js`.

use pagecraft_types::PageDocument;
use std::collections::BTreeMap;

/// Tracking keys the analytics bootstrap understands. Other keys stay in
/// the document but are not exposed to the page.
pub const KNOWN_TRACKING_KEYS: &[&str] = &["googleAnalyticsId", "metaPixelId"];

const RUNTIME: &str = r##"(function () {
  "use strict";
  var config = window.__PAGECRAFT__ || {};

  if (config.googleAnalyticsId) {
    var ga = document.createElement("script");
    ga.async = true;
    ga.src = "https://www.googletagmanager.com/gtag/js?id=" + encodeURIComponent(config.googleAnalyticsId);
    document.head.appendChild(ga);
    window.dataLayer = window.dataLayer || [];
    window.gtag = function () { window.dataLayer.push(arguments); };
    window.gtag("js", new Date());
    window.gtag("config", config.googleAnalyticsId);
  }

  if (config.metaPixelId) {
    window.fbq = window.fbq || function () { (window.fbq.queue = window.fbq.queue || []).push(arguments); };
    var px = document.createElement("script");
    px.async = true;
    px.src = "https://connect.facebook.net/en_US/fbevents.js";
    document.head.appendChild(px);
    window.fbq("init", config.metaPixelId);
    window.fbq("track", "PageView");
  }

  function track(name, params) {
    if (typeof window.gtag === "function") window.gtag("event", name, params || {});
    if (typeof window.fbq === "function") window.fbq("trackCustom", name, params || {});
  }

  function find(target) {
    if (!target) return null;
    var first = target.charAt(0);
    return document.querySelector(first === "#" || first === "." ? target : "#" + target);
  }

  function run(el) {
    var d = el.dataset;
    switch (d.action) {
      case "checkout":
        track("begin_checkout", { value: Number(d.actionAmount || 0), currency: d.actionCurrency || "USD" });
        if (d.actionUrl) window.location.href = d.actionUrl;
        break;
      case "external_link":
        if (!d.actionUrl) break;
        if (d.actionNewTab === "true") window.open(d.actionUrl, "_blank", "noopener");
        else window.location.href = d.actionUrl;
        break;
      case "scroll_to":
        var section = find(d.actionTarget);
        if (section) section.scrollIntoView({ behavior: "smooth" });
        break;
      case "modal":
        var modal = find(d.actionTarget);
        if (modal) modal.hidden = false;
        else console.warn("pagecraft: modal not found", d.actionTarget);
        break;
      case "track_event":
        track(d.actionEvent || "click");
        break;
      default:
        console.warn("pagecraft: unknown action", d.action);
    }
  }

  document.addEventListener("click", function (e) {
    var closer = e.target.closest("[data-modal-close]");
    if (closer) {
      var open = closer.closest(".pc-modal");
      if (open) open.hidden = true;
      return;
    }
    var el = e.target.closest("[data-action]");
    if (!el) return;
    e.preventDefault();
    try { run(el); } catch (err) { console.warn("pagecraft: action failed", err); }
  });

  document.querySelectorAll("[data-faq-question]").forEach(function (q) {
    q.addEventListener("click", function () {
      var answer = document.getElementById(q.getAttribute("aria-controls"));
      if (!answer) return;
      var expanded = q.getAttribute("aria-expanded") === "true";
      q.setAttribute("aria-expanded", expanded ? "false" : "true");
      answer.hidden = expanded;
    });
  });
})();
"##;

/// Page configuration exposed to the runtime, as a JS object literal.
pub fn page_config(document: &PageDocument) -> String {
    let config: BTreeMap<&str, &str> = KNOWN_TRACKING_KEYS
        .iter()
        .filter_map(|key| {
            document
                .tracking
                .get(*key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| (*key, v))
        })
        .collect();
    // A map of strings always serializes.
    let json = serde_json::to_string(&config).unwrap_or_else(|_| "{}".to_string());
    // Keep the literal from closing an inline <script> if ever embedded.
    json.replace("</", "<\\/")
}

/// Build `app.js`.
pub fn build_script(document: &PageDocument) -> String {
    let mut script = String::with_capacity(RUNTIME.len() + 64);
    script.push_str("window.__PAGECRAFT__ = ");
    script.push_str(&page_config(document));
    script.push_str(";\n");
    script.push_str(RUNTIME);
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_types::PageId;

    fn doc() -> PageDocument {
        PageDocument::new(PageId::new(), "p")
    }

    #[test]
    fn only_known_tracking_keys_are_exposed() {
        let mut d = doc();
        d.tracking.insert("googleAnalyticsId".into(), "G-123".into());
        d.tracking.insert("internalNote".into(), "secret".into());
        d.tracking.insert("metaPixelId".into(), "  ".into());
        assert_eq!(page_config(&d), r#"{"googleAnalyticsId":"G-123"}"#);
    }

    #[test]
    fn config_cannot_close_script_tag() {
        let mut d = doc();
        d.tracking.insert("metaPixelId".into(), "</script><script>x".into());
        assert!(!page_config(&d).contains("</"));
    }

    #[test]
    fn script_dispatches_every_action_type() {
        let script = build_script(&doc());
        assert!(script.starts_with("window.__PAGECRAFT__ = {};\n"));
        for action in ["checkout", "external_link", "scroll_to", "modal", "track_event"] {
            assert!(script.contains(&format!("case \"{}\"", action)), "{}", action);
        }
        assert!(script.contains("console.warn(\"pagecraft: unknown action\""));
    }

    #[test]
    fn runtime_keeps_selector_targets_intact() {
        let script = build_script(&doc());
        assert!(script.contains(r##"first === "#" || first === ".""##));
        assert!(script.trim_end().ends_with("})();"));
    }
}
