//! Page-world scripts for the list surface and the hidden profile frame
//!
//! Every script is an expression taking one JSON argument object and
//! returning `{ value: ... }`, so "nothing found" round-trips as
//! `value: null` instead of an undefined result.

use serde::Serialize;

/// Shared helpers prepended to every list script
const LIST_PRELUDE: &str = r#"
    const firstMatch = (root, selectors) => {
        for (const sel of selectors || []) {
            try {
                const el = root.querySelector(sel);
                if (el) return el;
            } catch (e) {}
        }
        return null;
    };
    const allItems = (root, selectors) => {
        const seen = new Set();
        const out = [];
        for (const sel of selectors || []) {
            let found = [];
            try { found = Array.from(root.querySelectorAll(sel)); } catch (e) {}
            for (const el of found) {
                if (seen.has(el)) continue;
                if (out.some(other => other.contains(el) || el.contains(other))) continue;
                seen.add(el);
                out.push(el);
            }
        }
        out.sort((a, b) => (a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING) ? -1 : 1);
        return out;
    };
    const scrollableAncestor = (el) => {
        let node = el ? el.parentElement : null;
        while (node && node !== document.body) {
            const style = getComputedStyle(node);
            if (/(auto|scroll)/.test(style.overflowY) && node.scrollHeight > node.clientHeight) {
                return node;
            }
            node = node.parentElement;
        }
        return null;
    };
    const resolveContainer = (list) => {
        const explicit = firstMatch(document, list.container);
        if (explicit) return explicit;
        const first = allItems(document, list.items)[0];
        return scrollableAncestor(first) || document.scrollingElement || document.documentElement;
    };
"#;

pub const METRICS_SCRIPT: &str = r#"
    const c = resolveContainer(args.list);
    return c ? { scrollTop: c.scrollTop, scrollHeight: c.scrollHeight, clientHeight: c.clientHeight } : null;
"#;

pub const ITEMS_SCRIPT: &str = r#"
    return allItems(document, args.list.items).map(el => el.outerHTML);
"#;

pub const ACTION_SCRIPT: &str = r#"
    const c = resolveContainer(args.list);
    if (!c) return false;
    const a = args.action;
    switch (a.kind) {
        case "scrollBy":
            c.scrollBy({ top: a.dy, behavior: a.smooth ? "smooth" : "auto" });
            break;
        case "wheel":
            c.dispatchEvent(new WheelEvent("wheel", { deltaY: a.delta, bubbles: true, cancelable: true }));
            c.scrollTop += a.delta;
            break;
        case "lastIntoView": {
            const items = allItems(document, args.list.items);
            const last = items[items.length - 1];
            if (last) last.scrollIntoView({ block: "end" });
            break;
        }
        case "pageDown":
            c.dispatchEvent(new KeyboardEvent("keydown", { key: "PageDown", code: "PageDown", keyCode: 34, bubbles: true }));
            c.scrollTop += c.clientHeight;
            break;
        case "jumpToBottom":
            c.scrollTop = c.scrollHeight;
            break;
    }
    return true;
"#;

pub const LOAD_MORE_SCRIPT: &str = r#"
    const visible = (el) => {
        const r = el.getBoundingClientRect();
        return r.width > 0 && r.height > 0 && !el.disabled && el.getAttribute("aria-disabled") !== "true";
    };
    for (const lm of args.loadMore || []) {
        const pattern = lm.textPattern ? new RegExp(lm.textPattern, "i") : null;
        for (const sel of lm.selectors) {
            let found = [];
            try { found = Array.from(document.querySelectorAll(sel)); } catch (e) {}
            const btn = found.find(el => visible(el) && (!pattern || pattern.test(el.textContent || "")));
            if (btn) {
                btn.click();
                return true;
            }
        }
    }
    return false;
"#;

pub const CLICK_FIRST_SCRIPT: &str = r#"
    const el = firstMatch(document, args.selectors);
    if (!el) return false;
    el.scrollIntoView({ block: "center" });
    el.click();
    return true;
"#;

pub const TEXT_OF_SCRIPT: &str = r#"
    for (const sel of args.selectors) {
        let found = [];
        try { found = Array.from(document.querySelectorAll(sel)); } catch (e) {}
        for (const el of found) {
            const text = (el.textContent || "").trim() || (el.getAttribute("aria-label") || "").trim();
            if (text) return text;
        }
    }
    return null;
"#;

pub const LOCATION_SCRIPT: &str = r#"
    return location.href;
"#;

const FRAME_PRELUDE: &str = r#"
    const FRAME_ID = "__leadscrape_profile_frame";
    const ensureFrame = () => {
        let frame = document.getElementById(FRAME_ID);
        if (!frame) {
            frame = document.createElement("iframe");
            frame.id = FRAME_ID;
            frame.setAttribute("aria-hidden", "true");
            frame.style.cssText = "position:fixed;left:-10000px;top:0;width:1280px;height:900px;opacity:0;pointer-events:none;";
            document.body.appendChild(frame);
        }
        return frame;
    };
    const frameDoc = () => {
        const frame = document.getElementById(FRAME_ID);
        try { return frame ? frame.contentDocument : null; } catch (e) { return null; }
    };
"#;

pub const FRAME_LOAD_SCRIPT: &str = r#"
    const frame = ensureFrame();
    frame.onload = () => { frame.dataset.loaded = args.token; };
    frame.src = args.url;
    return true;
"#;

pub const FRAME_STATE_SCRIPT: &str = r#"
    const frame = document.getElementById(FRAME_ID);
    const doc = frameDoc();
    if (!frame || !doc) return null;
    return { loaded: frame.dataset.loaded || "", readyState: doc.readyState };
"#;

pub const FRAME_READ_SCRIPT: &str = r#"
    const doc = frameDoc();
    if (!doc) return null;
    for (const sel of args.selectors) {
        let found = [];
        try { found = Array.from(doc.querySelectorAll(sel)); } catch (e) {}
        for (const el of found) {
            const raw = args.attr ? el.getAttribute(args.attr) : el.textContent;
            const value = (raw || "").trim();
            if (value) return value;
        }
    }
    return null;
"#;

pub const FRAME_CLICK_SCRIPT: &str = r#"
    const doc = frameDoc();
    if (!doc) return false;
    for (const sel of args.selectors) {
        let el = null;
        try { el = doc.querySelector(sel); } catch (e) {}
        if (el) {
            el.click();
            return true;
        }
    }
    return false;
"#;

/// Which helper set a script body needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prelude {
    List,
    Frame,
}

/// Wrap `body` into a self-invoking expression with `args` bound
pub fn build_script<A: Serialize>(prelude: Prelude, body: &str, args: &A) -> Result<String, serde_json::Error> {
    let args = serde_json::to_string(args)?;
    let helpers = match prelude {
        Prelude::List => LIST_PRELUDE,
        Prelude::Frame => FRAME_PRELUDE,
    };
    Ok(format!(
        "(() => {{ const args = {args}; {helpers} const run = () => {{ {body} }}; return {{ value: run() }}; }})()"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embeds_arguments_as_json() {
        let script = build_script(Prelude::Frame, FRAME_LOAD_SCRIPT, &json!({ "url": "https://x/\"q" }))
            .expect("script");
        assert!(script.starts_with("(() => { const args = {\"url\":\"https://x/\\\"q\"};"));
        assert!(script.contains("ensureFrame"));
        assert!(script.trim_end().ends_with("})()"));
    }
}
