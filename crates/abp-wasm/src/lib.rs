//! WebAssembly bindings for abpvm

use std::sync::OnceLock;

use wasm_bindgen::prelude::*;

use abp_compiler::{load_filter_list, ErrorPolicy, ListStats};
use abp_core::{disasm, ExclusionMode, Matcher, ProgramStats, Query};

static MATCHER: OnceLock<Matcher> = OnceLock::new();

/// Compile `list_text` (skipping rules that fail) into a fresh matcher.
fn compile_matcher(list_text: &str, enforce_exclusions: bool) -> (Matcher, ListStats) {
    let mode = if enforce_exclusions { ExclusionMode::Enforced } else { ExclusionMode::Inert };
    let mut matcher = Matcher::with_exclusion_mode(mode);

    // Skip policy never returns an error.
    let stats = load_filter_list(&mut matcher, list_text, ErrorPolicy::Skip).unwrap_or_default();
    (matcher, stats)
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) {
    let _ = js_sys::Reflect::set(target, &key.into(), value);
}

#[wasm_bindgen]
pub fn init(list_text: &str, enforce_exclusions: bool) -> Result<JsValue, JsValue> {
    if MATCHER.get().is_some() {
        return Err(JsValue::from_str("Already initialized. Reload the page to reinitialize."));
    }

    let (matcher, stats) = compile_matcher(list_text, enforce_exclusions);

    for err in &stats.errors {
        web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
    }

    let rules = matcher.len();
    MATCHER
        .set(matcher)
        .map_err(|_| JsValue::from_str("Failed to set matcher state"))?;

    let result = js_sys::Object::new();
    set(&result, "lines", &JsValue::from(stats.lines as u32));
    set(&result, "rules", &JsValue::from(rules as u32));
    set(&result, "comments", &JsValue::from(stats.comments as u32));
    set(&result, "blank", &JsValue::from(stats.blank as u32));
    set(&result, "elementHiding", &JsValue::from(stats.element_hiding as u32));
    set(&result, "errors", &JsValue::from(stats.errors.len() as u32));
    Ok(result.into())
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    MATCHER.get().is_some()
}

#[wasm_bindgen]
pub fn get_engine_info() -> JsValue {
    let result = js_sys::Object::new();
    match MATCHER.get() {
        Some(matcher) => {
            let stats = ProgramStats::collect(matcher.rules());
            set(&result, "initialized", &JsValue::from(true));
            set(&result, "rules", &JsValue::from(stats.rules as u32));
            set(&result, "instructions", &JsValue::from(stats.instructions as u32));
            let enforced = matcher.exclusion_mode() == ExclusionMode::Enforced;
            set(&result, "enforceExclusions", &JsValue::from(enforced));
        }
        None => set(&result, "initialized", &JsValue::from(false)),
    }
    result.into()
}

/// Original texts of every rule matching `url`, in rule order.
#[wasm_bindgen]
pub fn match_url(url: &str) -> js_sys::Array {
    let result = js_sys::Array::new();
    if let Some(matcher) = MATCHER.get() {
        for rule in matcher.match_query(&Query::new(url)) {
            result.push(&JsValue::from_str(rule));
        }
    }
    result
}

/// Batch form of `match_url`. Non-string entries are ignored.
#[wasm_bindgen]
pub fn match_urls(urls: JsValue) -> js_sys::Array {
    let result = js_sys::Array::new();
    let Some(matcher) = MATCHER.get() else {
        return result;
    };

    let queries: Vec<Query> = js_sys::Array::from(&urls)
        .iter()
        .filter_map(|value| value.as_string())
        .map(Query::new)
        .collect();

    for rule in matcher.match_all(&queries) {
        result.push(&JsValue::from_str(rule));
    }
    result
}

/// True when any rule matches `url`.
#[wasm_bindgen]
pub fn should_block(url: &str) -> bool {
    let Some(matcher) = MATCHER.get() else {
        return false;
    };
    let query = Query::new(url);
    matcher.rules().iter().any(|rule| matcher.rule_matches(rule, &query))
}

/// Disassembly listing of every loaded rule.
#[wasm_bindgen]
pub fn dump() -> Result<String, JsValue> {
    let mut listing = String::new();
    if let Some(matcher) = MATCHER.get() {
        disasm::write_listing(&mut listing, matcher.rules())
            .map_err(|e| JsValue::from_str(&format!("Failed to render listing: {}", e)))?;
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_with_skip_policy() {
        let (matcher, stats) = compile_matcher("! c\n||ads.com^\nbad rule\n/track/\n", false);
        assert_eq!(matcher.len(), 2);
        assert_eq!(stats.comments, 1);
        assert_eq!(stats.errors.len(), 1);
        assert_eq!(matcher.exclusion_mode(), ExclusionMode::Inert);
    }

    #[test]
    fn enforce_flag_selects_mode() {
        let (matcher, _) = compile_matcher("ads$domain=a.com|~b.a.com", true);
        assert_eq!(matcher.exclusion_mode(), ExclusionMode::Enforced);
        assert!(matcher.match_query(&Query::new("http://b.a.com/ads")).is_empty());
        assert_eq!(matcher.match_query(&Query::new("http://a.com/ads")), vec!["ads$domain=a.com|~b.a.com"]);
    }
}
