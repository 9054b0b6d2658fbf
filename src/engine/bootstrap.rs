use super::linker::quote;
use std::collections::BTreeMap;

pub(super) const REQUIRE_FN: &str = "__kestrel_require";
pub(super) const EXPORT_FN: &str = "__kestrel_export";
pub(super) const EXPORT_STAR_FN: &str = "__kestrel_export_star";
pub(super) const EXPORTS: &str = "__kestrel_exports";
pub(super) const DEFAULT_LOCAL: &str = "__kestrel_default";

/// The module registry every bundle starts with.
pub(super) const MODULE_REGISTRY: &str = r#"
var __kestrel_cache = {};
function __kestrel_require(id) {
  var cached = __kestrel_cache[id];
  if (cached) return cached.exports;
  var module = __kestrel_cache[id] = { exports: {} };
  __kestrel_modules[id](module.exports);
  return module.exports;
}
function __kestrel_export(target, getters) {
  for (var name in getters) {
    Object.defineProperty(target, name, { enumerable: true, get: getters[name] });
  }
}
function __kestrel_export_star(target, source) {
  Object.keys(source).forEach(function (name) {
    if (name === "default" || Object.prototype.hasOwnProperty.call(target, name)) return;
    Object.defineProperty(target, name, { enumerable: true, get: function () { return source[name]; } });
  });
}
"#;

/// Wraps linked module bodies into one self-executing bundle that runs `entry`.
///
/// `modules` is ordered by path, which keeps the output independent of the
/// order modules were discovered in.
pub(super) fn assemble(registry: &str, modules: &BTreeMap<String, String>, entry: &str) -> String {
    let mut out = String::from("(function () {\nvar __kestrel_modules = {\n");
    for (path, body) in modules {
        out.push_str(&format!(
            "{}: function ({}) {{\n{}\n}},\n",
            quote(path),
            EXPORTS,
            body
        ));
    }
    out.push_str("};\n");
    out.push_str(registry);
    out.push_str(&format!("{}({});\n}})();\n", REQUIRE_FN, quote(entry)));
    out
}
