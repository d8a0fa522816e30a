//! Platform module namespaces that never become dependencies.

/// Prefixes owned by a runtime or framework.
const BUILTIN_PREFIXES: &[&str] = &[
    "node:", "bun:", "deno:", "sass:", "astro:", "virtual:", "$app/", "$env/", "$service-worker",
];

/// Node core modules importable without the `node:` prefix.
const NODE_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Whether `specifier` names a platform module, including subpaths such as
/// `fs/promises`.
pub fn is_builtin(specifier: &str) -> bool {
    if BUILTIN_PREFIXES.iter().any(|p| specifier.starts_with(p)) {
        return true;
    }
    let head = specifier.split('/').next().unwrap_or(specifier);
    NODE_MODULES.contains(&head)
}
