//! The patch engine: a pure transform over in-memory route-file text.
//!
//! Splices a rate-limit guard into every exported HTTP-verb handler and an
//! import for the guard after the last existing import line. Matching is
//! regex/window based over raw text, deliberately not an AST transform.
//! Unexpected file shapes degrade to "no changes", never to an error.

use regex::Regex;
use std::sync::LazyLock;

/// Module path of the external rate limiter the emitted code references.
pub const LIMITER_MODULE: &str = "@/lib/rate-limit/redis-limiter";

/// Substring whose presence marks a file as already patched.
///
/// This is what makes repeated runs over the same tree idempotent: the
/// inserted import line contains this marker, so step one of the next run
/// short-circuits.
pub const PATCHED_MARKER: &str = "from '@/lib/rate-limit/redis-limiter'";

/// The guard-invocation symbol; its presence anywhere in the file suppresses
/// import insertion, and its presence in a handler window suppresses guard
/// insertion for that handler.
const GUARD_SYMBOL: &str = "applyRateLimit";

/// Local variable name used by the guard snippet; a handler window
/// containing it is treated as already guarded (handles partially-patched
/// files written by hand).
const RESPONSE_IDIOM: &str = "rateLimitResponse";

/// How many characters past a handler's opening brace to scan for an
/// existing guard.
const GUARD_WINDOW_CHARS: usize = 300;

/// Matches one whole import line. Scanned top to bottom; the last match is
/// the splice point for the new import.
static IMPORT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import .* from ['"].*['"];?[ \t]*\r?$"#).unwrap()
});

/// Matches an exported HTTP-verb handler signature up to and including the
/// opening brace of its body. The first parameter must follow the
/// `request: NextRequest` convention. The parameter list is skipped via
/// `[^)]*` so that a destructured `{ params }` argument does not get
/// mistaken for the body brace; signatures with nested parentheses in later
/// parameters simply fail to match and are skipped.
static HANDLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"export async function (?:GET|POST|PUT|DELETE|PATCH)\s*\(\s*request:\s*NextRequest[^)]*\)[^{]*\{",
    )
    .unwrap()
});

/// Outcome of patching one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be checked for whether the file changed"]
pub struct PatchOutcome {
    /// Content after the transform (identical to the input when unchanged).
    pub content: String,
    pub status: PatchStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStatus {
    /// The already-patched marker was present; content untouched.
    AlreadyPatched,
    /// At least one insertion happened.
    Updated {
        guards_added: usize,
        import_added: bool,
        /// True when guards were inserted but the file had no import line to
        /// splice after: the output references a symbol it never imports and
        /// needs operator attention.
        import_missing: bool,
    },
    /// Nothing to do (no handlers found, or all handlers already guarded).
    Unchanged,
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        matches!(self.status, PatchStatus::Updated { .. })
    }
}

/// The guard statement spliced in after a handler's opening brace.
fn guard_snippet(policy: &str) -> String {
    format!(
        "\n  // SECURITY: Rate limiting\n  \
         const rateLimitResponse = await applyRateLimit(request, {policy});\n  \
         if (rateLimitResponse) return rateLimitResponse;\n"
    )
}

fn import_line() -> String {
    format!("\nimport {{ applyRateLimit, RATE_LIMITS }} from '{LIMITER_MODULE}';")
}

/// Up to `max_chars` characters of `content` starting at byte offset `start`.
fn window_after(content: &str, start: usize, max_chars: usize) -> &str {
    let end = content[start..]
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| start + i)
        .unwrap_or(content.len());
    &content[start..end]
}

/// Apply the rate-limit patch to `content`, emitting guards that reference
/// `policy` (an externally-defined policy token such as
/// `RATE_LIMITS.TICKET_COMMENT`).
///
/// Pure: never touches the filesystem, never fails. Already-patched content
/// is returned untouched.
pub fn patch(content: &str, policy: &str) -> PatchOutcome {
    if content.contains(PATCHED_MARKER) {
        return PatchOutcome {
            content: content.to_string(),
            status: PatchStatus::AlreadyPatched,
        };
    }

    let mut out = content.to_string();
    let mut import_added = false;
    let mut import_missing = false;

    if !out.contains(GUARD_SYMBOL) {
        match IMPORT_LINE_RE.find_iter(&out).last().map(|m| m.end()) {
            Some(splice_at) => {
                out.insert_str(splice_at, &import_line());
                import_added = true;
            }
            // No import block to splice after; no synthetic one is invented.
            None => import_missing = true,
        }
    }

    // Collect splice points first, then insert bottom-to-top so earlier
    // offsets stay valid.
    let splice_points: Vec<usize> = HANDLER_RE
        .find_iter(&out)
        .filter_map(|m| {
            let window = window_after(&out, m.end(), GUARD_WINDOW_CHARS);
            if window.contains(GUARD_SYMBOL) || window.contains(RESPONSE_IDIOM) {
                None
            } else {
                Some(m.end())
            }
        })
        .collect();

    let guards_added = splice_points.len();
    let snippet = guard_snippet(policy);
    for pos in splice_points.into_iter().rev() {
        out.insert_str(pos, &snippet);
    }

    if !import_added && guards_added == 0 {
        return PatchOutcome {
            content: out,
            status: PatchStatus::Unchanged,
        };
    }

    PatchOutcome {
        content: out,
        status: PatchStatus::Updated {
            guards_added,
            import_added,
            import_missing: import_missing && guards_added > 0,
        },
    }
}
