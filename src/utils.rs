//! Utility functions for filename and extension resolution

use crate::types::Post;

/// Maximum length of a sanitized filename stem, in characters
const MAX_STEM_CHARS: usize = 120;

/// Characters that are unsafe in filenames on at least one major platform
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Make a title safe to use as a filename stem
///
/// Path separators and reserved characters become `_`, control characters
/// are dropped, runs of whitespace collapse into a single `_`, and the
/// result is capped at a fixed number of characters. Leading and trailing
/// dots and underscores are trimmed so the stem can never be `.` or `..`.
///
/// # Examples
///
/// ```
/// use content_pirate::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My cat / dog?"), "My_cat___dog");
/// assert_eq!(sanitize_filename("   "), "");
/// ```
pub fn sanitize_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_space = false;

    for c in title.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_control() {
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push('_');
        }
        pending_space = false;

        if RESERVED_CHARS.contains(&c) {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    let capped: String = out.chars().take(MAX_STEM_CHARS).collect();
    capped.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Extension of the last path segment of a link, lowercased and without the dot
///
/// Returns `None` for unparsable links and segments without an extension.
///
/// # Examples
///
/// ```
/// use content_pirate::utils::extension_from_link;
///
/// assert_eq!(extension_from_link("https://i.redd.it/abc.PNG?x=1"), Some("png".to_string()));
/// assert_eq!(extension_from_link("https://v.redd.it/abc/DASH_720"), None);
/// ```
pub fn extension_from_link(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let ext = std::path::Path::new(last_segment).extension()?.to_str()?;

    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extension for a post: its own, else its link's, else the kind's default
pub fn resolve_extension(post: &Post) -> String {
    let own = post.ext.trim().trim_start_matches('.');
    if !own.is_empty() {
        return own.to_ascii_lowercase();
    }

    extension_from_link(&post.link).unwrap_or_else(|| post.kind.default_extension().to_string())
}

/// Filename an item is stored under at every destination
///
/// Uses the post's suggested filename when it has one. Otherwise builds
/// `<sanitized title>_<id>.<ext>`, or `<id>.<ext>` when the title is empty
/// after sanitizing. The id keeps entries of one collection distinct only
/// when their titles differ, so collection sources are expected to suffix
/// titles per entry.
pub fn resolve_file_name(post: &Post, ext: &str) -> String {
    if let Some(name) = post.file_name.as_deref() {
        let name = sanitize_filename(name);
        if !name.is_empty() {
            return name;
        }
    }

    let id = sanitize_filename(&post.id);
    let stem = sanitize_filename(&post.title);
    if stem.is_empty() {
        format!("{}.{}", id, ext)
    } else {
        format!("{}_{}.{}", stem, id, ext)
    }
}
