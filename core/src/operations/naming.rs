#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Canonical forms for operation identifiers, shared by index construction and lookup.

/// Replaces every character that is neither alphanumeric nor `_` with `_`.
///
/// e.g. `api.views.listSubjects` -> `api_views_listSubjects`
pub fn normalize_operation_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Derives an identifier from the HTTP method and path template when `operationId` is missing.
///
/// e.g. `GET /users/{id}` -> `get_users_id`
pub fn derive_operation_id(method: &str, path: &str) -> String {
    let clean_path = path.replace(['{', '}'], "").replace('/', "_");
    let derived = format!(
        "{}_{}",
        method.to_lowercase(),
        clean_path.trim_start_matches('_')
    );
    normalize_operation_id(derived.trim_end_matches('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_separators() {
        assert_eq!(
            normalize_operation_id("api.views.listSubjects"),
            "api_views_listSubjects"
        );
        assert_eq!(normalize_operation_id("subjects-fetch v2"), "subjects_fetch_v2");
        assert_eq!(normalize_operation_id("already_fine"), "already_fine");
    }

    #[test]
    fn test_normalize_keeps_non_ascii_letters() {
        assert_eq!(normalize_operation_id("sujets.créer"), "sujets_créer");
        assert_ne!(normalize_operation_id("créer"), normalize_operation_id("cr_er"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_operation_id("a.b-c");
        assert_eq!(normalize_operation_id(&once), once);
    }

    #[test]
    fn test_derive_operation_id() {
        assert_eq!(derive_operation_id("GET", "/users"), "get_users");
        assert_eq!(derive_operation_id("get", "/users/{id}"), "get_users_id");
        assert_eq!(
            derive_operation_id("POST", "/users/{id}/activate"),
            "post_users_id_activate"
        );
        assert_eq!(derive_operation_id("GET", "/"), "get");
        assert_eq!(derive_operation_id("GET", "/files/{name}.json"), "get_files_name_json");
    }
}
