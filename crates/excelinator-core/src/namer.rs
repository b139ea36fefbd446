//! Collision-free naming for columns copied into a table

/// Return `candidate` if unused, else the first free `candidate_N` with N >= 2.
///
/// Callers resolving several columns into one table must push each result
/// into `existing` before resolving the next, so that two copies of the
/// same base name land on distinct suffixes.
pub fn resolve_column_name<S: AsRef<str>>(candidate: &str, existing: &[S]) -> String {
    let taken = |name: &str| existing.iter().any(|e| e.as_ref() == name);

    let mut name = candidate.to_string();
    let mut copy_count = 1;
    while taken(&name) {
        copy_count += 1;
        name = format!("{}_{}", candidate, copy_count);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_name_unchanged() {
        assert_eq!(resolve_column_name("email", &["id", "name"]), "email");
    }

    #[test]
    fn test_collision_gets_suffix() {
        assert_eq!(resolve_column_name("name", &["id", "name"]), "name_2");
    }

    #[test]
    fn test_skips_taken_suffixes() {
        let existing = ["name", "name_2", "name_3"];
        assert_eq!(resolve_column_name("name", &existing), "name_4");
    }

    #[test]
    fn test_idempotent_on_unique_name() {
        let existing = vec!["id".to_string(), "name".to_string()];
        let first = resolve_column_name("name", &existing);
        let mut with_first = existing.clone();
        with_first.push(first.clone());

        // Already-unique result resolves to itself against the original set
        assert_eq!(resolve_column_name(&first, &existing), first);
        // Deterministic
        assert_eq!(resolve_column_name("name", &existing), first);
        // Feeding results forward yields distinct names
        assert_eq!(resolve_column_name("name", &with_first), "name_3");
    }
}
