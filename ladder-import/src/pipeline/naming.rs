//! Object naming policy for imported meshes

/// Replace every character outside `[A-Za-z0-9_-]` (Unicode letters and
/// digits included) with `_`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// `{base}_{index:03}`
pub fn numbered_name(base: &str, index: usize) -> String {
    format!("{}_{:03}", base, index)
}

/// Names for `count` objects created from the file with stem `base`
///
/// - part names in use: the i-th object takes the i-th sanitized part name,
///   objects past the end of the list are numbered
/// - a single object is named after the file
/// - otherwise every object is numbered
pub fn plan_object_names(
    base: &str,
    count: usize,
    part_names: &[String],
    use_part_names: bool,
) -> Vec<String> {
    if use_part_names && !part_names.is_empty() {
        (0..count)
            .map(|i| match part_names.get(i) {
                Some(part) => sanitize_name(part),
                None => numbered_name(base, i),
            })
            .collect()
    } else if count == 1 {
        vec![base.to_string()]
    } else {
        (0..count).map(|i| numbered_name(base, i)).collect()
    }
}

/// Target collection name for a batch
pub fn collection_name(explicit: Option<&str>, first_stem: &str, file_count: usize) -> String {
    match explicit.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None if file_count > 1 => "CAD Import".to_string(),
        None => first_stem.to_string(),
    }
}
