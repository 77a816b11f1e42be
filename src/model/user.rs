/// `First M. Last Suffix`, as printed on attendance sheets.
pub fn full_name(first: &str, middle: &str, last: &str, suffix: &str) -> String {
    let middle_initial = middle
        .chars()
        .next()
        .map(|c| format!("{c}."))
        .unwrap_or_default();

    [first, middle_initial.as_str(), last, suffix]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_uses_middle_initial() {
        assert_eq!(full_name("Juan", "Santos", "Dela Cruz", "Jr."), "Juan S. Dela Cruz Jr.");
        assert_eq!(full_name("Ana", "", "Reyes", ""), "Ana Reyes");
    }
}
