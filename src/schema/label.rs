use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UPPERCASE: Regex = Regex::new(r"([A-Z])").expect("static pattern");
}

/// Human label for a camel-case field name: `"projectTitle"` -> `"Project Title"`.
pub fn field_label(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let rest = UPPERCASE.replace_all(chars.as_str(), " $1");
    let mut label: String = first.to_uppercase().collect();
    label.push_str(&rest);
    label
}
