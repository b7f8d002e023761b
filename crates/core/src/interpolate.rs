use std::collections::BTreeMap;

use crate::Error;

/// Fills `{name}` placeholders in `template` from `inputs`.
///
/// Only identifiers (`[A-Za-z_][A-Za-z0-9_]*`) between braces count as
/// placeholders; anything else, such as a JSON example, is kept verbatim.
/// `{{` and `}}` produce literal braces. A placeholder without a matching
/// input is an error.
pub fn interpolate(
    template: &str,
    inputs: &BTreeMap<String, String>,
) -> Result<String, Error> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(idx) = rest.find(['{', '}']) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        let placeholder = tail[1..]
            .find('}')
            .map(|end| &tail[1..end + 1])
            .filter(|name| is_identifier(name));
        match placeholder {
            Some(name) => {
                let value = inputs
                    .get(name)
                    .ok_or_else(|| Error::missing_input(name))?;
                out.push_str(value);
                rest = &tail[name.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
